//! Dietary flags and the violation-label vocabulary.
//!
//! The completion service labels each ingredient with the restrictions it
//! breaks ("not vegan", "has gluten", ...). Flags start all-true and each
//! recognized label downgrades exactly one of them. Nothing ever sets a flag
//! back to true, so the result does not depend on label order.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// One dietary restriction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DietaryFlag {
    Vegan,
    Vegetarian,
    GlutenFree,
    DairyFree,
    NutFree,
    ShellfishFree,
    EggFree,
    SoyFree,
    FishFree,
    PorkFree,
    RedMeatFree,
    AlcoholFree,
    Kosher,
    Halal,
}

/// Violation label vocabulary, normalized to lowercase.
pub const VIOLATION_LABELS: &[(&str, DietaryFlag)] = &[
    ("not vegan", DietaryFlag::Vegan),
    ("not vegetarian", DietaryFlag::Vegetarian),
    ("not kosher", DietaryFlag::Kosher),
    ("not halal", DietaryFlag::Halal),
    ("has gluten", DietaryFlag::GlutenFree),
    ("has dairy", DietaryFlag::DairyFree),
    ("has nuts", DietaryFlag::NutFree),
    ("has shellfish", DietaryFlag::ShellfishFree),
    ("has eggs", DietaryFlag::EggFree),
    ("has soy", DietaryFlag::SoyFree),
    ("has fish", DietaryFlag::FishFree),
    ("has pork", DietaryFlag::PorkFree),
    ("has red meat", DietaryFlag::RedMeatFree),
    ("has alcohol", DietaryFlag::AlcoholFree),
];

impl DietaryFlag {
    /// Map a violation label to the flag it breaks.
    ///
    /// Surrounding whitespace is ignored and matching is case-insensitive.
    /// Returns `None` for labels outside the vocabulary.
    pub fn from_label(label: &str) -> Option<DietaryFlag> {
        let label = label.trim();
        VIOLATION_LABELS
            .iter()
            .find(|(known, _)| known.eq_ignore_ascii_case(label))
            .map(|(_, flag)| *flag)
    }
}

/// Per-recipe dietary information.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DietaryFlags {
    pub is_vegan: bool,
    pub is_vegetarian: bool,
    pub is_gluten_free: bool,
    pub is_dairy_free: bool,
    pub is_nut_free: bool,
    pub is_shellfish_free: bool,
    pub is_egg_free: bool,
    pub is_soy_free: bool,
    pub is_fish_free: bool,
    pub is_pork_free: bool,
    pub is_red_meat_free: bool,
    pub is_alcohol_free: bool,
    pub is_kosher: bool,
    pub is_halal: bool,
}

impl Default for DietaryFlags {
    fn default() -> Self {
        Self::all_true()
    }
}

impl DietaryFlags {
    /// Every restriction satisfied until an ingredient says otherwise.
    pub fn all_true() -> Self {
        Self {
            is_vegan: true,
            is_vegetarian: true,
            is_gluten_free: true,
            is_dairy_free: true,
            is_nut_free: true,
            is_shellfish_free: true,
            is_egg_free: true,
            is_soy_free: true,
            is_fish_free: true,
            is_pork_free: true,
            is_red_meat_free: true,
            is_alcohol_free: true,
            is_kosher: true,
            is_halal: true,
        }
    }

    fn slot(&mut self, flag: DietaryFlag) -> &mut bool {
        match flag {
            DietaryFlag::Vegan => &mut self.is_vegan,
            DietaryFlag::Vegetarian => &mut self.is_vegetarian,
            DietaryFlag::GlutenFree => &mut self.is_gluten_free,
            DietaryFlag::DairyFree => &mut self.is_dairy_free,
            DietaryFlag::NutFree => &mut self.is_nut_free,
            DietaryFlag::ShellfishFree => &mut self.is_shellfish_free,
            DietaryFlag::EggFree => &mut self.is_egg_free,
            DietaryFlag::SoyFree => &mut self.is_soy_free,
            DietaryFlag::FishFree => &mut self.is_fish_free,
            DietaryFlag::PorkFree => &mut self.is_pork_free,
            DietaryFlag::RedMeatFree => &mut self.is_red_meat_free,
            DietaryFlag::AlcoholFree => &mut self.is_alcohol_free,
            DietaryFlag::Kosher => &mut self.is_kosher,
            DietaryFlag::Halal => &mut self.is_halal,
        }
    }

    /// Mark a restriction as broken.
    pub fn downgrade(&mut self, flag: DietaryFlag) {
        *self.slot(flag) = false;
    }

    /// Whether a restriction is still satisfied.
    pub fn is_set(&self, flag: DietaryFlag) -> bool {
        match flag {
            DietaryFlag::Vegan => self.is_vegan,
            DietaryFlag::Vegetarian => self.is_vegetarian,
            DietaryFlag::GlutenFree => self.is_gluten_free,
            DietaryFlag::DairyFree => self.is_dairy_free,
            DietaryFlag::NutFree => self.is_nut_free,
            DietaryFlag::ShellfishFree => self.is_shellfish_free,
            DietaryFlag::EggFree => self.is_egg_free,
            DietaryFlag::SoyFree => self.is_soy_free,
            DietaryFlag::FishFree => self.is_fish_free,
            DietaryFlag::PorkFree => self.is_pork_free,
            DietaryFlag::RedMeatFree => self.is_red_meat_free,
            DietaryFlag::AlcoholFree => self.is_alcohol_free,
            DietaryFlag::Kosher => self.is_kosher,
            DietaryFlag::Halal => self.is_halal,
        }
    }

    /// Resolve flags for a set of ingredient names.
    ///
    /// Ingredients without an entry in `labels_by_name` contribute nothing.
    pub fn resolve<'a, I>(names: I, labels_by_name: &HashMap<String, Vec<DietaryFlag>>) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut flags = Self::all_true();
        for name in names {
            if let Some(violations) = labels_by_name.get(name) {
                for flag in violations {
                    flags.downgrade(*flag);
                }
            }
        }
        flags
    }
}
