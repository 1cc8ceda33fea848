use serde::{Deserialize, Serialize};

use crate::dietary::DietaryFlags;
use crate::quantity::Amount;

/// Recipe as scraped from a page - ingredients and steps are free text.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawRecipe {
    pub name: String,
    pub description: String,
    /// One free-text entry per ingredient line, in page order
    #[serde(alias = "ingredientdescriptions")]
    pub ingredient_descriptions: Vec<String>,
    pub steps: Vec<String>,
    pub metadata: RecipeMetadata,
}

impl RawRecipe {
    /// Carry name, description, steps and metadata over to a structured
    /// recipe with no ingredients yet.
    pub fn to_recipe(&self) -> Recipe {
        Recipe {
            name: self.name.clone(),
            description: self.description.clone(),
            ingredients: Vec::new(),
            steps: self.steps.clone(),
            metadata: self.metadata.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecipeMetadata {
    pub tags: Vec<String>,
    pub minutes_to_prep: u32,
    pub minutes_to_cook: u32,
    pub minutes_total: u32,
    /// 1 easy, 3 medium, 5 hard; 0 when unknown
    pub difficulty: u8,
    pub servings: ServingRange,
    pub estimated_calories: u32,
    pub image_url: String,
    pub image_alt: String,
    pub source_url: String,
    pub dietary: DietaryFlags,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServingRange {
    pub min: u32,
    pub max: u32,
    pub alternative: String,
}

/// A single resolved ingredient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngredientItem {
    pub name: String,
    pub amount: Amount,
    pub optional: bool,
    pub notes: String,
}

/// Structured recipe - one fully resolved ingredient combination.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Recipe {
    pub name: String,
    pub description: String,
    pub ingredients: Vec<IngredientItem>,
    pub steps: Vec<String>,
    pub metadata: RecipeMetadata,
}

impl Recipe {
    pub fn ingredient_names(&self) -> impl Iterator<Item = &str> {
        self.ingredients.iter().map(|i| i.name.as_str())
    }
}
