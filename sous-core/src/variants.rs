//! Expansion of ingredient alternatives into recipe variants.
//!
//! The completion service numbers ingredients by their position in the
//! original description list and marks alternatives with a letter suffix:
//! `2` and `2a` are two options for the second ingredient. Every ordinal with
//! at least one lettered row forms a variant group, and each variant picks
//! exactly one row from every group.

use crate::response::ParsedIngredientRow;

/// Structured form of a row index such as `"4"` or `"4a"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IngredientIndex {
    pub ordinal: u32,
    pub alternative: Option<char>,
}

impl IngredientIndex {
    /// Parse an index string.
    ///
    /// Digits accumulate into the ordinal and the first lowercase letter ends
    /// the scan. Other characters are skipped, so garbage degrades to
    /// ordinal 0 rather than failing.
    pub fn parse(text: &str) -> Self {
        let mut ordinal: u32 = 0;
        let mut alternative = None;

        for c in text.chars() {
            if let Some(digit) = c.to_digit(10) {
                ordinal = ordinal.saturating_mul(10).saturating_add(digit);
            } else if c.is_ascii_lowercase() {
                alternative = Some(c);
                break;
            }
        }

        Self {
            ordinal,
            alternative,
        }
    }

    pub fn is_alternative(&self) -> bool {
        self.alternative.is_some()
    }
}

/// Compute variant selections over a list of indices.
///
/// Each selection is a list of positions into `indices`, sorted ascending,
/// holding every non-variant position plus one position per variant group.
/// Groups are visited in order of first appearance, alternatives in row
/// order. With no variant groups there is exactly one selection.
pub fn expand_variants(indices: &[IngredientIndex]) -> Vec<Vec<usize>> {
    let mut base = Vec::new();
    let mut groups: Vec<(u32, Vec<usize>)> = Vec::new();

    for (position, index) in indices.iter().enumerate() {
        let is_variant = indices
            .iter()
            .any(|other| other.ordinal == index.ordinal && other.is_alternative());

        if !is_variant {
            base.push(position);
            continue;
        }

        match groups.iter_mut().find(|(ordinal, _)| *ordinal == index.ordinal) {
            Some((_, members)) => members.push(position),
            None => groups.push((index.ordinal, vec![position])),
        }
    }

    let mut selections = vec![base];
    for (_, members) in &groups {
        selections = members
            .iter()
            .flat_map(|member| {
                selections.iter().map(move |partial| {
                    let mut extended = partial.clone();
                    extended.push(*member);
                    extended
                })
            })
            .collect();
    }

    for selection in &mut selections {
        selection.sort_unstable();
    }

    selections
}

/// Compute variant selections over parsed ingredient rows.
pub fn expand_rows(rows: &[ParsedIngredientRow]) -> Vec<Vec<usize>> {
    let indices: Vec<IngredientIndex> = rows
        .iter()
        .map(|row| IngredientIndex::parse(&row.index))
        .collect();
    expand_variants(&indices)
}
