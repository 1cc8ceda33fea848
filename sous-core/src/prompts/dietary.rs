//! Dietary classification prompt: ingredient names in, violated restrictions
//! out.

use std::fmt::Write;

use super::{TEMPERATURE, TOP_P};
use crate::llm::CompletionRequest;
use crate::response::ParsedIngredientRow;

/// Prompt name for cache keys.
pub const PROMPT_NAME: &str = "dietary";

pub const INSTRUCTION: &str = r#"Produce a table index,ingredient,breaks, where breaks is a list of the following attributes for the ingredient, and empty if it satisfies everything:
not vegan, not vegetarian, not kosher, not halal, has gluten, has dairy, has nuts, has shellfish, has eggs, has soy, has fish, has pork, has red meat, has alcohol.
Always contain the three columns, even if empty. Evaluate each ingredient separately. Include the header row.
Follow this example:
1,beef
1a,pork
2,flour
3,eggs
4,apple
5,beer

becomes
1,beef,not vegan,not vegetarian,not halal
1a,pork,not vegan,not vegetarian,not kosher,not halal
2,flour,has gluten
3,eggs,not vegan,not vegetarian,has eggs
4,apple,
5,beer,not kosher,not halal,has alcohol"#;

/// Names enumerated from zero as `<n>, <name>` lines.
pub fn render_enumerated_input(names: &[&str]) -> String {
    let mut out = String::new();
    for (i, name) in names.iter().enumerate() {
        let _ = writeln!(out, "{}, {}", i, name);
    }
    out
}

/// Parsed rows as an `index,ingredient` table, keeping the service's own
/// indices.
pub fn render_indexed_input(rows: &[ParsedIngredientRow]) -> String {
    let mut out = String::from("index,ingredient\n");
    for row in rows {
        let _ = writeln!(out, "{},{}", row.index, row.ingredient);
    }
    out
}

pub fn dietary_request(input: String) -> CompletionRequest {
    CompletionRequest {
        prompt_name: PROMPT_NAME,
        instruction: INSTRUCTION,
        input,
        temperature: TEMPERATURE,
        top_p: TOP_P,
    }
}
