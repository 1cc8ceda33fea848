//! Instruction templates for the completion service.

pub mod dietary;
pub mod parse_ingredients;

pub use dietary::{dietary_request, render_enumerated_input, render_indexed_input};
pub use parse_ingredients::{parse_ingredients_request, render_ingredient_input};

/// Sampling temperature shared by every request.
pub const TEMPERATURE: f32 = 0.1;

/// Nucleus sampling cutoff shared by every request.
pub const TOP_P: f32 = 0.6;
