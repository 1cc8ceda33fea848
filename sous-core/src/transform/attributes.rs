//! Dietary attributes for groups of structured recipes.

use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;

use super::{Transformer, WorkerContext};
use crate::dietary::DietaryFlags;
use crate::error::ProcessError;
use crate::llm::CompletionProvider;
use crate::prompts::{dietary_request, render_enumerated_input};
use crate::response::{labels_by_ingredient, parse_dietary_rows};
use crate::types::Recipe;

/// Classifies every distinct ingredient of a recipe group in one request
/// and recomputes each recipe's dietary flags from its own ingredients.
///
/// Flags are rebuilt from all-true on every run, so whatever a recipe
/// carried in from an earlier stage is replaced, not narrowed further.
#[derive(Debug)]
pub struct AttributeTransformer {
    provider: Arc<dyn CompletionProvider>,
}

impl AttributeTransformer {
    pub fn new(provider: Arc<dyn CompletionProvider>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl Transformer for AttributeTransformer {
    type Item = Vec<Recipe>;

    fn display_name(group: &Vec<Recipe>) -> &str {
        group.first().map_or("", |r| r.name.as_str())
    }

    fn source_url(group: &Vec<Recipe>) -> &str {
        group.first().map_or("", |r| r.metadata.source_url.as_str())
    }

    async fn process(
        &self,
        group: &Vec<Recipe>,
        ctx: WorkerContext<'_>,
    ) -> Result<Vec<Recipe>, ProcessError> {
        if group.is_empty() {
            return Ok(Vec::new());
        }

        let names: Vec<&str> = group
            .iter()
            .flat_map(|r| r.ingredient_names())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let input = render_enumerated_input(&names);
        ctx.sinks.info(&format!("{}: Input:\n{}", ctx.worker, input));

        let completion = self.provider.complete(&dietary_request(input)).await?;
        let text = completion.first_text()?;
        ctx.sinks
            .info(&format!("{}: Parsed attributes:\n{}", ctx.worker, text));

        let rows = parse_dietary_rows(text).map_err(ProcessError::malformed("dietary"))?;
        let labels = labels_by_ingredient(rows);

        Ok(group
            .iter()
            .map(|recipe| {
                let mut updated = recipe.clone();
                updated.metadata.dietary = DietaryFlags::resolve(recipe.ingredient_names(), &labels);
                updated
            })
            .collect())
    }
}
