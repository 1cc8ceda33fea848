//! Per-item transformations run by the coordinator.

mod attributes;
mod recipe;

pub use attributes::AttributeTransformer;
pub use recipe::{build_variant, reorder_ingredients, RecipeTransformer};

use async_trait::async_trait;

use crate::error::ProcessError;
use crate::sinks::Sinks;
use crate::types::Recipe;

/// What a worker hands to the transformer alongside each item.
#[derive(Debug, Clone, Copy)]
pub struct WorkerContext<'a> {
    pub worker: usize,
    pub sinks: &'a Sinks,
}

/// Turns one queued item into zero or more structured recipes.
#[async_trait]
pub trait Transformer: Send + Sync + 'static {
    type Item: Send + 'static;

    /// Name used in logs and error records.
    fn display_name(item: &Self::Item) -> &str;

    /// Source URL recorded in the success log.
    fn source_url(item: &Self::Item) -> &str;

    async fn process(
        &self,
        item: &Self::Item,
        ctx: WorkerContext<'_>,
    ) -> Result<Vec<Recipe>, ProcessError>;
}
