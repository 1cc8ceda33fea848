pub mod config;
pub mod coordinator;
pub mod dietary;
pub mod error;
pub mod input;
pub mod llm;
pub mod prompts;
pub mod quantity;
pub mod response;
pub mod sinks;
pub mod transform;
pub mod types;
pub mod variants;

pub use config::{ConfigError, LlmConfig, ProviderKind};
pub use coordinator::{Coordinator, RunSummary};
pub use dietary::{DietaryFlag, DietaryFlags};
pub use error::ProcessError;
pub use input::{
    exclude_sources, group_by_source_url, load_raw_recipes, load_recipes, sample, InputError,
};
pub use llm::{create_provider, CachingProvider, CompletionProvider, FakeProvider, LlmError};
pub use quantity::{Amount, Unit};
pub use response::ResponseError;
pub use sinks::{MemorySink, SinkError, SinkPaths, Sinks};
pub use transform::{AttributeTransformer, RecipeTransformer, Transformer, WorkerContext};
pub use types::{IngredientItem, RawRecipe, Recipe, RecipeMetadata, ServingRange};
