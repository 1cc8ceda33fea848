//! Completion service abstraction.
//!
//! The pipeline only depends on the shape of the exchange: a fixed
//! instruction plus a variable input goes out, a list of text choices comes
//! back. Providers are stateless and shared across workers.

mod backoff;
mod caching;
mod fake;
mod openai;

pub use backoff::{Backoff, BackoffPolicy};
pub use caching::{CacheStats, CachingProvider};
pub use fake::FakeProvider;
pub use openai::OpenAiProvider;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::config::{LlmConfig, ProviderKind};

/// Error type for completion service calls.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("API request failed: {0}")]
    RequestFailed(String),

    #[error("API returned error: {status} - {message}")]
    ApiError { status: u16, message: String },

    #[error("Failed to parse response: {0}")]
    ParseError(String),

    #[error("Rate limited, gave up after backoff (retry after {retry_after_secs:?} seconds)")]
    RateLimited { retry_after_secs: Option<u64> },

    #[error("Response contained no choices")]
    NoChoices,

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Cache error: {0}")]
    CacheError(String),
}

/// A request to the completion service.
#[derive(Debug, Clone, Serialize)]
pub struct CompletionRequest {
    /// Short name of the template, used for cache layout and logs.
    pub prompt_name: &'static str,
    pub instruction: &'static str,
    pub input: String,
    pub temperature: f32,
    pub top_p: f32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Choice {
    pub index: u32,
    pub text: String,
}

/// Token usage information.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// Reply from the completion service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Completion {
    pub choices: Vec<Choice>,
    #[serde(default)]
    pub usage: Usage,
}

impl Completion {
    /// Completion with a single choice.
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            choices: vec![Choice {
                index: 0,
                text: text.into(),
            }],
            usage: Usage::default(),
        }
    }

    /// Text of the first choice. An empty choice list is a service failure.
    pub fn first_text(&self) -> Result<&str, LlmError> {
        self.choices
            .first()
            .map(|c| c.text.as_str())
            .ok_or(LlmError::NoChoices)
    }
}

/// Trait for completion providers.
#[async_trait]
pub trait CompletionProvider: Send + Sync + fmt::Debug {
    /// Send a request and wait for the reply, including any internal retries.
    async fn complete(&self, request: &CompletionRequest) -> Result<Completion, LlmError>;

    /// Get the provider name (e.g., "openai", "fake").
    fn provider_name(&self) -> &'static str;

    /// Get the model name.
    fn model_name(&self) -> &str;
}

/// Build the configured provider, wrapped in a disk cache when a cache
/// directory is set.
pub fn create_provider(config: &LlmConfig) -> Result<Box<dyn CompletionProvider>, LlmError> {
    let inner: Box<dyn CompletionProvider> = match config.provider {
        ProviderKind::Fake => Box::new(FakeProvider::with_sample_replies()),
        ProviderKind::OpenAi => {
            let api_key = config
                .api_key
                .clone()
                .ok_or_else(|| LlmError::NotConfigured("no OpenAI API key".to_string()))?;
            Box::new(
                OpenAiProvider::new(api_key, config.model.clone(), config.base_url.clone())
                    .with_backoff(config.backoff.clone()),
            )
        }
    };

    Ok(match &config.cache_dir {
        Some(dir) => Box::new(CachingProvider::new(inner, dir.clone())),
        None => inner,
    })
}
