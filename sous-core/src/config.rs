//! Completion service configuration from environment variables.

use std::env;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::llm::BackoffPolicy;

/// Default chat completions base URL.
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Default model to use.
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Token file read when `OPENAI_API_KEY` is unset.
pub const DEFAULT_TOKEN_FILE: &str = "secret/openai.token";

/// Default cap on time spent retrying a rate-limited request.
pub const DEFAULT_RETRY_MAX_ELAPSED_SECS: u64 = 60;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Unknown provider {0:?} (expected \"openai\" or \"fake\")")]
    UnknownProvider(String),

    #[error("No API key: set OPENAI_API_KEY or provide a token file at {0}")]
    MissingCredentials(String),

    #[error("Invalid value for {name}: {value:?}")]
    InvalidValue { name: &'static str, value: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProviderKind {
    #[default]
    OpenAi,
    Fake,
}

/// Completion client configuration.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub provider: ProviderKind,
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
    /// Disk cache for replies; `None` disables caching.
    pub cache_dir: Option<PathBuf>,
    pub backoff: BackoffPolicy,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: ProviderKind::default(),
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            cache_dir: Some(Self::default_cache_dir()),
            backoff: BackoffPolicy::default(),
        }
    }
}

impl LlmConfig {
    /// Load configuration from environment variables.
    ///
    /// - `SOUS_PROVIDER`: `openai` (default) or `fake`
    /// - `OPENAI_API_KEY`: API key, falling back to the token file
    /// - `SOUS_TOKEN_FILE`: token file path (default: "secret/openai.token")
    /// - `SOUS_MODEL`: model name (default: "gpt-4o-mini")
    /// - `SOUS_BASE_URL`: API base URL (default: "https://api.openai.com/v1")
    /// - `SOUS_CACHE_DIR`: cache directory, `none` to disable (default: "~/.sous/llm-cache")
    /// - `SOUS_RETRY_MAX_ELAPSED_SECS`: rate-limit retry budget (default: 60)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as `from_env`, reading variables through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let provider = match lookup("SOUS_PROVIDER").as_deref().map(str::trim) {
            None | Some("") | Some("openai") => ProviderKind::OpenAi,
            Some("fake") => ProviderKind::Fake,
            Some(other) => return Err(ConfigError::UnknownProvider(other.to_string())),
        };

        let token_file = lookup("SOUS_TOKEN_FILE").unwrap_or_else(|| DEFAULT_TOKEN_FILE.to_string());
        let api_key = lookup("OPENAI_API_KEY")
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .or_else(|| {
                fs::read_to_string(&token_file)
                    .ok()
                    .map(|k| k.trim().to_string())
                    .filter(|k| !k.is_empty())
            });

        if provider == ProviderKind::OpenAi && api_key.is_none() {
            return Err(ConfigError::MissingCredentials(token_file));
        }

        let model = lookup("SOUS_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string());
        let base_url = lookup("SOUS_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        let cache_dir = match lookup("SOUS_CACHE_DIR") {
            Some(dir) if dir.eq_ignore_ascii_case("none") => None,
            Some(dir) => Some(PathBuf::from(dir)),
            None => Some(Self::default_cache_dir()),
        };

        let max_elapsed_secs = match lookup("SOUS_RETRY_MAX_ELAPSED_SECS") {
            Some(value) => value.trim().parse().map_err(|_| ConfigError::InvalidValue {
                name: "SOUS_RETRY_MAX_ELAPSED_SECS",
                value,
            })?,
            None => DEFAULT_RETRY_MAX_ELAPSED_SECS,
        };

        Ok(Self {
            provider,
            api_key,
            model,
            base_url,
            cache_dir,
            backoff: BackoffPolicy {
                max_elapsed: Duration::from_secs(max_elapsed_secs),
                ..BackoffPolicy::default()
            },
        })
    }

    /// Get the default cache directory: ~/.sous/llm-cache
    pub fn default_cache_dir() -> PathBuf {
        dirs::home_dir()
            .map(|h| h.join(".sous").join("llm-cache"))
            .unwrap_or_else(|| PathBuf::from("data/llm-cache"))
    }
}
