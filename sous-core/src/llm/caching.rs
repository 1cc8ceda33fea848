//! Caching wrapper for completion providers.
//!
//! Wraps any CompletionProvider to cache replies on disk. The cache key is
//! based on the provider name, model name, prompt name and a hash of the full
//! request.

use super::{Completion, CompletionProvider, CompletionRequest, LlmError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};

/// Cached reply metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheMetadata {
    pub provider: String,
    pub model: String,
    pub prompt_name: String,
    pub request_hash: String,
    pub cached_at: DateTime<Utc>,
}

/// A caching wrapper around any completion provider.
///
/// Same request to same model always returns the same cached reply.
#[derive(Debug)]
pub struct CachingProvider {
    inner: Box<dyn CompletionProvider>,
    cache_dir: PathBuf,
}

impl CachingProvider {
    pub fn new(inner: Box<dyn CompletionProvider>, cache_dir: PathBuf) -> Self {
        Self { inner, cache_dir }
    }

    /// Generate a cache key for a request.
    ///
    /// Sampling parameters are part of the key.
    fn cache_key(&self, request: &CompletionRequest) -> String {
        let mut hasher = Sha256::new();
        hasher.update(request.instruction.as_bytes());
        hasher.update([0u8]);
        hasher.update(request.input.as_bytes());
        hasher.update([0u8]);
        hasher.update(request.temperature.to_le_bytes());
        hasher.update(request.top_p.to_le_bytes());
        let result = hasher.finalize();

        // First 16 bytes keep filenames short
        hex::encode(&result[..16])
    }

    /// Get the cache directory for this provider/model combination.
    fn provider_cache_dir(&self) -> PathBuf {
        self.cache_dir
            .join(self.inner.provider_name())
            .join(self.inner.model_name().replace(['/', ':'], "_"))
    }

    fn cache_path(&self, prompt_name: &str, request_hash: &str) -> PathBuf {
        self.provider_cache_dir()
            .join(prompt_name)
            .join(format!("{}.json", request_hash))
    }

    fn get_cached(&self, prompt_name: &str, request_hash: &str) -> Option<Completion> {
        let path = self.cache_path(prompt_name, request_hash);
        let content = fs::read_to_string(&path).ok()?;
        let cached = serde_json::from_str::<CachedCompletion>(&content).ok()?;

        tracing::debug!(
            provider = self.inner.provider_name(),
            model = self.inner.model_name(),
            prompt = prompt_name,
            request_hash = request_hash,
            "completion cache hit"
        );
        Some(cached.completion)
    }

    fn save_to_cache(
        &self,
        prompt_name: &str,
        request_hash: &str,
        completion: &Completion,
    ) -> Result<(), LlmError> {
        let path = self.cache_path(prompt_name, request_hash);
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).map_err(|e| LlmError::CacheError(e.to_string()))?;
        }

        let cached = CachedCompletion {
            metadata: CacheMetadata {
                provider: self.inner.provider_name().to_string(),
                model: self.inner.model_name().to_string(),
                prompt_name: prompt_name.to_string(),
                request_hash: request_hash.to_string(),
                cached_at: Utc::now(),
            },
            completion: completion.clone(),
        };

        let content = serde_json::to_string_pretty(&cached)
            .map_err(|e| LlmError::CacheError(e.to_string()))?;
        fs::write(&path, content).map_err(|e| LlmError::CacheError(e.to_string()))?;

        tracing::debug!(
            provider = self.inner.provider_name(),
            model = self.inner.model_name(),
            prompt = prompt_name,
            request_hash = request_hash,
            "completion cached"
        );

        Ok(())
    }

    /// Get cache statistics for the wrapped provider/model.
    pub fn cache_stats(&self) -> CacheStats {
        CacheStats::scan(&self.provider_cache_dir())
    }
}

fn count_json_files(dir: &Path, count: &mut usize) {
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };

    for entry in entries.filter_map(|e| e.ok()) {
        let path = entry.path();
        if path.is_dir() {
            count_json_files(&path, count);
        } else if path.extension().is_some_and(|e| e == "json") {
            *count += 1;
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CachedCompletion {
    metadata: CacheMetadata,
    completion: Completion,
}

/// Cache statistics.
#[derive(Debug, Clone, Default)]
pub struct CacheStats {
    pub cached_responses: usize,
}

impl CacheStats {
    /// Count cached replies anywhere under `dir`.
    pub fn scan(dir: &Path) -> Self {
        let mut stats = Self::default();
        count_json_files(dir, &mut stats.cached_responses);
        stats
    }
}

#[async_trait]
impl CompletionProvider for CachingProvider {
    async fn complete(&self, request: &CompletionRequest) -> Result<Completion, LlmError> {
        let request_hash = self.cache_key(request);

        if let Some(cached) = self.get_cached(request.prompt_name, &request_hash) {
            return Ok(cached);
        }

        tracing::debug!(
            provider = self.inner.provider_name(),
            model = self.inner.model_name(),
            prompt = request.prompt_name,
            request_hash = %request_hash,
            "completion cache miss, calling provider"
        );

        let completion = self.inner.complete(request).await?;

        // An empty reply is worth asking for again next time
        if !completion.choices.is_empty() {
            if let Err(e) = self.save_to_cache(request.prompt_name, &request_hash, &completion) {
                tracing::warn!(error = %e, "Failed to cache completion");
            }
        }

        Ok(completion)
    }

    fn provider_name(&self) -> &'static str {
        self.inner.provider_name()
    }

    fn model_name(&self) -> &str {
        self.inner.model_name()
    }
}
