//! Language-model collaborators: embedding backends and text generation.

mod cache;
mod ollama;
mod openai;
mod provider;
mod traits;

pub use cache::CachedEmbedder;
pub use ollama::{OllamaEmbedder, OllamaProvider};
pub use openai::OpenAiEmbedder;
pub use provider::{GenerateOptions, LlmError, LlmProvider};
pub use traits::{Embedder, EmbeddingError};

use std::sync::Arc;

use ragline_core::config::EmbeddingConfig;
use ragline_core::RaglineError;

/// Build the configured embedding backend, wrapped in the LRU cache when
/// `cache_capacity > 0`. An unrecognized backend name is a configuration
/// error and fails fast.
pub fn embedder_from_config(config: &EmbeddingConfig) -> Result<Arc<dyn Embedder>, RaglineError> {
    let inner: Arc<dyn Embedder> = match config.backend.as_str() {
        "ollama" => Arc::new(OllamaEmbedder::new(
            config.base_url.clone(),
            config.model.clone(),
            config.dimensions,
        )),
        "openai" => Arc::new(OpenAiEmbedder::new(
            config.api_key.clone().unwrap_or_default(),
            config.model.clone(),
            Some(config.base_url.clone()),
            config.dimensions,
        )),
        other => {
            return Err(RaglineError::Config(format!(
                "unknown embedding backend: {other}"
            )))
        }
    };

    if config.cache_capacity > 0 {
        Ok(Arc::new(CachedEmbedder::new(inner, config.cache_capacity)))
    } else {
        Ok(inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_embedding_backend_is_a_config_error() {
        let config = EmbeddingConfig {
            backend: "word2vec".into(),
            ..EmbeddingConfig::default()
        };
        let err = embedder_from_config(&config).err().unwrap();
        assert!(matches!(err, RaglineError::Config(_)));
        assert!(err.to_string().contains("word2vec"));
    }

    #[test]
    fn known_backends_resolve() {
        for backend in ["ollama", "openai"] {
            let config = EmbeddingConfig {
                backend: backend.into(),
                ..EmbeddingConfig::default()
            };
            let embedder = embedder_from_config(&config).unwrap();
            assert_eq!(embedder.dimensions(), config.dimensions);
        }
    }
}
