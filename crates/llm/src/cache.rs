use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use lru::LruCache;
use sha2::{Digest, Sha256};
use tokio::sync::Mutex;
use tracing::debug;

use crate::traits::{Embedder, EmbeddingError};

/// Content-addressed LRU cache in front of an embedding backend.
///
/// Keys are SHA-256 digests of the text, so repeated ingestion of unchanged
/// chunks skips the network round-trip entirely.
pub struct CachedEmbedder {
    inner: Arc<dyn Embedder>,
    cache: Mutex<LruCache<[u8; 32], Vec<f32>>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl CachedEmbedder {
    pub fn new(inner: Arc<dyn Embedder>, capacity: usize) -> Self {
        Self {
            inner,
            cache: Mutex::new(LruCache::new(
                NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN),
            )),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    fn hash_text(text: &str) -> [u8; 32] {
        let mut hasher = Sha256::new();
        hasher.update(text.as_bytes());
        hasher.finalize().into()
    }

    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl Embedder for CachedEmbedder {
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let keys: Vec<[u8; 32]> = texts.iter().map(|t| Self::hash_text(t)).collect();

        let mut results: Vec<Option<Vec<f32>>> = vec![None; texts.len()];
        let mut miss_indices = Vec::new();
        {
            let mut cache = self.cache.lock().await;
            for (i, key) in keys.iter().enumerate() {
                if let Some(vector) = cache.get(key) {
                    results[i] = Some(vector.clone());
                } else {
                    miss_indices.push(i);
                }
            }
        }
        self.hits
            .fetch_add((texts.len() - miss_indices.len()) as u64, Ordering::Relaxed);
        self.misses
            .fetch_add(miss_indices.len() as u64, Ordering::Relaxed);

        if !miss_indices.is_empty() {
            let miss_texts: Vec<&str> = miss_indices.iter().map(|&i| texts[i]).collect();
            debug!(
                misses = miss_texts.len(),
                total = texts.len(),
                "embedding cache misses"
            );
            let vectors = self.inner.embed_batch(&miss_texts).await?;
            if vectors.len() != miss_texts.len() {
                return Err(EmbeddingError::Api(format!(
                    "backend returned {} embeddings for {} inputs",
                    vectors.len(),
                    miss_texts.len()
                )));
            }
            let mut cache = self.cache.lock().await;
            for (&i, vector) in miss_indices.iter().zip(vectors) {
                cache.put(keys[i], vector.clone());
                results[i] = Some(vector);
            }
        }

        Ok(results.into_iter().map(|v| v.unwrap_or_default()).collect())
    }

    fn dimensions(&self) -> usize {
        self.inner.dimensions()
    }
}
