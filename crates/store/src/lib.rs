//! Vector-store collaborators.
//!
//! The pipeline only depends on the [`VectorStore`] trait; backends are a
//! Chroma HTTP client and a local in-memory store with optional JSON
//! persistence. All writes are upserts keyed by record id, so repeating the
//! same logical write has no effect beyond the first.

mod chroma;
mod memory;

pub use chroma::ChromaStore;
pub use memory::MemoryStore;

use async_trait::async_trait;
use ragline_core::{EmbeddingRecord, Metadata};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("collection not found: {0}")]
    CollectionNotFound(String),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("write failed: {0}")]
    Write(String),

    #[error("persistence error: {0}")]
    Persist(String),

    #[error("failed to parse response: {0}")]
    Parse(String),
}

/// One similarity-search hit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    pub content: String,
    pub metadata: Metadata,
    /// Cosine distance; smaller is closer.
    pub distance: f32,
}

/// Contract with the vector database.
///
/// Every call except `create_collection` fails with
/// [`StoreError::CollectionNotFound`] when the collection does not exist.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Create a collection; no-op if it already exists.
    async fn create_collection(&self, name: &str) -> Result<(), StoreError>;

    /// Upsert records by id. Returns the ids written.
    async fn add_documents(
        &self,
        collection: &str,
        records: &[EmbeddingRecord],
    ) -> Result<Vec<String>, StoreError>;

    /// Nearest-neighbour search, optionally filtered by exact metadata match.
    async fn search(
        &self,
        collection: &str,
        query_vector: &[f32],
        n_results: usize,
        filter: Option<&Metadata>,
    ) -> Result<Vec<SearchResult>, StoreError>;

    async fn delete_collection(&self, name: &str) -> Result<(), StoreError>;

    async fn list_collections(&self) -> Result<Vec<String>, StoreError>;
}
