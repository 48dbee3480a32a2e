//! In-memory store with optional JSON persistence. Backs tests and local runs.

use std::collections::HashMap;
use std::path::PathBuf;

use async_trait::async_trait;
use ragline_core::{EmbeddingRecord, Metadata};
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::{SearchResult, StoreError, VectorStore};

type Collection = HashMap<String, EmbeddingRecord>;

/// Brute-force cosine store. Records live in a per-collection map keyed by
/// record id, which makes `add_documents` an upsert by construction.
pub struct MemoryStore {
    collections: RwLock<HashMap<String, Collection>>,
    persist_dir: Option<PathBuf>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            collections: RwLock::new(HashMap::new()),
            persist_dir: None,
        }
    }

    /// Open a store persisted under `dir`, loading any existing collections.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)
            .map_err(|e| StoreError::Persist(format!("create {}: {e}", dir.display())))?;

        let mut collections = HashMap::new();
        for entry in std::fs::read_dir(&dir)
            .map_err(|e| StoreError::Persist(format!("read {}: {e}", dir.display())))?
        {
            let entry = entry.map_err(|e| StoreError::Persist(e.to_string()))?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let Some(name) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let data = std::fs::read_to_string(&path)
                .map_err(|e| StoreError::Persist(format!("read {}: {e}", path.display())))?;
            let records: Vec<EmbeddingRecord> = serde_json::from_str(&data)
                .map_err(|e| StoreError::Persist(format!("parse {}: {e}", path.display())))?;
            let collection: Collection =
                records.into_iter().map(|r| (r.id.clone(), r)).collect();
            info!(collection = name, records = collection.len(), "loaded persisted collection");
            collections.insert(name.to_string(), collection);
        }

        Ok(Self {
            collections: RwLock::new(collections),
            persist_dir: Some(dir),
        })
    }

    fn persist_collection(&self, name: &str, collection: &Collection) -> Result<(), StoreError> {
        let Some(dir) = &self.persist_dir else {
            return Ok(());
        };
        let mut records: Vec<&EmbeddingRecord> = collection.values().collect();
        records.sort_by(|a, b| a.id.cmp(&b.id));
        let path = dir.join(format!("{name}.json"));
        let data = serde_json::to_string(&records)
            .map_err(|e| StoreError::Persist(e.to_string()))?;
        std::fs::write(&path, data)
            .map_err(|e| StoreError::Persist(format!("write {}: {e}", path.display())))
    }

    fn remove_persisted(&self, name: &str) {
        if let Some(dir) = &self.persist_dir {
            let _ = std::fs::remove_file(dir.join(format!("{name}.json")));
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn cosine_distance(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 1.0;
    }
    1.0 - dot / (norm_a * norm_b)
}

fn matches_filter(metadata: &Metadata, filter: &Metadata) -> bool {
    filter.iter().all(|(k, v)| metadata.get(k) == Some(v))
}

#[async_trait]
impl VectorStore for MemoryStore {
    async fn create_collection(&self, name: &str) -> Result<(), StoreError> {
        let mut collections = self.collections.write().await;
        if !collections.contains_key(name) {
            debug!(collection = name, "creating collection");
            collections.insert(name.to_string(), Collection::new());
            self.persist_collection(name, &collections[name])?;
        }
        Ok(())
    }

    async fn add_documents(
        &self,
        collection: &str,
        records: &[EmbeddingRecord],
    ) -> Result<Vec<String>, StoreError> {
        let mut collections = self.collections.write().await;
        let coll = collections
            .get_mut(collection)
            .ok_or_else(|| StoreError::CollectionNotFound(collection.to_string()))?;

        let mut ids = Vec::with_capacity(records.len());
        for record in records {
            ids.push(record.id.clone());
            coll.insert(record.id.clone(), record.clone());
        }
        let snapshot = coll.clone();
        drop(collections);
        self.persist_collection(collection, &snapshot)?;
        Ok(ids)
    }

    async fn search(
        &self,
        collection: &str,
        query_vector: &[f32],
        n_results: usize,
        filter: Option<&Metadata>,
    ) -> Result<Vec<SearchResult>, StoreError> {
        let collections = self.collections.read().await;
        let coll = collections
            .get(collection)
            .ok_or_else(|| StoreError::CollectionNotFound(collection.to_string()))?;

        let mut hits: Vec<SearchResult> = coll
            .values()
            .filter(|r| filter.map_or(true, |f| matches_filter(&r.metadata, f)))
            .map(|r| SearchResult {
                content: r.content.clone(),
                metadata: r.metadata.clone(),
                distance: cosine_distance(&r.vector, query_vector),
            })
            .collect();
        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        hits.truncate(n_results);
        Ok(hits)
    }

    async fn delete_collection(&self, name: &str) -> Result<(), StoreError> {
        let mut collections = self.collections.write().await;
        collections
            .remove(name)
            .ok_or_else(|| StoreError::CollectionNotFound(name.to_string()))?;
        self.remove_persisted(name);
        Ok(())
    }

    async fn list_collections(&self) -> Result<Vec<String>, StoreError> {
        let collections = self.collections.read().await;
        let mut names: Vec<String> = collections.keys().cloned().collect();
        names.sort();
        Ok(names)
    }
}
