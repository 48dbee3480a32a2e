//! End-to-end pipeline tests against fake collaborators.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use ragline_agent::StepOutcome;
use ragline_core::{Config, EmbeddingRecord, Metadata, RaglineError};
use ragline_llm::{Embedder, EmbeddingError};
use ragline_pipeline::IngestionPipeline;
use ragline_store::{MemoryStore, SearchResult, StoreError, VectorStore};

/// Deterministic two-dimensional embedding derived from the text.
struct FakeEmbedder;

#[async_trait]
impl Embedder for FakeEmbedder {
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        Ok(texts
            .iter()
            .map(|t| {
                let sum: u32 = t.bytes().map(u32::from).sum();
                vec![t.len() as f32, (sum % 97) as f32]
            })
            .collect())
    }

    fn dimensions(&self) -> usize {
        2
    }
}

/// Fails any write whose batch contains the marker text.
struct SabotagedStore {
    inner: MemoryStore,
    marker: &'static str,
}

#[async_trait]
impl VectorStore for SabotagedStore {
    async fn create_collection(&self, name: &str) -> Result<(), StoreError> {
        self.inner.create_collection(name).await
    }

    async fn add_documents(
        &self,
        collection: &str,
        records: &[EmbeddingRecord],
    ) -> Result<Vec<String>, StoreError> {
        if records.iter().any(|r| r.content.contains(self.marker)) {
            return Err(StoreError::Write("simulated outage".into()));
        }
        self.inner.add_documents(collection, records).await
    }

    async fn search(
        &self,
        collection: &str,
        query_vector: &[f32],
        n_results: usize,
        filter: Option<&Metadata>,
    ) -> Result<Vec<SearchResult>, StoreError> {
        self.inner.search(collection, query_vector, n_results, filter).await
    }

    async fn delete_collection(&self, name: &str) -> Result<(), StoreError> {
        self.inner.delete_collection(name).await
    }

    async fn list_collections(&self) -> Result<Vec<String>, StoreError> {
        self.inner.list_collections().await
    }
}

fn write(dir: &Path, rel: &str, content: &str) {
    let path = dir.join(rel);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, content).unwrap();
}

fn pipeline_with(store: Arc<dyn VectorStore>) -> IngestionPipeline {
    IngestionPipeline::new(&Config::default(), Arc::new(FakeEmbedder), store)
}

async fn stored_count(store: &MemoryStore, collection: &str) -> usize {
    store
        .search(collection, &[1.0, 1.0], 10_000, None)
        .await
        .unwrap()
        .len()
}

#[tokio::test]
async fn ingests_a_text_file_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "notes.txt", "Para one.\n\nPara two.");
    let store = Arc::new(MemoryStore::new());
    let pipeline = pipeline_with(store.clone());

    let outcome = pipeline.ingest_file(&dir.path().join("notes.txt")).await.unwrap();

    assert_eq!(outcome.chunks, 2);
    assert_eq!(outcome.outcome, StepOutcome::Success { count: 2 });
    assert_eq!(stored_count(&store, "documents").await, 2);
}

#[tokio::test]
async fn reingestion_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "stable.txt", "Alpha paragraph.\n\nBeta paragraph.");
    let store = Arc::new(MemoryStore::new());
    let pipeline = pipeline_with(store.clone());
    let path = dir.path().join("stable.txt");

    pipeline.ingest_file(&path).await.unwrap();
    let count_first = stored_count(&store, "documents").await;

    // Same logical chunks, same ids: the second run updates, never duplicates.
    pipeline.ingest_file(&path).await.unwrap();
    let count_second = stored_count(&store, "documents").await;

    assert_eq!(count_first, 2);
    assert_eq!(count_second, count_first);
}

#[tokio::test]
async fn records_carry_document_provenance() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "guide.md", "# Setup\n\nInstall the thing.");
    let store = Arc::new(MemoryStore::new());
    let pipeline = pipeline_with(store.clone());

    pipeline.ingest_file(&dir.path().join("guide.md")).await.unwrap();

    let hits = pipeline.search("Install", 1, None).await.unwrap();
    assert_eq!(hits.len(), 1);
    let meta = &hits[0].metadata;
    assert_eq!(meta["file_name"], "guide.md");
    assert_eq!(meta["file_type"], "md");
    assert_eq!(meta["heading_text"], "Setup");
    assert!(meta.contains_key("chunk_index"));
}

#[tokio::test]
async fn empty_document_is_skipped_not_failed() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "empty.txt", "   \n\n  ");
    let store = Arc::new(MemoryStore::new());
    let pipeline = pipeline_with(store.clone());

    let outcome = pipeline.ingest_file(&dir.path().join("empty.txt")).await.unwrap();

    assert!(matches!(outcome.outcome, StepOutcome::Skipped { .. }));
    assert_eq!(stored_count(&store, "documents").await, 0);
}

#[tokio::test]
async fn missing_file_propagates_not_found() {
    let store = Arc::new(MemoryStore::new());
    let pipeline = pipeline_with(store);

    let err = pipeline
        .ingest_file(Path::new("/no/such/doc.txt"))
        .await
        .unwrap_err();
    assert!(matches!(err, RaglineError::NotFound(_)));
}

#[tokio::test]
async fn directory_run_reports_a_tally_and_never_aborts() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "good.txt", "Healthy content.");
    write(dir.path(), "blank.txt", "   ");
    write(dir.path(), "cursed.txt", "This mentions THE_OUTAGE_MARKER inline.");
    let store = Arc::new(SabotagedStore {
        inner: MemoryStore::new(),
        marker: "THE_OUTAGE_MARKER",
    });
    let pipeline = pipeline_with(store.clone());

    let report = pipeline.ingest_directory(dir.path()).await.unwrap();

    assert_eq!(report.total(), 3);
    assert_eq!(report.succeeded, 1);
    assert_eq!(report.skipped, 1);
    assert_eq!(report.failed, 1);

    // The failing sibling did not block the good document.
    assert_eq!(stored_count(&store.inner, "documents").await, 1);
}

#[tokio::test]
async fn unknown_content_types_fall_back_to_identity_ingestion() {
    let mut config = Config::default();
    config.reader.supported_file_types.push("rst".into());

    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "doc.rst", "Some restructured text.");
    let store = Arc::new(MemoryStore::new());
    let pipeline = IngestionPipeline::new(&config, Arc::new(FakeEmbedder), store.clone());

    let outcome = pipeline.ingest_file(&dir.path().join("doc.rst")).await.unwrap();

    // No rule claims "rst": exactly one verbatim chunk, still stored.
    assert_eq!(outcome.chunks, 1);
    assert_eq!(outcome.outcome, StepOutcome::Success { count: 1 });
    let hits = pipeline.search("restructured", 1, None).await.unwrap();
    assert_eq!(hits[0].content, "Some restructured text.");
}

#[tokio::test]
async fn search_without_collection_is_not_found() {
    let store = Arc::new(MemoryStore::new());
    let pipeline = pipeline_with(store);

    let err = pipeline.search("anything", 5, None).await.unwrap_err();
    assert!(matches!(err, RaglineError::NotFound(_)));
}
