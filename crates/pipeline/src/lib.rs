//! Ingestion orchestration: read → split → embed → store.
//!
//! Documents flow strictly left to right. Directory runs process files
//! independently (one file's failure never aborts its siblings) and finish
//! with a per-file success/skip/fail tally.

use std::path::Path;
use std::sync::Arc;

use ragline_agent::{run_step, EmbeddingAgent, PendingChunk, StepOutcome};
use ragline_core::{chunk_id, Config, DocumentRecord, RaglineError};
use ragline_llm::Embedder;
use ragline_reader::{DirReader, FileReader};
use ragline_rules::{default_chain, SplitRuleChain};
use ragline_store::{SearchResult, StoreError, VectorStore};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Outcome of ingesting one document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentOutcome {
    pub relative_path: String,
    /// Chunks produced by the split stage.
    pub chunks: usize,
    pub outcome: StepOutcome,
}

/// Tally for a directory run. The run always completes; failures are counted,
/// not thrown.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IngestReport {
    pub succeeded: usize,
    pub skipped: usize,
    pub failed: usize,
    pub outcomes: Vec<DocumentOutcome>,
}

impl IngestReport {
    fn push(&mut self, outcome: DocumentOutcome) {
        match &outcome.outcome {
            StepOutcome::Success { .. } => self.succeeded += 1,
            StepOutcome::Skipped { .. } => self.skipped += 1,
            StepOutcome::Failed { .. } => self.failed += 1,
        }
        self.outcomes.push(outcome);
    }

    pub fn total(&self) -> usize {
        self.outcomes.len()
    }
}

pub struct IngestionPipeline {
    file_reader: FileReader,
    dir_reader: DirReader,
    chain: SplitRuleChain,
    embedder: Arc<dyn Embedder>,
    store: Arc<dyn VectorStore>,
    collection: String,
}

impl IngestionPipeline {
    /// Build a pipeline with the stock rule chain.
    pub fn new(config: &Config, embedder: Arc<dyn Embedder>, store: Arc<dyn VectorStore>) -> Self {
        Self::with_chain(config, default_chain(&config.chunking), embedder, store)
    }

    pub fn with_chain(
        config: &Config,
        chain: SplitRuleChain,
        embedder: Arc<dyn Embedder>,
        store: Arc<dyn VectorStore>,
    ) -> Self {
        Self {
            file_reader: FileReader::new(config.reader.clone()),
            dir_reader: DirReader::new(config.reader.clone()),
            chain,
            embedder,
            store,
            collection: config.store.collection_name.clone(),
        }
    }

    /// Ingest a single file. Reading errors (missing path, unsupported type,
    /// decode failure) propagate; everything downstream is reported in the
    /// returned outcome.
    pub async fn ingest_file(&self, path: &Path) -> Result<DocumentOutcome, RaglineError> {
        let document = self.file_reader.read(path)?;
        Ok(self.ingest_document(document).await)
    }

    /// Ingest every eligible file under `path`, independently.
    pub async fn ingest_directory(&self, path: &Path) -> Result<IngestReport, RaglineError> {
        let documents = self.dir_reader.read_directory(path)?;
        let mut report = IngestReport::default();

        for document in documents {
            let outcome = self.ingest_document(document).await;
            if let StepOutcome::Failed { error } = &outcome.outcome {
                warn!(
                    path = %outcome.relative_path,
                    error,
                    "document ingestion failed, continuing with remaining files"
                );
            }
            report.push(outcome);
        }

        info!(
            total = report.total(),
            succeeded = report.succeeded,
            skipped = report.skipped,
            failed = report.failed,
            "directory ingestion complete"
        );
        Ok(report)
    }

    async fn ingest_document(&self, document: DocumentRecord) -> DocumentOutcome {
        let relative_path = document.metadata.relative_path.clone();
        let provenance = document.metadata.to_map();

        let chunks = self
            .chain
            .process(&document.content, &document.metadata.file_type);
        let chunk_count = chunks.len();

        let pending: Vec<PendingChunk> = chunks
            .into_iter()
            .enumerate()
            .filter(|(_, chunk)| !chunk.content.trim().is_empty())
            .map(|(index, chunk)| {
                let id = chunk_id(&relative_path, index, &chunk.content);
                let mut metadata = chunk.metadata;
                metadata
                    .entry("chunk_index".to_string())
                    .or_insert_with(|| index.into());
                metadata.insert("content_type".into(), chunk.content_type.into());
                metadata.extend(provenance.clone());
                PendingChunk {
                    id,
                    content: chunk.content,
                    metadata,
                }
            })
            .collect();

        info!(path = %relative_path, chunks = chunk_count, "document split");

        // Collection creation is idempotent; a failure here is as fatal to
        // this document as a failed write.
        if let Err(e) = self.store.create_collection(&self.collection).await {
            return DocumentOutcome {
                relative_path,
                chunks: chunk_count,
                outcome: StepOutcome::Failed {
                    error: e.to_string(),
                },
            };
        }

        let mut agent = EmbeddingAgent::new(
            pending,
            self.embedder.clone(),
            self.store.clone(),
            self.collection.clone(),
        );
        let outcome = run_step(&mut agent).await;

        DocumentOutcome {
            relative_path,
            chunks: chunk_count,
            outcome,
        }
    }

    /// Embed a query and search the collection.
    pub async fn search(
        &self,
        query: &str,
        n_results: usize,
        filter: Option<&ragline_core::Metadata>,
    ) -> Result<Vec<SearchResult>, RaglineError> {
        let vector = self
            .embedder
            .embed(query)
            .await
            .map_err(|e| RaglineError::Embedding(e.to_string()))?;

        self.store
            .search(&self.collection, &vector, n_results, filter)
            .await
            .map_err(|e| match e {
                StoreError::CollectionNotFound(name) => RaglineError::NotFound(name),
                StoreError::Write(msg) => RaglineError::StoreWrite(msg),
                other => RaglineError::Other(other.to_string()),
            })
    }
}
