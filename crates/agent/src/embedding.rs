use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use ragline_core::{EmbeddingRecord, Metadata};
use ragline_llm::Embedder;
use ragline_store::VectorStore;
use tracing::{debug, error, info, warn};

use crate::{AgentState, IngestionStep, StepOutcome};

/// A chunk ready for embedding: stable id plus content and merged metadata.
#[derive(Debug, Clone)]
pub struct PendingChunk {
    pub id: String,
    pub content: String,
    pub metadata: Metadata,
}

/// Embed-and-store step for one document's chunk batch.
///
/// Each chunk is embedded independently; a failing chunk is logged and
/// skipped. Surviving records are written to the store in one batched upsert.
/// The write failing is stage-fatal; embedding nothing is a benign skip.
pub struct EmbeddingAgent {
    pending: Vec<PendingChunk>,
    embedder: Arc<dyn Embedder>,
    store: Arc<dyn VectorStore>,
    collection: String,
    state: AgentState,
    outcome: Option<StepOutcome>,
}

impl EmbeddingAgent {
    pub fn new(
        pending: Vec<PendingChunk>,
        embedder: Arc<dyn Embedder>,
        store: Arc<dyn VectorStore>,
        collection: impl Into<String>,
    ) -> Self {
        Self {
            pending,
            embedder,
            store,
            collection: collection.into(),
            state: AgentState::Idle,
            outcome: None,
        }
    }
}

#[async_trait]
impl IngestionStep for EmbeddingAgent {
    async fn decide(&mut self) -> bool {
        if self.pending.is_empty() {
            debug!("no document chunks pending, skipping embedding step");
            self.outcome = Some(StepOutcome::skipped("no document chunks to process"));
            self.state.advance(AgentState::Finished);
            return false;
        }
        debug!(chunks = self.pending.len(), "embedding step has work");
        self.state.advance(AgentState::Running);
        true
    }

    async fn execute(&mut self) -> StepOutcome {
        let start = Instant::now();
        let total = self.pending.len();
        let mut embedded = Vec::with_capacity(total);
        let mut failures = 0usize;

        for (i, chunk) in self.pending.drain(..).enumerate() {
            match self.embedder.embed(&chunk.content).await {
                Ok(vector) => {
                    embedded.push(EmbeddingRecord {
                        id: chunk.id,
                        content: chunk.content,
                        vector,
                        metadata: chunk.metadata,
                    });
                }
                Err(e) => {
                    // Isolate the failing chunk, keep going.
                    warn!(chunk = i + 1, total, error = %e, "embedding failed, skipping chunk");
                    failures += 1;
                }
            }
        }

        if embedded.is_empty() {
            info!(total, "no chunks embedded, nothing to store");
            let outcome = StepOutcome::skipped("no embedded chunks to store");
            self.outcome = Some(outcome.clone());
            self.state.advance(AgentState::Finished);
            return outcome;
        }

        let stored = embedded.len();
        match self.store.add_documents(&self.collection, &embedded).await {
            Ok(_) => {
                let elapsed_ms = start.elapsed().as_millis() as u64;
                info!(
                    collection = %self.collection,
                    stored,
                    failures,
                    elapsed_ms,
                    "embedding step complete"
                );
                let outcome = StepOutcome::Success { count: stored };
                self.outcome = Some(outcome.clone());
                self.state.advance(AgentState::Finished);
                outcome
            }
            Err(e) => {
                error!(collection = %self.collection, error = %e, "store write failed");
                let outcome = StepOutcome::Failed {
                    error: e.to_string(),
                };
                self.outcome = Some(outcome.clone());
                self.state.advance(AgentState::Error);
                outcome
            }
        }
    }

    fn state(&self) -> AgentState {
        self.state
    }

    fn outcome(&self) -> Option<StepOutcome> {
        self.outcome.clone()
    }
}
