//! Two-phase ingestion steps.
//!
//! An [`IngestionStep`] first inspects its pending input (`decide`) and only
//! then performs work (`execute`). [`run_step`] drives the two phases exactly
//! once per invocation; retries are the caller's business.

mod embedding;
mod state;
mod step;

pub use embedding::{EmbeddingAgent, PendingChunk};
pub use state::AgentState;
pub use step::{run_step, IngestionStep, StepOutcome};
