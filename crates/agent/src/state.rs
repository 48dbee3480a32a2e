use serde::{Deserialize, Serialize};
use tracing::warn;

/// Lifecycle of an ingestion step.
///
/// Created `Idle`, moves to `Running` when `decide` finds work, and ends in
/// `Finished` (success or benign skip) or `Error`. Terminal states are final.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AgentState {
    Idle,
    Running,
    Paused,
    Finished,
    Error,
}

impl AgentState {
    pub fn is_terminal(self) -> bool {
        matches!(self, AgentState::Finished | AgentState::Error)
    }

    /// Apply a transition, refusing to leave a terminal state.
    pub fn advance(&mut self, next: AgentState) {
        if self.is_terminal() {
            warn!(from = ?self, to = ?next, "ignoring transition out of terminal state");
            return;
        }
        *self = next;
    }
}
