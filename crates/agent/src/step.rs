use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::AgentState;

/// Result summary reported by a step.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StepOutcome {
    /// Work was done; `count` records were stored.
    Success { count: usize },
    /// Nothing to do; absence of input is not an error.
    Skipped { reason: String },
    /// Stage-level failure (e.g. the batched store write).
    Failed { error: String },
}

impl StepOutcome {
    pub fn skipped(reason: impl Into<String>) -> Self {
        Self::Skipped {
            reason: reason.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

/// A two-phase unit of work.
///
/// `decide` inspects pending input and reports whether execution is needed;
/// when it returns false it must record a terminal `Skipped` outcome and cause
/// no side effects. `execute` performs the work and must leave the step in a
/// terminal state before returning. Per-item failures stay inside `execute`;
/// only stage-level failures surface, and then as a `Failed` outcome rather
/// than an error crossing the orchestration loop.
#[async_trait]
pub trait IngestionStep: Send {
    async fn decide(&mut self) -> bool;

    async fn execute(&mut self) -> StepOutcome;

    fn state(&self) -> AgentState;

    /// The outcome recorded by `decide` when no action was needed.
    fn outcome(&self) -> Option<StepOutcome>;
}

/// Drive a step through decide/execute exactly once.
pub async fn run_step<S: IngestionStep + ?Sized>(step: &mut S) -> StepOutcome {
    if step.decide().await {
        step.execute().await
    } else {
        step.outcome()
            .unwrap_or_else(|| StepOutcome::skipped("no action needed"))
    }
}
