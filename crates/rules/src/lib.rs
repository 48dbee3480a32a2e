//! Responsibility-chain text splitting engine.
//!
//! Content is dispatched through an ordered list of [`SplitRule`]s; the first
//! rule whose `can_handle` accepts the declared content type segments the text
//! into [`ChunkRecord`]s. When no rule matches, the chain emits the input as a
//! single untouched chunk, so the pipeline never silently drops content.

mod markdown;
mod registry;
mod text;

#[cfg(test)]
mod tests;

pub use markdown::MarkdownSplitRule;
pub use registry::{build_rule, default_chain, RuleKind, UnknownRuleTag};
pub use text::TextSplitRule;

use ragline_core::ChunkRecord;
use tracing::debug;

/// A format-specific segmentation strategy.
pub trait SplitRule: Send + Sync {
    /// Whether this rule applies to the given content and declared type.
    fn can_handle(&self, content: &str, content_type: &str) -> bool;

    /// Segment content into chunks. Implementations must drop fragments that
    /// are empty after trimming.
    fn process(&self, content: &str, content_type: &str) -> Vec<ChunkRecord>;
}

/// Ordered rule chain with first-match dispatch.
///
/// Precedence is a configuration contract: rules are tried strictly in
/// registration order and the first `can_handle` winner takes the input, even
/// if a later rule also claims the type. [`registry::default_chain`] fixes the
/// stock order (markdown before plain text).
#[derive(Default)]
pub struct SplitRuleChain {
    rules: Vec<Box<dyn SplitRule>>,
}

impl SplitRuleChain {
    pub fn new() -> Self {
        Self { rules: Vec::new() }
    }

    /// Append a rule. Earlier registrations win on overlap.
    pub fn add_rule(&mut self, rule: Box<dyn SplitRule>) {
        self.rules.push(rule);
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Dispatch to the first applicable rule, or fall back to one identity
    /// chunk containing the unmodified input.
    pub fn process(&self, content: &str, content_type: &str) -> Vec<ChunkRecord> {
        for rule in &self.rules {
            if rule.can_handle(content, content_type) {
                return rule.process(content, content_type);
            }
        }
        debug!(content_type, "no split rule matched, using identity fallback");
        vec![ChunkRecord::new(content, content_type)]
    }
}
