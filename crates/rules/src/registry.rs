//! Static rule registry: a closed set of type tags resolved at startup.
//!
//! Configuration names rules by tag; unknown tags fail fast instead of being
//! looked up dynamically at dispatch time.

use ragline_core::config::ChunkingConfig;
use thiserror::Error;

use crate::{MarkdownSplitRule, SplitRule, SplitRuleChain, TextSplitRule};

#[derive(Debug, Error)]
#[error("unknown split rule tag: {0}")]
pub struct UnknownRuleTag(pub String);

/// Closed enumeration of available split rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleKind {
    Markdown,
    Text,
}

impl RuleKind {
    pub fn from_tag(tag: &str) -> Result<Self, UnknownRuleTag> {
        match tag.to_lowercase().as_str() {
            "markdown" | "md" => Ok(Self::Markdown),
            "text" | "txt" => Ok(Self::Text),
            other => Err(UnknownRuleTag(other.to_string())),
        }
    }
}

/// Construct a rule for a tag.
pub fn build_rule(kind: RuleKind, config: &ChunkingConfig) -> Box<dyn SplitRule> {
    match kind {
        RuleKind::Markdown => Box::new(MarkdownSplitRule::new()),
        RuleKind::Text => Box::new(TextSplitRule::new(
            config.max_chunk_size,
            config.min_chunk_size,
            config.sentence_threshold,
        )),
    }
}

/// The stock chain. Registration order is the precedence contract: markdown
/// first, then plain text; unmatched types fall through to the identity chunk.
pub fn default_chain(config: &ChunkingConfig) -> SplitRuleChain {
    let mut chain = SplitRuleChain::new();
    chain.add_rule(build_rule(RuleKind::Markdown, config));
    chain.add_rule(build_rule(RuleKind::Text, config));
    chain
}
