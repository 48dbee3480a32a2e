//! Tests for the splitting engine.

use ragline_core::config::ChunkingConfig;
use ragline_core::ChunkRecord;

use crate::text::{split_paragraphs, split_sentences};
use crate::{default_chain, MarkdownSplitRule, RuleKind, SplitRule, SplitRuleChain, TextSplitRule};

fn meta_str<'a>(chunk: &'a ChunkRecord, key: &str) -> &'a str {
    chunk.metadata[key].as_str().unwrap()
}

fn meta_u64(chunk: &ChunkRecord, key: &str) -> u64 {
    chunk.metadata[key].as_u64().unwrap()
}

// ── Sentence splitting ──────────────────────────────────────────────

#[test]
fn sentences_cut_at_half_width_markers() {
    let sentences = split_sentences("First one. Second one! Third one? Tail");
    assert_eq!(
        sentences,
        vec!["First one.", "Second one!", "Third one?", "Tail"]
    );
}

#[test]
fn sentences_cut_at_full_width_markers() {
    let sentences = split_sentences("第一句。第二句！第三句？");
    assert_eq!(sentences, vec!["第一句。", "第二句！", "第三句？"]);
}

#[test]
fn period_without_trailing_space_is_not_a_boundary() {
    let sentences = split_sentences("Version 1.2 shipped. Done");
    assert_eq!(sentences, vec!["Version 1.2 shipped.", "Done"]);
}

#[test]
fn terminal_marker_at_end_of_text() {
    let sentences = split_sentences("Only one sentence.");
    assert_eq!(sentences, vec!["Only one sentence."]);
}

#[test]
fn paragraphs_drop_empty_fragments() {
    let paras = split_paragraphs("one\n\n\n\n  \n\ntwo");
    assert_eq!(paras, vec!["one", "two"]);
}

// ── Plain-text rule ─────────────────────────────────────────────────

#[test]
fn short_paragraphs_become_paragraph_chunks() {
    let rule = TextSplitRule::new(1000, 0, 500);
    let chunks = rule.process("Para one.\n\nPara two is quite long but still under threshold.", "txt");
    assert_eq!(chunks.len(), 2);
    for (i, chunk) in chunks.iter().enumerate() {
        assert_eq!(meta_str(chunk, "split_type"), "paragraph");
        assert_eq!(meta_u64(chunk, "chunk_index"), i as u64);
    }
    assert_eq!(chunks[0].content, "Para one.");
}

#[test]
fn long_paragraph_packs_sentences_under_max() {
    let para = (0..40)
        .map(|i| format!("Sentence number {i} with a bit of padding text."))
        .collect::<Vec<_>>()
        .join(" ");
    let rule = TextSplitRule::new(200, 0, 100);
    let chunks = rule.process(&para, "txt");

    assert!(chunks.len() > 1);
    for chunk in &chunks {
        assert!(
            chunk.content.chars().count() <= 200,
            "chunk exceeds bound: {} chars",
            chunk.content.chars().count()
        );
        assert_eq!(meta_str(chunk, "split_type"), "sentence");
        assert!(meta_u64(chunk, "sentence_count") >= 1);
    }
}

#[test]
fn oversized_single_sentence_is_emitted_whole() {
    let sentence = format!("{} end.", "word ".repeat(100));
    let rule = TextSplitRule::new(50, 0, 10);
    let chunks = rule.process(&sentence, "txt");
    assert_eq!(chunks.len(), 1);
    // Never truncated, even though it blows the bound.
    assert!(chunks[0].content.chars().count() > 50);
    assert!(chunks[0].content.ends_with("end."));
}

#[test]
fn chunk_indices_are_contiguous_across_paragraphs() {
    let long = (0..20)
        .map(|i| format!("Filler sentence {i} to pad things out."))
        .collect::<Vec<_>>()
        .join(" ");
    let content = format!("Short intro.\n\n{long}\n\nShort outro.");
    let rule = TextSplitRule::new(120, 0, 60);
    let chunks = rule.process(&content, "txt");
    for (i, chunk) in chunks.iter().enumerate() {
        assert_eq!(meta_u64(chunk, "chunk_index"), i as u64);
    }
}

#[test]
fn text_rule_only_claims_plain_text() {
    let rule = TextSplitRule::new(1000, 0, 500);
    assert!(rule.can_handle("x", "txt"));
    assert!(rule.can_handle("x", "TEXT"));
    assert!(!rule.can_handle("x", "md"));
    assert!(!rule.can_handle("x", "pdf"));
}

#[test]
fn undersized_chunks_are_flagged_not_merged() {
    let rule = TextSplitRule::new(1000, 50, 500);
    let chunks = rule.process("Tiny note.\n\nThis paragraph is comfortably longer than the advisory minimum size.", "txt");

    // Both paragraphs survive; the short one only gains a quality flag.
    assert_eq!(chunks.len(), 2);
    assert!(chunks[0].metadata["undersized"].as_bool().unwrap());
    assert!(!chunks[1].metadata.contains_key("undersized"));
    assert_eq!(chunks[0].content, "Tiny note.");
}

#[test]
fn no_chunk_is_empty_after_trimming() {
    let rule = TextSplitRule::new(100, 0, 50);
    let chunks = rule.process("\n\n  \n\nreal content here\n\n   ", "txt");
    assert_eq!(chunks.len(), 1);
    for chunk in &chunks {
        assert!(!chunk.content.trim().is_empty());
    }
}

// ── Markdown rule ───────────────────────────────────────────────────

#[test]
fn md_splits_at_headings_with_levels() {
    let text = "# Title\n\nIntro para.\n\n## Section\n\nSection para.";
    let chunks = MarkdownSplitRule::new().process(text, "md");
    assert_eq!(chunks.len(), 2);
    assert_eq!(meta_u64(&chunks[0], "heading_level"), 1);
    assert_eq!(meta_str(&chunks[0], "heading_text"), "Title");
    assert_eq!(meta_u64(&chunks[1], "heading_level"), 2);
    assert_eq!(meta_str(&chunks[1], "heading_text"), "Section");
}

#[test]
fn md_content_before_first_heading_is_document_section() {
    let text = "Leading prose.\n\n# First\n\nBody.";
    let chunks = MarkdownSplitRule::new().process(text, "md");
    assert_eq!(meta_u64(&chunks[0], "heading_level"), 0);
    assert_eq!(meta_str(&chunks[0], "heading_text"), "Document");
    assert_eq!(chunks[0].content, "Leading prose.");
}

#[test]
fn md_code_block_round_trips_verbatim() {
    let code = "```rust\nfn main() {\n\n    // # not a heading\n\n}\n```";
    let text = format!("# Code\n\nBefore.\n\n{code}\n\nAfter.");
    let chunks = MarkdownSplitRule::new().process(&text, "md");

    let code_chunk = chunks
        .iter()
        .find(|c| c.metadata["is_code_block"].as_bool().unwrap())
        .expect("code chunk present");
    // Byte-identical to the fenced substring of the input.
    assert_eq!(code_chunk.content, code);
    // Blank lines and the fake heading inside the fence created no sections.
    assert!(chunks
        .iter()
        .all(|c| meta_str(c, "heading_text") == "Code"));
}

#[test]
fn md_multiple_code_blocks_restore_in_position() {
    let text = "# S\n\n```\nfirst\n```\n\nmiddle para\n\n```\nsecond\n```";
    let chunks = MarkdownSplitRule::new().process(text, "md");
    assert_eq!(chunks.len(), 3);
    assert_eq!(chunks[0].content, "```\nfirst\n```");
    assert_eq!(chunks[1].content, "middle para");
    assert_eq!(chunks[2].content, "```\nsecond\n```");
}

#[test]
fn md_unclosed_fence_is_left_as_text() {
    let text = "# S\n\npara\n\n```\ndangling";
    let chunks = MarkdownSplitRule::new().process(text, "md");
    assert_eq!(chunks.len(), 2);
    assert!(chunks[1].content.starts_with("```"));
}

#[test]
fn md_list_items_are_flagged() {
    let text = "# S\n\n- first bullet\n- second bullet\n\nplain paragraph";
    let chunks = MarkdownSplitRule::new().process(text, "md");
    assert_eq!(chunks.len(), 2);
    assert!(chunks[0].metadata["is_list_item"].as_bool().unwrap());
    assert!(!chunks[1].metadata["is_list_item"].as_bool().unwrap());
}

#[test]
fn md_paragraph_index_resets_per_section() {
    let text = "# A\n\none\n\ntwo\n\n# B\n\nthree";
    let chunks = MarkdownSplitRule::new().process(text, "md");
    assert_eq!(meta_u64(&chunks[0], "paragraph_index"), 0);
    assert_eq!(meta_u64(&chunks[1], "paragraph_index"), 1);
    assert_eq!(meta_u64(&chunks[2], "paragraph_index"), 0);
}

#[test]
fn md_heading_requires_space_after_markers() {
    let text = "#NotAHeading\n\n# Real\n\nbody";
    let chunks = MarkdownSplitRule::new().process(text, "md");
    assert_eq!(meta_str(&chunks[0], "heading_text"), "Document");
    assert_eq!(chunks[0].content, "#NotAHeading");
    assert_eq!(meta_str(&chunks[1], "heading_text"), "Real");
}

// ── Chain dispatch ──────────────────────────────────────────────────

#[test]
fn chain_falls_back_to_identity_chunk() {
    let chain = default_chain(&ChunkingConfig::default());
    let input = "column_a,column_b\n1,2\n";
    let chunks = chain.process(input, "csv");
    assert_eq!(chunks.len(), 1);
    assert_eq!(chunks[0].content, input);
    assert!(chunks[0].metadata.is_empty());
}

#[test]
fn chain_dispatches_first_match_in_registration_order() {
    struct GreedyRule;
    impl SplitRule for GreedyRule {
        fn can_handle(&self, _: &str, _: &str) -> bool {
            true
        }
        fn process(&self, _: &str, content_type: &str) -> Vec<ChunkRecord> {
            vec![ChunkRecord::new("greedy", content_type)]
        }
    }

    let mut chain = SplitRuleChain::new();
    chain.add_rule(Box::new(GreedyRule));
    chain.add_rule(Box::new(TextSplitRule::new(1000, 0, 500)));

    // The earlier registration wins even though both claim "txt".
    let chunks = chain.process("some text", "txt");
    assert_eq!(chunks[0].content, "greedy");
}

#[test]
fn default_chain_routes_by_content_type() {
    let chain = default_chain(&ChunkingConfig::default());
    let md = chain.process("# H\n\nbody", "md");
    assert!(md[0].metadata.contains_key("heading_level"));
    let txt = chain.process("plain paragraph", "txt");
    assert_eq!(meta_str(&txt[0], "split_type"), "paragraph");
}

// ── Registry ────────────────────────────────────────────────────────

#[test]
fn registry_resolves_known_tags() {
    assert_eq!(RuleKind::from_tag("markdown").unwrap(), RuleKind::Markdown);
    assert_eq!(RuleKind::from_tag("MD").unwrap(), RuleKind::Markdown);
    assert_eq!(RuleKind::from_tag("txt").unwrap(), RuleKind::Text);
}

#[test]
fn registry_fails_fast_on_unknown_tag() {
    let err = RuleKind::from_tag("docx").unwrap_err();
    assert!(err.to_string().contains("docx"));
}
