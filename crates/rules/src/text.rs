//! Plain-text splitting: paragraphs first, sentence packing for long ones.

use ragline_core::ChunkRecord;
use tracing::debug;

use crate::SplitRule;

/// Two-level cascading splitter for plain text.
///
/// Paragraphs (blank-line separated) below `sentence_threshold` become one
/// chunk each. Longer paragraphs are cut at sentence boundaries and the
/// sentences greedily packed so no emitted chunk exceeds `max_chunk_size`
/// characters, except a single sentence that is itself oversized, which is
/// emitted whole rather than truncated. Chunks shorter than `min_chunk_size`
/// are flagged `undersized` in metadata but never merged away.
pub struct TextSplitRule {
    max_chunk_size: usize,
    min_chunk_size: usize,
    sentence_threshold: usize,
}

impl TextSplitRule {
    pub fn new(max_chunk_size: usize, min_chunk_size: usize, sentence_threshold: usize) -> Self {
        Self {
            max_chunk_size,
            min_chunk_size,
            sentence_threshold,
        }
    }

    /// Advisory quality signal: mark chunks below the minimum, keep them.
    fn tag_undersized(&self, chunk: ChunkRecord) -> ChunkRecord {
        if chunk.content.chars().count() < self.min_chunk_size {
            debug!(
                chars = chunk.content.chars().count(),
                min = self.min_chunk_size,
                "chunk below advisory minimum"
            );
            chunk.with_meta("undersized", true)
        } else {
            chunk
        }
    }
}

impl SplitRule for TextSplitRule {
    fn can_handle(&self, _content: &str, content_type: &str) -> bool {
        matches!(content_type.to_lowercase().as_str(), "txt" | "text")
    }

    fn process(&self, content: &str, content_type: &str) -> Vec<ChunkRecord> {
        let mut chunks = Vec::new();
        let mut chunk_index = 0usize;

        for para in split_paragraphs(content) {
            if char_len(para) <= self.sentence_threshold {
                chunks.push(
                    self.tag_undersized(
                        ChunkRecord::new(para, content_type)
                            .with_meta("chunk_index", chunk_index)
                            .with_meta("split_type", "paragraph"),
                    ),
                );
                chunk_index += 1;
                continue;
            }

            let mut running = String::new();
            let mut running_len = 0usize;
            let mut sentence_count = 0usize;

            for sentence in split_sentences(para) {
                let sent_len = char_len(&sentence);
                // +1 for the joining space, so the emitted chunk itself
                // respects the bound.
                if !running.is_empty() && running_len + 1 + sent_len > self.max_chunk_size {
                    chunks.push(
                        self.tag_undersized(
                            ChunkRecord::new(std::mem::take(&mut running), content_type)
                                .with_meta("chunk_index", chunk_index)
                                .with_meta("split_type", "sentence")
                                .with_meta("sentence_count", sentence_count),
                        ),
                    );
                    chunk_index += 1;
                    running_len = 0;
                    sentence_count = 0;
                }
                if running.is_empty() {
                    running_len = sent_len;
                    running = sentence;
                } else {
                    running.push(' ');
                    running.push_str(&sentence);
                    running_len += 1 + sent_len;
                }
                sentence_count += 1;
            }

            if !running.is_empty() {
                chunks.push(
                    self.tag_undersized(
                        ChunkRecord::new(running, content_type)
                            .with_meta("chunk_index", chunk_index)
                            .with_meta("split_type", "sentence")
                            .with_meta("sentence_count", sentence_count),
                    ),
                );
                chunk_index += 1;
            }
        }

        chunks
    }
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Blank-line paragraph split, dropping empty paragraphs.
pub(crate) fn split_paragraphs(content: &str) -> Vec<&str> {
    content
        .split("\n\n")
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect()
}

/// Cut text at sentence-terminal markers: full-width `。！？` (no trailing
/// space required) and half-width `.!?` followed by a space or end of text.
/// Returns trimmed, non-empty sentences covering the whole input.
pub(crate) fn split_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut start = 0usize;

    let mut iter = text.char_indices().peekable();
    while let Some((i, c)) = iter.next() {
        let boundary_end = match c {
            '。' | '！' | '？' => Some(i + c.len_utf8()),
            '.' | '!' | '?' => match iter.peek() {
                Some((_, ' ')) => Some(i + 1 + 1),
                None => Some(i + 1),
                _ => None,
            },
            _ => None,
        };

        if let Some(end) = boundary_end {
            let sentence = text[start..end].trim();
            if !sentence.is_empty() {
                sentences.push(sentence.to_string());
            }
            start = end;
        }
    }

    let tail = text[start..].trim();
    if !tail.is_empty() {
        sentences.push(tail.to_string());
    }
    sentences
}
