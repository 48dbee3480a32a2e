//! Markdown splitting: heading sections with code-fence protection.

use ragline_core::ChunkRecord;

use crate::SplitRule;

/// Private-use sentinel bracketing code-block placeholders. U+E000 does not
/// occur in document text, which keeps substitution collision-free.
const SENTINEL: char = '\u{E000}';

/// Heading-structured splitter for markdown.
///
/// Fenced code blocks are lifted out behind positional placeholders before any
/// parsing, so blank lines or `#` lines inside code never create spurious
/// boundaries. Content is then sectioned at `#`–`######` headings (text before
/// the first heading belongs to an implicit level-0 "Document" section) and
/// each section split into paragraph chunks, with the original code-block text
/// restored verbatim.
pub struct MarkdownSplitRule;

impl MarkdownSplitRule {
    pub fn new() -> Self {
        Self
    }
}

impl Default for MarkdownSplitRule {
    fn default() -> Self {
        Self::new()
    }
}

impl SplitRule for MarkdownSplitRule {
    fn can_handle(&self, _content: &str, content_type: &str) -> bool {
        matches!(content_type.to_lowercase().as_str(), "md" | "markdown")
    }

    fn process(&self, content: &str, content_type: &str) -> Vec<ChunkRecord> {
        let (masked, code_blocks) = mask_code_blocks(content);
        let sections = split_by_headings(&masked);

        let mut chunks = Vec::new();
        for section in sections {
            for (paragraph_index, para) in split_paragraphs_atomic(&section.content)
                .into_iter()
                .enumerate()
            {
                let restored = restore_code_blocks(&para, &code_blocks);
                let trimmed = restored.trim();
                if trimmed.is_empty() {
                    continue;
                }
                chunks.push(
                    ChunkRecord::new(trimmed, content_type)
                        .with_meta("heading_level", section.heading_level)
                        .with_meta("heading_text", section.heading_text.clone())
                        .with_meta("paragraph_index", paragraph_index)
                        .with_meta("is_list_item", is_list_item(trimmed))
                        .with_meta("is_code_block", trimmed.starts_with("```")),
                );
            }
        }
        chunks
    }
}

struct Section {
    heading_level: usize,
    heading_text: String,
    content: String,
}

/// Replace each fenced code block with `\u{E000}N\u{E000}` and return the
/// masked text plus the extracted blocks in positional order. An unclosed
/// trailing fence is left untouched.
fn mask_code_blocks(content: &str) -> (String, Vec<String>) {
    let mut masked = String::with_capacity(content.len());
    let mut blocks = Vec::new();
    let mut rest = content;

    while let Some(open) = rest.find("```") {
        let after_open = open + 3;
        match rest[after_open..].find("```") {
            Some(close_rel) => {
                let end = after_open + close_rel + 3;
                masked.push_str(&rest[..open]);
                masked.push(SENTINEL);
                masked.push_str(&blocks.len().to_string());
                masked.push(SENTINEL);
                blocks.push(rest[open..end].to_string());
                rest = &rest[end..];
            }
            None => break,
        }
    }
    masked.push_str(rest);
    (masked, blocks)
}

/// Substitute placeholders back with the verbatim code-block text.
fn restore_code_blocks(text: &str, blocks: &[String]) -> String {
    if blocks.is_empty() || !text.contains(SENTINEL) {
        return text.to_string();
    }
    let mut out = text.to_string();
    for (i, block) in blocks.iter().enumerate() {
        let placeholder = format!("{SENTINEL}{i}{SENTINEL}");
        out = out.replace(&placeholder, block);
    }
    out
}

/// `#{1,6} ` heading line → (level, title).
fn parse_heading(line: &str) -> Option<(usize, &str)> {
    let level = line.chars().take_while(|&c| c == '#').count();
    if !(1..=6).contains(&level) {
        return None;
    }
    let rest = &line[level..];
    let title = rest.strip_prefix(|c: char| c == ' ' || c == '\t')?.trim();
    if title.is_empty() {
        return None;
    }
    Some((level, title))
}

fn split_by_headings(content: &str) -> Vec<Section> {
    let mut sections = Vec::new();
    let mut current = Section {
        heading_level: 0,
        heading_text: "Document".to_string(),
        content: String::new(),
    };

    for line in content.lines() {
        if let Some((level, title)) = parse_heading(line) {
            if !current.content.trim().is_empty() {
                sections.push(current);
            }
            current = Section {
                heading_level: level,
                heading_text: title.to_string(),
                content: String::new(),
            };
        } else {
            current.content.push_str(line);
            current.content.push('\n');
        }
    }
    if !current.content.trim().is_empty() {
        sections.push(current);
    }
    sections
}

/// Blank-line paragraph split over masked text. Placeholders are single
/// lines, so code-internal blank lines cannot break a block apart.
fn split_paragraphs_atomic(content: &str) -> Vec<String> {
    let mut paragraphs = Vec::new();
    let mut current = String::new();

    for line in content.lines() {
        if line.trim().is_empty() {
            if !current.trim().is_empty() {
                paragraphs.push(std::mem::take(&mut current));
            } else {
                current.clear();
            }
        } else {
            if !current.is_empty() {
                current.push('\n');
            }
            current.push_str(line);
        }
    }
    if !current.trim().is_empty() {
        paragraphs.push(current);
    }
    paragraphs
}

/// Bullet list line: optional indent then `-`, `*`, or `+` and a space.
fn is_list_item(text: &str) -> bool {
    let first_line = text.lines().next().unwrap_or("");
    let trimmed = first_line.trim_start();
    matches!(trimmed.as_bytes().first(), Some(b'-' | b'*' | b'+'))
        && trimmed.as_bytes().get(1) == Some(&b' ')
}
