use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

/// Open metadata map carried by chunks and stored records.
pub type Metadata = Map<String, Value>;

/// A bounded fragment of a document's text, the unit of embedding and storage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkRecord {
    pub content: String,
    /// Declared content type of the source document ("txt", "md", ...).
    pub content_type: String,
    /// Rule-specific keys: `chunk_index`, `split_type`, `sentence_count`,
    /// `heading_level`, `heading_text`, `paragraph_index`, ...
    pub metadata: Metadata,
}

impl ChunkRecord {
    pub fn new(content: impl Into<String>, content_type: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            content_type: content_type.into(),
            metadata: Metadata::new(),
        }
    }

    pub fn with_meta(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.to_string(), value.into());
        self
    }
}

/// Filesystem provenance of a document, captured at read time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentMeta {
    pub file_name: String,
    pub file_size: u64,
    pub created_time: DateTime<Utc>,
    pub modified_time: DateTime<Utc>,
    /// Lowercased extension ("txt", "md", "pdf").
    pub file_type: String,
    /// Path relative to the ingestion root (the file name for single-file runs).
    pub relative_path: String,
    /// Line count for text files.
    pub line_count: Option<usize>,
    /// Encoding the content was decoded with.
    pub encoding: Option<String>,
}

impl DocumentMeta {
    /// Flatten into a metadata map for record provenance.
    pub fn to_map(&self) -> Metadata {
        let mut map = Metadata::new();
        map.insert("file_name".into(), self.file_name.clone().into());
        map.insert("file_size".into(), self.file_size.into());
        map.insert("created_time".into(), self.created_time.to_rfc3339().into());
        map.insert(
            "modified_time".into(),
            self.modified_time.to_rfc3339().into(),
        );
        map.insert("file_type".into(), self.file_type.clone().into());
        map.insert("relative_path".into(), self.relative_path.clone().into());
        if let Some(n) = self.line_count {
            map.insert("line_count".into(), n.into());
        }
        if let Some(enc) = &self.encoding {
            map.insert("encoding".into(), enc.clone().into());
        }
        map
    }
}

/// A fully read document. Immutable once produced by the reader.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentRecord {
    pub content: String,
    pub metadata: DocumentMeta,
}

/// What gets written to the vector store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingRecord {
    /// Stable id, see [`chunk_id`]. Re-ingestion upserts, never duplicates.
    pub id: String,
    pub content: String,
    pub vector: Vec<f32>,
    pub metadata: Metadata,
}

/// Deterministic record id: SHA-256 over the document's relative path, the
/// chunk index, and the chunk content. Identical input yields an identical id
/// on every ingestion run, so repeated runs update in place.
pub fn chunk_id(relative_path: &str, chunk_index: usize, content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(relative_path.as_bytes());
    hasher.update([0u8]);
    hasher.update(chunk_index.to_le_bytes());
    hasher.update([0u8]);
    hasher.update(content.as_bytes());
    let digest = hasher.finalize();
    digest.iter().map(|b| format!("{b:02x}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunk_id_is_deterministic() {
        let a = chunk_id("docs/guide.md", 3, "some chunk text");
        let b = chunk_id("docs/guide.md", 3, "some chunk text");
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn chunk_id_varies_with_inputs() {
        let base = chunk_id("a.txt", 0, "text");
        assert_ne!(base, chunk_id("b.txt", 0, "text"));
        assert_ne!(base, chunk_id("a.txt", 1, "text"));
        assert_ne!(base, chunk_id("a.txt", 0, "other"));
    }

    #[test]
    fn document_meta_flattens_provenance() {
        let meta = DocumentMeta {
            file_name: "notes.txt".into(),
            file_size: 120,
            created_time: Utc::now(),
            modified_time: Utc::now(),
            file_type: "txt".into(),
            relative_path: "sub/notes.txt".into(),
            line_count: Some(4),
            encoding: Some("utf-8".into()),
        };
        let map = meta.to_map();
        assert_eq!(map["file_name"], "notes.txt");
        assert_eq!(map["relative_path"], "sub/notes.txt");
        assert_eq!(map["line_count"], 4);
    }
}
