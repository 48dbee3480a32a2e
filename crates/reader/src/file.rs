use std::path::Path;

use chrono::{DateTime, Utc};
use ragline_core::config::ReaderConfig;
use ragline_core::{DocumentMeta, DocumentRecord, RaglineError};
use tracing::debug;

/// Reads a single file into a [`DocumentRecord`].
pub struct FileReader {
    config: ReaderConfig,
}

impl FileReader {
    pub fn new(config: ReaderConfig) -> Self {
        Self { config }
    }

    /// Read `path` with the file's own name as the relative path.
    pub fn read(&self, path: &Path) -> Result<DocumentRecord, RaglineError> {
        let relative = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        self.read_with_relative(path, &relative)
    }

    /// Read `path`, recording `relative_path` as provenance (directory runs
    /// pass the path relative to the ingestion root).
    pub fn read_with_relative(
        &self,
        path: &Path,
        relative_path: &str,
    ) -> Result<DocumentRecord, RaglineError> {
        if !path.is_file() {
            return Err(RaglineError::NotFound(path.display().to_string()));
        }

        let file_type = extension(path)
            .ok_or_else(|| RaglineError::UnsupportedType(path.display().to_string()))?;
        if !self.config.supported_file_types.contains(&file_type) {
            return Err(RaglineError::UnsupportedType(file_type));
        }

        let bytes = std::fs::read(path)?;
        let (content, encoding, line_count) = match file_type.as_str() {
            "pdf" => (extract_pdf(&bytes)?, None, None),
            _ => {
                let (text, encoding) = decode_text(&bytes, &self.config.default_encoding)
                    .map_err(|e| RaglineError::Decode(format!("{}: {e}", path.display())))?;
                let lines = text.lines().count();
                (text, Some(encoding), Some(lines))
            }
        };

        let fs_meta = std::fs::metadata(path)?;
        let modified_time = fs_meta
            .modified()
            .map(DateTime::<Utc>::from)
            .unwrap_or_else(|_| Utc::now());
        // Creation time is unavailable on some filesystems.
        let created_time = fs_meta
            .created()
            .map(DateTime::<Utc>::from)
            .unwrap_or(modified_time);

        debug!(path = %path.display(), file_type, bytes = bytes.len(), "read document");

        Ok(DocumentRecord {
            content,
            metadata: DocumentMeta {
                file_name: path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default(),
                file_size: fs_meta.len(),
                created_time,
                modified_time,
                file_type,
                relative_path: relative_path.to_string(),
                line_count,
                encoding,
            },
        })
    }
}

pub(crate) fn extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
}

/// Decode text bytes: strict UTF-8 first (BOM stripped), UTF-16 when a BOM
/// says so, then the configured fallback. "lossy" substitutes invalid
/// sequences; anything else exhausts the options and fails.
fn decode_text(bytes: &[u8], fallback: &str) -> Result<(String, String), String> {
    if let Ok(text) = std::str::from_utf8(bytes) {
        let text = text.strip_prefix('\u{FEFF}').unwrap_or(text);
        return Ok((text.trim().to_string(), "utf-8".to_string()));
    }

    if bytes.len() >= 2 {
        let (le, has_bom) = match (bytes[0], bytes[1]) {
            (0xFF, 0xFE) => (true, true),
            (0xFE, 0xFF) => (false, true),
            _ => (false, false),
        };
        if has_bom {
            if (bytes.len() - 2) % 2 != 0 {
                return Err("truncated UTF-16 stream".to_string());
            }
            let units: Vec<u16> = bytes[2..]
                .chunks_exact(2)
                .map(|c| {
                    if le {
                        u16::from_le_bytes([c[0], c[1]])
                    } else {
                        u16::from_be_bytes([c[0], c[1]])
                    }
                })
                .collect();
            let text = char::decode_utf16(units)
                .collect::<Result<String, _>>()
                .map_err(|e| format!("invalid UTF-16: {e}"))?;
            let label = if le { "utf-16le" } else { "utf-16be" };
            return Ok((text.trim().to_string(), label.to_string()));
        }
    }

    if fallback.eq_ignore_ascii_case("lossy") {
        let text = String::from_utf8_lossy(bytes).into_owned();
        return Ok((text.trim().to_string(), "utf-8-lossy".to_string()));
    }

    Err("not valid UTF-8 and no lossy fallback configured".to_string())
}

fn extract_pdf(bytes: &[u8]) -> Result<String, RaglineError> {
    let text = pdf_extract::extract_text_from_mem(bytes)
        .map_err(|e| RaglineError::Decode(format!("PDF extraction failed: {e}")))?;
    // pdf-extract separates pages with form feeds; normalize to blank lines so
    // the paragraph splitter sees page boundaries.
    Ok(text.replace('\x0C', "\n\n").trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reader() -> FileReader {
        FileReader::new(ReaderConfig::default())
    }

    fn write_temp(dir: &tempfile::TempDir, name: &str, bytes: &[u8]) -> std::path::PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, bytes).unwrap();
        path
    }

    #[test]
    fn reads_text_with_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_temp(&dir, "notes.txt", b"line one\nline two");

        let doc = reader().read(&path).unwrap();
        assert_eq!(doc.content, "line one\nline two");
        assert_eq!(doc.metadata.file_name, "notes.txt");
        assert_eq!(doc.metadata.file_type, "txt");
        assert_eq!(doc.metadata.relative_path, "notes.txt");
        assert_eq!(doc.metadata.line_count, Some(2));
        assert_eq!(doc.metadata.encoding.as_deref(), Some("utf-8"));
        assert_eq!(doc.metadata.file_size, 17);
    }

    #[test]
    fn strips_utf8_bom() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_temp(&dir, "bom.txt", "\u{FEFF}hello".as_bytes());

        let doc = reader().read(&path).unwrap();
        assert_eq!(doc.content, "hello");
    }

    #[test]
    fn decodes_utf16_with_bom() {
        let dir = tempfile::tempdir().unwrap();
        let mut bytes = vec![0xFF, 0xFE];
        for unit in "héllo".encode_utf16() {
            bytes.extend_from_slice(&unit.to_le_bytes());
        }
        let path = write_temp(&dir, "wide.txt", &bytes);

        let doc = reader().read(&path).unwrap();
        assert_eq!(doc.content, "héllo");
        assert_eq!(doc.metadata.encoding.as_deref(), Some("utf-16le"));
    }

    #[test]
    fn invalid_bytes_fail_without_lossy_fallback() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_temp(&dir, "bad.txt", &[0xC3, 0x28, 0xA0, 0xFF]);

        let err = reader().read(&path).unwrap_err();
        assert!(matches!(err, RaglineError::Decode(_)));
    }

    #[test]
    fn invalid_bytes_pass_with_lossy_fallback() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_temp(&dir, "bad.txt", &[b'o', b'k', 0xFF, b'!']);

        let config = ReaderConfig {
            default_encoding: "lossy".into(),
            ..ReaderConfig::default()
        };
        let doc = FileReader::new(config).read(&path).unwrap();
        assert!(doc.content.starts_with("ok"));
        assert_eq!(doc.metadata.encoding.as_deref(), Some("utf-8-lossy"));
    }

    #[test]
    fn missing_file_is_not_found() {
        let err = reader().read(Path::new("/no/such/file.txt")).unwrap_err();
        assert!(matches!(err, RaglineError::NotFound(_)));
    }

    #[test]
    fn unsupported_extension_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_temp(&dir, "binary.exe", b"MZ");

        let err = reader().read(&path).unwrap_err();
        assert!(matches!(err, RaglineError::UnsupportedType(_)));
    }
}
