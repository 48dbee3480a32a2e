use std::path::Path;

use ragline_core::config::ReaderConfig;
use ragline_core::{DocumentRecord, RaglineError};
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::file::{extension, FileReader};

/// Enumerates and reads all eligible files under a directory.
///
/// Eligibility is decided entirely here: size limit, hidden-file exclusion,
/// extension allow-list, and recursion depth all come from [`ReaderConfig`].
/// A file that fails to read is logged and skipped; it never aborts the run.
pub struct DirReader {
    config: ReaderConfig,
    file_reader: FileReader,
}

impl DirReader {
    pub fn new(config: ReaderConfig) -> Self {
        Self {
            file_reader: FileReader::new(config.clone()),
            config,
        }
    }

    pub fn read_directory(&self, root: &Path) -> Result<Vec<DocumentRecord>, RaglineError> {
        if !root.is_dir() {
            return Err(RaglineError::NotFound(root.display().to_string()));
        }

        let max_depth = if self.config.recursive { usize::MAX } else { 1 };
        let skip_hidden = self.config.skip_hidden;

        let mut documents = Vec::new();
        let walker = WalkDir::new(root)
            .max_depth(max_depth)
            .into_iter()
            .filter_entry(move |entry| {
                // Keep the root itself; otherwise prune hidden names early so
                // hidden directories are not descended into.
                entry.depth() == 0 || !(skip_hidden && is_hidden(entry.file_name()))
            });

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!(error = %e, "failed to walk directory entry");
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.path();

            if !self.should_process(path) {
                continue;
            }

            let relative = path
                .strip_prefix(root)
                .unwrap_or(path)
                .to_string_lossy()
                .replace('\\', "/");

            match self.file_reader.read_with_relative(path, &relative) {
                Ok(doc) => documents.push(doc),
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "skipping unreadable file");
                }
            }
        }

        debug!(root = %root.display(), count = documents.len(), "directory read complete");
        Ok(documents)
    }

    fn should_process(&self, path: &Path) -> bool {
        let Some(file_type) = extension(path) else {
            return false;
        };
        if !self.config.supported_file_types.contains(&file_type) {
            return false;
        }
        match std::fs::metadata(path) {
            Ok(meta) if meta.len() > self.config.max_file_size => {
                warn!(path = %path.display(), size = meta.len(), "skipping oversized file");
                false
            }
            Ok(_) => true,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to stat file");
                false
            }
        }
    }
}

fn is_hidden(name: &std::ffi::OsStr) -> bool {
    name.to_string_lossy().starts_with('.')
}
