//! The metadata artifact: full snippet corpus plus aggregate counts.

use crate::error::{PersistenceError, PersistenceResult};
use crate::types::{CodeSnippet, CorpusTotals};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

/// Version of the metadata document layout
pub const METADATA_VERSION: u32 = 1;

/// Everything needed to restore the snippet store and counters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexMetadata {
    /// Version of the index format
    pub version: u32,

    pub total_files: u64,
    pub total_lines: u64,
    pub total_repositories: u64,

    /// When the index was built
    pub created_at: DateTime<Utc>,

    /// Snippets in vector index row order
    pub snippets: Vec<CodeSnippet>,
}

impl IndexMetadata {
    pub fn new(snippets: Vec<CodeSnippet>, totals: CorpusTotals) -> Self {
        Self {
            version: METADATA_VERSION,
            total_files: totals.total_files,
            total_lines: totals.total_lines,
            total_repositories: totals.total_repositories,
            created_at: Utc::now(),
            snippets,
        }
    }

    pub fn totals(&self) -> CorpusTotals {
        CorpusTotals {
            total_files: self.total_files,
            total_lines: self.total_lines,
            total_repositories: self.total_repositories,
        }
    }

    /// Save metadata to `path`, replacing any previous file atomically
    pub fn save(&self, path: &Path) -> PersistenceResult<()> {
        let json = serde_json::to_vec_pretty(self)
            .map_err(|e| PersistenceError::Serialization(e.to_string()))?;

        let io_err = |source| PersistenceError::Io {
            path: path.to_path_buf(),
            source,
        };
        let dir = path.parent().unwrap_or_else(|| Path::new("."));
        fs::create_dir_all(dir).map_err(io_err)?;

        let mut tmp = NamedTempFile::new_in(dir).map_err(io_err)?;
        tmp.write_all(&json).map_err(io_err)?;
        tmp.as_file().sync_all().map_err(io_err)?;
        tmp.persist(path).map_err(|e| io_err(e.error))?;
        Ok(())
    }

    /// Load metadata from `path`
    pub fn load(path: &Path) -> PersistenceResult<Self> {
        if !path.exists() {
            return Err(PersistenceError::Missing {
                path: path.to_path_buf(),
            });
        }

        let json = fs::read(path).map_err(|source| PersistenceError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let metadata: Self =
            serde_json::from_slice(&json).map_err(|e| PersistenceError::Corrupt {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;

        if metadata.version != METADATA_VERSION {
            return Err(PersistenceError::Corrupt {
                path: path.to_path_buf(),
                reason: format!(
                    "unsupported metadata version {} (expected {METADATA_VERSION})",
                    metadata.version
                ),
            });
        }

        Ok(metadata)
    }

    /// Display source information to the user
    pub fn display_source(&self) {
        eprintln!(
            "Loaded index built {} ({} snippets from {} files in {} repositories)",
            self.created_at.format("%Y-%m-%d %H:%M:%S UTC"),
            self.snippets.len(),
            self.total_files,
            self.total_repositories
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let err = IndexMetadata::load(&temp_dir.path().join("metadata.json")).unwrap_err();
        assert!(err.is_missing());
    }

    #[test]
    fn test_garbage_is_corrupt() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("metadata.json");
        fs::write(&path, "{ not json").unwrap();

        let err = IndexMetadata::load(&path).unwrap_err();
        assert!(matches!(err, PersistenceError::Corrupt { .. }));
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("index").join("metadata.json");
        let totals = CorpusTotals {
            total_files: 2,
            total_lines: 70,
            total_repositories: 1,
        };
        let metadata = IndexMetadata::new(Vec::new(), totals);

        metadata.save(&path).unwrap();
        let loaded = IndexMetadata::load(&path).unwrap();
        assert_eq!(loaded, metadata);
        assert_eq!(loaded.totals(), totals);
    }
}
