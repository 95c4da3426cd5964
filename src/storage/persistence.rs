//! Two-artifact persistence for the search index
//!
//! `code.index` holds the binary vector index, `metadata.json` the snippet
//! corpus and counts. Both must be present for a load to succeed.

use crate::error::{PersistenceError, PersistenceResult};
use crate::search::SearchIndex;
use crate::storage::IndexMetadata;
use crate::vector::{VectorError, VectorIndex, storage as codec};
use std::path::{Path, PathBuf};

/// File name of the serialized vector index
pub const VECTOR_FILE: &str = "code.index";
/// File name of the metadata document
pub const METADATA_FILE: &str = "metadata.json";

/// Manages persistence of the index
#[derive(Debug, Clone)]
pub struct IndexPersistence {
    base_path: PathBuf,
}

impl IndexPersistence {
    /// Create a new persistence manager
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn vector_path(&self) -> PathBuf {
        self.base_path.join(VECTOR_FILE)
    }

    fn metadata_path(&self) -> PathBuf {
        self.base_path.join(METADATA_FILE)
    }

    /// Check if both artifacts exist
    pub fn exists(&self) -> bool {
        self.vector_path().exists() && self.metadata_path().exists()
    }

    /// Write both artifacts. The vector file is written first so a crash
    /// never leaves new metadata pointing at old rows.
    #[must_use = "Save errors should be handled to ensure data is persisted"]
    pub fn save(&self, index: &SearchIndex) -> PersistenceResult<()> {
        let vector_path = self.vector_path();
        codec::write_index_file(&vector_path, index.vectors())
            .map_err(|e| vector_error(&vector_path, e))?;

        let metadata = IndexMetadata::new(index.snippets().to_vec(), index.totals());
        metadata.save(&self.metadata_path())?;

        tracing::info!(
            "[persistence] saved {} snippets to {}",
            index.len(),
            self.base_path.display()
        );
        Ok(())
    }

    /// Load both artifacts and rebuild the search index
    #[must_use = "Load errors should be handled appropriately"]
    pub fn load(&self) -> PersistenceResult<SearchIndex> {
        let vector_path = self.vector_path();
        if !vector_path.exists() {
            return Err(PersistenceError::Missing { path: vector_path });
        }
        // Missing metadata is reported before touching the vector blob
        let metadata = IndexMetadata::load(&self.metadata_path())?;

        let vectors =
            codec::read_index_file(&vector_path).map_err(|e| vector_error(&vector_path, e))?;

        if vectors.len() != metadata.snippets.len() {
            return Err(PersistenceError::Corrupt {
                path: self.base_path.clone(),
                reason: format!(
                    "vector index has {} rows but metadata lists {} snippets",
                    vectors.len(),
                    metadata.snippets.len()
                ),
            });
        }

        tracing::info!(
            "[persistence] loaded {} snippets from {}",
            metadata.snippets.len(),
            self.base_path.display()
        );

        let totals = metadata.totals();
        Ok(SearchIndex::new(metadata.snippets, Box::new(vectors), totals))
    }

    /// Load only the metadata document, for status displays
    pub fn load_metadata(&self) -> PersistenceResult<IndexMetadata> {
        IndexMetadata::load(&self.metadata_path())
    }

    /// Remove both artifacts
    pub fn clear(&self) -> PersistenceResult<()> {
        for path in [self.vector_path(), self.metadata_path()] {
            match std::fs::remove_file(&path) {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(source) => return Err(PersistenceError::Io { path, source }),
            }
        }
        Ok(())
    }
}

fn vector_error(path: &Path, err: VectorError) -> PersistenceError {
    match err {
        VectorError::Storage(source) => PersistenceError::Io {
            path: path.to_path_buf(),
            source,
        },
        other => PersistenceError::Corrupt {
            path: path.to_path_buf(),
            reason: other.to_string(),
        },
    }
}
