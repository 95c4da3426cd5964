//! Error types for the snippet search system
//!
//! This module provides structured error types using thiserror for better
//! error handling and actionable error messages.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while walking and chunking repositories
#[derive(Error, Debug)]
pub enum IndexError {
    /// File system errors
    #[error("Repository path '{path}' does not exist")]
    PathNotFound { path: PathBuf },

    #[error("Repository path '{path}' is not a directory")]
    NotADirectory { path: PathBuf },

    #[error("Failed to read file '{path}': {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Index state errors
    #[error("No code snippets to index. Add a repository with supported files first.")]
    EmptyCorpus,

    #[error("Embedding model failed while building the index: {0}")]
    Embedding(#[from] crate::vector::VectorError),

    /// Configuration errors
    #[error("Invalid configuration: {reason}")]
    ConfigError { reason: String },
}

impl IndexError {
    /// Get a stable status code for this error type.
    ///
    /// Returns a string identifier that can be used in JSON responses
    /// for programmatic error handling.
    pub fn status_code(&self) -> String {
        match self {
            Self::PathNotFound { .. } => "PATH_NOT_FOUND",
            Self::NotADirectory { .. } => "NOT_A_DIRECTORY",
            Self::FileRead { .. } => "FILE_READ_ERROR",
            Self::EmptyCorpus => "EMPTY_CORPUS",
            Self::Embedding(_) => "EMBEDDING_ERROR",
            Self::ConfigError { .. } => "CONFIG_ERROR",
        }
        .to_string()
    }

    /// Get recovery suggestions for this error
    pub fn recovery_suggestions(&self) -> Vec<&'static str> {
        match self {
            Self::PathNotFound { .. } | Self::NotADirectory { .. } => vec![
                "Pass the root directory of a repository",
                "Relative paths are resolved against the current directory",
            ],
            Self::EmptyCorpus => vec![
                "Check that the repository contains files with supported extensions",
                "Adjust [indexing] extensions or ignore_dirs in .snipsearch/settings.toml",
            ],
            Self::Embedding(_) => vec![
                "Ensure you have internet connection for first-time model download",
                "Delete the model cache directory if the download was interrupted",
            ],
            Self::FileRead { .. } => vec![
                "Check that the file exists and you have read permissions",
            ],
            Self::ConfigError { .. } => vec!["Run 'snipsearch config' to inspect active settings"],
        }
    }
}

/// Errors raised by the search path
#[derive(Error, Debug)]
pub enum SearchError {
    /// The embedding model or the vector index failed. Never retried here.
    #[error("Search unavailable during {stage}: {reason}")]
    SearchUnavailable { stage: SearchStage, reason: String },

    #[error("Result count must be at least 1")]
    InvalidLimit,
}

impl SearchError {
    pub fn status_code(&self) -> &'static str {
        match self {
            Self::SearchUnavailable { .. } => "SEARCH_UNAVAILABLE",
            Self::InvalidLimit => "INVALID_LIMIT",
        }
    }
}

/// Which collaborator failed during a search
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchStage {
    Embedding,
    VectorSearch,
}

impl std::fmt::Display for SearchStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Embedding => write!(f, "query embedding"),
            Self::VectorSearch => write!(f, "vector search"),
        }
    }
}

/// Errors raised while saving or loading the on-disk index
#[derive(Error, Debug)]
pub enum PersistenceError {
    /// One or both artifacts are absent. A fresh build is required.
    #[error("No index found at '{path}'")]
    Missing { path: PathBuf },

    /// An artifact exists but cannot be decoded.
    #[error("Index artifact '{path}' is corrupted: {reason}")]
    Corrupt { path: PathBuf, reason: String },

    #[error("I/O error on '{path}': {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to serialize index metadata: {0}")]
    Serialization(String),
}

impl PersistenceError {
    pub fn status_code(&self) -> String {
        match self {
            Self::Missing { .. } => "INDEX_MISSING",
            Self::Corrupt { .. } => "INDEX_CORRUPTED",
            Self::Io { .. } => "PERSISTENCE_IO_ERROR",
            Self::Serialization(_) => "SERIALIZATION_ERROR",
        }
        .to_string()
    }

    /// True when the caller should treat this as "no index yet".
    pub fn is_missing(&self) -> bool {
        matches!(self, Self::Missing { .. })
    }

    pub fn recovery_suggestions(&self) -> Vec<&'static str> {
        match self {
            Self::Missing { .. } => vec!["Run 'snipsearch index <path>' to build an index"],
            Self::Corrupt { .. } => vec![
                "Run 'snipsearch index <path> --force' to rebuild from scratch",
                "Check for disk errors or filesystem corruption",
            ],
            Self::Io { .. } => vec!["Check disk space and permissions in the index directory"],
            Self::Serialization(_) => vec![],
        }
    }
}

/// Errors raised by the HTTP layer at startup
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Invalid bind address '{bind}': {reason}")]
    InvalidBind { bind: String, reason: String },

    #[error("Failed to bind {bind}: {source}")]
    Bind {
        bind: String,
        source: std::io::Error,
    },
}

/// Result type alias for index operations
pub type IndexResult<T> = Result<T, IndexError>;

/// Result type alias for search operations
pub type SearchResult<T> = Result<T, SearchError>;

/// Result type alias for persistence operations
pub type PersistenceResult<T> = Result<T, PersistenceError>;
