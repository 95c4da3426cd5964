//! Semantic code snippet search with an LRU result cache and latency metrics.
//!
//! Repositories are split into fixed-size line chunks, embedded once, and
//! served through a cache-first [`SearchEngine`]. Every query is recorded by
//! the [`MetricsAggregator`] whether or not it hit the cache.

pub mod cache;
pub mod config;
pub mod display;
pub mod error;
pub mod indexing;
pub mod metrics;
pub mod search;
#[cfg(feature = "http-server")]
pub mod server;
pub mod storage;
pub mod types;
pub mod vector;

// Explicit exports for better API clarity
pub use cache::{CacheEntry, CacheKey, CacheStats, ResultCache};
pub use config::Settings;
pub use error::{
    IndexError, IndexResult, PersistenceError, PersistenceResult, SearchError, SearchResult,
    SearchStage,
};
pub use indexing::{CorpusBuilder, FileWalker, IndexStats};
pub use metrics::{MetricsAggregator, MetricsSnapshot, QueryRecord};
pub use search::{SearchEngine, SearchIndex, similarity_from_distance};
pub use storage::{IndexMetadata, IndexPersistence};
pub use types::{CodeSnippet, CorpusTotals, SearchHit, SearchOutcome};
pub use vector::{EmbeddingGenerator, FastEmbedGenerator, FlatL2Index, VectorIndex};
