//! The request path: cache lookup, embed, nearest-neighbour search, format,
//! cache fill and metrics.

use super::{SearchIndex, similarity_from_distance};
use crate::cache::{CacheEntry, CacheKey, CacheStats, ResultCache};
use crate::config::Settings;
use crate::error::{SearchError, SearchResult, SearchStage};
use crate::metrics::{MetricsAggregator, MetricsSnapshot};
use crate::types::{CorpusTotals, SearchHit, SearchOutcome};
use crate::vector::EmbeddingGenerator;
use parking_lot::RwLock;
use std::sync::Arc;
use std::time::Instant;

/// Shared search orchestrator.
///
/// One instance serves every request. The installed index is read through a
/// short-lived `RwLock` read guard and an `Arc` clone, so embedding and vector
/// search run without holding any lock.
pub struct SearchEngine {
    embedder: Arc<dyn EmbeddingGenerator>,
    cache: ResultCache,
    metrics: MetricsAggregator,
    index: RwLock<Option<Arc<SearchIndex>>>,
    clear_cache_on_rebuild: bool,
}

impl SearchEngine {
    /// Create an engine sized from settings, with no index installed yet.
    pub fn new(embedder: Arc<dyn EmbeddingGenerator>, settings: &Settings) -> Self {
        Self::with_parts(
            embedder,
            ResultCache::new(settings.cache.capacity),
            MetricsAggregator::new(
                settings.metrics.history_limit,
                settings.metrics.recent_queries,
            ),
            settings.search.clear_cache_on_rebuild,
        )
    }

    pub fn with_parts(
        embedder: Arc<dyn EmbeddingGenerator>,
        cache: ResultCache,
        metrics: MetricsAggregator,
        clear_cache_on_rebuild: bool,
    ) -> Self {
        Self {
            embedder,
            cache,
            metrics,
            index: RwLock::new(None),
            clear_cache_on_rebuild,
        }
    }

    /// Swap in a freshly built or loaded index.
    ///
    /// In-flight searches keep the index they started with.
    pub fn install(&self, index: SearchIndex) {
        let snippets = index.len();
        *self.index.write() = Some(Arc::new(index));
        if self.clear_cache_on_rebuild {
            self.cache.clear();
        }
        tracing::info!("[search] installed index with {snippets} snippets");
    }

    pub fn is_ready(&self) -> bool {
        self.index.read().is_some()
    }

    /// The installed index, if any.
    pub fn index(&self) -> Option<Arc<SearchIndex>> {
        self.index.read().clone()
    }

    /// Corpus totals of the installed index, zero when none is installed.
    pub fn totals(&self) -> CorpusTotals {
        self.index
            .read()
            .as_ref()
            .map(|index| index.totals())
            .unwrap_or_default()
    }

    /// Run a query, serving repeated `(query, top_k)` pairs from the cache.
    ///
    /// Returns an empty, uncached outcome with zero latency when no index is
    /// installed. Cached outcomes report the latency of the original computation.
    pub fn search(&self, query: &str, top_k: usize) -> SearchResult<SearchOutcome> {
        if top_k == 0 {
            return Err(SearchError::InvalidLimit);
        }

        let Some(index) = self.index() else {
            return Ok(SearchOutcome::not_ready());
        };

        let key = CacheKey::new(query, top_k);
        if let Some(entry) = self.cache.get(&key) {
            self.metrics.record(query, entry.search_time_ms, true);
            return Ok(SearchOutcome {
                results: entry.results,
                search_time_ms: entry.search_time_ms,
                cached: true,
            });
        }

        let start = Instant::now();

        let embedding = self
            .embedder
            .embed(query)
            .map_err(|e| SearchError::SearchUnavailable {
                stage: SearchStage::Embedding,
                reason: e.to_string(),
            })?;

        let neighbors = index.vectors().search(&embedding, top_k).map_err(|e| {
            SearchError::SearchUnavailable {
                stage: SearchStage::VectorSearch,
                reason: e.to_string(),
            }
        })?;

        let results: Vec<SearchHit> = neighbors
            .iter()
            .filter_map(|neighbor| match index.get(neighbor.position) {
                Some(snippet) => Some(SearchHit::from_snippet(
                    snippet,
                    similarity_from_distance(neighbor.distance),
                )),
                None => {
                    tracing::warn!(
                        "[search] skipping stale position {} (corpus has {} snippets)",
                        neighbor.position,
                        index.len()
                    );
                    None
                }
            })
            .collect();

        let search_time_ms = start.elapsed().as_secs_f64() * 1000.0;
        let results = Arc::new(results);

        // Holding the read guard keeps `install` from swapping and clearing
        // between the check and the put.
        {
            let current = self.index.read();
            if current
                .as_ref()
                .is_some_and(|installed| Arc::ptr_eq(installed, &index))
            {
                self.cache.put(
                    key,
                    CacheEntry {
                        results: Arc::clone(&results),
                        search_time_ms,
                    },
                );
            } else {
                tracing::debug!("[search] index replaced during '{query}', result not cached");
            }
        }
        self.metrics.record(query, search_time_ms, false);

        tracing::debug!(
            "[search] '{query}' top_k={top_k}: {} results in {search_time_ms:.2}ms",
            results.len()
        );

        Ok(SearchOutcome {
            results,
            search_time_ms,
            cached: false,
        })
    }

    pub fn get_cache_stats(&self) -> CacheStats {
        self.cache.get_stats()
    }

    pub fn get_metrics_snapshot(&self) -> MetricsSnapshot {
        self.metrics.get_stats()
    }

    pub fn cache(&self) -> &ResultCache {
        &self.cache
    }

    pub fn metrics(&self) -> &MetricsAggregator {
        &self.metrics
    }
}
