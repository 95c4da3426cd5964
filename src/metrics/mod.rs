//! Running latency counters and a sliding window of recent queries.
//!
//! Every completed search records exactly one [`QueryRecord`], whether it was
//! served from the cache or computed. Counters never decrease; the history
//! window drops its oldest record once it is full.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Latency below which a query meets the fast SLA bucket.
pub const FAST_THRESHOLD_MS: f64 = 50.0;
/// Latency below which a query meets the acceptable SLA bucket.
pub const ACCEPTABLE_THRESHOLD_MS: f64 = 200.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryRecord {
    pub query: String,
    pub time_ms: f64,
    pub cached: bool,
    pub timestamp: DateTime<Utc>,
}

/// Derived view of the aggregator at one instant.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsSnapshot {
    pub total_queries: u64,
    pub total_search_time_ms: f64,
    pub average_search_time_ms: f64,
    pub queries_under_50ms: u64,
    pub queries_under_200ms: u64,
    /// Percentage in [0, 100]
    pub sub_50ms_rate: f64,
    /// Percentage in [0, 100]
    pub sub_200ms_rate: f64,
    /// Newest records last
    pub recent_queries: Vec<QueryRecord>,
}

#[derive(Default)]
struct MetricsState {
    total_queries: u64,
    total_search_time_ms: f64,
    queries_under_50ms: u64,
    queries_under_200ms: u64,
    history: VecDeque<QueryRecord>,
}

pub struct MetricsAggregator {
    state: Mutex<MetricsState>,
    history_limit: usize,
    recent_queries: usize,
}

impl MetricsAggregator {
    /// `history_limit` bounds the sliding window; `recent_queries` is how many
    /// of its newest entries a snapshot carries.
    pub fn new(history_limit: usize, recent_queries: usize) -> Self {
        Self {
            state: Mutex::new(MetricsState {
                history: VecDeque::with_capacity(history_limit.min(4096)),
                ..Default::default()
            }),
            history_limit,
            recent_queries: recent_queries.min(history_limit),
        }
    }

    pub fn record(&self, query: &str, time_ms: f64, cached: bool) {
        let record = QueryRecord {
            query: query.to_string(),
            time_ms,
            cached,
            timestamp: Utc::now(),
        };

        let mut state = self.state.lock();
        state.total_queries += 1;
        state.total_search_time_ms += time_ms;
        if time_ms < FAST_THRESHOLD_MS {
            state.queries_under_50ms += 1;
        }
        if time_ms < ACCEPTABLE_THRESHOLD_MS {
            state.queries_under_200ms += 1;
        }

        if self.history_limit == 0 {
            return;
        }
        if state.history.len() == self.history_limit {
            state.history.pop_front();
        }
        state.history.push_back(record);
    }

    pub fn get_stats(&self) -> MetricsSnapshot {
        let state = self.state.lock();
        let total = state.total_queries;
        let rate = |count: u64| {
            if total == 0 {
                0.0
            } else {
                count as f64 / total as f64 * 100.0
            }
        };
        let average = if total == 0 {
            0.0
        } else {
            state.total_search_time_ms / total as f64
        };

        let skip = state.history.len().saturating_sub(self.recent_queries);
        MetricsSnapshot {
            total_queries: total,
            total_search_time_ms: state.total_search_time_ms,
            average_search_time_ms: average,
            queries_under_50ms: state.queries_under_50ms,
            queries_under_200ms: state.queries_under_200ms,
            sub_50ms_rate: rate(state.queries_under_50ms),
            sub_200ms_rate: rate(state.queries_under_200ms),
            recent_queries: state.history.iter().skip(skip).cloned().collect(),
        }
    }

    /// The whole sliding window, oldest first.
    pub fn history(&self) -> Vec<QueryRecord> {
        self.state.lock().history.iter().cloned().collect()
    }
}

impl Default for MetricsAggregator {
    fn default() -> Self {
        Self::new(1000, 10)
    }
}
