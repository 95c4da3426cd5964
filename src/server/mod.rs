//! HTTP surface over a shared [`SearchEngine`].
//!
//! Routes:
//! - `GET /` service description
//! - `GET /search?q=<query>&limit=<n>`
//! - `GET /stats` index totals, cache and latency statistics
//! - `GET /metrics` latency statistics only
//! - `GET /health`

mod http;

pub use http::{
    ApiError, AppState, IndexSummary, SearchParams, SearchResponse, StatsResponse, router,
    serve_http,
};
