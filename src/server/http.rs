//! axum handlers and server loop

use crate::cache::CacheStats;
use crate::error::{SearchError, ServerError};
use crate::metrics::MetricsSnapshot;
use crate::search::SearchEngine;
use crate::types::SearchHit;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

/// State shared by every handler
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<SearchEngine>,
    pub default_limit: usize,
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    pub q: Option<String>,
    /// Kept as text so a malformed value gets the JSON error body
    pub limit: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub results: Arc<Vec<SearchHit>>,
    pub count: usize,
    pub search_time_ms: f64,
    pub cached: bool,
    pub indexed_files: u64,
    pub indexed_lines: u64,
}

#[derive(Debug, Serialize)]
pub struct IndexSummary {
    pub total_repositories: u64,
    pub total_files: u64,
    pub total_lines: u64,
    pub total_snippets: usize,
}

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub index: IndexSummary,
    pub cache: CacheStats,
    pub performance: MetricsSnapshot,
}

/// JSON error body with an HTTP status
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: &'static str,
    pub message: String,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            code: "BAD_REQUEST",
            message: message.into(),
        }
    }
}

impl From<SearchError> for ApiError {
    fn from(err: SearchError) -> Self {
        let status = match err {
            SearchError::SearchUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            SearchError::InvalidLimit => StatusCode::BAD_REQUEST,
        };
        Self {
            status,
            code: err.status_code(),
            message: err.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(serde_json::json!({
            "error": self.message,
            "code": self.code,
        }));
        (self.status, body).into_response()
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn rounded_snapshot(mut snapshot: MetricsSnapshot) -> MetricsSnapshot {
    snapshot.average_search_time_ms = round2(snapshot.average_search_time_ms);
    snapshot.sub_50ms_rate = round2(snapshot.sub_50ms_rate);
    snapshot.sub_200ms_rate = round2(snapshot.sub_200ms_rate);
    snapshot
}

fn rounded_cache_stats(mut stats: CacheStats) -> CacheStats {
    stats.hit_rate = round2(stats.hit_rate);
    stats
}

fn parse_limit(raw: Option<&str>, default: usize) -> Result<usize, ApiError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(default),
        Some(text) => text.parse().map_err(|_| {
            ApiError::bad_request(format!(
                "Query parameter \"limit\" must be a non-negative integer, got '{text}'"
            ))
        }),
    }
}

async fn index_handler() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "service": "snipsearch",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "/search": "GET ?q=<query>&limit=<n>",
            "/stats": "GET index, cache and performance statistics",
            "/metrics": "GET performance statistics",
            "/health": "GET liveness check",
        }
    }))
}

pub(crate) async fn search_handler(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchResponse>, ApiError> {
    let query = params.q.unwrap_or_default();
    if query.trim().is_empty() {
        return Err(ApiError::bad_request("Query parameter \"q\" is required"));
    }
    let limit = parse_limit(params.limit.as_deref(), state.default_limit)?;

    // Embedding is CPU bound and takes a mutex
    let engine = Arc::clone(&state.engine);
    let query_for_task = query.clone();
    let outcome = tokio::task::spawn_blocking(move || engine.search(&query_for_task, limit))
        .await
        .map_err(|e| ApiError {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            code: "INTERNAL_ERROR",
            message: e.to_string(),
        })??;

    let totals = state.engine.totals();
    Ok(Json(SearchResponse {
        query,
        count: outcome.count(),
        results: outcome.results,
        search_time_ms: round2(outcome.search_time_ms),
        cached: outcome.cached,
        indexed_files: totals.total_files,
        indexed_lines: totals.total_lines,
    }))
}

pub(crate) async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    let engine = &state.engine;
    let totals = engine.totals();
    let total_snippets = engine.index().map(|index| index.len()).unwrap_or(0);

    Json(StatsResponse {
        index: IndexSummary {
            total_repositories: totals.total_repositories,
            total_files: totals.total_files,
            total_lines: totals.total_lines,
            total_snippets,
        },
        cache: rounded_cache_stats(engine.get_cache_stats()),
        performance: rounded_snapshot(engine.get_metrics_snapshot()),
    })
}

async fn metrics_handler(State(state): State<AppState>) -> Json<MetricsSnapshot> {
    Json(rounded_snapshot(state.engine.get_metrics_snapshot()))
}

async fn health_check() -> &'static str {
    "OK"
}

/// Build the application router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/search", get(search_handler))
        .route("/stats", get(stats_handler))
        .route("/metrics", get(metrics_handler))
        .route("/health", get(health_check))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Serve until Ctrl+C
pub async fn serve_http(state: AppState, bind: &str) -> anyhow::Result<()> {
    let addr: SocketAddr = bind.parse().map_err(|e: std::net::AddrParseError| {
        ServerError::InvalidBind {
            bind: bind.to_string(),
            reason: e.to_string(),
        }
    })?;

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|source| ServerError::Bind {
            bind: bind.to_string(),
            source,
        })?;

    tracing::info!("[server] listening on http://{addr}");
    eprintln!("Search server listening on http://{addr}");
    eprintln!("Search: http://{addr}/search?q=<query>&limit=10");
    eprintln!("Press Ctrl+C to stop the server");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    eprintln!("HTTP server shut down gracefully");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("[server] failed to listen for ctrl+c: {e}");
        // Without a signal handler keep serving until the process is killed
        std::future::pending::<()>().await;
    }
    eprintln!("Received shutdown signal");
}
