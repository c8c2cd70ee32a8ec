//! Health and metrics endpoints.

use axum::{
    Json, Router,
    extract::State,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use dishfeed_common::MetricsSnapshot;
use serde::Serialize;

use crate::middleware::AppState;

/// Create the health and metrics router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_check))
        .route("/metrics", get(get_metrics_prometheus))
        .route("/metrics/json", get(get_metrics_json))
}

/// JSON metrics response.
#[derive(Serialize)]
pub struct MetricsResponse {
    /// HTTP counters.
    pub http: HttpMetrics,
    /// Database counters.
    pub database: DatabaseMetrics,
    /// Feed counters.
    pub feed: FeedMetrics,
    /// Reaction counters.
    pub reactions: ReactionMetrics,
}

/// HTTP counters.
#[derive(Serialize)]
pub struct HttpMetrics {
    /// Total requests.
    pub requests_total: u64,
    /// Successful responses.
    pub requests_2xx: u64,
    /// Client error responses.
    pub requests_4xx: u64,
    /// Server error responses.
    pub requests_5xx: u64,
    /// Mean latency in microseconds.
    pub latency_avg_us: u64,
}

/// Database counters.
#[derive(Serialize)]
pub struct DatabaseMetrics {
    /// Statements issued.
    pub queries_total: u64,
    /// Statements that failed.
    pub errors_total: u64,
    /// Mean statement time in microseconds.
    pub query_avg_time_us: u64,
}

/// Feed counters.
#[derive(Serialize)]
pub struct FeedMetrics {
    /// Feed requests served.
    pub requests_total: u64,
    /// Entries returned.
    pub entries_returned: u64,
    /// Media IDs dropped during hydration.
    pub hydration_gaps: u64,
    /// Stale cursors recovered from.
    pub cursors_recovered: u64,
    /// Batch aggregation statements issued.
    pub aggregation_queries: u64,
}

/// Reaction counters.
#[derive(Serialize)]
pub struct ReactionMetrics {
    /// Reactions recorded.
    pub written: u64,
    /// Reactions removed.
    pub removed: u64,
}

impl From<MetricsSnapshot> for MetricsResponse {
    fn from(s: MetricsSnapshot) -> Self {
        Self {
            http: HttpMetrics {
                requests_total: s.http_requests_total,
                requests_2xx: s.http_requests_2xx,
                requests_4xx: s.http_requests_4xx,
                requests_5xx: s.http_requests_5xx,
                latency_avg_us: s.http_request_latency_avg_us,
            },
            database: DatabaseMetrics {
                queries_total: s.db_queries_total,
                errors_total: s.db_errors_total,
                query_avg_time_us: s.db_query_avg_time_us,
            },
            feed: FeedMetrics {
                requests_total: s.feed_requests_total,
                entries_returned: s.feed_entries_returned,
                hydration_gaps: s.hydration_gaps,
                cursors_recovered: s.cursors_recovered,
                aggregation_queries: s.aggregation_queries,
            },
            reactions: ReactionMetrics {
                written: s.reactions_written,
                removed: s.reactions_removed,
            },
        }
    }
}

/// Get metrics in JSON format.
async fn get_metrics_json(State(state): State<AppState>) -> Json<MetricsResponse> {
    Json(MetricsResponse::from(state.metrics.snapshot()))
}

/// Get metrics in Prometheus text format.
async fn get_metrics_prometheus(State(state): State<AppState>) -> Response {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4; charset=utf-8")],
        state.metrics.to_prometheus(),
    )
        .into_response()
}

/// Health check response.
#[derive(Serialize)]
pub struct HealthResponse {
    /// Always `ok`.
    pub status: String,
    /// Crate version.
    pub version: String,
}

/// Liveness check.
async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
