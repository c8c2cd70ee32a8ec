//! API middleware.

use std::sync::Arc;
use std::time::Instant;

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};
use dishfeed_common::Metrics;
use dishfeed_core::{FeedService, ReactionService};

/// Application state.
#[derive(Clone)]
pub struct AppState {
    /// Feed composition.
    pub feed_service: FeedService,
    /// Likes, saves and seen markers.
    pub reaction_service: ReactionService,
    /// Shared metrics collector.
    pub metrics: Arc<Metrics>,
}

/// Count every request and its latency by status class.
pub async fn track_metrics(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let started = Instant::now();
    let response = next.run(req).await;
    state
        .metrics
        .record_http_request(response.status().as_u16(), started.elapsed());
    response
}
