//! API endpoints.

mod dish_media;
mod me;
mod metrics;
mod restaurants;
mod reviews;

use axum::{Router, middleware::from_fn_with_state};
use serde::Deserialize;
use validator::Validate;

use crate::middleware::{AppState, track_metrics};

/// Create the API router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .nest("/v1/dish-media", dish_media::router())
        .nest("/v1/restaurants", restaurants::router())
        .nest("/v1/dish-reviews", reviews::router())
        .nest("/v1/users/me", me::router())
        .merge(metrics::router())
        .layer(from_fn_with_state(state.clone(), track_metrics))
        .with_state(state)
}

/// Cursor pagination query string.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct PageQuery {
    /// Page size.
    #[validate(range(min = 1, max = 100))]
    pub limit: Option<u64>,
    /// Opaque cursor from the previous page.
    pub cursor: Option<String>,
}
