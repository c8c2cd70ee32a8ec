//! Viewer lists.

use axum::{
    Json, Router,
    extract::State,
    routing::get,
};
use dishfeed_common::AppResult;
use dishfeed_core::FeedPage;

use super::PageQuery;
use crate::{
    extractors::{ValidQuery, Viewer},
    middleware::AppState,
};

/// Media the viewer liked, latest like first.
async fn liked(
    Viewer(viewer_id): Viewer,
    State(state): State<AppState>,
    ValidQuery(query): ValidQuery<PageQuery>,
) -> AppResult<Json<FeedPage>> {
    let page = state
        .feed_service
        .liked_by_viewer(&viewer_id, query.cursor.as_deref(), query.limit)
        .await?;
    Ok(Json(page))
}

/// Media the viewer saved, latest save first.
async fn saved(
    Viewer(viewer_id): Viewer,
    State(state): State<AppState>,
    ValidQuery(query): ValidQuery<PageQuery>,
) -> AppResult<Json<FeedPage>> {
    let page = state
        .feed_service
        .saved_by_viewer(&viewer_id, query.cursor.as_deref(), query.limit)
        .await?;
    Ok(Json(page))
}

/// Create the viewer routes.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/liked-dish-media", get(liked))
        .route("/saved-dish-media", get(saved))
}
