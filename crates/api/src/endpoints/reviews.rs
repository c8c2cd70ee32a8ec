//! Dish review endpoints.

use axum::{
    Router,
    extract::{Path, State},
    routing::post,
};
use dishfeed_common::AppResult;

use crate::{extractors::Viewer, middleware::AppState, response::WriteResponse};

/// Like a review.
async fn like(
    Viewer(viewer_id): Viewer,
    State(state): State<AppState>,
    Path(review_id): Path<String>,
) -> AppResult<WriteResponse> {
    let changed = state
        .reaction_service
        .like_dish_review(&viewer_id, &review_id)
        .await?;
    Ok(WriteResponse { changed })
}

/// Remove a like from a review.
async fn unlike(
    Viewer(viewer_id): Viewer,
    State(state): State<AppState>,
    Path(review_id): Path<String>,
) -> AppResult<WriteResponse> {
    let changed = state
        .reaction_service
        .unlike_dish_review(&viewer_id, &review_id)
        .await?;
    Ok(WriteResponse { changed })
}

/// Create the review routes.
pub fn router() -> Router<AppState> {
    Router::new().route("/{id}/likes", post(like).delete(unlike))
}
