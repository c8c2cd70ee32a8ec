//! Restaurant feed endpoints.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::get,
};
use dishfeed_common::AppResult;
use dishfeed_core::{FeedPage, RestaurantFeedParams};

use super::PageQuery;
use crate::{
    extractors::{MaybeViewer, ValidQuery},
    middleware::AppState,
};

/// A restaurant's media, most liked first.
async fn dish_media(
    viewer: MaybeViewer,
    State(state): State<AppState>,
    Path(restaurant_id): Path<String>,
    ValidQuery(query): ValidQuery<PageQuery>,
) -> AppResult<Json<FeedPage>> {
    let params = RestaurantFeedParams {
        restaurant_id,
        limit: query.limit,
        cursor: query.cursor,
    };
    let page = state
        .feed_service
        .discover_for_restaurant(&params, viewer.id())
        .await?;
    Ok(Json(page))
}

/// Create the restaurant routes.
pub fn router() -> Router<AppState> {
    Router::new().route("/{id}/dish-media", get(dish_media))
}
