//! Dish media endpoints: discovery, lookup and viewer writes.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};
use dishfeed_common::{AppError, AppResult, GeoPoint};
use dishfeed_core::{DiscoveryParams, DiscoverySort, DishMediaEntry, FeedPage};
use serde::Deserialize;
use validator::{Validate, ValidationError};

use crate::{
    extractors::{MaybeViewer, ValidJson, ValidQuery, Viewer},
    middleware::AppState,
    response::{ItemsResponse, SeenResponse, WriteResponse},
};

/// Discovery query string.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct DiscoverQuery {
    /// `"lat,lng"`.
    #[validate(custom(function = "validate_location"))]
    pub location: String,

    /// Meters.
    #[validate(range(min = 10.0, max = 5000.0))]
    pub radius: Option<f64>,

    /// Restrict to one dish category.
    #[validate(length(min = 1, max = 64))]
    pub category_id: Option<String>,

    /// Page size.
    #[validate(range(min = 1, max = 100))]
    pub limit: Option<u64>,

    /// Opaque cursor from the previous page.
    pub cursor: Option<String>,

    /// `-createdAt` (default), `createdAt` or `distance`.
    #[serde(default)]
    pub sort: DiscoverySort,
}

fn validate_location(location: &str) -> Result<(), ValidationError> {
    GeoPoint::parse(location)
        .map(|_| ())
        .map_err(|_| ValidationError::new("location"))
}

/// Discover dish media around a point.
async fn discover(
    MaybeViewer(viewer_id): MaybeViewer,
    State(state): State<AppState>,
    ValidQuery(query): ValidQuery<DiscoverQuery>,
) -> AppResult<Json<FeedPage>> {
    let params = DiscoveryParams {
        location: query.location,
        radius_m: query.radius,
        category_id: query.category_id,
        limit: query.limit,
        cursor: query.cursor,
        sort: query.sort,
        viewer_id,
    };

    Ok(Json(state.feed_service.discover_nearby(&params).await?))
}

/// ID lookup query string.
#[derive(Debug, Deserialize, Validate)]
pub struct ByIdsQuery {
    /// Comma-separated media IDs.
    #[validate(length(min = 1))]
    pub ids: String,
}

impl ByIdsQuery {
    fn ids(&self) -> Vec<String> {
        self.ids
            .split(',')
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(str::to_string)
            .collect()
    }
}

/// Hydrate an explicit list of media IDs in the given order.
async fn by_ids(
    viewer: MaybeViewer,
    State(state): State<AppState>,
    ValidQuery(query): ValidQuery<ByIdsQuery>,
) -> AppResult<ItemsResponse<DishMediaEntry>> {
    let ids = query.ids();
    if ids.is_empty() {
        return Err(AppError::InvalidQuery("ids must not be empty".to_string()));
    }

    let items = state.feed_service.entries_by_ids(&ids, viewer.id()).await?;
    Ok(ItemsResponse { items })
}

/// Like a media item.
async fn like(
    Viewer(viewer_id): Viewer,
    State(state): State<AppState>,
    Path(media_id): Path<String>,
) -> AppResult<WriteResponse> {
    let changed = state
        .reaction_service
        .like_dish_media(&viewer_id, &media_id)
        .await?;
    Ok(WriteResponse { changed })
}

/// Remove a like from a media item.
async fn unlike(
    Viewer(viewer_id): Viewer,
    State(state): State<AppState>,
    Path(media_id): Path<String>,
) -> AppResult<WriteResponse> {
    let changed = state
        .reaction_service
        .unlike_dish_media(&viewer_id, &media_id)
        .await?;
    Ok(WriteResponse { changed })
}

/// Save a media item.
async fn save(
    Viewer(viewer_id): Viewer,
    State(state): State<AppState>,
    Path(media_id): Path<String>,
) -> AppResult<WriteResponse> {
    let changed = state
        .reaction_service
        .save_dish_media(&viewer_id, &media_id)
        .await?;
    Ok(WriteResponse { changed })
}

/// Unsave a media item.
async fn unsave(
    Viewer(viewer_id): Viewer,
    State(state): State<AppState>,
    Path(media_id): Path<String>,
) -> AppResult<WriteResponse> {
    let changed = state
        .reaction_service
        .unsave_dish_media(&viewer_id, &media_id)
        .await?;
    Ok(WriteResponse { changed })
}

/// Mark seen request.
#[derive(Debug, Deserialize, Validate)]
pub struct SeenRequest {
    /// Media IDs to mark.
    #[validate(length(min = 1, max = 100))]
    pub ids: Vec<String>,
}

/// Mark media as seen by the viewer.
async fn seen(
    Viewer(viewer_id): Viewer,
    State(state): State<AppState>,
    ValidJson(req): ValidJson<SeenRequest>,
) -> AppResult<SeenResponse> {
    let marked = state.reaction_service.mark_seen(&viewer_id, &req.ids).await?;
    Ok(SeenResponse { marked })
}

/// Create the dish media routes.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(discover))
        .route("/by-ids", get(by_ids))
        .route("/seen", post(seen))
        .route("/{id}/likes", post(like).delete(unlike))
        .route("/{id}/save", post(save).delete(unsave))
}
