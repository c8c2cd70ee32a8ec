//! API response types.
//!
//! Feed pages are serialized as [`dishfeed_core::FeedPage`] directly; the
//! types here cover the remaining endpoints.

use axum::{
    Json,
    response::{IntoResponse, Response},
};
use serde::Serialize;

/// Unpaginated list of items.
#[derive(Debug, Serialize)]
pub struct ItemsResponse<T: Serialize> {
    /// The items.
    pub items: Vec<T>,
}

impl<T: Serialize> IntoResponse for ItemsResponse<T> {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

/// Outcome of an idempotent write: whether a row changed.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct WriteResponse {
    /// Whether the write changed a row.
    pub changed: bool,
}

impl IntoResponse for WriteResponse {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

/// Outcome of marking media seen.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct SeenResponse {
    /// Media newly recorded as seen.
    pub marked: u64,
}

impl IntoResponse for SeenResponse {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}
