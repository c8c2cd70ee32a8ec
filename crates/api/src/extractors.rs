//! Request extractors.
//!
//! The viewer is identified by an upstream gateway; this service only reads
//! the forwarded header and never authenticates. Query strings and JSON
//! bodies are decoded and validated here so every rejection is an
//! [`AppError`].

use axum::{
    Json,
    extract::{FromRequest, FromRequestParts, Query, Request},
    http::request::Parts,
};
use dishfeed_common::{AppError, IdGenerator};
use serde::de::DeserializeOwned;
use validator::Validate;

/// Header carrying the viewer's user ID.
pub const VIEWER_HEADER: &str = "x-viewer-id";

fn viewer_id(parts: &Parts) -> Result<Option<String>, AppError> {
    let Some(value) = parts.headers.get(VIEWER_HEADER) else {
        return Ok(None);
    };
    let id = value
        .to_str()
        .map_err(|_| AppError::BadRequest("viewer id is not valid text".to_string()))?
        .trim();

    if !IdGenerator::is_valid(id) {
        return Err(AppError::BadRequest(format!("viewer id is not a UUID: {id}")));
    }
    Ok(Some(id.to_string()))
}

/// Required viewer extractor.
#[derive(Debug, Clone)]
pub struct Viewer(pub String);

impl<S> FromRequestParts<S> for Viewer
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        viewer_id(parts)?.map(Viewer).ok_or(AppError::Unauthorized)
    }
}

/// Optional viewer extractor. Anonymous requests get unpersonalized entries.
#[derive(Debug, Clone)]
pub struct MaybeViewer(pub Option<String>);

impl MaybeViewer {
    /// The viewer ID, if any.
    #[must_use]
    pub fn id(&self) -> Option<&str> {
        self.0.as_deref()
    }
}

impl<S> FromRequestParts<S> for MaybeViewer
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(viewer_id(parts)?))
    }
}

/// Decoded and validated query string.
///
/// Undecodable values (unknown enum names, non-numeric numbers) and failed
/// validation both reject with `INVALID_QUERY`.
#[derive(Debug, Clone)]
pub struct ValidQuery<T>(pub T);

impl<T, S> FromRequestParts<S> for ValidQuery<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| AppError::InvalidQuery(rejection.body_text()))?;
        value
            .validate()
            .map_err(|errors| AppError::InvalidQuery(errors.to_string()))?;
        Ok(Self(value))
    }
}

/// Decoded and validated JSON body.
#[derive(Debug, Clone)]
pub struct ValidJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| AppError::BadRequest(rejection.body_text()))?;
        value.validate()?;
        Ok(Self(value))
    }
}
