//! HTTP API layer for dishfeed.
//!
//! This crate exposes the feed and reaction services over HTTP:
//!
//! - **Endpoints**: discovery, restaurant feeds, ID lookups, viewer lists and writes
//! - **Extractors**: viewer identity from the gateway header, validated query and body
//! - **Middleware**: shared state and request metrics
//!
//! Built on Axum 0.8 with Tower middleware stack.

pub mod endpoints;
pub mod extractors;
pub mod middleware;
pub mod response;

pub use endpoints::router;
pub use extractors::{MaybeViewer, VIEWER_HEADER, ValidJson, ValidQuery, Viewer};
pub use middleware::{AppState, track_metrics};
