//! Common utilities and shared types for dishfeed.
//!
//! This crate provides foundational components used across all dishfeed crates:
//!
//! - **Configuration**: Application settings via [`Config`]
//! - **Error handling**: Unified error types via [`AppError`] and [`AppResult`]
//! - **Geo**: Coordinate parsing and great-circle distance via [`GeoPoint`]
//! - **ID Generation**: UUID-based identifiers via [`IdGenerator`]
//! - **Metrics**: Injected counters via [`Metrics`]
//! - **Storage**: Media URL signing via [`MediaUrlSigner`]
//!
//! # Example
//!
//! ```no_run
//! use dishfeed_common::{AppResult, Config, GeoPoint};
//!
//! fn example() -> AppResult<()> {
//!     let config = Config::load()?;
//!     let origin = GeoPoint::parse("35.68944,139.69167")?;
//!     println!("{} km radius default", config.feed.default_radius_m / 1000);
//!     println!("origin: {origin}");
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod geo;
pub mod id;
pub mod metrics;
pub mod storage;

pub use config::Config;
pub use error::{AppError, AppResult};
pub use geo::{BoundingBox, EARTH_RADIUS_METERS, GeoPoint};
pub use id::IdGenerator;
pub use metrics::{FeedOperation, Metrics, MetricsSnapshot, Timer};
pub use storage::{
    HmacUrlSigner, MediaUrlSigner, PublicUrlSigner, SignedMediaUrls, signer_from_config,
};
