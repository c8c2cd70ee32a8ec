//! Radius discovery over the latest media of each dish.

use std::str::FromStr;
use std::sync::Arc;

use chrono::Utc;
use dishfeed_common::{AppError, AppResult, GeoPoint, Metrics, config::FeedConfig};
use dishfeed_db::repositories::{
    DiscoveryFilter, DiscoveryOrder, DiscoveryRow, DishMediaRepository, TimeBound,
};
use serde::Deserialize;
use tracing::debug;

use super::cursor::{CursorKind, FeedCursor, decode_or_first_page, take_page};

/// Sort order of a discovery page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub enum DiscoverySort {
    /// Newest first.
    #[default]
    #[serde(rename = "-createdAt")]
    Newest,
    /// Oldest first.
    #[serde(rename = "createdAt")]
    Oldest,
    /// Nearest first.
    #[serde(rename = "distance")]
    Distance,
}

impl DiscoverySort {
    /// Wire name of the sort.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Newest => "-createdAt",
            Self::Oldest => "createdAt",
            Self::Distance => "distance",
        }
    }

    /// Cursor family a page in this order is bounded by.
    #[must_use]
    pub const fn cursor_kind(self) -> CursorKind {
        match self {
            Self::Newest | Self::Oldest => CursorKind::Time,
            Self::Distance => CursorKind::Distance,
        }
    }

    fn order(self, cursor: Option<FeedCursor>) -> DiscoveryOrder {
        match (self, cursor) {
            (Self::Newest, Some(FeedCursor::Time { at, id })) => DiscoveryOrder::Newest {
                before: Some(TimeBound { at, id }),
            },
            (Self::Newest, _) => DiscoveryOrder::Newest { before: None },
            (Self::Oldest, Some(FeedCursor::Time { at, id })) => DiscoveryOrder::Oldest {
                after: Some(TimeBound { at, id }),
            },
            (Self::Oldest, _) => DiscoveryOrder::Oldest { after: None },
            (Self::Distance, Some(FeedCursor::Distance { meters, id })) => DiscoveryOrder::Nearest {
                after: Some((meters, id)),
            },
            (Self::Distance, _) => DiscoveryOrder::Nearest { after: None },
        }
    }

    fn cursor_for(self, row: &DiscoveryRow) -> FeedCursor {
        match self {
            Self::Newest | Self::Oldest => FeedCursor::Time {
                at: row.created_at.with_timezone(&Utc),
                id: Some(row.id.clone()),
            },
            Self::Distance => FeedCursor::Distance {
                meters: row.distance_m,
                id: Some(row.id.clone()),
            },
        }
    }
}

impl FromStr for DiscoverySort {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "-createdAt" => Ok(Self::Newest),
            "createdAt" => Ok(Self::Oldest),
            "distance" => Ok(Self::Distance),
            other => Err(AppError::InvalidQuery(format!("unknown sort: {other}"))),
        }
    }
}

/// Discovery request.
#[derive(Debug, Clone, Default)]
pub struct DiscoveryParams {
    /// Search center as `"lat,lng"`.
    pub location: String,
    /// Search radius in meters; the configured default when absent.
    pub radius_m: Option<f64>,
    /// Restrict to one dish category.
    pub category_id: Option<String>,
    /// Page size; clamped to the configured maximum.
    pub limit: Option<u64>,
    /// Cursor from the previous page.
    pub cursor: Option<String>,
    /// Result ordering.
    pub sort: DiscoverySort,
    /// Media this viewer has seen are excluded.
    pub viewer_id: Option<String>,
}

/// An ordered page of media IDs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdPage {
    /// Media IDs in feed order.
    pub ids: Vec<String>,
    /// Cursor of the next page; `None` on the last page.
    pub next_cursor: Option<String>,
}

/// Finds candidate media around a point.
#[derive(Clone)]
pub struct GeoDiscoveryQuery {
    media_repo: DishMediaRepository,
    config: FeedConfig,
    metrics: Arc<Metrics>,
}

impl GeoDiscoveryQuery {
    /// Create a new discovery query.
    #[must_use]
    pub const fn new(media_repo: DishMediaRepository, config: FeedConfig, metrics: Arc<Metrics>) -> Self {
        Self {
            media_repo,
            config,
            metrics,
        }
    }

    /// Validate a caller radius against the configured bounds.
    pub fn radius(&self, radius_m: Option<f64>) -> AppResult<f64> {
        let radius = radius_m.unwrap_or_else(|| f64::from(self.config.default_radius_m));
        if !radius.is_finite() || radius <= 0.0 {
            return Err(AppError::InvalidQuery(format!(
                "radius must be a positive number of meters, got {radius}"
            )));
        }

        let (min, max) = (
            f64::from(self.config.min_radius_m),
            f64::from(self.config.max_radius_m),
        );
        if !(min..=max).contains(&radius) {
            return Err(AppError::InvalidQuery(format!(
                "radius must be between {min} and {max} meters, got {radius}"
            )));
        }
        Ok(radius)
    }

    /// Run the query and return one page of media IDs.
    pub async fn run(&self, params: &DiscoveryParams) -> AppResult<IdPage> {
        let origin = GeoPoint::parse(&params.location)?;
        let radius_m = self.radius(params.radius_m)?;
        let limit = self.config.clamp_limit(params.limit);
        let cursor = decode_or_first_page(
            params.cursor.as_deref(),
            params.sort.cursor_kind(),
            &self.metrics,
        );

        let filter = DiscoveryFilter {
            origin,
            radius_m,
            category_id: params.category_id.clone(),
            viewer_id: params.viewer_id.clone(),
            order: params.sort.order(cursor),
            limit: limit + 1,
        };
        let (rows, has_more) = take_page(self.media_repo.discover(&filter).await?, limit);

        let next_cursor = rows
            .last()
            .filter(|_| has_more)
            .map(|last| params.sort.cursor_for(last).encode());

        debug!(
            origin = %origin,
            radius_m,
            sort = params.sort.as_str(),
            count = rows.len(),
            has_more,
            "Discovery page"
        );

        Ok(IdPage {
            ids: rows.into_iter().map(|r| r.id).collect(),
            next_cursor,
        })
    }
}
