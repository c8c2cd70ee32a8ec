//! Engagement-ranked feed of one restaurant.
//!
//! Each dish contributes its most-liked media. Pages are ordered by
//! `(like_count DESC, media_id DESC)` and bounded by a rank cursor holding
//! both keys, so the many media tied at zero likes still page without gaps.

use std::sync::Arc;

use dishfeed_common::{AppResult, Metrics, config::FeedConfig};
use dishfeed_db::repositories::DishMediaRepository;
use tracing::debug;

use super::cursor::{CursorKind, FeedCursor, decode_or_first_page, take_page};
use super::discovery::IdPage;

/// Restaurant feed request.
#[derive(Debug, Clone, Default)]
pub struct RestaurantFeedParams {
    /// Restaurant whose media to rank.
    pub restaurant_id: String,
    /// Page size; clamped to the configured maximum.
    pub limit: Option<u64>,
    /// Cursor from the previous page.
    pub cursor: Option<String>,
}

/// Ranks a restaurant's media by likes.
#[derive(Clone)]
pub struct RankedRestaurantFeedQuery {
    media_repo: DishMediaRepository,
    config: FeedConfig,
    metrics: Arc<Metrics>,
}

impl RankedRestaurantFeedQuery {
    /// Create a new ranked feed query.
    #[must_use]
    pub const fn new(media_repo: DishMediaRepository, config: FeedConfig, metrics: Arc<Metrics>) -> Self {
        Self {
            media_repo,
            config,
            metrics,
        }
    }

    /// Run the query and return one page of media IDs. An unknown restaurant
    /// yields an empty page.
    pub async fn run(&self, params: &RestaurantFeedParams) -> AppResult<IdPage> {
        let limit = self.config.clamp_limit(params.limit);
        let after = match decode_or_first_page(params.cursor.as_deref(), CursorKind::Rank, &self.metrics) {
            Some(FeedCursor::Rank { like_count, id }) => Some((like_count, id)),
            _ => None,
        };

        let rows = self
            .media_repo
            .ranked_for_restaurant(
                &params.restaurant_id,
                after.as_ref().map(|(count, id)| (*count, id.as_str())),
                limit + 1,
            )
            .await?;
        let (rows, has_more) = take_page(rows, limit);

        let next_cursor = rows.last().filter(|_| has_more).map(|last| {
            FeedCursor::Rank {
                like_count: last.like_count,
                id: last.id.clone(),
            }
            .encode()
        });

        debug!(
            restaurant_id = %params.restaurant_id,
            count = rows.len(),
            has_more,
            "Ranked restaurant page"
        );

        Ok(IdPage {
            ids: rows.into_iter().map(|r| r.id).collect(),
            next_cursor,
        })
    }
}
