//! Feed service.
//!
//! Every read operation has the same shape: a query picks an ordered page of
//! media IDs, then [`EntryAssembler`] hydrates it for the viewer.

use std::sync::Arc;

use chrono::Utc;
use dishfeed_common::{AppError, AppResult, FeedOperation, MediaUrlSigner, Metrics, config::FeedConfig};
use dishfeed_db::entities::reaction::{ActionType, TargetType};
use dishfeed_db::repositories::TimeBound;
use sea_orm::prelude::DateTimeWithTimeZone;
use serde::Serialize;
use tracing::debug;

use super::cursor::{CursorKind, FeedCursor, decode_or_first_page, take_page};
use super::discovery::{DiscoveryParams, GeoDiscoveryQuery, IdPage};
use super::entry_assembler::{DishMediaEntry, EntryAssembler};
use super::ranked_feed::{RankedRestaurantFeedQuery, RestaurantFeedParams};
use super::reaction_aggregator::unique_ids;
use super::repositories::Repositories;

/// One page of hydrated entries.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedPage {
    /// Hydrated entries in feed order.
    pub items: Vec<DishMediaEntry>,
    /// Cursor of the next page; `None` on the last page.
    pub next_cursor: Option<String>,
}

/// Feed service for read operations.
#[derive(Clone)]
pub struct FeedService {
    repos: Repositories,
    discovery: GeoDiscoveryQuery,
    ranked: RankedRestaurantFeedQuery,
    assembler: EntryAssembler,
    config: FeedConfig,
    metrics: Arc<Metrics>,
}

impl FeedService {
    /// Create a new feed service.
    #[must_use]
    pub fn new(
        repos: Repositories,
        signer: Arc<dyn MediaUrlSigner>,
        config: FeedConfig,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self {
            discovery: GeoDiscoveryQuery::new(repos.media.clone(), config.clone(), metrics.clone()),
            ranked: RankedRestaurantFeedQuery::new(repos.media.clone(), config.clone(), metrics.clone()),
            assembler: EntryAssembler::new(
                repos.clone(),
                signer,
                metrics.clone(),
                config.review_embed_limit,
            ),
            repos,
            config,
            metrics,
        }
    }

    /// Latest media per dish around a point.
    pub async fn discover_nearby(&self, params: &DiscoveryParams) -> AppResult<FeedPage> {
        let page = self.discovery.run(params).await?;
        self.hydrate(FeedOperation::Nearby, page, params.viewer_id.as_deref())
            .await
    }

    /// Most-liked media per dish of one restaurant.
    pub async fn discover_for_restaurant(
        &self,
        params: &RestaurantFeedParams,
        viewer_id: Option<&str>,
    ) -> AppResult<FeedPage> {
        let page = self.ranked.run(params).await?;
        self.hydrate(FeedOperation::Restaurant, page, viewer_id).await
    }

    /// Hydrate an explicit ID list, keeping the first occurrence of repeats.
    pub async fn entries_by_ids(
        &self,
        ids: &[String],
        viewer_id: Option<&str>,
    ) -> AppResult<Vec<DishMediaEntry>> {
        let ids = unique_ids(ids);
        if ids.len() as u64 > self.config.max_limit {
            return Err(AppError::InvalidQuery(format!(
                "at most {} ids per request, got {}",
                self.config.max_limit,
                ids.len()
            )));
        }

        let entries = self.assembler.assemble(&ids, viewer_id).await?;
        self.metrics.record_feed(FeedOperation::ByIds, entries.len());
        Ok(entries)
    }

    /// Media the viewer liked, most recent like first.
    pub async fn liked_by_viewer(
        &self,
        viewer_id: &str,
        cursor: Option<&str>,
        limit: Option<u64>,
    ) -> AppResult<FeedPage> {
        let limit = self.config.clamp_limit(limit);
        let before = self.time_bound(cursor);

        let likes = self
            .repos
            .likes
            .find_by_user(viewer_id, before.as_ref(), limit + 1)
            .await?;
        let (likes, has_more) = take_page(likes, limit);

        let next_cursor = likes
            .last()
            .filter(|_| has_more)
            .map(|last| time_cursor(last.created_at, &last.id));
        let page = IdPage {
            ids: likes.into_iter().map(|l| l.dish_media_id).collect(),
            next_cursor,
        };

        self.hydrate(FeedOperation::Liked, page, Some(viewer_id)).await
    }

    /// Media the viewer saved, most recent save first.
    pub async fn saved_by_viewer(
        &self,
        viewer_id: &str,
        cursor: Option<&str>,
        limit: Option<u64>,
    ) -> AppResult<FeedPage> {
        let limit = self.config.clamp_limit(limit);
        let before = self.time_bound(cursor);

        let saves = self
            .repos
            .reactions
            .find_by_user_action(
                viewer_id,
                TargetType::DishMedia,
                ActionType::Save,
                before.as_ref(),
                limit + 1,
            )
            .await?;
        let (saves, has_more) = take_page(saves, limit);

        let next_cursor = saves
            .last()
            .filter(|_| has_more)
            .map(|last| time_cursor(last.created_at, &last.id));
        let page = IdPage {
            ids: saves.into_iter().map(|s| s.target_id).collect(),
            next_cursor,
        };

        self.hydrate(FeedOperation::Saved, page, Some(viewer_id)).await
    }

    fn time_bound(&self, cursor: Option<&str>) -> Option<TimeBound> {
        match decode_or_first_page(cursor, CursorKind::Time, &self.metrics) {
            Some(FeedCursor::Time { at, id }) => Some(TimeBound { at, id }),
            _ => None,
        }
    }

    async fn hydrate(
        &self,
        op: FeedOperation,
        page: IdPage,
        viewer_id: Option<&str>,
    ) -> AppResult<FeedPage> {
        let items = self.assembler.assemble(&page.ids, viewer_id).await?;
        self.metrics.record_feed(op, items.len());

        debug!(
            ?op,
            candidates = page.ids.len(),
            items = items.len(),
            has_next = page.next_cursor.is_some(),
            "Feed page"
        );

        Ok(FeedPage {
            items,
            next_cursor: page.next_cursor,
        })
    }
}

fn time_cursor(created_at: DateTimeWithTimeZone, id: &str) -> String {
    FeedCursor::Time {
        at: created_at.with_timezone(&Utc),
        id: Some(id.to_string()),
    }
    .encode()
}
