//! Reaction service: likes, saves and seen marks written by a viewer.
//!
//! Every write is idempotent. Repeating a like or save leaves one row;
//! removing an absent one is a no-op. Only changed rows count into metrics.

use std::sync::Arc;

use dishfeed_common::{AppError, AppResult, IdGenerator, Metrics};
use dishfeed_db::entities::reaction::{ActionType, TargetType};
use tracing::{debug, info};

use super::reaction_aggregator::unique_ids;
use super::repositories::Repositories;

/// Largest number of media marked seen in one call.
pub const MAX_SEEN_BATCH: usize = 100;

/// Reaction service for write operations.
#[derive(Clone)]
pub struct ReactionService {
    repos: Repositories,
    metrics: Arc<Metrics>,
    id_gen: IdGenerator,
}

impl ReactionService {
    /// Create a new reaction service.
    #[must_use]
    pub const fn new(repos: Repositories, metrics: Arc<Metrics>) -> Self {
        Self {
            repos,
            metrics,
            id_gen: IdGenerator::new(),
        }
    }

    /// Like a media item in both like stores. Returns whether a new like was recorded.
    pub async fn like_dish_media(&self, viewer_id: &str, media_id: &str) -> AppResult<bool> {
        self.ensure_media(media_id).await?;

        let added = self
            .repos
            .likes
            .like(viewer_id, media_id, &self.id_gen.generate(), &self.id_gen.generate())
            .await?;
        self.record(added, true);

        info!(viewer_id, media_id, added, "Liked dish media");
        Ok(added)
    }

    /// Remove a media like from both stores. Returns whether a like was removed.
    pub async fn unlike_dish_media(&self, viewer_id: &str, media_id: &str) -> AppResult<bool> {
        self.ensure_media(media_id).await?;

        let removed = self.repos.likes.unlike(viewer_id, media_id).await?;
        self.record(removed, false);

        info!(viewer_id, media_id, removed, "Unliked dish media");
        Ok(removed)
    }

    /// Save a media item.
    pub async fn save_dish_media(&self, viewer_id: &str, media_id: &str) -> AppResult<bool> {
        self.ensure_media(media_id).await?;
        self.put(viewer_id, TargetType::DishMedia, media_id, ActionType::Save)
            .await
    }

    /// Unsave a media item.
    pub async fn unsave_dish_media(&self, viewer_id: &str, media_id: &str) -> AppResult<bool> {
        self.ensure_media(media_id).await?;
        self.remove(viewer_id, TargetType::DishMedia, media_id, ActionType::Save)
            .await
    }

    /// Like a review.
    pub async fn like_dish_review(&self, viewer_id: &str, review_id: &str) -> AppResult<bool> {
        self.ensure_review(review_id).await?;
        self.put(viewer_id, TargetType::DishReviews, review_id, ActionType::Like)
            .await
    }

    /// Unlike a review.
    pub async fn unlike_dish_review(&self, viewer_id: &str, review_id: &str) -> AppResult<bool> {
        self.ensure_review(review_id).await?;
        self.remove(viewer_id, TargetType::DishReviews, review_id, ActionType::Like)
            .await
    }

    /// Mark media as seen so discovery stops returning them to this viewer.
    ///
    /// Unknown IDs are skipped; the call fails with `NotFound` only when none
    /// of the IDs exist. Returns the number of newly recorded media.
    pub async fn mark_seen(&self, viewer_id: &str, media_ids: &[String]) -> AppResult<u64> {
        let ids = unique_ids(media_ids);
        if ids.is_empty() {
            return Ok(0);
        }
        if ids.len() > MAX_SEEN_BATCH {
            return Err(AppError::BadRequest(format!(
                "at most {MAX_SEEN_BATCH} media can be marked seen at once, got {}",
                ids.len()
            )));
        }

        let existing = self.repos.media.find_existing_ids(&ids).await?;
        if existing.is_empty() {
            return Err(AppError::NotFound("Dish media not found".to_string()));
        }
        if existing.len() < ids.len() {
            debug!(
                requested = ids.len(),
                existing = existing.len(),
                "Skipping unknown media in seen batch"
            );
        }

        let entries: Vec<(String, String)> = existing
            .into_iter()
            .map(|media_id| (self.id_gen.generate(), media_id))
            .collect();
        let written = self.repos.seen.mark_seen(viewer_id, &entries).await?;

        debug!(viewer_id, written, "Marked media seen");
        Ok(written)
    }

    async fn put(
        &self,
        viewer_id: &str,
        target_type: TargetType,
        target_id: &str,
        action: ActionType,
    ) -> AppResult<bool> {
        let added = self
            .repos
            .reactions
            .upsert(&self.id_gen.generate(), viewer_id, target_type, target_id, action)
            .await?;
        self.record(added, true);

        info!(viewer_id, ?target_type, target_id, ?action, added, "Reaction added");
        Ok(added)
    }

    async fn remove(
        &self,
        viewer_id: &str,
        target_type: TargetType,
        target_id: &str,
        action: ActionType,
    ) -> AppResult<bool> {
        let removed = self
            .repos
            .reactions
            .delete(viewer_id, target_type, target_id, action)
            .await?;
        self.record(removed, false);

        info!(viewer_id, ?target_type, target_id, ?action, removed, "Reaction removed");
        Ok(removed)
    }

    fn record(&self, changed: bool, added: bool) {
        if changed {
            self.metrics.record_reaction(added);
        }
    }

    async fn ensure_media(&self, media_id: &str) -> AppResult<()> {
        self.repos
            .media
            .find_by_id(media_id)
            .await?
            .map(|_| ())
            .ok_or_else(|| AppError::NotFound("Dish media not found".to_string()))
    }

    async fn ensure_review(&self, review_id: &str) -> AppResult<()> {
        self.repos
            .reviews
            .find_by_id(review_id)
            .await?
            .map(|_| ())
            .ok_or_else(|| AppError::NotFound("Dish review not found".to_string()))
    }
}
