//! Dish like repository.
//!
//! Likes on dish media are dual-written: a row in `dish_likes` and a
//! `(dish_media, id, like)` row in `reactions`. Both writes share one
//! transaction so the two stores never disagree about a single like.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use dishfeed_common::{AppResult, Metrics, Timer};
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, FromQueryResult, QueryFilter,
    QueryOrder, QuerySelect, TransactionTrait,
};

use super::{TimeBound, observe};
use crate::entities::{DishLike, dish_like};
use crate::query::SqlParams;

/// Like count for one media item.
#[derive(Debug, Clone, PartialEq, Eq, FromQueryResult)]
pub struct MediaLikeCount {
    /// Dish media ID.
    pub dish_media_id: String,
    /// Number of likes.
    pub like_count: i64,
}

/// Dish like repository for database operations.
#[derive(Clone)]
pub struct DishLikeRepository {
    db: Arc<DatabaseConnection>,
    metrics: Arc<Metrics>,
}

impl DishLikeRepository {
    /// Create a new dish like repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>, metrics: Arc<Metrics>) -> Self {
        Self { db, metrics }
    }

    /// Like counts for every media in `media_ids`, in one grouped query.
    ///
    /// Media without likes are absent from the map.
    pub async fn count_by_media(&self, media_ids: &[String]) -> AppResult<HashMap<String, u64>> {
        if media_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let mut params = SqlParams::new();
        let ids = params.push_list(media_ids.iter().cloned());
        let sql = format!(
            "SELECT dish_media_id, COUNT(*) AS like_count FROM dish_likes \
             WHERE dish_media_id IN ({ids}) GROUP BY dish_media_id"
        );

        let timer = Timer::start();
        let result = MediaLikeCount::find_by_statement(params.into_statement(&sql))
            .all(self.db.as_ref())
            .await;

        Ok(observe(&self.metrics, &timer, result)?
            .into_iter()
            .map(|row| (row.dish_media_id, row.like_count.max(0) as u64))
            .collect())
    }

    /// Which of `media_ids` the user has a `dish_likes` row for.
    pub async fn find_liked_media_ids(
        &self,
        user_id: &str,
        media_ids: &[String],
    ) -> AppResult<HashSet<String>> {
        if media_ids.is_empty() {
            return Ok(HashSet::new());
        }

        let timer = Timer::start();
        let result = DishLike::find()
            .filter(dish_like::Column::UserId.eq(user_id))
            .filter(dish_like::Column::DishMediaId.is_in(media_ids.iter().cloned()))
            .all(self.db.as_ref())
            .await;

        Ok(observe(&self.metrics, &timer, result)?
            .into_iter()
            .map(|like| like.dish_media_id)
            .collect())
    }

    /// A user's likes, newest first, strictly older than `before`.
    pub async fn find_by_user(
        &self,
        user_id: &str,
        before: Option<&TimeBound>,
        limit: u64,
    ) -> AppResult<Vec<dish_like::Model>> {
        let mut query = DishLike::find()
            .filter(dish_like::Column::UserId.eq(user_id))
            .order_by_desc(dish_like::Column::CreatedAt)
            .order_by_desc(dish_like::Column::Id);

        if let Some(before) = before {
            query = query.filter(before.older(dish_like::Column::CreatedAt, dish_like::Column::Id));
        }

        let timer = Timer::start();
        let result = query.limit(limit).all(self.db.as_ref()).await;
        observe(&self.metrics, &timer, result)
    }

    /// Insert the like into both stores. Returns whether a new `dish_likes`
    /// row was created; repeating a like is a no-op.
    pub async fn like(
        &self,
        user_id: &str,
        dish_media_id: &str,
        like_id: &str,
        reaction_id: &str,
    ) -> AppResult<bool> {
        let timer = Timer::start();
        let result = async {
            let txn = self.db.begin().await?;

            let mut params = SqlParams::new();
            let sql = format!(
                "INSERT INTO dish_likes (id, dish_media_id, user_id, created_at) \
                 VALUES ({}, {}, {}, NOW()) \
                 ON CONFLICT (dish_media_id, user_id) DO NOTHING",
                params.push(like_id),
                params.push(dish_media_id),
                params.push(user_id),
            );
            let inserted = txn.execute(params.into_statement(&sql)).await?;

            let mut params = SqlParams::new();
            let sql = format!(
                "INSERT INTO reactions (id, user_id, target_type, target_id, action_type, created_at) \
                 VALUES ({}, {}, 'dish_media', {}, 'like', NOW()) \
                 ON CONFLICT (user_id, target_type, target_id, action_type) DO NOTHING",
                params.push(reaction_id),
                params.push(user_id),
                params.push(dish_media_id),
            );
            txn.execute(params.into_statement(&sql)).await?;

            txn.commit().await?;
            Ok::<_, sea_orm::DbErr>(inserted.rows_affected() > 0)
        }
        .await;
        observe(&self.metrics, &timer, result)
    }

    /// Remove the like from both stores. Returns whether a `dish_likes` row
    /// was removed.
    pub async fn unlike(&self, user_id: &str, dish_media_id: &str) -> AppResult<bool> {
        let timer = Timer::start();
        let result = async {
            let txn = self.db.begin().await?;

            let mut params = SqlParams::new();
            let sql = format!(
                "DELETE FROM dish_likes WHERE dish_media_id = {} AND user_id = {}",
                params.push(dish_media_id),
                params.push(user_id),
            );
            let deleted = txn.execute(params.into_statement(&sql)).await?;

            let mut params = SqlParams::new();
            let sql = format!(
                "DELETE FROM reactions WHERE user_id = {} AND target_type = 'dish_media' \
                 AND target_id = {} AND action_type = 'like'",
                params.push(user_id),
                params.push(dish_media_id),
            );
            txn.execute(params.into_statement(&sql)).await?;

            txn.commit().await?;
            Ok::<_, sea_orm::DbErr>(deleted.rows_affected() > 0)
        }
        .await;
        observe(&self.metrics, &timer, result)
    }
}
