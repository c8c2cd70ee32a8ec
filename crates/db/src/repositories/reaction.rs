//! Reaction repository.

use std::collections::HashMap;
use std::sync::Arc;

use dishfeed_common::{AppResult, Metrics, Timer};
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, FromQueryResult, QueryFilter,
    QueryOrder, QuerySelect,
};

use super::{TimeBound, observe};
use crate::entities::reaction::{ActionType, TargetType};
use crate::entities::{Reaction, reaction};
use crate::query::SqlParams;

/// Reaction count for one target.
#[derive(Debug, Clone, PartialEq, Eq, FromQueryResult)]
pub struct TargetLikeCount {
    /// Target ID.
    pub target_id: String,
    /// Number of matching reactions.
    pub like_count: i64,
}

/// Reaction repository for database operations.
#[derive(Clone)]
pub struct ReactionRepository {
    db: Arc<DatabaseConnection>,
    metrics: Arc<Metrics>,
}

impl ReactionRepository {
    /// Create a new reaction repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>, metrics: Arc<Metrics>) -> Self {
        Self { db, metrics }
    }

    /// Count `action` reactions per target, in one grouped query.
    ///
    /// Targets without reactions are absent from the map.
    pub async fn count_by_targets(
        &self,
        target_type: TargetType,
        action: ActionType,
        target_ids: &[String],
    ) -> AppResult<HashMap<String, u64>> {
        if target_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let mut params = SqlParams::new();
        let target_type = params.push(target_type);
        let action = params.push(action);
        let ids = params.push_list(target_ids.iter().cloned());
        let sql = format!(
            "SELECT target_id, COUNT(*) AS like_count FROM reactions \
             WHERE target_type = {target_type} AND action_type = {action} \
             AND target_id IN ({ids}) GROUP BY target_id"
        );

        let timer = Timer::start();
        let result = TargetLikeCount::find_by_statement(params.into_statement(&sql))
            .all(self.db.as_ref())
            .await;

        Ok(observe(&self.metrics, &timer, result)?
            .into_iter()
            .map(|row| (row.target_id, row.like_count.max(0) as u64))
            .collect())
    }

    /// Every reaction the user has on any of `target_ids`.
    pub async fn find_by_user_and_targets(
        &self,
        user_id: &str,
        target_ids: &[String],
    ) -> AppResult<Vec<reaction::Model>> {
        if target_ids.is_empty() {
            return Ok(Vec::new());
        }

        let timer = Timer::start();
        let result = Reaction::find()
            .filter(reaction::Column::UserId.eq(user_id))
            .filter(reaction::Column::TargetId.is_in(target_ids.iter().cloned()))
            .all(self.db.as_ref())
            .await;
        observe(&self.metrics, &timer, result)
    }

    /// A user's reactions of one kind, newest first, strictly older than `before`.
    pub async fn find_by_user_action(
        &self,
        user_id: &str,
        target_type: TargetType,
        action: ActionType,
        before: Option<&TimeBound>,
        limit: u64,
    ) -> AppResult<Vec<reaction::Model>> {
        let mut query = Reaction::find()
            .filter(reaction::Column::UserId.eq(user_id))
            .filter(reaction::Column::TargetType.eq(target_type))
            .filter(reaction::Column::ActionType.eq(action))
            .order_by_desc(reaction::Column::CreatedAt)
            .order_by_desc(reaction::Column::Id);

        if let Some(before) = before {
            query = query.filter(before.older(reaction::Column::CreatedAt, reaction::Column::Id));
        }

        let timer = Timer::start();
        let result = query.limit(limit).all(self.db.as_ref()).await;
        observe(&self.metrics, &timer, result)
    }

    /// Insert a reaction unless the same one exists. Returns whether a row was added.
    pub async fn upsert(
        &self,
        id: &str,
        user_id: &str,
        target_type: TargetType,
        target_id: &str,
        action: ActionType,
    ) -> AppResult<bool> {
        let mut params = SqlParams::new();
        let sql = format!(
            "INSERT INTO reactions (id, user_id, target_type, target_id, action_type, created_at) \
             VALUES ({}, {}, {}, {}, {}, NOW()) \
             ON CONFLICT (user_id, target_type, target_id, action_type) DO NOTHING",
            params.push(id),
            params.push(user_id),
            params.push(target_type),
            params.push(target_id),
            params.push(action),
        );

        let timer = Timer::start();
        let result = self.db.execute(params.into_statement(&sql)).await;
        Ok(observe(&self.metrics, &timer, result)?.rows_affected() > 0)
    }

    /// Delete a reaction. Returns whether a row was removed.
    pub async fn delete(
        &self,
        user_id: &str,
        target_type: TargetType,
        target_id: &str,
        action: ActionType,
    ) -> AppResult<bool> {
        let timer = Timer::start();
        let result = Reaction::delete_many()
            .filter(reaction::Column::UserId.eq(user_id))
            .filter(reaction::Column::TargetType.eq(target_type))
            .filter(reaction::Column::TargetId.eq(target_id))
            .filter(reaction::Column::ActionType.eq(action))
            .exec(self.db.as_ref())
            .await;
        Ok(observe(&self.metrics, &timer, result)?.rows_affected > 0)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult, Value};

    fn create_test_reaction(
        id: &str,
        user_id: &str,
        target_type: TargetType,
        target_id: &str,
        action: ActionType,
    ) -> reaction::Model {
        reaction::Model {
            id: id.to_string(),
            user_id: user_id.to_string(),
            target_type,
            target_id: target_id.to_string(),
            action_type: action,
            meta: None,
            created_at: Utc::now().into(),
        }
    }

    fn repo(db: MockDatabase) -> ReactionRepository {
        ReactionRepository::new(Arc::new(db.into_connection()), Arc::new(Metrics::new()))
    }

    #[tokio::test]
    async fn test_count_by_targets() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).append_query_results([[
            maplit::btreemap! {
                "target_id" => Value::from("rv1"),
                "like_count" => Value::BigInt(Some(3)),
            },
        ]]);

        let counts = repo(db)
            .count_by_targets(
                TargetType::DishReviews,
                ActionType::Like,
                &["rv1".to_string(), "rv2".to_string()],
            )
            .await
            .unwrap();

        assert_eq!(counts.get("rv1"), Some(&3));
        assert!(!counts.contains_key("rv2"));
    }

    #[tokio::test]
    async fn test_find_by_user_and_targets() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).append_query_results([[
            create_test_reaction("r1", "u1", TargetType::DishMedia, "m1", ActionType::Save),
            create_test_reaction("r2", "u1", TargetType::DishReviews, "rv1", ActionType::Like),
        ]]);

        let found = repo(db)
            .find_by_user_and_targets("u1", &["m1".to_string(), "rv1".to_string()])
            .await
            .unwrap();

        assert_eq!(found.len(), 2);
        assert_eq!(found[0].action_type, ActionType::Save);
    }

    #[tokio::test]
    async fn test_find_by_user_and_targets_empty() {
        let found = repo(MockDatabase::new(DatabaseBackend::Postgres))
            .find_by_user_and_targets("u1", &[])
            .await
            .unwrap();
        assert!(found.is_empty());
    }

    #[tokio::test]
    async fn test_upsert_reports_insert() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).append_exec_results([
            MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            },
            MockExecResult {
                last_insert_id: 0,
                rows_affected: 0,
            },
        ]);
        let repo = repo(db);

        assert!(repo
            .upsert("r1", "u1", TargetType::DishMedia, "m1", ActionType::Save)
            .await
            .unwrap());
        assert!(!repo
            .upsert("r2", "u1", TargetType::DishMedia, "m1", ActionType::Save)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_delete() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).append_exec_results([MockExecResult {
            last_insert_id: 0,
            rows_affected: 1,
        }]);

        let removed = repo(db)
            .delete("u1", TargetType::DishReviews, "rv1", ActionType::Like)
            .await
            .unwrap();
        assert!(removed);
    }
}
