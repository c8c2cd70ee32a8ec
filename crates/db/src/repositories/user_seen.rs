//! Seen-media repository.
//!
//! Rows here drive the "unseen only" filter of radius discovery.

use std::sync::Arc;

use dishfeed_common::{AppResult, Metrics, Timer};
use sea_orm::{ConnectionTrait, DatabaseConnection};

use super::observe;
use crate::query::SqlParams;

/// Seen-media repository for database operations.
#[derive(Clone)]
pub struct UserSeenRepository {
    db: Arc<DatabaseConnection>,
    metrics: Arc<Metrics>,
}

impl UserSeenRepository {
    /// Create a new seen-media repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>, metrics: Arc<Metrics>) -> Self {
        Self { db, metrics }
    }

    /// Record `(row_id, dish_media_id)` pairs as seen by the user in one
    /// statement. Already-seen media are skipped. Returns the number of new rows.
    pub async fn mark_seen(&self, user_id: &str, entries: &[(String, String)]) -> AppResult<u64> {
        if entries.is_empty() {
            return Ok(0);
        }

        let mut params = SqlParams::new();
        let user = params.push(user_id);
        let rows = entries
            .iter()
            .map(|(id, media_id)| {
                format!(
                    "({}, {user}, {}, NOW())",
                    params.push(id.clone()),
                    params.push(media_id.clone())
                )
            })
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "INSERT INTO user_seen_dish_media (id, user_id, dish_media_id, created_at) \
             VALUES {rows} ON CONFLICT (user_id, dish_media_id) DO NOTHING"
        );

        let timer = Timer::start();
        let result = self.db.execute(params.into_statement(&sql)).await;
        Ok(observe(&self.metrics, &timer, result)?.rows_affected())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    #[tokio::test]
    async fn test_mark_seen_single_statement() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 2,
            }])
            .into_connection();
        let db = Arc::new(db);

        let repo = UserSeenRepository::new(db.clone(), Arc::new(Metrics::new()));
        let inserted = repo
            .mark_seen(
                "u1",
                &[
                    ("s1".to_string(), "m1".to_string()),
                    ("s2".to_string(), "m2".to_string()),
                ],
            )
            .await
            .unwrap();
        assert_eq!(inserted, 2);

        drop(repo);
        let Ok(conn) = Arc::try_unwrap(db) else {
            panic!("connection still shared");
        };
        let log = conn.into_transaction_log();
        assert_eq!(log.len(), 1);
    }

    #[tokio::test]
    async fn test_mark_seen_empty() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let repo = UserSeenRepository::new(db, Arc::new(Metrics::new()));
        assert_eq!(repo.mark_seen("u1", &[]).await.unwrap(), 0);
    }
}
