//! Batched reaction lookup for one page of entries.
//!
//! Whatever the page size, aggregation costs at most two statements: one
//! grouped like count over the reviews, and one scan of the viewer's own
//! reactions over every media and review ID on the page.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use dishfeed_common::{AppError, AppResult, Metrics};
use dishfeed_db::entities::reaction::{ActionType, TargetType};
use dishfeed_db::repositories::ReactionRepository;
use tracing::debug;

/// "This viewer reacted to this target with this action."
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ReactionKey {
    /// Kind of target.
    pub target_type: TargetType,
    /// Target ID.
    pub target_id: String,
    /// What the viewer did.
    pub action: ActionType,
}

impl ReactionKey {
    /// Build a key.
    #[must_use]
    pub fn new(target_type: TargetType, target_id: impl Into<String>, action: ActionType) -> Self {
        Self {
            target_type,
            target_id: target_id.into(),
            action,
        }
    }
}

/// Result of [`ReactionAggregator::aggregate`].
#[derive(Debug, Clone, Default)]
pub struct ReactionSummary {
    reacted: HashSet<ReactionKey>,
    review_like_counts: HashMap<String, u64>,
}

impl ReactionSummary {
    /// Whether the viewer has the given reaction. Always `false` for
    /// anonymous viewers.
    #[must_use]
    pub fn has(&self, target_type: TargetType, target_id: &str, action: ActionType) -> bool {
        self.reacted
            .contains(&ReactionKey::new(target_type, target_id, action))
    }

    /// Like count of a review; reviews nobody liked count as zero.
    #[must_use]
    pub fn review_like_count(&self, review_id: &str) -> u64 {
        self.review_like_counts.get(review_id).copied().unwrap_or(0)
    }

    /// Every reaction key of the viewer.
    #[must_use]
    pub const fn reacted(&self) -> &HashSet<ReactionKey> {
        &self.reacted
    }
}

/// Collects viewer reactions and review like counts for a batch of IDs.
#[derive(Clone)]
pub struct ReactionAggregator {
    reaction_repo: ReactionRepository,
    metrics: Arc<Metrics>,
}

impl ReactionAggregator {
    /// Create a new aggregator.
    #[must_use]
    pub const fn new(reaction_repo: ReactionRepository, metrics: Arc<Metrics>) -> Self {
        Self {
            reaction_repo,
            metrics,
        }
    }

    /// Aggregate reactions for `media_ids` and `review_ids`.
    ///
    /// Input lists are treated as sets. Without a viewer the reacted set is
    /// empty and only the review counts are fetched. A failing statement is
    /// an [`AppError::AggregationFailure`]: returning unpersonalized data
    /// would show `isLiked: false` where the real state is unknown.
    pub async fn aggregate(
        &self,
        media_ids: &[String],
        review_ids: &[String],
        viewer_id: Option<&str>,
    ) -> AppResult<ReactionSummary> {
        let media_ids = unique_ids(media_ids);
        let review_ids = unique_ids(review_ids);

        let counts = async {
            if review_ids.is_empty() {
                return Ok(HashMap::new());
            }
            self.metrics.record_aggregation_query();
            self.reaction_repo
                .count_by_targets(TargetType::DishReviews, ActionType::Like, &review_ids)
                .await
        };

        let viewer_reactions = async {
            let Some(viewer_id) = viewer_id else {
                return Ok(Vec::new());
            };
            let targets: Vec<String> = media_ids.iter().chain(&review_ids).cloned().collect();
            if targets.is_empty() {
                return Ok(Vec::new());
            }
            self.metrics.record_aggregation_query();
            self.reaction_repo
                .find_by_user_and_targets(viewer_id, &targets)
                .await
        };

        let (review_like_counts, reactions) =
            tokio::try_join!(counts, viewer_reactions).map_err(aggregation_failure)?;

        let reacted: HashSet<ReactionKey> = reactions
            .into_iter()
            .map(|r| ReactionKey::new(r.target_type, r.target_id, r.action_type))
            .collect();

        debug!(
            media = media_ids.len(),
            reviews = review_ids.len(),
            reacted = reacted.len(),
            anonymous = viewer_id.is_none(),
            "Aggregated reactions"
        );

        Ok(ReactionSummary {
            reacted,
            review_like_counts,
        })
    }
}

/// Deduplicate IDs, keeping the first occurrence of each.
#[must_use]
pub fn unique_ids(ids: &[String]) -> Vec<String> {
    let mut seen = HashSet::with_capacity(ids.len());
    ids.iter()
        .filter(|id| seen.insert(*id))
        .cloned()
        .collect()
}

/// Reclassify a failed batch statement as an aggregation failure.
pub(crate) fn aggregation_failure(err: AppError) -> AppError {
    match err {
        AppError::Database(msg) => AppError::AggregationFailure(msg),
        other => other,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use dishfeed_db::test_utils::rows;
    use sea_orm::{DatabaseBackend, DatabaseConnection, DbErr, MockDatabase};

    fn ids(prefix: &str, n: usize) -> Vec<String> {
        (0..n).map(|i| format!("{prefix}{i}")).collect()
    }

    fn aggregator(db: &Arc<DatabaseConnection>, metrics: &Arc<Metrics>) -> ReactionAggregator {
        ReactionAggregator::new(
            ReactionRepository::new(db.clone(), metrics.clone()),
            metrics.clone(),
        )
    }

    fn statement_count(db: Arc<DatabaseConnection>) -> usize {
        let Ok(conn) = Arc::try_unwrap(db) else {
            panic!("connection still shared");
        };
        conn.into_transaction_log().len()
    }

    #[tokio::test]
    async fn test_anonymous_viewer_only_counts_reviews() {
        let metrics = Arc::new(Metrics::new());
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[rows::count("target_id", "rv1", 4)]])
                .into_connection(),
        );

        let summary = aggregator(&db, &metrics)
            .aggregate(&ids("m", 3), &["rv1".to_string(), "rv2".to_string()], None)
            .await
            .unwrap();

        assert!(summary.reacted().is_empty());
        assert!(!summary.has(TargetType::DishMedia, "m0", ActionType::Like));
        assert_eq!(summary.review_like_count("rv1"), 4);
        assert_eq!(summary.review_like_count("rv2"), 0);
        assert_eq!(summary.review_like_count("never-seen"), 0);
        assert_eq!(metrics.snapshot().aggregation_queries, 1);
        assert_eq!(statement_count(db), 1);
    }

    #[tokio::test]
    async fn test_statement_count_is_independent_of_batch_size() {
        for size in [1, 1000] {
            let metrics = Arc::new(Metrics::new());
            let db = Arc::new(
                MockDatabase::new(DatabaseBackend::Postgres)
                    .append_query_results([[rows::count("target_id", "rv0", 2)]])
                    .append_query_results([[
                        rows::reaction("x1", "u1", TargetType::DishMedia, "m0", ActionType::Like),
                        rows::reaction("x2", "u1", TargetType::DishMedia, "m0", ActionType::Save),
                        rows::reaction("x3", "u1", TargetType::DishReviews, "rv0", ActionType::Like),
                    ]])
                    .into_connection(),
            );

            let summary = aggregator(&db, &metrics)
                .aggregate(&ids("m", size), &ids("rv", size), Some("u1"))
                .await
                .unwrap();

            assert!(summary.has(TargetType::DishMedia, "m0", ActionType::Like));
            assert!(summary.has(TargetType::DishMedia, "m0", ActionType::Save));
            assert!(summary.has(TargetType::DishReviews, "rv0", ActionType::Like));
            assert!(!summary.has(TargetType::DishReviews, "m0", ActionType::Like));
            assert_eq!(summary.review_like_count("rv0"), 2);
            assert_eq!(metrics.snapshot().aggregation_queries, 2);
            assert_eq!(statement_count(db), 2, "batch of {size}");
        }
    }

    #[tokio::test]
    async fn test_viewer_without_reviews_issues_one_statement() {
        let metrics = Arc::new(Metrics::new());
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[rows::reaction(
                    "x1",
                    "u1",
                    TargetType::DishMedia,
                    "m1",
                    ActionType::Save,
                )]])
                .into_connection(),
        );

        let summary = aggregator(&db, &metrics)
            .aggregate(&["m1".to_string(), "m1".to_string()], &[], Some("u1"))
            .await
            .unwrap();

        assert!(summary.has(TargetType::DishMedia, "m1", ActionType::Save));
        assert_eq!(statement_count(db), 1);
    }

    #[tokio::test]
    async fn test_empty_input_issues_nothing() {
        let metrics = Arc::new(Metrics::new());
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        let summary = aggregator(&db, &metrics)
            .aggregate(&[], &[], Some("u1"))
            .await
            .unwrap();

        assert!(summary.reacted().is_empty());
        assert_eq!(metrics.snapshot().aggregation_queries, 0);
        assert_eq!(statement_count(db), 0);
    }

    #[tokio::test]
    async fn test_failure_is_aggregation_failure() {
        let metrics = Arc::new(Metrics::new());
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_errors([DbErr::Custom("connection reset".to_string())])
                .into_connection(),
        );

        let result = aggregator(&db, &metrics)
            .aggregate(&[], &["rv1".to_string()], None)
            .await;

        assert!(matches!(result, Err(AppError::AggregationFailure(_))));
    }

    #[test]
    fn test_unique_ids_keeps_first_occurrence() {
        let input: Vec<String> = ["b", "a", "b", "c", "a"].iter().map(|s| (*s).to_string()).collect();
        assert_eq!(unique_ids(&input), vec!["b", "a", "c"]);
    }
}
