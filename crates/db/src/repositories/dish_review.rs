//! Dish review repository.

use std::sync::Arc;

use dishfeed_common::{AppResult, Metrics, Timer};
use sea_orm::{
    DatabaseConnection, EntityTrait, FromQueryResult, prelude::DateTimeWithTimeZone,
};

use super::observe;
use crate::entities::{DishReview, dish_review};
use crate::query::{SqlParams, TopNPerGroup};

/// A review joined with its author's display name.
#[derive(Debug, Clone, PartialEq, Eq, FromQueryResult)]
pub struct ReviewWithAuthor {
    /// Review ID.
    pub id: String,
    /// Dish under review.
    pub dish_id: String,
    /// Author account; `None` for imported reviews.
    pub user_id: Option<String>,
    /// Review text.
    pub comment: String,
    /// Rating from 1 to 5.
    pub rating: i32,
    /// Price paid, in minor units.
    pub price_cents: Option<i32>,
    /// ISO 4217 currency code.
    pub currency_code: Option<String>,
    /// When the review was written.
    pub created_at: DateTimeWithTimeZone,
    /// Account username, or the imported author name.
    pub username: Option<String>,
}

/// Aggregate over every review of one dish.
#[derive(Debug, Clone, PartialEq, FromQueryResult)]
pub struct ReviewStats {
    /// Dish the stats cover.
    pub dish_id: String,
    /// Number of reviews.
    pub review_count: i64,
    /// Mean rating rounded to one decimal; `None` without reviews.
    pub average_rating: Option<f64>,
}

/// Dish review repository for database operations.
#[derive(Clone)]
pub struct DishReviewRepository {
    db: Arc<DatabaseConnection>,
    metrics: Arc<Metrics>,
}

impl DishReviewRepository {
    /// Create a new dish review repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>, metrics: Arc<Metrics>) -> Self {
        Self { db, metrics }
    }

    /// Find a review by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<dish_review::Model>> {
        let timer = Timer::start();
        let result = DishReview::find_by_id(id).one(self.db.as_ref()).await;
        observe(&self.metrics, &timer, result)
    }

    /// The `per_dish` most recent reviews of each dish, grouped by dish and
    /// newest first within a dish.
    pub async fn latest_by_dishes(
        &self,
        dish_ids: &[String],
        per_dish: u64,
    ) -> AppResult<Vec<ReviewWithAuthor>> {
        if dish_ids.is_empty() || per_dish == 0 {
            return Ok(Vec::new());
        }

        let mut params = SqlParams::new();
        let ids = params.push_list(dish_ids.iter().cloned());
        let source = format!(
            "SELECT r.id, r.dish_id, r.user_id, r.comment, r.rating, r.price_cents, \
             r.currency_code, r.created_at, COALESCE(u.username, r.imported_user_name) AS username \
             FROM dish_reviews r \
             LEFT JOIN users u ON u.id = r.user_id \
             WHERE r.dish_id IN ({ids})"
        );
        let latest = TopNPerGroup {
            source: &source,
            partition_by: "src.dish_id",
            order_by: "src.created_at DESC, src.id DESC",
            n: per_dish,
        }
        .to_sql();
        let sql = format!("{latest} ORDER BY ranked.dish_id, ranked.group_rank");

        let timer = Timer::start();
        let result = ReviewWithAuthor::find_by_statement(params.into_statement(&sql))
            .all(self.db.as_ref())
            .await;
        observe(&self.metrics, &timer, result)
    }

    /// Review count and rounded mean rating over all reviews of each dish.
    pub async fn stats_by_dishes(&self, dish_ids: &[String]) -> AppResult<Vec<ReviewStats>> {
        if dish_ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut params = SqlParams::new();
        let ids = params.push_list(dish_ids.iter().cloned());
        let sql = format!(
            "SELECT dish_id, COUNT(*) AS review_count, \
             ROUND(AVG(rating)::numeric, 1)::float8 AS average_rating \
             FROM dish_reviews WHERE dish_id IN ({ids}) GROUP BY dish_id"
        );

        let timer = Timer::start();
        let result = ReviewStats::find_by_statement(params.into_statement(&sql))
            .all(self.db.as_ref())
            .await;
        observe(&self.metrics, &timer, result)
    }
}
