//! Repositories.
//!
//! Every repository holds the shared connection and the injected metrics
//! handle; each statement it issues is timed into [`Metrics`].

pub mod dish_category;
pub mod dish_like;
pub mod dish_media;
pub mod dish_review;
pub mod reaction;
pub mod restaurant;
pub mod user_seen;

pub use dish_category::DishCategoryRepository;
pub use dish_like::{DishLikeRepository, MediaLikeCount};
pub use dish_media::{
    DiscoveryFilter, DiscoveryOrder, DiscoveryRow, DishMediaRepository, RankedRow,
    discovery_statement, ranked_statement,
};
pub use dish_review::{DishReviewRepository, ReviewStats, ReviewWithAuthor};
pub use reaction::{ReactionRepository, TargetLikeCount};
pub use restaurant::RestaurantRepository;
pub use user_seen::UserSeenRepository;

use chrono::{DateTime, Utc};
use dishfeed_common::{AppError, AppResult, Metrics, Timer};
use sea_orm::{ColumnTrait, Condition, DbErr};

/// Exclusive keyset bound of a time-ordered page.
///
/// `id` breaks ties between rows sharing `at`; bounds without it compare on
/// time alone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeBound {
    /// `created_at` of the previous page's last row.
    pub at: DateTime<Utc>,
    /// ID of the previous page's last row.
    pub id: Option<String>,
}

impl TimeBound {
    /// Bound on time alone.
    #[must_use]
    pub const fn at(at: DateTime<Utc>) -> Self {
        Self { at, id: None }
    }

    /// Rows strictly after this bound in `(created_at DESC, id DESC)` order.
    pub(crate) fn older<C: ColumnTrait>(&self, created_at: C, id: C) -> Condition {
        match &self.id {
            Some(last) => Condition::any().add(created_at.lt(self.at)).add(
                Condition::all()
                    .add(created_at.eq(self.at))
                    .add(id.lt(last.clone())),
            ),
            None => Condition::all().add(created_at.lt(self.at)),
        }
    }
}

/// Record a finished statement and map its error.
pub(crate) fn observe<T>(
    metrics: &Metrics,
    timer: &Timer,
    result: Result<T, DbErr>,
) -> AppResult<T> {
    metrics.record_db_query(timer.elapsed(), result.is_err());
    result.map_err(|e| AppError::Database(e.to_string()))
}
