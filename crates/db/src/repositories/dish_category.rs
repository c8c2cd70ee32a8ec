//! Dish category repository.

use std::sync::Arc;

use dishfeed_common::{AppResult, Metrics, Timer};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};

use super::observe;
use crate::entities::{DishCategory, dish_category};

/// Dish category repository for database operations.
#[derive(Clone)]
pub struct DishCategoryRepository {
    db: Arc<DatabaseConnection>,
    metrics: Arc<Metrics>,
}

impl DishCategoryRepository {
    /// Create a new dish category repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>, metrics: Arc<Metrics>) -> Self {
        Self { db, metrics }
    }

    /// Find categories by IDs. Order is unspecified.
    pub async fn find_by_ids(&self, ids: &[String]) -> AppResult<Vec<dish_category::Model>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let timer = Timer::start();
        let result = DishCategory::find()
            .filter(dish_category::Column::Id.is_in(ids.iter().cloned()))
            .all(self.db.as_ref())
            .await;
        observe(&self.metrics, &timer, result)
    }
}
