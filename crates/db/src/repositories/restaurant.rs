//! Restaurant repository.

use std::sync::Arc;

use dishfeed_common::{AppResult, Metrics, Timer};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};

use super::observe;
use crate::entities::{Restaurant, restaurant};

/// Restaurant repository for database operations.
#[derive(Clone)]
pub struct RestaurantRepository {
    db: Arc<DatabaseConnection>,
    metrics: Arc<Metrics>,
}

impl RestaurantRepository {
    /// Create a new restaurant repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>, metrics: Arc<Metrics>) -> Self {
        Self { db, metrics }
    }

    /// Find a restaurant by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<restaurant::Model>> {
        let timer = Timer::start();
        let result = Restaurant::find_by_id(id).one(self.db.as_ref()).await;
        observe(&self.metrics, &timer, result)
    }

    /// Find restaurants by IDs. Order is unspecified.
    pub async fn find_by_ids(&self, ids: &[String]) -> AppResult<Vec<restaurant::Model>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let timer = Timer::start();
        let result = Restaurant::find()
            .filter(restaurant::Column::Id.is_in(ids.iter().cloned()))
            .all(self.db.as_ref())
            .await;
        observe(&self.metrics, &timer, result)
    }
}
