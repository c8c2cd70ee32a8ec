//! Repository set shared by the feed and reaction services.

use std::sync::Arc;

use dishfeed_common::Metrics;
use dishfeed_db::repositories::{
    DishCategoryRepository, DishLikeRepository, DishMediaRepository, DishReviewRepository,
    ReactionRepository, RestaurantRepository, UserSeenRepository,
};
use sea_orm::DatabaseConnection;

/// Every repository the services read and write through.
///
/// Fields are public so tests can back each repository with its own mock
/// connection.
#[derive(Clone)]
pub struct Repositories {
    /// Dish media.
    pub media: DishMediaRepository,
    /// Media likes.
    pub likes: DishLikeRepository,
    /// Dish reviews.
    pub reviews: DishReviewRepository,
    /// Generic reactions.
    pub reactions: ReactionRepository,
    /// Restaurants.
    pub restaurants: RestaurantRepository,
    /// Dish categories.
    pub categories: DishCategoryRepository,
    /// Seen markers.
    pub seen: UserSeenRepository,
}

impl Repositories {
    /// Build every repository over one connection pool.
    #[must_use]
    pub fn new(db: &Arc<DatabaseConnection>, metrics: &Arc<Metrics>) -> Self {
        Self {
            media: DishMediaRepository::new(db.clone(), metrics.clone()),
            likes: DishLikeRepository::new(db.clone(), metrics.clone()),
            reviews: DishReviewRepository::new(db.clone(), metrics.clone()),
            reactions: ReactionRepository::new(db.clone(), metrics.clone()),
            restaurants: RestaurantRepository::new(db.clone(), metrics.clone()),
            categories: DishCategoryRepository::new(db.clone(), metrics.clone()),
            seen: UserSeenRepository::new(db.clone(), metrics.clone()),
        }
    }
}
