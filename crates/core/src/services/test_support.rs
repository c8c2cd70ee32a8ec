//! Mock wiring shared by the service tests.
//!
//! Every repository gets its own scripted connection, so each mock only has
//! to list the statements of one repository in issue order.

use std::sync::Arc;

use dishfeed_common::{MediaUrlSigner, Metrics, PublicUrlSigner};
use dishfeed_db::repositories::{
    DishCategoryRepository, DishLikeRepository, DishMediaRepository, DishReviewRepository,
    ReactionRepository, RestaurantRepository, UserSeenRepository,
};
use sea_orm::{DatabaseBackend, MockDatabase};

use super::repositories::Repositories;

pub fn mock() -> MockDatabase {
    MockDatabase::new(DatabaseBackend::Postgres)
}

pub fn signer() -> Arc<dyn MediaUrlSigner> {
    match PublicUrlSigner::new("https://cdn.example.com/") {
        Ok(signer) => Arc::new(signer),
        Err(e) => panic!("test signer: {e}"),
    }
}

pub struct MockDbs {
    pub media: MockDatabase,
    pub likes: MockDatabase,
    pub reviews: MockDatabase,
    pub reactions: MockDatabase,
    pub restaurants: MockDatabase,
    pub categories: MockDatabase,
    pub seen: MockDatabase,
}

impl Default for MockDbs {
    fn default() -> Self {
        Self {
            media: mock(),
            likes: mock(),
            reviews: mock(),
            reactions: mock(),
            restaurants: mock(),
            categories: mock(),
            seen: mock(),
        }
    }
}

impl MockDbs {
    pub fn into_repositories(self, metrics: &Arc<Metrics>) -> Repositories {
        let conn = |db: MockDatabase| Arc::new(db.into_connection());
        Repositories {
            media: DishMediaRepository::new(conn(self.media), metrics.clone()),
            likes: DishLikeRepository::new(conn(self.likes), metrics.clone()),
            reviews: DishReviewRepository::new(conn(self.reviews), metrics.clone()),
            reactions: ReactionRepository::new(conn(self.reactions), metrics.clone()),
            restaurants: RestaurantRepository::new(conn(self.restaurants), metrics.clone()),
            categories: DishCategoryRepository::new(conn(self.categories), metrics.clone()),
            seen: UserSeenRepository::new(conn(self.seen), metrics.clone()),
        }
    }
}
