//! Test utilities for database operations.
//!
//! [`TestDatabase`] connects to a live `PostgreSQL` (see [`TestDbConfig`]),
//! applies migrations and truncates the feed tables between tests.
//! [`Fixtures`] inserts the minimal rows a feed query needs, and [`rows`]
//! builds the same rows in memory for `MockDatabase` scripts.

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ConnectionTrait, Database, DatabaseBackend, DatabaseConnection, DbErr, Set,
    Statement,
};
use sea_orm_migration::MigratorTrait;
use tracing::info;

use crate::entities::{
    dish, dish_category, dish_like, dish_media, dish_review, reaction, restaurant, user,
};
use crate::migrations::Migrator;

/// Tables truncated by [`TestDatabase::cleanup`], children first.
const FEED_TABLES: &[&str] = &[
    "user_seen_dish_media",
    "reactions",
    "dish_reviews",
    "dish_likes",
    "dish_media",
    "dishes",
    "restaurants",
    "dish_categories",
    "users",
];

/// Test database configuration.
#[derive(Debug, Clone)]
pub struct TestDbConfig {
    /// Database host.
    pub host: String,
    /// Database port.
    pub port: u16,
    /// Database username.
    pub username: String,
    /// Database password.
    pub password: String,
    /// Database name.
    pub database: String,
}

impl Default for TestDbConfig {
    fn default() -> Self {
        let var = |key: &str, default: &str| std::env::var(key).unwrap_or_else(|_| default.to_string());
        Self {
            host: var("TEST_DB_HOST", "localhost"),
            port: std::env::var("TEST_DB_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(5433),
            username: var("TEST_DB_USER", "dishfeed_test"),
            password: var("TEST_DB_PASSWORD", "dishfeed_test"),
            database: var("TEST_DB_NAME", "dishfeed_test"),
        }
    }
}

impl TestDbConfig {
    /// Get the database URL.
    #[must_use]
    pub fn database_url(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.username, self.password, self.host, self.port, self.database
        )
    }
}

/// A migrated test database.
pub struct TestDatabase {
    /// Database connection.
    pub conn: DatabaseConnection,
    /// Database configuration.
    pub config: TestDbConfig,
}

impl TestDatabase {
    /// Connect with the environment-derived configuration and migrate.
    pub async fn new() -> Result<Self, DbErr> {
        Self::with_config(TestDbConfig::default()).await
    }

    /// Connect with a custom configuration and migrate.
    pub async fn with_config(config: TestDbConfig) -> Result<Self, DbErr> {
        let conn = Database::connect(&config.database_url()).await?;
        Migrator::up(&conn, None).await?;

        info!(database = %config.database, "Connected to migrated test database");
        Ok(Self { conn, config })
    }

    /// Get the database connection.
    #[must_use]
    pub const fn connection(&self) -> &DatabaseConnection {
        &self.conn
    }

    /// Remove every row from the feed tables.
    pub async fn cleanup(&self) -> Result<(), DbErr> {
        let sql = format!("TRUNCATE TABLE {} CASCADE", FEED_TABLES.join(", "));
        self.conn
            .execute(Statement::from_string(DatabaseBackend::Postgres, sql))
            .await?;
        Ok(())
    }
}

/// Row builders for live-database tests. IDs are caller-chosen so tests can
/// assert on exact orderings.
pub struct Fixtures<'a> {
    conn: &'a DatabaseConnection,
}

impl<'a> Fixtures<'a> {
    /// Wrap a connection.
    #[must_use]
    pub const fn new(conn: &'a DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Insert a user.
    pub async fn user(&self, id: &str, username: &str) -> Result<user::Model, DbErr> {
        user::ActiveModel {
            id: Set(id.to_string()),
            username: Set(username.to_string()),
            display_name: Set(None),
            avatar: Set(None),
            is_anonymous: Set(false),
            created_at: Set(Utc::now().into()),
        }
        .insert(self.conn)
        .await
    }

    /// Insert a category.
    pub async fn category(&self, id: &str, label: &str) -> Result<dish_category::Model, DbErr> {
        dish_category::ActiveModel {
            id: Set(id.to_string()),
            label_en: Set(label.to_string()),
            image_url: Set(None),
            created_at: Set(Utc::now().into()),
        }
        .insert(self.conn)
        .await
    }

    /// Insert a restaurant at a coordinate.
    pub async fn restaurant(&self, id: &str, lat: f64, lng: f64) -> Result<restaurant::Model, DbErr> {
        restaurant::ActiveModel {
            id: Set(id.to_string()),
            google_place_id: Set(None),
            name: Set(format!("Restaurant {id}")),
            lat: Set(lat),
            lng: Set(lng),
            image_url: Set(None),
            created_at: Set(Utc::now().into()),
        }
        .insert(self.conn)
        .await
    }

    /// Insert a dish.
    pub async fn dish(
        &self,
        id: &str,
        restaurant_id: &str,
        category_id: &str,
    ) -> Result<dish::Model, DbErr> {
        dish::ActiveModel {
            id: Set(id.to_string()),
            restaurant_id: Set(restaurant_id.to_string()),
            category_id: Set(category_id.to_string()),
            name: Set(format!("Dish {id}")),
            created_at: Set(Utc::now().into()),
        }
        .insert(self.conn)
        .await
    }

    /// Insert an image for a dish.
    pub async fn media(
        &self,
        id: &str,
        dish_id: &str,
        created_at: DateTime<Utc>,
    ) -> Result<dish_media::Model, DbErr> {
        dish_media::ActiveModel {
            id: Set(id.to_string()),
            dish_id: Set(dish_id.to_string()),
            user_id: Set(None),
            media_path: Set(format!("dish-media/{id}.jpg")),
            media_type: Set(dish_media::MediaType::Image),
            thumbnail_path: Set(None),
            created_at: Set(created_at.into()),
        }
        .insert(self.conn)
        .await
    }

    /// Insert a `dish_likes` row.
    pub async fn like(&self, id: &str, media_id: &str, user_id: &str) -> Result<dish_like::Model, DbErr> {
        dish_like::ActiveModel {
            id: Set(id.to_string()),
            dish_media_id: Set(media_id.to_string()),
            user_id: Set(user_id.to_string()),
            created_at: Set(Utc::now().into()),
        }
        .insert(self.conn)
        .await
    }

    /// Insert a review.
    pub async fn review(
        &self,
        id: &str,
        dish_id: &str,
        user_id: Option<&str>,
        rating: i32,
    ) -> Result<dish_review::Model, DbErr> {
        dish_review::ActiveModel {
            id: Set(id.to_string()),
            dish_id: Set(dish_id.to_string()),
            user_id: Set(user_id.map(str::to_string)),
            comment: Set(format!("review {id}")),
            rating: Set(rating),
            price_cents: Set(None),
            currency_code: Set(None),
            imported_user_name: Set(user_id.is_none().then(|| "imported".to_string())),
            created_at: Set(Utc::now().into()),
        }
        .insert(self.conn)
        .await
    }

    /// Insert a reaction.
    pub async fn reaction(
        &self,
        id: &str,
        user_id: &str,
        target_type: reaction::TargetType,
        target_id: &str,
        action: reaction::ActionType,
    ) -> Result<reaction::Model, DbErr> {
        reaction::ActiveModel {
            id: Set(id.to_string()),
            user_id: Set(user_id.to_string()),
            target_type: Set(target_type),
            target_id: Set(target_id.to_string()),
            action_type: Set(action),
            meta: Set(None),
            created_at: Set(Utc::now().into()),
        }
        .insert(self.conn)
        .await
    }
}

/// In-memory rows for scripting `MockDatabase` results.
pub mod rows {
    use std::collections::BTreeMap;

    use chrono::{DateTime, TimeZone, Utc};
    use sea_orm::Value;

    use crate::entities::{
        dish, dish_category, dish_like, dish_media, reaction, restaurant,
    };

    /// A fixed instant so assertions on timestamps are stable.
    #[must_use]
    pub fn epoch() -> DateTime<Utc> {
        Utc.timestamp_opt(1_735_689_600, 0).single().unwrap_or_default()
    }

    /// A category row.
    #[must_use]
    pub fn category(id: &str, label: &str) -> dish_category::Model {
        dish_category::Model {
            id: id.to_string(),
            label_en: label.to_string(),
            image_url: None,
            created_at: epoch().into(),
        }
    }

    /// A restaurant row.
    #[must_use]
    pub fn restaurant(id: &str, lat: f64, lng: f64) -> restaurant::Model {
        restaurant::Model {
            id: id.to_string(),
            google_place_id: None,
            name: format!("Restaurant {id}"),
            lat,
            lng,
            image_url: None,
            created_at: epoch().into(),
        }
    }

    /// A dish row.
    #[must_use]
    pub fn dish(id: &str, restaurant_id: &str, category_id: &str) -> dish::Model {
        dish::Model {
            id: id.to_string(),
            restaurant_id: restaurant_id.to_string(),
            category_id: category_id.to_string(),
            name: format!("Dish {id}"),
            created_at: epoch().into(),
        }
    }

    /// An image row with a thumbnail.
    #[must_use]
    pub fn media(id: &str, dish_id: &str, created_at: DateTime<Utc>) -> dish_media::Model {
        dish_media::Model {
            id: id.to_string(),
            dish_id: dish_id.to_string(),
            user_id: None,
            media_path: format!("dish-media/{id}.jpg"),
            media_type: dish_media::MediaType::Image,
            thumbnail_path: Some(format!("dish-media/{id}_thumb.jpg")),
            created_at: created_at.into(),
        }
    }

    /// A `dish_likes` row.
    #[must_use]
    pub fn like(id: &str, media_id: &str, user_id: &str, created_at: DateTime<Utc>) -> dish_like::Model {
        dish_like::Model {
            id: id.to_string(),
            dish_media_id: media_id.to_string(),
            user_id: user_id.to_string(),
            created_at: created_at.into(),
        }
    }

    /// A reaction row.
    #[must_use]
    pub fn reaction(
        id: &str,
        user_id: &str,
        target_type: reaction::TargetType,
        target_id: &str,
        action: reaction::ActionType,
    ) -> reaction::Model {
        reaction::Model {
            id: id.to_string(),
            user_id: user_id.to_string(),
            target_type,
            target_id: target_id.to_string(),
            action_type: action,
            meta: None,
            created_at: epoch().into(),
        }
    }

    /// A review joined with its author name.
    #[must_use]
    pub fn review(
        id: &str,
        dish_id: &str,
        username: Option<&str>,
        rating: i32,
    ) -> BTreeMap<&'static str, Value> {
        BTreeMap::from([
            ("id", Value::from(id)),
            ("dish_id", Value::from(dish_id)),
            ("user_id", Value::String(None)),
            ("comment", Value::from(format!("review {id}"))),
            ("rating", Value::from(rating)),
            ("price_cents", Value::Int(None)),
            ("currency_code", Value::String(None)),
            ("created_at", Value::from(sea_orm::prelude::DateTimeWithTimeZone::from(epoch()))),
            ("username", Value::from(username.map(str::to_string))),
        ])
    }

    /// Review statistics for one dish.
    #[must_use]
    pub fn review_stats(
        dish_id: &str,
        review_count: i64,
        average_rating: Option<f64>,
    ) -> BTreeMap<&'static str, Value> {
        BTreeMap::from([
            ("dish_id", Value::from(dish_id)),
            ("review_count", Value::BigInt(Some(review_count))),
            ("average_rating", Value::Double(average_rating)),
        ])
    }

    /// A grouped count row keyed by `key_column`.
    #[must_use]
    pub fn count(key_column: &'static str, id: &str, n: i64) -> BTreeMap<&'static str, Value> {
        BTreeMap::from([
            (key_column, Value::from(id)),
            ("like_count", Value::BigInt(Some(n))),
        ])
    }
}
