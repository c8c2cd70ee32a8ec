//! Database migrations.
//!
//! Schema migrations for the database.

#![allow(missing_docs)]

use sea_orm_migration::prelude::*;

mod m20250601_000001_create_users_table;
mod m20250601_000002_create_dish_categories_table;
mod m20250601_000003_create_restaurants_table;
mod m20250601_000004_create_dishes_table;
mod m20250601_000005_create_dish_media_table;
mod m20250601_000006_create_dish_likes_table;
mod m20250601_000007_create_dish_reviews_table;
mod m20250601_000008_create_reactions_table;
mod m20250601_000009_create_user_seen_dish_media_table;

/// Runs every schema migration in order.
pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250601_000001_create_users_table::Migration),
            Box::new(m20250601_000002_create_dish_categories_table::Migration),
            Box::new(m20250601_000003_create_restaurants_table::Migration),
            Box::new(m20250601_000004_create_dishes_table::Migration),
            Box::new(m20250601_000005_create_dish_media_table::Migration),
            Box::new(m20250601_000006_create_dish_likes_table::Migration),
            Box::new(m20250601_000007_create_dish_reviews_table::Migration),
            Box::new(m20250601_000008_create_reactions_table::Migration),
            Box::new(m20250601_000009_create_user_seen_dish_media_table::Migration),
        ]
    }
}
