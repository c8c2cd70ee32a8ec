//! Restaurant entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Restaurant entity.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "restaurants")]
pub struct Model {
    /// Restaurant ID.
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Google Places identifier, when the restaurant was imported from there
    #[sea_orm(unique, nullable)]
    pub google_place_id: Option<String>,

    /// Restaurant name.
    pub name: String,

    /// Latitude in degrees
    pub lat: f64,

    /// Longitude in degrees
    pub lng: f64,

    /// Cover image.
    #[sea_orm(nullable)]
    pub image_url: Option<String>,

    /// When the restaurant was created.
    pub created_at: DateTimeWithTimeZone,
}

/// Restaurant relations.
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Dishes on the menu.
    #[sea_orm(has_many = "super::dish::Entity")]
    Dishes,
}

impl Related<super::dish::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Dishes.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
