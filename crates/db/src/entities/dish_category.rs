//! Dish category entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Dish category entity.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "dish_categories")]
pub struct Model {
    /// Category ID.
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// English label
    pub label_en: String,

    /// Category artwork.
    #[sea_orm(nullable)]
    pub image_url: Option<String>,

    /// When the category was created.
    pub created_at: DateTimeWithTimeZone,
}

/// Dish category relations.
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Dishes in the category.
    #[sea_orm(has_many = "super::dish::Entity")]
    Dishes,
}

impl Related<super::dish::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Dishes.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
