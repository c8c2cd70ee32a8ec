//! Dish entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Dish entity.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "dishes")]
pub struct Model {
    /// Dish ID.
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Restaurant serving the dish.
    pub restaurant_id: String,

    /// Category the dish belongs to.
    pub category_id: String,

    /// Dish name as shown on the menu.
    pub name: String,

    /// When the dish was created.
    pub created_at: DateTimeWithTimeZone,
}

/// Dish relations.
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Restaurant serving the dish.
    #[sea_orm(
        belongs_to = "super::restaurant::Entity",
        from = "Column::RestaurantId",
        to = "super::restaurant::Column::Id",
        on_delete = "Cascade"
    )]
    Restaurant,

    /// Category of the dish.
    #[sea_orm(
        belongs_to = "super::dish_category::Entity",
        from = "Column::CategoryId",
        to = "super::dish_category::Column::Id"
    )]
    Category,

    /// Photos and videos of the dish.
    #[sea_orm(has_many = "super::dish_media::Entity")]
    Media,

    /// Reviews of the dish.
    #[sea_orm(has_many = "super::dish_review::Entity")]
    Reviews,
}

impl Related<super::restaurant::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Restaurant.def()
    }
}

impl Related<super::dish_category::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Category.def()
    }
}

impl Related<super::dish_media::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Media.def()
    }
}

impl Related<super::dish_review::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Reviews.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
