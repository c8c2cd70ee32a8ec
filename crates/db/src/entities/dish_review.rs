//! Dish review entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Dish review entity.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "dish_reviews")]
pub struct Model {
    /// Review ID.
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Dish under review.
    pub dish_id: String,

    /// Author; NULL for reviews imported from elsewhere
    #[sea_orm(nullable)]
    pub user_id: Option<String>,

    /// Review text.
    #[sea_orm(column_type = "Text")]
    pub comment: String,

    /// 1..=5
    pub rating: i32,

    /// Price paid, in minor units.
    #[sea_orm(nullable)]
    pub price_cents: Option<i32>,

    /// ISO 4217
    #[sea_orm(nullable)]
    pub currency_code: Option<String>,

    /// Author name for imported reviews
    #[sea_orm(nullable)]
    pub imported_user_name: Option<String>,

    /// When the review was written.
    pub created_at: DateTimeWithTimeZone,
}

/// Dish review relations.
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Dish under review.
    #[sea_orm(
        belongs_to = "super::dish::Entity",
        from = "Column::DishId",
        to = "super::dish::Column::Id",
        on_delete = "Cascade"
    )]
    Dish,

    /// Review author.
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id",
        on_delete = "SetNull"
    )]
    User,
}

impl Related<super::dish::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Dish.def()
    }
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
