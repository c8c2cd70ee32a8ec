//! Reaction entity (generic likes and saves).

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// What a reaction points at.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
#[serde(rename_all = "snake_case")]
pub enum TargetType {
    /// A dish photo or video.
    #[sea_orm(string_value = "dish_media")]
    DishMedia,
    /// A dish review.
    #[sea_orm(string_value = "dish_reviews")]
    DishReviews,
    /// A dish category.
    #[sea_orm(string_value = "dish_category")]
    DishCategory,
}

/// Kind of reaction.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    /// Like.
    #[sea_orm(string_value = "like")]
    Like,
    /// Save for later.
    #[sea_orm(string_value = "save")]
    Save,
}

/// Reaction entity.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "reactions")]
pub struct Model {
    /// Reaction ID.
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// The user who reacted
    pub user_id: String,

    /// Kind of target.
    pub target_type: TargetType,

    /// ID of the media, review or category reacted to
    pub target_id: String,

    /// What the user did.
    pub action_type: ActionType,

    /// Client-supplied context (screen, position in feed)
    #[sea_orm(column_type = "JsonBinary", nullable)]
    pub meta: Option<Json>,

    /// When the reaction was recorded.
    pub created_at: DateTimeWithTimeZone,
}

/// Reaction relations.
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// The reacting user.
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    User,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
