//! User entity.
//!
//! Accounts are owned by the upstream identity service; this table only keeps
//! what feeds need to render (usernames on reviews) and to key reactions.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// User entity.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    /// User ID.
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Unique handle.
    #[sea_orm(unique)]
    pub username: String,

    /// Display name
    #[sea_orm(nullable)]
    pub display_name: Option<String>,

    /// Avatar object path
    #[sea_orm(nullable)]
    pub avatar: Option<String>,

    /// Placeholder account created for a signed-out device.
    #[sea_orm(default_value = false)]
    pub is_anonymous: bool,

    /// When the account was created.
    pub created_at: DateTimeWithTimeZone,
}

/// User relations.
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Reactions by the user.
    #[sea_orm(has_many = "super::reaction::Entity")]
    Reactions,

    /// Media likes by the user.
    #[sea_orm(has_many = "super::dish_like::Entity")]
    DishLikes,
}

impl Related<super::reaction::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Reactions.def()
    }
}

impl Related<super::dish_like::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::DishLikes.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
