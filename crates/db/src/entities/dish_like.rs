//! Dish media like entity.
//!
//! Dedicated like table. Likes are also mirrored into `reactions`; public
//! like counts are computed from this table only.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Dish like entity.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "dish_likes")]
pub struct Model {
    /// Like ID.
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Media that was liked.
    pub dish_media_id: String,

    /// User who liked the media.
    pub user_id: String,

    /// When the like was created.
    pub created_at: DateTimeWithTimeZone,
}

/// Dish like relations.
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// The liked media.
    #[sea_orm(
        belongs_to = "super::dish_media::Entity",
        from = "Column::DishMediaId",
        to = "super::dish_media::Column::Id",
        on_delete = "Cascade"
    )]
    DishMedia,

    /// The liking user.
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    User,
}

impl Related<super::dish_media::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::DishMedia.def()
    }
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
