//! Record of dish media a user has already been shown.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Seen marker entity.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user_seen_dish_media")]
pub struct Model {
    /// Marker ID.
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// User who saw the media.
    pub user_id: String,

    /// Media that was seen.
    pub dish_media_id: String,

    /// When the media was first seen.
    pub created_at: DateTimeWithTimeZone,
}

/// Seen marker relations.
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// The seen media.
    #[sea_orm(
        belongs_to = "super::dish_media::Entity",
        from = "Column::DishMediaId",
        to = "super::dish_media::Column::Id",
        on_delete = "Cascade"
    )]
    DishMedia,
}

impl Related<super::dish_media::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::DishMedia.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
