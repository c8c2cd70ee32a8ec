//! Dish media entity (a photo or video of one dish).

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Kind of uploaded object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    /// Still image.
    #[sea_orm(string_value = "image")]
    Image,
    /// Video clip.
    #[sea_orm(string_value = "video")]
    Video,
}

/// Dish media entity.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "dish_media")]
pub struct Model {
    /// Media ID.
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Dish shown in the media.
    pub dish_id: String,

    /// Uploader; NULL for imported media
    #[sea_orm(nullable)]
    pub user_id: Option<String>,

    /// Object path in the media bucket
    pub media_path: String,

    /// Photo or video.
    pub media_type: MediaType,

    /// Thumbnail object path, for videos.
    #[sea_orm(nullable)]
    pub thumbnail_path: Option<String>,

    /// When the media was uploaded.
    pub created_at: DateTimeWithTimeZone,
}

/// Dish media relations.
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Dish shown in the media.
    #[sea_orm(
        belongs_to = "super::dish::Entity",
        from = "Column::DishId",
        to = "super::dish::Column::Id",
        on_delete = "Cascade"
    )]
    Dish,

    /// Likes on the media.
    #[sea_orm(has_many = "super::dish_like::Entity")]
    Likes,
}

impl Related<super::dish::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Dish.def()
    }
}

impl Related<super::dish_like::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Likes.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
