//! Create dish likes table migration.

use sea_orm_migration::prelude::*;

/// Creates the dish likes table.
#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(DishLikes::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(DishLikes::Id)
                            .string_len(36)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(DishLikes::DishMediaId).string_len(36).not_null())
                    .col(ColumnDef::new(DishLikes::UserId).string_len(36).not_null())
                    .col(
                        ColumnDef::new(DishLikes::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_dish_likes_dish_media")
                            .from(DishLikes::Table, DishLikes::DishMediaId)
                            .to(DishMedia::Table, DishMedia::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_dish_likes_user")
                            .from(DishLikes::Table, DishLikes::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Unique index: (dish_media_id, user_id) - one like per user per media
        manager
            .create_index(
                Index::create()
                    .name("idx_dish_likes_media_user")
                    .table(DishLikes::Table)
                    .col(DishLikes::DishMediaId)
                    .col(DishLikes::UserId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Index: (user_id, created_at) for the viewer's liked feed
        manager
            .create_index(
                Index::create()
                    .name("idx_dish_likes_user_created_at")
                    .table(DishLikes::Table)
                    .col(DishLikes::UserId)
                    .col(DishLikes::CreatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(DishLikes::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum DishLikes {
    Table,
    Id,
    DishMediaId,
    UserId,
    CreatedAt,
}

#[derive(Iden)]
enum DishMedia {
    Table,
    Id,
}

#[derive(Iden)]
enum Users {
    Table,
    Id,
}
