//! Create dish media table migration.

use sea_orm_migration::prelude::*;

/// Creates the dish media table.
#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(DishMedia::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(DishMedia::Id)
                            .string_len(36)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(DishMedia::DishId).string_len(36).not_null())
                    .col(ColumnDef::new(DishMedia::UserId).string_len(36))
                    .col(ColumnDef::new(DishMedia::MediaPath).string_len(512).not_null())
                    .col(ColumnDef::new(DishMedia::MediaType).string_len(16).not_null())
                    .col(ColumnDef::new(DishMedia::ThumbnailPath).string_len(512))
                    .col(
                        ColumnDef::new(DishMedia::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_dish_media_dish")
                            .from(DishMedia::Table, DishMedia::DishId)
                            .to(Dishes::Table, Dishes::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_dish_media_user")
                            .from(DishMedia::Table, DishMedia::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: (dish_id, created_at) for latest-media-per-dish selection
        manager
            .create_index(
                Index::create()
                    .name("idx_dish_media_dish_created_at")
                    .table(DishMedia::Table)
                    .col(DishMedia::DishId)
                    .col(DishMedia::CreatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(DishMedia::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum DishMedia {
    Table,
    Id,
    DishId,
    UserId,
    MediaPath,
    MediaType,
    ThumbnailPath,
    CreatedAt,
}

#[derive(Iden)]
enum Dishes {
    Table,
    Id,
}

#[derive(Iden)]
enum Users {
    Table,
    Id,
}
