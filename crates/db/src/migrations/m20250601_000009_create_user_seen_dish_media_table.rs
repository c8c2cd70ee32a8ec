//! Create user seen dish media table migration.

use sea_orm_migration::prelude::*;

/// Creates the seen markers table.
#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(UserSeenDishMedia::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(UserSeenDishMedia::Id)
                            .string_len(36)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(UserSeenDishMedia::UserId)
                            .string_len(36)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(UserSeenDishMedia::DishMediaId)
                            .string_len(36)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(UserSeenDishMedia::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_user_seen_dish_media_dish_media")
                            .from(UserSeenDishMedia::Table, UserSeenDishMedia::DishMediaId)
                            .to(DishMedia::Table, DishMedia::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Unique index: (user_id, dish_media_id), also serves the NOT EXISTS lookup
        manager
            .create_index(
                Index::create()
                    .name("idx_user_seen_dish_media_user_media")
                    .table(UserSeenDishMedia::Table)
                    .col(UserSeenDishMedia::UserId)
                    .col(UserSeenDishMedia::DishMediaId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(UserSeenDishMedia::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum UserSeenDishMedia {
    Table,
    Id,
    UserId,
    DishMediaId,
    CreatedAt,
}

#[derive(Iden)]
enum DishMedia {
    Table,
    Id,
}
