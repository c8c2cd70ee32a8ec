//! Create dish categories table migration.

use sea_orm_migration::prelude::*;

/// Creates the dish categories table.
#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(DishCategories::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(DishCategories::Id)
                            .string_len(36)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(DishCategories::LabelEn)
                            .string_len(128)
                            .not_null(),
                    )
                    .col(ColumnDef::new(DishCategories::ImageUrl).string_len(512))
                    .col(
                        ColumnDef::new(DishCategories::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(DishCategories::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum DishCategories {
    Table,
    Id,
    LabelEn,
    ImageUrl,
    CreatedAt,
}
