//! Create dish reviews table migration.

use sea_orm_migration::prelude::*;

/// Creates the dish reviews table.
#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(DishReviews::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(DishReviews::Id)
                            .string_len(36)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(DishReviews::DishId).string_len(36).not_null())
                    .col(ColumnDef::new(DishReviews::UserId).string_len(36))
                    .col(ColumnDef::new(DishReviews::Comment).text().not_null())
                    .col(ColumnDef::new(DishReviews::Rating).integer().not_null())
                    .col(ColumnDef::new(DishReviews::PriceCents).integer())
                    .col(ColumnDef::new(DishReviews::CurrencyCode).string_len(3))
                    .col(ColumnDef::new(DishReviews::ImportedUserName).string_len(256))
                    .col(
                        ColumnDef::new(DishReviews::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_dish_reviews_dish")
                            .from(DishReviews::Table, DishReviews::DishId)
                            .to(Dishes::Table, Dishes::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_dish_reviews_user")
                            .from(DishReviews::Table, DishReviews::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .check(Expr::col(DishReviews::Rating).between(1, 5))
                    .to_owned(),
            )
            .await?;

        // Index: (dish_id, created_at) for latest reviews per dish
        manager
            .create_index(
                Index::create()
                    .name("idx_dish_reviews_dish_created_at")
                    .table(DishReviews::Table)
                    .col(DishReviews::DishId)
                    .col(DishReviews::CreatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(DishReviews::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum DishReviews {
    Table,
    Id,
    DishId,
    UserId,
    Comment,
    Rating,
    PriceCents,
    CurrencyCode,
    ImportedUserName,
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
