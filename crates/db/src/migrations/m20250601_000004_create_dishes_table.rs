//! Create dishes table migration.

use sea_orm_migration::prelude::*;

/// Creates the dishes table.
#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Dishes::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Dishes::Id)
                            .string_len(36)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Dishes::RestaurantId).string_len(36).not_null())
                    .col(ColumnDef::new(Dishes::CategoryId).string_len(36).not_null())
                    .col(ColumnDef::new(Dishes::Name).string_len(256).not_null())
                    .col(
                        ColumnDef::new(Dishes::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_dishes_restaurant")
                            .from(Dishes::Table, Dishes::RestaurantId)
                            .to(Restaurants::Table, Restaurants::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_dishes_category")
                            .from(Dishes::Table, Dishes::CategoryId)
                            .to(DishCategories::Table, DishCategories::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_dishes_restaurant_id")
                    .table(Dishes::Table)
                    .col(Dishes::RestaurantId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_dishes_category_id")
                    .table(Dishes::Table)
                    .col(Dishes::CategoryId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Dishes::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Dishes {
    Table,
    Id,
    RestaurantId,
    CategoryId,
    Name,
    CreatedAt,
}

#[derive(Iden)]
enum Restaurants {
    Table,
    Id,
}

#[derive(Iden)]
enum DishCategories {
    Table,
    Id,
}
