//! Create restaurants table migration.

use sea_orm_migration::prelude::*;

/// Creates the restaurants table.
#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Restaurants::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Restaurants::Id)
                            .string_len(36)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Restaurants::GooglePlaceId)
                            .string_len(256)
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Restaurants::Name).string_len(256).not_null())
                    .col(ColumnDef::new(Restaurants::Lat).double().not_null())
                    .col(ColumnDef::new(Restaurants::Lng).double().not_null())
                    .col(ColumnDef::new(Restaurants::ImageUrl).string_len(512))
                    .col(
                        ColumnDef::new(Restaurants::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: (lat, lng) for the bounding-box prefilter of radius search
        manager
            .create_index(
                Index::create()
                    .name("idx_restaurants_lat_lng")
                    .table(Restaurants::Table)
                    .col(Restaurants::Lat)
                    .col(Restaurants::Lng)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Restaurants::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Restaurants {
    Table,
    Id,
    GooglePlaceId,
    Name,
    Lat,
    Lng,
    ImageUrl,
    CreatedAt,
}
