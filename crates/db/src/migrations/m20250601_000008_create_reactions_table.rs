//! Create reactions table migration.

use sea_orm_migration::prelude::*;

/// Creates the reactions table.
#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Reactions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Reactions::Id)
                            .string_len(36)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Reactions::UserId).string_len(36).not_null())
                    .col(ColumnDef::new(Reactions::TargetType).string_len(32).not_null())
                    .col(ColumnDef::new(Reactions::TargetId).string_len(36).not_null())
                    .col(ColumnDef::new(Reactions::ActionType).string_len(16).not_null())
                    .col(ColumnDef::new(Reactions::Meta).json_binary())
                    .col(
                        ColumnDef::new(Reactions::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_reactions_user")
                            .from(Reactions::Table, Reactions::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Unique index: one reaction per user, target and action
        manager
            .create_index(
                Index::create()
                    .name("idx_reactions_user_target_action")
                    .table(Reactions::Table)
                    .col(Reactions::UserId)
                    .col(Reactions::TargetType)
                    .col(Reactions::TargetId)
                    .col(Reactions::ActionType)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Index: (target_type, target_id, action_type) for grouped counts
        manager
            .create_index(
                Index::create()
                    .name("idx_reactions_target_action")
                    .table(Reactions::Table)
                    .col(Reactions::TargetType)
                    .col(Reactions::TargetId)
                    .col(Reactions::ActionType)
                    .to_owned(),
            )
            .await?;

        // Index: (user_id, created_at) for the viewer's saved feed
        manager
            .create_index(
                Index::create()
                    .name("idx_reactions_user_created_at")
                    .table(Reactions::Table)
                    .col(Reactions::UserId)
                    .col(Reactions::CreatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Reactions::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Reactions {
    Table,
    Id,
    UserId,
    TargetType,
    TargetId,
    ActionType,
    Meta,
    CreatedAt,
}

#[derive(Iden)]
enum Users {
    Table,
    Id,
}
