//! Create item_like table.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ItemLike::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ItemLike::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ItemLike::UserId).string().not_null())
                    .col(ColumnDef::new(ItemLike::ItemKind).string_len(16).not_null())
                    .col(ColumnDef::new(ItemLike::ItemId).string().not_null())
                    .col(
                        ColumnDef::new(ItemLike::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_item_like_user")
                            .from(ItemLike::Table, ItemLike::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // At most one like per (user, item).
        manager
            .create_index(
                Index::create()
                    .name("idx_item_like_unique")
                    .table(ItemLike::Table)
                    .col(ItemLike::ItemKind)
                    .col(ItemLike::ItemId)
                    .col(ItemLike::UserId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_item_like_user_id")
                    .table(ItemLike::Table)
                    .col(ItemLike::UserId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ItemLike::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum ItemLike {
    Table,
    Id,
    UserId,
    ItemKind,
    ItemId,
    CreatedAt,
}

#[derive(Iden)]
enum User {
    Table,
    Id,
}
