//! Create tutorial table.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Tutorial::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Tutorial::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Tutorial::UserId).string().not_null())
                    .col(ColumnDef::new(Tutorial::Title).string_len(50).not_null())
                    .col(
                        ColumnDef::new(Tutorial::VideoLink)
                            .string_len(512)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Tutorial::Category).string_len(20).not_null())
                    .col(
                        ColumnDef::new(Tutorial::LikeCount)
                            .integer()
                            .not_null()
                            .default(0)
                            .check(Expr::col(Tutorial::LikeCount).gte(0)),
                    )
                    .col(
                        ColumnDef::new(Tutorial::Approved)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Tutorial::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_tutorial_user")
                            .from(Tutorial::Table, Tutorial::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_tutorial_category")
                    .table(Tutorial::Table)
                    .col(Tutorial::Category)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_tutorial_approved")
                    .table(Tutorial::Table)
                    .col(Tutorial::Approved)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Tutorial::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Tutorial {
    Table,
    Id,
    UserId,
    Title,
    VideoLink,
    Category,
    LikeCount,
    Approved,
    CreatedAt,
}

#[derive(Iden)]
enum User {
    Table,
    Id,
}
