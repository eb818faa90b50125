//! Create shot table.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Shot::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Shot::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Shot::UserId).string().not_null())
                    .col(ColumnDef::new(Shot::Title).string_len(256).not_null())
                    .col(ColumnDef::new(Shot::FileKey).string_len(256).not_null())
                    .col(ColumnDef::new(Shot::VideoLink).string_len(512).null())
                    .col(ColumnDef::new(Shot::HoleNumber).integer().not_null())
                    .col(ColumnDef::new(Shot::WindSpeed).integer().not_null())
                    .col(ColumnDef::new(Shot::WindUnit).string_len(8).not_null())
                    .col(ColumnDef::new(Shot::WindDirection).string_len(8).not_null())
                    .col(ColumnDef::new(Shot::FlagPosition).string_len(8).not_null())
                    .col(ColumnDef::new(Shot::ShotDistance).integer().not_null())
                    .col(ColumnDef::new(Shot::DistanceUnit).string_len(8).not_null())
                    .col(
                        ColumnDef::new(Shot::LikeCount)
                            .integer()
                            .not_null()
                            .default(0)
                            .check(Expr::col(Shot::LikeCount).gte(0)),
                    )
                    .col(
                        ColumnDef::new(Shot::Approved)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Shot::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Shot::UpdatedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_shot_user")
                            .from(Shot::Table, Shot::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_shot_user_id")
                    .table(Shot::Table)
                    .col(Shot::UserId)
                    .to_owned(),
            )
            .await?;

        // Gallery pages and the moderation queue both filter on approval.
        manager
            .create_index(
                Index::create()
                    .name("idx_shot_approved_created_at")
                    .table(Shot::Table)
                    .col(Shot::Approved)
                    .col(Shot::CreatedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_shot_hole_number")
                    .table(Shot::Table)
                    .col(Shot::HoleNumber)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Shot::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Shot {
    Table,
    Id,
    UserId,
    Title,
    FileKey,
    VideoLink,
    HoleNumber,
    WindSpeed,
    WindUnit,
    WindDirection,
    FlagPosition,
    ShotDistance,
    DistanceUnit,
    LikeCount,
    Approved,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum User {
    Table,
    Id,
}
