//! 平台与活动主表迁移
//!
//! 创建 platforms、campaigns、campaign_translations 三张表。
//! campaigns.slug 仅在未软删除的行中唯一（部分唯一索引）。

use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::DatabaseBackend;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // 创建 platforms 表
        manager
            .create_table(
                Table::create()
                    .table(Platforms::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Platforms::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Platforms::Name).string_len(120).not_null())
                    .col(ColumnDef::new(Platforms::Slug).string_len(120).not_null())
                    .col(ColumnDef::new(Platforms::Website).text().null())
                    .col(ColumnDef::new(Platforms::LogoUrl).text().null())
                    .col(ColumnDef::new(Platforms::Description).text().null())
                    .col(
                        ColumnDef::new(Platforms::Status)
                            .string_len(16)
                            .not_null()
                            .default("active"),
                    )
                    .col(
                        ColumnDef::new(Platforms::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Platforms::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("uq_platforms_slug")
                    .table(Platforms::Table)
                    .col(Platforms::Slug)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // 创建 campaigns 表
        manager
            .create_table(
                Table::create()
                    .table(Campaigns::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Campaigns::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Campaigns::PlatformId).big_integer().not_null())
                    .col(ColumnDef::new(Campaigns::Slug).string_len(160).not_null())
                    .col(
                        ColumnDef::new(Campaigns::Status)
                            .string_len(16)
                            .not_null()
                            .default("pending"),
                    )
                    .col(ColumnDef::new(Campaigns::FreeCredit).string_len(255).not_null())
                    .col(ColumnDef::new(Campaigns::CreditValueCents).big_integer().null())
                    .col(
                        ColumnDef::new(Campaigns::StartAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Campaigns::EndAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(ColumnDef::new(Campaigns::OfficialLink).text().not_null())
                    .col(ColumnDef::new(Campaigns::AiModels).text().not_null())
                    .col(
                        ColumnDef::new(Campaigns::Difficulty)
                            .string_len(16)
                            .not_null()
                            .default("easy"),
                    )
                    .col(
                        ColumnDef::new(Campaigns::IsFeatured)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Campaigns::FeaturedUntil)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Campaigns::ReactionScore)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Campaigns::LikeCount)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Campaigns::DislikeCount)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Campaigns::BookmarkCount)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Campaigns::CommentCount)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Campaigns::ParticipantCount)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(Campaigns::SubmittedBy).string_len(64).null())
                    .col(ColumnDef::new(Campaigns::ReviewedBy).string_len(64).null())
                    .col(
                        ColumnDef::new(Campaigns::ReviewedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(ColumnDef::new(Campaigns::RejectReason).text().null())
                    .col(
                        ColumnDef::new(Campaigns::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Campaigns::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Campaigns::DeletedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_campaigns_platform")
                            .from(Campaigns::Table, Campaigns::PlatformId)
                            .to(Platforms::Table, Platforms::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        // 列表查询常用索引
        for (name, col) in [
            ("idx_campaigns_platform", Campaigns::PlatformId),
            ("idx_campaigns_created_at", Campaigns::CreatedAt),
            ("idx_campaigns_end_at", Campaigns::EndAt),
        ] {
            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name(name)
                        .table(Campaigns::Table)
                        .col(col)
                        .to_owned(),
                )
                .await?;
        }

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_campaigns_status_deleted")
                    .table(Campaigns::Table)
                    .col(Campaigns::Status)
                    .col(Campaigns::DeletedAt)
                    .to_owned(),
            )
            .await?;

        // slug 只在未删除的行中唯一
        let conn = manager.get_connection();
        match manager.get_database_backend() {
            DatabaseBackend::Postgres | DatabaseBackend::Sqlite => {
                conn.execute_unprepared(
                    "CREATE UNIQUE INDEX IF NOT EXISTS uq_campaigns_slug_live ON campaigns (slug) WHERE deleted_at IS NULL",
                )
                .await?;
            }
            _ => {
                // MySQL 不支持部分索引，唯一性由服务层保证
                manager
                    .create_index(
                        Index::create()
                            .if_not_exists()
                            .name("idx_campaigns_slug")
                            .table(Campaigns::Table)
                            .col(Campaigns::Slug)
                            .to_owned(),
                    )
                    .await?;
            }
        }

        // 创建 campaign_translations 表
        manager
            .create_table(
                Table::create()
                    .table(CampaignTranslations::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(CampaignTranslations::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(CampaignTranslations::CampaignId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CampaignTranslations::Locale)
                            .string_len(16)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CampaignTranslations::Title)
                            .string_len(255)
                            .not_null(),
                    )
                    .col(ColumnDef::new(CampaignTranslations::Description).text().not_null())
                    .col(
                        ColumnDef::new(CampaignTranslations::IsAiGenerated)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(CampaignTranslations::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CampaignTranslations::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_translations_campaign")
                            .from(CampaignTranslations::Table, CampaignTranslations::CampaignId)
                            .to(Campaigns::Table, Campaigns::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("uq_translations_campaign_locale")
                    .table(CampaignTranslations::Table)
                    .col(CampaignTranslations::CampaignId)
                    .col(CampaignTranslations::Locale)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(CampaignTranslations::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Campaigns::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Platforms::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Platforms {
    Table,
    Id,
    Name,
    Slug,
    Website,
    LogoUrl,
    Description,
    Status,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Campaigns {
    Table,
    Id,
    PlatformId,
    Slug,
    Status,
    FreeCredit,
    CreditValueCents,
    StartAt,
    EndAt,
    OfficialLink,
    AiModels,
    Difficulty,
    IsFeatured,
    FeaturedUntil,
    ReactionScore,
    LikeCount,
    DislikeCount,
    BookmarkCount,
    CommentCount,
    ParticipantCount,
    SubmittedBy,
    ReviewedBy,
    ReviewedAt,
    RejectReason,
    CreatedAt,
    UpdatedAt,
    DeletedAt,
}

#[derive(DeriveIden)]
enum CampaignTranslations {
    Table,
    Id,
    CampaignId,
    Locale,
    Title,
    Description,
    IsAiGenerated,
    CreatedAt,
    UpdatedAt,
}
