//! 标签体系迁移
//!
//! tags（分类 / AI 模型）与 condition_tags（参与条件，带难度权重），
//! 以及它们与 campaigns 的关联表。

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Tags::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Tags::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Tags::Name).string_len(80).not_null())
                    .col(ColumnDef::new(Tags::Slug).string_len(80).not_null())
                    .col(
                        ColumnDef::new(Tags::Kind)
                            .string_len(16)
                            .not_null()
                            .default("category"),
                    )
                    .col(
                        ColumnDef::new(Tags::CreatedAt)
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
                    .name("uq_tags_slug")
                    .table(Tags::Table)
                    .col(Tags::Slug)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ConditionTags::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ConditionTags::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ConditionTags::Name).string_len(80).not_null())
                    .col(ColumnDef::new(ConditionTags::Slug).string_len(80).not_null())
                    .col(
                        ColumnDef::new(ConditionTags::Kind)
                            .string_len(16)
                            .not_null()
                            .default("requirement"),
                    )
                    .col(
                        ColumnDef::new(ConditionTags::DifficultyWeight)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(ConditionTags::CreatedAt)
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
                    .name("uq_condition_tags_slug")
                    .table(ConditionTags::Table)
                    .col(ConditionTags::Slug)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // 关联表：复合主键
        manager
            .create_table(
                Table::create()
                    .table(CampaignTags::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(CampaignTags::CampaignId).big_integer().not_null())
                    .col(ColumnDef::new(CampaignTags::TagId).big_integer().not_null())
                    .primary_key(
                        Index::create()
                            .col(CampaignTags::CampaignId)
                            .col(CampaignTags::TagId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_campaign_tags_campaign")
                            .from(CampaignTags::Table, CampaignTags::CampaignId)
                            .to(Campaigns::Table, Campaigns::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_campaign_tags_tag")
                            .from(CampaignTags::Table, CampaignTags::TagId)
                            .to(Tags::Table, Tags::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_campaign_tags_tag")
                    .table(CampaignTags::Table)
                    .col(CampaignTags::TagId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(CampaignConditionTags::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(CampaignConditionTags::CampaignId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CampaignConditionTags::ConditionTagId)
                            .big_integer()
                            .not_null(),
                    )
                    .primary_key(
                        Index::create()
                            .col(CampaignConditionTags::CampaignId)
                            .col(CampaignConditionTags::ConditionTagId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_campaign_conditions_campaign")
                            .from(CampaignConditionTags::Table, CampaignConditionTags::CampaignId)
                            .to(Campaigns::Table, Campaigns::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_campaign_conditions_tag")
                            .from(
                                CampaignConditionTags::Table,
                                CampaignConditionTags::ConditionTagId,
                            )
                            .to(ConditionTags::Table, ConditionTags::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_campaign_conditions_tag")
                    .table(CampaignConditionTags::Table)
                    .col(CampaignConditionTags::ConditionTagId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(CampaignConditionTags::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(CampaignTags::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ConditionTags::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Tags::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Campaigns {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum Tags {
    Table,
    Id,
    Name,
    Slug,
    Kind,
    CreatedAt,
}

#[derive(DeriveIden)]
enum ConditionTags {
    Table,
    Id,
    Name,
    Slug,
    Kind,
    DifficultyWeight,
    CreatedAt,
}

#[derive(DeriveIden)]
enum CampaignTags {
    Table,
    CampaignId,
    TagId,
}

#[derive(DeriveIden)]
enum CampaignConditionTags {
    Table,
    CampaignId,
    ConditionTagId,
}
