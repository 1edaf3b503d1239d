//! 用户互动表迁移
//!
//! reactions / emoji_reactions / bookmarks / participations 均按
//! (campaign_id, user_id[, emoji]) 唯一；comments 支持单层 parent_id 回复和软删除。

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // reactions: 每个用户对每个活动只有一个 like/dislike
        manager
            .create_table(
                Table::create()
                    .table(Reactions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Reactions::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Reactions::CampaignId).big_integer().not_null())
                    .col(ColumnDef::new(Reactions::UserId).string_len(64).not_null())
                    .col(ColumnDef::new(Reactions::Kind).string_len(16).not_null())
                    .col(
                        ColumnDef::new(Reactions::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_reactions_campaign")
                            .from(Reactions::Table, Reactions::CampaignId)
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
                    .name("uq_reactions_campaign_user")
                    .table(Reactions::Table)
                    .col(Reactions::CampaignId)
                    .col(Reactions::UserId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(EmojiReactions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(EmojiReactions::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(EmojiReactions::CampaignId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(EmojiReactions::UserId).string_len(64).not_null())
                    .col(ColumnDef::new(EmojiReactions::Emoji).string_len(32).not_null())
                    .col(
                        ColumnDef::new(EmojiReactions::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_emoji_reactions_campaign")
                            .from(EmojiReactions::Table, EmojiReactions::CampaignId)
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
                    .name("uq_emoji_reactions_campaign_user_emoji")
                    .table(EmojiReactions::Table)
                    .col(EmojiReactions::CampaignId)
                    .col(EmojiReactions::UserId)
                    .col(EmojiReactions::Emoji)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Bookmarks::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Bookmarks::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Bookmarks::CampaignId).big_integer().not_null())
                    .col(ColumnDef::new(Bookmarks::UserId).string_len(64).not_null())
                    .col(
                        ColumnDef::new(Bookmarks::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_bookmarks_campaign")
                            .from(Bookmarks::Table, Bookmarks::CampaignId)
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
                    .name("uq_bookmarks_campaign_user")
                    .table(Bookmarks::Table)
                    .col(Bookmarks::CampaignId)
                    .col(Bookmarks::UserId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // 按用户列出收藏
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_bookmarks_user_created")
                    .table(Bookmarks::Table)
                    .col(Bookmarks::UserId)
                    .col(Bookmarks::CreatedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Comments::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Comments::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Comments::CampaignId).big_integer().not_null())
                    .col(ColumnDef::new(Comments::UserId).string_len(64).not_null())
                    .col(ColumnDef::new(Comments::ParentId).big_integer().null())
                    .col(ColumnDef::new(Comments::Content).text().not_null())
                    .col(
                        ColumnDef::new(Comments::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Comments::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Comments::DeletedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_comments_campaign")
                            .from(Comments::Table, Comments::CampaignId)
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
                    .name("idx_comments_campaign_created")
                    .table(Comments::Table)
                    .col(Comments::CampaignId)
                    .col(Comments::CreatedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Participations::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Participations::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Participations::CampaignId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Participations::UserId).string_len(64).not_null())
                    .col(
                        ColumnDef::new(Participations::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_participations_campaign")
                            .from(Participations::Table, Participations::CampaignId)
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
                    .name("uq_participations_campaign_user")
                    .table(Participations::Table)
                    .col(Participations::CampaignId)
                    .col(Participations::UserId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Participations::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Comments::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Bookmarks::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(EmojiReactions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Reactions::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Campaigns {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum Reactions {
    Table,
    Id,
    CampaignId,
    UserId,
    Kind,
    CreatedAt,
}

#[derive(DeriveIden)]
enum EmojiReactions {
    Table,
    Id,
    CampaignId,
    UserId,
    Emoji,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Bookmarks {
    Table,
    Id,
    CampaignId,
    UserId,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Comments {
    Table,
    Id,
    CampaignId,
    UserId,
    ParentId,
    Content,
    CreatedAt,
    UpdatedAt,
    DeletedAt,
}

#[derive(DeriveIden)]
enum Participations {
    Table,
    Id,
    CampaignId,
    UserId,
    CreatedAt,
}
