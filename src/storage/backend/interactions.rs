//! 用户互动：反应、emoji、收藏、参与、评论
//!
//! 每个写操作与对应的计数器增减在同一事务中完成；
//! 重复写入通过唯一约束 + ON CONFLICT DO NOTHING 变为无操作。

use std::collections::HashMap;

use chrono::Utc;
use sea_orm::ActiveValue::{NotSet, Set};
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, ExprTrait, QueryFilter,
    QueryOrder, TransactionTrait,
};
use tracing::{debug, info};

use super::converters::model_to_comment;
use super::{SeaOrmStorage, retry};
use crate::errors::{CreditHubError, Result};
use crate::storage::models::{CampaignCounters, Comment, InteractionState, ReactionKind};
use migration::entities::{
    bookmark, campaign, comment, emoji_reaction, participation, reaction,
};

/// 对计数器列做原子增减
async fn bump<C: ConnectionTrait>(
    conn: &C,
    campaign_id: i64,
    deltas: &[(campaign::Column, i32)],
) -> std::result::Result<(), DbErr> {
    let deltas: Vec<_> = deltas.iter().filter(|(_, d)| *d != 0).collect();
    if deltas.is_empty() {
        return Ok(());
    }

    let mut update = campaign::Entity::update_many();
    for (column, delta) in deltas {
        update = update.col_expr(*column, Expr::col(*column).add(*delta));
    }
    update
        .filter(campaign::Column::Id.eq(campaign_id))
        .exec(conn)
        .await?;
    Ok(())
}

/// 从旧反应切换到新反应时各计数器的变化量
pub(crate) fn reaction_deltas(
    previous: Option<ReactionKind>,
    next: Option<ReactionKind>,
) -> Vec<(campaign::Column, i32)> {
    fn weight(kind: Option<ReactionKind>) -> (i32, i32) {
        match kind {
            Some(ReactionKind::Like) => (1, 0),
            Some(ReactionKind::Dislike) => (0, 1),
            None => (0, 0),
        }
    }
    let (prev_like, prev_dislike) = weight(previous);
    let (next_like, next_dislike) = weight(next);
    let like = next_like - prev_like;
    let dislike = next_dislike - prev_dislike;
    vec![
        (campaign::Column::LikeCount, like),
        (campaign::Column::DislikeCount, dislike),
        (campaign::Column::ReactionScore, like - dislike),
    ]
}

async fn counters<C: ConnectionTrait>(
    conn: &C,
    campaign_id: i64,
) -> std::result::Result<CampaignCounters, DbErr> {
    let model = campaign::Entity::find_by_id(campaign_id)
        .one(conn)
        .await?
        .ok_or_else(|| DbErr::RecordNotFound(format!("campaign {}", campaign_id)))?;
    Ok(CampaignCounters {
        like_count: model.like_count,
        dislike_count: model.dislike_count,
        reaction_score: model.reaction_score,
        bookmark_count: model.bookmark_count,
        comment_count: model.comment_count,
        participant_count: model.participant_count,
    })
}

impl SeaOrmStorage {
    /// 设置或清除 like/dislike；返回更新后的计数
    pub async fn set_reaction(
        &self,
        campaign_id: i64,
        user_id: &str,
        kind: Option<ReactionKind>,
    ) -> Result<CampaignCounters> {
        let txn = self.db.begin().await?;

        let existing = reaction::Entity::find()
            .filter(reaction::Column::CampaignId.eq(campaign_id))
            .filter(reaction::Column::UserId.eq(user_id))
            .one(&txn)
            .await?;
        let previous: Option<ReactionKind> = existing.as_ref().and_then(|r| r.kind.parse().ok());

        if previous != kind {
            match (existing, kind) {
                (Some(row), Some(next)) => {
                    let mut active: reaction::ActiveModel = row.into();
                    active.kind = Set(next.as_ref().to_string());
                    active.created_at = Set(Utc::now());
                    active.update(&txn).await?;
                }
                (Some(row), None) => {
                    reaction::Entity::delete_by_id(row.id).exec(&txn).await?;
                }
                (None, Some(next)) => {
                    reaction::ActiveModel {
                        id: NotSet,
                        campaign_id: Set(campaign_id),
                        user_id: Set(user_id.to_string()),
                        kind: Set(next.as_ref().to_string()),
                        created_at: Set(Utc::now()),
                    }
                    .insert(&txn)
                    .await?;
                }
                (None, None) => {}
            }
            bump(&txn, campaign_id, &reaction_deltas(previous, kind)).await?;
        }

        let result = counters(&txn, campaign_id).await?;
        txn.commit().await?;

        debug!(
            "Reaction on campaign {} by {}: {:?} -> {:?}",
            campaign_id, user_id, previous, kind
        );
        Ok(result)
    }

    /// 切换 emoji；返回切换后是否处于已添加状态
    pub async fn toggle_emoji(&self, campaign_id: i64, user_id: &str, emoji: &str) -> Result<bool> {
        let db = &self.db;
        let removed = retry::with_retry("toggle_emoji(delete)", self.retry_config, || async {
            emoji_reaction::Entity::delete_many()
                .filter(emoji_reaction::Column::CampaignId.eq(campaign_id))
                .filter(emoji_reaction::Column::UserId.eq(user_id))
                .filter(emoji_reaction::Column::Emoji.eq(emoji))
                .exec(db)
                .await
        })
        .await?;
        if removed.rows_affected > 0 {
            return Ok(false);
        }

        emoji_reaction::Entity::insert(emoji_reaction::ActiveModel {
            id: NotSet,
            campaign_id: Set(campaign_id),
            user_id: Set(user_id.to_string()),
            emoji: Set(emoji.to_string()),
            created_at: Set(Utc::now()),
        })
        .on_conflict(
            OnConflict::columns([
                emoji_reaction::Column::CampaignId,
                emoji_reaction::Column::UserId,
                emoji_reaction::Column::Emoji,
            ])
            .do_nothing()
            .to_owned(),
        )
        .exec_without_returning(db)
        .await?;
        Ok(true)
    }

    /// 添加收藏；已收藏时返回 false
    pub async fn add_bookmark(&self, campaign_id: i64, user_id: &str) -> Result<bool> {
        let txn = self.db.begin().await?;
        let inserted = bookmark::Entity::insert(bookmark::ActiveModel {
            id: NotSet,
            campaign_id: Set(campaign_id),
            user_id: Set(user_id.to_string()),
            created_at: Set(Utc::now()),
        })
        .on_conflict(
            OnConflict::columns([bookmark::Column::CampaignId, bookmark::Column::UserId])
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(&txn)
        .await?;

        if inserted > 0 {
            bump(&txn, campaign_id, &[(campaign::Column::BookmarkCount, 1)]).await?;
        }
        txn.commit().await?;

        if inserted > 0 {
            self.invalidate_count_cache();
            info!("Bookmark added: campaign={} user={}", campaign_id, user_id);
        }
        Ok(inserted > 0)
    }

    /// 取消收藏；未收藏时返回 false
    pub async fn remove_bookmark(&self, campaign_id: i64, user_id: &str) -> Result<bool> {
        let txn = self.db.begin().await?;
        let removed = bookmark::Entity::delete_many()
            .filter(bookmark::Column::CampaignId.eq(campaign_id))
            .filter(bookmark::Column::UserId.eq(user_id))
            .exec(&txn)
            .await?
            .rows_affected;

        if removed > 0 {
            bump(&txn, campaign_id, &[(campaign::Column::BookmarkCount, -1)]).await?;
        }
        txn.commit().await?;

        if removed > 0 {
            self.invalidate_count_cache();
            info!("Bookmark removed: campaign={} user={}", campaign_id, user_id);
        }
        Ok(removed > 0)
    }

    /// 标记 / 取消参与；返回状态是否发生变化
    pub async fn set_participation(
        &self,
        campaign_id: i64,
        user_id: &str,
        participating: bool,
    ) -> Result<bool> {
        let txn = self.db.begin().await?;

        let changed = if participating {
            participation::Entity::insert(participation::ActiveModel {
                id: NotSet,
                campaign_id: Set(campaign_id),
                user_id: Set(user_id.to_string()),
                created_at: Set(Utc::now()),
            })
            .on_conflict(
                OnConflict::columns([
                    participation::Column::CampaignId,
                    participation::Column::UserId,
                ])
                .do_nothing()
                .to_owned(),
            )
            .exec_without_returning(&txn)
            .await?
        } else {
            participation::Entity::delete_many()
                .filter(participation::Column::CampaignId.eq(campaign_id))
                .filter(participation::Column::UserId.eq(user_id))
                .exec(&txn)
                .await?
                .rows_affected
        };

        if changed > 0 {
            let delta = if participating { 1 } else { -1 };
            bump(&txn, campaign_id, &[(campaign::Column::ParticipantCount, delta)]).await?;
        }
        txn.commit().await?;

        if changed > 0 {
            info!(
                "Participation {}: campaign={} user={}",
                if participating { "marked" } else { "cleared" },
                campaign_id,
                user_id
            );
        }
        Ok(changed > 0)
    }

    pub async fn get_comment(&self, id: i64) -> Result<Option<Comment>> {
        let db = &self.db;
        let model = retry::with_retry(&format!("get_comment({})", id), self.retry_config, || async {
            comment::Entity::find_by_id(id).one(db).await
        })
        .await?;
        Ok(model.map(model_to_comment))
    }

    /// 活动下的全部评论（含已删除，由调用方决定如何展示），按时间正序
    pub async fn list_comments(&self, campaign_id: i64) -> Result<Vec<Comment>> {
        let db = &self.db;
        let models = retry::with_retry("list_comments", self.retry_config, || async {
            comment::Entity::find()
                .filter(comment::Column::CampaignId.eq(campaign_id))
                .order_by_asc(comment::Column::CreatedAt)
                .order_by_asc(comment::Column::Id)
                .all(db)
                .await
        })
        .await?;
        Ok(models.into_iter().map(model_to_comment).collect())
    }

    pub async fn insert_comment(
        &self,
        campaign_id: i64,
        user_id: &str,
        parent_id: Option<i64>,
        content: &str,
    ) -> Result<Comment> {
        let now = Utc::now();
        let txn = self.db.begin().await?;

        let model = comment::ActiveModel {
            id: NotSet,
            campaign_id: Set(campaign_id),
            user_id: Set(user_id.to_string()),
            parent_id: Set(parent_id),
            content: Set(content.to_string()),
            created_at: Set(now),
            updated_at: Set(now),
            deleted_at: Set(None),
        }
        .insert(&txn)
        .await?;
        bump(&txn, campaign_id, &[(campaign::Column::CommentCount, 1)]).await?;
        txn.commit().await?;

        info!(
            "Comment {} posted on campaign {} by {}",
            model.id, campaign_id, user_id
        );
        Ok(model_to_comment(model))
    }

    pub async fn update_comment(&self, id: i64, content: &str) -> Result<Comment> {
        let existing = comment::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .filter(|c| c.deleted_at.is_none())
            .ok_or_else(|| CreditHubError::not_found(format!("comment {}", id)))?;

        let mut active: comment::ActiveModel = existing.into();
        active.content = Set(content.to_string());
        active.updated_at = Set(Utc::now());
        let model = active.update(&self.db).await?;
        Ok(model_to_comment(model))
    }

    /// 软删除评论；回复保留，计数减一
    pub async fn soft_delete_comment(&self, id: i64) -> Result<bool> {
        let now = Utc::now();
        let txn = self.db.begin().await?;

        let Some(existing) = comment::Entity::find_by_id(id).one(&txn).await? else {
            return Ok(false);
        };
        if existing.deleted_at.is_some() {
            return Ok(false);
        }

        let campaign_id = existing.campaign_id;
        let mut active: comment::ActiveModel = existing.into();
        active.deleted_at = Set(Some(now));
        active.updated_at = Set(now);
        active.update(&txn).await?;
        bump(&txn, campaign_id, &[(campaign::Column::CommentCount, -1)]).await?;
        txn.commit().await?;

        info!("Comment {} deleted", id);
        Ok(true)
    }

    /// 批量读取用户对一组活动的互动状态
    pub async fn interaction_states(
        &self,
        user_id: &str,
        ids: &[i64],
    ) -> Result<HashMap<i64, InteractionState>> {
        let mut out: HashMap<i64, InteractionState> = ids
            .iter()
            .map(|id| (*id, InteractionState::default()))
            .collect();
        if ids.is_empty() {
            return Ok(out);
        }

        let db = &self.db;
        let id_list = ids.to_vec();

        let reactions = retry::with_retry("interaction_states(reactions)", self.retry_config, || async {
            reaction::Entity::find()
                .filter(reaction::Column::UserId.eq(user_id))
                .filter(reaction::Column::CampaignId.is_in(id_list.clone()))
                .all(db)
                .await
        })
        .await?;
        for row in reactions {
            if let Some(state) = out.get_mut(&row.campaign_id) {
                state.reaction = row.kind.parse().ok();
            }
        }

        let bookmarks = retry::with_retry("interaction_states(bookmarks)", self.retry_config, || async {
            bookmark::Entity::find()
                .filter(bookmark::Column::UserId.eq(user_id))
                .filter(bookmark::Column::CampaignId.is_in(id_list.clone()))
                .all(db)
                .await
        })
        .await?;
        for row in bookmarks {
            if let Some(state) = out.get_mut(&row.campaign_id) {
                state.bookmarked = true;
            }
        }

        let participations =
            retry::with_retry("interaction_states(participations)", self.retry_config, || async {
                participation::Entity::find()
                    .filter(participation::Column::UserId.eq(user_id))
                    .filter(participation::Column::CampaignId.is_in(id_list.clone()))
                    .all(db)
                    .await
            })
            .await?;
        for row in participations {
            if let Some(state) = out.get_mut(&row.campaign_id) {
                state.participated = true;
            }
        }

        let emojis = retry::with_retry("interaction_states(emojis)", self.retry_config, || async {
            emoji_reaction::Entity::find()
                .filter(emoji_reaction::Column::UserId.eq(user_id))
                .filter(emoji_reaction::Column::CampaignId.is_in(id_list.clone()))
                .order_by_asc(emoji_reaction::Column::CreatedAt)
                .all(db)
                .await
        })
        .await?;
        for row in emojis {
            if let Some(state) = out.get_mut(&row.campaign_id) {
                state.emojis.push(row.emoji);
            }
        }

        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn as_map(deltas: Vec<(campaign::Column, i32)>) -> (i32, i32, i32) {
        let get = |col: campaign::Column| {
            deltas
                .iter()
                .find(|(c, _)| std::mem::discriminant(c) == std::mem::discriminant(&col))
                .map(|(_, d)| *d)
                .unwrap_or(0)
        };
        (
            get(campaign::Column::LikeCount),
            get(campaign::Column::DislikeCount),
            get(campaign::Column::ReactionScore),
        )
    }

    #[test]
    fn test_reaction_deltas() {
        use ReactionKind::*;
        assert_eq!(as_map(reaction_deltas(None, Some(Like))), (1, 0, 1));
        assert_eq!(as_map(reaction_deltas(None, Some(Dislike))), (0, 1, -1));
        assert_eq!(as_map(reaction_deltas(Some(Like), Some(Dislike))), (-1, 1, -2));
        assert_eq!(as_map(reaction_deltas(Some(Dislike), None)), (0, -1, 1));
        assert_eq!(as_map(reaction_deltas(Some(Like), Some(Like))), (0, 0, 0));
    }
}
