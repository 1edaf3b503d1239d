//! 活动写操作
//!
//! 活动行、翻译、标签关联在同一个事务里写入；难度随条件标签一起重算。

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use sea_orm::ActiveValue::Set;
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QuerySelect,
    TransactionTrait,
};
use tracing::info;

use super::converters::{
    encode_ai_models, model_to_campaign, model_to_translation, new_campaign_active_model,
};
use super::{SeaOrmStorage, retry};
use crate::errors::{CreditHubError, Result};
use crate::storage::models::{
    Campaign, CampaignPatch, CampaignStatus, Difficulty, NewCampaign, Translation,
    TranslationInput,
};
use migration::entities::{
    campaign, campaign_condition_tag, campaign_tag, campaign_translation, condition_tag,
};

fn dedup_ids(ids: &[i64]) -> Vec<i64> {
    ids.iter().copied().collect::<BTreeSet<_>>().into_iter().collect()
}

/// 根据条件标签 id 计算难度
pub(super) async fn difficulty_for<C: ConnectionTrait>(
    conn: &C,
    condition_tag_ids: &[i64],
) -> std::result::Result<Difficulty, DbErr> {
    if condition_tag_ids.is_empty() {
        return Ok(Difficulty::Easy);
    }
    let weights: Vec<i32> = condition_tag::Entity::find()
        .select_only()
        .column(condition_tag::Column::DifficultyWeight)
        .filter(condition_tag::Column::Id.is_in(dedup_ids(condition_tag_ids)))
        .into_tuple()
        .all(conn)
        .await?;
    Ok(Difficulty::from_weights(weights))
}

/// 读取活动当前挂载的条件标签并重算、写回难度
pub(super) async fn refresh_difficulty<C: ConnectionTrait>(
    conn: &C,
    campaign_id: i64,
) -> std::result::Result<Difficulty, DbErr> {
    let ids: Vec<i64> = campaign_condition_tag::Entity::find()
        .select_only()
        .column(campaign_condition_tag::Column::ConditionTagId)
        .filter(campaign_condition_tag::Column::CampaignId.eq(campaign_id))
        .into_tuple()
        .all(conn)
        .await?;
    let difficulty = difficulty_for(conn, &ids).await?;

    campaign::Entity::update_many()
        .col_expr(
            campaign::Column::Difficulty,
            Expr::value(difficulty.as_ref().to_string()),
        )
        .filter(campaign::Column::Id.eq(campaign_id))
        .exec(conn)
        .await?;
    Ok(difficulty)
}

async fn replace_tag_links<C: ConnectionTrait>(
    conn: &C,
    campaign_id: i64,
    tag_ids: &[i64],
) -> std::result::Result<(), DbErr> {
    campaign_tag::Entity::delete_many()
        .filter(campaign_tag::Column::CampaignId.eq(campaign_id))
        .exec(conn)
        .await?;

    let rows: Vec<campaign_tag::ActiveModel> = dedup_ids(tag_ids)
        .into_iter()
        .map(|tag_id| campaign_tag::ActiveModel {
            campaign_id: Set(campaign_id),
            tag_id: Set(tag_id),
        })
        .collect();
    if !rows.is_empty() {
        campaign_tag::Entity::insert_many(rows).exec(conn).await?;
    }
    Ok(())
}

async fn replace_condition_links<C: ConnectionTrait>(
    conn: &C,
    campaign_id: i64,
    condition_tag_ids: &[i64],
) -> std::result::Result<(), DbErr> {
    campaign_condition_tag::Entity::delete_many()
        .filter(campaign_condition_tag::Column::CampaignId.eq(campaign_id))
        .exec(conn)
        .await?;

    let rows: Vec<campaign_condition_tag::ActiveModel> = dedup_ids(condition_tag_ids)
        .into_iter()
        .map(|condition_tag_id| campaign_condition_tag::ActiveModel {
            campaign_id: Set(campaign_id),
            condition_tag_id: Set(condition_tag_id),
        })
        .collect();
    if !rows.is_empty() {
        campaign_condition_tag::Entity::insert_many(rows)
            .exec(conn)
            .await?;
    }
    Ok(())
}

/// 按 (campaign_id, locale) 插入或覆盖翻译
async fn upsert_translation_row<C: ConnectionTrait>(
    conn: &C,
    campaign_id: i64,
    input: &TranslationInput,
    now: DateTime<Utc>,
) -> std::result::Result<(), DbErr> {
    let row = campaign_translation::ActiveModel {
        campaign_id: Set(campaign_id),
        locale: Set(input.locale.clone()),
        title: Set(input.title.clone()),
        description: Set(input.description.clone()),
        is_ai_generated: Set(input.is_ai_generated),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };

    campaign_translation::Entity::insert(row)
        .on_conflict(
            OnConflict::columns([
                campaign_translation::Column::CampaignId,
                campaign_translation::Column::Locale,
            ])
            .update_columns([
                campaign_translation::Column::Title,
                campaign_translation::Column::Description,
                campaign_translation::Column::IsAiGenerated,
                campaign_translation::Column::UpdatedAt,
            ])
            .to_owned(),
        )
        .exec_without_returning(conn)
        .await?;
    Ok(())
}

async fn load_campaign<C: ConnectionTrait>(
    conn: &C,
    id: i64,
) -> std::result::Result<campaign::Model, DbErr> {
    campaign::Entity::find_by_id(id)
        .one(conn)
        .await?
        .ok_or_else(|| DbErr::RecordNotFound(format!("campaign {}", id)))
}

impl SeaOrmStorage {
    /// 在一个事务内写入活动、翻译与标签关联
    pub async fn insert_campaign(&self, new: NewCampaign) -> Result<Campaign> {
        let now = Utc::now();
        let txn = self.db.begin().await?;

        let difficulty = difficulty_for(&txn, &new.condition_tag_ids).await?;
        let model = new_campaign_active_model(&new, difficulty, now)
            .insert(&txn)
            .await?;

        for translation in &new.translations {
            upsert_translation_row(&txn, model.id, translation, now).await?;
        }
        replace_tag_links(&txn, model.id, &new.tag_ids).await?;
        replace_condition_links(&txn, model.id, &new.condition_tag_ids).await?;

        txn.commit().await?;
        self.invalidate_count_cache();

        info!(
            "Campaign created: id={} slug={} status={}",
            model.id, model.slug, model.status
        );
        Ok(model_to_campaign(model))
    }

    /// 部分更新活动；传入的翻译按 locale 覆盖，标签列表整体替换
    pub async fn update_campaign(&self, id: i64, patch: CampaignPatch) -> Result<Campaign> {
        let now = Utc::now();
        let txn = self.db.begin().await?;

        let existing = load_campaign(&txn, id).await?;
        if existing.deleted_at.is_some() {
            return Err(CreditHubError::not_found(format!("campaign {}", id)));
        }

        let mut active: campaign::ActiveModel = existing.into();
        if let Some(platform_id) = patch.platform_id {
            active.platform_id = Set(platform_id);
        }
        if let Some(slug) = patch.slug {
            active.slug = Set(slug);
        }
        if let Some(free_credit) = patch.free_credit {
            active.free_credit = Set(free_credit);
        }
        if let Some(value) = patch.credit_value_cents {
            active.credit_value_cents = Set(value);
        }
        if let Some(start_at) = patch.start_at {
            active.start_at = Set(start_at);
        }
        if let Some(end_at) = patch.end_at {
            active.end_at = Set(end_at);
        }
        if let Some(link) = patch.official_link {
            active.official_link = Set(link);
        }
        if let Some(models) = patch.ai_models {
            active.ai_models = Set(encode_ai_models(&models));
        }
        if let Some(condition_ids) = patch.condition_tag_ids.as_deref() {
            let difficulty = difficulty_for(&txn, condition_ids).await?;
            active.difficulty = Set(difficulty.as_ref().to_string());
        }
        active.updated_at = Set(now);
        let model = active.update(&txn).await?;

        if let Some(translations) = &patch.translations {
            for translation in translations {
                upsert_translation_row(&txn, id, translation, now).await?;
            }
        }
        if let Some(tag_ids) = &patch.tag_ids {
            replace_tag_links(&txn, id, tag_ids).await?;
        }
        if let Some(condition_ids) = &patch.condition_tag_ids {
            replace_condition_links(&txn, id, condition_ids).await?;
        }

        txn.commit().await?;
        self.invalidate_count_cache();

        info!("Campaign updated: id={} slug={}", model.id, model.slug);
        Ok(model_to_campaign(model))
    }

    /// 写入单个语言的翻译并刷新活动的 updated_at
    pub async fn upsert_translation(
        &self,
        campaign_id: i64,
        input: TranslationInput,
    ) -> Result<Translation> {
        let now = Utc::now();
        let txn = self.db.begin().await?;

        upsert_translation_row(&txn, campaign_id, &input, now).await?;
        campaign::Entity::update_many()
            .col_expr(campaign::Column::UpdatedAt, Expr::value(now))
            .filter(campaign::Column::Id.eq(campaign_id))
            .exec(&txn)
            .await?;

        let stored = campaign_translation::Entity::find()
            .filter(campaign_translation::Column::CampaignId.eq(campaign_id))
            .filter(campaign_translation::Column::Locale.eq(input.locale.as_str()))
            .one(&txn)
            .await?
            .ok_or_else(|| {
                CreditHubError::database_operation(format!(
                    "translation {}/{} missing after upsert",
                    campaign_id, input.locale
                ))
            })?;

        txn.commit().await?;
        self.invalidate_count_cache();

        info!(
            "Translation upserted: campaign={} locale={}",
            campaign_id, input.locale
        );
        Ok(model_to_translation(stored))
    }

    /// 状态迁移：仅当当前状态属于 `from` 时才生效
    ///
    /// 返回 `None` 表示活动不存在、已删除或状态不匹配。
    pub async fn transition_status(
        &self,
        id: i64,
        from: &[CampaignStatus],
        to: CampaignStatus,
        reviewer: Option<&str>,
        reason: Option<&str>,
    ) -> Result<Option<Campaign>> {
        let now = Utc::now();
        let db = &self.db;
        let from_values: Vec<String> = from.iter().map(|s| s.as_ref().to_string()).collect();

        let result = retry::with_retry(
            &format!("transition_status({}, {})", id, to),
            self.retry_config,
            || async {
                let mut update = campaign::Entity::update_many()
                    .col_expr(campaign::Column::Status, Expr::value(to.as_ref().to_string()))
                    .col_expr(campaign::Column::UpdatedAt, Expr::value(now));
                if let Some(reviewer) = reviewer {
                    update = update
                        .col_expr(
                            campaign::Column::ReviewedBy,
                            Expr::value(Some(reviewer.to_string())),
                        )
                        .col_expr(campaign::Column::ReviewedAt, Expr::value(Some(now)));
                }
                update = update.col_expr(
                    campaign::Column::RejectReason,
                    Expr::value(reason.map(str::to_string)),
                );
                update
                    .filter(campaign::Column::Id.eq(id))
                    .filter(campaign::Column::DeletedAt.is_null())
                    .filter(campaign::Column::Status.is_in(from_values.clone()))
                    .exec(db)
                    .await
            },
        )
        .await?;

        if result.rows_affected == 0 {
            return Ok(None);
        }
        self.invalidate_count_cache();
        info!("Campaign {} -> {}", id, to);
        self.get_campaign(id).await
    }

    /// 设置 / 取消推荐位
    pub async fn set_featured(
        &self,
        id: i64,
        featured: bool,
        until: Option<DateTime<Utc>>,
    ) -> Result<Option<Campaign>> {
        let now = Utc::now();
        let db = &self.db;
        let until = if featured { until } else { None };

        let result = retry::with_retry(&format!("set_featured({})", id), self.retry_config, || async {
            campaign::Entity::update_many()
                .col_expr(campaign::Column::IsFeatured, Expr::value(featured))
                .col_expr(campaign::Column::FeaturedUntil, Expr::value(until))
                .col_expr(campaign::Column::UpdatedAt, Expr::value(now))
                .filter(campaign::Column::Id.eq(id))
                .filter(campaign::Column::DeletedAt.is_null())
                .exec(db)
                .await
        })
        .await?;

        if result.rows_affected == 0 {
            return Ok(None);
        }
        self.invalidate_count_cache();
        info!(
            "Campaign {} featured={} until={:?}",
            id, featured, until
        );
        self.get_campaign(id).await
    }

    /// 软删除；返回是否有记录被删除
    pub async fn soft_delete_campaign(&self, id: i64) -> Result<bool> {
        let now = Utc::now();
        let db = &self.db;

        let result = retry::with_retry(&format!("soft_delete({})", id), self.retry_config, || async {
            campaign::Entity::update_many()
                .col_expr(campaign::Column::DeletedAt, Expr::value(Some(now)))
                .col_expr(campaign::Column::IsFeatured, Expr::value(false))
                .col_expr(campaign::Column::UpdatedAt, Expr::value(now))
                .filter(campaign::Column::Id.eq(id))
                .filter(campaign::Column::DeletedAt.is_null())
                .exec(db)
                .await
        })
        .await?;

        let deleted = result.rows_affected > 0;
        if deleted {
            self.invalidate_count_cache();
            info!("Campaign soft-deleted: {}", id);
        }
        Ok(deleted)
    }

    /// 将截止时间已过的已发布活动标记为 expired
    pub async fn expire_overdue(&self, now: DateTime<Utc>) -> Result<u64> {
        let db = &self.db;
        let result = retry::with_retry("expire_overdue", self.retry_config, || async {
            campaign::Entity::update_many()
                .col_expr(
                    campaign::Column::Status,
                    Expr::value(CampaignStatus::Expired.as_ref()),
                )
                .col_expr(campaign::Column::IsFeatured, Expr::value(false))
                .col_expr(campaign::Column::UpdatedAt, Expr::value(now))
                .filter(campaign::Column::Status.eq(CampaignStatus::Published.as_ref()))
                .filter(campaign::Column::EndAt.lt(now))
                .filter(campaign::Column::DeletedAt.is_null())
                .exec(db)
                .await
        })
        .await?;

        if result.rows_affected > 0 {
            self.invalidate_count_cache();
            info!("Expired {} overdue campaigns", result.rows_affected);
        }
        Ok(result.rows_affected)
    }

    /// 清除已过期的推荐位
    pub async fn clear_lapsed_featured(&self, now: DateTime<Utc>) -> Result<u64> {
        let db = &self.db;
        let result = retry::with_retry("clear_lapsed_featured", self.retry_config, || async {
            campaign::Entity::update_many()
                .col_expr(campaign::Column::IsFeatured, Expr::value(false))
                .col_expr(
                    campaign::Column::FeaturedUntil,
                    Expr::value(Option::<DateTime<Utc>>::None),
                )
                .filter(campaign::Column::IsFeatured.eq(true))
                .filter(campaign::Column::FeaturedUntil.lte(now))
                .exec(db)
                .await
        })
        .await?;

        if result.rows_affected > 0 {
            self.invalidate_count_cache();
            info!("Cleared {} lapsed featured slots", result.rows_affected);
        }
        Ok(result.rows_affected)
    }
}

#[cfg(test)]
mod tests {
    use super::dedup_ids;

    #[test]
    fn test_dedup_ids() {
        assert_eq!(dedup_ids(&[3, 1, 3, 2, 1]), vec![1, 2, 3]);
        assert!(dedup_ids(&[]).is_empty());
    }
}
