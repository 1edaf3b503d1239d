//! 标签与条件标签
//!
//! 条件标签的权重变化或删除会影响挂载它的活动难度，
//! 这些活动在同一事务里重算。

use chrono::Utc;
use sea_orm::ActiveValue::{NotSet, Set};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, TransactionTrait,
};
use tracing::info;

use super::campaign_mutations::refresh_difficulty;
use super::converters::{model_to_condition_tag, model_to_tag};
use super::{SeaOrmStorage, retry};
use crate::errors::{CreditHubError, Result};
use crate::storage::models::{
    ConditionKind, ConditionTag, ConditionTagPatch, NewConditionTag, NewTag, Tag, TagKind,
    TagPatch,
};
use migration::entities::{campaign_condition_tag, campaign_tag, condition_tag, tag};

async fn campaigns_using_condition<C: ConnectionTrait>(
    conn: &C,
    condition_tag_id: i64,
) -> std::result::Result<Vec<i64>, DbErr> {
    campaign_condition_tag::Entity::find()
        .select_only()
        .column(campaign_condition_tag::Column::CampaignId)
        .filter(campaign_condition_tag::Column::ConditionTagId.eq(condition_tag_id))
        .into_tuple()
        .all(conn)
        .await
}

fn conflict_on_slug(err: DbErr, slug: &str) -> CreditHubError {
    match CreditHubError::from(err) {
        CreditHubError::Conflict(_) => {
            CreditHubError::conflict(format!("tag slug '{}' already exists", slug))
        }
        other => other,
    }
}

impl SeaOrmStorage {
    pub async fn list_tags(&self, kind: Option<TagKind>) -> Result<Vec<Tag>> {
        let db = &self.db;
        let models = retry::with_retry("list_tags", self.retry_config, || async {
            let mut query = tag::Entity::find().order_by_asc(tag::Column::Name);
            if let Some(kind) = kind {
                query = query.filter(tag::Column::Kind.eq(kind.as_ref()));
            }
            query.all(db).await
        })
        .await?;
        Ok(models.into_iter().map(model_to_tag).collect())
    }

    pub async fn list_condition_tags(&self, kind: Option<ConditionKind>) -> Result<Vec<ConditionTag>> {
        let db = &self.db;
        let models = retry::with_retry("list_condition_tags", self.retry_config, || async {
            let mut query = condition_tag::Entity::find()
                .order_by_desc(condition_tag::Column::DifficultyWeight)
                .order_by_asc(condition_tag::Column::Name);
            if let Some(kind) = kind {
                query = query.filter(condition_tag::Column::Kind.eq(kind.as_ref()));
            }
            query.all(db).await
        })
        .await?;
        Ok(models.into_iter().map(model_to_condition_tag).collect())
    }

    pub async fn find_tags_by_slugs(&self, slugs: &[String]) -> Result<Vec<Tag>> {
        if slugs.is_empty() {
            return Ok(Vec::new());
        }
        let db = &self.db;
        let models = retry::with_retry("find_tags_by_slugs", self.retry_config, || async {
            tag::Entity::find()
                .filter(tag::Column::Slug.is_in(slugs.to_vec()))
                .all(db)
                .await
        })
        .await?;
        Ok(models.into_iter().map(model_to_tag).collect())
    }

    pub async fn find_condition_tags_by_slugs(&self, slugs: &[String]) -> Result<Vec<ConditionTag>> {
        if slugs.is_empty() {
            return Ok(Vec::new());
        }
        let db = &self.db;
        let models = retry::with_retry("find_condition_tags_by_slugs", self.retry_config, || async {
            condition_tag::Entity::find()
                .filter(condition_tag::Column::Slug.is_in(slugs.to_vec()))
                .all(db)
                .await
        })
        .await?;
        Ok(models.into_iter().map(model_to_condition_tag).collect())
    }

    pub async fn find_tags_by_ids(&self, ids: &[i64]) -> Result<Vec<Tag>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let models = tag::Entity::find()
            .filter(tag::Column::Id.is_in(ids.to_vec()))
            .all(&self.db)
            .await?;
        Ok(models.into_iter().map(model_to_tag).collect())
    }

    pub async fn find_condition_tags_by_ids(&self, ids: &[i64]) -> Result<Vec<ConditionTag>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let models = condition_tag::Entity::find()
            .filter(condition_tag::Column::Id.is_in(ids.to_vec()))
            .all(&self.db)
            .await?;
        Ok(models.into_iter().map(model_to_condition_tag).collect())
    }

    pub async fn insert_tag(&self, new: NewTag) -> Result<Tag> {
        let model = tag::ActiveModel {
            id: NotSet,
            name: Set(new.name.clone()),
            slug: Set(new.slug.clone()),
            kind: Set(new.kind.as_ref().to_string()),
            created_at: Set(Utc::now()),
        }
        .insert(&self.db)
        .await
        .map_err(|e| conflict_on_slug(e, &new.slug))?;

        info!("Tag created: {} ({})", model.slug, model.kind);
        Ok(model_to_tag(model))
    }

    pub async fn update_tag(&self, id: i64, patch: TagPatch) -> Result<Tag> {
        let existing = tag::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or_else(|| CreditHubError::not_found(format!("tag {}", id)))?;

        let mut active: tag::ActiveModel = existing.into();
        if let Some(name) = patch.name {
            active.name = Set(name);
        }
        if let Some(kind) = patch.kind {
            active.kind = Set(kind.as_ref().to_string());
        }
        let model = active.update(&self.db).await?;
        info!("Tag updated: {}", model.slug);
        Ok(model_to_tag(model))
    }

    /// 删除标签并解除与活动的关联
    pub async fn delete_tag(&self, id: i64) -> Result<bool> {
        let txn = self.db.begin().await?;
        campaign_tag::Entity::delete_many()
            .filter(campaign_tag::Column::TagId.eq(id))
            .exec(&txn)
            .await?;
        let result = tag::Entity::delete_by_id(id).exec(&txn).await?;
        txn.commit().await?;

        let deleted = result.rows_affected > 0;
        if deleted {
            self.invalidate_count_cache();
            info!("Tag deleted: {}", id);
        }
        Ok(deleted)
    }

    pub async fn insert_condition_tag(&self, new: NewConditionTag) -> Result<ConditionTag> {
        let model = condition_tag::ActiveModel {
            id: NotSet,
            name: Set(new.name.clone()),
            slug: Set(new.slug.clone()),
            kind: Set(new.kind.as_ref().to_string()),
            difficulty_weight: Set(new.difficulty_weight),
            created_at: Set(Utc::now()),
        }
        .insert(&self.db)
        .await
        .map_err(|e| conflict_on_slug(e, &new.slug))?;

        info!(
            "Condition tag created: {} (weight {})",
            model.slug, model.difficulty_weight
        );
        Ok(model_to_condition_tag(model))
    }

    /// 更新条件标签；权重变化时重算所有挂载活动的难度
    pub async fn update_condition_tag(
        &self,
        id: i64,
        patch: ConditionTagPatch,
    ) -> Result<ConditionTag> {
        let txn = self.db.begin().await?;
        let existing = condition_tag::Entity::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or_else(|| CreditHubError::not_found(format!("condition tag {}", id)))?;

        let weight_changed = patch
            .difficulty_weight
            .is_some_and(|w| w != existing.difficulty_weight);

        let mut active: condition_tag::ActiveModel = existing.into();
        if let Some(name) = patch.name {
            active.name = Set(name);
        }
        if let Some(kind) = patch.kind {
            active.kind = Set(kind.as_ref().to_string());
        }
        if let Some(weight) = patch.difficulty_weight {
            active.difficulty_weight = Set(weight);
        }
        let model = active.update(&txn).await?;

        let mut refreshed = 0usize;
        if weight_changed {
            for campaign_id in campaigns_using_condition(&txn, id).await? {
                refresh_difficulty(&txn, campaign_id).await?;
                refreshed += 1;
            }
        }
        txn.commit().await?;

        if refreshed > 0 {
            self.invalidate_count_cache();
        }
        info!(
            "Condition tag updated: {} (difficulty refreshed for {} campaigns)",
            model.slug, refreshed
        );
        Ok(model_to_condition_tag(model))
    }

    /// 删除条件标签，解除关联并重算受影响活动的难度
    pub async fn delete_condition_tag(&self, id: i64) -> Result<bool> {
        let txn = self.db.begin().await?;
        let affected = campaigns_using_condition(&txn, id).await?;

        campaign_condition_tag::Entity::delete_many()
            .filter(campaign_condition_tag::Column::ConditionTagId.eq(id))
            .exec(&txn)
            .await?;
        let result = condition_tag::Entity::delete_by_id(id).exec(&txn).await?;

        for campaign_id in &affected {
            refresh_difficulty(&txn, *campaign_id).await?;
        }
        txn.commit().await?;

        let deleted = result.rows_affected > 0;
        if deleted {
            self.invalidate_count_cache();
            info!(
                "Condition tag deleted: {} ({} campaigns refreshed)",
                id,
                affected.len()
            );
        }
        Ok(deleted)
    }
}
