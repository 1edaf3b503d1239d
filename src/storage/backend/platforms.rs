//! 平台查询与写操作

use std::collections::HashMap;

use chrono::Utc;
use sea_orm::ActiveValue::Set;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, QuerySelect};
use serde::Serialize;
use tracing::info;

use super::converters::{model_to_platform, new_platform_active_model};
use super::{SeaOrmStorage, retry};
use crate::errors::{CreditHubError, Result};
use crate::storage::models::{CampaignStatus, NewPlatform, Platform, PlatformPatch, PlatformStatus};
use migration::entities::{campaign, platform};

/// 平台及其当前可见活动数量
#[derive(Debug, Clone, Serialize)]
pub struct PlatformWithCount {
    #[serde(flatten)]
    pub platform: Platform,
    pub campaign_count: i64,
}

impl SeaOrmStorage {
    /// 列出平台（按名称排序），附带已发布且未过期的活动数量
    pub async fn list_platforms(&self, active_only: bool) -> Result<Vec<PlatformWithCount>> {
        let db = &self.db;
        let now = Utc::now();

        let models = retry::with_retry("list_platforms", self.retry_config, || async {
            let mut query = platform::Entity::find().order_by_asc(platform::Column::Name);
            if active_only {
                query = query.filter(platform::Column::Status.eq(PlatformStatus::Active.as_ref()));
            }
            query.all(db).await
        })
        .await?;

        let counts: HashMap<i64, i64> =
            retry::with_retry("list_platforms(counts)", self.retry_config, || async {
                campaign::Entity::find()
                    .select_only()
                    .column(campaign::Column::PlatformId)
                    .column_as(campaign::Column::Id.count(), "total")
                    .filter(campaign::Column::Status.eq(CampaignStatus::Published.as_ref()))
                    .filter(campaign::Column::DeletedAt.is_null())
                    .filter(
                        sea_orm::Condition::any()
                            .add(campaign::Column::EndAt.is_null())
                            .add(campaign::Column::EndAt.gte(now)),
                    )
                    .group_by(campaign::Column::PlatformId)
                    .into_tuple::<(i64, i64)>()
                    .all(db)
                    .await
            })
            .await?
            .into_iter()
            .collect();

        Ok(models
            .into_iter()
            .map(|m| {
                let campaign_count = counts.get(&m.id).copied().unwrap_or(0);
                PlatformWithCount {
                    platform: model_to_platform(m),
                    campaign_count,
                }
            })
            .collect())
    }

    pub async fn get_platform(&self, id: i64) -> Result<Option<Platform>> {
        let db = &self.db;
        let model = retry::with_retry(&format!("get_platform({})", id), self.retry_config, || async {
            platform::Entity::find_by_id(id).one(db).await
        })
        .await?;
        Ok(model.map(model_to_platform))
    }

    pub async fn get_platform_by_slug(&self, slug: &str) -> Result<Option<Platform>> {
        let db = &self.db;
        let model = retry::with_retry("get_platform_by_slug", self.retry_config, || async {
            platform::Entity::find()
                .filter(platform::Column::Slug.eq(slug))
                .one(db)
                .await
        })
        .await?;
        Ok(model.map(model_to_platform))
    }

    /// 新建平台；slug 冲突时返回 Conflict
    pub async fn insert_platform(&self, new: NewPlatform) -> Result<Platform> {
        let model = new_platform_active_model(&new, Utc::now())
            .insert(&self.db)
            .await
            .map_err(|e| match CreditHubError::from(e) {
                CreditHubError::Conflict(_) => {
                    CreditHubError::conflict(format!("platform slug '{}' already exists", new.slug))
                }
                other => other,
            })?;

        info!("Platform created: id={} slug={}", model.id, model.slug);
        Ok(model_to_platform(model))
    }

    pub async fn update_platform(&self, id: i64, patch: PlatformPatch) -> Result<Platform> {
        let existing = platform::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or_else(|| CreditHubError::not_found(format!("platform {}", id)))?;

        let mut active: platform::ActiveModel = existing.into();
        if let Some(name) = patch.name {
            active.name = Set(name);
        }
        if let Some(website) = patch.website {
            active.website = Set(website);
        }
        if let Some(logo_url) = patch.logo_url {
            active.logo_url = Set(logo_url);
        }
        if let Some(description) = patch.description {
            active.description = Set(description);
        }
        if let Some(status) = patch.status {
            active.status = Set(status.as_ref().to_string());
        }
        active.updated_at = Set(Utc::now());

        let model = active.update(&self.db).await?;
        self.invalidate_count_cache();

        info!("Platform updated: id={} status={}", model.id, model.status);
        Ok(model_to_platform(model))
    }

    pub async fn set_platform_status(&self, id: i64, status: PlatformStatus) -> Result<Platform> {
        self.update_platform(
            id,
            PlatformPatch {
                status: Some(status),
                ..Default::default()
            },
        )
        .await
    }
}
