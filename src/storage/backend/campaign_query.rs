//! 活动只读查询
//!
//! 列表查询先拿一页活动，再用批量加载器一次性补齐翻译、标签、平台，
//! 避免逐条查询关联数据。

use std::collections::{BTreeMap, HashMap};

use chrono::Utc;
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect};
use tracing::{debug, trace};

use super::converters::{
    model_to_campaign, model_to_condition_tag, model_to_platform, model_to_tag,
    model_to_translation,
};
use super::filter::{CampaignFilter, build_condition, filtered_select};
use super::{SeaOrmStorage, retry};
use crate::errors::Result;
use crate::storage::models::{Campaign, ConditionTag, Platform, Tag, Translation};
use migration::entities::{
    campaign, campaign_condition_tag, campaign_tag, campaign_translation, condition_tag,
    emoji_reaction, platform, tag,
};

/// 一页活动及符合条件的总数
#[derive(Debug, Clone)]
pub struct CampaignPage {
    pub items: Vec<Campaign>,
    pub total: u64,
}

impl SeaOrmStorage {
    /// 按过滤条件分页列出活动（带 COUNT 缓存）
    ///
    /// `page` 从 1 开始。
    pub async fn list_campaigns(
        &self,
        filter: &CampaignFilter,
        page: u64,
        page_size: u64,
    ) -> Result<CampaignPage> {
        let now = Utc::now();
        let db = &self.db;
        let cache_key = filter.cache_key();

        let total = if let Some(cached) = self.count_cache.get(&cache_key) {
            debug!("count cache hit: key={}, value={}", cache_key, cached);
            cached
        } else {
            let condition = build_condition(filter, now);
            let count = retry::with_retry("list_campaigns(count)", self.retry_config, || async {
                campaign::Entity::find()
                    .filter(condition.clone())
                    .count(db)
                    .await
            })
            .await?;
            self.count_cache.insert(cache_key, count);
            count
        };

        let page_offset = page.max(1) - 1;
        let models = retry::with_retry("list_campaigns(data)", self.retry_config, || async {
            filtered_select(filter, now)
                .paginate(db, page_size.max(1))
                .fetch_page(page_offset)
                .await
        })
        .await?;

        trace!(
            "list_campaigns page={} size={} returned {} of {}",
            page,
            page_size,
            models.len(),
            total
        );

        Ok(CampaignPage {
            items: models.into_iter().map(model_to_campaign).collect(),
            total,
        })
    }

    /// 按 id 读取活动（包含已软删除的记录）
    pub async fn get_campaign(&self, id: i64) -> Result<Option<Campaign>> {
        let db = &self.db;
        let model = retry::with_retry(&format!("get_campaign({})", id), self.retry_config, || async {
            campaign::Entity::find_by_id(id).one(db).await
        })
        .await?;
        Ok(model.map(model_to_campaign))
    }

    /// 按 id 读取未删除的活动
    pub async fn get_live_campaign(&self, id: i64) -> Result<Option<Campaign>> {
        Ok(self.get_campaign(id).await?.filter(|c| !c.is_deleted()))
    }

    /// 按 slug 读取未删除的活动
    pub async fn get_campaign_by_slug(&self, slug: &str) -> Result<Option<Campaign>> {
        let db = &self.db;
        let model = retry::with_retry(
            &format!("get_campaign_by_slug({})", slug),
            self.retry_config,
            || async {
                campaign::Entity::find()
                    .filter(campaign::Column::Slug.eq(slug))
                    .filter(campaign::Column::DeletedAt.is_null())
                    .one(db)
                    .await
            },
        )
        .await?;
        Ok(model.map(model_to_campaign))
    }

    /// slug 是否已被其他未删除活动占用
    pub async fn slug_taken(&self, slug: &str, exclude_id: Option<i64>) -> Result<bool> {
        let db = &self.db;
        let count = retry::with_retry("slug_taken", self.retry_config, || async {
            let mut query = campaign::Entity::find()
                .filter(campaign::Column::Slug.eq(slug))
                .filter(campaign::Column::DeletedAt.is_null());
            if let Some(id) = exclude_id {
                query = query.filter(campaign::Column::Id.ne(id));
            }
            query.count(db).await
        })
        .await?;
        Ok(count > 0)
    }

    /// 批量加载翻译，按 locale 排序
    pub async fn translations_for(&self, ids: &[i64]) -> Result<HashMap<i64, Vec<Translation>>> {
        let mut out: HashMap<i64, Vec<Translation>> = HashMap::new();
        if ids.is_empty() {
            return Ok(out);
        }

        let db = &self.db;
        let models = retry::with_retry("translations_for", self.retry_config, || async {
            campaign_translation::Entity::find()
                .filter(campaign_translation::Column::CampaignId.is_in(ids.to_vec()))
                .order_by_asc(campaign_translation::Column::Locale)
                .all(db)
                .await
        })
        .await?;

        for model in models {
            out.entry(model.campaign_id)
                .or_default()
                .push(model_to_translation(model));
        }
        Ok(out)
    }

    /// 批量加载分类 / 模型标签
    pub async fn tags_for(&self, ids: &[i64]) -> Result<HashMap<i64, Vec<Tag>>> {
        let mut out: HashMap<i64, Vec<Tag>> = HashMap::new();
        if ids.is_empty() {
            return Ok(out);
        }

        let db = &self.db;
        let links = retry::with_retry("tags_for(links)", self.retry_config, || async {
            campaign_tag::Entity::find()
                .filter(campaign_tag::Column::CampaignId.is_in(ids.to_vec()))
                .all(db)
                .await
        })
        .await?;
        if links.is_empty() {
            return Ok(out);
        }

        let tag_ids: Vec<i64> = links.iter().map(|l| l.tag_id).collect();
        let tags: HashMap<i64, Tag> = retry::with_retry("tags_for(tags)", self.retry_config, || async {
            tag::Entity::find()
                .filter(tag::Column::Id.is_in(tag_ids.clone()))
                .order_by_asc(tag::Column::Name)
                .all(db)
                .await
        })
        .await?
        .into_iter()
        .map(|m| (m.id, model_to_tag(m)))
        .collect();

        for link in links {
            if let Some(tag) = tags.get(&link.tag_id) {
                out.entry(link.campaign_id).or_default().push(tag.clone());
            }
        }
        for list in out.values_mut() {
            list.sort_by(|a, b| a.name.cmp(&b.name));
        }
        Ok(out)
    }

    /// 批量加载条件标签
    pub async fn condition_tags_for(
        &self,
        ids: &[i64],
    ) -> Result<HashMap<i64, Vec<ConditionTag>>> {
        let mut out: HashMap<i64, Vec<ConditionTag>> = HashMap::new();
        if ids.is_empty() {
            return Ok(out);
        }

        let db = &self.db;
        let links = retry::with_retry("condition_tags_for(links)", self.retry_config, || async {
            campaign_condition_tag::Entity::find()
                .filter(campaign_condition_tag::Column::CampaignId.is_in(ids.to_vec()))
                .all(db)
                .await
        })
        .await?;
        if links.is_empty() {
            return Ok(out);
        }

        let tag_ids: Vec<i64> = links.iter().map(|l| l.condition_tag_id).collect();
        let tags: HashMap<i64, ConditionTag> =
            retry::with_retry("condition_tags_for(tags)", self.retry_config, || async {
                condition_tag::Entity::find()
                    .filter(condition_tag::Column::Id.is_in(tag_ids.clone()))
                    .all(db)
                    .await
            })
            .await?
            .into_iter()
            .map(|m| (m.id, model_to_condition_tag(m)))
            .collect();

        for link in links {
            if let Some(tag) = tags.get(&link.condition_tag_id) {
                out.entry(link.campaign_id).or_default().push(tag.clone());
            }
        }
        for list in out.values_mut() {
            list.sort_by(|a, b| {
                b.difficulty_weight
                    .cmp(&a.difficulty_weight)
                    .then_with(|| a.name.cmp(&b.name))
            });
        }
        Ok(out)
    }

    /// 批量加载平台（参数为平台 id）
    pub async fn platforms_for(&self, platform_ids: &[i64]) -> Result<HashMap<i64, Platform>> {
        if platform_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let mut unique = platform_ids.to_vec();
        unique.sort_unstable();
        unique.dedup();

        let db = &self.db;
        let models = retry::with_retry("platforms_for", self.retry_config, || async {
            platform::Entity::find()
                .filter(platform::Column::Id.is_in(unique.clone()))
                .all(db)
                .await
        })
        .await?;

        Ok(models
            .into_iter()
            .map(|m| (m.id, model_to_platform(m)))
            .collect())
    }

    /// 每个活动的 emoji 计数（emoji → 次数，按 emoji 排序）
    pub async fn emoji_counts(&self, ids: &[i64]) -> Result<HashMap<i64, BTreeMap<String, i64>>> {
        let mut out: HashMap<i64, BTreeMap<String, i64>> = HashMap::new();
        if ids.is_empty() {
            return Ok(out);
        }

        let db = &self.db;
        let rows: Vec<(i64, String, i64)> =
            retry::with_retry("emoji_counts", self.retry_config, || async {
                emoji_reaction::Entity::find()
                    .select_only()
                    .column(emoji_reaction::Column::CampaignId)
                    .column(emoji_reaction::Column::Emoji)
                    .column_as(emoji_reaction::Column::Id.count(), "total")
                    .filter(emoji_reaction::Column::CampaignId.is_in(ids.to_vec()))
                    .group_by(emoji_reaction::Column::CampaignId)
                    .group_by(emoji_reaction::Column::Emoji)
                    .into_tuple()
                    .all(db)
                    .await
            })
            .await?;

        for (campaign_id, emoji, total) in rows {
            out.entry(campaign_id).or_default().insert(emoji, total);
        }
        Ok(out)
    }
}
