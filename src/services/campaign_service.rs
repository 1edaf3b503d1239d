//! Campaign service
//!
//! Listing, detail views and campaign writes. Shared by the public API,
//! the admin API and the import pipeline.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use ts_rs::TS;

use super::double_option;
use crate::config::{MarketplaceConfig, TS_EXPORT_PATH, get_config};
use crate::errors::CreditHubError;
use crate::storage::{
    Campaign, CampaignCounters, CampaignFilter, CampaignPatch, CampaignSort, CampaignStatus,
    ConditionTag, Difficulty, InteractionState, NewCampaign, Platform, PlatformStatus,
    SeaOrmStorage, Tag, Translation, TranslationInput,
};
use crate::utils::url_validator::validate_url;
use crate::utils::{TimeParser, is_valid_slug, random_suffix, slugify};

const MAX_TITLE_LEN: usize = 200;
const MAX_FREE_CREDIT_LEN: usize = 120;
const SLUG_ATTEMPTS: usize = 5;

// ============ Request / Query DTOs ============

/// Query string of campaign listings
///
/// `status` and `include_deleted` are honoured only for admin listings.
#[derive(Debug, Clone, Default, Deserialize, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
pub struct CampaignQuery {
    pub page: Option<u64>,
    pub page_size: Option<u64>,
    pub locale: Option<String>,
    /// Platform slug
    pub platform: Option<String>,
    /// Comma separated tag slugs; every tag must match
    pub tags: Option<String>,
    /// Comma separated condition tag slugs
    pub conditions: Option<String>,
    pub difficulty: Option<Difficulty>,
    pub q: Option<String>,
    pub sort: Option<CampaignSort>,
    pub featured: Option<bool>,
    pub include_expired: Option<bool>,
    pub status: Option<String>,
    pub include_deleted: Option<bool>,
}

/// Who is asking for the listing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListScope {
    Public,
    Admin,
}

/// Split a comma separated query parameter
pub fn split_param(value: Option<&str>) -> Vec<String> {
    value
        .unwrap_or_default()
        .split(',')
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}

impl CampaignQuery {
    /// Translate the query into a storage filter
    pub fn to_filter(&self, scope: ListScope) -> Result<CampaignFilter, CreditHubError> {
        let mut filter = match scope {
            ListScope::Public => CampaignFilter::public(),
            ListScope::Admin => CampaignFilter::admin(),
        };

        if scope == ListScope::Admin {
            filter.statuses = split_param(self.status.as_deref())
                .iter()
                .map(|s| {
                    s.parse::<CampaignStatus>().map_err(|_| {
                        CreditHubError::validation(format!("Unknown campaign status '{}'", s))
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;
            filter.include_deleted = self.include_deleted.unwrap_or(false);
        }

        filter.platform_slug = self
            .platform
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase);
        filter.tag_slugs = split_param(self.tags.as_deref());
        filter.condition_tag_slugs = split_param(self.conditions.as_deref());
        filter.difficulty = self.difficulty;
        filter.search = self
            .q
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);
        filter.featured_only = self.featured.unwrap_or(false);
        match self.include_expired {
            Some(true) => filter = filter.with_expired(),
            Some(false) => filter.include_expired = false,
            None => {}
        }
        filter.sort = self.sort.unwrap_or_default();
        Ok(filter)
    }
}

/// Create a campaign (user submission or admin)
#[derive(Debug, Clone, Deserialize, Serialize, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
pub struct CreateCampaignRequest {
    pub platform_id: Option<i64>,
    pub platform_slug: Option<String>,
    pub slug: Option<String>,
    pub free_credit: String,
    pub credit_value_cents: Option<i64>,
    /// RFC3339 or YYYY-MM-DD
    pub start_at: Option<String>,
    pub end_at: Option<String>,
    pub official_link: String,
    #[serde(default)]
    pub ai_models: Vec<String>,
    pub translations: Vec<TranslationInput>,
    /// Tag slugs
    #[serde(default)]
    pub tags: Vec<String>,
    /// Condition tag slugs
    #[serde(default)]
    pub conditions: Vec<String>,
}

/// Partial update; missing fields are left untouched, `null` clears
/// nullable ones
#[derive(Debug, Clone, Default, Deserialize, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
pub struct UpdateCampaignRequest {
    pub platform_id: Option<i64>,
    pub slug: Option<String>,
    pub free_credit: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    #[ts(optional)]
    pub credit_value_cents: Option<Option<i64>>,
    #[serde(default, deserialize_with = "double_option")]
    #[ts(optional)]
    pub start_at: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    #[ts(optional)]
    pub end_at: Option<Option<String>>,
    pub official_link: Option<String>,
    pub ai_models: Option<Vec<String>>,
    pub translations: Option<Vec<TranslationInput>>,
    pub tags: Option<Vec<String>>,
    pub conditions: Option<Vec<String>>,
}

// ============ Response DTOs ============

#[derive(Debug, Clone, Serialize, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
pub struct PlatformBrief {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub logo_url: Option<String>,
}

impl From<&Platform> for PlatformBrief {
    fn from(p: &Platform) -> Self {
        Self {
            id: p.id,
            name: p.name.clone(),
            slug: p.slug.clone(),
            logo_url: p.logo_url.clone(),
        }
    }
}

/// Card shown in listings
#[derive(Debug, Clone, Serialize, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
pub struct CampaignSummary {
    pub id: i64,
    pub slug: String,
    pub status: CampaignStatus,
    pub platform: Option<PlatformBrief>,
    /// Locale actually used for title/description
    pub locale: Option<String>,
    pub title: String,
    pub description: String,
    pub free_credit: String,
    pub credit_value_cents: Option<i64>,
    pub start_at: Option<DateTime<Utc>>,
    pub end_at: Option<DateTime<Utc>>,
    pub official_link: String,
    pub ai_models: Vec<String>,
    pub difficulty: Difficulty,
    pub is_featured: bool,
    pub featured_until: Option<DateTime<Utc>>,
    pub counters: CampaignCounters,
    pub emoji_counts: BTreeMap<String, i64>,
    pub tags: Vec<Tag>,
    pub is_expired: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Present when the request carried a user
    pub viewer: Option<InteractionState>,
}

/// Full campaign page
#[derive(Debug, Clone, Serialize, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
pub struct CampaignDetail {
    #[serde(flatten)]
    pub summary: CampaignSummary,
    pub translations: Vec<Translation>,
    pub condition_tags: Vec<ConditionTag>,
    pub submitted_by: Option<String>,
    pub reviewed_by: Option<String>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub reject_reason: Option<String>,
    pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, Serialize, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
pub struct PageInfo {
    pub page: u64,
    pub page_size: u64,
    pub total: u64,
    pub total_pages: u64,
}

impl PageInfo {
    pub fn new(page: u64, page_size: u64, total: u64) -> Self {
        let page_size = page_size.max(1);
        Self {
            page: page.max(1),
            page_size,
            total,
            total_pages: total.div_ceil(page_size),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub pagination: PageInfo,
}

/// Pick the translation for `requested`, falling back to `default_locale`
/// and then to the first available one
pub fn resolve_translation<'a>(
    translations: &'a [Translation],
    requested: &str,
    default_locale: &str,
) -> Option<&'a Translation> {
    translations
        .iter()
        .find(|t| t.locale == requested)
        .or_else(|| translations.iter().find(|t| t.locale == default_locale))
        .or_else(|| translations.first())
}

// ============ CampaignService Implementation ============

/// Campaign reads and writes
pub struct CampaignService {
    storage: Arc<SeaOrmStorage>,
}

/// Normalised, validated write payload
struct ValidatedFields {
    start_at: Option<DateTime<Utc>>,
    end_at: Option<DateTime<Utc>>,
    official_link: String,
    ai_models: Vec<String>,
}

impl CampaignService {
    pub fn new(storage: Arc<SeaOrmStorage>) -> Self {
        Self { storage }
    }

    fn marketplace(&self) -> MarketplaceConfig {
        get_config().marketplace.clone()
    }

    fn effective_locale(&self, requested: Option<&str>) -> String {
        let config = self.marketplace();
        match requested.map(str::trim).filter(|l| !l.is_empty()) {
            Some(locale) if config.is_supported_locale(locale) => locale.to_string(),
            _ => config.default_locale,
        }
    }

    // ============ Reads ============

    /// List campaigns for the given scope; viewer state is attached when
    /// `viewer` is present
    pub async fn list(
        &self,
        query: &CampaignQuery,
        scope: ListScope,
        viewer: Option<&str>,
    ) -> Result<Paginated<CampaignSummary>, CreditHubError> {
        let filter = query.to_filter(scope)?;
        self.list_with_filter(&filter, query, viewer).await
    }

    /// Public listing
    pub async fn list_public(
        &self,
        query: &CampaignQuery,
        viewer: Option<&str>,
    ) -> Result<Paginated<CampaignSummary>, CreditHubError> {
        self.list(query, ListScope::Public, viewer).await
    }

    /// A user's bookmarked campaigns
    pub async fn list_bookmarked(
        &self,
        user_id: &str,
        query: &CampaignQuery,
    ) -> Result<Paginated<CampaignSummary>, CreditHubError> {
        let mut filter = query.to_filter(ListScope::Public)?.with_expired();
        filter.bookmarked_by = Some(user_id.to_string());
        self.list_with_filter(&filter, query, Some(user_id)).await
    }

    /// Campaigns a user has submitted, any status
    pub async fn list_submitted(
        &self,
        user_id: &str,
        query: &CampaignQuery,
    ) -> Result<Paginated<CampaignSummary>, CreditHubError> {
        let mut filter = query.to_filter(ListScope::Admin)?;
        filter.include_deleted = false;
        filter.submitted_by = Some(user_id.to_string());
        self.list_with_filter(&filter, query, Some(user_id)).await
    }

    /// Currently featured campaigns, most valuable first
    pub async fn list_featured(
        &self,
        locale: Option<&str>,
        viewer: Option<&str>,
    ) -> Result<Vec<CampaignSummary>, CreditHubError> {
        let filter = CampaignFilter {
            featured_only: true,
            sort: CampaignSort::HighestCredit,
            ..CampaignFilter::public()
        };
        let query = CampaignQuery {
            locale: locale.map(str::to_string),
            page_size: Some(self.marketplace().default_page_size),
            ..Default::default()
        };
        Ok(self.list_with_filter(&filter, &query, viewer).await?.items)
    }

    async fn list_with_filter(
        &self,
        filter: &CampaignFilter,
        query: &CampaignQuery,
        viewer: Option<&str>,
    ) -> Result<Paginated<CampaignSummary>, CreditHubError> {
        let config = self.marketplace();
        let page = query.page.unwrap_or(1).max(1);
        let page_size = config.clamp_page_size(query.page_size);
        let locale = self.effective_locale(query.locale.as_deref());

        let result = self.storage.list_campaigns(filter, page, page_size).await?;
        debug!(
            "CampaignService: listed {} of {} campaigns (page {})",
            result.items.len(),
            result.total,
            page
        );

        let items = self.summarize(result.items, &locale, viewer).await?;
        Ok(Paginated {
            items,
            pagination: PageInfo::new(page, page_size, result.total),
        })
    }

    /// Build listing cards; related rows are fetched in one batch per kind
    async fn summarize(
        &self,
        campaigns: Vec<Campaign>,
        locale: &str,
        viewer: Option<&str>,
    ) -> Result<Vec<CampaignSummary>, CreditHubError> {
        if campaigns.is_empty() {
            return Ok(Vec::new());
        }

        let default_locale = self.marketplace().default_locale;
        let ids: Vec<i64> = campaigns.iter().map(|c| c.id).collect();
        let platform_ids: Vec<i64> = campaigns.iter().map(|c| c.platform_id).collect();

        let states = async {
            match viewer {
                Some(user) => self.storage.interaction_states(user, &ids).await.map(Some),
                None => Ok(None),
            }
        };
        let (mut translations, mut tags, platforms, mut emojis, mut states) = tokio::try_join!(
            self.storage.translations_for(&ids),
            self.storage.tags_for(&ids),
            self.storage.platforms_for(&platform_ids),
            self.storage.emoji_counts(&ids),
            states,
        )?;

        let now = Utc::now();
        Ok(campaigns
            .into_iter()
            .map(|c| {
                let campaign_translations = translations.remove(&c.id).unwrap_or_default();
                let chosen = resolve_translation(&campaign_translations, locale, &default_locale);
                let viewer_state = states
                    .as_mut()
                    .map(|m| m.remove(&c.id).unwrap_or_default());
                CampaignSummary {
                    id: c.id,
                    slug: c.slug.clone(),
                    status: c.status,
                    platform: platforms.get(&c.platform_id).map(PlatformBrief::from),
                    locale: chosen.map(|t| t.locale.clone()),
                    title: chosen.map(|t| t.title.clone()).unwrap_or_default(),
                    description: chosen.map(|t| t.description.clone()).unwrap_or_default(),
                    free_credit: c.free_credit.clone(),
                    credit_value_cents: c.credit_value_cents,
                    start_at: c.start_at,
                    end_at: c.end_at,
                    official_link: c.official_link.clone(),
                    ai_models: c.ai_models.clone(),
                    difficulty: c.difficulty,
                    is_featured: c.is_featured_at(now),
                    featured_until: c.featured_until,
                    counters: c.counters,
                    emoji_counts: emojis.remove(&c.id).unwrap_or_default(),
                    tags: tags.remove(&c.id).unwrap_or_default(),
                    is_expired: c.is_expired_at(now),
                    created_at: c.created_at,
                    updated_at: c.updated_at,
                    viewer: viewer_state,
                }
            })
            .collect())
    }

    async fn detail(
        &self,
        campaign: Campaign,
        locale: &str,
        viewer: Option<&str>,
    ) -> Result<CampaignDetail, CreditHubError> {
        let ids = [campaign.id];
        let (mut translations, mut condition_tags) = tokio::try_join!(
            self.storage.translations_for(&ids),
            self.storage.condition_tags_for(&ids),
        )?;

        let submitted_by = campaign.submitted_by.clone();
        let reviewed_by = campaign.reviewed_by.clone();
        let reviewed_at = campaign.reviewed_at;
        let reject_reason = campaign.reject_reason.clone();
        let deleted_at = campaign.deleted_at;
        let id = campaign.id;

        let summary = self
            .summarize(vec![campaign], locale, viewer)
            .await?
            .pop()
            .ok_or_else(|| CreditHubError::not_found(format!("campaign {}", id)))?;

        Ok(CampaignDetail {
            summary,
            translations: translations.remove(&id).unwrap_or_default(),
            condition_tags: condition_tags.remove(&id).unwrap_or_default(),
            submitted_by,
            reviewed_by,
            reviewed_at,
            reject_reason,
            deleted_at,
        })
    }

    /// Public detail by slug; only published campaigns are visible
    pub async fn get_public(
        &self,
        slug: &str,
        locale: Option<&str>,
        viewer: Option<&str>,
    ) -> Result<CampaignDetail, CreditHubError> {
        let campaign = self
            .storage
            .get_campaign_by_slug(slug)
            .await?
            .filter(|c| c.status == CampaignStatus::Published || c.status == CampaignStatus::Expired)
            .ok_or_else(|| CreditHubError::not_found(format!("Campaign '{}' not found", slug)))?;

        let locale = self.effective_locale(locale);
        self.detail(campaign, &locale, viewer).await
    }

    /// Admin detail by id, including deleted campaigns
    pub async fn get_admin(
        &self,
        id: i64,
        locale: Option<&str>,
    ) -> Result<CampaignDetail, CreditHubError> {
        let campaign = self.require_campaign(id, true).await?;
        let locale = self.effective_locale(locale);
        self.detail(campaign, &locale, None).await
    }

    /// Load a campaign or fail with NotFound
    pub async fn require_campaign(
        &self,
        id: i64,
        include_deleted: bool,
    ) -> Result<Campaign, CreditHubError> {
        self.storage
            .get_campaign(id)
            .await?
            .filter(|c| include_deleted || !c.is_deleted())
            .ok_or_else(|| CreditHubError::not_found(format!("Campaign {} not found", id)))
    }

    /// Load a campaign users may interact with (published, not deleted)
    pub async fn require_public_campaign(&self, id: i64) -> Result<Campaign, CreditHubError> {
        self.storage
            .get_live_campaign(id)
            .await?
            .filter(|c| c.status == CampaignStatus::Published || c.status == CampaignStatus::Expired)
            .ok_or_else(|| CreditHubError::not_found(format!("Campaign {} not found", id)))
    }

    // ============ Validation ============

    fn validate_translations(
        config: &MarketplaceConfig,
        translations: &[TranslationInput],
    ) -> Result<Vec<TranslationInput>, CreditHubError> {
        if translations.is_empty() {
            return Err(CreditHubError::validation(
                "At least one translation is required",
            ));
        }

        let mut seen = HashSet::new();
        let mut out = Vec::with_capacity(translations.len());
        for t in translations {
            let locale = t.locale.trim().to_lowercase();
            if !config.is_supported_locale(&locale) {
                return Err(CreditHubError::validation(format!(
                    "Unsupported locale '{}'. Supported: {}",
                    t.locale,
                    config.supported_locales.join(", ")
                )));
            }
            if !seen.insert(locale.clone()) {
                return Err(CreditHubError::validation(format!(
                    "Duplicate translation for locale '{}'",
                    locale
                )));
            }
            let title = t.title.trim();
            if title.is_empty() {
                return Err(CreditHubError::validation(format!(
                    "Title for locale '{}' is empty",
                    locale
                )));
            }
            if title.chars().count() > MAX_TITLE_LEN {
                return Err(CreditHubError::validation(format!(
                    "Title for locale '{}' exceeds {} characters",
                    locale, MAX_TITLE_LEN
                )));
            }
            out.push(TranslationInput {
                locale,
                title: title.to_string(),
                description: t.description.trim().to_string(),
                is_ai_generated: t.is_ai_generated,
            });
        }
        Ok(out)
    }

    fn validate_free_credit(value: &str) -> Result<String, CreditHubError> {
        let value = value.trim();
        if value.is_empty() {
            return Err(CreditHubError::validation("free_credit is required"));
        }
        if value.chars().count() > MAX_FREE_CREDIT_LEN {
            return Err(CreditHubError::validation(format!(
                "free_credit exceeds {} characters",
                MAX_FREE_CREDIT_LEN
            )));
        }
        Ok(value.to_string())
    }

    fn validate_credit_value(value: Option<i64>) -> Result<Option<i64>, CreditHubError> {
        match value {
            Some(v) if v < 0 => Err(CreditHubError::validation(
                "credit_value_cents must not be negative",
            )),
            other => Ok(other),
        }
    }

    fn parse_date(field: &str, value: Option<&str>) -> Result<Option<DateTime<Utc>>, CreditHubError> {
        match value.map(str::trim).filter(|s| !s.is_empty()) {
            Some(raw) => TimeParser::parse_datetime(raw)
                .map(Some)
                .map_err(|e| CreditHubError::date_parse(format!("{}: {}", field, e))),
            None => Ok(None),
        }
    }

    fn check_window(
        start_at: Option<DateTime<Utc>>,
        end_at: Option<DateTime<Utc>>,
    ) -> Result<(), CreditHubError> {
        if let (Some(start), Some(end)) = (start_at, end_at)
            && start > end
        {
            return Err(CreditHubError::validation(
                "start_at must not be later than end_at",
            ));
        }
        Ok(())
    }

    fn normalize_models(models: &[String]) -> Vec<String> {
        let mut seen = HashSet::new();
        models
            .iter()
            .map(|m| m.trim().to_string())
            .filter(|m| !m.is_empty() && seen.insert(m.to_lowercase()))
            .collect()
    }

    fn validate_fields(
        start_at: Option<&str>,
        end_at: Option<&str>,
        official_link: &str,
        ai_models: &[String],
    ) -> Result<ValidatedFields, CreditHubError> {
        let start_at = Self::parse_date("start_at", start_at)?;
        let end_at = Self::parse_date("end_at", end_at)?;
        Self::check_window(start_at, end_at)?;
        let official_link = validate_url(official_link)
            .map_err(|e| CreditHubError::validation(format!("official_link: {}", e)))?;
        Ok(ValidatedFields {
            start_at,
            end_at,
            official_link,
            ai_models: Self::normalize_models(ai_models),
        })
    }

    /// Resolve the target platform by id or slug; it must be active
    async fn resolve_platform(
        &self,
        platform_id: Option<i64>,
        platform_slug: Option<&str>,
    ) -> Result<Platform, CreditHubError> {
        let platform = match (platform_id, platform_slug) {
            (Some(id), _) => self.storage.get_platform(id).await?,
            (None, Some(slug)) => {
                self.storage
                    .get_platform_by_slug(&slug.trim().to_lowercase())
                    .await?
            }
            (None, None) => {
                return Err(CreditHubError::validation(
                    "platform_id or platform_slug is required",
                ));
            }
        }
        .ok_or_else(|| CreditHubError::not_found("Platform not found"))?;

        if platform.status != PlatformStatus::Active {
            return Err(CreditHubError::validation(format!(
                "Platform '{}' is inactive",
                platform.slug
            )));
        }
        Ok(platform)
    }

    /// Map tag slugs to ids; unknown slugs are rejected
    async fn resolve_tag_ids(&self, slugs: &[String]) -> Result<Vec<i64>, CreditHubError> {
        let wanted: Vec<String> = slugs.iter().map(|s| s.trim().to_lowercase()).collect();
        let found: HashMap<String, i64> = self
            .storage
            .find_tags_by_slugs(&wanted)
            .await?
            .into_iter()
            .map(|t| (t.slug, t.id))
            .collect();
        wanted
            .iter()
            .map(|slug| {
                found
                    .get(slug)
                    .copied()
                    .ok_or_else(|| CreditHubError::validation(format!("Unknown tag '{}'", slug)))
            })
            .collect()
    }

    async fn resolve_condition_ids(&self, slugs: &[String]) -> Result<Vec<i64>, CreditHubError> {
        let wanted: Vec<String> = slugs.iter().map(|s| s.trim().to_lowercase()).collect();
        let found: HashMap<String, i64> = self
            .storage
            .find_condition_tags_by_slugs(&wanted)
            .await?
            .into_iter()
            .map(|t| (t.slug, t.id))
            .collect();
        wanted
            .iter()
            .map(|slug| {
                found.get(slug).copied().ok_or_else(|| {
                    CreditHubError::validation(format!("Unknown condition tag '{}'", slug))
                })
            })
            .collect()
    }

    /// Validate an explicit slug, or derive one from platform and title
    async fn choose_slug(
        &self,
        requested: Option<&str>,
        platform: &Platform,
        title: &str,
        exclude_id: Option<i64>,
    ) -> Result<String, CreditHubError> {
        if let Some(raw) = requested.map(str::trim).filter(|s| !s.is_empty()) {
            let slug = raw.to_lowercase();
            if !is_valid_slug(&slug) {
                return Err(CreditHubError::validation(format!(
                    "Invalid slug '{}'. Use 3-120 lowercase letters, digits and single hyphens",
                    raw
                )));
            }
            if self.storage.slug_taken(&slug, exclude_id).await? {
                return Err(CreditHubError::conflict(format!(
                    "Slug '{}' is already in use",
                    slug
                )));
            }
            return Ok(slug);
        }

        let mut base = slugify(&format!("{} {}", platform.slug, title));
        if base.len() < crate::utils::slug::MIN_SLUG_LEN {
            base = format!("{}-campaign", platform.slug);
        }
        base.truncate(crate::utils::slug::MAX_SLUG_LEN - 7);
        let base = base.trim_end_matches('-').to_string();

        if !self.storage.slug_taken(&base, exclude_id).await? {
            return Ok(base);
        }
        for _ in 0..SLUG_ATTEMPTS {
            let candidate = format!("{}-{}", base, random_suffix(6));
            if !self.storage.slug_taken(&candidate, exclude_id).await? {
                return Ok(candidate);
            }
        }
        Err(CreditHubError::conflict(format!(
            "Could not find a free slug based on '{}'",
            base
        )))
    }

    // ============ Writes ============

    async fn create(
        &self,
        req: CreateCampaignRequest,
        status: CampaignStatus,
        submitted_by: Option<&str>,
        reviewed_by: Option<&str>,
    ) -> Result<CampaignDetail, CreditHubError> {
        let config = self.marketplace();
        let translations = Self::validate_translations(&config, &req.translations)?;
        let free_credit = Self::validate_free_credit(&req.free_credit)?;
        let credit_value_cents = Self::validate_credit_value(req.credit_value_cents)?;
        let fields = Self::validate_fields(
            req.start_at.as_deref(),
            req.end_at.as_deref(),
            &req.official_link,
            &req.ai_models,
        )?;

        let platform = self
            .resolve_platform(req.platform_id, req.platform_slug.as_deref())
            .await?;
        let tag_ids = self.resolve_tag_ids(&req.tags).await?;
        let condition_tag_ids = self.resolve_condition_ids(&req.conditions).await?;

        let title = resolve_translation_input(&translations, &config.default_locale)
            .map(|t| t.title.clone())
            .unwrap_or_default();
        let slug = self
            .choose_slug(req.slug.as_deref(), &platform, &title, None)
            .await?;

        let campaign = self
            .storage
            .insert_campaign(NewCampaign {
                platform_id: platform.id,
                slug,
                status,
                free_credit,
                credit_value_cents,
                start_at: fields.start_at,
                end_at: fields.end_at,
                official_link: fields.official_link,
                ai_models: fields.ai_models,
                submitted_by: submitted_by.map(str::to_string),
                reviewed_by: reviewed_by.map(str::to_string),
                translations,
                tag_ids,
                condition_tag_ids,
            })
            .await?;

        info!(
            "CampaignService: created '{}' on platform '{}' as {}",
            campaign.slug, platform.slug, campaign.status
        );
        let locale = config.default_locale.clone();
        self.detail(campaign, &locale, None).await
    }

    /// User submission; always lands in `pending`
    pub async fn submit(
        &self,
        user_id: &str,
        req: CreateCampaignRequest,
    ) -> Result<CampaignDetail, CreditHubError> {
        self.create(req, CampaignStatus::Pending, Some(user_id), None)
            .await
    }

    /// Admin creation; published immediately when `publish` is set
    pub async fn create_as_admin(
        &self,
        admin_id: &str,
        req: CreateCampaignRequest,
        publish: bool,
    ) -> Result<CampaignDetail, CreditHubError> {
        let status = if publish {
            CampaignStatus::Published
        } else {
            CampaignStatus::Pending
        };
        self.create(req, status, Some(admin_id), Some(admin_id))
            .await
    }

    /// Bulk import with an explicit initial status
    pub async fn create_imported(
        &self,
        req: CreateCampaignRequest,
        status: CampaignStatus,
    ) -> Result<CampaignDetail, CreditHubError> {
        self.create(req, status, None, None).await
    }

    /// Partial update of a non-deleted campaign
    pub async fn update(
        &self,
        id: i64,
        req: UpdateCampaignRequest,
    ) -> Result<CampaignDetail, CreditHubError> {
        let config = self.marketplace();
        let existing = self.require_campaign(id, false).await?;

        let platform = match req.platform_id {
            Some(pid) if pid != existing.platform_id => {
                Some(self.resolve_platform(Some(pid), None).await?)
            }
            _ => None,
        };

        let slug = match req.slug.as_deref() {
            Some(raw) if raw.trim() != existing.slug => {
                let slug = raw.trim().to_lowercase();
                if !is_valid_slug(&slug) {
                    return Err(CreditHubError::validation(format!(
                        "Invalid slug '{}'",
                        raw
                    )));
                }
                if self.storage.slug_taken(&slug, Some(id)).await? {
                    return Err(CreditHubError::conflict(format!(
                        "Slug '{}' is already in use",
                        slug
                    )));
                }
                Some(slug)
            }
            _ => None,
        };

        let start_at = match &req.start_at {
            Some(value) => Some(Self::parse_date("start_at", value.as_deref())?),
            None => None,
        };
        let end_at = match &req.end_at {
            Some(value) => Some(Self::parse_date("end_at", value.as_deref())?),
            None => None,
        };
        Self::check_window(
            start_at.unwrap_or(existing.start_at),
            end_at.unwrap_or(existing.end_at),
        )?;

        let official_link = match req.official_link.as_deref() {
            Some(link) => Some(
                validate_url(link)
                    .map_err(|e| CreditHubError::validation(format!("official_link: {}", e)))?,
            ),
            None => None,
        };
        let free_credit = match req.free_credit.as_deref() {
            Some(value) => Some(Self::validate_free_credit(value)?),
            None => None,
        };
        let credit_value_cents = match req.credit_value_cents {
            Some(value) => Some(Self::validate_credit_value(value)?),
            None => None,
        };
        let translations = match req.translations.as_deref() {
            Some(list) => Some(Self::validate_translations(&config, list)?),
            None => None,
        };
        let tag_ids = match req.tags.as_deref() {
            Some(slugs) => Some(self.resolve_tag_ids(slugs).await?),
            None => None,
        };
        let condition_tag_ids = match req.conditions.as_deref() {
            Some(slugs) => Some(self.resolve_condition_ids(slugs).await?),
            None => None,
        };

        let patch = CampaignPatch {
            platform_id: platform.map(|p| p.id),
            slug,
            free_credit,
            credit_value_cents,
            start_at,
            end_at,
            official_link,
            ai_models: req.ai_models.as_deref().map(Self::normalize_models),
            translations,
            tag_ids,
            condition_tag_ids,
        };

        let campaign = self.storage.update_campaign(id, patch).await?;
        info!("CampaignService: updated campaign {}", id);
        let locale = config.default_locale.clone();
        self.detail(campaign, &locale, None).await
    }

    /// Insert or replace one locale's text
    pub async fn upsert_translation(
        &self,
        id: i64,
        locale: &str,
        title: &str,
        description: &str,
        is_ai_generated: bool,
    ) -> Result<Translation, CreditHubError> {
        self.require_campaign(id, false).await?;
        let config = self.marketplace();
        let mut validated = Self::validate_translations(
            &config,
            &[TranslationInput {
                locale: locale.to_string(),
                title: title.to_string(),
                description: description.to_string(),
                is_ai_generated,
            }],
        )?;
        let input = validated.remove(0);
        Ok(self.storage.upsert_translation(id, input).await?)
    }

    /// Soft delete; the slug becomes reusable
    pub async fn delete(&self, id: i64) -> Result<(), CreditHubError> {
        if !self.storage.soft_delete_campaign(id).await? {
            return Err(CreditHubError::not_found(format!(
                "Campaign {} not found",
                id
            )));
        }
        info!("CampaignService: deleted campaign {}", id);
        Ok(())
    }
}

fn resolve_translation_input<'a>(
    translations: &'a [TranslationInput],
    default_locale: &str,
) -> Option<&'a TranslationInput> {
    translations
        .iter()
        .find(|t| t.locale == default_locale)
        .or_else(|| translations.first())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn translation(locale: &str, title: &str) -> Translation {
        Translation {
            locale: locale.to_string(),
            title: title.to_string(),
            description: String::new(),
            is_ai_generated: false,
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_resolve_translation_fallbacks() {
        let list = vec![translation("ja", "日本語"), translation("en", "English")];
        assert_eq!(resolve_translation(&list, "ja", "en").unwrap().title, "日本語");
        assert_eq!(resolve_translation(&list, "zh", "en").unwrap().title, "English");
        let only_ja = vec![translation("ja", "日本語")];
        assert_eq!(resolve_translation(&only_ja, "zh", "en").unwrap().locale, "ja");
        assert!(resolve_translation(&[], "en", "en").is_none());
    }

    #[test]
    fn test_split_param() {
        assert_eq!(split_param(Some("LLM, image,,")), vec!["llm", "image"]);
        assert!(split_param(None).is_empty());
    }

    #[test]
    fn test_public_query_ignores_admin_fields() {
        let query = CampaignQuery {
            status: Some("pending".into()),
            include_deleted: Some(true),
            tags: Some("llm".into()),
            q: Some("  ".into()),
            ..Default::default()
        };
        let filter = query.to_filter(ListScope::Public).unwrap();
        assert_eq!(filter.statuses, vec![CampaignStatus::Published]);
        assert!(!filter.include_deleted);
        assert_eq!(filter.tag_slugs, vec!["llm"]);
        assert_eq!(filter.search, None);
    }

    #[test]
    fn test_public_include_expired_admits_swept_campaigns() {
        let query = CampaignQuery {
            include_expired: Some(true),
            ..Default::default()
        };
        let filter = query.to_filter(ListScope::Public).unwrap();
        assert!(filter.include_expired);
        assert_eq!(
            filter.statuses,
            vec![CampaignStatus::Published, CampaignStatus::Expired]
        );
    }

    #[test]
    fn test_admin_query_parses_statuses() {
        let query = CampaignQuery {
            status: Some("pending,rejected".into()),
            include_deleted: Some(true),
            ..Default::default()
        };
        let filter = query.to_filter(ListScope::Admin).unwrap();
        assert_eq!(
            filter.statuses,
            vec![CampaignStatus::Pending, CampaignStatus::Rejected]
        );
        assert!(filter.include_deleted);
        assert!(filter.include_expired);

        let bad = CampaignQuery {
            status: Some("archived".into()),
            ..Default::default()
        };
        assert!(matches!(
            bad.to_filter(ListScope::Admin),
            Err(CreditHubError::Validation(_))
        ));
    }

    #[test]
    fn test_validate_translations() {
        let config = MarketplaceConfig::default();
        let ok = CampaignService::validate_translations(
            &config,
            &[TranslationInput {
                locale: "EN".into(),
                title: "  $5 credit ".into(),
                description: String::new(),
                is_ai_generated: false,
            }],
        )
        .unwrap();
        assert_eq!(ok[0].locale, "en");
        assert_eq!(ok[0].title, "$5 credit");

        assert!(CampaignService::validate_translations(&config, &[]).is_err());

        let unsupported = TranslationInput {
            locale: "xx".into(),
            title: "t".into(),
            description: String::new(),
            is_ai_generated: false,
        };
        assert!(CampaignService::validate_translations(&config, &[unsupported]).is_err());

        let dup = TranslationInput {
            locale: "en".into(),
            title: "t".into(),
            description: String::new(),
            is_ai_generated: false,
        };
        assert!(CampaignService::validate_translations(&config, &[dup.clone(), dup]).is_err());
    }

    #[test]
    fn test_validate_fields_window_and_link() {
        assert!(
            CampaignService::validate_fields(
                Some("2026-02-01"),
                Some("2026-01-01"),
                "https://x.ai",
                &[]
            )
            .is_err()
        );
        assert!(
            CampaignService::validate_fields(None, None, "ftp://x.ai", &[]).is_err()
        );
        let ok = CampaignService::validate_fields(
            Some("2026-01-01"),
            None,
            "https://x.ai/promo",
            &["gpt-4o".into(), "GPT-4o".into(), " ".into()],
        )
        .unwrap();
        assert_eq!(ok.ai_models, vec!["gpt-4o"]);
        assert!(ok.start_at.is_some());
    }

    #[test]
    fn test_update_request_distinguishes_null() {
        let req: UpdateCampaignRequest =
            serde_json::from_str(r#"{"end_at": null, "free_credit": "$10"}"#).unwrap();
        assert_eq!(req.end_at, Some(None));
        assert_eq!(req.start_at, None);
        assert_eq!(req.free_credit.as_deref(), Some("$10"));
    }

    #[test]
    fn test_page_info() {
        let info = PageInfo::new(0, 20, 41);
        assert_eq!(info.page, 1);
        assert_eq!(info.total_pages, 3);
        assert_eq!(PageInfo::new(1, 20, 0).total_pages, 0);
    }
}
