//! Bulk import of platforms, tags and campaigns
//!
//! Sources are a JSON [`ImportBundle`] (admin API, CLI) or CSV files (CLI).
//! Items are matched by slug; what happens to an existing slug is decided
//! by [`ImportMode`].

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use tracing::{info, warn};
use ts_rs::TS;

use super::campaign_service::{CampaignService, CreateCampaignRequest, UpdateCampaignRequest};
use super::platform_service::{CreatePlatformRequest, PlatformService};
use super::tag_service::{CreateConditionTagRequest, CreateTagRequest, TagService};
use crate::config::TS_EXPORT_PATH;
use crate::errors::CreditHubError;
use crate::storage::{
    CampaignStatus, ConditionKind, ConditionTagPatch, PlatformPatch, PlatformStatus,
    SeaOrmStorage, TagKind, TagPatch, TranslationInput,
};
use crate::utils::csv_handler::{
    CampaignCsvRow, PlatformCsvRow, TagCsvRow, read_rows_from_file, split_multi,
};

// ============ Import DTOs ============

/// What to do when an imported slug already exists
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    TS,
    EnumString,
    AsRefStr,
    Display,
)]
#[ts(export, export_to = TS_EXPORT_PATH)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum ImportMode {
    /// Keep the existing row
    #[default]
    Skip,
    /// Update the existing row with the imported values
    Overwrite,
    /// Report the existing slug as a failure
    Error,
}

/// Which section of a source to import
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, AsRefStr, Display)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum ImportKind {
    Platforms,
    Campaigns,
    /// Tags and condition tags
    Tags,
}

/// Campaign entry of a bundle; platform is referenced by slug
#[derive(Debug, Clone, Deserialize, Serialize, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
pub struct ImportCampaign {
    #[serde(flatten)]
    pub campaign: CreateCampaignRequest,
    /// Initial status for new campaigns (default `published`)
    pub status: Option<CampaignStatus>,
}

#[derive(Debug, Clone, Default, Deserialize, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
pub struct ImportBundle {
    #[serde(default)]
    pub platforms: Vec<CreatePlatformRequest>,
    #[serde(default)]
    pub tags: Vec<CreateTagRequest>,
    #[serde(default)]
    pub condition_tags: Vec<CreateConditionTagRequest>,
    #[serde(default)]
    pub campaigns: Vec<ImportCampaign>,
}

impl ImportBundle {
    pub fn len(&self) -> usize {
        self.platforms.len() + self.tags.len() + self.condition_tags.len() + self.campaigns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Keep only the section(s) of `kind`
    pub fn retain_kind(mut self, kind: ImportKind) -> Self {
        if kind != ImportKind::Platforms {
            self.platforms.clear();
        }
        if kind != ImportKind::Tags {
            self.tags.clear();
            self.condition_tags.clear();
        }
        if kind != ImportKind::Campaigns {
            self.campaigns.clear();
        }
        self
    }
}

/// Admin API payload
#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
pub struct ImportRequest {
    #[serde(default)]
    pub mode: ImportMode,
    #[serde(flatten)]
    pub bundle: ImportBundle,
}

#[derive(Debug, Clone, Default, Serialize, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
pub struct ImportReport {
    pub success: usize,
    pub skipped: usize,
    pub failed: usize,
    pub errors: Vec<ImportError>,
}

#[derive(Debug, Clone, Serialize, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
pub struct ImportError {
    /// Slug, or a row reference when no slug is known
    pub item: String,
    pub message: String,
}

impl ImportReport {
    fn fail(&mut self, item: impl Into<String>, message: impl Into<String>) {
        self.failed += 1;
        self.errors.push(ImportError {
            item: item.into(),
            message: message.into(),
        });
    }

    fn merge(&mut self, other: ImportReport) {
        self.success += other.success;
        self.skipped += other.skipped;
        self.failed += other.failed;
        self.errors.extend(other.errors);
    }
}

/// Outcome of the existence check for one item
enum Existing<T> {
    Create,
    Update(T),
    Skip,
}

fn decide<T>(mode: ImportMode, existing: Option<T>, item: &str, report: &mut ImportReport) -> Existing<T> {
    match (existing, mode) {
        (None, _) => Existing::Create,
        (Some(_), ImportMode::Skip) => {
            report.skipped += 1;
            Existing::Skip
        }
        (Some(_), ImportMode::Error) => {
            report.fail(item, "Already exists");
            Existing::Skip
        }
        (Some(found), ImportMode::Overwrite) => Existing::Update(found),
    }
}

// ============ CSV conversion ============

pub fn platform_from_csv(row: PlatformCsvRow) -> Result<CreatePlatformRequest, CreditHubError> {
    let status = match row.status.as_deref().filter(|s| !s.is_empty()) {
        Some(s) => Some(s.parse::<PlatformStatus>().map_err(|_| {
            CreditHubError::validation(format!("Unknown platform status '{}'", s))
        })?),
        None => None,
    };
    Ok(CreatePlatformRequest {
        name: row.name,
        slug: row.slug,
        website: row.website,
        logo_url: row.logo_url,
        description: row.description,
        status,
    })
}

/// A tag row becomes a condition tag when it carries a weight
pub enum TagRow {
    Tag(CreateTagRequest),
    Condition(CreateConditionTagRequest),
}

pub fn tag_from_csv(row: TagCsvRow) -> Result<TagRow, CreditHubError> {
    match row.weight {
        Some(weight) => {
            let kind = row.kind.parse::<ConditionKind>().map_err(|_| {
                CreditHubError::validation(format!("Unknown condition kind '{}'", row.kind))
            })?;
            Ok(TagRow::Condition(CreateConditionTagRequest {
                name: row.name,
                slug: row.slug,
                kind,
                difficulty_weight: weight,
            }))
        }
        None => {
            let kind = row.kind.parse::<TagKind>().map_err(|_| {
                CreditHubError::validation(format!("Unknown tag kind '{}'", row.kind))
            })?;
            Ok(TagRow::Tag(CreateTagRequest {
                name: row.name,
                slug: row.slug,
                kind,
            }))
        }
    }
}

/// Merge campaign rows; rows sharing a slug contribute one translation each
pub fn campaigns_from_csv(
    rows: Vec<(usize, CampaignCsvRow)>,
) -> (Vec<(String, ImportCampaign)>, Vec<ImportError>) {
    let mut merged: Vec<(String, ImportCampaign)> = Vec::new();
    let mut by_slug: HashMap<String, usize> = HashMap::new();
    let mut errors = Vec::new();

    for (row_num, row) in rows {
        let label = format!("row {}", row_num);
        let translation = TranslationInput {
            locale: row.locale.clone(),
            title: row.title.clone(),
            description: row.description.clone(),
            is_ai_generated: false,
        };

        let slug = row.slug.clone().filter(|s| !s.is_empty());
        if let Some(slug) = &slug
            && let Some(&idx) = by_slug.get(slug)
        {
            merged[idx].1.campaign.translations.push(translation);
            continue;
        }

        let status = match row.status.as_deref().filter(|s| !s.is_empty()) {
            Some(s) => match s.parse::<CampaignStatus>() {
                Ok(status) => Some(status),
                Err(_) => {
                    errors.push(ImportError {
                        item: label,
                        message: format!("Unknown campaign status '{}'", s),
                    });
                    continue;
                }
            },
            None => None,
        };

        let campaign = CreateCampaignRequest {
            platform_id: None,
            platform_slug: Some(row.platform),
            slug: slug.clone(),
            free_credit: row.free_credit,
            credit_value_cents: row.credit_value_cents,
            start_at: row.start_at.filter(|s| !s.is_empty()),
            end_at: row.end_at.filter(|s| !s.is_empty()),
            official_link: row.official_link,
            ai_models: split_multi(row.ai_models.as_deref()),
            translations: vec![translation],
            tags: split_multi(row.tags.as_deref()),
            conditions: split_multi(row.conditions.as_deref()),
        };

        let item = slug.clone().unwrap_or(label);
        if let Some(slug) = slug {
            by_slug.insert(slug, merged.len());
        }
        merged.push((item, ImportCampaign { campaign, status }));
    }

    (merged, errors)
}

// ============ ImportService Implementation ============

pub struct ImportService {
    storage: Arc<SeaOrmStorage>,
    campaigns: CampaignService,
    platforms: PlatformService,
    tags: TagService,
}

impl ImportService {
    pub fn new(storage: Arc<SeaOrmStorage>) -> Self {
        Self {
            campaigns: CampaignService::new(storage.clone()),
            platforms: PlatformService::new(storage.clone()),
            tags: TagService::new(storage.clone()),
            storage,
        }
    }

    /// Import a whole bundle; platforms and tags go first so campaigns can
    /// reference them
    pub async fn import_bundle(
        &self,
        bundle: ImportBundle,
        mode: ImportMode,
    ) -> Result<ImportReport, CreditHubError> {
        let total = bundle.len();
        let mut report = ImportReport::default();

        report.merge(self.import_platforms(bundle.platforms, mode).await?);
        report.merge(self.import_tags(bundle.tags, mode).await?);
        report.merge(self.import_condition_tags(bundle.condition_tags, mode).await?);
        let campaigns = bundle
            .campaigns
            .into_iter()
            .map(|c| {
                let item = c.campaign.slug.clone().unwrap_or_else(|| "(generated)".into());
                (item, c)
            })
            .collect();
        report.merge(self.import_campaigns(campaigns, mode).await?);

        info!(
            "ImportService: {} items, {} imported, {} skipped, {} failed (mode {})",
            total, report.success, report.skipped, report.failed, mode
        );
        Ok(report)
    }

    /// Import one section from a `.csv` file or a JSON bundle / array
    pub async fn import_file(
        &self,
        kind: ImportKind,
        path: &Path,
        mode: ImportMode,
    ) -> Result<ImportReport, CreditHubError> {
        let is_csv = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("csv"));

        if is_csv {
            return self.import_csv(kind, path, mode).await;
        }

        let content = std::fs::read_to_string(path).map_err(|e| {
            CreditHubError::file_operation(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let bundle = Self::parse_json(kind, &content)?;
        self.import_bundle(bundle.retain_kind(kind), mode).await
    }

    /// Accept either a full bundle object or a bare array of one kind
    pub fn parse_json(kind: ImportKind, content: &str) -> Result<ImportBundle, CreditHubError> {
        let value: serde_json::Value = serde_json::from_str(content)?;
        if !value.is_array() {
            return Ok(serde_json::from_value(value)?);
        }

        let mut bundle = ImportBundle::default();
        match kind {
            ImportKind::Platforms => bundle.platforms = serde_json::from_value(value)?,
            ImportKind::Campaigns => bundle.campaigns = serde_json::from_value(value)?,
            ImportKind::Tags => {
                // 带 difficulty_weight 的条目视为条件标签
                let items: Vec<serde_json::Value> = serde_json::from_value(value)?;
                for item in items {
                    if item.get("difficulty_weight").is_some() {
                        bundle.condition_tags.push(serde_json::from_value(item)?);
                    } else {
                        bundle.tags.push(serde_json::from_value(item)?);
                    }
                }
            }
        }
        Ok(bundle)
    }

    async fn import_csv(
        &self,
        kind: ImportKind,
        path: &Path,
        mode: ImportMode,
    ) -> Result<ImportReport, CreditHubError> {
        let mut report = ImportReport::default();

        match kind {
            ImportKind::Platforms => {
                let parsed = read_rows_from_file::<PlatformCsvRow, _>(path)?;
                for message in parsed.errors {
                    report.fail(path.display().to_string(), message);
                }
                let mut items = Vec::new();
                for (row_num, row) in parsed.rows {
                    match platform_from_csv(row) {
                        Ok(item) => items.push(item),
                        Err(e) => report.fail(format!("row {}", row_num), e.message()),
                    }
                }
                report.merge(self.import_platforms(items, mode).await?);
            }
            ImportKind::Tags => {
                let parsed = read_rows_from_file::<TagCsvRow, _>(path)?;
                for message in parsed.errors {
                    report.fail(path.display().to_string(), message);
                }
                let mut tags = Vec::new();
                let mut conditions = Vec::new();
                for (row_num, row) in parsed.rows {
                    match tag_from_csv(row) {
                        Ok(TagRow::Tag(t)) => tags.push(t),
                        Ok(TagRow::Condition(c)) => conditions.push(c),
                        Err(e) => report.fail(format!("row {}", row_num), e.message()),
                    }
                }
                report.merge(self.import_tags(tags, mode).await?);
                report.merge(self.import_condition_tags(conditions, mode).await?);
            }
            ImportKind::Campaigns => {
                let parsed = read_rows_from_file::<CampaignCsvRow, _>(path)?;
                for message in parsed.errors {
                    report.fail(path.display().to_string(), message);
                }
                let (items, errors) = campaigns_from_csv(parsed.rows);
                report.failed += errors.len();
                report.errors.extend(errors);
                report.merge(self.import_campaigns(items, mode).await?);
            }
        }

        info!(
            "ImportService: CSV {} ({}) imported {}, skipped {}, failed {}",
            path.display(),
            kind,
            report.success,
            report.skipped,
            report.failed
        );
        Ok(report)
    }

    async fn import_platforms(
        &self,
        items: Vec<CreatePlatformRequest>,
        mode: ImportMode,
    ) -> Result<ImportReport, CreditHubError> {
        let mut report = ImportReport::default();

        for item in items {
            let label = item.name.clone();
            let new = match PlatformService::prepare(item) {
                Ok(new) => new,
                Err(e) => {
                    report.fail(label, e.message());
                    continue;
                }
            };

            let existing = self.storage.get_platform_by_slug(&new.slug).await?;
            let result = match decide(mode, existing, &new.slug, &mut report) {
                Existing::Skip => continue,
                Existing::Create => self.storage.insert_platform(new.clone()).await.map(|_| ()),
                Existing::Update(found) => self
                    .storage
                    .update_platform(
                        found.id,
                        PlatformPatch {
                            name: Some(new.name.clone()),
                            website: Some(new.website.clone()),
                            logo_url: Some(new.logo_url.clone()),
                            description: Some(new.description.clone()),
                            status: Some(new.status),
                        },
                    )
                    .await
                    .map(|_| ()),
            };
            match result {
                Ok(()) => report.success += 1,
                Err(e) => report.fail(new.slug, e.message()),
            }
        }
        Ok(report)
    }

    async fn import_tags(
        &self,
        items: Vec<CreateTagRequest>,
        mode: ImportMode,
    ) -> Result<ImportReport, CreditHubError> {
        let mut report = ImportReport::default();
        if items.is_empty() {
            return Ok(report);
        }
        let mut existing: HashMap<String, i64> = self
            .tags
            .list_tags(None)
            .await?
            .into_iter()
            .map(|t| (t.slug, t.id))
            .collect();

        for item in items {
            let label = item.name.clone();
            let new = match TagService::prepare_tag(item) {
                Ok(new) => new,
                Err(e) => {
                    report.fail(label, e.message());
                    continue;
                }
            };

            let found = existing.get(&new.slug).copied();
            let result = match decide(mode, found, &new.slug, &mut report) {
                Existing::Skip => continue,
                Existing::Create => self.storage.insert_tag(new.clone()).await.map(|t| {
                    existing.insert(t.slug, t.id);
                }),
                Existing::Update(id) => self
                    .storage
                    .update_tag(
                        id,
                        TagPatch {
                            name: Some(new.name.clone()),
                            kind: Some(new.kind),
                        },
                    )
                    .await
                    .map(|_| ()),
            };
            match result {
                Ok(()) => report.success += 1,
                Err(e) => report.fail(new.slug, e.message()),
            }
        }
        Ok(report)
    }

    async fn import_condition_tags(
        &self,
        items: Vec<CreateConditionTagRequest>,
        mode: ImportMode,
    ) -> Result<ImportReport, CreditHubError> {
        let mut report = ImportReport::default();
        if items.is_empty() {
            return Ok(report);
        }
        let mut existing: HashMap<String, i64> = self
            .tags
            .list_condition_tags(None)
            .await?
            .into_iter()
            .map(|t| (t.slug, t.id))
            .collect();

        for item in items {
            let label = item.name.clone();
            let new = match TagService::prepare_condition_tag(item) {
                Ok(new) => new,
                Err(e) => {
                    report.fail(label, e.message());
                    continue;
                }
            };

            let found = existing.get(&new.slug).copied();
            let result = match decide(mode, found, &new.slug, &mut report) {
                Existing::Skip => continue,
                Existing::Create => self.storage.insert_condition_tag(new.clone()).await.map(|t| {
                    existing.insert(t.slug, t.id);
                }),
                Existing::Update(id) => self
                    .storage
                    .update_condition_tag(
                        id,
                        ConditionTagPatch {
                            name: Some(new.name.clone()),
                            kind: Some(new.kind),
                            difficulty_weight: Some(new.difficulty_weight),
                        },
                    )
                    .await
                    .map(|_| ()),
            };
            match result {
                Ok(()) => report.success += 1,
                Err(e) => report.fail(new.slug, e.message()),
            }
        }
        Ok(report)
    }

    async fn import_campaigns(
        &self,
        items: Vec<(String, ImportCampaign)>,
        mode: ImportMode,
    ) -> Result<ImportReport, CreditHubError> {
        let mut report = ImportReport::default();

        for (label, item) in items {
            let slug = item
                .campaign
                .slug
                .as_deref()
                .map(|s| s.trim().to_lowercase())
                .filter(|s| !s.is_empty());
            let existing = match &slug {
                Some(slug) => self.storage.get_campaign_by_slug(slug).await?,
                None => None,
            };

            let result = match decide(mode, existing, &label, &mut report) {
                Existing::Skip => continue,
                Existing::Create => {
                    let status = item.status.unwrap_or(CampaignStatus::Published);
                    self.campaigns
                        .create_imported(item.campaign, status)
                        .await
                        .map(|_| ())
                }
                Existing::Update(found) => self.overwrite_campaign(found.id, item.campaign).await,
            };
            match result {
                Ok(()) => report.success += 1,
                Err(e) => {
                    warn!("ImportService: campaign {} failed: {}", label, e);
                    report.fail(label, e.message());
                }
            }
        }
        Ok(report)
    }

    /// Replace every imported field of an existing campaign; status is kept
    async fn overwrite_campaign(
        &self,
        id: i64,
        req: CreateCampaignRequest,
    ) -> Result<(), CreditHubError> {
        let platform_id = match (req.platform_id, req.platform_slug.as_deref()) {
            (Some(pid), _) => Some(pid),
            (None, Some(slug)) => Some(
                self.platforms
                    .get_public(slug)
                    .await
                    .map_err(|_| {
                        CreditHubError::validation(format!("Unknown or inactive platform '{}'", slug))
                    })?
                    .id,
            ),
            (None, None) => None,
        };

        let update = UpdateCampaignRequest {
            platform_id,
            slug: None,
            free_credit: Some(req.free_credit),
            credit_value_cents: Some(req.credit_value_cents),
            start_at: Some(req.start_at),
            end_at: Some(req.end_at),
            official_link: Some(req.official_link),
            ai_models: Some(req.ai_models),
            translations: Some(req.translations),
            tags: Some(req.tags),
            conditions: Some(req.conditions),
        };
        self.campaigns.update(id, update).await.map(|_| ())
    }
}
