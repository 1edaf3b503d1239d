//! Platform service

use std::sync::Arc;

use serde::Deserialize;
use tracing::info;
use ts_rs::TS;

use super::double_option;
use crate::config::TS_EXPORT_PATH;
use crate::errors::CreditHubError;
use crate::storage::{
    NewPlatform, Platform, PlatformPatch, PlatformStatus, PlatformWithCount, SeaOrmStorage,
};
use crate::utils::url_validator::validate_optional_url;
use crate::utils::{is_valid_slug, slugify};

const MAX_NAME_LEN: usize = 100;
const MAX_DESCRIPTION_LEN: usize = 2000;

// ============ Request DTOs ============

#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
pub struct CreatePlatformRequest {
    pub name: String,
    pub slug: Option<String>,
    pub website: Option<String>,
    pub logo_url: Option<String>,
    pub description: Option<String>,
    pub status: Option<PlatformStatus>,
}

#[derive(Debug, Clone, Default, Deserialize, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
pub struct UpdatePlatformRequest {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    #[ts(optional)]
    pub website: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    #[ts(optional)]
    pub logo_url: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    #[ts(optional)]
    pub description: Option<Option<String>>,
    pub status: Option<PlatformStatus>,
}

#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
pub struct PlatformStatusRequest {
    pub status: PlatformStatus,
}

// ============ PlatformService Implementation ============

pub struct PlatformService {
    storage: Arc<SeaOrmStorage>,
}

impl PlatformService {
    pub fn new(storage: Arc<SeaOrmStorage>) -> Self {
        Self { storage }
    }

    pub async fn list(&self, active_only: bool) -> Result<Vec<PlatformWithCount>, CreditHubError> {
        self.storage.list_platforms(active_only).await
    }

    pub async fn get(&self, id: i64) -> Result<Platform, CreditHubError> {
        self.storage
            .get_platform(id)
            .await?
            .ok_or_else(|| CreditHubError::not_found(format!("Platform {} not found", id)))
    }

    /// Public lookup; inactive platforms are hidden
    pub async fn get_public(&self, slug: &str) -> Result<Platform, CreditHubError> {
        self.storage
            .get_platform_by_slug(&slug.to_lowercase())
            .await?
            .filter(|p| p.status == PlatformStatus::Active)
            .ok_or_else(|| CreditHubError::not_found(format!("Platform '{}' not found", slug)))
    }

    fn validate_name(name: &str) -> Result<String, CreditHubError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(CreditHubError::validation("Platform name is required"));
        }
        if name.chars().count() > MAX_NAME_LEN {
            return Err(CreditHubError::validation(format!(
                "Platform name exceeds {} characters",
                MAX_NAME_LEN
            )));
        }
        Ok(name.to_string())
    }

    fn validate_description(description: Option<&str>) -> Result<Option<String>, CreditHubError> {
        match description.map(str::trim).filter(|d| !d.is_empty()) {
            Some(d) if d.chars().count() > MAX_DESCRIPTION_LEN => Err(CreditHubError::validation(
                format!("Description exceeds {} characters", MAX_DESCRIPTION_LEN),
            )),
            other => Ok(other.map(str::to_string)),
        }
    }

    fn validate_link(field: &str, value: Option<&str>) -> Result<Option<String>, CreditHubError> {
        validate_optional_url(value)
            .map_err(|e| CreditHubError::validation(format!("{}: {}", field, e)))
    }

    /// Validate and normalise a create request without touching storage
    pub fn prepare(req: CreatePlatformRequest) -> Result<NewPlatform, CreditHubError> {
        let name = Self::validate_name(&req.name)?;
        let slug = match req.slug.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            Some(slug) => slug.to_lowercase(),
            None => slugify(&name),
        };
        if !is_valid_slug(&slug) {
            return Err(CreditHubError::validation(format!(
                "Invalid platform slug '{}'",
                slug
            )));
        }

        Ok(NewPlatform {
            name,
            slug,
            website: Self::validate_link("website", req.website.as_deref())?,
            logo_url: Self::validate_link("logo_url", req.logo_url.as_deref())?,
            description: Self::validate_description(req.description.as_deref())?,
            status: req.status.unwrap_or_default(),
        })
    }

    pub async fn create(&self, req: CreatePlatformRequest) -> Result<Platform, CreditHubError> {
        let new = Self::prepare(req)?;
        let platform = self.storage.insert_platform(new).await?;
        info!("PlatformService: created platform '{}'", platform.slug);
        Ok(platform)
    }

    pub async fn update(
        &self,
        id: i64,
        req: UpdatePlatformRequest,
    ) -> Result<Platform, CreditHubError> {
        let patch = PlatformPatch {
            name: req.name.as_deref().map(Self::validate_name).transpose()?,
            website: req
                .website
                .map(|w| Self::validate_link("website", w.as_deref()))
                .transpose()?,
            logo_url: req
                .logo_url
                .map(|l| Self::validate_link("logo_url", l.as_deref()))
                .transpose()?,
            description: req
                .description
                .map(|d| Self::validate_description(d.as_deref()))
                .transpose()?,
            status: req.status,
        };

        let platform = self.storage.update_platform(id, patch).await?;
        info!("PlatformService: updated platform '{}'", platform.slug);
        Ok(platform)
    }

    /// Activate or deactivate; campaigns of inactive platforms stay listed
    /// but no new submissions are accepted
    pub async fn set_status(
        &self,
        id: i64,
        status: PlatformStatus,
    ) -> Result<Platform, CreditHubError> {
        let platform = self.storage.set_platform_status(id, status).await?;
        info!("PlatformService: platform '{}' is now {}", platform.slug, status);
        Ok(platform)
    }
}
