//! Moderation workflow
//!
//! Review queue, approve / reject, featured slots and the periodic sweep
//! that expires overdue campaigns.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;
use tracing::{info, warn};
use ts_rs::TS;

use super::campaign_service::{
    CampaignDetail, CampaignQuery, CampaignService, CampaignSummary, ListScope, Paginated,
};
use crate::config::{TS_EXPORT_PATH, get_config};
use crate::errors::CreditHubError;
use crate::storage::{Campaign, CampaignSort, CampaignStatus, SeaOrmStorage};
use crate::utils::TimeParser;

const MAX_REASON_LEN: usize = 500;

// ============ Request / Response DTOs ============

#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
pub struct RejectRequest {
    pub reason: String,
}

/// Featured placement; `until` wins over `duration` when both are given
#[derive(Debug, Clone, Default, Deserialize, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
pub struct FeatureRequest {
    /// Relative duration such as `7d` or `2w`
    pub duration: Option<String>,
    /// Absolute RFC3339 / date, or a relative duration
    pub until: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, Serialize, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
pub struct SweepReport {
    pub expired: u64,
    pub unfeatured: u64,
}

// ============ ModerationService Implementation ============

pub struct ModerationService {
    storage: Arc<SeaOrmStorage>,
    campaigns: CampaignService,
}

impl ModerationService {
    pub fn new(storage: Arc<SeaOrmStorage>) -> Self {
        Self {
            campaigns: CampaignService::new(storage.clone()),
            storage,
        }
    }

    /// Review queue, oldest submissions last
    pub async fn pending(
        &self,
        query: &CampaignQuery,
    ) -> Result<Paginated<CampaignSummary>, CreditHubError> {
        let query = CampaignQuery {
            status: Some(CampaignStatus::Pending.to_string()),
            include_deleted: Some(false),
            sort: Some(query.sort.unwrap_or(CampaignSort::Latest)),
            ..query.clone()
        };
        self.campaigns.list(&query, ListScope::Admin, None).await
    }

    /// Apply a status change and explain why it failed when no row matched
    async fn transition(
        &self,
        id: i64,
        to: CampaignStatus,
        reviewer: Option<&str>,
        reason: Option<&str>,
    ) -> Result<Campaign, CreditHubError> {
        let from: Vec<CampaignStatus> = CampaignStatus::iter()
            .filter(|s| s.can_transition_to(to))
            .collect();

        if let Some(campaign) = self
            .storage
            .transition_status(id, &from, to, reviewer, reason)
            .await?
        {
            return Ok(campaign);
        }

        let current = self.campaigns.require_campaign(id, false).await?;
        Err(CreditHubError::conflict(format!(
            "Campaign {} cannot move from {} to {}",
            id, current.status, to
        )))
    }

    /// Publish a pending, rejected or expired campaign
    pub async fn approve(
        &self,
        id: i64,
        admin_id: &str,
    ) -> Result<CampaignDetail, CreditHubError> {
        let current = self.campaigns.require_campaign(id, false).await?;
        if current.is_expired_at(Utc::now()) {
            return Err(CreditHubError::validation(format!(
                "Campaign {} ended at {:?}; update end_at before approving",
                id, current.end_at
            )));
        }

        self.transition(id, CampaignStatus::Published, Some(admin_id), None)
            .await?;
        info!("ModerationService: campaign {} approved by {}", id, admin_id);
        self.campaigns.get_admin(id, None).await
    }

    /// Reject a pending campaign; the reason is shown to the submitter
    pub async fn reject(
        &self,
        id: i64,
        admin_id: &str,
        reason: &str,
    ) -> Result<CampaignDetail, CreditHubError> {
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(CreditHubError::validation("A reject reason is required"));
        }
        if reason.chars().count() > MAX_REASON_LEN {
            return Err(CreditHubError::validation(format!(
                "Reject reason exceeds {} characters",
                MAX_REASON_LEN
            )));
        }

        self.transition(id, CampaignStatus::Rejected, Some(admin_id), Some(reason))
            .await?;
        info!("ModerationService: campaign {} rejected by {}", id, admin_id);
        self.campaigns.get_admin(id, None).await
    }

    /// Mark a published campaign as expired
    pub async fn expire(&self, id: i64) -> Result<CampaignDetail, CreditHubError> {
        self.transition(id, CampaignStatus::Expired, None, None)
            .await?;
        info!("ModerationService: campaign {} expired manually", id);
        self.campaigns.get_admin(id, None).await
    }

    /// Resolve the featured expiry for a request
    pub fn featured_until(
        req: &FeatureRequest,
        now: DateTime<Utc>,
        default_days: i64,
    ) -> Result<DateTime<Utc>, CreditHubError> {
        let until = match (req.until.as_deref(), req.duration.as_deref()) {
            (Some(until), _) if !until.trim().is_empty() => {
                TimeParser::parse_until(until, now).map_err(CreditHubError::date_parse)?
            }
            (_, Some(duration)) if !duration.trim().is_empty() => {
                let offset =
                    TimeParser::parse_duration(duration).map_err(CreditHubError::date_parse)?;
                TimeParser::offset_from(now, offset).map_err(CreditHubError::date_parse)?
            }
            _ => Duration::try_days(default_days.max(1))
                .and_then(|offset| now.checked_add_signed(offset))
                .ok_or_else(|| {
                    CreditHubError::validation("marketplace.featured_default_days is out of range")
                })?,
        };

        if until <= now {
            return Err(CreditHubError::validation(
                "Featured expiry must be in the future",
            ));
        }
        Ok(until)
    }

    /// Put a published campaign into the featured slot
    pub async fn feature(
        &self,
        id: i64,
        req: &FeatureRequest,
    ) -> Result<CampaignDetail, CreditHubError> {
        let now = Utc::now();
        let current = self.campaigns.require_campaign(id, false).await?;
        if current.status != CampaignStatus::Published || current.is_expired_at(now) {
            return Err(CreditHubError::validation(format!(
                "Only live published campaigns can be featured (campaign {} is {})",
                id, current.status
            )));
        }

        let until = Self::featured_until(req, now, get_config().marketplace.featured_default_days)?;
        if let Some(end_at) = current.end_at
            && until > end_at
        {
            warn!(
                "ModerationService: featured slot for {} outlives its end date {}",
                id, end_at
            );
        }

        self.storage
            .set_featured(id, true, Some(until))
            .await?
            .ok_or_else(|| CreditHubError::not_found(format!("Campaign {} not found", id)))?;
        info!("ModerationService: campaign {} featured until {}", id, until);
        self.campaigns.get_admin(id, None).await
    }

    pub async fn unfeature(&self, id: i64) -> Result<CampaignDetail, CreditHubError> {
        self.storage
            .set_featured(id, false, None)
            .await?
            .ok_or_else(|| CreditHubError::not_found(format!("Campaign {} not found", id)))?;
        info!("ModerationService: campaign {} unfeatured", id);
        self.campaigns.get_admin(id, None).await
    }

    /// Expire overdue campaigns and clear lapsed featured slots
    pub async fn sweep(&self, now: DateTime<Utc>) -> Result<SweepReport, CreditHubError> {
        let expired = self.storage.expire_overdue(now).await?;
        let unfeatured = self.storage.clear_lapsed_featured(now).await?;
        if expired > 0 || unfeatured > 0 {
            info!(
                "ModerationService: sweep expired {} campaigns, cleared {} featured slots",
                expired, unfeatured
            );
        }
        Ok(SweepReport {
            expired,
            unfeatured,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_featured_until_default() {
        let now = Utc::now();
        let until = ModerationService::featured_until(&FeatureRequest::default(), now, 7).unwrap();
        assert_eq!(until, now + Duration::days(7));
    }

    #[test]
    fn test_featured_until_prefers_until() {
        let now = Utc::now();
        let req = FeatureRequest {
            duration: Some("1d".into()),
            until: Some("3d".into()),
        };
        let until = ModerationService::featured_until(&req, now, 7).unwrap();
        assert_eq!(until, now + Duration::days(3));
    }

    #[test]
    fn test_featured_until_duration() {
        let now = Utc::now();
        let req = FeatureRequest {
            duration: Some("12h".into()),
            until: None,
        };
        let until = ModerationService::featured_until(&req, now, 7).unwrap();
        assert_eq!(until, now + Duration::hours(12));
    }

    #[test]
    fn test_featured_until_oversized_input_is_an_error() {
        let now = Utc::now();
        let req = FeatureRequest {
            duration: Some("9999999999999d".into()),
            until: None,
        };
        assert!(matches!(
            ModerationService::featured_until(&req, now, 7),
            Err(CreditHubError::DateParse(_))
        ));

        let req = FeatureRequest {
            duration: None,
            until: Some("999999999d".into()),
        };
        assert!(ModerationService::featured_until(&req, now, 7).is_err());

        assert!(matches!(
            ModerationService::featured_until(&FeatureRequest::default(), now, i64::MAX),
            Err(CreditHubError::Validation(_))
        ));
    }

    #[test]
    fn test_featured_until_rejects_past() {
        let now = Utc::now();
        let req = FeatureRequest {
            duration: None,
            until: Some("2000-01-01".into()),
        };
        assert!(ModerationService::featured_until(&req, now, 7).is_err());

        let garbage = FeatureRequest {
            duration: Some("soon".into()),
            until: None,
        };
        assert!(matches!(
            ModerationService::featured_until(&garbage, now, 7),
            Err(CreditHubError::DateParse(_))
        ));
    }
}
