//! Tag and condition tag management, plus the default tag set used by
//! `seed-tags`

use std::collections::HashSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;
use ts_rs::TS;

use crate::config::TS_EXPORT_PATH;
use crate::errors::CreditHubError;
use crate::storage::{
    ConditionKind, ConditionTag, ConditionTagPatch, NewConditionTag, NewTag, SeaOrmStorage, Tag,
    TagKind, TagPatch,
};
use crate::utils::{is_valid_slug, slugify};

pub const MIN_WEIGHT: i32 = -10;
pub const MAX_WEIGHT: i32 = 10;
const MAX_NAME_LEN: usize = 60;

/// 默认分类 / 模型标签
const DEFAULT_TAGS: &[(&str, &str, TagKind)] = &[
    ("LLM", "llm", TagKind::Category),
    ("Image Generation", "image-generation", TagKind::Category),
    ("Speech", "speech", TagKind::Category),
    ("Embeddings", "embeddings", TagKind::Category),
    ("Coding", "coding", TagKind::Category),
    ("Cloud GPU", "cloud-gpu", TagKind::Category),
    ("GPT", "gpt", TagKind::AiModel),
    ("Claude", "claude", TagKind::AiModel),
    ("Gemini", "gemini", TagKind::AiModel),
    ("Llama", "llama", TagKind::AiModel),
    ("Mistral", "mistral", TagKind::AiModel),
    ("DeepSeek", "deepseek", TagKind::AiModel),
    ("Qwen", "qwen", TagKind::AiModel),
];

/// 默认条件标签（名称、slug、类型、难度权重）
const DEFAULT_CONDITIONS: &[(&str, &str, ConditionKind, i32)] = &[
    ("Credit card required", "credit-card", ConditionKind::Requirement, 3),
    ("Phone verification", "phone-verification", ConditionKind::Requirement, 2),
    ("Company email", "company-email", ConditionKind::Requirement, 2),
    ("Student status", "student", ConditionKind::Requirement, 3),
    ("Application review", "application-review", ConditionKind::Requirement, 3),
    ("New accounts only", "new-account", ConditionKind::Requirement, 1),
    ("GitHub account", "github-account", ConditionKind::Requirement, 1),
    ("No card required", "no-card", ConditionKind::Benefit, 0),
    ("Instant API key", "instant-key", ConditionKind::Benefit, -1),
    ("Monthly refill", "monthly-refill", ConditionKind::Benefit, 0),
];

// ============ Request / Response DTOs ============

#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
pub struct CreateTagRequest {
    pub name: String,
    pub slug: Option<String>,
    pub kind: TagKind,
}

#[derive(Debug, Clone, Default, Deserialize, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
pub struct UpdateTagRequest {
    pub name: Option<String>,
    pub kind: Option<TagKind>,
}

#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
pub struct CreateConditionTagRequest {
    pub name: String,
    pub slug: Option<String>,
    pub kind: ConditionKind,
    #[serde(default)]
    pub difficulty_weight: i32,
}

#[derive(Debug, Clone, Default, Deserialize, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
pub struct UpdateConditionTagRequest {
    pub name: Option<String>,
    pub kind: Option<ConditionKind>,
    pub difficulty_weight: Option<i32>,
}

#[derive(Debug, Clone, Copy, Default, Serialize, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
pub struct SeedReport {
    pub created: usize,
    pub existing: usize,
}

// ============ TagService Implementation ============

pub struct TagService {
    storage: Arc<SeaOrmStorage>,
}

fn validate_name(name: &str) -> Result<String, CreditHubError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(CreditHubError::validation("Tag name is required"));
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(CreditHubError::validation(format!(
            "Tag name exceeds {} characters",
            MAX_NAME_LEN
        )));
    }
    Ok(name.to_string())
}

fn resolve_slug(slug: Option<&str>, name: &str) -> Result<String, CreditHubError> {
    let slug = match slug.map(str::trim).filter(|s| !s.is_empty()) {
        Some(s) => s.to_lowercase(),
        None => slugify(name),
    };
    if !is_valid_slug(&slug) {
        return Err(CreditHubError::validation(format!(
            "Invalid tag slug '{}'",
            slug
        )));
    }
    Ok(slug)
}

fn validate_weight(weight: i32) -> Result<i32, CreditHubError> {
    if !(MIN_WEIGHT..=MAX_WEIGHT).contains(&weight) {
        return Err(CreditHubError::validation(format!(
            "difficulty_weight must be between {} and {}",
            MIN_WEIGHT, MAX_WEIGHT
        )));
    }
    Ok(weight)
}

impl TagService {
    pub fn new(storage: Arc<SeaOrmStorage>) -> Self {
        Self { storage }
    }

    pub async fn list_tags(&self, kind: Option<TagKind>) -> Result<Vec<Tag>, CreditHubError> {
        self.storage.list_tags(kind).await
    }

    pub async fn list_condition_tags(
        &self,
        kind: Option<ConditionKind>,
    ) -> Result<Vec<ConditionTag>, CreditHubError> {
        self.storage.list_condition_tags(kind).await
    }

    pub fn prepare_tag(req: CreateTagRequest) -> Result<NewTag, CreditHubError> {
        let name = validate_name(&req.name)?;
        let slug = resolve_slug(req.slug.as_deref(), &name)?;
        Ok(NewTag {
            name,
            slug,
            kind: req.kind,
        })
    }

    pub fn prepare_condition_tag(
        req: CreateConditionTagRequest,
    ) -> Result<NewConditionTag, CreditHubError> {
        let name = validate_name(&req.name)?;
        let slug = resolve_slug(req.slug.as_deref(), &name)?;
        Ok(NewConditionTag {
            name,
            slug,
            kind: req.kind,
            difficulty_weight: validate_weight(req.difficulty_weight)?,
        })
    }

    pub async fn create_tag(&self, req: CreateTagRequest) -> Result<Tag, CreditHubError> {
        let tag = self.storage.insert_tag(Self::prepare_tag(req)?).await?;
        info!("TagService: created tag '{}'", tag.slug);
        Ok(tag)
    }

    pub async fn update_tag(&self, id: i64, req: UpdateTagRequest) -> Result<Tag, CreditHubError> {
        let patch = TagPatch {
            name: req.name.as_deref().map(validate_name).transpose()?,
            kind: req.kind,
        };
        self.storage.update_tag(id, patch).await
    }

    pub async fn delete_tag(&self, id: i64) -> Result<(), CreditHubError> {
        if !self.storage.delete_tag(id).await? {
            return Err(CreditHubError::not_found(format!("Tag {} not found", id)));
        }
        Ok(())
    }

    pub async fn create_condition_tag(
        &self,
        req: CreateConditionTagRequest,
    ) -> Result<ConditionTag, CreditHubError> {
        let tag = self
            .storage
            .insert_condition_tag(Self::prepare_condition_tag(req)?)
            .await?;
        info!("TagService: created condition tag '{}'", tag.slug);
        Ok(tag)
    }

    pub async fn update_condition_tag(
        &self,
        id: i64,
        req: UpdateConditionTagRequest,
    ) -> Result<ConditionTag, CreditHubError> {
        let patch = ConditionTagPatch {
            name: req.name.as_deref().map(validate_name).transpose()?,
            kind: req.kind,
            difficulty_weight: req.difficulty_weight.map(validate_weight).transpose()?,
        };
        self.storage.update_condition_tag(id, patch).await
    }

    pub async fn delete_condition_tag(&self, id: i64) -> Result<(), CreditHubError> {
        if !self.storage.delete_condition_tag(id).await? {
            return Err(CreditHubError::not_found(format!(
                "Condition tag {} not found",
                id
            )));
        }
        Ok(())
    }

    /// Insert the default tag set; existing slugs are left untouched
    pub async fn seed_defaults(&self) -> Result<SeedReport, CreditHubError> {
        let mut report = SeedReport::default();

        let existing: HashSet<String> = self
            .storage
            .list_tags(None)
            .await?
            .into_iter()
            .map(|t| t.slug)
            .collect();
        for (name, slug, kind) in DEFAULT_TAGS {
            if existing.contains(*slug) {
                report.existing += 1;
                continue;
            }
            self.storage
                .insert_tag(NewTag {
                    name: name.to_string(),
                    slug: slug.to_string(),
                    kind: *kind,
                })
                .await?;
            report.created += 1;
        }

        let existing: HashSet<String> = self
            .storage
            .list_condition_tags(None)
            .await?
            .into_iter()
            .map(|t| t.slug)
            .collect();
        for (name, slug, kind, weight) in DEFAULT_CONDITIONS {
            if existing.contains(*slug) {
                report.existing += 1;
                continue;
            }
            self.storage
                .insert_condition_tag(NewConditionTag {
                    name: name.to_string(),
                    slug: slug.to_string(),
                    kind: *kind,
                    difficulty_weight: *weight,
                })
                .await?;
            report.created += 1;
        }

        info!(
            "TagService: seeded {} tags ({} already present)",
            report.created, report.existing
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_slugs_are_valid_and_unique() {
        let mut seen = HashSet::new();
        for (_, slug, _) in DEFAULT_TAGS {
            assert!(is_valid_slug(slug), "{}", slug);
            assert!(seen.insert(*slug));
        }
        for (_, slug, _, weight) in DEFAULT_CONDITIONS {
            assert!(is_valid_slug(slug), "{}", slug);
            assert!(seen.insert(*slug));
            assert!(validate_weight(*weight).is_ok());
        }
    }

    #[test]
    fn test_prepare_condition_tag() {
        let tag = TagService::prepare_condition_tag(CreateConditionTagRequest {
            name: "Credit card required".into(),
            slug: None,
            kind: ConditionKind::Requirement,
            difficulty_weight: 3,
        })
        .unwrap();
        assert_eq!(tag.slug, "credit-card-required");

        let too_heavy = CreateConditionTagRequest {
            name: "KYC".into(),
            slug: None,
            kind: ConditionKind::Requirement,
            difficulty_weight: 11,
        };
        assert!(TagService::prepare_condition_tag(too_heavy).is_err());
    }

    #[test]
    fn test_prepare_tag_slug_override() {
        let tag = TagService::prepare_tag(CreateTagRequest {
            name: "GPT-4o".into(),
            slug: Some("GPT".into()),
            kind: TagKind::AiModel,
        })
        .unwrap();
        assert_eq!(tag.slug, "gpt");
        assert_eq!(tag.name, "GPT-4o");
    }
}
