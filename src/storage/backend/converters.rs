//! 实体 Model 与领域模型之间的转换
//!
//! 数据库里的枚举列都是字符串；未知取值不会让整条记录加载失败，
//! 而是回退到默认值并记一条 warn 日志。

use std::str::FromStr;

use sea_orm::ActiveValue::{NotSet, Set};
use tracing::warn;

use crate::storage::models::{
    Campaign, CampaignCounters, CampaignStatus, Comment, ConditionKind, ConditionTag, Difficulty,
    NewCampaign, NewPlatform, Platform, PlatformStatus, Tag, TagKind, Translation,
};
use migration::entities::{campaign, comment, condition_tag, platform, tag, campaign_translation};

fn parse_or_default<T: FromStr + Default>(value: &str, column: &str) -> T {
    value.parse().unwrap_or_else(|_| {
        warn!("Unknown {} value '{}', using default", column, value);
        T::default()
    })
}

/// ai_models 列存 JSON 数组文本
pub fn decode_ai_models(raw: &str) -> Vec<String> {
    if raw.trim().is_empty() {
        return Vec::new();
    }
    serde_json::from_str(raw).unwrap_or_else(|e| {
        warn!("Malformed ai_models column '{}': {}", raw, e);
        Vec::new()
    })
}

pub fn encode_ai_models(models: &[String]) -> String {
    serde_json::to_string(models).unwrap_or_else(|_| "[]".to_string())
}

fn parse_status(value: &str) -> CampaignStatus {
    CampaignStatus::from_str(value).unwrap_or_else(|_| {
        warn!("Unknown campaign status '{}', treating as pending", value);
        CampaignStatus::Pending
    })
}

pub fn model_to_campaign(model: campaign::Model) -> Campaign {
    Campaign {
        id: model.id,
        platform_id: model.platform_id,
        status: parse_status(&model.status),
        slug: model.slug,
        free_credit: model.free_credit,
        credit_value_cents: model.credit_value_cents,
        start_at: model.start_at,
        end_at: model.end_at,
        official_link: model.official_link,
        ai_models: decode_ai_models(&model.ai_models),
        difficulty: parse_or_default::<Difficulty>(&model.difficulty, "difficulty"),
        is_featured: model.is_featured,
        featured_until: model.featured_until,
        counters: CampaignCounters {
            like_count: model.like_count,
            dislike_count: model.dislike_count,
            reaction_score: model.reaction_score,
            bookmark_count: model.bookmark_count,
            comment_count: model.comment_count,
            participant_count: model.participant_count,
        },
        submitted_by: model.submitted_by,
        reviewed_by: model.reviewed_by,
        reviewed_at: model.reviewed_at,
        reject_reason: model.reject_reason,
        created_at: model.created_at,
        updated_at: model.updated_at,
        deleted_at: model.deleted_at,
    }
}

/// 新活动的 ActiveModel；计数器从 0 开始，id 由数据库分配
pub fn new_campaign_active_model(
    new: &NewCampaign,
    difficulty: Difficulty,
    now: chrono::DateTime<chrono::Utc>,
) -> campaign::ActiveModel {
    let published = new.status == CampaignStatus::Published;
    campaign::ActiveModel {
        id: NotSet,
        platform_id: Set(new.platform_id),
        slug: Set(new.slug.clone()),
        status: Set(new.status.as_ref().to_string()),
        free_credit: Set(new.free_credit.clone()),
        credit_value_cents: Set(new.credit_value_cents),
        start_at: Set(new.start_at),
        end_at: Set(new.end_at),
        official_link: Set(new.official_link.clone()),
        ai_models: Set(encode_ai_models(&new.ai_models)),
        difficulty: Set(difficulty.as_ref().to_string()),
        is_featured: Set(false),
        featured_until: Set(None),
        reaction_score: Set(0),
        like_count: Set(0),
        dislike_count: Set(0),
        bookmark_count: Set(0),
        comment_count: Set(0),
        participant_count: Set(0),
        submitted_by: Set(new.submitted_by.clone()),
        reviewed_by: Set(if published { new.reviewed_by.clone() } else { None }),
        reviewed_at: Set(if published && new.reviewed_by.is_some() {
            Some(now)
        } else {
            None
        }),
        reject_reason: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
        deleted_at: Set(None),
    }
}

pub fn model_to_translation(model: campaign_translation::Model) -> Translation {
    Translation {
        locale: model.locale,
        title: model.title,
        description: model.description,
        is_ai_generated: model.is_ai_generated,
        updated_at: model.updated_at,
    }
}

pub fn model_to_platform(model: platform::Model) -> Platform {
    Platform {
        id: model.id,
        status: parse_or_default::<PlatformStatus>(&model.status, "platform status"),
        name: model.name,
        slug: model.slug,
        website: model.website,
        logo_url: model.logo_url,
        description: model.description,
        created_at: model.created_at,
        updated_at: model.updated_at,
    }
}

pub fn new_platform_active_model(
    new: &NewPlatform,
    now: chrono::DateTime<chrono::Utc>,
) -> platform::ActiveModel {
    platform::ActiveModel {
        id: NotSet,
        name: Set(new.name.clone()),
        slug: Set(new.slug.clone()),
        website: Set(new.website.clone()),
        logo_url: Set(new.logo_url.clone()),
        description: Set(new.description.clone()),
        status: Set(new.status.as_ref().to_string()),
        created_at: Set(now),
        updated_at: Set(now),
    }
}

pub fn model_to_tag(model: tag::Model) -> Tag {
    Tag {
        id: model.id,
        kind: parse_or_default::<TagKind>(&model.kind, "tag kind"),
        name: model.name,
        slug: model.slug,
    }
}

pub fn model_to_condition_tag(model: condition_tag::Model) -> ConditionTag {
    ConditionTag {
        id: model.id,
        kind: parse_or_default::<ConditionKind>(&model.kind, "condition kind"),
        name: model.name,
        slug: model.slug,
        difficulty_weight: model.difficulty_weight,
    }
}

pub fn model_to_comment(model: comment::Model) -> Comment {
    Comment {
        id: model.id,
        campaign_id: model.campaign_id,
        user_id: model.user_id,
        parent_id: model.parent_id,
        content: model.content,
        created_at: model.created_at,
        updated_at: model.updated_at,
        deleted_at: model.deleted_at,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::ActiveValue;

    fn campaign_model() -> campaign::Model {
        let now = Utc::now();
        campaign::Model {
            id: 9,
            platform_id: 2,
            slug: "openai-5-dollar".to_string(),
            status: "published".to_string(),
            free_credit: "$5".to_string(),
            credit_value_cents: Some(500),
            start_at: None,
            end_at: None,
            official_link: "https://openai.com".to_string(),
            ai_models: r#"["gpt-4o","o1"]"#.to_string(),
            difficulty: "medium".to_string(),
            is_featured: false,
            featured_until: None,
            reaction_score: 3,
            like_count: 4,
            dislike_count: 1,
            bookmark_count: 2,
            comment_count: 0,
            participant_count: 1,
            submitted_by: Some("u1".to_string()),
            reviewed_by: None,
            reviewed_at: None,
            reject_reason: None,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    #[test]
    fn test_model_to_campaign() {
        let c = model_to_campaign(campaign_model());
        assert_eq!(c.status, CampaignStatus::Published);
        assert_eq!(c.difficulty, Difficulty::Medium);
        assert_eq!(c.ai_models, vec!["gpt-4o", "o1"]);
        assert_eq!(c.counters.reaction_score, 3);
        assert_eq!(c.counters.like_count, 4);
    }

    #[test]
    fn test_unknown_enum_values_fall_back() {
        let mut model = campaign_model();
        model.status = "archived".to_string();
        model.difficulty = "extreme".to_string();
        model.ai_models = "not json".to_string();
        let c = model_to_campaign(model);
        assert_eq!(c.status, CampaignStatus::Pending);
        assert_eq!(c.difficulty, Difficulty::Easy);
        assert!(c.ai_models.is_empty());
    }

    #[test]
    fn test_ai_models_encoding() {
        let encoded = encode_ai_models(&["claude-3".to_string()]);
        assert_eq!(encoded, r#"["claude-3"]"#);
        assert!(decode_ai_models("").is_empty());
    }

    #[test]
    fn test_new_campaign_active_model_review_fields() {
        let now = Utc::now();
        let mut new = NewCampaign {
            platform_id: 1,
            slug: "x-credit".to_string(),
            status: CampaignStatus::Pending,
            free_credit: "$1".to_string(),
            credit_value_cents: None,
            start_at: None,
            end_at: None,
            official_link: "https://x.ai".to_string(),
            ai_models: vec![],
            submitted_by: Some("u1".to_string()),
            reviewed_by: Some("admin".to_string()),
            translations: vec![],
            tag_ids: vec![],
            condition_tag_ids: vec![],
        };

        let pending = new_campaign_active_model(&new, Difficulty::Easy, now);
        assert_eq!(pending.reviewed_by, ActiveValue::Set(None));
        assert!(matches!(pending.id, ActiveValue::NotSet));

        new.status = CampaignStatus::Published;
        let published = new_campaign_active_model(&new, Difficulty::Hard, now);
        assert_eq!(published.reviewed_by, ActiveValue::Set(Some("admin".to_string())));
        assert_eq!(published.reviewed_at, ActiveValue::Set(Some(now)));
        assert_eq!(published.difficulty, ActiveValue::Set("hard".to_string()));
    }
}
