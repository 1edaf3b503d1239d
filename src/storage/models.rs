//! 领域模型
//!
//! 数据库实体（migration::entities）只存字符串，这里是带类型的视图。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};
use ts_rs::TS;

use crate::config::TS_EXPORT_PATH;

/// 活动生命周期状态
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    TS,
    EnumIter,
    EnumString,
    AsRefStr,
    Display,
)]
#[ts(export, export_to = TS_EXPORT_PATH)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum CampaignStatus {
    Pending,
    Published,
    Rejected,
    Expired,
}

impl CampaignStatus {
    /// 审核流转是否合法
    ///
    /// pending → published | rejected；published → expired；
    /// rejected / expired 可由管理员重新发布。
    pub fn can_transition_to(self, next: CampaignStatus) -> bool {
        use CampaignStatus::*;
        matches!(
            (self, next),
            (Pending, Published)
                | (Pending, Rejected)
                | (Published, Expired)
                | (Rejected, Published)
                | (Expired, Published)
        )
    }
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    TS,
    EnumIter,
    EnumString,
    AsRefStr,
    Display,
    Default,
)]
#[ts(export, export_to = TS_EXPORT_PATH)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum PlatformStatus {
    #[default]
    Active,
    Inactive,
}

/// 活动参与难度，由条件标签权重之和推导
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    TS,
    EnumIter,
    EnumString,
    AsRefStr,
    Display,
    Default,
)]
#[ts(export, export_to = TS_EXPORT_PATH)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum Difficulty {
    #[default]
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub const MEDIUM_THRESHOLD: i32 = 3;
    pub const HARD_THRESHOLD: i32 = 6;

    /// 权重和 ≤ 2 → easy，3..=5 → medium，≥ 6 → hard；负数按 0 处理
    pub fn from_weight_sum(sum: i32) -> Self {
        match sum.max(0) {
            s if s >= Self::HARD_THRESHOLD => Difficulty::Hard,
            s if s >= Self::MEDIUM_THRESHOLD => Difficulty::Medium,
            _ => Difficulty::Easy,
        }
    }

    pub fn from_weights<I: IntoIterator<Item = i32>>(weights: I) -> Self {
        Self::from_weight_sum(weights.into_iter().fold(0i32, i32::saturating_add))
    }
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    TS,
    EnumIter,
    EnumString,
    AsRefStr,
    Display,
    Default,
)]
#[ts(export, export_to = TS_EXPORT_PATH)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum TagKind {
    #[default]
    Category,
    AiModel,
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    TS,
    EnumIter,
    EnumString,
    AsRefStr,
    Display,
    Default,
)]
#[ts(export, export_to = TS_EXPORT_PATH)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum ConditionKind {
    #[default]
    Requirement,
    Benefit,
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    TS,
    EnumIter,
    EnumString,
    AsRefStr,
    Display,
)]
#[ts(export, export_to = TS_EXPORT_PATH)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum ReactionKind {
    Like,
    Dislike,
}

/// 列表排序方式
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    TS,
    EnumIter,
    EnumString,
    AsRefStr,
    Display,
    Default,
)]
#[ts(export, export_to = TS_EXPORT_PATH)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum CampaignSort {
    #[default]
    Latest,
    Popular,
    ExpiringSoon,
    HighestCredit,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
pub struct Platform {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub website: Option<String>,
    pub logo_url: Option<String>,
    pub description: Option<String>,
    pub status: PlatformStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Campaign {
    pub id: i64,
    pub platform_id: i64,
    pub slug: String,
    pub status: CampaignStatus,
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
    pub submitted_by: Option<String>,
    pub reviewed_by: Option<String>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub reject_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Campaign {
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// 已过期：状态为 expired，或截止时间已过
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.status == CampaignStatus::Expired || self.end_at.is_some_and(|end| end < now)
    }

    /// 推荐位仍有效
    pub fn is_featured_at(&self, now: DateTime<Utc>) -> bool {
        self.is_featured && self.featured_until.is_none_or(|until| until > now)
    }

    /// 对公众可见：已发布且未删除
    pub fn is_public(&self) -> bool {
        self.status == CampaignStatus::Published && !self.is_deleted()
    }
}

/// 反规范化计数器
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
pub struct CampaignCounters {
    pub like_count: i32,
    pub dislike_count: i32,
    pub reaction_score: i32,
    pub bookmark_count: i32,
    pub comment_count: i32,
    pub participant_count: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
pub struct Translation {
    pub locale: String,
    pub title: String,
    pub description: String,
    pub is_ai_generated: bool,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
pub struct Tag {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub kind: TagKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
pub struct ConditionTag {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub kind: ConditionKind,
    pub difficulty_weight: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: i64,
    pub campaign_id: i64,
    pub user_id: String,
    pub parent_id: Option<i64>,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

/// 当前用户对某个活动的互动状态
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
pub struct InteractionState {
    pub reaction: Option<ReactionKind>,
    pub bookmarked: bool,
    pub participated: bool,
    pub emojis: Vec<String>,
}

/// 新建活动翻译
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
pub struct TranslationInput {
    pub locale: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub is_ai_generated: bool,
}

/// 插入活动所需的全部数据（已校验）
#[derive(Debug, Clone)]
pub struct NewCampaign {
    pub platform_id: i64,
    pub slug: String,
    pub status: CampaignStatus,
    pub free_credit: String,
    pub credit_value_cents: Option<i64>,
    pub start_at: Option<DateTime<Utc>>,
    pub end_at: Option<DateTime<Utc>>,
    pub official_link: String,
    pub ai_models: Vec<String>,
    pub submitted_by: Option<String>,
    pub reviewed_by: Option<String>,
    pub translations: Vec<TranslationInput>,
    pub tag_ids: Vec<i64>,
    pub condition_tag_ids: Vec<i64>,
}

/// 活动部分更新；`None` 表示不修改
#[derive(Debug, Clone, Default)]
pub struct CampaignPatch {
    pub platform_id: Option<i64>,
    pub slug: Option<String>,
    pub free_credit: Option<String>,
    pub credit_value_cents: Option<Option<i64>>,
    pub start_at: Option<Option<DateTime<Utc>>>,
    pub end_at: Option<Option<DateTime<Utc>>>,
    pub official_link: Option<String>,
    pub ai_models: Option<Vec<String>>,
    pub translations: Option<Vec<TranslationInput>>,
    pub tag_ids: Option<Vec<i64>>,
    pub condition_tag_ids: Option<Vec<i64>>,
}

#[derive(Debug, Clone)]
pub struct NewPlatform {
    pub name: String,
    pub slug: String,
    pub website: Option<String>,
    pub logo_url: Option<String>,
    pub description: Option<String>,
    pub status: PlatformStatus,
}

#[derive(Debug, Clone, Default)]
pub struct PlatformPatch {
    pub name: Option<String>,
    pub website: Option<Option<String>>,
    pub logo_url: Option<Option<String>>,
    pub description: Option<Option<String>>,
    pub status: Option<PlatformStatus>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTag {
    pub name: String,
    pub slug: String,
    pub kind: TagKind,
}

#[derive(Debug, Clone, Default)]
pub struct TagPatch {
    pub name: Option<String>,
    pub kind: Option<TagKind>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewConditionTag {
    pub name: String,
    pub slug: String,
    pub kind: ConditionKind,
    pub difficulty_weight: i32,
}

#[derive(Debug, Clone, Default)]
pub struct ConditionTagPatch {
    pub name: Option<String>,
    pub kind: Option<ConditionKind>,
    pub difficulty_weight: Option<i32>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use std::str::FromStr;

    #[test]
    fn test_difficulty_thresholds() {
        assert_eq!(Difficulty::from_weight_sum(-4), Difficulty::Easy);
        assert_eq!(Difficulty::from_weight_sum(0), Difficulty::Easy);
        assert_eq!(Difficulty::from_weight_sum(2), Difficulty::Easy);
        assert_eq!(Difficulty::from_weight_sum(3), Difficulty::Medium);
        assert_eq!(Difficulty::from_weight_sum(5), Difficulty::Medium);
        assert_eq!(Difficulty::from_weight_sum(6), Difficulty::Hard);
        assert_eq!(Difficulty::from_weights([2, 2, -1]), Difficulty::Medium);
        assert_eq!(Difficulty::from_weights(Vec::new()), Difficulty::Easy);
    }

    #[test]
    fn test_status_transitions() {
        use CampaignStatus::*;
        assert!(Pending.can_transition_to(Published));
        assert!(Pending.can_transition_to(Rejected));
        assert!(Published.can_transition_to(Expired));
        assert!(!Published.can_transition_to(Pending));
        assert!(!Expired.can_transition_to(Rejected));
        assert!(!Pending.can_transition_to(Pending));
    }

    #[test]
    fn test_enum_string_forms() {
        assert_eq!(CampaignSort::ExpiringSoon.as_ref(), "expiring_soon");
        assert_eq!(
            CampaignSort::from_str("highest_credit").unwrap(),
            CampaignSort::HighestCredit
        );
        assert_eq!(TagKind::AiModel.to_string(), "ai_model");
        assert_eq!(
            CampaignStatus::from_str("Published").unwrap(),
            CampaignStatus::Published
        );
        assert!(ReactionKind::from_str("love").is_err());
        assert_eq!(
            serde_json::to_string(&CampaignSort::ExpiringSoon).unwrap(),
            "\"expiring_soon\""
        );
    }

    fn sample_campaign() -> Campaign {
        let now = Utc::now();
        Campaign {
            id: 1,
            platform_id: 1,
            slug: "sample".into(),
            status: CampaignStatus::Published,
            free_credit: "$5".into(),
            credit_value_cents: Some(500),
            start_at: None,
            end_at: None,
            official_link: "https://example.com".into(),
            ai_models: vec![],
            difficulty: Difficulty::Easy,
            is_featured: false,
            featured_until: None,
            counters: CampaignCounters::default(),
            submitted_by: None,
            reviewed_by: None,
            reviewed_at: None,
            reject_reason: None,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    #[test]
    fn test_campaign_expiry_and_featured() {
        let now = Utc::now();
        let mut c = sample_campaign();
        assert!(!c.is_expired_at(now));
        c.end_at = Some(now - Duration::hours(1));
        assert!(c.is_expired_at(now));

        c.is_featured = true;
        assert!(c.is_featured_at(now));
        c.featured_until = Some(now - Duration::seconds(1));
        assert!(!c.is_featured_at(now));
        c.featured_until = Some(now + Duration::days(1));
        assert!(c.is_featured_at(now));
    }

    #[test]
    fn test_campaign_visibility() {
        let mut c = sample_campaign();
        assert!(c.is_public());
        c.deleted_at = Some(Utc::now());
        assert!(!c.is_public());
        c.deleted_at = None;
        c.status = CampaignStatus::Pending;
        assert!(!c.is_public());
    }
}
