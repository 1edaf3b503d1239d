use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "campaigns")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub platform_id: i64,
    pub slug: String,
    /// pending | published | rejected | expired
    pub status: String,
    pub free_credit: String,
    pub credit_value_cents: Option<i64>,
    pub start_at: Option<DateTimeUtc>,
    pub end_at: Option<DateTimeUtc>,
    #[sea_orm(column_type = "Text")]
    pub official_link: String,
    /// JSON 数组文本，例如 `["gpt-4o","claude-3"]`
    #[sea_orm(column_type = "Text")]
    pub ai_models: String,
    /// easy | medium | hard
    pub difficulty: String,
    pub is_featured: bool,
    pub featured_until: Option<DateTimeUtc>,
    pub reaction_score: i32,
    pub like_count: i32,
    pub dislike_count: i32,
    pub bookmark_count: i32,
    pub comment_count: i32,
    pub participant_count: i32,
    pub submitted_by: Option<String>,
    pub reviewed_by: Option<String>,
    pub reviewed_at: Option<DateTimeUtc>,
    #[sea_orm(column_type = "Text", nullable)]
    pub reject_reason: Option<String>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
    pub deleted_at: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
