//! 活动列表的过滤与排序组合
//!
//! 每个过滤项独立地追加一个谓词，全部以 AND 连接：
//! 标签类过滤对每个 slug 生成一个 `EXISTS` 子查询（要求全部命中），
//! 关键词搜索通过 `LOWER(x) LIKE` 同时匹配平台名与任意语言的标题/描述。

use chrono::{DateTime, Utc};
use sea_orm::sea_query::{
    Expr, Func, IntoColumnRef, LikeExpr, NullOrdering, Order, Query, SelectStatement,
};
use sea_orm::{ColumnTrait, Condition, EntityTrait, ExprTrait, QueryOrder, Select};

use crate::storage::models::{CampaignSort, CampaignStatus, Difficulty};
use migration::entities::{
    bookmark, campaign, campaign_condition_tag, campaign_tag, campaign_translation,
    condition_tag, platform, tag,
};

/// 活动列表过滤条件
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CampaignFilter {
    /// 为空表示不限状态（仅管理端）
    pub statuses: Vec<CampaignStatus>,
    pub platform_ids: Vec<i64>,
    pub platform_slug: Option<String>,
    /// 每个 slug 都必须挂在活动上
    pub tag_slugs: Vec<String>,
    pub condition_tag_slugs: Vec<String>,
    pub difficulty: Option<Difficulty>,
    pub search: Option<String>,
    pub featured_only: bool,
    pub include_expired: bool,
    pub include_deleted: bool,
    pub bookmarked_by: Option<String>,
    pub submitted_by: Option<String>,
    pub sort: CampaignSort,
}

impl Default for CampaignFilter {
    fn default() -> Self {
        Self::public()
    }
}

impl CampaignFilter {
    /// 公开列表的默认条件：仅已发布、排除过期与已删除
    pub fn public() -> Self {
        Self {
            statuses: vec![CampaignStatus::Published],
            platform_ids: Vec::new(),
            platform_slug: None,
            tag_slugs: Vec::new(),
            condition_tag_slugs: Vec::new(),
            difficulty: None,
            search: None,
            featured_only: false,
            include_expired: false,
            include_deleted: false,
            bookmarked_by: None,
            submitted_by: None,
            sort: CampaignSort::Latest,
        }
    }

    /// 管理端默认条件：任意状态，包含过期
    pub fn admin() -> Self {
        Self {
            statuses: Vec::new(),
            include_expired: true,
            ..Self::public()
        }
    }

    /// 放开过期限制；公开列表同时纳入已被清理为 expired 的活动
    pub fn with_expired(mut self) -> Self {
        self.include_expired = true;
        if self.statuses == [CampaignStatus::Published] {
            self.statuses.push(CampaignStatus::Expired);
        }
        self
    }

    /// COUNT 缓存 key；排序不影响总数，不参与
    pub fn cache_key(&self) -> String {
        format!(
            "count:st={:?}:p={:?}:ps={:?}:t={:?}:c={:?}:d={:?}:q={:?}:f={}:e={}:del={}:b={:?}:u={:?}",
            self.statuses,
            self.platform_ids,
            self.platform_slug,
            self.tag_slugs,
            self.condition_tag_slugs,
            self.difficulty,
            self.search.as_deref().map(search_patterns),
            self.featured_only,
            self.include_expired,
            self.include_deleted,
            self.bookmarked_by,
            self.submitted_by,
        )
    }
}

/// 关键词的小写形式
///
/// SQLite 的 `LOWER()` 只折叠 ASCII，PostgreSQL/MySQL 折叠完整 Unicode，
/// 两种形式不同时都参与匹配。
fn search_patterns(raw: &str) -> Vec<String> {
    let trimmed = raw.trim();
    let full = trimmed.to_lowercase();
    let ascii = trimmed.to_ascii_lowercase();
    if full == ascii {
        vec![full]
    } else {
        vec![full, ascii]
    }
}

/// `LOWER(col) LIKE '%p%'`，任一形式命中即可
fn lower_contains<C>(col: C, patterns: &[String]) -> Condition
where
    C: IntoColumnRef + Clone,
{
    patterns.iter().fold(Condition::any(), |cond, pattern| {
        cond.add(Expr::expr(Func::lower(Expr::col(col.clone()))).like(contains_pattern(pattern)))
    })
}

/// 转义 LIKE 通配符，配合 `ESCAPE '\'` 使用
pub fn escape_like(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

fn contains_pattern(keyword: &str) -> LikeExpr {
    LikeExpr::new(format!("%{}%", escape_like(keyword))).escape('\\')
}

/// `EXISTS (SELECT 1 FROM campaign_tags JOIN tags ... WHERE tags.slug = ?)`
fn tag_exists(slug: &str) -> Expr {
    let sub: SelectStatement = Query::select()
        .expr(Expr::val(1))
        .from(campaign_tag::Entity)
        .inner_join(
            tag::Entity,
            Expr::col((tag::Entity, tag::Column::Id))
                .equals((campaign_tag::Entity, campaign_tag::Column::TagId)),
        )
        .and_where(
            Expr::col((campaign_tag::Entity, campaign_tag::Column::CampaignId))
                .equals((campaign::Entity, campaign::Column::Id)),
        )
        .and_where(Expr::col((tag::Entity, tag::Column::Slug)).eq(slug))
        .to_owned();
    Expr::exists(sub)
}

fn condition_tag_exists(slug: &str) -> Expr {
    let sub: SelectStatement = Query::select()
        .expr(Expr::val(1))
        .from(campaign_condition_tag::Entity)
        .inner_join(
            condition_tag::Entity,
            Expr::col((condition_tag::Entity, condition_tag::Column::Id)).equals((
                campaign_condition_tag::Entity,
                campaign_condition_tag::Column::ConditionTagId,
            )),
        )
        .and_where(
            Expr::col((
                campaign_condition_tag::Entity,
                campaign_condition_tag::Column::CampaignId,
            ))
            .equals((campaign::Entity, campaign::Column::Id)),
        )
        .and_where(Expr::col((condition_tag::Entity, condition_tag::Column::Slug)).eq(slug))
        .to_owned();
    Expr::exists(sub)
}

/// 平台名或任意翻译的标题/描述包含关键词（大小写不敏感）
fn search_condition(keyword: &str) -> Condition {
    let patterns = search_patterns(keyword);

    let platform_match: SelectStatement = Query::select()
        .expr(Expr::val(1))
        .from(platform::Entity)
        .and_where(
            Expr::col((platform::Entity, platform::Column::Id))
                .equals((campaign::Entity, campaign::Column::PlatformId)),
        )
        .cond_where(lower_contains(
            (platform::Entity, platform::Column::Name),
            &patterns,
        ))
        .to_owned();

    let translation_match: SelectStatement = Query::select()
        .expr(Expr::val(1))
        .from(campaign_translation::Entity)
        .and_where(
            Expr::col((
                campaign_translation::Entity,
                campaign_translation::Column::CampaignId,
            ))
            .equals((campaign::Entity, campaign::Column::Id)),
        )
        .cond_where(
            Condition::any()
                .add(lower_contains(
                    (
                        campaign_translation::Entity,
                        campaign_translation::Column::Title,
                    ),
                    &patterns,
                ))
                .add(lower_contains(
                    (
                        campaign_translation::Entity,
                        campaign_translation::Column::Description,
                    ),
                    &patterns,
                )),
        )
        .to_owned();

    Condition::any()
        .add(Expr::exists(platform_match))
        .add(Expr::exists(translation_match))
}

/// 由过滤条件生成 WHERE 子句
pub fn build_condition(filter: &CampaignFilter, now: DateTime<Utc>) -> Condition {
    let mut condition = Condition::all();

    if !filter.include_deleted {
        condition = condition.add(campaign::Column::DeletedAt.is_null());
    }

    if !filter.statuses.is_empty() {
        condition = condition.add(
            campaign::Column::Status.is_in(filter.statuses.iter().map(|s| s.as_ref().to_string())),
        );
    }

    if !filter.include_expired {
        condition = condition
            .add(campaign::Column::Status.ne(CampaignStatus::Expired.as_ref()))
            .add(
                Condition::any()
                    .add(campaign::Column::EndAt.is_null())
                    .add(campaign::Column::EndAt.gte(now)),
            );
    }

    if !filter.platform_ids.is_empty() {
        condition = condition.add(campaign::Column::PlatformId.is_in(filter.platform_ids.clone()));
    }

    if let Some(slug) = filter.platform_slug.as_deref() {
        condition = condition.add(
            campaign::Column::PlatformId.in_subquery(
                Query::select()
                    .column(platform::Column::Id)
                    .from(platform::Entity)
                    .and_where(Expr::col(platform::Column::Slug).eq(slug))
                    .to_owned(),
            ),
        );
    }

    for slug in &filter.tag_slugs {
        condition = condition.add(tag_exists(slug));
    }

    for slug in &filter.condition_tag_slugs {
        condition = condition.add(condition_tag_exists(slug));
    }

    if let Some(difficulty) = filter.difficulty {
        condition = condition.add(campaign::Column::Difficulty.eq(difficulty.as_ref()));
    }

    if let Some(keyword) = filter.search.as_deref()
        && !keyword.trim().is_empty()
    {
        condition = condition.add(search_condition(keyword));
    }

    if filter.featured_only {
        condition = condition.add(campaign::Column::IsFeatured.eq(true)).add(
            Condition::any()
                .add(campaign::Column::FeaturedUntil.is_null())
                .add(campaign::Column::FeaturedUntil.gt(now)),
        );
    }

    if let Some(user_id) = filter.bookmarked_by.as_deref() {
        let sub: SelectStatement = Query::select()
            .expr(Expr::val(1))
            .from(bookmark::Entity)
            .and_where(
                Expr::col((bookmark::Entity, bookmark::Column::CampaignId)).equals((
                    campaign::Entity,
                    campaign::Column::Id,
                )),
            )
            .and_where(Expr::col((bookmark::Entity, bookmark::Column::UserId)).eq(user_id))
            .to_owned();
        condition = condition.add(Expr::exists(sub));
    }

    if let Some(user_id) = filter.submitted_by.as_deref() {
        condition = condition.add(campaign::Column::SubmittedBy.eq(user_id));
    }

    // expiring_soon 只看尚未截止的活动
    if filter.sort == CampaignSort::ExpiringSoon {
        condition = condition.add(
            Condition::any()
                .add(campaign::Column::EndAt.is_null())
                .add(campaign::Column::EndAt.gte(now)),
        );
    }

    condition
}

/// 应用排序；同值时按 id 倒序保证翻页稳定
pub fn apply_sort(
    select: Select<campaign::Entity>,
    sort: CampaignSort,
) -> Select<campaign::Entity> {
    let select = match sort {
        CampaignSort::Latest => select.order_by_desc(campaign::Column::CreatedAt),
        CampaignSort::Popular => select.order_by(
            Expr::col((campaign::Entity, campaign::Column::ReactionScore)).add(Expr::col((
                campaign::Entity,
                campaign::Column::BookmarkCount,
            ))),
            Order::Desc,
        ),
        CampaignSort::ExpiringSoon => select.order_by_with_nulls(
            campaign::Column::EndAt,
            Order::Asc,
            NullOrdering::Last,
        ),
        CampaignSort::HighestCredit => select.order_by_with_nulls(
            campaign::Column::CreditValueCents,
            Order::Desc,
            NullOrdering::Last,
        ),
    };
    select.order_by_desc(campaign::Column::Id)
}

/// 列表查询：条件 + 排序
pub fn filtered_select(filter: &CampaignFilter, now: DateTime<Utc>) -> Select<campaign::Entity> {
    use sea_orm::QueryFilter;
    apply_sort(
        campaign::Entity::find().filter(build_condition(filter, now)),
        filter.sort,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{DbBackend, QueryTrait};

    fn sql(filter: &CampaignFilter) -> String {
        filtered_select(filter, Utc::now())
            .build(DbBackend::Postgres)
            .to_string()
    }

    #[test]
    fn test_public_defaults() {
        let s = sql(&CampaignFilter::public());
        assert!(s.contains(r#""campaigns"."deleted_at" IS NULL"#), "{s}");
        assert!(s.contains(r#""campaigns"."status" IN ('published')"#), "{s}");
        assert!(s.contains(r#""campaigns"."status" <> 'expired'"#), "{s}");
        assert!(s.contains(r#""campaigns"."end_at" IS NULL"#), "{s}");
        assert!(
            s.contains(r#"ORDER BY "campaigns"."created_at" DESC, "campaigns"."id" DESC"#),
            "{s}"
        );
    }

    #[test]
    fn test_public_with_expired_admits_expired_status() {
        let filter = CampaignFilter::public().with_expired();
        assert_eq!(
            filter.statuses,
            vec![CampaignStatus::Published, CampaignStatus::Expired]
        );
        let s = sql(&filter);
        assert!(
            s.contains(r#""campaigns"."status" IN ('published', 'expired')"#),
            "{s}"
        );
        assert!(!s.contains(r#""campaigns"."status" <> 'expired'"#), "{s}");

        // 管理端不限状态，保持为空
        let admin = CampaignFilter::admin().with_expired();
        assert!(admin.statuses.is_empty());
    }

    #[test]
    fn test_admin_filter_has_no_status_or_expiry_predicate() {
        let filter = CampaignFilter {
            include_deleted: true,
            ..CampaignFilter::admin()
        };
        let s = sql(&filter);
        assert!(!s.contains("WHERE"), "{s}");
    }

    #[test]
    fn test_each_tag_gets_its_own_exists() {
        let filter = CampaignFilter {
            tag_slugs: vec!["llm".into(), "image".into()],
            condition_tag_slugs: vec!["phone-verification".into()],
            ..CampaignFilter::public()
        };
        let s = sql(&filter);
        assert_eq!(s.matches("EXISTS").count(), 3, "{s}");
        assert!(s.contains(r#""tags"."slug" = 'llm'"#), "{s}");
        assert!(s.contains(r#""tags"."slug" = 'image'"#), "{s}");
        assert!(
            s.contains(r#""condition_tags"."slug" = 'phone-verification'"#),
            "{s}"
        );
    }

    #[test]
    fn test_search_is_case_insensitive_across_platform_and_translations() {
        let filter = CampaignFilter {
            search: Some("  GPT_4 ".into()),
            ..CampaignFilter::public()
        };
        let s = sql(&filter);
        assert!(s.contains(r#"LOWER("platforms"."name")"#), "{s}");
        assert!(s.contains(r#"LOWER("campaign_translations"."title")"#), "{s}");
        assert!(
            s.contains(r#"LOWER("campaign_translations"."description")"#),
            "{s}"
        );
        assert!(s.contains(r"'%gpt\\_4%'") || s.contains(r"'%gpt\_4%'"), "{s}");
    }

    #[test]
    fn test_non_ascii_search_matches_both_lowercase_forms() {
        assert_eq!(search_patterns(" Claude "), vec!["claude"]);
        assert_eq!(search_patterns("Éclair"), vec!["éclair", "Éclair"]);

        let filter = CampaignFilter {
            search: Some("Éclair".into()),
            ..CampaignFilter::public()
        };
        let s = sql(&filter);
        assert!(s.contains("'%éclair%'"), "{s}");
        assert!(s.contains("'%Éclair%'"), "{s}");
    }

    #[test]
    fn test_blank_search_is_ignored() {
        let filter = CampaignFilter {
            search: Some("   ".into()),
            ..CampaignFilter::public()
        };
        assert!(!sql(&filter).contains("LIKE"));
    }

    #[test]
    fn test_sorts() {
        let mut filter = CampaignFilter::public();

        filter.sort = CampaignSort::Popular;
        let s = sql(&filter);
        assert!(
            s.contains(r#"ORDER BY "campaigns"."reaction_score" + "campaigns"."bookmark_count" DESC"#),
            "{s}"
        );

        filter.sort = CampaignSort::ExpiringSoon;
        let s = sql(&filter);
        assert!(s.contains(r#""campaigns"."end_at" ASC NULLS LAST"#), "{s}");

        filter.sort = CampaignSort::HighestCredit;
        let s = sql(&filter);
        assert!(
            s.contains(r#""campaigns"."credit_value_cents" DESC NULLS LAST"#),
            "{s}"
        );
        assert!(s.ends_with(r#""campaigns"."id" DESC"#), "{s}");
    }

    #[test]
    fn test_platform_featured_and_bookmarks() {
        let filter = CampaignFilter {
            platform_slug: Some("openai".into()),
            featured_only: true,
            bookmarked_by: Some("user-1".into()),
            difficulty: Some(Difficulty::Hard),
            ..CampaignFilter::public()
        };
        let s = sql(&filter);
        assert!(s.contains(r#""platforms"."slug" = 'openai'"#), "{s}");
        assert!(s.contains(r#""campaigns"."is_featured" = TRUE"#), "{s}");
        assert!(s.contains(r#""bookmarks"."user_id" = 'user-1'"#), "{s}");
        assert!(s.contains(r#""campaigns"."difficulty" = 'hard'"#), "{s}");
    }

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("100%_off\\"), "100\\%\\_off\\\\");
        assert_eq!(escape_like("plain"), "plain");
    }

    #[test]
    fn test_cache_key_ignores_sort_and_search_case() {
        let a = CampaignFilter {
            search: Some("Claude".into()),
            sort: CampaignSort::Popular,
            ..CampaignFilter::public()
        };
        let b = CampaignFilter {
            search: Some(" claude".into()),
            ..CampaignFilter::public()
        };
        assert_eq!(a.cache_key(), b.cache_key());
        assert_ne!(a.cache_key(), CampaignFilter::admin().cache_key());
    }
}
