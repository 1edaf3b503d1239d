//! 公开 API：活动浏览、平台与标签目录、评论读取
//!
//! 这些端点允许匿名访问；携带合法 token 时附带当前用户的互动状态。

use actix_web::{Responder, Result as ActixResult, web};
use serde::Deserialize;
use tracing::trace;

use crate::api::middleware::AuthUser;
use crate::services::{AppServices, CampaignQuery};
use crate::storage::{ConditionKind, TagKind};

use super::error_code::ApiDomain;
use super::helpers::{api_result, paginated_result};

#[derive(Debug, Default, Deserialize)]
pub struct LocaleQuery {
    pub locale: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct TagKindQuery {
    pub kind: Option<TagKind>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ConditionKindQuery {
    pub kind: Option<ConditionKind>,
}

fn viewer_id(user: &Option<AuthUser>) -> Option<&str> {
    user.as_ref().map(|u| u.id.as_str())
}

/// GET /campaigns
pub async fn list_campaigns(
    query: web::Query<CampaignQuery>,
    user: Option<AuthUser>,
    services: web::Data<AppServices>,
) -> ActixResult<impl Responder> {
    trace!("Public API: list campaigns {:?}", query);
    let result = services
        .campaigns
        .list_public(&query, viewer_id(&user))
        .await;
    Ok(paginated_result(result, ApiDomain::Campaign))
}

/// GET /campaigns/featured
pub async fn list_featured(
    query: web::Query<LocaleQuery>,
    user: Option<AuthUser>,
    services: web::Data<AppServices>,
) -> ActixResult<impl Responder> {
    let result = services
        .campaigns
        .list_featured(query.locale.as_deref(), viewer_id(&user))
        .await;
    Ok(api_result(result, ApiDomain::Campaign))
}

/// GET /campaigns/{slug}
pub async fn get_campaign(
    path: web::Path<String>,
    query: web::Query<LocaleQuery>,
    user: Option<AuthUser>,
    services: web::Data<AppServices>,
) -> ActixResult<impl Responder> {
    let slug = path.into_inner();
    trace!("Public API: campaign detail '{}'", slug);
    let result = services
        .campaigns
        .get_public(&slug, query.locale.as_deref(), viewer_id(&user))
        .await;
    Ok(api_result(result, ApiDomain::Campaign))
}

/// GET /campaigns/{id}/comments
pub async fn list_comments(
    path: web::Path<i64>,
    services: web::Data<AppServices>,
) -> ActixResult<impl Responder> {
    let result = services.interactions.list_comments(path.into_inner()).await;
    Ok(api_result(result, ApiDomain::Campaign))
}

/// GET /platforms
pub async fn list_platforms(services: web::Data<AppServices>) -> ActixResult<impl Responder> {
    Ok(api_result(
        services.platforms.list(true).await,
        ApiDomain::Catalog,
    ))
}

/// GET /platforms/{slug}
pub async fn get_platform(
    path: web::Path<String>,
    services: web::Data<AppServices>,
) -> ActixResult<impl Responder> {
    Ok(api_result(
        services.platforms.get_public(&path.into_inner()).await,
        ApiDomain::Catalog,
    ))
}

/// GET /tags
pub async fn list_tags(
    query: web::Query<TagKindQuery>,
    services: web::Data<AppServices>,
) -> ActixResult<impl Responder> {
    Ok(api_result(
        services.tags.list_tags(query.kind).await,
        ApiDomain::Catalog,
    ))
}

/// GET /condition-tags
pub async fn list_condition_tags(
    query: web::Query<ConditionKindQuery>,
    services: web::Data<AppServices>,
) -> ActixResult<impl Responder> {
    Ok(api_result(
        services.tags.list_condition_tags(query.kind).await,
        ApiDomain::Catalog,
    ))
}
