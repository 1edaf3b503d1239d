//! Admin API 活动管理与审核

use actix_web::{Responder, Result as ActixResult, web};
use chrono::Utc;
use serde::Deserialize;
use tracing::{info, trace};

use crate::api::middleware::AuthUser;
use crate::api::services::error_code::ApiDomain;
use crate::api::services::helpers::{api_created, api_result, paginated_result};
use crate::api::services::public::LocaleQuery;
use crate::services::{
    AppServices, CampaignQuery, CreateCampaignRequest, FeatureRequest, ListScope, RejectRequest,
    UpdateCampaignRequest,
};

#[derive(Debug, Deserialize)]
pub struct CreateOptions {
    /// 管理员创建默认直接发布
    #[serde(default = "default_publish")]
    pub publish: bool,
}

fn default_publish() -> bool {
    true
}

#[derive(Debug, Deserialize)]
pub struct TranslationBody {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub is_ai_generated: bool,
}

/// GET /campaigns：任意状态，可含已删除
pub async fn list_campaigns(
    query: web::Query<CampaignQuery>,
    services: web::Data<AppServices>,
) -> ActixResult<impl Responder> {
    trace!("Admin API: list campaigns {:?}", query);
    let result = services
        .campaigns
        .list(&query, ListScope::Admin, None)
        .await;
    Ok(paginated_result(result, ApiDomain::Campaign))
}

/// GET /campaigns/pending
pub async fn list_pending(
    query: web::Query<CampaignQuery>,
    services: web::Data<AppServices>,
) -> ActixResult<impl Responder> {
    Ok(paginated_result(
        services.moderation.pending(&query).await,
        ApiDomain::Campaign,
    ))
}

/// GET /campaigns/{id}
pub async fn get_campaign(
    path: web::Path<i64>,
    query: web::Query<LocaleQuery>,
    services: web::Data<AppServices>,
) -> ActixResult<impl Responder> {
    let result = services
        .campaigns
        .get_admin(path.into_inner(), query.locale.as_deref())
        .await;
    Ok(api_result(result, ApiDomain::Campaign))
}

/// POST /campaigns
pub async fn create_campaign(
    admin: AuthUser,
    options: web::Query<CreateOptions>,
    body: web::Json<CreateCampaignRequest>,
    services: web::Data<AppServices>,
) -> ActixResult<impl Responder> {
    let result = services
        .campaigns
        .create_as_admin(&admin.id, body.into_inner(), options.publish)
        .await;
    Ok(api_created(result, ApiDomain::Campaign))
}

/// PUT /campaigns/{id}
pub async fn update_campaign(
    path: web::Path<i64>,
    body: web::Json<UpdateCampaignRequest>,
    services: web::Data<AppServices>,
) -> ActixResult<impl Responder> {
    let result = services
        .campaigns
        .update(path.into_inner(), body.into_inner())
        .await;
    Ok(api_result(result, ApiDomain::Campaign))
}

/// DELETE /campaigns/{id}：软删除
pub async fn delete_campaign(
    admin: AuthUser,
    path: web::Path<i64>,
    services: web::Data<AppServices>,
) -> ActixResult<impl Responder> {
    let id = path.into_inner();
    info!("Admin API: '{}' deletes campaign {}", admin.id, id);
    let result = services
        .campaigns
        .delete(id)
        .await
        .map(|()| serde_json::json!({ "id": id, "deleted": true }));
    Ok(api_result(result, ApiDomain::Campaign))
}

/// POST /campaigns/{id}/approve
pub async fn approve_campaign(
    admin: AuthUser,
    path: web::Path<i64>,
    services: web::Data<AppServices>,
) -> ActixResult<impl Responder> {
    let result = services
        .moderation
        .approve(path.into_inner(), &admin.id)
        .await;
    Ok(api_result(result, ApiDomain::Moderation))
}

/// POST /campaigns/{id}/reject
pub async fn reject_campaign(
    admin: AuthUser,
    path: web::Path<i64>,
    body: web::Json<RejectRequest>,
    services: web::Data<AppServices>,
) -> ActixResult<impl Responder> {
    let result = services
        .moderation
        .reject(path.into_inner(), &admin.id, &body.reason)
        .await;
    Ok(api_result(result, ApiDomain::Moderation))
}

/// POST /campaigns/{id}/expire
pub async fn expire_campaign(
    path: web::Path<i64>,
    services: web::Data<AppServices>,
) -> ActixResult<impl Responder> {
    Ok(api_result(
        services.moderation.expire(path.into_inner()).await,
        ApiDomain::Moderation,
    ))
}

/// POST /campaigns/{id}/feature
pub async fn feature_campaign(
    path: web::Path<i64>,
    body: Option<web::Json<FeatureRequest>>,
    services: web::Data<AppServices>,
) -> ActixResult<impl Responder> {
    // 空 body 使用默认推荐天数
    let req = body.map(web::Json::into_inner).unwrap_or_default();
    let result = services.moderation.feature(path.into_inner(), &req).await;
    Ok(api_result(result, ApiDomain::Moderation))
}

/// DELETE /campaigns/{id}/feature
pub async fn unfeature_campaign(
    path: web::Path<i64>,
    services: web::Data<AppServices>,
) -> ActixResult<impl Responder> {
    Ok(api_result(
        services.moderation.unfeature(path.into_inner()).await,
        ApiDomain::Moderation,
    ))
}

/// PUT /campaigns/{id}/translations/{locale}
pub async fn upsert_translation(
    path: web::Path<(i64, String)>,
    body: web::Json<TranslationBody>,
    services: web::Data<AppServices>,
) -> ActixResult<impl Responder> {
    let (id, locale) = path.into_inner();
    let result = services
        .campaigns
        .upsert_translation(
            id,
            &locale,
            &body.title,
            &body.description,
            body.is_ai_generated,
        )
        .await;
    Ok(api_result(result, ApiDomain::Campaign))
}

/// POST /sweep：立即执行过期与推荐位清理
pub async fn run_sweep(
    admin: AuthUser,
    services: web::Data<AppServices>,
) -> ActixResult<impl Responder> {
    info!("Admin API: '{}' triggered a sweep", admin.id);
    Ok(api_result(
        services.moderation.sweep(Utc::now()).await,
        ApiDomain::Moderation,
    ))
}
