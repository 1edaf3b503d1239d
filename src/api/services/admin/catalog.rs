//! Admin API 平台与标签目录管理

use actix_web::{Responder, Result as ActixResult, web};

use crate::api::services::error_code::ApiDomain;
use crate::api::services::helpers::{api_created, api_result};
use crate::api::services::public::{ConditionKindQuery, TagKindQuery};
use crate::services::{
    AppServices, CreateConditionTagRequest, CreatePlatformRequest, CreateTagRequest,
    PlatformStatusRequest, UpdateConditionTagRequest, UpdatePlatformRequest, UpdateTagRequest,
};

fn deleted(id: i64) -> serde_json::Value {
    serde_json::json!({ "id": id, "deleted": true })
}

// ============ 平台 ============

/// GET /platforms：包含停用平台
pub async fn list_platforms(services: web::Data<AppServices>) -> ActixResult<impl Responder> {
    Ok(api_result(
        services.platforms.list(false).await,
        ApiDomain::Catalog,
    ))
}

/// POST /platforms
pub async fn create_platform(
    body: web::Json<CreatePlatformRequest>,
    services: web::Data<AppServices>,
) -> ActixResult<impl Responder> {
    Ok(api_created(
        services.platforms.create(body.into_inner()).await,
        ApiDomain::Catalog,
    ))
}

/// PUT /platforms/{id}
pub async fn update_platform(
    path: web::Path<i64>,
    body: web::Json<UpdatePlatformRequest>,
    services: web::Data<AppServices>,
) -> ActixResult<impl Responder> {
    Ok(api_result(
        services
            .platforms
            .update(path.into_inner(), body.into_inner())
            .await,
        ApiDomain::Catalog,
    ))
}

/// POST /platforms/{id}/status
pub async fn set_platform_status(
    path: web::Path<i64>,
    body: web::Json<PlatformStatusRequest>,
    services: web::Data<AppServices>,
) -> ActixResult<impl Responder> {
    Ok(api_result(
        services
            .platforms
            .set_status(path.into_inner(), body.status)
            .await,
        ApiDomain::Catalog,
    ))
}

// ============ 标签 ============

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

/// POST /tags
pub async fn create_tag(
    body: web::Json<CreateTagRequest>,
    services: web::Data<AppServices>,
) -> ActixResult<impl Responder> {
    Ok(api_created(
        services.tags.create_tag(body.into_inner()).await,
        ApiDomain::Catalog,
    ))
}

/// PUT /tags/{id}
pub async fn update_tag(
    path: web::Path<i64>,
    body: web::Json<UpdateTagRequest>,
    services: web::Data<AppServices>,
) -> ActixResult<impl Responder> {
    Ok(api_result(
        services
            .tags
            .update_tag(path.into_inner(), body.into_inner())
            .await,
        ApiDomain::Catalog,
    ))
}

/// DELETE /tags/{id}
pub async fn delete_tag(
    path: web::Path<i64>,
    services: web::Data<AppServices>,
) -> ActixResult<impl Responder> {
    let id = path.into_inner();
    Ok(api_result(
        services.tags.delete_tag(id).await.map(|()| deleted(id)),
        ApiDomain::Catalog,
    ))
}

// ============ 条件标签 ============

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

/// POST /condition-tags
pub async fn create_condition_tag(
    body: web::Json<CreateConditionTagRequest>,
    services: web::Data<AppServices>,
) -> ActixResult<impl Responder> {
    Ok(api_created(
        services.tags.create_condition_tag(body.into_inner()).await,
        ApiDomain::Catalog,
    ))
}

/// PUT /condition-tags/{id}
pub async fn update_condition_tag(
    path: web::Path<i64>,
    body: web::Json<UpdateConditionTagRequest>,
    services: web::Data<AppServices>,
) -> ActixResult<impl Responder> {
    Ok(api_result(
        services
            .tags
            .update_condition_tag(path.into_inner(), body.into_inner())
            .await,
        ApiDomain::Catalog,
    ))
}

/// DELETE /condition-tags/{id}
pub async fn delete_condition_tag(
    path: web::Path<i64>,
    services: web::Data<AppServices>,
) -> ActixResult<impl Responder> {
    let id = path.into_inner();
    Ok(api_result(
        services
            .tags
            .delete_condition_tag(id)
            .await
            .map(|()| deleted(id)),
        ApiDomain::Catalog,
    ))
}

/// POST /tags/seed：补齐默认标签
pub async fn seed_tags(services: web::Data<AppServices>) -> ActixResult<impl Responder> {
    Ok(api_result(
        services.tags.seed_defaults().await,
        ApiDomain::Catalog,
    ))
}
