//! Admin API 路由配置
//!
//! 将 /v1 下的路由按功能模块拆分。

use actix_web::web;

use super::campaigns::{
    approve_campaign, create_campaign, delete_campaign, expire_campaign, feature_campaign,
    get_campaign, list_campaigns, list_pending, reject_campaign, run_sweep, unfeature_campaign,
    update_campaign, upsert_translation,
};
use super::catalog::{
    create_condition_tag, create_platform, create_tag, delete_condition_tag, delete_tag,
    list_condition_tags, list_platforms, list_tags, seed_tags, set_platform_status,
    update_condition_tag, update_platform, update_tag,
};
use super::import::import_bundle;
use crate::api::constants::ADMIN_API_VERSION;

/// 活动管理路由 `/campaigns`
///
/// 包含：
/// - GET /campaigns - 列表（任意状态）
/// - GET /campaigns/pending - 待审核
/// - POST /campaigns - 创建
/// - GET/PUT/DELETE /campaigns/{id}
/// - POST /campaigns/{id}/approve|reject|expire
/// - POST/DELETE /campaigns/{id}/feature
/// - PUT /campaigns/{id}/translations/{locale}
pub fn campaigns_routes() -> actix_web::Scope {
    web::scope("/campaigns")
        .route("", web::get().to(list_campaigns))
        .route("", web::post().to(create_campaign))
        // 必须位于 /{id} 之前
        .route("/pending", web::get().to(list_pending))
        .route("/{id}", web::get().to(get_campaign))
        .route("/{id}", web::put().to(update_campaign))
        .route("/{id}", web::delete().to(delete_campaign))
        .route("/{id}/approve", web::post().to(approve_campaign))
        .route("/{id}/reject", web::post().to(reject_campaign))
        .route("/{id}/expire", web::post().to(expire_campaign))
        .route("/{id}/feature", web::post().to(feature_campaign))
        .route("/{id}/feature", web::delete().to(unfeature_campaign))
        .route(
            "/{id}/translations/{locale}",
            web::put().to(upsert_translation),
        )
}

/// 平台路由 `/platforms`
pub fn platforms_routes() -> actix_web::Scope {
    web::scope("/platforms")
        .route("", web::get().to(list_platforms))
        .route("", web::post().to(create_platform))
        .route("/{id}", web::put().to(update_platform))
        .route("/{id}/status", web::post().to(set_platform_status))
}

/// 标签路由 `/tags`
pub fn tags_routes() -> actix_web::Scope {
    web::scope("/tags")
        .route("", web::get().to(list_tags))
        .route("", web::post().to(create_tag))
        .route("/seed", web::post().to(seed_tags))
        .route("/{id}", web::put().to(update_tag))
        .route("/{id}", web::delete().to(delete_tag))
}

/// 条件标签路由 `/condition-tags`
pub fn condition_tags_routes() -> actix_web::Scope {
    web::scope("/condition-tags")
        .route("", web::get().to(list_condition_tags))
        .route("", web::post().to(create_condition_tag))
        .route("/{id}", web::put().to(update_condition_tag))
        .route("/{id}", web::delete().to(delete_condition_tag))
}

/// Admin API v1 路由
///
/// 组合所有子模块路由
pub fn admin_v1_routes() -> actix_web::Scope {
    web::scope(ADMIN_API_VERSION)
        .service(campaigns_routes())
        .service(platforms_routes())
        .service(tags_routes())
        .service(condition_tags_routes())
        .route("/import", web::post().to(import_bundle))
        .route("/sweep", web::post().to(run_sweep))
}
