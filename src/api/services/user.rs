//! 登录用户 API：投稿、收藏、反应、评论、参与
//!
//! 所有 handler 都要求 `AuthUser`，未登录时 extractor 返回 401。

use actix_web::{Responder, Result as ActixResult, web};
use tracing::{info, trace};

use crate::api::middleware::AuthUser;
use crate::services::{
    AppServices, BatchStateRequest, CampaignQuery, CreateCampaignRequest, CreateCommentRequest,
    EmojiRequest, ReactionRequest, UpdateCommentRequest,
};

use super::error_code::ApiDomain;
use super::helpers::{api_created, api_result, paginated_result};

/// POST /campaigns：用户投稿，进入待审核
pub async fn submit_campaign(
    user: AuthUser,
    body: web::Json<CreateCampaignRequest>,
    services: web::Data<AppServices>,
) -> ActixResult<impl Responder> {
    info!("User API: '{}' submits a campaign", user.id);
    let result = services.campaigns.submit(&user.id, body.into_inner()).await;
    Ok(api_created(result, ApiDomain::Campaign))
}

/// GET /me/submissions
pub async fn list_submissions(
    user: AuthUser,
    query: web::Query<CampaignQuery>,
    services: web::Data<AppServices>,
) -> ActixResult<impl Responder> {
    let result = services.campaigns.list_submitted(&user.id, &query).await;
    Ok(paginated_result(result, ApiDomain::Campaign))
}

/// GET /bookmarks
pub async fn list_bookmarks(
    user: AuthUser,
    query: web::Query<CampaignQuery>,
    services: web::Data<AppServices>,
) -> ActixResult<impl Responder> {
    trace!("User API: bookmarks of '{}'", user.id);
    let result = services.campaigns.list_bookmarked(&user.id, &query).await;
    Ok(paginated_result(result, ApiDomain::Campaign))
}

/// POST /bookmarks/{id}
pub async fn add_bookmark(
    user: AuthUser,
    path: web::Path<i64>,
    services: web::Data<AppServices>,
) -> ActixResult<impl Responder> {
    let result = services
        .interactions
        .add_bookmark(path.into_inner(), &user.id)
        .await;
    Ok(api_result(result, ApiDomain::Campaign))
}

/// DELETE /bookmarks/{id}
pub async fn remove_bookmark(
    user: AuthUser,
    path: web::Path<i64>,
    services: web::Data<AppServices>,
) -> ActixResult<impl Responder> {
    let result = services
        .interactions
        .remove_bookmark(path.into_inner(), &user.id)
        .await;
    Ok(api_result(result, ApiDomain::Campaign))
}

/// PUT /reactions/{id}
pub async fn set_reaction(
    user: AuthUser,
    path: web::Path<i64>,
    body: web::Json<ReactionRequest>,
    services: web::Data<AppServices>,
) -> ActixResult<impl Responder> {
    let result = services
        .interactions
        .set_reaction(path.into_inner(), &user.id, Some(body.kind))
        .await;
    Ok(api_result(result, ApiDomain::Campaign))
}

/// DELETE /reactions/{id}
pub async fn clear_reaction(
    user: AuthUser,
    path: web::Path<i64>,
    services: web::Data<AppServices>,
) -> ActixResult<impl Responder> {
    let result = services
        .interactions
        .set_reaction(path.into_inner(), &user.id, None)
        .await;
    Ok(api_result(result, ApiDomain::Campaign))
}

/// POST /reactions/{id}/emoji
pub async fn toggle_emoji(
    user: AuthUser,
    path: web::Path<i64>,
    body: web::Json<EmojiRequest>,
    services: web::Data<AppServices>,
) -> ActixResult<impl Responder> {
    let result = services
        .interactions
        .toggle_emoji(path.into_inner(), &user.id, &body.emoji)
        .await;
    Ok(api_result(result, ApiDomain::Interaction))
}

/// POST /reactions/batch
pub async fn batch_state(
    user: AuthUser,
    body: web::Json<BatchStateRequest>,
    services: web::Data<AppServices>,
) -> ActixResult<impl Responder> {
    let result = services
        .interactions
        .batch_state(&user.id, &body.campaign_ids)
        .await;
    Ok(api_result(result, ApiDomain::Interaction))
}

/// POST /campaigns/{id}/comments
pub async fn create_comment(
    user: AuthUser,
    path: web::Path<i64>,
    body: web::Json<CreateCommentRequest>,
    services: web::Data<AppServices>,
) -> ActixResult<impl Responder> {
    let result = services
        .interactions
        .create_comment(path.into_inner(), &user.id, body.into_inner())
        .await;
    Ok(api_created(result, ApiDomain::Interaction))
}

/// PUT /comments/{id}
pub async fn edit_comment(
    user: AuthUser,
    path: web::Path<i64>,
    body: web::Json<UpdateCommentRequest>,
    services: web::Data<AppServices>,
) -> ActixResult<impl Responder> {
    let result = services
        .interactions
        .edit_comment(path.into_inner(), &user.id, body.into_inner())
        .await;
    Ok(api_result(result, ApiDomain::Interaction))
}

/// DELETE /comments/{id}：作者本人或管理员
pub async fn delete_comment(
    user: AuthUser,
    path: web::Path<i64>,
    services: web::Data<AppServices>,
) -> ActixResult<impl Responder> {
    let id = path.into_inner();
    let result = services
        .interactions
        .delete_comment(id, &user.id, user.is_admin())
        .await
        .map(|()| serde_json::json!({ "id": id, "deleted": true }));
    Ok(api_result(result, ApiDomain::Interaction))
}

/// POST /participations/{id}
pub async fn join_campaign(
    user: AuthUser,
    path: web::Path<i64>,
    services: web::Data<AppServices>,
) -> ActixResult<impl Responder> {
    let result = services
        .interactions
        .set_participation(path.into_inner(), &user.id, true)
        .await;
    Ok(api_result(result, ApiDomain::Campaign))
}

/// DELETE /participations/{id}
pub async fn leave_campaign(
    user: AuthUser,
    path: web::Path<i64>,
    services: web::Data<AppServices>,
) -> ActixResult<impl Responder> {
    let result = services
        .interactions
        .set_participation(path.into_inner(), &user.id, false)
        .await;
    Ok(api_result(result, ApiDomain::Campaign))
}
