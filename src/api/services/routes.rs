//! 公开与用户 API 路由
//!
//! 两类端点共用 `{public_prefix}` 作用域：公开端点匿名可访问，
//! 用户端点通过 `AuthUser` extractor 要求登录。写入端点按 IP 限流。

use actix_governor::{Governor, GovernorConfig, GovernorConfigBuilder, PeerIpKeyExtractor};
use actix_web::web;
use governor::middleware::NoOpMiddleware;
use std::time::Duration;
use tracing::debug;

use super::public::{
    get_campaign, get_platform, list_campaigns, list_comments, list_condition_tags,
    list_featured, list_platforms, list_tags,
};
use super::user::{
    add_bookmark, batch_state, clear_reaction, create_comment, delete_comment, edit_comment,
    join_campaign, leave_campaign, list_bookmarks, list_submissions, remove_bookmark,
    set_reaction, submit_campaign, toggle_emoji,
};
use crate::config::get_config;

pub type WriteLimiterConfig = GovernorConfig<PeerIpKeyExtractor, NoOpMiddleware>;

/// 写入端点限流配置
///
/// 令牌按 `write_rate_per_minute` 均匀补充，突发上限 `write_burst`。
/// 同一配置创建的 Governor 共享令牌桶，超限返回 HTTP 429。
pub fn write_limiter_config() -> WriteLimiterConfig {
    let config = get_config();
    let rate = config.api.write_rate_per_minute.max(1);
    let burst = config.api.write_burst.max(1);

    debug!("Write rate limiter: {} req/min, burst {}", rate, burst);
    GovernorConfigBuilder::default()
        .period(Duration::from_millis(60_000 / u64::from(rate)))
        .burst_size(burst)
        .finish()
        .expect("Invalid rate limit config")
}

/// 公开 + 用户路由
pub fn public_routes(limiter: &WriteLimiterConfig) -> actix_web::Scope {
    web::scope("")
        // 活动
        .route("/campaigns", web::get().to(list_campaigns))
        .route(
            "/campaigns",
            web::post()
                .to(submit_campaign)
                .wrap(Governor::new(limiter)),
        )
        .route("/campaigns/featured", web::get().to(list_featured))
        .route("/campaigns/{slug}", web::get().to(get_campaign))
        .route("/campaigns/{id}/comments", web::get().to(list_comments))
        .route(
            "/campaigns/{id}/comments",
            web::post()
                .to(create_comment)
                .wrap(Governor::new(limiter)),
        )
        // 目录
        .route("/platforms", web::get().to(list_platforms))
        .route("/platforms/{slug}", web::get().to(get_platform))
        .route("/tags", web::get().to(list_tags))
        .route("/condition-tags", web::get().to(list_condition_tags))
        // 用户
        .route("/me/submissions", web::get().to(list_submissions))
        .route("/bookmarks", web::get().to(list_bookmarks))
        .route("/bookmarks/{id}", web::post().to(add_bookmark))
        .route("/bookmarks/{id}", web::delete().to(remove_bookmark))
        // batch 必须位于 /{id} 之前
        .route("/reactions/batch", web::post().to(batch_state))
        .route("/reactions/{id}", web::put().to(set_reaction))
        .route("/reactions/{id}", web::delete().to(clear_reaction))
        .route("/reactions/{id}/emoji", web::post().to(toggle_emoji))
        .route("/comments/{id}", web::put().to(edit_comment))
        .route("/comments/{id}", web::delete().to(delete_comment))
        .route("/participations/{id}", web::post().to(join_campaign))
        .route("/participations/{id}", web::delete().to(leave_campaign))
}
