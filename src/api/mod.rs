//! HTTP API
//!
//! - `{public_prefix}`：公开浏览 + 登录用户操作（可选认证）
//! - `{admin_prefix}/v1`：管理端（需要管理员 token）
//! - `{health_prefix}`：健康检查

pub mod constants;
pub mod jwt;
pub mod middleware;
pub mod services;

use actix_web::web;

use middleware::Authentication;
use services::admin::admin_v1_routes;
use services::{
    WriteLimiterConfig, health_routes, json_config, path_config, public_routes, query_config,
};

/// 三个路由作用域的前缀
#[derive(Clone, Debug)]
pub struct ApiPrefixes {
    pub public: String,
    pub admin: String,
    pub health: String,
}

impl ApiPrefixes {
    pub fn from_config() -> Self {
        let config = crate::config::get_config();
        Self {
            public: config.api.public_prefix.clone(),
            admin: config.api.admin_prefix.clone(),
            health: config.api.health_prefix.clone(),
        }
    }
}

/// 注册全部 API 路由
///
/// 调用方负责注入 `web::Data<AppServices>` 与 `web::Data<AppStartTime>`。
pub fn configure(cfg: &mut web::ServiceConfig, prefixes: &ApiPrefixes, limiter: &WriteLimiterConfig) {
    cfg.app_data(json_config())
        .app_data(query_config())
        .app_data(path_config())
        .service(
            web::scope(&prefixes.admin)
                .wrap(Authentication::admin())
                .service(admin_v1_routes()),
        )
        .service(web::scope(&prefixes.health).service(health_routes()))
        .service(
            web::scope(&prefixes.public)
                .wrap(Authentication::optional())
                .service(public_routes(limiter)),
        );
}
