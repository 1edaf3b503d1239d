//! HTTP API tests
//!
//! The full route tree is mounted with `api::configure` over a temporary
//! SQLite database. Tokens are minted with the process-wide JWT service.

use std::net::SocketAddr;
use std::sync::Arc;

use actix_web::http::{StatusCode, header};
use actix_web::test::{self, TestRequest};
use actix_web::{App, web};
use serde_json::{Value, json};
use tempfile::TempDir;

use credithub::api::jwt::{Role, get_jwt_service};
use credithub::api::services::{AppStartTime, ErrorCode, write_limiter_config};
use credithub::api::{self, ApiPrefixes};
use credithub::services::AppServices;
use credithub::storage::SeaOrmStorage;

// =============================================================================
// Test Setup
// =============================================================================

const PEER: &str = "127.0.0.1:40000";

async fn test_services() -> (TempDir, Arc<AppServices>) {
    let dir = TempDir::new().unwrap();
    let url = format!("sqlite://{}?mode=rwc", dir.path().join("api.db").display());
    let storage = SeaOrmStorage::new(&url, "sqlite").await.unwrap();
    (dir, Arc::new(AppServices::new(Arc::new(storage))))
}

fn prefixes() -> ApiPrefixes {
    ApiPrefixes {
        public: "/api".to_string(),
        admin: "/admin".to_string(),
        health: "/health".to_string(),
    }
}

macro_rules! init_app {
    ($services:expr) => {{
        let prefixes = prefixes();
        let limiter = write_limiter_config();
        test::init_service(
            App::new()
                .app_data(web::Data::from($services.clone()))
                .app_data(web::Data::new(AppStartTime {
                    start_datetime: chrono::Utc::now(),
                }))
                .configure(|cfg| api::configure(cfg, &prefixes, &limiter)),
        )
        .await
    }};
}

fn user_token(id: &str) -> String {
    get_jwt_service()
        .generate_access_token(id, Role::User)
        .unwrap()
}

fn admin_token() -> String {
    get_jwt_service()
        .generate_access_token("root", Role::Admin)
        .unwrap()
}

fn bearer(token: &str) -> (header::HeaderName, String) {
    (header::AUTHORIZATION, format!("Bearer {}", token))
}

fn peer() -> SocketAddr {
    PEER.parse().unwrap()
}

fn campaign_body(title: &str) -> Value {
    json!({
        "platform_slug": "openai",
        "free_credit": "$5",
        "credit_value_cents": 500,
        "official_link": "https://platform.openai.com",
        "translations": [{ "locale": "en", "title": title, "description": "Trial credits" }]
    })
}

// =============================================================================
// Health
// =============================================================================

#[actix_rt::test]
async fn test_health_endpoints() {
    let (_dir, services) = test_services().await;
    let app = init_app!(services);

    let resp = test::call_service(&app, TestRequest::get().uri("/health").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["code"], 0);
    assert_eq!(body["data"]["status"], "healthy");
    assert_eq!(body["data"]["checks"]["storage"]["backend"], "sqlite");

    let resp =
        test::call_service(&app, TestRequest::get().uri("/health/ready").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = test::call_service(&app, TestRequest::get().uri("/health/live").to_request()).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
}

// =============================================================================
// Authentication
// =============================================================================

#[actix_rt::test]
async fn test_admin_scope_requires_admin_role() {
    let (_dir, services) = test_services().await;
    let app = init_app!(services);

    let resp = test::call_service(
        &app,
        TestRequest::get().uri("/admin/v1/campaigns").to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["code"], ErrorCode::Unauthorized as i32);

    let resp = test::call_service(
        &app,
        TestRequest::get()
            .uri("/admin/v1/campaigns")
            .insert_header(bearer(&user_token("alice")))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["code"], ErrorCode::AdminRequired as i32);

    let resp = test::call_service(
        &app,
        TestRequest::get()
            .uri("/admin/v1/campaigns")
            .insert_header(bearer("not-a-jwt"))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let resp = test::call_service(
        &app,
        TestRequest::get()
            .uri("/admin/v1/campaigns")
            .insert_header(bearer(&admin_token()))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
}

#[actix_rt::test]
async fn test_user_endpoints_require_login() {
    let (_dir, services) = test_services().await;
    let app = init_app!(services);

    let resp = test::call_service(&app, TestRequest::get().uri("/api/bookmarks").to_request()).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    // 公开端点忽略无效 token
    let resp = test::call_service(
        &app,
        TestRequest::get()
            .uri("/api/campaigns")
            .insert_header(bearer("garbage"))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = test::call_service(
        &app,
        TestRequest::get()
            .uri("/api/bookmarks")
            .insert_header(bearer(&user_token("alice")))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["pagination"]["total"], 0);
}

// =============================================================================
// End-to-end flow
// =============================================================================

#[actix_rt::test]
async fn test_submit_moderate_and_interact() {
    let (_dir, services) = test_services().await;
    let app = init_app!(services);
    let admin = admin_token();
    let alice = user_token("alice");

    // 管理员创建平台
    let resp = test::call_service(
        &app,
        TestRequest::post()
            .uri("/admin/v1/platforms")
            .insert_header(bearer(&admin))
            .set_json(json!({ "name": "OpenAI", "website": "https://openai.com" }))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    // 用户投稿
    let resp = test::call_service(
        &app,
        TestRequest::post()
            .uri("/api/campaigns")
            .peer_addr(peer())
            .insert_header(bearer(&alice))
            .set_json(campaign_body("OpenAI API trial"))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["data"]["status"], "pending");
    let id = body["data"]["id"].as_i64().unwrap();
    let slug = body["data"]["slug"].as_str().unwrap().to_string();

    // 待审核活动不公开
    let resp = test::call_service(
        &app,
        TestRequest::get()
            .uri(&format!("/api/campaigns/{}", slug))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["code"], ErrorCode::CampaignNotFound as i32);

    let resp = test::call_service(
        &app,
        TestRequest::get()
            .uri("/admin/v1/campaigns/pending")
            .insert_header(bearer(&admin))
            .to_request(),
    )
    .await;
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let resp = test::call_service(
        &app,
        TestRequest::post()
            .uri(&format!("/admin/v1/campaigns/{}/approve", id))
            .insert_header(bearer(&admin))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);

    // 重复审核通过是非法流转
    let resp = test::call_service(
        &app,
        TestRequest::post()
            .uri(&format!("/admin/v1/campaigns/{}/approve", id))
            .insert_header(bearer(&admin))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["code"], ErrorCode::CampaignInvalidTransition as i32);

    // 收藏与反应
    let resp = test::call_service(
        &app,
        TestRequest::post()
            .uri(&format!("/api/bookmarks/{}", id))
            .insert_header(bearer(&alice))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = test::call_service(
        &app,
        TestRequest::put()
            .uri(&format!("/api/reactions/{}", id))
            .insert_header(bearer(&alice))
            .set_json(json!({ "kind": "like" }))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["data"]["counters"]["like_count"], 1);

    let resp = test::call_service(
        &app,
        TestRequest::post()
            .uri("/api/reactions/batch")
            .insert_header(bearer(&alice))
            .set_json(json!({ "campaign_ids": [id] }))
            .to_request(),
    )
    .await;
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["data"][id.to_string()]["reaction"], "like");
    assert_eq!(body["data"][id.to_string()]["bookmarked"], true);

    // 带 token 的详情附带当前用户状态
    let resp = test::call_service(
        &app,
        TestRequest::get()
            .uri(&format!("/api/campaigns/{}", slug))
            .insert_header(bearer(&alice))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["data"]["viewer"]["bookmarked"], true);
    assert_eq!(body["data"]["counters"]["bookmark_count"], 1);

    // 评论
    let resp = test::call_service(
        &app,
        TestRequest::post()
            .uri(&format!("/api/campaigns/{}/comments", id))
            .peer_addr(peer())
            .insert_header(bearer(&alice))
            .set_json(json!({ "content": "Got the credits in a minute" }))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(resp).await;
    let comment_id = body["data"]["id"].as_i64().unwrap();

    let resp = test::call_service(
        &app,
        TestRequest::delete()
            .uri(&format!("/api/comments/{}", comment_id))
            .insert_header(bearer(&user_token("mallory")))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let resp = test::call_service(
        &app,
        TestRequest::get()
            .uri(&format!("/api/campaigns/{}/comments", id))
            .to_request(),
    )
    .await;
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["data"][0]["content"], "Got the credits in a minute");
}

#[actix_rt::test]
async fn test_public_listing_and_catalog() {
    let (_dir, services) = test_services().await;
    let app = init_app!(services);
    let admin = admin_token();

    for body in [
        json!({ "name": "OpenAI" }),
        json!({ "name": "Anthropic" }),
    ] {
        let resp = test::call_service(
            &app,
            TestRequest::post()
                .uri("/admin/v1/platforms")
                .insert_header(bearer(&admin))
                .set_json(body)
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::CREATED);
    }

    let resp = test::call_service(
        &app,
        TestRequest::post()
            .uri("/admin/v1/tags/seed")
            .insert_header(bearer(&admin))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);

    // 管理员创建默认直接发布
    let resp = test::call_service(
        &app,
        TestRequest::post()
            .uri("/admin/v1/campaigns")
            .insert_header(bearer(&admin))
            .set_json(campaign_body("Published by admin"))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["data"]["status"], "published");

    let resp = test::call_service(
        &app,
        TestRequest::post()
            .uri("/admin/v1/campaigns?publish=false")
            .insert_header(bearer(&admin))
            .set_json(campaign_body("Kept pending"))
            .to_request(),
    )
    .await;
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["data"]["status"], "pending");

    let resp = test::call_service(
        &app,
        TestRequest::get()
            .uri("/api/campaigns?platform=openai&page_size=10")
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["code"], 0);
    assert_eq!(body["pagination"]["total"], 1);
    assert_eq!(body["pagination"]["page_size"], 10);
    assert_eq!(body["data"][0]["title"], "Published by admin");
    assert!(body["data"][0]["viewer"].is_null());

    let resp = test::call_service(
        &app,
        TestRequest::get()
            .uri("/api/campaigns?sort=nonsense")
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = test::call_service(&app, TestRequest::get().uri("/api/platforms").to_request()).await;
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 2);

    let resp =
        test::call_service(&app, TestRequest::get().uri("/api/platforms/anthropic").to_request())
            .await;
    assert_eq!(resp.status(), StatusCode::OK);

    let resp =
        test::call_service(&app, TestRequest::get().uri("/api/platforms/nobody").to_request())
            .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["code"], ErrorCode::CatalogNotFound as i32);

    let resp = test::call_service(
        &app,
        TestRequest::get().uri("/api/condition-tags").to_request(),
    )
    .await;
    let body: Value = test::read_body_json(resp).await;
    assert!(!body["data"].as_array().unwrap().is_empty());
}

#[actix_rt::test]
async fn test_validation_errors() {
    let (_dir, services) = test_services().await;
    let app = init_app!(services);
    let alice = user_token("alice");

    // 平台不存在
    let resp = test::call_service(
        &app,
        TestRequest::post()
            .uri("/api/campaigns")
            .peer_addr(peer())
            .insert_header(bearer(&alice))
            .set_json(campaign_body("No platform"))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    // 非法 JSON
    let resp = test::call_service(
        &app,
        TestRequest::post()
            .uri("/api/campaigns")
            .peer_addr(peer())
            .insert_header(bearer(&alice))
            .insert_header((header::CONTENT_TYPE, "application/json"))
            .set_payload("{not json")
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["code"], ErrorCode::BadRequest as i32);

    // 空导入
    let resp = test::call_service(
        &app,
        TestRequest::post()
            .uri("/admin/v1/import")
            .insert_header(bearer(&admin_token()))
            .set_json(json!({ "mode": "skip" }))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["code"], ErrorCode::ImportFailed as i32);
}

#[actix_rt::test]
async fn test_admin_import_and_sweep() {
    let (_dir, services) = test_services().await;
    let app = init_app!(services);
    let admin = admin_token();

    let resp = test::call_service(
        &app,
        TestRequest::post()
            .uri("/admin/v1/import")
            .insert_header(bearer(&admin))
            .set_json(json!({
                "mode": "skip",
                "platforms": [{ "name": "Groq", "slug": "groq" }],
                "campaigns": [{
                    "platform_slug": "groq",
                    "slug": "groq-free-tier",
                    "free_credit": "Free tier",
                    "official_link": "https://console.groq.com",
                    "end_at": "2001-01-01",
                    "translations": [{ "locale": "en", "title": "Groq free tier" }]
                }]
            }))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["data"]["success"], 2);
    assert_eq!(body["data"]["failed"], 0);

    let resp = test::call_service(
        &app,
        TestRequest::post()
            .uri("/admin/v1/sweep")
            .insert_header(bearer(&admin))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["data"]["expired"], 1);

    // 过期活动仍可通过 slug 访问
    let resp = test::call_service(
        &app,
        TestRequest::get()
            .uri("/api/campaigns/groq-free-tier")
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["data"]["status"], "expired");
    assert_eq!(body["data"]["is_expired"], true);
}
