//! Bearer JWT 认证中间件
//!
//! - `Optional`：有合法 token 时注入 `AuthUser`，否则匿名放行；
//!   需要登录的 handler 通过 `AuthUser` 参数拒绝匿名请求
//! - `Admin`：必须携带 `role=admin` 的合法 token

use actix_service::{Service, Transform};
use actix_web::{
    Error, FromRequest, HttpMessage, HttpRequest, HttpResponse,
    body::EitherBody,
    dev::{Payload, ServiceRequest, ServiceResponse},
    http::{Method, StatusCode},
};
use futures_util::future::{LocalBoxFuture, Ready, ready};
use std::rc::Rc;
use tracing::{debug, info, trace};

use crate::api::constants::BEARER_PREFIX;
use crate::api::jwt::{Role, get_jwt_service};
use crate::api::services::{ErrorCode, error_response};
use crate::errors::CreditHubError;

/// 已认证用户，由中间件写入 request extensions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub id: String,
    pub role: Role,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// handler 参数中使用 `AuthUser` 即要求登录；`Option<AuthUser>` 为可选
impl FromRequest for AuthUser {
    type Error = CreditHubError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(
            req.extensions()
                .get::<AuthUser>()
                .cloned()
                .ok_or_else(|| CreditHubError::unauthorized("Authentication required")),
        )
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AuthLevel {
    Optional,
    Admin,
}

/// 认证中间件工厂
#[derive(Clone)]
pub struct Authentication {
    level: AuthLevel,
}

impl Authentication {
    pub fn optional() -> Self {
        Self {
            level: AuthLevel::Optional,
        }
    }

    pub fn admin() -> Self {
        Self {
            level: AuthLevel::Admin,
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for Authentication
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = AuthenticationMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthenticationMiddleware {
            service: Rc::new(service),
            level: self.level,
        }))
    }
}

pub struct AuthenticationMiddleware<S> {
    service: Rc<S>,
    level: AuthLevel,
}

impl<S> AuthenticationMiddleware<S> {
    /// 从 Authorization header 提取 Bearer token
    fn extract_bearer_token(req: &ServiceRequest) -> Option<&str> {
        req.headers()
            .get("Authorization")
            .and_then(|h| h.to_str().ok())
            .and_then(|s| s.strip_prefix(BEARER_PREFIX))
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    /// 解析 token；无 token 为 Ok(None)，token 非法为 Err
    fn authenticate(req: &ServiceRequest) -> Result<Option<AuthUser>, ErrorCode> {
        let Some(token) = Self::extract_bearer_token(req) else {
            return Ok(None);
        };

        match get_jwt_service().validate_access_token(token) {
            Ok(claims) => {
                trace!("Bearer token accepted for '{}'", claims.sub);
                Ok(Some(AuthUser {
                    id: claims.sub,
                    role: claims.role,
                }))
            }
            Err(e) => {
                info!("Bearer token validation failed: {}", e);
                match e.kind() {
                    jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                        Err(ErrorCode::TokenExpired)
                    }
                    _ => Err(ErrorCode::TokenInvalid),
                }
            }
        }
    }

    fn reject<B>(
        req: ServiceRequest,
        status: StatusCode,
        code: ErrorCode,
        message: &str,
    ) -> ServiceResponse<EitherBody<B>> {
        req.into_response(error_response(status, code, message).map_into_right_body())
    }
}

impl<S, B> Service<ServiceRequest> for AuthenticationMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(
        &self,
        ctx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.service.poll_ready(ctx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let srv = self.service.clone();
        let level = self.level;

        Box::pin(async move {
            // CORS 预检
            if req.method() == Method::OPTIONS {
                return Ok(req.into_response(HttpResponse::NoContent().finish().map_into_right_body()));
            }

            let user = match Self::authenticate(&req) {
                Ok(user) => user,
                Err(code) if level == AuthLevel::Optional => {
                    debug!("Ignoring invalid bearer token on optional route ({:?})", code);
                    None
                }
                Err(code) => {
                    return Ok(Self::reject(
                        req,
                        StatusCode::UNAUTHORIZED,
                        code,
                        "Unauthorized: Invalid or expired token",
                    ));
                }
            };

            match (level, &user) {
                (AuthLevel::Admin, None) => {
                    return Ok(Self::reject(
                        req,
                        StatusCode::UNAUTHORIZED,
                        ErrorCode::Unauthorized,
                        "Unauthorized: Missing bearer token",
                    ));
                }
                (AuthLevel::Admin, Some(user)) if !user.is_admin() => {
                    info!("User '{}' denied access to admin route {}", user.id, req.path());
                    return Ok(Self::reject(
                        req,
                        StatusCode::FORBIDDEN,
                        ErrorCode::AdminRequired,
                        "Forbidden: Admin role required",
                    ));
                }
                _ => {}
            }

            if let Some(user) = user {
                req.extensions_mut().insert(user);
            }

            let response = srv.call(req).await?.map_into_left_body();
            Ok(response)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::jwt::JwtService;
    use actix_web::{App, test, web};

    async fn whoami(user: Option<AuthUser>) -> HttpResponse {
        HttpResponse::Ok().body(user.map(|u| u.id).unwrap_or_else(|| "anonymous".to_string()))
    }

    fn token(role: Role) -> String {
        // 与全局配置同源的密钥
        get_jwt_service()
            .generate_access_token("tester", role)
            .unwrap()
    }

    #[actix_rt::test]
    async fn test_optional_allows_anonymous() {
        let app = test::init_service(
            App::new()
                .wrap(Authentication::optional())
                .route("/", web::get().to(whoami)),
        )
        .await;

        let resp = test::call_service(&app, test::TestRequest::get().uri("/").to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body = test::read_body(resp).await;
        assert_eq!(body, "anonymous");
    }

    #[actix_rt::test]
    async fn test_optional_ignores_garbage_token() {
        let app = test::init_service(
            App::new()
                .wrap(Authentication::optional())
                .route("/", web::get().to(whoami)),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/")
            .insert_header(("Authorization", "Bearer not-a-jwt"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
    }

    async fn me(user: AuthUser) -> HttpResponse {
        HttpResponse::Ok().body(user.id)
    }

    #[actix_rt::test]
    async fn test_auth_user_extractor_requires_token() {
        let app = test::init_service(
            App::new()
                .wrap(Authentication::optional())
                .route("/me", web::get().to(me)),
        )
        .await;

        let resp =
            test::call_service(&app, test::TestRequest::get().uri("/me").to_request()).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

        let req = test::TestRequest::get()
            .uri("/me")
            .insert_header(("Authorization", format!("Bearer {}", token(Role::User))))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(test::read_body(resp).await, "tester");
    }

    #[actix_rt::test]
    async fn test_admin_level_rejects_plain_user() {
        let app = test::init_service(
            App::new()
                .wrap(Authentication::admin())
                .route("/", web::get().to(whoami)),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/")
            .insert_header(("Authorization", format!("Bearer {}", token(Role::User))))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);

        let req = test::TestRequest::get()
            .uri("/")
            .insert_header(("Authorization", format!("Bearer {}", token(Role::Admin))))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[actix_rt::test]
    async fn test_token_from_other_secret_is_unauthorized() {
        let foreign = JwtService::new("someone-elses-secret-0123456789", 5)
            .generate_access_token("mallory", Role::Admin)
            .unwrap();
        let app = test::init_service(
            App::new()
                .wrap(Authentication::admin())
                .route("/", web::get().to(whoami)),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/")
            .insert_header(("Authorization", format!("Bearer {}", foreign)))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }
}
