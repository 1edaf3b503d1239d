//! API 帮助函数

use actix_web::http::StatusCode;
use actix_web::{HttpRequest, HttpResponse, ResponseError, error, web};
use serde::Serialize;
use tracing::{debug, error};

use crate::errors::CreditHubError;
use crate::services::Paginated;

use super::error_code::{ApiDomain, ErrorCode};
use super::types::{ApiResponse, PaginatedResponse};

/// 构建 JSON 响应
pub fn json_response<T: Serialize>(
    status: StatusCode,
    code: ErrorCode,
    message: impl Into<String>,
    data: Option<T>,
) -> HttpResponse {
    HttpResponse::build(status)
        .append_header(("Content-Type", "application/json; charset=utf-8"))
        .json(ApiResponse {
            code: code as i32,
            message: message.into(),
            data,
        })
}

/// 构建成功响应
pub fn success_response<T: Serialize>(data: T) -> HttpResponse {
    json_response(StatusCode::OK, ErrorCode::Success, "OK", Some(data))
}

/// 构建 201 Created 响应
pub fn created_response<T: Serialize>(data: T) -> HttpResponse {
    json_response(StatusCode::CREATED, ErrorCode::Success, "Created", Some(data))
}

/// 构建错误响应
pub fn error_response(status: StatusCode, error_code: ErrorCode, message: &str) -> HttpResponse {
    json_response::<()>(status, error_code, message, None)
}

/// 从 CreditHubError 构建错误响应（自动映射 HTTP 状态码和 ErrorCode）
pub fn error_from_credithub(err: &CreditHubError, domain: ApiDomain) -> HttpResponse {
    let status = err.http_status();
    if status.is_server_error() {
        error!("Request failed: {}", err);
    } else {
        debug!("Request rejected: {}", err);
    }
    error_response(status, ErrorCode::for_error(err, domain), err.message())
}

/// 统一 Result → HttpResponse 转换
///
/// 成功时返回 200 OK + JSON 数据，失败时按业务域映射 CreditHubError。
pub fn api_result<T, E>(result: Result<T, E>, domain: ApiDomain) -> HttpResponse
where
    T: Serialize,
    E: Into<CreditHubError>,
{
    match result {
        Ok(data) => success_response(data),
        Err(e) => error_from_credithub(&e.into(), domain),
    }
}

/// 同 `api_result`，成功时返回 201
pub fn api_created<T, E>(result: Result<T, E>, domain: ApiDomain) -> HttpResponse
where
    T: Serialize,
    E: Into<CreditHubError>,
{
    match result {
        Ok(data) => created_response(data),
        Err(e) => error_from_credithub(&e.into(), domain),
    }
}

/// 分页结果 → `{ code, message, data: [...], pagination }`
pub fn paginated_result<T: Serialize>(
    result: Result<Paginated<T>, CreditHubError>,
    domain: ApiDomain,
) -> HttpResponse {
    match result {
        Ok(page) => HttpResponse::Ok()
            .append_header(("Content-Type", "application/json; charset=utf-8"))
            .json(PaginatedResponse {
                code: ErrorCode::Success as i32,
                message: "OK".to_string(),
                data: page.items,
                pagination: page.pagination,
            }),
        Err(e) => error_from_credithub(&e, domain),
    }
}

/// extractor（如 `AuthUser`）失败时同样输出统一 JSON
impl ResponseError for CreditHubError {
    fn status_code(&self) -> StatusCode {
        self.http_status()
    }

    fn error_response(&self) -> HttpResponse {
        error_from_credithub(self, ApiDomain::General)
    }
}

/// JSON 请求体解析失败 → 400 + JSON
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(crate::api::constants::MAX_JSON_BODY_BYTES)
        .error_handler(|err: error::JsonPayloadError, _req: &HttpRequest| {
            let message = format!("Invalid JSON body: {}", err);
            let response = error_response(StatusCode::BAD_REQUEST, ErrorCode::BadRequest, &message);
            error::InternalError::from_response(err, response).into()
        })
}

/// Query string 解析失败 → 400 + JSON
pub fn query_config() -> web::QueryConfig {
    web::QueryConfig::default().error_handler(|err: error::QueryPayloadError, _req| {
        let message = format!("Invalid query string: {}", err);
        let response = error_response(StatusCode::BAD_REQUEST, ErrorCode::BadRequest, &message);
        error::InternalError::from_response(err, response).into()
    })
}

/// 路径参数解析失败（如 id 不是数字）→ 400 + JSON
pub fn path_config() -> web::PathConfig {
    web::PathConfig::default().error_handler(|err: error::PathError, _req| {
        let message = format!("Invalid path parameter: {}", err);
        let response = error_response(StatusCode::BAD_REQUEST, ErrorCode::BadRequest, &message);
        error::InternalError::from_response(err, response).into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;

    async fn body_json(resp: HttpResponse) -> serde_json::Value {
        let bytes = to_bytes(resp.into_body()).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[actix_rt::test]
    async fn test_success_envelope() {
        let resp = success_response(vec![1, 2, 3]);
        assert_eq!(resp.status(), StatusCode::OK);
        let json = body_json(resp).await;
        assert_eq!(json["code"], 0);
        assert_eq!(json["message"], "OK");
        assert_eq!(json["data"], serde_json::json!([1, 2, 3]));
    }

    #[actix_rt::test]
    async fn test_error_envelope_omits_data() {
        let err = CreditHubError::not_found("Campaign 9 not found");
        let resp = api_result::<(), _>(Err(err), ApiDomain::Campaign);
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let json = body_json(resp).await;
        assert_eq!(json["code"], ErrorCode::CampaignNotFound as i32);
        assert_eq!(json["message"], "Campaign 9 not found");
        assert!(json.get("data").is_none());
    }

    #[actix_rt::test]
    async fn test_paginated_envelope() {
        let page = Paginated {
            items: vec!["a", "b"],
            pagination: crate::services::PageInfo::new(1, 2, 5),
        };
        let resp = paginated_result(Ok(page), ApiDomain::Campaign);
        let json = body_json(resp).await;
        assert_eq!(json["data"], serde_json::json!(["a", "b"]));
        assert_eq!(json["pagination"]["total"], 5);
        assert_eq!(json["pagination"]["total_pages"], 3);
    }
}
