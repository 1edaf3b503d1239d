//! API 模块常量定义

/// Bearer token 前缀
pub const BEARER_PREFIX: &str = "Bearer ";

/// 请求 ID 响应头
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// JSON 请求体上限（导入包可能较大）
pub const MAX_JSON_BODY_BYTES: usize = 4 * 1024 * 1024;

/// Admin API 版本前缀
pub const ADMIN_API_VERSION: &str = "/v1";
