//! 统一 API 错误码定义

use serde_repr::{Deserialize_repr, Serialize_repr};
use ts_rs::TS;

use crate::config::TS_EXPORT_PATH;
use crate::errors::CreditHubError;

/// API 错误码枚举
///
/// 使用 serde_repr 序列化为数字，ts-rs 自动生成 TypeScript 类型。
/// 按千位分域：
/// - 0: 成功
/// - 1000-1099: 通用错误
/// - 2000-2099: 认证错误
/// - 3000-3099: 活动错误
/// - 4000-4099: 导入错误
/// - 5000-5099: 平台与标签错误
/// - 6000-6099: 互动错误
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize_repr, Deserialize_repr, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
#[ts(rename = "ErrorCode")]
#[ts(repr(enum))]
#[repr(i32)]
pub enum ErrorCode {
    // 成功
    Success = 0,

    // 通用错误 1000-1099
    BadRequest = 1000,
    Unauthorized = 1001,
    Forbidden = 1003,
    NotFound = 1004,
    InternalServerError = 1005,
    Conflict = 1009,
    InvalidDateFormat = 1012,
    ServiceUnavailable = 1030,

    // 认证错误 2000-2099
    AuthFailed = 2000,
    TokenExpired = 2001,
    TokenInvalid = 2002,
    RateLimitExceeded = 2004,
    AdminRequired = 2005,

    // 活动错误 3000-3099
    CampaignNotFound = 3000,
    CampaignSlugTaken = 3001,
    CampaignInvalid = 3002,
    CampaignInvalidTransition = 3003,
    CampaignInvalidDate = 3004,

    // 导入错误 4000-4099
    ImportFailed = 4000,
    ImportParseError = 4005,

    // 平台与标签错误 5000-5099
    CatalogNotFound = 5000,
    CatalogSlugTaken = 5001,
    CatalogInvalid = 5002,

    // 互动错误 6000-6099
    CommentNotFound = 6000,
    CommentForbidden = 6001,
    InteractionInvalid = 6002,
}

/// 错误码所属的业务域，决定 NotFound / Conflict 等映射到哪个细分码
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiDomain {
    General,
    Campaign,
    Moderation,
    Catalog,
    Interaction,
    Import,
}

impl ErrorCode {
    /// 按业务域把 `CreditHubError` 映射为错误码
    pub fn for_error(err: &CreditHubError, domain: ApiDomain) -> Self {
        use ApiDomain as D;
        use CreditHubError as E;

        match (err, domain) {
            (E::NotFound(_), D::Campaign | D::Moderation) => ErrorCode::CampaignNotFound,
            (E::NotFound(_), D::Catalog) => ErrorCode::CatalogNotFound,
            (E::NotFound(_), D::Interaction) => ErrorCode::CommentNotFound,
            (E::NotFound(_), _) => ErrorCode::NotFound,

            (E::Conflict(_), D::Campaign) => ErrorCode::CampaignSlugTaken,
            (E::Conflict(_), D::Moderation) => ErrorCode::CampaignInvalidTransition,
            (E::Conflict(_), D::Catalog) => ErrorCode::CatalogSlugTaken,
            (E::Conflict(_), _) => ErrorCode::Conflict,

            (E::Validation(_), D::Campaign | D::Moderation) => ErrorCode::CampaignInvalid,
            (E::Validation(_), D::Catalog) => ErrorCode::CatalogInvalid,
            (E::Validation(_), D::Interaction) => ErrorCode::InteractionInvalid,
            (E::Validation(_), D::Import) => ErrorCode::ImportFailed,
            (E::Validation(_), D::General) => ErrorCode::BadRequest,

            (E::DateParse(_), D::Campaign | D::Moderation) => ErrorCode::CampaignInvalidDate,
            (E::DateParse(_), _) => ErrorCode::InvalidDateFormat,

            (E::Forbidden(_), D::Interaction) => ErrorCode::CommentForbidden,
            (E::Forbidden(_), _) => ErrorCode::Forbidden,
            (E::Unauthorized(_), _) => ErrorCode::Unauthorized,

            (E::Serialization(_), D::Import) => ErrorCode::ImportParseError,
            (E::Serialization(_), _) => ErrorCode::BadRequest,

            (E::DatabaseConnection(_), _) => ErrorCode::ServiceUnavailable,
            (E::FileOperation(_), D::Import) => ErrorCode::ImportFailed,
            (E::DatabaseConfig(_) | E::DatabaseOperation(_) | E::FileOperation(_), _) => {
                ErrorCode::InternalServerError
            }
        }
    }
}

impl From<CreditHubError> for ErrorCode {
    fn from(err: CreditHubError) -> Self {
        ErrorCode::for_error(&err, ApiDomain::General)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_serializes_as_number() {
        assert_eq!(serde_json::to_string(&ErrorCode::Success).unwrap(), "0");
        assert_eq!(
            serde_json::to_string(&ErrorCode::CampaignNotFound).unwrap(),
            "3000"
        );
        let parsed: ErrorCode = serde_json::from_str("6001").unwrap();
        assert_eq!(parsed, ErrorCode::CommentForbidden);
    }

    #[test]
    fn test_domain_specific_mapping() {
        let not_found = CreditHubError::not_found("x");
        assert_eq!(
            ErrorCode::for_error(&not_found, ApiDomain::Campaign),
            ErrorCode::CampaignNotFound
        );
        assert_eq!(
            ErrorCode::for_error(&not_found, ApiDomain::Catalog),
            ErrorCode::CatalogNotFound
        );
        assert_eq!(ErrorCode::from(not_found), ErrorCode::NotFound);

        let conflict = CreditHubError::conflict("slug");
        assert_eq!(
            ErrorCode::for_error(&conflict, ApiDomain::Campaign),
            ErrorCode::CampaignSlugTaken
        );
        assert_eq!(
            ErrorCode::for_error(&conflict, ApiDomain::Moderation),
            ErrorCode::CampaignInvalidTransition
        );
        assert_eq!(
            ErrorCode::for_error(&conflict, ApiDomain::Catalog),
            ErrorCode::CatalogSlugTaken
        );

        let forbidden = CreditHubError::forbidden("not yours");
        assert_eq!(
            ErrorCode::for_error(&forbidden, ApiDomain::Interaction),
            ErrorCode::CommentForbidden
        );
        assert_eq!(
            ErrorCode::for_error(&forbidden, ApiDomain::General),
            ErrorCode::Forbidden
        );
    }

    #[test]
    fn test_infrastructure_errors() {
        assert_eq!(
            ErrorCode::from(CreditHubError::database_connection("down")),
            ErrorCode::ServiceUnavailable
        );
        assert_eq!(
            ErrorCode::for_error(
                &CreditHubError::serialization("bad json"),
                ApiDomain::Import
            ),
            ErrorCode::ImportParseError
        );
        assert_eq!(
            ErrorCode::from(CreditHubError::database_operation("boom")),
            ErrorCode::InternalServerError
        );
    }
}
