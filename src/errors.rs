use std::fmt;

use actix_web::http::StatusCode;

#[derive(Debug, Clone)]
pub enum CreditHubError {
    DatabaseConfig(String),
    DatabaseConnection(String),
    DatabaseOperation(String),
    FileOperation(String),
    Validation(String),
    NotFound(String),
    Conflict(String),
    Unauthorized(String),
    Forbidden(String),
    Serialization(String),
    DateParse(String),
}

impl CreditHubError {
    /// 获取错误代码
    pub fn code(&self) -> &'static str {
        match self {
            CreditHubError::DatabaseConfig(_) => "E001",
            CreditHubError::DatabaseConnection(_) => "E002",
            CreditHubError::DatabaseOperation(_) => "E003",
            CreditHubError::FileOperation(_) => "E004",
            CreditHubError::Validation(_) => "E005",
            CreditHubError::NotFound(_) => "E006",
            CreditHubError::Conflict(_) => "E007",
            CreditHubError::Unauthorized(_) => "E008",
            CreditHubError::Forbidden(_) => "E009",
            CreditHubError::Serialization(_) => "E010",
            CreditHubError::DateParse(_) => "E011",
        }
    }

    /// 获取错误类型名称
    pub fn error_type(&self) -> &'static str {
        match self {
            CreditHubError::DatabaseConfig(_) => "Database Configuration Error",
            CreditHubError::DatabaseConnection(_) => "Database Connection Error",
            CreditHubError::DatabaseOperation(_) => "Database Operation Error",
            CreditHubError::FileOperation(_) => "File Operation Error",
            CreditHubError::Validation(_) => "Validation Error",
            CreditHubError::NotFound(_) => "Resource Not Found",
            CreditHubError::Conflict(_) => "Conflict",
            CreditHubError::Unauthorized(_) => "Unauthorized",
            CreditHubError::Forbidden(_) => "Forbidden",
            CreditHubError::Serialization(_) => "Serialization Error",
            CreditHubError::DateParse(_) => "Date Parse Error",
        }
    }

    /// 获取错误详情
    pub fn message(&self) -> &str {
        match self {
            CreditHubError::DatabaseConfig(msg)
            | CreditHubError::DatabaseConnection(msg)
            | CreditHubError::DatabaseOperation(msg)
            | CreditHubError::FileOperation(msg)
            | CreditHubError::Validation(msg)
            | CreditHubError::NotFound(msg)
            | CreditHubError::Conflict(msg)
            | CreditHubError::Unauthorized(msg)
            | CreditHubError::Forbidden(msg)
            | CreditHubError::Serialization(msg)
            | CreditHubError::DateParse(msg) => msg,
        }
    }

    /// 映射到 HTTP 状态码
    pub fn http_status(&self) -> StatusCode {
        match self {
            CreditHubError::Validation(_) | CreditHubError::DateParse(_) => {
                StatusCode::BAD_REQUEST
            }
            CreditHubError::NotFound(_) => StatusCode::NOT_FOUND,
            CreditHubError::Conflict(_) => StatusCode::CONFLICT,
            CreditHubError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            CreditHubError::Forbidden(_) => StatusCode::FORBIDDEN,
            CreditHubError::Serialization(_) => StatusCode::UNPROCESSABLE_ENTITY,
            CreditHubError::DatabaseConnection(_) => StatusCode::SERVICE_UNAVAILABLE,
            CreditHubError::DatabaseConfig(_)
            | CreditHubError::DatabaseOperation(_)
            | CreditHubError::FileOperation(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// 格式化为彩色输出（用于 Server 模式启动失败）
    pub fn format_colored(&self) -> String {
        use colored::Colorize;
        format!(
            "{} {} {}\n  {}",
            "[ERROR]".red().bold(),
            self.code().yellow(),
            self.error_type().red(),
            self.message().white()
        )
    }

    /// 格式化为简洁输出（用于 CLI 模式）
    pub fn format_simple(&self) -> String {
        format!("{}: {}", self.error_type(), self.message())
    }
}

impl fmt::Display for CreditHubError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_simple())
    }
}

impl std::error::Error for CreditHubError {}

// 便捷的构造函数
impl CreditHubError {
    pub fn database_config<T: Into<String>>(msg: T) -> Self {
        CreditHubError::DatabaseConfig(msg.into())
    }

    pub fn database_connection<T: Into<String>>(msg: T) -> Self {
        CreditHubError::DatabaseConnection(msg.into())
    }

    pub fn database_operation<T: Into<String>>(msg: T) -> Self {
        CreditHubError::DatabaseOperation(msg.into())
    }

    pub fn file_operation<T: Into<String>>(msg: T) -> Self {
        CreditHubError::FileOperation(msg.into())
    }

    pub fn validation<T: Into<String>>(msg: T) -> Self {
        CreditHubError::Validation(msg.into())
    }

    pub fn not_found<T: Into<String>>(msg: T) -> Self {
        CreditHubError::NotFound(msg.into())
    }

    pub fn conflict<T: Into<String>>(msg: T) -> Self {
        CreditHubError::Conflict(msg.into())
    }

    pub fn unauthorized<T: Into<String>>(msg: T) -> Self {
        CreditHubError::Unauthorized(msg.into())
    }

    pub fn forbidden<T: Into<String>>(msg: T) -> Self {
        CreditHubError::Forbidden(msg.into())
    }

    pub fn serialization<T: Into<String>>(msg: T) -> Self {
        CreditHubError::Serialization(msg.into())
    }

    pub fn date_parse<T: Into<String>>(msg: T) -> Self {
        CreditHubError::DateParse(msg.into())
    }
}

// 为常见的错误类型实现 From trait
impl From<sea_orm::DbErr> for CreditHubError {
    fn from(err: sea_orm::DbErr) -> Self {
        match err {
            sea_orm::DbErr::RecordNotFound(msg) => CreditHubError::NotFound(msg),
            sea_orm::DbErr::ConnectionAcquire(e) => {
                CreditHubError::DatabaseConnection(e.to_string())
            }
            other => match other.sql_err() {
                Some(sea_orm::SqlErr::UniqueConstraintViolation(msg)) => {
                    CreditHubError::Conflict(msg)
                }
                Some(sea_orm::SqlErr::ForeignKeyConstraintViolation(msg)) => {
                    CreditHubError::Validation(msg)
                }
                _ => CreditHubError::DatabaseOperation(other.to_string()),
            },
        }
    }
}

impl From<std::io::Error> for CreditHubError {
    fn from(err: std::io::Error) -> Self {
        CreditHubError::FileOperation(err.to_string())
    }
}

impl From<serde_json::Error> for CreditHubError {
    fn from(err: serde_json::Error) -> Self {
        CreditHubError::Serialization(err.to_string())
    }
}

impl From<csv::Error> for CreditHubError {
    fn from(err: csv::Error) -> Self {
        CreditHubError::Serialization(err.to_string())
    }
}

impl From<chrono::ParseError> for CreditHubError {
    fn from(err: chrono::ParseError) -> Self {
        CreditHubError::DateParse(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, CreditHubError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_status_mapping() {
        assert_eq!(
            CreditHubError::validation("bad").http_status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            CreditHubError::not_found("x").http_status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            CreditHubError::conflict("slug").http_status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            CreditHubError::forbidden("no").http_status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            CreditHubError::database_operation("boom").http_status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_record_not_found_maps_to_not_found() {
        let err: CreditHubError = sea_orm::DbErr::RecordNotFound("campaign 7".into()).into();
        assert!(matches!(err, CreditHubError::NotFound(ref m) if m == "campaign 7"));
    }

    #[test]
    fn test_format_simple() {
        let err = CreditHubError::validation("slug is empty");
        assert_eq!(err.format_simple(), "Validation Error: slug is empty");
        assert_eq!(err.to_string(), err.format_simple());
        assert_eq!(err.code(), "E005");
    }
}
