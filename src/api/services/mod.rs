pub mod admin;
pub mod error_code;
pub mod health;
mod helpers;
pub mod public;
pub mod routes;
mod types;
pub mod user;

pub use error_code::{ApiDomain, ErrorCode};
pub use health::{AppStartTime, HealthService, health_routes};
pub use helpers::{
    api_created, api_result, error_from_credithub, error_response, json_config, json_response,
    paginated_result, path_config, query_config, success_response,
};
pub use routes::{WriteLimiterConfig, public_routes, write_limiter_config};
pub use types::*;
