pub mod auth;
pub mod request_id;

pub use auth::{AuthLevel, AuthUser, Authentication};
pub use request_id::{RequestId, RequestIdMiddleware};
