//! Admin API 服务模块
//!
//! 所有端点位于 `{admin_prefix}/v1` 下，需要 `role=admin` 的 token：
//! - 活动管理与审核（通过、驳回、推荐、过期、翻译）
//! - 平台、标签、条件标签目录
//! - 批量导入

mod campaigns;
mod catalog;
mod import;
pub mod routes;

pub use campaigns::{CreateOptions, TranslationBody};
pub use routes::admin_v1_routes;
