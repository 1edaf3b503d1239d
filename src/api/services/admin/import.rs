//! Admin API 批量导入

use actix_web::http::StatusCode;
use actix_web::{Responder, Result as ActixResult, web};
use tracing::info;

use crate::api::middleware::AuthUser;
use crate::api::services::error_code::{ApiDomain, ErrorCode};
use crate::api::services::helpers::{api_result, error_response};
use crate::services::{AppServices, ImportRequest};

/// POST /import：JSON bundle，按 slug 幂等
pub async fn import_bundle(
    admin: AuthUser,
    body: web::Json<ImportRequest>,
    services: web::Data<AppServices>,
) -> ActixResult<impl Responder> {
    let ImportRequest { mode, bundle } = body.into_inner();

    if bundle.is_empty() {
        return Ok(error_response(
            StatusCode::BAD_REQUEST,
            ErrorCode::ImportFailed,
            "Import bundle is empty",
        ));
    }

    info!(
        "Admin API: '{}' imports {} items (mode {})",
        admin.id,
        bundle.len(),
        mode
    );
    Ok(api_result(
        services.imports.import_bundle(bundle, mode).await,
        ApiDomain::Import,
    ))
}
