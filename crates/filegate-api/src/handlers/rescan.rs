use crate::error::{ErrorResponse, HttpAppError, ValidatedJson};
use crate::services::{RescanRequest, RescanResult};
use crate::state::AppState;
use axum::{extract::State, response::IntoResponse, Extension, Json};
use filegate_core::models::Principal;
use std::sync::Arc;

/// Scan a stored object again and update its record.
#[utoipa::path(
    post,
    path = "/rescan",
    tag = "intake",
    request_body = RescanRequest,
    responses(
        (status = 200, description = "Scan fields updated", body = RescanResult),
        (status = 400, description = "Neither id nor path given", body = ErrorResponse),
        (status = 401, description = "Missing or invalid bearer token (when RESCAN_REQUIRE_AUTH is on)", body = ErrorResponse),
        (status = 404, description = "File not found", body = ErrorResponse),
        (status = 503, description = "Scanner unavailable", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[tracing::instrument(
    skip(state, principal, request),
    fields(
        principal = principal.as_ref().map(|Extension(p)| p.id.as_str()),
        file_id = ?request.id,
        operation = "rescan"
    )
)]
pub async fn rescan(
    State(state): State<Arc<AppState>>,
    principal: Option<Extension<Principal>>,
    ValidatedJson(request): ValidatedJson<RescanRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    let result = state.rescan.rescan(request).await?;
    Ok(Json(result))
}
