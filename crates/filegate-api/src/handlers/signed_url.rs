use crate::auth::bearer_token;
use crate::error::{ErrorResponse, HttpAppError, ValidatedJson};
use crate::services::{SignedUrlRequest, SignedUrlResponse};
use crate::state::AppState;
use axum::{extract::State, http::HeaderMap, response::IntoResponse, Json};
use std::sync::Arc;

/// Issue a time-limited download URL for a stored object.
#[utoipa::path(
    post,
    path = "/signed-url",
    tag = "retrieval",
    request_body = SignedUrlRequest,
    responses(
        (status = 200, description = "Signed URL issued", body = SignedUrlResponse),
        (status = 400, description = "Missing path or invalid expiry", body = ErrorResponse),
        (status = 500, description = "Storage gateway error", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, headers, request), fields(path = ?request.path))]
pub async fn create_signed_url(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    ValidatedJson(request): ValidatedJson<SignedUrlRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    let response = state
        .retrieval
        .issue(bearer_token(&headers), request)
        .await?;
    Ok(Json(response))
}
