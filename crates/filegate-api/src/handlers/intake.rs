use crate::auth::bearer_token;
use crate::error::{ErrorResponse, HttpAppError};
use crate::services::UploadRequest;
use crate::state::AppState;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::HeaderMap,
    response::IntoResponse,
    Json,
};
use filegate_core::models::FileRecord;
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub struct IntakeResponse {
    pub data: FileRecord,
}

/// Register an uploaded object: scan it and record the outcome.
#[utoipa::path(
    post,
    path = "/intake",
    tag = "intake",
    request_body = UploadRequest,
    responses(
        (status = 200, description = "Upload accepted", body = IntakeResponse),
        (status = 400, description = "Invalid request, unknown subject, or infected file", body = ErrorResponse),
        (status = 401, description = "Missing or invalid bearer token", body = ErrorResponse),
        (status = 503, description = "Scanner unavailable and scanning is required", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, headers, payload), fields(operation = "intake"))]
pub async fn intake(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    payload: Result<Json<UploadRequest>, JsonRejection>,
) -> Result<impl IntoResponse, HttpAppError> {
    // The body is only looked at once the caller is known.
    let principal = state.intake.authenticate(bearer_token(&headers)).await?;
    let Json(request) = payload?;

    tracing::debug!(
        principal = %principal.id,
        subject_id = ?request.subject_id,
        path = ?request.path,
        "Intake request accepted for processing"
    );

    let record = state.intake.intake_as(&principal, request).await?;
    Ok(Json(IntakeResponse { data: record }))
}
