use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use filegate_core::models::FileRecord;
use filegate_core::AppError;
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub struct FileListResponse {
    pub data: Vec<FileRecord>,
}

/// Files of one subject, newest first.
#[utoipa::path(
    get,
    path = "/subjects/{subject_id}/files",
    tag = "files",
    params(
        ("subject_id" = String, Path, description = "Subject ID")
    ),
    responses(
        (status = 200, description = "Files of the subject", body = FileListResponse),
        (status = 401, description = "Missing or invalid bearer token", body = ErrorResponse),
        (status = 404, description = "Subject not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state))]
pub async fn list_subject_files(
    State(state): State<Arc<AppState>>,
    Path(subject_id): Path<String>,
) -> Result<impl IntoResponse, HttpAppError> {
    if !state.subjects.exists(&subject_id).await? {
        return Err(AppError::NotFound("Subject not found".to_string()).into());
    }

    let files = state.files.list_by_subject(&subject_id).await?;
    Ok(Json(FileListResponse { data: files }))
}
