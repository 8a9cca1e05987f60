//! Redeems download handles issued by the local storage backend.

use crate::error::HttpAppError;
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    http::header,
    response::IntoResponse,
};
use filegate_core::AppError;
use filegate_storage::Storage;
use serde::Deserialize;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
pub struct SignedMediaQuery {
    pub expires: u64,
    pub signature: String,
}

#[tracing::instrument(skip(state, query))]
pub async fn serve_media(
    State(state): State<Arc<AppState>>,
    Path(key): Path<String>,
    Query(query): Query<SignedMediaQuery>,
) -> Result<impl IntoResponse, HttpAppError> {
    let local = state
        .local_storage
        .as_ref()
        .ok_or_else(|| AppError::NotFound("Not found".to_string()))?;

    local.verify_signature(&key, query.expires, &query.signature)?;
    let data = local.download(&key).await?;

    Ok((
        [
            (header::CONTENT_TYPE, "application/octet-stream"),
            (header::CACHE_CONTROL, "private, no-store"),
        ],
        data,
    ))
}
