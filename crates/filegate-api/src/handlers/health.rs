//! Health check handlers.

use crate::state::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use utoipa::ToSchema;

const TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    /// "available" or "unavailable"
    pub scanner: String,
    pub scan_required: bool,
}

/// Liveness plus scan engine availability.
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses((status = 200, description = "Service is up", body = HealthResponse))
)]
pub async fn health_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let available = tokio::time::timeout(TIMEOUT, state.scan.engine.is_available())
        .await
        .unwrap_or(false);

    if !available {
        tracing::warn!(
            engine = state.scan.engine.name(),
            scan_required = state.scan.required,
            "Scan engine unavailable"
        );
    }

    Json(HealthResponse {
        status: "ok".to_string(),
        scanner: if available { "available" } else { "unavailable" }.to_string(),
        scan_required: state.scan.required,
    })
}

/// Readiness probe - the database answers.
pub async fn readiness_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let mut response = serde_json::json!({
        "status": "ready",
        "database": "unknown"
    });

    let ready = match &state.pool {
        Some(pool) => {
            match tokio::time::timeout(TIMEOUT, sqlx::query("SELECT 1").execute(pool)).await {
                Ok(Ok(_)) => {
                    response["database"] = serde_json::json!("ready");
                    true
                }
                Ok(Err(e)) => {
                    tracing::error!(error = %e, "Database readiness check failed");
                    response["database"] = serde_json::json!(format!("not_ready: {}", e));
                    false
                }
                Err(_) => {
                    tracing::error!("Database readiness check timed out");
                    response["database"] = serde_json::json!("timeout");
                    false
                }
            }
        }
        None => {
            response["database"] = serde_json::json!("not_configured");
            false
        }
    };

    if !ready {
        response["status"] = serde_json::json!("not_ready");
        return (StatusCode::SERVICE_UNAVAILABLE, Json(response));
    }
    (StatusCode::OK, Json(response))
}
