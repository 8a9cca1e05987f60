//! Authorization check
//!
//! Bearer credentials are exchanged for a [`Principal`](filegate_core::models::Principal)
//! through the [`Authenticator`] capability. The HTTP layer only extracts the token.

pub mod jwt;
pub mod middleware;

use async_trait::async_trait;
use axum::http::{header::AUTHORIZATION, HeaderMap};
use filegate_core::models::Principal;
use filegate_core::AppError;

pub use jwt::{Claims, JwtAuthenticator};

/// Resolves a bearer credential to an authenticated principal
#[async_trait]
pub trait Authenticator: Send + Sync {
    /// Any failure is `AppError::Unauthorized`.
    async fn authenticate(&self, token: &str) -> Result<Principal, AppError>;
}

/// Extract the bearer token from the `Authorization` header.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AppError> {
    let header = headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized("Missing authorization header".to_string()))?;

    let token = header
        .strip_prefix("Bearer ")
        .ok_or_else(|| {
            AppError::Unauthorized("Invalid authorization header format".to_string())
        })?
        .trim();

    if token.is_empty() {
        return Err(AppError::Unauthorized("Missing bearer token".to_string()));
    }

    Ok(token)
}
