use crate::auth::{bearer_token, Authenticator};
use crate::error::HttpAppError;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;

/// Resolve the bearer credential and attach the [`Principal`](filegate_core::models::Principal)
/// to the request extensions for handlers behind it.
pub async fn auth_middleware(
    State(authenticator): State<Arc<dyn Authenticator>>,
    mut request: Request,
    next: Next,
) -> Response {
    let principal = match bearer_token(request.headers()) {
        Ok(token) => authenticator.authenticate(token).await,
        Err(e) => Err(e),
    };

    match principal {
        Ok(principal) => {
            tracing::debug!(principal = %principal.id, "Request authenticated");
            request.extensions_mut().insert(principal);
            next.run(request).await
        }
        Err(e) => HttpAppError(e).into_response(),
    }
}
