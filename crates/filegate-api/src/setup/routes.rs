//! Route configuration and setup.

use crate::auth::middleware::auth_middleware;
use crate::handlers;
use crate::state::AppState;
use axum::{
    http::{HeaderValue, Method},
    routing::{get, post},
    Json, Router,
};
use filegate_core::Config;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

/// Request bodies are small JSON documents; the objects themselves never pass through.
const MAX_REQUEST_BODY_BYTES: usize = 64 * 1024;

/// Setup all application routes
pub fn setup_routes(config: &Config, state: Arc<AppState>) -> Result<Router<()>, anyhow::Error> {
    let cors = setup_cors(config)?;
    Ok(build_router(state).layer(cors))
}

/// Router with every route and the layers that do not depend on deployment settings.
pub fn build_router(state: Arc<AppState>) -> Router<()> {
    let rescan_route = Router::new().route("/rescan", post(handlers::rescan::rescan));
    let (protected, public) = if state.config.scan.rescan_require_auth {
        (protected_routes().merge(rescan_route), public_routes())
    } else {
        (protected_routes(), public_routes().merge(rescan_route))
    };

    let protected = protected.layer(axum::middleware::from_fn_with_state(
        state.authenticator.clone(),
        auth_middleware,
    ));

    public
        .merge(protected)
        .layer(RequestBodyLimitLayer::new(MAX_REQUEST_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Routes that authenticate inside the handler, or not at all.
fn public_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/health/ready", get(handlers::health::readiness_check))
        .route("/intake", post(handlers::intake::intake))
        .route("/signed-url", post(handlers::signed_url::create_signed_url))
        .route("/media/{*key}", get(handlers::media::serve_media))
        .route(
            "/api-docs/openapi.json",
            get(|| async { Json(crate::api_doc::get_openapi_spec()) }),
        )
}

/// Routes behind the bearer-token middleware.
fn protected_routes() -> Router<Arc<AppState>> {
    Router::new().route(
        "/subjects/{subject_id}/files",
        get(handlers::files::list_subject_files),
    )
}

fn setup_cors(config: &Config) -> Result<CorsLayer, anyhow::Error> {
    let origins = &config.base.cors_origins;
    let cors = if origins.iter().any(|o| o == "*") {
        if config.is_production() {
            anyhow::bail!("CORS_ORIGINS=* is not allowed in production");
        }
        tracing::warn!("CORS configured to allow all origins - not recommended for production");
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers(Any)
    } else {
        let origins: Vec<HeaderValue> = origins
            .iter()
            .map(|o| o.parse::<HeaderValue>())
            .collect::<Result<_, _>>()
            .map_err(|e| anyhow::anyhow!("Invalid CORS origin: {}", e))?;

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers(Any)
    };
    Ok(cors)
}
