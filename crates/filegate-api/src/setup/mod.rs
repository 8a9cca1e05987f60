//! Application setup and initialization
//!
//! Builds the production collaborators (Postgres, object store, scan engine, token
//! verifier) from [`Config`] and wires them into the router.

pub mod database;
pub mod routes;
pub mod server;
pub mod storage;

use crate::auth::JwtAuthenticator;
use crate::state::{AppState, Collaborators};
use anyhow::{Context, Result};
use filegate_core::Config;
use filegate_db::{FileRecordRepository, SubjectRepository};
use filegate_services::create_scan_engine;
use std::sync::Arc;

/// Initialize the entire application
pub async fn initialize_app(config: Config) -> Result<(Arc<AppState>, axum::Router)> {
    crate::telemetry::init_telemetry(crate::telemetry::json_requested())
        .map_err(|e| anyhow::anyhow!("Failed to initialize telemetry: {}", e))?;

    tracing::info!(
        environment = %config.base.environment,
        "Configuration loaded and validated successfully"
    );

    let pool = database::setup_database(&config).await?;
    let (storage, local_storage) = storage::setup_storage(&config).await?;

    let engine = create_scan_engine(&config.scan).context("Failed to create scan engine")?;
    if engine.is_available().await {
        tracing::info!(engine = engine.name(), "Scan engine available");
    } else if config.scan.require_scan {
        tracing::error!(
            engine = engine.name(),
            "Scan engine unavailable and REQUIRE_SCAN=true; intakes will fail until it is reachable"
        );
    } else {
        tracing::warn!(
            engine = engine.name(),
            "Scan engine unavailable; uploads will be recorded as skipped"
        );
    }

    let authenticator = JwtAuthenticator::new(
        &config.base.jwt_secret,
        config.base.jwt_audience.as_deref(),
    )
    .with_service_key(config.service_api_key.clone());

    let collaborators = Collaborators {
        authenticator: Arc::new(authenticator),
        subjects: Arc::new(SubjectRepository::new(pool.clone())),
        files: Arc::new(FileRecordRepository::new(pool.clone())),
        storage,
        engine,
    };

    let state = Arc::new(
        AppState::new(config.clone(), collaborators)
            .with_local_storage(local_storage)
            .with_pool(pool),
    );

    let router = routes::setup_routes(&config, state.clone())?;

    Ok((state, router))
}
