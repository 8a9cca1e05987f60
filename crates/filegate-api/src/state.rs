//! Application state
//!
//! Every collaborator is held behind its trait so the router can be assembled over
//! Postgres, S3 and ClamAV in production and over in-memory doubles in tests.

use filegate_core::Config;
use filegate_db::{FileRecordStore, SubjectRegistry};
use filegate_services::ScanEngine;
use filegate_storage::{LocalStorage, Storage};
use sqlx::PgPool;
use std::sync::Arc;

use crate::auth::Authenticator;
use crate::services::{IntakePolicy, IntakeService, RescanService, RetrievalGate};

/// External collaborators the pipeline is built from
#[derive(Clone)]
pub struct Collaborators {
    pub authenticator: Arc<dyn Authenticator>,
    pub subjects: Arc<dyn SubjectRegistry>,
    pub files: Arc<dyn FileRecordStore>,
    pub storage: Arc<dyn Storage>,
    pub engine: Arc<dyn ScanEngine>,
}

/// Scan engine as seen by the health endpoint
#[derive(Clone)]
pub struct ScanState {
    pub engine: Arc<dyn ScanEngine>,
    pub required: bool,
}

#[derive(Clone)]
pub struct AppState {
    pub intake: IntakeService,
    pub rescan: RescanService,
    pub retrieval: RetrievalGate,
    pub authenticator: Arc<dyn Authenticator>,
    pub subjects: Arc<dyn SubjectRegistry>,
    pub files: Arc<dyn FileRecordStore>,
    pub scan: ScanState,
    /// Set when objects live on the local filesystem; redeems signed media URLs
    pub local_storage: Option<LocalStorage>,
    /// Absent in tests that run without a database
    pub pool: Option<PgPool>,
    pub config: Config,
}

impl AppState {
    pub fn new(config: Config, deps: Collaborators) -> Self {
        let intake = IntakeService::new(
            deps.authenticator.clone(),
            deps.subjects.clone(),
            deps.files.clone(),
            deps.storage.clone(),
            deps.engine.clone(),
            IntakePolicy::from_config(&config.scan),
        );
        let rescan = RescanService::new(
            deps.files.clone(),
            deps.storage.clone(),
            deps.engine.clone(),
            config.scan.require_scan,
        );
        let retrieval = RetrievalGate::new(
            deps.storage.clone(),
            deps.files.clone(),
            deps.authenticator.clone(),
            config.signed_url.clone(),
        );

        Self {
            intake,
            rescan,
            retrieval,
            authenticator: deps.authenticator,
            subjects: deps.subjects,
            files: deps.files,
            scan: ScanState {
                engine: deps.engine,
                required: config.scan.require_scan,
            },
            local_storage: None,
            pool: None,
            config,
        }
    }

    pub fn with_local_storage(mut self, local: Option<LocalStorage>) -> Self {
        self.local_storage = local;
        self
    }

    pub fn with_pool(mut self, pool: PgPool) -> Self {
        self.pool = Some(pool);
        self
    }
}
