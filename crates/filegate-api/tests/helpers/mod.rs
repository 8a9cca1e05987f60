//! Test helpers: build the router over in-memory collaborators.
//!
//! Run from workspace root: `cargo test -p filegate-api`. No database, object store or
//! scanner is needed; every collaborator is a shared-state double the test can inspect.

pub mod auth;

use axum_test::TestServer;
use filegate_api::setup::routes::build_router;
use filegate_api::{AppState, Collaborators};
use filegate_api::auth::JwtAuthenticator;
use filegate_core::Config;
use filegate_db::test_helpers::{InMemoryFileRecordStore, InMemorySubjectRegistry};
use filegate_services::test_helpers::FakeScanEngine;
use filegate_storage::test_helpers::MockStorage;
use filegate_storage::{LocalStorage, Storage};
use std::sync::Arc;
use tempfile::TempDir;

pub use self::auth::{bearer, TEST_JWT_SECRET, TEST_SERVICE_KEY};

/// Test application: server plus handles on every double.
pub struct TestApp {
    pub server: TestServer,
    pub subjects: InMemorySubjectRegistry,
    pub files: InMemoryFileRecordStore,
    pub storage: MockStorage,
    pub engine: FakeScanEngine,
    pub _temp_dir: TempDir,
}

impl TestApp {
    pub fn client(&self) -> &TestServer {
        &self.server
    }
}

pub fn test_config(temp_dir: &TempDir) -> Config {
    let mut config = Config::for_local(
        "postgres://localhost/filegate_test",
        TEST_JWT_SECRET,
        temp_dir.path().to_str().expect("utf-8 temp path"),
    );
    config.service_api_key = Some(TEST_SERVICE_KEY.to_string());
    config
}

/// Subject `s1` exists and object `p` holds ten bytes.
pub fn setup_test_app(engine: FakeScanEngine) -> TestApp {
    setup_test_app_with(engine, |_| {})
}

pub fn setup_test_app_with(engine: FakeScanEngine, customize: impl FnOnce(&mut Config)) -> TestApp {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");
    let mut config = test_config(&temp_dir);
    customize(&mut config);

    let subjects = InMemorySubjectRegistry::new().with_subject("s1");
    let files = InMemoryFileRecordStore::new();
    let storage = MockStorage::new().with_object("p", b"0123456789");

    let state = AppState::new(
        config.clone(),
        Collaborators {
            authenticator: authenticator(&config),
            subjects: Arc::new(subjects.clone()),
            files: Arc::new(files.clone()),
            storage: Arc::new(storage.clone()),
            engine: Arc::new(engine.clone()),
        },
    );

    let server = TestServer::new(build_router(Arc::new(state))).expect("Failed to create test server");

    TestApp {
        server,
        subjects,
        files,
        storage,
        engine,
        _temp_dir: temp_dir,
    }
}

/// Router over a real [`LocalStorage`] in a temp dir, for signed media URLs.
pub async fn setup_local_storage_app() -> (TestServer, LocalStorage, TempDir) {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");
    let config = test_config(&temp_dir);
    let local = filegate_storage::create_local_storage(&config)
        .await
        .expect("Failed to create local storage");

    let storage: Arc<dyn Storage> = Arc::new(local.clone());
    let state = AppState::new(
        config.clone(),
        Collaborators {
            authenticator: authenticator(&config),
            subjects: Arc::new(InMemorySubjectRegistry::new().with_subject("s1")),
            files: Arc::new(InMemoryFileRecordStore::new()),
            storage,
            engine: Arc::new(FakeScanEngine::clean()),
        },
    )
    .with_local_storage(Some(local.clone()));

    let server = TestServer::new(build_router(Arc::new(state))).expect("Failed to create test server");
    (server, local, temp_dir)
}

fn authenticator(config: &Config) -> Arc<JwtAuthenticator> {
    Arc::new(
        JwtAuthenticator::new(&config.base.jwt_secret, config.base.jwt_audience.as_deref())
            .with_service_key(config.service_api_key.clone()),
    )
}
