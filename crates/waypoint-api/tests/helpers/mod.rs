//! Test helpers: build AppState and router for integration tests.
//!
//! Run from workspace root: `cargo test -p waypoint-api`. Upstream fetching is
//! replaced by `StubFetcher` and the database by `InMemoryVoteOptionStore`, so
//! no network or Postgres is needed.

pub mod fetcher;
pub mod store;

use axum_test::TestServer;
use std::sync::Arc;
use tempfile::TempDir;
use waypoint_api::setup::routes;
use waypoint_api::state::{AppState, DbState, IngestState, SecurityConfig};
use waypoint_core::constants::{
    DEFAULT_FETCH_TIMEOUT_SECS, DEFAULT_IMAGE_MAX_BYTES, DEFAULT_LINK_PREVIEW_MAX_BYTES,
};
use waypoint_core::{BaseConfig, Config, ServiceConfig, StorageBackend};
use waypoint_storage::{LocalStorage, Storage};

pub use fetcher::StubFetcher;
pub use store::InMemoryVoteOptionStore;

/// Public base URL of the test storage
pub const STORAGE_BASE_URL: &str = "https://media.test.example/storage";

pub const BACKFILL_TOKEN: &str = "test-backfill-token-0123456789";

/// Test application: server plus owned resources.
pub struct TestApp {
    pub server: TestServer,
    pub fetcher: Arc<StubFetcher>,
    pub store: Arc<InMemoryVoteOptionStore>,
    pub _temp_dir: TempDir,
}

impl TestApp {
    pub fn client(&self) -> &TestServer {
        &self.server
    }

    pub fn storage_path(&self) -> &std::path::Path {
        self._temp_dir.path()
    }
}

/// Knobs for building a test application
pub struct TestOptions {
    pub backfill_token: Option<String>,
    pub with_storage: bool,
    pub with_database: bool,
    pub store: InMemoryVoteOptionStore,
}

impl Default for TestOptions {
    fn default() -> Self {
        Self {
            backfill_token: Some(BACKFILL_TOKEN.to_string()),
            with_storage: true,
            with_database: true,
            store: InMemoryVoteOptionStore::default(),
        }
    }
}

pub fn test_config(backfill_token: Option<String>) -> Config {
    Config(Box::new(ServiceConfig {
        base: BaseConfig {
            server_port: 0,
            cors_origins: vec!["*".to_string()],
            db_max_connections: 5,
            db_timeout_seconds: 5,
            request_timeout_secs: 30,
            max_concurrent_requests: 64,
            environment: "test".to_string(),
        },
        database_url: None,
        run_migrations: false,
        storage_backend: Some(StorageBackend::Local),
        s3_bucket: None,
        s3_region: None,
        s3_endpoint: None,
        storage_access_key_id: None,
        storage_secret_access_key: None,
        storage_public_base_url: None,
        local_storage_path: None,
        local_storage_base_url: Some(STORAGE_BASE_URL.to_string()),
        image_max_bytes: DEFAULT_IMAGE_MAX_BYTES,
        image_fetch_timeout_secs: DEFAULT_FETCH_TIMEOUT_SECS,
        link_preview_max_bytes: DEFAULT_LINK_PREVIEW_MAX_BYTES,
        ssrf_guard_resolved_addrs: true,
        backfill_token,
    }))
}

pub async fn setup_test_app() -> TestApp {
    setup_test_app_with(TestOptions::default()).await
}

pub async fn setup_test_app_with(options: TestOptions) -> TestApp {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config = test_config(options.backfill_token.clone());

    let storage: Option<Arc<dyn Storage>> = if options.with_storage {
        let local = LocalStorage::new(temp_dir.path(), Some(STORAGE_BASE_URL.to_string()))
            .await
            .expect("Failed to create local storage");
        Some(Arc::new(local))
    } else {
        None
    };

    let fetcher = Arc::new(StubFetcher::default());
    let store = Arc::new(options.store);

    let state = Arc::new(AppState {
        ingest: IngestState {
            fetcher: fetcher.clone(),
            storage,
        },
        db: DbState {
            vote_options: if options.with_database {
                Some(store.clone())
            } else {
                None
            },
        },
        security: SecurityConfig {
            backfill_token: options.backfill_token,
        },
    });

    let app = routes::setup_routes(&config, state).expect("Failed to setup routes");
    let server = TestServer::new(app.into_make_service()).expect("Failed to create test server");

    TestApp {
        server,
        fetcher,
        store,
        _temp_dir: temp_dir,
    }
}
