//! Configuration module
//!
//! Configuration for the Waypoint API: server, database, object storage,
//! outbound fetching and the backfill shared secret.
//!
//! Database and storage settings are optional. When they are missing the
//! server still starts and the endpoints that need them answer with a
//! configuration error.

use std::env;

use crate::constants::{
    DEFAULT_FETCH_TIMEOUT_SECS, DEFAULT_IMAGE_MAX_BYTES, DEFAULT_LINK_PREVIEW_MAX_BYTES,
};
use crate::storage_types::StorageBackend;

// Common constants
const MAX_CONNECTIONS: u32 = 10;
const CONNECTION_TIMEOUT_SECS: u64 = 30;
const REQUEST_TIMEOUT_SECS: u64 = 60;
const MAX_CONCURRENT_REQUESTS: usize = 256;

/// Base server configuration
#[derive(Clone, Debug)]
pub struct BaseConfig {
    pub server_port: u16,
    pub cors_origins: Vec<String>,
    pub db_max_connections: u32,
    pub db_timeout_seconds: u64,
    pub request_timeout_secs: u64,
    pub max_concurrent_requests: usize,
    pub environment: String,
}

/// Image ingestion service configuration
#[derive(Clone, Debug)]
pub struct ServiceConfig {
    pub base: BaseConfig,
    pub database_url: Option<String>,
    pub run_migrations: bool,
    // Storage configuration
    pub storage_backend: Option<StorageBackend>,
    pub s3_bucket: Option<String>,
    pub s3_region: Option<String>,
    pub s3_endpoint: Option<String>, // Custom endpoint for S3-compatible providers
    pub storage_access_key_id: Option<String>,
    pub storage_secret_access_key: Option<String>,
    pub storage_public_base_url: Option<String>,
    pub local_storage_path: Option<String>,
    pub local_storage_base_url: Option<String>,
    // Outbound fetching
    pub image_max_bytes: usize,
    pub image_fetch_timeout_secs: u64,
    pub link_preview_max_bytes: usize,
    pub ssrf_guard_resolved_addrs: bool,
    // Backfill
    pub backfill_token: Option<String>,
}

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config(pub Box<ServiceConfig>);

impl Config {
    fn as_service(&self) -> &ServiceConfig {
        &self.0
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        let environment = self.as_service().base.environment.to_lowercase();
        environment == "production" || environment == "prod"
    }

    pub fn from_env() -> Result<Self, anyhow::Error> {
        let config = ServiceConfig::from_env()?;
        Ok(Config(Box::new(config)))
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        self.as_service().validate()
    }

    // Convenience getters for common fields
    pub fn server_port(&self) -> u16 {
        self.as_service().base.server_port
    }

    pub fn cors_origins(&self) -> &[String] {
        &self.as_service().base.cors_origins
    }

    pub fn db_max_connections(&self) -> u32 {
        self.as_service().base.db_max_connections
    }

    pub fn db_timeout_seconds(&self) -> u64 {
        self.as_service().base.db_timeout_seconds
    }

    pub fn request_timeout_secs(&self) -> u64 {
        self.as_service().base.request_timeout_secs
    }

    pub fn max_concurrent_requests(&self) -> usize {
        self.as_service().base.max_concurrent_requests
    }

    pub fn environment(&self) -> &str {
        &self.as_service().base.environment
    }

    pub fn database_url(&self) -> Option<&str> {
        self.as_service().database_url.as_deref()
    }

    pub fn run_migrations(&self) -> bool {
        self.as_service().run_migrations
    }

    pub fn storage_backend(&self) -> Option<StorageBackend> {
        self.as_service().storage_backend
    }

    pub fn s3_bucket(&self) -> Option<&str> {
        self.as_service().s3_bucket.as_deref()
    }

    pub fn s3_region(&self) -> Option<&str> {
        self.as_service().s3_region.as_deref()
    }

    pub fn s3_endpoint(&self) -> Option<&str> {
        self.as_service().s3_endpoint.as_deref()
    }

    pub fn storage_access_key_id(&self) -> Option<&str> {
        self.as_service().storage_access_key_id.as_deref()
    }

    pub fn storage_secret_access_key(&self) -> Option<&str> {
        self.as_service().storage_secret_access_key.as_deref()
    }

    pub fn storage_public_base_url(&self) -> Option<&str> {
        self.as_service().storage_public_base_url.as_deref()
    }

    pub fn local_storage_path(&self) -> Option<&str> {
        self.as_service().local_storage_path.as_deref()
    }

    pub fn local_storage_base_url(&self) -> Option<&str> {
        self.as_service().local_storage_base_url.as_deref()
    }

    pub fn image_max_bytes(&self) -> usize {
        self.as_service().image_max_bytes
    }

    pub fn image_fetch_timeout_secs(&self) -> u64 {
        self.as_service().image_fetch_timeout_secs
    }

    pub fn link_preview_max_bytes(&self) -> usize {
        self.as_service().link_preview_max_bytes
    }

    pub fn ssrf_guard_resolved_addrs(&self) -> bool {
        self.as_service().ssrf_guard_resolved_addrs
    }

    pub fn backfill_token(&self) -> Option<&str> {
        self.as_service().backfill_token.as_deref()
    }
}

/// Read the first non-empty variable among `names`.
fn env_any(names: &[&str]) -> Option<String> {
    names
        .iter()
        .filter_map(|name| env::var(name).ok())
        .map(|value| value.trim().to_string())
        .find(|value| !value.is_empty())
}

fn env_flag(name: &str, default: bool) -> bool {
    env::var(name)
        .ok()
        .and_then(|v| match v.trim().to_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Some(true),
            "0" | "false" | "no" | "off" => Some(false),
            _ => None,
        })
        .unwrap_or(default)
}

impl ServiceConfig {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let environment = env::var("ENVIRONMENT")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string());

        let cors_origins_str = env::var("CORS_ORIGINS").unwrap_or_else(|_| "*".to_string());
        let is_production =
            environment.to_lowercase() == "production" || environment.to_lowercase() == "prod";
        if is_production && cors_origins_str.trim() == "*" {
            return Err(anyhow::anyhow!(
                "CORS_ORIGINS cannot be '*' in production. Please specify explicit origins."
            ));
        }

        let cors_origins: Vec<String> = cors_origins_str
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let base = BaseConfig {
            server_port: env::var("PORT")
                .unwrap_or_else(|_| "4000".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number"))?,
            cors_origins,
            db_max_connections: env::var("DB_MAX_CONNECTIONS")
                .unwrap_or_else(|_| MAX_CONNECTIONS.to_string())
                .parse()
                .unwrap_or(MAX_CONNECTIONS),
            db_timeout_seconds: env::var("DB_TIMEOUT_SECONDS")
                .unwrap_or_else(|_| CONNECTION_TIMEOUT_SECS.to_string())
                .parse()
                .unwrap_or(CONNECTION_TIMEOUT_SECS),
            request_timeout_secs: env::var("REQUEST_TIMEOUT_SECS")
                .unwrap_or_else(|_| REQUEST_TIMEOUT_SECS.to_string())
                .parse()
                .unwrap_or(REQUEST_TIMEOUT_SECS),
            max_concurrent_requests: env::var("MAX_CONCURRENT_REQUESTS")
                .unwrap_or_else(|_| MAX_CONCURRENT_REQUESTS.to_string())
                .parse()
                .unwrap_or(MAX_CONCURRENT_REQUESTS),
            environment,
        };

        let storage_backend = match env::var("STORAGE_BACKEND") {
            Ok(value) if !value.trim().is_empty() => Some(value.parse::<StorageBackend>()?),
            _ => None,
        };

        let config = ServiceConfig {
            base,
            database_url: env_any(&["DATABASE_URL", "SUPABASE_DB_URL"]),
            run_migrations: env_flag("RUN_MIGRATIONS", false),
            storage_backend,
            s3_bucket: env_any(&["S3_BUCKET", "STORAGE_BUCKET"]),
            s3_region: env_any(&["S3_REGION", "AWS_REGION"]),
            s3_endpoint: env_any(&["S3_ENDPOINT", "STORAGE_ENDPOINT"]),
            storage_access_key_id: env_any(&["STORAGE_ACCESS_KEY_ID", "AWS_ACCESS_KEY_ID"]),
            storage_secret_access_key: env_any(&[
                "STORAGE_SECRET_ACCESS_KEY",
                "AWS_SECRET_ACCESS_KEY",
            ]),
            storage_public_base_url: env_any(&["STORAGE_PUBLIC_BASE_URL"]),
            local_storage_path: env_any(&["LOCAL_STORAGE_PATH"]),
            local_storage_base_url: env_any(&["LOCAL_STORAGE_BASE_URL"]),
            image_max_bytes: env::var("IMAGE_MAX_BYTES")
                .unwrap_or_else(|_| DEFAULT_IMAGE_MAX_BYTES.to_string())
                .parse()
                .unwrap_or(DEFAULT_IMAGE_MAX_BYTES),
            image_fetch_timeout_secs: env::var("IMAGE_FETCH_TIMEOUT_SECS")
                .unwrap_or_else(|_| DEFAULT_FETCH_TIMEOUT_SECS.to_string())
                .parse()
                .unwrap_or(DEFAULT_FETCH_TIMEOUT_SECS),
            link_preview_max_bytes: env::var("LINK_PREVIEW_MAX_BYTES")
                .unwrap_or_else(|_| DEFAULT_LINK_PREVIEW_MAX_BYTES.to_string())
                .parse()
                .unwrap_or(DEFAULT_LINK_PREVIEW_MAX_BYTES),
            ssrf_guard_resolved_addrs: env_flag("SSRF_GUARD_RESOLVED_ADDRS", true),
            backfill_token: env_any(&["BACKFILL_TOKEN", "BACKFILL_SECRET", "CRON_SECRET"]),
        };

        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if let Some(ref url) = self.database_url {
            if !url.starts_with("postgres://") && !url.starts_with("postgresql://") {
                return Err(anyhow::anyhow!(
                    "DATABASE_URL must be a valid PostgreSQL connection string"
                ));
            }
        }

        if self.image_max_bytes == 0 {
            return Err(anyhow::anyhow!("IMAGE_MAX_BYTES must be greater than 0"));
        }

        if self.image_fetch_timeout_secs == 0 {
            return Err(anyhow::anyhow!(
                "IMAGE_FETCH_TIMEOUT_SECS must be greater than 0"
            ));
        }

        if let Some(ref base_url) = self.storage_public_base_url {
            if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
                return Err(anyhow::anyhow!(
                    "STORAGE_PUBLIC_BASE_URL must be an http(s) URL"
                ));
            }
        }

        // Storage credentials come in pairs
        if self.storage_access_key_id.is_some() != self.storage_secret_access_key.is_some() {
            return Err(anyhow::anyhow!(
                "STORAGE_ACCESS_KEY_ID and STORAGE_SECRET_ACCESS_KEY must be set together"
            ));
        }

        Ok(())
    }
}
