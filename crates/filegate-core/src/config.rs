//! Configuration module
//!
//! Everything is read once from the environment by [`Config::from_env`] and then passed
//! explicitly to the components that need it. Nothing in the intake pipeline consults
//! the environment at call time.

use std::env;

use crate::constants::{
    DEFAULT_MAX_FILE_SIZE_BYTES, DEFAULT_SIGNED_URL_TTL_SECS, MAX_SIGNED_URL_TTL_SECS,
};
use crate::storage_types::StorageBackend;

// Common constants
const SERVER_PORT: u16 = 4000;
const MAX_CONNECTIONS: u32 = 20;
const CONNECTION_TIMEOUT_SECS: u64 = 30;
const SCAN_TIMEOUT_SECS: u64 = 30;
const CLAMAV_PORT: u16 = 3310;

/// Server-level settings shared by every component
#[derive(Clone, Debug)]
pub struct BaseConfig {
    pub server_port: u16,
    pub cors_origins: Vec<String>,
    pub db_max_connections: u32,
    pub db_timeout_seconds: u64,
    pub jwt_secret: String,
    pub jwt_audience: Option<String>,
    pub environment: String,
}

/// Object store gateway settings
#[derive(Clone, Debug)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    pub s3_bucket: Option<String>,
    pub s3_region: Option<String>,
    pub s3_endpoint: Option<String>,
    pub local_storage_path: Option<String>,
    pub local_storage_base_url: Option<String>,
}

/// Which external engine backs the scan adapter
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScanEngineKind {
    /// `clamscan` executed as a subprocess per scan
    ClamScan,
    /// A running `clamd` daemon reached over TCP
    Clamd,
}

impl std::str::FromStr for ScanEngineKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "clamscan" => Ok(ScanEngineKind::ClamScan),
            "clamd" | "clamav" => Ok(ScanEngineKind::Clamd),
            other => Err(format!("Unknown scan engine: {}", other)),
        }
    }
}

/// Scan engine adapter settings and the intake policy that depends on it
#[derive(Clone, Debug)]
pub struct ScanConfig {
    pub engine: ScanEngineKind,
    /// Fail closed (`true`) or record a skipped scan (`false`) when the engine is unavailable
    pub require_scan: bool,
    pub clamscan_path: String,
    pub timeout_secs: u64,
    pub clamav_host: String,
    pub clamav_port: u16,
    pub max_file_size_bytes: usize,
    /// `None` accepts any declared content type
    pub allowed_content_types: Option<Vec<String>>,
    /// Put `/rescan` behind bearer authentication
    pub rescan_require_auth: bool,
}

/// Retrieval gate settings
#[derive(Clone, Debug)]
pub struct SignedUrlConfig {
    pub default_ttl_secs: u64,
    pub max_ttl_secs: u64,
    pub require_auth: bool,
}

/// Application configuration
#[derive(Clone, Debug)]
pub struct Config {
    pub base: BaseConfig,
    pub database_url: String,
    /// Static bearer accepted for service-to-service calls
    pub service_api_key: Option<String>,
    pub storage: StorageConfig,
    pub scan: ScanConfig,
    pub signed_url: SignedUrlConfig,
}

fn env_flag(name: &str, default: bool) -> bool {
    env::var(name)
        .unwrap_or_else(|_| default.to_string())
        .trim()
        .to_lowercase()
        .parse()
        .unwrap_or(default)
}

fn megabytes_to_bytes(mb: usize) -> Result<usize, anyhow::Error> {
    mb.checked_mul(1024 * 1024)
        .ok_or_else(|| anyhow::anyhow!("MAX_FILE_SIZE_MB is too large: {}", mb))
}

fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}

impl Config {
    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        let environment = self.base.environment.to_lowercase();
        environment == "production" || environment == "prod"
    }

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
            .collect();

        let base = BaseConfig {
            server_port: env::var("PORT")
                .unwrap_or_else(|_| SERVER_PORT.to_string())
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
            jwt_secret: env::var("JWT_SECRET")
                .map_err(|_| anyhow::anyhow!("JWT_SECRET must be set for authentication"))?,
            jwt_audience: env::var("JWT_AUDIENCE").ok().filter(|s| !s.is_empty()),
            environment,
        };

        let backend = match env::var("STORAGE_BACKEND") {
            Ok(raw) => raw
                .parse::<StorageBackend>()
                .map_err(|e| anyhow::anyhow!("STORAGE_BACKEND: {}", e))?,
            Err(_) => StorageBackend::S3,
        };

        let storage = StorageConfig {
            backend,
            s3_bucket: env::var("S3_BUCKET").ok(),
            s3_region: env::var("S3_REGION")
                .or_else(|_| env::var("AWS_REGION"))
                .ok(),
            s3_endpoint: env::var("S3_ENDPOINT").ok().filter(|s| !s.is_empty()),
            local_storage_path: env::var("LOCAL_STORAGE_PATH").ok(),
            local_storage_base_url: env::var("LOCAL_STORAGE_BASE_URL").ok(),
        };

        let max_file_size_mb: usize = env::var("MAX_FILE_SIZE_MB")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_MAX_FILE_SIZE_BYTES / (1024 * 1024));
        let max_file_size_bytes = megabytes_to_bytes(max_file_size_mb)?;

        let scan = ScanConfig {
            engine: env::var("SCAN_ENGINE")
                .unwrap_or_else(|_| "clamscan".to_string())
                .parse()
                .map_err(|e| anyhow::anyhow!("SCAN_ENGINE: {}", e))?,
            require_scan: env_flag("REQUIRE_SCAN", false),
            clamscan_path: env::var("CLAMSCAN_PATH").unwrap_or_else(|_| "clamscan".to_string()),
            timeout_secs: env::var("SCAN_TIMEOUT_SECS")
                .unwrap_or_else(|_| SCAN_TIMEOUT_SECS.to_string())
                .parse()
                .unwrap_or(SCAN_TIMEOUT_SECS),
            clamav_host: env::var("CLAMAV_HOST").unwrap_or_else(|_| "localhost".to_string()),
            clamav_port: env::var("CLAMAV_PORT")
                .unwrap_or_else(|_| CLAMAV_PORT.to_string())
                .parse()
                .unwrap_or(CLAMAV_PORT),
            max_file_size_bytes,
            allowed_content_types: env::var("ALLOWED_CONTENT_TYPES")
                .ok()
                .map(|raw| parse_list(&raw))
                .filter(|list| !list.is_empty()),
            rescan_require_auth: env_flag("RESCAN_REQUIRE_AUTH", true),
        };

        let signed_url = SignedUrlConfig {
            default_ttl_secs: env::var("SIGNED_URL_DEFAULT_TTL_SECS")
                .unwrap_or_else(|_| DEFAULT_SIGNED_URL_TTL_SECS.to_string())
                .parse()
                .unwrap_or(DEFAULT_SIGNED_URL_TTL_SECS),
            max_ttl_secs: env::var("SIGNED_URL_MAX_TTL_SECS")
                .unwrap_or_else(|_| MAX_SIGNED_URL_TTL_SECS.to_string())
                .parse()
                .unwrap_or(MAX_SIGNED_URL_TTL_SECS),
            require_auth: env_flag("SIGNED_URL_REQUIRE_AUTH", false),
        };

        let config = Config {
            base,
            database_url: env::var("DATABASE_URL")
                .map_err(|_| anyhow::anyhow!("DATABASE_URL must be set"))?,
            service_api_key: env::var("SERVICE_API_KEY").ok().filter(|s| !s.is_empty()),
            storage,
            scan,
            signed_url,
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.base.jwt_secret.len() < 32 {
            return Err(anyhow::anyhow!(
                "JWT_SECRET must be at least 32 characters long"
            ));
        }

        if !self.database_url.starts_with("postgresql://")
            && !self.database_url.starts_with("postgres://")
        {
            return Err(anyhow::anyhow!(
                "DATABASE_URL must be a valid PostgreSQL connection string"
            ));
        }

        if self.scan.max_file_size_bytes == 0 {
            return Err(anyhow::anyhow!("MAX_FILE_SIZE_MB must be greater than zero"));
        }

        if self.scan.timeout_secs == 0 {
            return Err(anyhow::anyhow!("SCAN_TIMEOUT_SECS must be greater than zero"));
        }

        if self.signed_url.default_ttl_secs == 0
            || self.signed_url.default_ttl_secs > self.signed_url.max_ttl_secs
        {
            return Err(anyhow::anyhow!(
                "SIGNED_URL_DEFAULT_TTL_SECS must be between 1 and SIGNED_URL_MAX_TTL_SECS"
            ));
        }

        match self.storage.backend {
            StorageBackend::S3 => {
                if self.storage.s3_bucket.is_none() {
                    return Err(anyhow::anyhow!(
                        "S3_BUCKET must be set when using S3 storage backend"
                    ));
                }
                if self.storage.s3_region.is_none() {
                    return Err(anyhow::anyhow!(
                        "S3_REGION or AWS_REGION must be set when using S3 storage backend"
                    ));
                }
            }
            StorageBackend::Local => {
                if self.storage.local_storage_path.is_none() {
                    return Err(anyhow::anyhow!(
                        "LOCAL_STORAGE_PATH must be set when using local storage backend"
                    ));
                }
                if self.storage.local_storage_base_url.is_none() {
                    return Err(anyhow::anyhow!(
                        "LOCAL_STORAGE_BASE_URL must be set when using local storage backend"
                    ));
                }
            }
        }

        Ok(())
    }

    /// Configuration with local storage and permissive defaults, for tests and tooling.
    pub fn for_local(database_url: &str, jwt_secret: &str, storage_root: &str) -> Self {
        Config {
            base: BaseConfig {
                server_port: SERVER_PORT,
                cors_origins: vec!["*".to_string()],
                db_max_connections: 5,
                db_timeout_seconds: CONNECTION_TIMEOUT_SECS,
                jwt_secret: jwt_secret.to_string(),
                jwt_audience: None,
                environment: "test".to_string(),
            },
            database_url: database_url.to_string(),
            service_api_key: None,
            storage: StorageConfig {
                backend: StorageBackend::Local,
                s3_bucket: None,
                s3_region: None,
                s3_endpoint: None,
                local_storage_path: Some(storage_root.to_string()),
                local_storage_base_url: Some(format!("http://localhost:{}/media", SERVER_PORT)),
            },
            scan: ScanConfig {
                engine: ScanEngineKind::ClamScan,
                require_scan: false,
                clamscan_path: "clamscan".to_string(),
                timeout_secs: SCAN_TIMEOUT_SECS,
                clamav_host: "localhost".to_string(),
                clamav_port: CLAMAV_PORT,
                max_file_size_bytes: DEFAULT_MAX_FILE_SIZE_BYTES,
                allowed_content_types: None,
                rescan_require_auth: true,
            },
            signed_url: SignedUrlConfig {
                default_ttl_secs: DEFAULT_SIGNED_URL_TTL_SECS,
                max_ttl_secs: MAX_SIGNED_URL_TTL_SECS,
                require_auth: false,
            },
        }
    }
}
