//! Application configuration.

use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Server configuration.
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Uploaded file configuration.
    #[serde(default)]
    pub uploads: UploadConfig,
    /// Like ledger tuning.
    #[serde(default)]
    pub ledger: LedgerConfig,
    /// Administrator bootstrap settings.
    #[serde(default)]
    pub admin: AdminConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to bind to.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Public URL of this instance.
    pub url: String,
}

/// Database connection configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// `PostgreSQL` connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

/// Where uploaded shot images live and how they are served.
#[derive(Debug, Clone, Deserialize)]
pub struct UploadConfig {
    /// Directory uploaded files are written to.
    #[serde(default = "default_upload_path")]
    pub path: PathBuf,
    /// Public URL prefix the files are served under.
    #[serde(default = "default_upload_base_url")]
    pub base_url: String,
    /// Maximum accepted upload size in bytes.
    #[serde(default = "default_max_upload_bytes")]
    pub max_bytes: usize,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            path: default_upload_path(),
            base_url: default_upload_base_url(),
            max_bytes: default_max_upload_bytes(),
        }
    }
}

/// Like ledger configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LedgerConfig {
    /// Attempts made for a toggle before reporting a transient failure.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Base delay between attempts, in milliseconds. Doubles per attempt.
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
    /// Row lock wait bound inside a toggle transaction, in milliseconds.
    /// Zero leaves the database default in place.
    #[serde(default = "default_lock_timeout_ms")]
    pub lock_timeout_ms: u64,
}

impl LedgerConfig {
    /// Base retry delay as a [`Duration`].
    #[must_use]
    pub const fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    /// Lock timeout, if one is configured.
    #[must_use]
    pub const fn lock_timeout(&self) -> Option<Duration> {
        if self.lock_timeout_ms == 0 {
            None
        } else {
            Some(Duration::from_millis(self.lock_timeout_ms))
        }
    }
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            retry_delay_ms: default_retry_delay_ms(),
            lock_timeout_ms: default_lock_timeout_ms(),
        }
    }
}

/// Administrator configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AdminConfig {
    /// Usernames that receive the admin role when they register.
    #[serde(default)]
    pub usernames: Vec<String>,
}

impl AdminConfig {
    /// Whether `username` is listed as an administrator.
    #[must_use]
    pub fn is_admin_username(&self, username: &str) -> bool {
        self.usernames
            .iter()
            .any(|name| name.eq_ignore_ascii_case(username))
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

const fn default_port() -> u16 {
    3000
}

const fn default_max_connections() -> u32 {
    50
}

const fn default_min_connections() -> u32 {
    5
}

fn default_upload_path() -> PathBuf {
    PathBuf::from("./files")
}

fn default_upload_base_url() -> String {
    "/files".to_string()
}

const fn default_max_upload_bytes() -> usize {
    10 * 1024 * 1024
}

const fn default_max_attempts() -> u32 {
    3
}

const fn default_retry_delay_ms() -> u64 {
    15
}

const fn default_lock_timeout_ms() -> u64 {
    2000
}

impl Config {
    /// Load configuration from files and environment variables.
    ///
    /// Configuration is loaded in the following order:
    /// 1. `.env` (if present)
    /// 2. `config/default.toml`
    /// 3. `config/{environment}.toml` (based on `FAIRWAY_ENV`)
    /// 4. Environment variables with `FAIRWAY_` prefix
    pub fn load() -> Result<Self, config::ConfigError> {
        // A missing .env file is the normal production case.
        let _ = dotenvy::dotenv();

        let env = std::env::var("FAIRWAY_ENV").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("FAIRWAY")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}
