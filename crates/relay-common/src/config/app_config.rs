//! Application configuration structs
//!
//! Loads configuration from environment variables (and a `.env` file if present).

use serde::Deserialize;
use std::env;
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub app: AppSettings,
    pub database: DatabaseConfig,
    /// Absent means the in-process dedup guard is used
    pub redis: Option<RedisConfig>,
    pub ingest: IngestConfig,
    pub worker: WorkerConfig,
    pub snowflake: SnowflakeConfig,
}

/// General application settings
#[derive(Debug, Clone, Deserialize)]
pub struct AppSettings {
    #[serde(default = "default_app_name")]
    pub name: String,
    #[serde(default = "default_env")]
    pub env: Environment,
}

/// Environment type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl Environment {
    #[must_use]
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }

    #[must_use]
    pub fn is_development(&self) -> bool {
        matches!(self, Self::Development)
    }
}

/// Database configuration
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

/// Redis configuration
#[derive(Debug, Clone, Deserialize)]
pub struct RedisConfig {
    pub url: String,
    #[serde(default = "default_redis_max_connections")]
    pub max_connections: u32,
}

/// Webhook ingestion settings
#[derive(Debug, Clone, Deserialize)]
pub struct IngestConfig {
    /// How long a dedup claim suppresses duplicate deliveries
    #[serde(default = "default_dedup_ttl")]
    pub dedup_ttl_seconds: u64,
    /// Upper bound for one media download round trip
    #[serde(default = "default_media_fetch_timeout")]
    pub media_fetch_timeout_seconds: u64,
    /// Meta Graph API base, used to resolve Cloud media ids
    #[serde(default = "default_graph_api_base_url")]
    pub graph_api_base_url: String,
    /// 360dialog API base, used to download Default-provider media
    #[serde(default = "default_dialog_api_base_url")]
    pub dialog_api_base_url: String,
}

impl IngestConfig {
    #[must_use]
    pub fn media_fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.media_fetch_timeout_seconds)
    }
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            dedup_ttl_seconds: default_dedup_ttl(),
            media_fetch_timeout_seconds: default_media_fetch_timeout(),
            graph_api_base_url: default_graph_api_base_url(),
            dialog_api_base_url: default_dialog_api_base_url(),
        }
    }
}

/// Local job runner settings
#[derive(Debug, Clone, Deserialize)]
pub struct WorkerConfig {
    #[serde(default = "default_worker_concurrency")]
    pub concurrency: usize,
    /// Attempts per job when the store fails (1 = no retry)
    #[serde(default = "default_worker_max_attempts")]
    pub max_attempts: u32,
}

/// Snowflake ID generator configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SnowflakeConfig {
    #[serde(default)]
    pub worker_id: u16,
}

// Default value functions
fn default_app_name() -> String {
    "webhook-relay".to_string()
}

fn default_env() -> Environment {
    Environment::Development
}

fn default_max_connections() -> u32 {
    20
}

fn default_min_connections() -> u32 {
    5
}

fn default_redis_max_connections() -> u32 {
    10
}

fn default_dedup_ttl() -> u64 {
    300 // 5 minutes
}

fn default_media_fetch_timeout() -> u64 {
    30
}

fn default_graph_api_base_url() -> String {
    "https://graph.facebook.com/v17.0".to_string()
}

fn default_dialog_api_base_url() -> String {
    "https://waba.360dialog.io".to_string()
}

fn default_worker_concurrency() -> usize {
    8
}

fn default_worker_max_attempts() -> u32 {
    3
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    /// Returns an error if required environment variables are missing
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build configuration from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let parsed = |name: &'static str| -> Result<Option<u64>, ConfigError> {
            lookup(name)
                .map(|raw| {
                    raw.trim()
                        .parse::<u64>()
                        .map_err(|_| ConfigError::InvalidValue(name, raw))
                })
                .transpose()
        };

        let worker_id = match parsed("WORKER_ID")? {
            Some(id) if id >= 1024 => {
                return Err(ConfigError::InvalidValue("WORKER_ID", id.to_string()))
            }
            Some(id) => id as u16,
            None => 0,
        };

        Ok(Self {
            app: AppSettings {
                name: lookup("APP_NAME").unwrap_or_else(default_app_name),
                env: lookup("APP_ENV")
                    .and_then(|s| match s.to_lowercase().as_str() {
                        "production" => Some(Environment::Production),
                        "staging" => Some(Environment::Staging),
                        "development" => Some(Environment::Development),
                        _ => None,
                    })
                    .unwrap_or_default(),
            },
            database: DatabaseConfig {
                url: lookup("DATABASE_URL").ok_or(ConfigError::MissingVar("DATABASE_URL"))?,
                max_connections: parsed("DATABASE_MAX_CONNECTIONS")?
                    .map_or_else(default_max_connections, |v| v as u32),
                min_connections: parsed("DATABASE_MIN_CONNECTIONS")?
                    .map_or_else(default_min_connections, |v| v as u32),
            },
            redis: match lookup("REDIS_URL").filter(|url| !url.trim().is_empty()) {
                Some(url) => Some(RedisConfig {
                    url,
                    max_connections: parsed("REDIS_MAX_CONNECTIONS")?
                        .map_or_else(default_redis_max_connections, |v| v as u32),
                }),
                None => None,
            },
            ingest: IngestConfig {
                dedup_ttl_seconds: parsed("DEDUP_TTL_SECONDS")?.unwrap_or_else(default_dedup_ttl),
                media_fetch_timeout_seconds: parsed("MEDIA_FETCH_TIMEOUT_SECONDS")?
                    .unwrap_or_else(default_media_fetch_timeout),
                graph_api_base_url: lookup("GRAPH_API_BASE_URL")
                    .unwrap_or_else(default_graph_api_base_url),
                dialog_api_base_url: lookup("DIALOG_API_BASE_URL")
                    .unwrap_or_else(default_dialog_api_base_url),
            },
            worker: WorkerConfig {
                concurrency: parsed("WORKER_CONCURRENCY")?
                    .map_or_else(default_worker_concurrency, |v| (v as usize).max(1)),
                max_attempts: parsed("WORKER_MAX_ATTEMPTS")?
                    .map_or_else(default_worker_max_attempts, |v| (v as u32).max(1)),
            },
            snowflake: SnowflakeConfig { worker_id },
        })
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingVar(&'static str),

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(&'static str, String),
}
