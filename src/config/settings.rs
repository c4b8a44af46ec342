//! Configuration settings structures for shoptrend.
//!
//! This module defines all configuration structures that can be loaded from
//! TOML files and environment variables.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::config::error::ConfigError;
use crate::logger::LoggerConfig;

// ============================================================================
// Default value functions
// ============================================================================

fn default_app_name() -> String {
    "shoptrend".to_string()
}

fn default_app_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

fn default_max_connections() -> u32 {
    10
}

fn default_connection_timeout() -> u64 {
    30
}

fn default_redis_url() -> String {
    "redis://127.0.0.1:6379".to_string()
}

fn default_channel_prefix() -> String {
    "search-index".to_string()
}

fn default_index_pool_size() -> u32 {
    4
}

fn default_index_connection_timeout() -> u64 {
    5
}

fn default_queue_capacity() -> usize {
    256
}

fn default_job_enabled() -> bool {
    true
}

fn default_job_timeout() -> u64 {
    300
}

// ============================================================================
// Application Configuration
// ============================================================================

/// Application basic information configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationConfig {
    #[serde(default = "default_app_name")]
    pub name: String,

    #[serde(default = "default_app_version")]
    pub version: String,
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            name: default_app_name(),
            version: default_app_version(),
        }
    }
}

// ============================================================================
// Database Configuration
// ============================================================================

/// Diesel database connection configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL
    #[serde(default)]
    pub url: String,

    /// Maximum number of connections in the pool
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Connection timeout in seconds
    #[serde(default = "default_connection_timeout")]
    pub connection_timeout: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            max_connections: default_max_connections(),
            connection_timeout: default_connection_timeout(),
        }
    }
}

// ============================================================================
// Index Channel Configuration
// ============================================================================

/// Search-index message channel configuration.
///
/// Updated products and shops are announced to the search-indexing service
/// over redis pub/sub; delivery is fire-and-forget.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexConfig {
    /// Redis connection URL for the index channel
    #[serde(default = "default_redis_url")]
    pub redis_url: String,

    /// Channel name prefix; events go to `{prefix}:products` / `{prefix}:shops`
    #[serde(default = "default_channel_prefix")]
    pub channel_prefix: String,

    /// Redis connection pool size
    #[serde(default = "default_index_pool_size")]
    pub pool_size: u32,

    /// Redis connection timeout in seconds
    #[serde(default = "default_index_connection_timeout")]
    pub connection_timeout: u64,

    /// Capacity of the in-process dispatch queue; events beyond it are
    /// dropped (and counted) rather than stalling score updates
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            redis_url: default_redis_url(),
            channel_prefix: default_channel_prefix(),
            pool_size: default_index_pool_size(),
            connection_timeout: default_index_connection_timeout(),
            queue_capacity: default_queue_capacity(),
        }
    }
}

// ============================================================================
// Job Configuration
// ============================================================================

/// One scheduled job declaration from the `[[jobs]]` array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobConfig {
    /// Unique job name; the executor allows at most one in-flight run per name
    pub name: String,

    /// Task type registered in the job registry
    pub job_type: String,

    /// Cron expression (with seconds field) for tokio-cron-scheduler
    pub cron: String,

    #[serde(default = "default_job_enabled")]
    pub enabled: bool,

    /// Hard per-run timeout in seconds
    #[serde(default = "default_job_timeout")]
    pub timeout_seconds: u64,

    /// Task-specific payload deserialized by the task factory
    #[serde(default)]
    pub payload: Option<JsonValue>,
}

// ============================================================================
// Settings
// ============================================================================

/// Top-level application settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Settings {
    #[serde(default)]
    pub application: ApplicationConfig,

    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub index: IndexConfig,

    #[serde(default)]
    pub logger: LoggerConfig,

    #[serde(default)]
    pub jobs: Vec<JobConfig>,
}

impl Settings {
    /// Validates the loaded settings.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.database.url.is_empty() {
            return Err(ConfigError::validation("database.url", "must not be empty"));
        }
        if self.database.max_connections == 0 {
            return Err(ConfigError::validation(
                "database.max_connections",
                "must be at least 1",
            ));
        }
        if self.index.redis_url.is_empty() {
            return Err(ConfigError::validation(
                "index.redis_url",
                "must not be empty",
            ));
        }
        if self.index.channel_prefix.is_empty() {
            return Err(ConfigError::validation(
                "index.channel_prefix",
                "must not be empty",
            ));
        }
        if self.index.queue_capacity == 0 {
            return Err(ConfigError::validation(
                "index.queue_capacity",
                "must be at least 1",
            ));
        }
        for job in &self.jobs {
            if job.name.is_empty() {
                return Err(ConfigError::validation("jobs.name", "must not be empty"));
            }
            if job.job_type.is_empty() {
                return Err(ConfigError::validation(
                    "jobs.job_type",
                    "must not be empty",
                ));
            }
            if job.cron.is_empty() {
                return Err(ConfigError::validation("jobs.cron", "must not be empty"));
            }
            if job.timeout_seconds == 0 {
                return Err(ConfigError::validation(
                    "jobs.timeout_seconds",
                    "must be at least 1",
                ));
            }
        }
        Ok(())
    }
}
