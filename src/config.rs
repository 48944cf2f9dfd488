//! Configuration loading and validation.
//!
//! Configuration is loaded from a TOML file with defaults for every field.
//! Provider credentials are loaded from environment variables at runtime
//! (never from the config file).

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use tracing_subscriber::EnvFilter;
use url::Url;

use crate::error::{ConfigError, Result};
use crate::resilience::CircuitBreakerConfig;

/// Environment variable holding the provider API key id.
pub const ENV_API_KEY_ID: &str = "MARKET_DATA_API_KEY_ID";
/// Environment variable holding the provider API secret.
pub const ENV_API_SECRET_KEY: &str = "MARKET_DATA_API_SECRET_KEY";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub provider: ProviderConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub breaker: BreakerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Market-data provider endpoint settings.
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Bound on every provider round trip. A hung request must not occupy
    /// the half-open trial slot indefinitely.
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

fn default_base_url() -> String {
    "https://data.alpaca.markets".to_string()
}

fn default_request_timeout_ms() -> u64 {
    10_000
}

impl ProviderConfig {
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

/// Price cache freshness settings.
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    /// Rows younger than this are served without a provider call.
    #[serde(default = "default_ttl_minutes")]
    pub ttl_minutes: u64,
}

fn default_ttl_minutes() -> u64 {
    30
}

impl CacheConfig {
    #[must_use]
    pub fn ttl(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.ttl_minutes as i64)
    }

    /// Age past which rows are purged: 2x TTL, which bounds how stale a
    /// stale-fallback answer can ever be.
    #[must_use]
    pub fn purge_age(&self) -> chrono::Duration {
        self.ttl() * 2
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_minutes: default_ttl_minutes(),
        }
    }
}

/// Circuit breaker tuning shared by all circuits in a registry.
#[derive(Debug, Clone, Deserialize)]
pub struct BreakerConfig {
    #[serde(default = "default_failure_threshold")]
    pub failure_threshold: u32,
    #[serde(default = "default_reset_timeout_secs")]
    pub reset_timeout_secs: u64,
}

fn default_failure_threshold() -> u32 {
    5
}

fn default_reset_timeout_secs() -> u64 {
    30
}

impl BreakerConfig {
    #[must_use]
    pub fn to_circuit_config(&self) -> CircuitBreakerConfig {
        CircuitBreakerConfig {
            failure_threshold: self.failure_threshold,
            reset_timeout: Duration::from_secs(self.reset_timeout_secs),
        }
    }
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: default_failure_threshold(),
            reset_timeout_secs: default_reset_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    /// `pretty` or `json`.
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file and validate it.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadFile)?;
        let config: Config = toml::from_str(&content).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        Url::parse(&self.provider.base_url).map_err(|e| ConfigError::InvalidValue {
            field: "provider.base_url",
            reason: e.to_string(),
        })?;
        if self.cache.ttl_minutes == 0 {
            return Err(ConfigError::InvalidValue {
                field: "cache.ttl_minutes",
                reason: "must be greater than zero".to_string(),
            }
            .into());
        }
        if self.breaker.failure_threshold == 0 {
            return Err(ConfigError::InvalidValue {
                field: "breaker.failure_threshold",
                reason: "must be greater than zero".to_string(),
            }
            .into());
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            provider: ProviderConfig::default(),
            cache: CacheConfig::default(),
            breaker: BreakerConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Per-request provider credentials, passed through to the provider adapter
/// as request headers.
#[derive(Debug, Clone)]
pub struct ProviderCredentials {
    pub key_id: String,
    pub secret_key: String,
}

impl ProviderCredentials {
    /// Load credentials from the environment (a `.env` file is honored if
    /// present).
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        let key_id = std::env::var(ENV_API_KEY_ID)
            .map_err(|_| ConfigError::MissingEnv { var: ENV_API_KEY_ID })?;
        let secret_key = std::env::var(ENV_API_SECRET_KEY).map_err(|_| ConfigError::MissingEnv {
            var: ENV_API_SECRET_KEY,
        })?;
        Ok(Self { key_id, secret_key })
    }
}

/// Initialize the global tracing subscriber. Safe to call more than once;
/// later calls are no-ops.
pub fn init_logging(config: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));
    if config.format == "json" {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .try_init()
            .ok();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .try_init()
            .ok();
    }
}
