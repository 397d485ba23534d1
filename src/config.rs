//! Configuration management for the document registration client.

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::info;

use crate::error::{CrptError, Result};
use crate::ratelimit::{LimiterConfig, TimeWindow};

/// Registration endpoint used when none is configured.
pub const DEFAULT_ENDPOINT: &str = "https://ismp.crpt.ru/api/v3/lk/documents/create";

/// Prefix for environment overrides, e.g. `CRPT__RATE_LIMITING__REQUEST_LIMIT=5`.
const ENV_PREFIX: &str = "CRPT";

/// Main configuration for the client.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CrptConfig {
    /// HTTP client configuration
    #[serde(default)]
    pub client: ClientConfig,

    /// Rate limiting configuration
    #[serde(default)]
    pub rate_limiting: RateLimitingConfig,
}

/// HTTP client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Registration endpoint URL
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Whole-request timeout in milliseconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_ms: u64,

    /// Connection establishment timeout in milliseconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            request_timeout_ms: default_request_timeout(),
            connect_timeout_ms: default_connect_timeout(),
        }
    }
}

impl ClientConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

fn default_request_timeout() -> u64 {
    30_000
}

fn default_connect_timeout() -> u64 {
    10_000
}

/// Rate limiting configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitingConfig {
    /// Granularity of the sliding window
    #[serde(default = "default_unit")]
    pub unit: TimeWindow,

    /// Admissions allowed per one unit
    #[serde(default = "default_request_limit")]
    pub request_limit: i64,
}

impl Default for RateLimitingConfig {
    fn default() -> Self {
        Self {
            unit: default_unit(),
            request_limit: default_request_limit(),
        }
    }
}

impl RateLimitingConfig {
    /// Validate into a limiter configuration.
    pub fn limiter_config(&self) -> Result<LimiterConfig> {
        LimiterConfig::new(self.unit, self.request_limit)
    }
}

fn default_unit() -> TimeWindow {
    TimeWindow::Second
}

fn default_request_limit() -> i64 {
    10
}

impl CrptConfig {
    /// Load configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(|e| {
            CrptError::InvalidConfiguration(format!("Failed to parse configuration: {}", e))
        })
    }

    /// Load configuration from an optional file, then apply `CRPT__*`
    /// environment overrides on top.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder();

        if let Some(path) = path {
            info!(path = %path.display(), "Loading configuration file");
            builder = builder.add_source(File::from(path));
        }

        builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .and_then(|settings| settings.try_deserialize::<CrptConfig>())
            .map_err(|e| {
                CrptError::InvalidConfiguration(format!("Failed to load configuration: {}", e))
            })
    }
}
