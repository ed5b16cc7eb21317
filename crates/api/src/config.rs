//! Service configuration

use crate::rate_limit::RateLimitConfig;
use serde::Deserialize;

/// Base name of the optional configuration file (`.toml`, `.yaml`, `.json`)
pub const CONFIG_FILE: &str = "vehicle-fault-service";
/// Prefix of environment overrides, e.g. `FAULT_SERVICE__LOG__LEVEL=debug`
pub const ENV_PREFIX: &str = "FAULT_SERVICE";

/// Service configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    /// Listen address
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    #[serde(default)]
    pub log: LogConfig,

    #[serde(default)]
    pub rate_limit: RateLimitConfig,
}

/// Logging output
#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// Filter directive used when `RUST_LOG` is unset
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of plain text
    #[serde(default)]
    pub json: bool,
}

fn default_bind_addr() -> String {
    "0.0.0.0:5000".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            log: LogConfig::default(),
            rate_limit: RateLimitConfig::default(),
        }
    }
}

impl ServiceConfig {
    /// Load configuration from the default file and environment
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::load_from(CONFIG_FILE)
    }

    /// Load from `file` (optional) with environment overrides on top
    pub fn load_from(file: &str) -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(config::File::with_name(file).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }
}
