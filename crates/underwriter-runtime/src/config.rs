//! Runtime configuration.
//!
//! ```yaml
//! underwriting:
//!   use_classifier: false
//!   rules_path: rules/underwriting.yaml
//! enrichment:
//!   enabled: true
//!   timeout: 30s
//!   cache_ttl: 15m
//!   cache_capacity: 10000
//!   circuit_breaker:
//!     failure_threshold: 3
//!     recovery_timeout: 30s
//!     success_threshold: 2
//! bureau:
//!   provider: simulated
//!   settings:
//!     seed: 42
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use underwriter_core::UnderwritingConfig;

use crate::cache::{DEFAULT_CACHE_CAPACITY, DEFAULT_CACHE_TTL};
use crate::resilience::{humantime_duration, CircuitBreakerConfig};

/// Environment variable overriding `enrichment.enabled`.
pub const ENRICHMENT_ENABLED_ENV: &str = "UNDERWRITER_ENRICHMENT_ENABLED";

/// Default bound on a whole enrichment call.
pub const DEFAULT_ENRICHMENT_TIMEOUT: Duration = Duration::from_secs(30);

/// Errors loading runtime configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Top-level runtime configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RuntimeConfig {
    /// Synchronous pipeline settings
    pub underwriting: UnderwritingConfig,

    pub enrichment: EnrichmentConfig,

    pub bureau: BureauConfig,
}

/// Credit enrichment settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EnrichmentConfig {
    /// Call the bureau for profiles without a completed credit check
    pub enabled: bool,

    /// Bound on a whole enrichment call, retries included
    #[serde(with = "humantime_duration")]
    pub timeout: Duration,

    /// Lifetime of a cached report
    #[serde(with = "humantime_duration")]
    pub cache_ttl: Duration,

    pub cache_capacity: u64,

    pub circuit_breaker: CircuitBreakerConfig,
}

impl Default for EnrichmentConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            timeout: DEFAULT_ENRICHMENT_TIMEOUT,
            cache_ttl: DEFAULT_CACHE_TTL,
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            circuit_breaker: CircuitBreakerConfig::default(),
        }
    }
}

/// Bureau provider selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BureauConfig {
    /// Registered provider type, e.g. `simulated` or `http`
    pub provider: String,

    /// Provider-specific settings
    pub settings: JsonValue,
}

impl Default for BureauConfig {
    fn default() -> Self {
        Self {
            provider: "simulated".to_string(),
            settings: JsonValue::Object(Default::default()),
        }
    }
}

impl RuntimeConfig {
    /// Parse from YAML and apply environment overrides.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let mut config: Self = serde_yaml::from_str(yaml)?;
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Apply `UNDERWRITER_ENRICHMENT_ENABLED` when set.
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Ok(value) = std::env::var(ENRICHMENT_ENABLED_ENV) {
            self.enrichment.enabled = parse_flag(&value).ok_or_else(|| {
                ConfigError::Invalid(format!(
                    "{ENRICHMENT_ENABLED_ENV} must be true or false, got '{value}'"
                ))
            })?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.enrichment.timeout.is_zero() {
            return Err(ConfigError::Invalid(
                "enrichment.timeout must be greater than zero".to_string(),
            ));
        }
        if self.enrichment.circuit_breaker.failure_threshold == 0 {
            return Err(ConfigError::Invalid(
                "enrichment.circuit_breaker.failure_threshold must be at least 1".to_string(),
            ));
        }
        if self.bureau.provider.trim().is_empty() {
            return Err(ConfigError::Invalid("bureau.provider is empty".to_string()));
        }
        Ok(())
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}
