//! Bureau factory pattern for choosing a provider from configuration.
//!
//! ## Usage
//!
//! ```ignore
//! let registry = BureauRegistry::with_defaults();
//! let bureau = registry.create("simulated", &serde_json::json!({ "seed": 7 }))?;
//! ```

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::Value as JsonValue;

use super::{BureauError, CreditBureau};

/// Factory for creating credit bureaus from JSON settings.
pub trait BureauFactory: Send + Sync {
    /// Unique identifier for this provider type, e.g. `"simulated"`.
    fn provider_type(&self) -> &'static str;

    /// Create a bureau from provider-specific settings.
    fn create(&self, config: &JsonValue) -> Result<Arc<dyn CreditBureau>, BureauError>;

    /// Validate settings without creating a bureau.
    fn validate_config(&self, config: &JsonValue) -> Result<(), BureauError>;

    fn default_config(&self) -> JsonValue {
        serde_json::json!({})
    }

    fn description(&self) -> &'static str {
        "Credit bureau"
    }
}

/// Registry of available bureau factories, keyed by type name.
#[derive(Default)]
pub struct BureauRegistry {
    factories: BTreeMap<String, Arc<dyn BureauFactory>>,
}

impl BureauRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a factory, replacing any with the same type name.
    pub fn register(&mut self, factory: Arc<dyn BureauFactory>) {
        self.factories
            .insert(factory.provider_type().to_string(), factory);
    }

    pub fn create(
        &self,
        provider_type: &str,
        config: &JsonValue,
    ) -> Result<Arc<dyn CreditBureau>, BureauError> {
        self.factories
            .get(provider_type)
            .ok_or_else(|| {
                BureauError::NotConfigured(format!(
                    "Unknown bureau type: '{}'. Available: {:?}",
                    provider_type,
                    self.available_types()
                ))
            })?
            .create(config)
    }

    pub fn validate(&self, provider_type: &str, config: &JsonValue) -> Result<(), BureauError> {
        self.factories
            .get(provider_type)
            .ok_or_else(|| {
                BureauError::NotConfigured(format!("Unknown bureau type: '{}'", provider_type))
            })?
            .validate_config(config)
    }

    pub fn available_types(&self) -> Vec<&str> {
        self.factories.keys().map(|s| s.as_str()).collect()
    }

    pub fn has_provider(&self, provider_type: &str) -> bool {
        self.factories.contains_key(provider_type)
    }

    pub fn default_config(&self, provider_type: &str) -> Option<JsonValue> {
        self.factories
            .get(provider_type)
            .map(|f| f.default_config())
    }

    pub fn description(&self, provider_type: &str) -> Option<&'static str> {
        self.factories.get(provider_type).map(|f| f.description())
    }

    /// Registry with all built-in bureaus registered.
    #[cfg(feature = "http-bureau")]
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(super::SimulatedBureauFactory));
        registry.register(Arc::new(super::HttpBureauFactory));
        registry
    }

    /// Registry with all built-in bureaus registered.
    #[cfg(not(feature = "http-bureau"))]
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(super::SimulatedBureauFactory));
        registry
    }
}

impl std::fmt::Debug for BureauRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BureauRegistry")
            .field("providers", &self.available_types())
            .finish()
    }
}
