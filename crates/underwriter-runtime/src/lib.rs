//! # underwriter-runtime
//!
//! Async surface for `underwriter-core`.
//!
//! The core pipeline is deterministic and performs no I/O. This crate adds:
//! - Credit enrichment from a pluggable bureau, bounded by a timeout and
//!   guarded by a circuit breaker and a report cache
//! - An orchestrator with a propagating entry point and a never-failing
//!   entry point that runs on the tokio worker pool
//! - YAML runtime configuration
//!
//! Enrichment failures are never fatal: the profile's own credit score is
//! used instead.
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use underwriter_runtime::{BureauRegistry, RuntimeConfig, UnderwritingOrchestrator};
//!
//! let config = RuntimeConfig::from_yaml_file("underwriter.yaml")?;
//! let orchestrator = Arc::new(UnderwritingOrchestrator::from_config(
//!     &config,
//!     &BureauRegistry::with_defaults(),
//! )?);
//!
//! let decision = orchestrator.evaluate_async(profile).await;
//! println!("{}", decision.summary());
//! ```

pub mod bureau;
pub mod cache;
pub mod config;
pub mod enrichment;
pub mod orchestrator;
pub mod resilience;

pub use bureau::{
    risk_level_for_score, ApiCredential, BureauError, BureauFactory, BureauRegistry,
    CreditBureau, CreditReport, CredentialSource, SimulatedBureau, SimulatedBureauFactory, TaxId,
};
#[cfg(feature = "http-bureau")]
pub use bureau::{HttpBureau, HttpBureauFactory};
pub use cache::ReportCache;
pub use config::{BureauConfig, ConfigError, EnrichmentConfig, RuntimeConfig};
pub use enrichment::{CreditEnricher, EnrichmentError};
pub use orchestrator::{RuntimeError, UnderwritingOrchestrator, UnderwritingOrchestratorBuilder};
pub use resilience::{CircuitBreaker, CircuitBreakerConfig, CircuitState};
