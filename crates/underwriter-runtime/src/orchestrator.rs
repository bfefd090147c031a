//! Async underwriting orchestrator.
//!
//! Wraps the synchronous [`Underwriter`] with:
//! - An audit entry for every request, customer id masked
//! - Optional credit enrichment before the rules run
//! - A propagating entry point ([`UnderwritingOrchestrator::evaluate`])
//! - A never-failing entry point on the tokio worker pool
//!   ([`UnderwritingOrchestrator::evaluate_async`]) that turns errors and
//!   panics into an ERROR_FALLBACK referral

use futures::future::join_all;
use std::any::Any;
use std::sync::Arc;
use thiserror::Error;
use tracing::error;

use underwriter_core::masking::{audit_decision, audit_evaluation_started, Masked};
use underwriter_core::{Decision, RiskProfile, Underwriter, UnderwritingError};

use crate::bureau::{BureauError, BureauRegistry, TaxId};
use crate::config::{ConfigError, RuntimeConfig};
use crate::enrichment::CreditEnricher;

/// Errors from the runtime orchestrator.
#[derive(Error, Debug)]
pub enum RuntimeError {
    #[error("Underwriting failed: {0}")]
    Underwriting(#[from] UnderwritingError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Bureau error: {0}")]
    Bureau(#[from] BureauError),
}

/// Runs the underwriting pipeline with optional credit enrichment.
///
/// Evaluations share no mutable state apart from the enricher's cache and
/// circuit breaker, so one orchestrator serves any number of concurrent calls.
pub struct UnderwritingOrchestrator {
    underwriter: Arc<Underwriter>,
    enricher: Option<CreditEnricher>,
}

impl UnderwritingOrchestrator {
    /// Orchestrator without enrichment.
    pub fn new(underwriter: Underwriter) -> Self {
        Self {
            underwriter: Arc::new(underwriter),
            enricher: None,
        }
    }

    pub fn builder() -> UnderwritingOrchestratorBuilder {
        UnderwritingOrchestratorBuilder::default()
    }

    /// Build from runtime configuration.
    ///
    /// The bureau settings are validated and the bureau created only when
    /// enrichment is enabled. Rule set, model and bureau errors are returned
    /// as startup errors.
    pub fn from_config(
        config: &RuntimeConfig,
        registry: &BureauRegistry,
    ) -> Result<Self, RuntimeError> {
        config.validate()?;

        let underwriter = Underwriter::from_config(&config.underwriting)?;
        let mut builder = Self::builder().underwriter(underwriter);

        if config.enrichment.enabled {
            let provider = config.bureau.provider.as_str();
            registry.validate(provider, &config.bureau.settings)?;
            let bureau = registry.create(provider, &config.bureau.settings)?;
            tracing::info!(
                bureau = bureau.name(),
                provider = registry.description(provider).unwrap_or(provider),
                "credit enrichment enabled"
            );
            builder = builder.enricher(CreditEnricher::from_config(bureau, &config.enrichment));
        }

        builder.build()
    }

    pub fn underwriter(&self) -> &Underwriter {
        &self.underwriter
    }

    pub fn enricher(&self) -> Option<&CreditEnricher> {
        self.enricher.as_ref()
    }

    pub fn enrichment_enabled(&self) -> bool {
        self.enricher.is_some()
    }

    /// Evaluate a profile, propagating pipeline errors.
    pub async fn evaluate(&self, profile: &RiskProfile) -> Result<Decision, RuntimeError> {
        self.evaluate_with_tax_id(profile, None).await
    }

    /// Evaluate a profile, passing the tax id to the bureau if enrichment runs.
    pub async fn evaluate_with_tax_id(
        &self,
        profile: &RiskProfile,
        tax_id: Option<&TaxId>,
    ) -> Result<Decision, RuntimeError> {
        audit_evaluation_started(profile);
        profile.validate().map_err(UnderwritingError::from)?;

        let decision = match &self.enricher {
            Some(enricher) => {
                let enriched = enricher.enrich(profile.clone(), tax_id).await;
                self.underwriter.decide(&enriched)?
            }
            None => self.underwriter.decide(profile)?,
        };

        Ok(decision)
    }

    /// Evaluate on the worker pool. Never fails.
    ///
    /// Errors and panics become an ERROR_FALLBACK referral flagged for
    /// manual review with compliance not passed.
    pub async fn evaluate_async(self: &Arc<Self>, profile: RiskProfile) -> Decision {
        let customer_id = profile.customer_id.clone();
        let orchestrator = Arc::clone(self);

        let handle = tokio::spawn(async move { orchestrator.evaluate(&profile).await });

        let summary = match handle.await {
            Ok(Ok(decision)) => return decision,
            Ok(Err(e)) => e.to_string(),
            Err(join_error) if join_error.is_panic() => {
                format!("evaluation panicked: {}", panic_message(join_error.into_panic()))
            }
            Err(join_error) => join_error.to_string(),
        };

        error!(
            customer = %Masked(&customer_id),
            error = %summary,
            "underwriting failed, returning error fallback decision"
        );
        let decision = Decision::error_fallback(customer_id, &summary);
        audit_decision(&decision);
        decision
    }

    /// Evaluate many profiles concurrently. Decisions are in input order.
    pub async fn evaluate_batch(self: &Arc<Self>, profiles: Vec<RiskProfile>) -> Vec<Decision> {
        join_all(
            profiles
                .into_iter()
                .map(|profile| self.evaluate_async(profile)),
        )
        .await
    }
}

impl std::fmt::Debug for UnderwritingOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UnderwritingOrchestrator")
            .field("underwriter", &self.underwriter)
            .field("enricher", &self.enricher)
            .finish()
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Builder for [`UnderwritingOrchestrator`].
#[derive(Default)]
pub struct UnderwritingOrchestratorBuilder {
    underwriter: Option<Underwriter>,
    enricher: Option<CreditEnricher>,
}

impl UnderwritingOrchestratorBuilder {
    /// Pipeline to run. Defaults to [`Underwriter::standard`].
    pub fn underwriter(mut self, underwriter: Underwriter) -> Self {
        self.underwriter = Some(underwriter);
        self
    }

    /// Enable credit enrichment.
    pub fn enricher(mut self, enricher: CreditEnricher) -> Self {
        self.enricher = Some(enricher);
        self
    }

    pub fn build(self) -> Result<UnderwritingOrchestrator, RuntimeError> {
        let underwriter = match self.underwriter {
            Some(underwriter) => underwriter,
            None => Underwriter::standard()?,
        };

        Ok(UnderwritingOrchestrator {
            underwriter: Arc::new(underwriter),
            enricher: self.enricher,
        })
    }
}
