//! Credit enrichment.
//!
//! Fills in a bureau credit score for profiles that have not had an external
//! credit check. Enrichment never fails the evaluation: on timeout, bureau
//! error, open circuit or an out-of-range report the profile is used as-is.

use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

use underwriter_core::masking::Masked;
use underwriter_core::types::{MAX_CREDIT_SCORE, MIN_CREDIT_SCORE};
use underwriter_core::RiskProfile;

use crate::bureau::{BureauError, CreditBureau, CreditReport, TaxId};
use crate::cache::ReportCache;
use crate::config::{EnrichmentConfig, DEFAULT_ENRICHMENT_TIMEOUT};
use crate::resilience::{CircuitBreaker, CircuitBreakerConfig};

/// Why an enrichment attempt produced no report.
#[derive(Error, Debug)]
pub enum EnrichmentError {
    #[error("bureau circuit is open")]
    CircuitOpen,

    #[error("bureau call timed out after {0:?}")]
    Timeout(Duration),

    #[error("bureau error: {0}")]
    Bureau(#[from] BureauError),

    #[error("bureau reported credit score {0} outside 300..=850")]
    InvalidReport(u16),
}

/// Bureau client wrapped in a timeout, a circuit breaker and a report cache.
pub struct CreditEnricher {
    bureau: Arc<dyn CreditBureau>,
    cache: ReportCache,
    breaker: CircuitBreaker,
    timeout: Duration,
}

impl CreditEnricher {
    /// Enricher with default timeout, cache and circuit breaker.
    pub fn new(bureau: Arc<dyn CreditBureau>) -> Self {
        Self {
            bureau,
            cache: ReportCache::default(),
            breaker: CircuitBreaker::default(),
            timeout: DEFAULT_ENRICHMENT_TIMEOUT,
        }
    }

    pub fn from_config(bureau: Arc<dyn CreditBureau>, config: &EnrichmentConfig) -> Self {
        Self {
            bureau,
            cache: ReportCache::new(config.cache_capacity, config.cache_ttl),
            breaker: CircuitBreaker::new(config.circuit_breaker.clone()),
            timeout: config.timeout,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_circuit_breaker(mut self, config: CircuitBreakerConfig) -> Self {
        self.breaker = CircuitBreaker::new(config);
        self
    }

    pub fn bureau_name(&self) -> &str {
        self.bureau.name()
    }

    pub fn circuit_breaker(&self) -> &CircuitBreaker {
        &self.breaker
    }

    pub fn cache(&self) -> &ReportCache {
        &self.cache
    }

    /// Return the profile with a bureau credit score when one can be had.
    ///
    /// Profiles whose external credit check already completed are returned
    /// unchanged without calling the bureau.
    pub async fn enrich(&self, profile: RiskProfile, tax_id: Option<&TaxId>) -> RiskProfile {
        if profile.external_credit_check_completed {
            debug!(customer = %Masked(&profile.customer_id), "credit check already completed");
            return profile;
        }

        match self.fetch(&profile.customer_id, tax_id).await {
            Ok(report) => {
                info!(
                    customer = %Masked(&profile.customer_id),
                    bureau = %report.bureau,
                    bureau_risk_level = %report.risk_level,
                    "credit score enriched"
                );
                profile.with_credit_score(report.score)
            }
            Err(e) => {
                warn!(
                    customer = %Masked(&profile.customer_id),
                    error = %e,
                    "credit enrichment failed, using profile credit score"
                );
                profile
            }
        }
    }

    /// Fetch a validated report, consulting the cache first.
    pub async fn fetch(
        &self,
        customer_id: &str,
        tax_id: Option<&TaxId>,
    ) -> Result<CreditReport, EnrichmentError> {
        if let Some(report) = self.cache.get(customer_id).await {
            debug!(customer = %Masked(customer_id), "credit report served from cache");
            return Ok(report);
        }

        if self.breaker.is_open() {
            return Err(EnrichmentError::CircuitOpen);
        }

        let placeholder;
        let tax_id = match tax_id {
            Some(tax_id) => tax_id,
            None => {
                placeholder = TaxId::placeholder_for(customer_id);
                &placeholder
            }
        };

        let call = self.bureau.fetch_credit_score(customer_id, tax_id);
        let result = match tokio::time::timeout(self.timeout, call).await {
            Ok(Ok(report)) => validate_report(report),
            Ok(Err(e)) => Err(EnrichmentError::Bureau(e)),
            Err(_) => Err(EnrichmentError::Timeout(self.timeout)),
        };

        match &result {
            Ok(report) => {
                self.breaker.record_success();
                self.cache.insert(customer_id, report.clone()).await;
            }
            Err(_) => self.breaker.record_failure(),
        }

        result
    }
}

impl std::fmt::Debug for CreditEnricher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CreditEnricher")
            .field("bureau", &self.bureau.name())
            .field("timeout", &self.timeout)
            .field("breaker", &self.breaker)
            .finish()
    }
}

fn validate_report(report: CreditReport) -> Result<CreditReport, EnrichmentError> {
    if (MIN_CREDIT_SCORE..=MAX_CREDIT_SCORE).contains(&report.score) {
        Ok(report)
    } else {
        Err(EnrichmentError::InvalidReport(report.score))
    }
}
