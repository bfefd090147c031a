//! Credit bureau collaborators.
//!
//! A bureau answers one question: what is this customer's credit score?
//! Implementations are created by name through a [`BureauRegistry`], so the
//! runtime configuration picks the provider without code changes.
//!
//! ## Security
//!
//! Tax identifiers travel as [`TaxId`] and bureau credentials as
//! [`ApiCredential`]. Neither prints its value through `Debug` or `Display`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

mod factory;
pub mod secrets;
mod simulated;

#[cfg(feature = "http-bureau")]
mod http;

pub use factory::{BureauFactory, BureauRegistry};
pub use secrets::{ApiCredential, CredentialSource, TaxId};
pub use simulated::{SimulatedBureau, SimulatedBureauFactory};

#[cfg(feature = "http-bureau")]
pub use http::{HttpBureau, HttpBureauFactory};

/// Errors from credit bureaus.
#[derive(Error, Debug)]
pub enum BureauError {
    #[error("HTTP request failed: {0}")]
    HttpError(String),

    #[error("Rate limit exceeded, retry after {retry_after:?}")]
    RateLimited { retry_after: Option<Duration> },

    #[error("API error: {status} - {message}")]
    ApiError { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    ParseError(String),

    #[error("Authentication failed")]
    AuthError,

    #[error("Timeout after {0:?}")]
    Timeout(Duration),

    #[error("Bureau not configured: {0}")]
    NotConfigured(String),
}

impl BureauError {
    /// Whether retrying the same request may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            BureauError::HttpError(_)
            | BureauError::RateLimited { .. }
            | BureauError::Timeout(_) => true,
            BureauError::ApiError { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

/// A bureau's answer for one customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreditReport {
    pub score: u16,

    /// Reporting bureau
    pub bureau: String,

    /// Bureau's own risk band (LOW, MEDIUM, HIGH, VERY_HIGH)
    pub risk_level: String,
}

impl CreditReport {
    /// Report whose risk band is derived from the score.
    pub fn new(score: u16, bureau: impl Into<String>) -> Self {
        Self {
            score,
            bureau: bureau.into(),
            risk_level: risk_level_for_score(score).to_string(),
        }
    }
}

/// Bureau risk band for a credit score.
pub fn risk_level_for_score(score: u16) -> &'static str {
    match score {
        750.. => "LOW",
        650..=749 => "MEDIUM",
        550..=649 => "HIGH",
        _ => "VERY_HIGH",
    }
}

/// Source of credit scores.
#[async_trait]
pub trait CreditBureau: Send + Sync {
    /// Look up the credit score for a customer.
    async fn fetch_credit_score(
        &self,
        customer_id: &str,
        tax_id: &TaxId,
    ) -> Result<CreditReport, BureauError>;

    /// Provider name for logging.
    fn name(&self) -> &str;
}
