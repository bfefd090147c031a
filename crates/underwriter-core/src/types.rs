//! Core types for underwriting: the applicant risk profile and the decision
//! accumulator that each pipeline stage writes into.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

use crate::masking::redact_identifiers;

/// Lowest credit score a bureau can report.
pub const MIN_CREDIT_SCORE: u16 = 300;

/// Highest credit score a bureau can report.
pub const MAX_CREDIT_SCORE: u16 = 850;

/// Errors for profiles the pipeline refuses to evaluate.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProfileError {
    #[error("customer id is required")]
    EmptyCustomerId,

    #[error("credit score {0} outside {MIN_CREDIT_SCORE}..={MAX_CREDIT_SCORE}")]
    CreditScoreOutOfRange(u16),

    #[error("unknown insurance category: {0}")]
    UnknownCategory(String),
}

/// Line of business being underwritten.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsuranceCategory {
    Auto,
    Home,
    Life,
    Health,
}

impl InsuranceCategory {
    pub const ALL: [InsuranceCategory; 4] = [
        InsuranceCategory::Auto,
        InsuranceCategory::Home,
        InsuranceCategory::Life,
        InsuranceCategory::Health,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            InsuranceCategory::Auto => "auto",
            InsuranceCategory::Home => "home",
            InsuranceCategory::Life => "life",
            InsuranceCategory::Health => "health",
        }
    }
}

impl fmt::Display for InsuranceCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InsuranceCategory {
    type Err = ProfileError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        InsuranceCategory::ALL
            .into_iter()
            .find(|category| category.as_str().eq_ignore_ascii_case(value.trim()))
            .ok_or_else(|| ProfileError::UnknownCategory(value.to_string()))
    }
}

/// Driving record facts used for auto coverage.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DrivingRecord {
    pub driving_violations: u32,
    pub at_fault_accidents: u32,
    /// Driving under the influence on record
    pub dui: bool,
    pub years_licensed: Option<u32>,
}

/// Property facts used for home coverage.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PropertyDetails {
    /// Age of the dwelling in years
    pub property_age: Option<u32>,
    pub in_flood_zone: bool,
    /// `None` when the applicant did not answer
    pub has_security_system: Option<bool>,
}

/// Health facts shared by life and health coverage.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HealthDetails {
    pub smoker: bool,
    pub medical_conditions: Vec<String>,
    pub occupation: Option<String>,
}

/// Category together with the facts that only make sense for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "category", rename_all = "snake_case")]
pub enum Coverage {
    Auto(DrivingRecord),
    Home(PropertyDetails),
    Life(HealthDetails),
    Health(HealthDetails),
}

impl Coverage {
    pub fn category(&self) -> InsuranceCategory {
        match self {
            Coverage::Auto(_) => InsuranceCategory::Auto,
            Coverage::Home(_) => InsuranceCategory::Home,
            Coverage::Life(_) => InsuranceCategory::Life,
            Coverage::Health(_) => InsuranceCategory::Health,
        }
    }

    /// Empty coverage details for a category.
    pub fn empty(category: InsuranceCategory) -> Self {
        match category {
            InsuranceCategory::Auto => Coverage::Auto(DrivingRecord::default()),
            InsuranceCategory::Home => Coverage::Home(PropertyDetails::default()),
            InsuranceCategory::Life => Coverage::Life(HealthDetails::default()),
            InsuranceCategory::Health => Coverage::Health(HealthDetails::default()),
        }
    }
}

/// The applicant facts submitted for underwriting.
///
/// Treated as immutable by the pipeline. Enrichment produces a new profile
/// through [`RiskProfile::with_credit_score`] rather than editing in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskProfile {
    pub customer_id: String,

    /// Bureau score in 300..=850, filled by enrichment when missing
    #[serde(default)]
    pub credit_score: Option<u16>,

    /// Claims filed over the trailing three years
    #[serde(default)]
    pub claims_in_last_3_years: u32,

    /// Total paid on those claims
    #[serde(default)]
    pub total_claim_amount: f64,

    pub coverage: Coverage,

    #[serde(default)]
    pub prior_cancellation: bool,

    #[serde(default)]
    pub prior_denial: bool,

    #[serde(default)]
    pub age: Option<u32>,

    #[serde(default)]
    pub address: Option<String>,

    #[serde(default)]
    pub external_credit_check_completed: bool,

    #[serde(default)]
    pub driving_record_check_completed: bool,
}

impl RiskProfile {
    /// Create a profile with no history for the given coverage.
    pub fn new(customer_id: impl Into<String>, coverage: Coverage) -> Self {
        Self {
            customer_id: customer_id.into(),
            credit_score: None,
            claims_in_last_3_years: 0,
            total_claim_amount: 0.0,
            coverage,
            prior_cancellation: false,
            prior_denial: false,
            age: None,
            address: None,
            external_credit_check_completed: false,
            driving_record_check_completed: false,
        }
    }

    pub fn category(&self) -> InsuranceCategory {
        self.coverage.category()
    }

    pub fn driving_record(&self) -> Option<&DrivingRecord> {
        match &self.coverage {
            Coverage::Auto(record) => Some(record),
            _ => None,
        }
    }

    pub fn property(&self) -> Option<&PropertyDetails> {
        match &self.coverage {
            Coverage::Home(property) => Some(property),
            _ => None,
        }
    }

    pub fn health(&self) -> Option<&HealthDetails> {
        match &self.coverage {
            Coverage::Life(health) | Coverage::Health(health) => Some(health),
            _ => None,
        }
    }

    /// Check the caller-side invariants.
    pub fn validate(&self) -> Result<(), ProfileError> {
        if self.customer_id.trim().is_empty() {
            return Err(ProfileError::EmptyCustomerId);
        }

        if let Some(score) = self.credit_score {
            if !(MIN_CREDIT_SCORE..=MAX_CREDIT_SCORE).contains(&score) {
                return Err(ProfileError::CreditScoreOutOfRange(score));
            }
        }

        Ok(())
    }

    /// Copy of this profile carrying a bureau-supplied credit score.
    pub fn with_credit_score(mut self, score: u16) -> Self {
        self.credit_score = Some(score);
        self.external_credit_check_completed = true;
        self
    }
}

/// Underwriting outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Outcome {
    #[serde(alias = "approve")]
    Approve,
    #[serde(alias = "reject")]
    Reject,
    #[serde(alias = "refer")]
    Refer,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Approve => "APPROVE",
            Outcome::Reject => "REJECT",
            Outcome::Refer => "REFER",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Risk band attached to a decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskLevel {
    #[serde(alias = "low")]
    Low,
    #[serde(alias = "medium")]
    Medium,
    #[serde(alias = "high")]
    High,
    #[serde(alias = "very_high")]
    VeryHigh,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "LOW",
            RiskLevel::Medium => "MEDIUM",
            RiskLevel::High => "HIGH",
            RiskLevel::VeryHigh => "VERY_HIGH",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which path produced the outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DecisionMethod {
    RulesEngine,
    MachineLearning,
    StandardAssessment,
    ErrorFallback,
}

impl DecisionMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            DecisionMethod::RulesEngine => "RULES_ENGINE",
            DecisionMethod::MachineLearning => "MACHINE_LEARNING",
            DecisionMethod::StandardAssessment => "STANDARD_ASSESSMENT",
            DecisionMethod::ErrorFallback => "ERROR_FALLBACK",
        }
    }
}

impl fmt::Display for DecisionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Underwriting decision.
///
/// Built empty at pipeline start, written by each stage in turn, and handed to
/// the caller by value once the finalizer has run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    pub decision_id: String,
    pub customer_id: String,
    pub decided_at: DateTime<Utc>,

    /// `None` until a rule or assessor decides
    pub outcome: Option<Outcome>,

    /// Expected in 0..=100; checked by the compliance validator
    pub risk_score: Option<u8>,
    pub risk_level: Option<RiskLevel>,

    pub risk_factors: Vec<String>,
    pub positive_factors: Vec<String>,
    pub exclusions: Vec<String>,
    pub conditions: Vec<String>,

    /// Set on standard-assessment approvals
    pub premium_multiplier: Option<f64>,
    pub extra_premium: Option<f64>,
    pub terms: Option<String>,

    pub decision_reason: Option<String>,
    /// Set on referrals
    pub referral_reason: Option<String>,
    pub manual_review_required: bool,

    pub compliance_passed: bool,
    pub compliance_issues: Vec<String>,

    pub method: Option<DecisionMethod>,
    /// Trust in the producing method, 0.0..=1.0
    pub confidence: Option<f64>,

    /// Rule ids that fired, in execution order
    pub rules_fired: Vec<String>,
}

impl Decision {
    /// Create an empty, undecided decision for a customer.
    pub fn new(customer_id: impl Into<String>) -> Self {
        Self {
            decision_id: Uuid::new_v4().to_string(),
            customer_id: customer_id.into(),
            decided_at: Utc::now(),
            outcome: None,
            risk_score: None,
            risk_level: None,
            risk_factors: Vec::new(),
            positive_factors: Vec::new(),
            exclusions: Vec::new(),
            conditions: Vec::new(),
            premium_multiplier: None,
            extra_premium: None,
            terms: None,
            decision_reason: None,
            referral_reason: None,
            manual_review_required: false,
            compliance_passed: false,
            compliance_issues: Vec::new(),
            method: None,
            confidence: None,
            rules_fired: Vec::new(),
        }
    }

    /// Terminal decision for an evaluation that failed unexpectedly.
    ///
    /// Identifier-like sequences in `summary` are redacted before they land in
    /// the referral reason.
    pub fn error_fallback(customer_id: impl Into<String>, summary: &str) -> Self {
        let mut decision = Self::new(customer_id);
        decision.outcome = Some(Outcome::Refer);
        decision.referral_reason = Some(format!("System error: {}", redact_identifiers(summary)));
        decision.manual_review_required = true;
        decision.method = Some(DecisionMethod::ErrorFallback);
        decision.compliance_passed = false;
        decision
    }

    pub fn is_decided(&self) -> bool {
        self.outcome.is_some()
    }

    /// One-line human readable summary.
    pub fn summary(&self) -> String {
        let outcome = self.outcome.map(|o| o.as_str()).unwrap_or("UNDECIDED");
        let score = self
            .risk_score
            .map(|s| s.to_string())
            .unwrap_or_else(|| "-".to_string());
        let level = self.risk_level.map(|l| l.as_str()).unwrap_or("UNKNOWN");
        let method = self.method.map(|m| m.as_str()).unwrap_or("NONE");
        format!("{outcome} (score {score}, risk {level}, via {method})")
    }
}
