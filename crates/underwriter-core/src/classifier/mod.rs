//! Classifier-based assessment.
//!
//! The pipeline depends only on the [`Classifier`] capability: turn a
//! profile's features into an APPROVE/REJECT/REFER distribution. Model
//! families and training live outside this crate; [`DecisionTreeClassifier`]
//! consumes a serialized tree.

mod tree;

pub use tree::{CategoryBranch, DecisionTreeClassifier, Feature, ModelError, TreeNode};

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tracing::warn;

use crate::masking::Masked;
use crate::types::{Decision, DecisionMethod, InsuranceCategory, Outcome, RiskLevel, RiskProfile};

/// Errors raised by a classifier. Never escape [`ClassifierAssessor`].
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ClassifierError {
    #[error("classifier unavailable: {0}")]
    Unavailable(String),

    #[error("invalid class distribution: {0}")]
    InvalidDistribution(String),

    #[error("inference failed: {0}")]
    Inference(String),
}

/// Model inputs derived from a profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileFeatures {
    pub credit_score: f64,
    pub claims_count: f64,
    pub age: f64,
    pub years_licensed: f64,
    pub category: InsuranceCategory,
}

impl ProfileFeatures {
    pub const DEFAULT_CREDIT_SCORE: f64 = 650.0;
    pub const DEFAULT_AGE: f64 = 30.0;
    pub const DEFAULT_YEARS_LICENSED: f64 = 5.0;

    /// Extract features, substituting defaults for missing values.
    pub fn from_profile(profile: &RiskProfile) -> Self {
        Self {
            credit_score: profile
                .credit_score
                .map(f64::from)
                .unwrap_or(Self::DEFAULT_CREDIT_SCORE),
            claims_count: f64::from(profile.claims_in_last_3_years),
            age: profile.age.map(f64::from).unwrap_or(Self::DEFAULT_AGE),
            years_licensed: profile
                .driving_record()
                .and_then(|d| d.years_licensed)
                .map(f64::from)
                .unwrap_or(Self::DEFAULT_YEARS_LICENSED),
            category: profile.category(),
        }
    }
}

/// Probability per outcome.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassDistribution {
    pub approve: f64,
    pub reject: f64,
    pub refer: f64,
}

impl ClassDistribution {
    pub fn new(approve: f64, reject: f64, refer: f64) -> Self {
        Self {
            approve,
            reject,
            refer,
        }
    }

    pub fn probability(&self, outcome: Outcome) -> f64 {
        match outcome {
            Outcome::Approve => self.approve,
            Outcome::Reject => self.reject,
            Outcome::Refer => self.refer,
        }
    }

    /// Check every entry is finite and non-negative with a positive sum.
    pub fn validate(&self) -> Result<(), ClassifierError> {
        let entries = [self.approve, self.reject, self.refer];
        if entries.iter().any(|p| !p.is_finite() || *p < 0.0) {
            return Err(ClassifierError::InvalidDistribution(format!(
                "entries must be finite and non-negative: {:?}",
                entries
            )));
        }
        if entries.iter().sum::<f64>() <= 0.0 {
            return Err(ClassifierError::InvalidDistribution(
                "entries sum to zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Scale entries to sum to one.
    pub fn normalized(&self) -> Result<Self, ClassifierError> {
        self.validate()?;
        let total = self.approve + self.reject + self.refer;
        Ok(Self::new(
            self.approve / total,
            self.reject / total,
            self.refer / total,
        ))
    }

    /// Most likely outcome. Ties resolve toward REFER, then REJECT.
    pub fn most_likely(&self) -> Outcome {
        [Outcome::Refer, Outcome::Reject, Outcome::Approve]
            .into_iter()
            .fold(Outcome::Refer, |best, candidate| {
                if self.probability(candidate) > self.probability(best) {
                    candidate
                } else {
                    best
                }
            })
    }

    pub fn max_probability(&self) -> f64 {
        self.approve.max(self.reject).max(self.refer)
    }
}

/// Classifier output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub outcome: Outcome,
    pub distribution: ClassDistribution,
}

impl Classification {
    pub fn from_distribution(distribution: ClassDistribution) -> Result<Self, ClassifierError> {
        let distribution = distribution.normalized()?;
        Ok(Self {
            outcome: distribution.most_likely(),
            distribution,
        })
    }
}

/// Capability: classify a profile.
pub trait Classifier: Send + Sync {
    fn name(&self) -> &str;

    fn classify(&self, features: &ProfileFeatures) -> Result<Classification, ClassifierError>;
}

/// Fallback strategy backed by a [`Classifier`].
#[derive(Clone)]
pub struct ClassifierAssessor {
    classifier: Arc<dyn Classifier>,
}

impl std::fmt::Debug for ClassifierAssessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClassifierAssessor")
            .field("classifier", &self.classifier.name())
            .finish()
    }
}

impl ClassifierAssessor {
    pub fn new(classifier: Arc<dyn Classifier>) -> Self {
        Self { classifier }
    }

    pub fn classifier_name(&self) -> &str {
        self.classifier.name()
    }

    /// Decide the profile from the classifier's prediction.
    ///
    /// Classifier failures degrade to a manual-review referral.
    pub fn assess(&self, profile: &RiskProfile, decision: &mut Decision) {
        decision.method = Some(DecisionMethod::MachineLearning);

        let features = ProfileFeatures::from_profile(profile);
        let classification = self
            .classifier
            .classify(&features)
            .and_then(|c| c.distribution.validate().map(|_| c));

        match classification {
            Ok(classification) => {
                apply_classification(&classification, decision);
            }
            Err(e) => {
                warn!(
                    customer = %Masked(&profile.customer_id),
                    classifier = self.classifier.name(),
                    error = %e,
                    "classifier assessment failed, referring"
                );
                decision.outcome = Some(Outcome::Refer);
                decision.referral_reason =
                    Some("Model assessment failed, manual review required".to_string());
                decision.manual_review_required = true;
            }
        }
    }
}

fn apply_classification(classification: &Classification, decision: &mut Decision) {
    decision.outcome = Some(classification.outcome);
    decision.confidence = Some(classification.distribution.max_probability());

    match classification.outcome {
        Outcome::Approve => {
            decision.decision_reason = Some("Model recommends approval".to_string());
            decision.risk_level = Some(RiskLevel::Medium);
            decision.risk_score = Some(30);
            decision.premium_multiplier = Some(1.0);
        }
        Outcome::Reject => {
            decision.decision_reason = Some("Model recommends rejection".to_string());
            decision.risk_level = Some(RiskLevel::VeryHigh);
            decision.risk_score = Some(90);
        }
        Outcome::Refer => {
            decision.decision_reason = Some("Model recommends manual review".to_string());
            decision.referral_reason = Some("Model confidence below threshold".to_string());
            decision.manual_review_required = true;
            decision.risk_level = Some(RiskLevel::High);
            decision.risk_score = Some(65);
        }
    }
}
