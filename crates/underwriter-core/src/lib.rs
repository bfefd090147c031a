//! # underwriter-core
//!
//! Deterministic insurance underwriting pipeline.
//!
//! Given a [`RiskProfile`], the pipeline answers:
//! - Approve, reject, or refer for manual review?
//! - How risky is the applicant (0..=100)?
//! - Which path decided, and how far can the decision be trusted?
//!
//! ## Pipeline
//!
//! 1. **Rules**: every matching rule fires in priority order
//! 2. **Fallback**: score-based or classifier assessment when rules left the case undecided
//! 3. **Scoring**: a risk score is always computed if no stage set one
//! 4. **Compliance**: the decision is annotated, never blocked
//! 5. **Finalization**: default terms and confidence
//!
//! No network I/O happens here; credit enrichment and the async surface live
//! in `underwriter-runtime`.
//!
//! ## Example
//!
//! ```rust,ignore
//! use underwriter_core::{Coverage, DrivingRecord, RiskProfile, Underwriter};
//!
//! let underwriter = Underwriter::standard()?;
//! let profile = RiskProfile {
//!     credit_score: Some(720),
//!     ..RiskProfile::new("CUST001", Coverage::Auto(DrivingRecord::default()))
//! };
//! let decision = underwriter.evaluate(&profile)?;
//! println!("{}", decision.summary());
//! ```

pub mod classifier;
pub mod compliance;
pub mod config;
pub mod fallback;
pub mod finalizer;
pub mod masking;
pub mod pipeline;
pub mod rules;
pub mod scoring;
pub mod types;

// Re-export main types at crate root
pub use classifier::{
    ClassDistribution, Classification, Classifier, ClassifierAssessor, ClassifierError,
    DecisionTreeClassifier, ModelError, ProfileFeatures,
};
pub use compliance::ComplianceValidator;
pub use config::UnderwritingConfig;
pub use fallback::FallbackResolver;
pub use finalizer::DecisionFinalizer;
pub use pipeline::{Underwriter, UnderwriterBuilder};
pub use rules::{
    Rule, RuleEvaluationError, RuleEvaluator, RuleSession, RuleSet, RuleSetDefinition,
    RuleSetError,
};
pub use scoring::{ScoreAssessor, ScoreBreakdown};
pub use types::{
    Coverage, Decision, DecisionMethod, DrivingRecord, HealthDetails, InsuranceCategory, Outcome,
    PropertyDetails, ProfileError, RiskLevel, RiskProfile,
};

use thiserror::Error;

/// Errors from building or running the pipeline.
#[derive(Error, Debug)]
pub enum UnderwritingError {
    #[error("invalid profile: {0}")]
    InvalidProfile(#[from] ProfileError),

    #[error("rule set error: {0}")]
    RuleSet(#[from] RuleSetError),

    #[error("rule evaluation failed: {0}")]
    RuleEvaluation(#[from] RuleEvaluationError),

    #[error("classifier model error: {0}")]
    Model(#[from] ModelError),
}

/// Evaluate a profile with the standard rules and score-based fallback.
///
/// Loads the embedded rule set on every call; build an [`Underwriter`] once
/// when evaluating many profiles.
pub fn evaluate(profile: &RiskProfile) -> Result<Decision, UnderwritingError> {
    Underwriter::standard()?.evaluate(profile)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_evaluation() {
        let profile = RiskProfile {
            credit_score: Some(760),
            ..RiskProfile::new("CUST001", Coverage::Auto(DrivingRecord::default()))
        };
        let decision = evaluate(&profile).unwrap();

        assert_eq!(decision.outcome, Some(Outcome::Approve));
        assert_eq!(decision.risk_level, Some(RiskLevel::Low));
        assert!(decision.compliance_passed);
        assert!(decision
            .positive_factors
            .contains(&"Excellent credit score".to_string()));
    }

    #[test]
    fn test_dui_never_approved() {
        let profile = RiskProfile {
            credit_score: Some(800),
            ..RiskProfile::new(
                "CUST002",
                Coverage::Auto(DrivingRecord {
                    dui: true,
                    ..DrivingRecord::default()
                }),
            )
        };
        let decision = evaluate(&profile).unwrap();
        assert_ne!(decision.outcome, Some(Outcome::Approve));
    }
}
