//! Fallback resolution for cases the rules left undecided.

use crate::classifier::ClassifierAssessor;
use crate::scoring::ScoreAssessor;
use crate::types::{Decision, DecisionMethod, RiskProfile};

/// Strategy used when no rule set an outcome.
#[derive(Debug, Clone)]
pub enum FallbackResolver {
    /// Deterministic weighted scoring
    ScoreBased(ScoreAssessor),

    /// Statistical classifier
    Classifier(ClassifierAssessor),
}

impl Default for FallbackResolver {
    fn default() -> Self {
        Self::ScoreBased(ScoreAssessor::new())
    }
}

impl FallbackResolver {
    /// Method tag this strategy writes on the decision.
    pub fn method(&self) -> DecisionMethod {
        match self {
            FallbackResolver::ScoreBased(_) => DecisionMethod::StandardAssessment,
            FallbackResolver::Classifier(_) => DecisionMethod::MachineLearning,
        }
    }

    pub fn resolve(&self, profile: &RiskProfile, decision: &mut Decision) {
        match self {
            FallbackResolver::ScoreBased(assessor) => assessor.assess(profile, decision),
            FallbackResolver::Classifier(assessor) => assessor.assess(profile, decision),
        }
        decision.method = Some(self.method());
    }
}
