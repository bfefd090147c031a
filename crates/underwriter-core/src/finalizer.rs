//! Derived decision fields: default terms and confidence.

use crate::types::{Decision, DecisionMethod, Outcome};

pub const RULES_ENGINE_CONFIDENCE: f64 = 0.95;
pub const MACHINE_LEARNING_CONFIDENCE: f64 = 0.85;
pub const DEFAULT_CONFIDENCE: f64 = 0.75;

#[derive(Debug, Clone, Copy, Default)]
pub struct DecisionFinalizer;

impl DecisionFinalizer {
    pub fn new() -> Self {
        Self
    }

    /// Fill `terms` and `confidence` when no earlier stage set them.
    pub fn finalize(&self, decision: &mut Decision) {
        if decision.terms.is_none() {
            decision.terms = Some(default_terms(decision));
        }

        if decision.confidence.is_none() {
            decision.confidence = Some(confidence_for(decision.method));
        }
    }
}

fn default_terms(decision: &Decision) -> String {
    match decision.outcome {
        Some(Outcome::Reject) => "Application rejected".to_string(),
        Some(Outcome::Refer) => "Pending manual review".to_string(),
        _ => {
            let mut terms = String::from("Standard policy terms");
            if !decision.exclusions.is_empty() {
                terms.push_str(&format!(" with {} exclusion(s)", decision.exclusions.len()));
            }
            if !decision.conditions.is_empty() {
                terms.push_str(&format!(", {} condition(s) apply", decision.conditions.len()));
            }
            terms
        }
    }
}

pub fn confidence_for(method: Option<DecisionMethod>) -> f64 {
    match method {
        Some(DecisionMethod::RulesEngine) => RULES_ENGINE_CONFIDENCE,
        Some(DecisionMethod::MachineLearning) => MACHINE_LEARNING_CONFIDENCE,
        _ => DEFAULT_CONFIDENCE,
    }
}
