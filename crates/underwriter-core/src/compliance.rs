//! Compliance gate. Annotates decisions; never blocks them.

use tracing::{info, warn};

use crate::masking::Masked;
use crate::types::Decision;

pub const ISSUE_DECISION_NULL: &str = "Decision is null";
pub const ISSUE_INVALID_RISK_SCORE: &str = "Invalid risk score";

#[derive(Debug, Clone, Copy, Default)]
pub struct ComplianceValidator;

impl ComplianceValidator {
    pub fn new() -> Self {
        Self
    }

    /// Append compliance issues and set `compliance_passed`.
    pub fn validate(&self, decision: &mut Decision) {
        if decision.outcome.is_none() {
            decision.compliance_issues.push(ISSUE_DECISION_NULL.to_string());
        }

        match decision.risk_score {
            Some(score) if score <= 100 => {}
            _ => decision
                .compliance_issues
                .push(ISSUE_INVALID_RISK_SCORE.to_string()),
        }

        decision.compliance_passed = decision.compliance_issues.is_empty();

        if decision.compliance_passed {
            info!(customer = %Masked(&decision.customer_id), "compliance check passed");
        } else {
            warn!(
                customer = %Masked(&decision.customer_id),
                issues = ?decision.compliance_issues,
                "compliance check failed"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Outcome;

    #[test]
    fn test_complete_decision_passes() {
        let mut decision = Decision::new("CUST001");
        decision.outcome = Some(Outcome::Approve);
        decision.risk_score = Some(0);
        ComplianceValidator::new().validate(&mut decision);
        assert!(decision.compliance_passed);
        assert!(decision.compliance_issues.is_empty());
    }

    #[test]
    fn test_missing_outcome_and_score() {
        let mut decision = Decision::new("CUST001");
        ComplianceValidator::new().validate(&mut decision);
        assert!(!decision.compliance_passed);
        assert_eq!(
            decision.compliance_issues,
            vec![ISSUE_DECISION_NULL, ISSUE_INVALID_RISK_SCORE]
        );
    }

    #[test]
    fn test_out_of_range_score() {
        let mut decision = Decision::new("CUST001");
        decision.outcome = Some(Outcome::Refer);
        decision.risk_score = Some(101);
        ComplianceValidator::new().validate(&mut decision);
        assert!(!decision.compliance_passed);
        assert_eq!(decision.compliance_issues, vec![ISSUE_INVALID_RISK_SCORE]);
    }

    #[test]
    fn test_boundary_score_passes() {
        let mut decision = Decision::new("CUST001");
        decision.outcome = Some(Outcome::Reject);
        decision.risk_score = Some(100);
        ComplianceValidator::new().validate(&mut decision);
        assert!(decision.compliance_passed);
    }
}
