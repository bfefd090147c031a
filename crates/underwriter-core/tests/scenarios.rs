//! End-to-end underwriting scenarios.

use std::sync::Arc;

use underwriter_core::{
    compliance::{ISSUE_DECISION_NULL, ISSUE_INVALID_RISK_SCORE},
    ComplianceValidator, Coverage, Decision, DecisionMethod, DrivingRecord, HealthDetails,
    Outcome, PropertyDetails, RiskLevel, RiskProfile, RuleEvaluationError, RuleEvaluator,
    RuleSet, Underwriter,
};

const NO_DECIDING_RULES: &str = r#"
name: annotations-only
version: "1"
rules:
  - id: FLOOD
    categories: [home]
    when: [{ fact: in_flood_zone, op: eq, value: true }]
    then: { exclusions: ["Flood damage"] }
"#;

fn home_profile() -> RiskProfile {
    RiskProfile {
        credit_score: Some(700),
        claims_in_last_3_years: 0,
        ..RiskProfile::new(
            "CUST-HOME-01",
            Coverage::Home(PropertyDetails {
                property_age: Some(60),
                in_flood_zone: true,
                has_security_system: Some(false),
            }),
        )
    }
}

#[test]
fn home_in_flood_zone_is_approved() {
    let underwriter = Underwriter::standard().unwrap();
    let decision = underwriter.evaluate(&home_profile()).unwrap();

    // 10 credit + min(10 flood + 10 age + 5 unsecured, 20)
    assert_eq!(decision.risk_score, Some(30));
    assert!(decision.risk_score.unwrap() >= 25);
    assert_eq!(decision.outcome, Some(Outcome::Approve));
    assert_eq!(decision.method, Some(DecisionMethod::StandardAssessment));
    assert_eq!(decision.risk_level, Some(RiskLevel::Low));
    assert_eq!(decision.exclusions, vec!["Flood damage"]);
    assert_eq!(
        decision.terms.as_deref(),
        Some("Standard policy terms with 1 exclusion(s)")
    );
    assert!((decision.premium_multiplier.unwrap() - 1.30).abs() < 1e-9);
}

#[test]
fn poor_credit_and_many_claims_is_referred() {
    let underwriter = Underwriter::standard().unwrap();
    let profile = RiskProfile {
        credit_score: Some(550),
        claims_in_last_3_years: 5,
        ..RiskProfile::new("CUST-AUTO-01", Coverage::Auto(DrivingRecord::default()))
    };
    let decision = underwriter.evaluate(&profile).unwrap();

    assert_eq!(decision.risk_score, Some(65));
    assert_eq!(decision.outcome, Some(Outcome::Refer));
    assert_eq!(decision.risk_level, Some(RiskLevel::High));
    assert!(decision.manual_review_required);
    assert_eq!(decision.terms.as_deref(), Some("Pending manual review"));
    assert_eq!(decision.confidence, Some(0.75));
}

#[test]
fn annotation_only_rules_still_fall_back() {
    let underwriter = Underwriter::builder()
        .rules(Arc::new(RuleSet::from_yaml(NO_DECIDING_RULES).unwrap()))
        .build()
        .unwrap();
    let decision = underwriter.evaluate(&home_profile()).unwrap();

    assert_eq!(decision.rules_fired, vec!["FLOOD"]);
    assert_eq!(decision.method, Some(DecisionMethod::StandardAssessment));
    assert_eq!(decision.outcome, Some(Outcome::Approve));
}

#[test]
fn large_losses_are_referred_by_rules() {
    let underwriter = Underwriter::standard().unwrap();
    let profile = RiskProfile {
        credit_score: Some(760),
        claims_in_last_3_years: 1,
        total_claim_amount: 150_000.0,
        ..RiskProfile::new("CUST-LIFE-01", Coverage::Life(HealthDetails::default()))
    };
    let decision = underwriter.evaluate(&profile).unwrap();

    assert_eq!(decision.outcome, Some(Outcome::Refer));
    assert_eq!(decision.method, Some(DecisionMethod::RulesEngine));
    assert!(decision.rules_fired.contains(&"UW-130".to_string()));
    assert_eq!(
        decision.conditions,
        vec!["Underwriter sign-off required before binding"]
    );
}

#[test]
fn prior_issues_push_into_rejection_territory() {
    let underwriter = Underwriter::builder()
        .rules(Arc::new(RuleSet::from_yaml(NO_DECIDING_RULES).unwrap()))
        .build()
        .unwrap();
    let profile = RiskProfile {
        credit_score: Some(580),
        claims_in_last_3_years: 2,
        prior_cancellation: true,
        prior_denial: true,
        ..RiskProfile::new(
            "CUST-HLTH-01",
            Coverage::Health(HealthDetails {
                smoker: true,
                ..HealthDetails::default()
            }),
        )
    };
    let decision = underwriter.evaluate(&profile).unwrap();

    // 40 + 16 + 15 + 25
    assert_eq!(decision.risk_score, Some(96));
    assert_eq!(decision.outcome, Some(Outcome::Reject));
    assert_eq!(decision.risk_level, Some(RiskLevel::VeryHigh));
    assert_eq!(decision.terms.as_deref(), Some("Application rejected"));
}

#[test]
fn undecided_decision_fails_compliance() {
    let mut decision = Decision::new("CUST-X");
    decision.risk_score = Some(40);
    ComplianceValidator::new().validate(&mut decision);

    assert!(!decision.compliance_passed);
    assert!(decision
        .compliance_issues
        .contains(&ISSUE_DECISION_NULL.to_string()));
}

/// Approves every case with a score outside 0..=100.
struct OverscoringRules;

impl RuleEvaluator for OverscoringRules {
    fn name(&self) -> &str {
        "overscoring"
    }

    fn evaluate(
        &self,
        _profile: &RiskProfile,
        mut decision: Decision,
    ) -> Result<Decision, RuleEvaluationError> {
        decision.outcome = Some(Outcome::Approve);
        decision.risk_score = Some(150);
        Ok(decision)
    }
}

#[test]
fn final_decisions_carry_compliance_result() {
    let underwriter = Underwriter::standard().unwrap();
    let auto = RiskProfile {
        credit_score: Some(550),
        claims_in_last_3_years: 5,
        ..RiskProfile::new("CUST-AUTO-02", Coverage::Auto(DrivingRecord::default()))
    };
    for profile in [home_profile(), auto] {
        let decision = underwriter.decide(&profile).unwrap();
        assert!(decision.outcome.is_some());
        assert!(decision.compliance_passed);
        assert!(decision.compliance_issues.is_empty());
    }

    let overscoring = Underwriter::builder()
        .rules(Arc::new(OverscoringRules))
        .build()
        .unwrap();
    let decision = overscoring.decide(&home_profile()).unwrap();
    assert_eq!(decision.outcome, Some(Outcome::Approve));
    assert_eq!(decision.method, Some(DecisionMethod::RulesEngine));
    assert!(!decision.compliance_passed);
    assert_eq!(
        decision.compliance_issues,
        vec![ISSUE_INVALID_RISK_SCORE.to_string()]
    );
    assert!(decision.terms.is_some());
}

#[test]
fn decisions_serialize_with_uppercase_enums() {
    let decision = Underwriter::standard()
        .unwrap()
        .evaluate(&home_profile())
        .unwrap();
    let json = serde_json::to_value(&decision).unwrap();

    assert_eq!(json["outcome"], "APPROVE");
    assert_eq!(json["method"], "STANDARD_ASSESSMENT");
    assert_eq!(json["customer_id"], "CUST-HOME-01");
}
