//! Deterministic 0..=100 risk score and the score-based fallback assessment.

use serde::{Deserialize, Serialize};

use crate::types::{Coverage, Decision, DecisionMethod, Outcome, RiskLevel, RiskProfile};

/// Scores at or above this are rejected by the standard assessment.
pub const REJECT_THRESHOLD: u8 = 80;

/// Scores at or above this (and below [`REJECT_THRESHOLD`]) are referred.
pub const REFER_THRESHOLD: u8 = 60;

/// Per-component contributions to the risk score.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    /// 0..=40
    pub credit: u8,
    /// 0..=25
    pub claims: u8,
    /// 0..=20
    pub category: u8,
    /// 0..=25
    pub prior_issues: u8,
}

impl ScoreBreakdown {
    /// Sum of the components, capped at 100.
    pub fn total(&self) -> u8 {
        let sum = u16::from(self.credit)
            + u16::from(self.claims)
            + u16::from(self.category)
            + u16::from(self.prior_issues);
        sum.min(100) as u8
    }
}

/// Computes risk scores and performs the standard (score-based) assessment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScoreAssessor;

impl ScoreAssessor {
    pub fn new() -> Self {
        Self
    }

    pub fn score(&self, profile: &RiskProfile) -> u8 {
        self.breakdown(profile).total()
    }

    pub fn breakdown(&self, profile: &RiskProfile) -> ScoreBreakdown {
        ScoreBreakdown {
            credit: credit_points(profile.credit_score),
            claims: claims_points(profile.claims_in_last_3_years),
            category: category_points(&profile.coverage),
            prior_issues: prior_issue_points(profile),
        }
    }

    /// Decide the profile from its score alone.
    pub fn assess(&self, profile: &RiskProfile, decision: &mut Decision) {
        let score = self.score(profile);
        decision.risk_score = Some(score);
        decision.risk_level = Some(risk_level_for(score));
        decision.method = Some(DecisionMethod::StandardAssessment);

        if score >= REJECT_THRESHOLD {
            decision.outcome = Some(Outcome::Reject);
            decision.decision_reason = Some("High risk score from standard assessment".to_string());
        } else if score >= REFER_THRESHOLD {
            decision.outcome = Some(Outcome::Refer);
            decision.referral_reason = Some("Moderate risk requires manual review".to_string());
            decision.manual_review_required = true;
        } else {
            decision.outcome = Some(Outcome::Approve);
            decision.decision_reason = Some("Standard approval based on risk assessment".to_string());
            decision.premium_multiplier = Some(1.0 + f64::from(score) * 0.01);
        }
    }
}

/// Risk band for a score, using the assessment thresholds.
pub fn risk_level_for(score: u8) -> RiskLevel {
    match score {
        s if s >= REJECT_THRESHOLD => RiskLevel::VeryHigh,
        s if s >= REFER_THRESHOLD => RiskLevel::High,
        40.. => RiskLevel::Medium,
        _ => RiskLevel::Low,
    }
}

fn credit_points(credit_score: Option<u16>) -> u8 {
    match credit_score {
        None => 0,
        Some(s) if s < 600 => 40,
        Some(s) if s < 650 => 30,
        Some(s) if s < 700 => 20,
        Some(s) if s < 750 => 10,
        Some(_) => 0,
    }
}

fn claims_points(claims: u32) -> u8 {
    claims.saturating_mul(8).min(25) as u8
}

fn category_points(coverage: &Coverage) -> u8 {
    let points = match coverage {
        Coverage::Auto(record) => {
            let dui = if record.dui { 20 } else { 0 };
            let violations = record.driving_violations.saturating_mul(5).min(15);
            let accidents = record.at_fault_accidents.saturating_mul(7).min(20);
            dui + violations + accidents
        }
        Coverage::Home(property) => {
            let flood = if property.in_flood_zone { 10 } else { 0 };
            let aged = match property.property_age {
                Some(age) if age > 50 => 10,
                _ => 0,
            };
            let unsecured = if property.has_security_system == Some(false) { 5 } else { 0 };
            flood + aged + unsecured
        }
        Coverage::Life(health) | Coverage::Health(health) => {
            let smoker = if health.smoker { 15 } else { 0 };
            let conditions = (health.medical_conditions.len() as u32)
                .saturating_mul(5)
                .min(20);
            smoker + conditions
        }
    };
    points.min(20) as u8
}

fn prior_issue_points(profile: &RiskProfile) -> u8 {
    let cancellation = if profile.prior_cancellation { 10 } else { 0 };
    let denial = if profile.prior_denial { 15 } else { 0 };
    cancellation + denial
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DrivingRecord, HealthDetails, InsuranceCategory, PropertyDetails};

    fn auto_profile(credit: Option<u16>, claims: u32, record: DrivingRecord) -> RiskProfile {
        RiskProfile {
            credit_score: credit,
            claims_in_last_3_years: claims,
            ..RiskProfile::new("CUST001", Coverage::Auto(record))
        }
    }

    #[test]
    fn test_credit_bands() {
        assert_eq!(credit_points(None), 0);
        assert_eq!(credit_points(Some(300)), 40);
        assert_eq!(credit_points(Some(599)), 40);
        assert_eq!(credit_points(Some(600)), 30);
        assert_eq!(credit_points(Some(650)), 20);
        assert_eq!(credit_points(Some(700)), 10);
        assert_eq!(credit_points(Some(750)), 0);
    }

    #[test]
    fn test_claims_capped() {
        assert_eq!(claims_points(0), 0);
        assert_eq!(claims_points(2), 16);
        assert_eq!(claims_points(4), 25);
        assert_eq!(claims_points(u32::MAX), 25);
    }

    #[test]
    fn test_auto_category_capped_at_20() {
        let record = DrivingRecord {
            driving_violations: 3,
            at_fault_accidents: 2,
            dui: true,
            years_licensed: Some(10),
        };
        assert_eq!(category_points(&Coverage::Auto(record)), 20);
    }

    #[test]
    fn test_home_category() {
        let property = PropertyDetails {
            property_age: Some(60),
            in_flood_zone: true,
            has_security_system: Some(false),
        };
        assert_eq!(category_points(&Coverage::Home(property)), 20);

        let flood_and_age = PropertyDetails {
            property_age: Some(60),
            in_flood_zone: true,
            has_security_system: Some(true),
        };
        assert_eq!(category_points(&Coverage::Home(flood_and_age)), 20);

        let unanswered = PropertyDetails {
            property_age: Some(10),
            in_flood_zone: false,
            has_security_system: None,
        };
        assert_eq!(category_points(&Coverage::Home(unanswered)), 0);
    }

    #[test]
    fn test_health_category() {
        let health = HealthDetails {
            smoker: true,
            medical_conditions: vec!["asthma".into()],
            occupation: None,
        };
        assert_eq!(category_points(&Coverage::Health(health)), 20);
        assert_eq!(category_points(&Coverage::empty(InsuranceCategory::Life)), 0);
    }

    #[test]
    fn test_total_capped_at_100() {
        let mut profile = auto_profile(
            Some(450),
            5,
            DrivingRecord {
                dui: true,
                ..DrivingRecord::default()
            },
        );
        profile.prior_cancellation = true;
        profile.prior_denial = true;
        let breakdown = ScoreAssessor::new().breakdown(&profile);
        assert_eq!(breakdown.credit + breakdown.claims + breakdown.category + breakdown.prior_issues, 110);
        assert_eq!(breakdown.total(), 100);
    }

    #[test]
    fn test_risk_level_bands() {
        assert_eq!(risk_level_for(0), RiskLevel::Low);
        assert_eq!(risk_level_for(39), RiskLevel::Low);
        assert_eq!(risk_level_for(40), RiskLevel::Medium);
        assert_eq!(risk_level_for(60), RiskLevel::High);
        assert_eq!(risk_level_for(79), RiskLevel::High);
        assert_eq!(risk_level_for(80), RiskLevel::VeryHigh);
        assert_eq!(risk_level_for(100), RiskLevel::VeryHigh);
    }

    #[test]
    fn test_assess_approve_sets_multiplier() {
        let profile = auto_profile(Some(720), 0, DrivingRecord::default());
        let mut decision = Decision::new("CUST001");
        ScoreAssessor::new().assess(&profile, &mut decision);

        assert_eq!(decision.risk_score, Some(10));
        assert_eq!(decision.outcome, Some(Outcome::Approve));
        assert_eq!(decision.method, Some(DecisionMethod::StandardAssessment));
        assert!((decision.premium_multiplier.unwrap() - 1.10).abs() < 1e-9);
    }

    #[test]
    fn test_assess_refer_and_reject() {
        let assessor = ScoreAssessor::new();

        // 40 credit + 25 claims = 65
        let refer = auto_profile(Some(550), 5, DrivingRecord::default());
        let mut decision = Decision::new("CUST002");
        assessor.assess(&refer, &mut decision);
        assert_eq!(decision.outcome, Some(Outcome::Refer));
        assert!(decision.manual_review_required);
        assert_eq!(decision.risk_level, Some(RiskLevel::High));
        assert_eq!(decision.referral_reason.as_deref(), Some("Moderate risk requires manual review"));

        // 40 credit + 25 claims + 20 dui = 85
        let reject = auto_profile(
            Some(520),
            4,
            DrivingRecord {
                dui: true,
                ..DrivingRecord::default()
            },
        );
        let mut decision = Decision::new("CUST003");
        assessor.assess(&reject, &mut decision);
        assert_eq!(decision.outcome, Some(Outcome::Reject));
        assert_eq!(decision.risk_level, Some(RiskLevel::VeryHigh));
        assert!(decision.premium_multiplier.is_none());
    }
}
