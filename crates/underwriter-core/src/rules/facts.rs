//! Facts a rule condition can reference.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::types::{Decision, RiskProfile};

/// A named value read from the profile or the in-progress decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Fact {
    Category,
    CreditScore,
    // snake_case would render this as claims_in_last3_years
    #[serde(rename = "claims_in_last_3_years")]
    ClaimsInLast3Years,
    TotalClaimAmount,
    DrivingViolations,
    AtFaultAccidents,
    Dui,
    YearsLicensed,
    Smoker,
    MedicalConditionCount,
    Occupation,
    PropertyAge,
    InFloodZone,
    HasSecuritySystem,
    PriorCancellation,
    PriorDenial,
    Age,
    Address,
    ExternalCreditCheckCompleted,
    DrivingRecordCheckCompleted,
    DecisionOutcome,
    RiskFactorCount,
    ManualReviewRequired,
}

/// Value type of a fact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FactKind {
    Number,
    Boolean,
    Text,
}

impl fmt::Display for FactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FactKind::Number => f.write_str("number"),
            FactKind::Boolean => f.write_str("boolean"),
            FactKind::Text => f.write_str("text"),
        }
    }
}

/// Literal or resolved fact value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FactValue {
    Boolean(bool),
    Number(f64),
    Text(String),
}

impl FactValue {
    pub fn kind(&self) -> FactKind {
        match self {
            FactValue::Boolean(_) => FactKind::Boolean,
            FactValue::Number(_) => FactKind::Number,
            FactValue::Text(_) => FactKind::Text,
        }
    }

    fn number(value: impl Into<f64>) -> Self {
        FactValue::Number(value.into())
    }
}

impl fmt::Display for FactValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FactValue::Boolean(b) => write!(f, "{b}"),
            FactValue::Number(n) => write!(f, "{n}"),
            FactValue::Text(t) => f.write_str(t),
        }
    }
}

impl Fact {
    pub const ALL: [Fact; 23] = [
        Fact::Category,
        Fact::CreditScore,
        Fact::ClaimsInLast3Years,
        Fact::TotalClaimAmount,
        Fact::DrivingViolations,
        Fact::AtFaultAccidents,
        Fact::Dui,
        Fact::YearsLicensed,
        Fact::Smoker,
        Fact::MedicalConditionCount,
        Fact::Occupation,
        Fact::PropertyAge,
        Fact::InFloodZone,
        Fact::HasSecuritySystem,
        Fact::PriorCancellation,
        Fact::PriorDenial,
        Fact::Age,
        Fact::Address,
        Fact::ExternalCreditCheckCompleted,
        Fact::DrivingRecordCheckCompleted,
        Fact::DecisionOutcome,
        Fact::RiskFactorCount,
        Fact::ManualReviewRequired,
    ];

    /// Facts derived from the profile or read from the decision rather
    /// than copied from a profile field.
    pub fn is_derived(&self) -> bool {
        matches!(
            self,
            Fact::MedicalConditionCount
                | Fact::DecisionOutcome
                | Fact::RiskFactorCount
                | Fact::ManualReviewRequired
        )
    }

    pub fn kind(&self) -> FactKind {
        match self {
            Fact::Category | Fact::Occupation | Fact::Address | Fact::DecisionOutcome => {
                FactKind::Text
            }
            Fact::Dui
            | Fact::Smoker
            | Fact::InFloodZone
            | Fact::HasSecuritySystem
            | Fact::PriorCancellation
            | Fact::PriorDenial
            | Fact::ExternalCreditCheckCompleted
            | Fact::DrivingRecordCheckCompleted
            | Fact::ManualReviewRequired => FactKind::Boolean,
            _ => FactKind::Number,
        }
    }

    /// Read the fact, or `None` when the profile does not carry it.
    ///
    /// Category-specific facts are absent for other categories.
    pub fn resolve(&self, profile: &RiskProfile, decision: &Decision) -> Option<FactValue> {
        let driving = profile.driving_record();
        let property = profile.property();
        let health = profile.health();

        match self {
            Fact::Category => Some(FactValue::Text(profile.category().as_str().to_string())),
            Fact::CreditScore => profile.credit_score.map(FactValue::number),
            Fact::ClaimsInLast3Years => Some(FactValue::number(profile.claims_in_last_3_years)),
            Fact::TotalClaimAmount => Some(FactValue::Number(profile.total_claim_amount)),
            Fact::DrivingViolations => driving.map(|d| FactValue::number(d.driving_violations)),
            Fact::AtFaultAccidents => driving.map(|d| FactValue::number(d.at_fault_accidents)),
            Fact::Dui => driving.map(|d| FactValue::Boolean(d.dui)),
            Fact::YearsLicensed => driving.and_then(|d| d.years_licensed).map(FactValue::number),
            Fact::Smoker => health.map(|h| FactValue::Boolean(h.smoker)),
            Fact::MedicalConditionCount => {
                health.map(|h| FactValue::Number(h.medical_conditions.len() as f64))
            }
            Fact::Occupation => health
                .and_then(|h| h.occupation.clone())
                .map(FactValue::Text),
            Fact::PropertyAge => property.and_then(|p| p.property_age).map(FactValue::number),
            Fact::InFloodZone => property.map(|p| FactValue::Boolean(p.in_flood_zone)),
            Fact::HasSecuritySystem => property
                .and_then(|p| p.has_security_system)
                .map(FactValue::Boolean),
            Fact::PriorCancellation => Some(FactValue::Boolean(profile.prior_cancellation)),
            Fact::PriorDenial => Some(FactValue::Boolean(profile.prior_denial)),
            Fact::Age => profile.age.map(FactValue::number),
            Fact::Address => profile.address.clone().map(FactValue::Text),
            Fact::ExternalCreditCheckCompleted => {
                Some(FactValue::Boolean(profile.external_credit_check_completed))
            }
            Fact::DrivingRecordCheckCompleted => {
                Some(FactValue::Boolean(profile.driving_record_check_completed))
            }
            Fact::DecisionOutcome => decision
                .outcome
                .map(|o| FactValue::Text(o.as_str().to_string())),
            Fact::RiskFactorCount => Some(FactValue::Number(decision.risk_factors.len() as f64)),
            Fact::ManualReviewRequired => Some(FactValue::Boolean(decision.manual_review_required)),
        }
    }
}
