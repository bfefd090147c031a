//! Identifier masking and redaction for logs and decision text.
//!
//! Customer identifiers are masked before they reach any log line. Free-form
//! error text is scrubbed of identifier-like digit runs before it is copied
//! into a decision.

use lazy_static::lazy_static;
use regex::Regex;
use std::fmt;

use crate::types::{Decision, RiskProfile};

/// Tracing target for audit entries.
pub const AUDIT_TARGET: &str = "underwriter::audit";

const MASK: &str = "****";

lazy_static! {
    /// Social Security Number pattern (XXX-XX-XXXX or XXXXXXXXX)
    pub static ref SSN_PATTERN: Regex = Regex::new(
        r"\b\d{3}[-\s]?\d{2}[-\s]?\d{4}\b"
    ).unwrap();

    /// Credit card number pattern (16 digits with optional separators)
    pub static ref CARD_PATTERN: Regex = Regex::new(
        r"\b\d{4}[\s-]?\d{4}[\s-]?\d{4}[\s-]?\d{4}\b"
    ).unwrap();

    /// Any other run of six or more digits
    pub static ref DIGIT_RUN_PATTERN: Regex = Regex::new(r"\d{6,}").unwrap();
}

/// Mask an identifier, keeping its first two and last two characters.
///
/// Identifiers of four characters or fewer are fully masked.
pub fn mask_identifier(value: &str) -> String {
    let chars: Vec<char> = value.chars().collect();
    if chars.len() <= 4 {
        return MASK.to_string();
    }

    let head: String = chars[..2].iter().collect();
    let tail: String = chars[chars.len() - 2..].iter().collect();
    format!("{head}{MASK}{tail}")
}

/// Display adapter that masks the wrapped identifier.
///
/// ```
/// use underwriter_core::masking::Masked;
/// assert_eq!(Masked("CUST001").to_string(), "CU****01");
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Masked<'a>(pub &'a str);

impl fmt::Display for Masked<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&mask_identifier(self.0))
    }
}

/// Replace identifier-like digit sequences with a mask.
pub fn redact_identifiers(text: &str) -> String {
    let text = CARD_PATTERN.replace_all(text, MASK);
    let text = SSN_PATTERN.replace_all(&text, MASK);
    DIGIT_RUN_PATTERN.replace_all(&text, MASK).into_owned()
}

/// Record the start of an evaluation on the audit target.
pub fn audit_evaluation_started(profile: &RiskProfile) {
    tracing::info!(
        target: AUDIT_TARGET,
        customer = %Masked(&profile.customer_id),
        category = %profile.category(),
        "underwriting evaluation started"
    );
}

/// Record a finished decision on the audit target.
pub fn audit_decision(decision: &Decision) {
    tracing::info!(
        target: AUDIT_TARGET,
        customer = %Masked(&decision.customer_id),
        decision_id = %decision.decision_id,
        outcome = ?decision.outcome,
        method = ?decision.method,
        compliance_passed = decision.compliance_passed,
        "underwriting decision recorded"
    );
}
