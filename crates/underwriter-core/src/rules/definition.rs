//! Declarative rule-set documents and their compiled form.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashSet;
use std::path::Path;
use thiserror::Error;

use super::facts::{Fact, FactKind, FactValue};
use super::schema::validate_ruleset_schema;
use super::{Rule, DEFAULT_PRIORITY};
use crate::types::{Decision, InsuranceCategory, Outcome, RiskLevel, RiskProfile};

/// Errors that can occur when loading a rule set.
#[derive(Error, Debug)]
pub enum RuleSetError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("JSON parse error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("schema validation failed: {}", .0.join("; "))]
    SchemaError(Vec<String>),

    #[error("duplicate rule id: {0}")]
    DuplicateRuleId(String),

    #[error("rule '{rule_id}': {reason}")]
    InvalidRule { rule_id: String, reason: String },

    #[error("unsupported rule-set format: {0}")]
    UnsupportedFormat(String),
}

impl RuleSetError {
    fn invalid(rule_id: &str, reason: impl Into<String>) -> Self {
        RuleSetError::InvalidRule {
            rule_id: rule_id.to_string(),
            reason: reason.into(),
        }
    }
}

/// A rule-set document as authored.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuleSetDefinition {
    pub name: String,
    pub version: String,
    #[serde(default)]
    pub description: Option<String>,
    pub rules: Vec<RuleDefinition>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuleDefinition {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default = "default_priority")]
    pub priority: i32,
    /// Empty means every category
    #[serde(default)]
    pub categories: Vec<InsuranceCategory>,
    #[serde(default)]
    pub when: Vec<ConditionDefinition>,
    pub then: ActionDefinition,
}

fn default_priority() -> i32 {
    DEFAULT_PRIORITY
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConditionDefinition {
    pub fact: Fact,
    pub op: Operator,
    #[serde(default)]
    pub value: Option<FactValue>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operator {
    Eq,
    Ne,
    Lt,
    Lte,
    Gt,
    Gte,
    Matches,
    Present,
    Absent,
}

/// Decision mutations performed when a rule fires.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ActionDefinition {
    #[serde(default)]
    pub outcome: Option<Outcome>,
    #[serde(default)]
    pub risk_level: Option<RiskLevel>,
    #[serde(default)]
    pub risk_score: Option<u8>,
    #[serde(default)]
    pub decision_reason: Option<String>,
    #[serde(default)]
    pub referral_reason: Option<String>,
    #[serde(default)]
    pub manual_review: Option<bool>,
    #[serde(default)]
    pub premium_multiplier: Option<f64>,
    #[serde(default)]
    pub extra_premium: Option<f64>,
    #[serde(default)]
    pub risk_factors: Vec<String>,
    #[serde(default)]
    pub positive_factors: Vec<String>,
    #[serde(default)]
    pub exclusions: Vec<String>,
    #[serde(default)]
    pub conditions: Vec<String>,
}

impl ActionDefinition {
    fn is_empty(&self) -> bool {
        *self == ActionDefinition::default()
    }

    /// Apply to a decision. Scalars overwrite, lists append.
    pub fn apply(&self, decision: &mut Decision) {
        if let Some(outcome) = self.outcome {
            decision.outcome = Some(outcome);
        }
        if let Some(level) = self.risk_level {
            decision.risk_level = Some(level);
        }
        if let Some(score) = self.risk_score {
            decision.risk_score = Some(score);
        }
        if let Some(reason) = &self.decision_reason {
            decision.decision_reason = Some(reason.clone());
        }
        if let Some(reason) = &self.referral_reason {
            decision.referral_reason = Some(reason.clone());
        }
        if let Some(manual) = self.manual_review {
            decision.manual_review_required = manual;
        }
        if let Some(multiplier) = self.premium_multiplier {
            decision.premium_multiplier = Some(multiplier);
        }
        if let Some(extra) = self.extra_premium {
            decision.extra_premium = Some(extra);
        }
        decision.risk_factors.extend(self.risk_factors.iter().cloned());
        decision.positive_factors.extend(self.positive_factors.iter().cloned());
        decision.exclusions.extend(self.exclusions.iter().cloned());
        decision.conditions.extend(self.conditions.iter().cloned());
    }
}

impl RuleSetDefinition {
    /// Parse a YAML document, checking it against the schema first.
    pub fn from_yaml(yaml: &str) -> Result<Self, RuleSetError> {
        let document: serde_json::Value = serde_yaml::from_str(yaml)?;
        Self::from_document(document)
    }

    /// Parse a JSON document, checking it against the schema first.
    pub fn from_json(json: &str) -> Result<Self, RuleSetError> {
        let document: serde_json::Value = serde_json::from_str(json)?;
        Self::from_document(document)
    }

    /// Load from a `.yaml`, `.yml` or `.json` file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, RuleSetError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => Self::from_yaml(&content),
            Some("json") => Self::from_json(&content),
            other => Err(RuleSetError::UnsupportedFormat(
                other.unwrap_or("<none>").to_string(),
            )),
        }
    }

    fn from_document(document: serde_json::Value) -> Result<Self, RuleSetError> {
        validate_ruleset_schema(&document).map_err(RuleSetError::SchemaError)?;
        let definition: RuleSetDefinition = serde_json::from_value(document)?;
        definition.validate()?;
        Ok(definition)
    }

    fn validate(&self) -> Result<(), RuleSetError> {
        let mut seen = HashSet::new();
        for rule in &self.rules {
            if rule.id.trim().is_empty() {
                return Err(RuleSetError::invalid("<empty>", "rule id must not be empty"));
            }
            if !seen.insert(rule.id.as_str()) {
                return Err(RuleSetError::DuplicateRuleId(rule.id.clone()));
            }
            if rule.then.is_empty() {
                return Err(RuleSetError::invalid(&rule.id, "action must not be empty"));
            }
            if let Some(score) = rule.then.risk_score {
                if score > 100 {
                    return Err(RuleSetError::invalid(&rule.id, "risk_score must be within 0..=100"));
                }
            }
        }
        Ok(())
    }

    /// Compile every rule. Definitions built in code get the same id and
    /// action checks as parsed ones; conditions and regexes are checked here.
    pub fn compile(&self) -> Result<Vec<DeclarativeRule>, RuleSetError> {
        self.validate()?;
        self.rules.iter().map(DeclarativeRule::compile).collect()
    }
}

/// Comparison operators over resolved facts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Comparison {
    Eq,
    Ne,
    Lt,
    Lte,
    Gt,
    Gte,
}

#[derive(Debug, Clone)]
enum Predicate {
    Compare {
        fact: Fact,
        comparison: Comparison,
        value: FactValue,
    },
    Matches {
        fact: Fact,
        pattern: Regex,
    },
    Present(Fact),
    Absent(Fact),
}

impl Predicate {
    fn compile(rule_id: &str, condition: &ConditionDefinition) -> Result<Self, RuleSetError> {
        let fact = condition.fact;
        let comparison = match condition.op {
            Operator::Present | Operator::Absent => {
                if condition.value.is_some() {
                    return Err(RuleSetError::invalid(
                        rule_id,
                        format!("operator {:?} takes no value", condition.op),
                    ));
                }
                return Ok(if condition.op == Operator::Present {
                    Predicate::Present(fact)
                } else {
                    Predicate::Absent(fact)
                });
            }
            Operator::Matches => {
                let pattern = match (&condition.value, fact.kind()) {
                    (Some(FactValue::Text(pattern)), FactKind::Text) => pattern,
                    _ => {
                        return Err(RuleSetError::invalid(
                            rule_id,
                            format!("'matches' needs a text fact and a pattern (fact {:?})", fact),
                        ))
                    }
                };
                let pattern = Regex::new(pattern).map_err(|e| {
                    RuleSetError::invalid(rule_id, format!("invalid pattern: {}", e))
                })?;
                return Ok(Predicate::Matches { fact, pattern });
            }
            Operator::Eq => Comparison::Eq,
            Operator::Ne => Comparison::Ne,
            Operator::Lt => Comparison::Lt,
            Operator::Lte => Comparison::Lte,
            Operator::Gt => Comparison::Gt,
            Operator::Gte => Comparison::Gte,
        };

        let value = condition.value.clone().ok_or_else(|| {
            RuleSetError::invalid(rule_id, format!("operator {:?} needs a value", condition.op))
        })?;

        if value.kind() != fact.kind() {
            return Err(RuleSetError::invalid(
                rule_id,
                format!(
                    "fact {:?} is {} but value '{}' is {}",
                    fact,
                    fact.kind(),
                    value,
                    value.kind()
                ),
            ));
        }

        let ordered = matches!(
            comparison,
            Comparison::Lt | Comparison::Lte | Comparison::Gt | Comparison::Gte
        );
        if ordered && fact.kind() != FactKind::Number {
            return Err(RuleSetError::invalid(
                rule_id,
                format!("ordering operator on non-numeric fact {:?}", fact),
            ));
        }

        Ok(Predicate::Compare {
            fact,
            comparison,
            value,
        })
    }

    fn holds(&self, profile: &RiskProfile, decision: &Decision) -> bool {
        match self {
            Predicate::Present(fact) => fact.resolve(profile, decision).is_some(),
            Predicate::Absent(fact) => fact.resolve(profile, decision).is_none(),
            Predicate::Matches { fact, pattern } => match fact.resolve(profile, decision) {
                Some(FactValue::Text(text)) => pattern.is_match(&text),
                _ => false,
            },
            Predicate::Compare {
                fact,
                comparison,
                value,
            } => match fact.resolve(profile, decision) {
                Some(actual) => compare(&actual, *comparison, value),
                None => false,
            },
        }
    }
}

fn compare(actual: &FactValue, comparison: Comparison, expected: &FactValue) -> bool {
    let ordering = match (actual, expected) {
        (FactValue::Number(a), FactValue::Number(b)) => a.partial_cmp(b),
        (FactValue::Boolean(a), FactValue::Boolean(b)) => Some(a.cmp(b)),
        (FactValue::Text(a), FactValue::Text(b)) => {
            Some(a.to_ascii_lowercase().cmp(&b.to_ascii_lowercase()))
        }
        _ => None,
    };

    let Some(ordering) = ordering else {
        return false;
    };

    match comparison {
        Comparison::Eq => ordering == Ordering::Equal,
        Comparison::Ne => ordering != Ordering::Equal,
        Comparison::Lt => ordering == Ordering::Less,
        Comparison::Lte => ordering != Ordering::Greater,
        Comparison::Gt => ordering == Ordering::Greater,
        Comparison::Gte => ordering != Ordering::Less,
    }
}

/// A rule compiled from a [`RuleDefinition`].
#[derive(Debug, Clone)]
pub struct DeclarativeRule {
    id: String,
    name: String,
    priority: i32,
    categories: Vec<InsuranceCategory>,
    conditions: Vec<Predicate>,
    action: ActionDefinition,
}

impl DeclarativeRule {
    pub fn compile(definition: &RuleDefinition) -> Result<Self, RuleSetError> {
        let conditions = definition
            .when
            .iter()
            .map(|c| Predicate::compile(&definition.id, c))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            id: definition.id.clone(),
            name: definition
                .name
                .clone()
                .unwrap_or_else(|| definition.id.clone()),
            priority: definition.priority,
            categories: definition.categories.clone(),
            conditions,
            action: definition.then.clone(),
        })
    }

    pub fn action(&self) -> &ActionDefinition {
        &self.action
    }
}

impl Rule for DeclarativeRule {
    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn priority(&self) -> i32 {
        self.priority
    }

    fn matches(&self, profile: &RiskProfile, decision: &Decision) -> bool {
        if !self.categories.is_empty() && !self.categories.contains(&profile.category()) {
            return false;
        }
        self.conditions.iter().all(|c| c.holds(profile, decision))
    }

    fn apply(&self, decision: &mut Decision) {
        self.action.apply(decision);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Coverage, DrivingRecord, HealthDetails};

    const SAMPLE: &str = r#"
name: sample
version: "1.0"
rules:
  - id: DUI
    priority: 10
    categories: [auto]
    when:
      - { fact: dui, op: eq, value: true }
    then:
      outcome: refer
      manual_review: true
      risk_factors: ["DUI on record"]
  - id: HAZARD
    categories: [life, health]
    when:
      - { fact: occupation, op: matches, value: "(?i)pilot|miner" }
    then:
      risk_factors: ["Hazardous occupation"]
"#;

    fn auto(dui: bool) -> RiskProfile {
        RiskProfile::new(
            "CUST001",
            Coverage::Auto(DrivingRecord {
                dui,
                ..DrivingRecord::default()
            }),
        )
    }

    #[test]
    fn test_parse_and_compile() {
        let definition = RuleSetDefinition::from_yaml(SAMPLE).unwrap();
        assert_eq!(definition.name, "sample");
        assert_eq!(definition.rules[1].priority, DEFAULT_PRIORITY);

        let rules = definition.compile().unwrap();
        assert_eq!(rules.len(), 2);
        assert_eq!(rules[0].name(), "DUI");
    }

    #[test]
    fn test_category_filter_and_conditions() {
        let rules = RuleSetDefinition::from_yaml(SAMPLE).unwrap().compile().unwrap();
        let decision = Decision::new("CUST001");

        assert!(rules[0].matches(&auto(true), &decision));
        assert!(!rules[0].matches(&auto(false), &decision));

        let pilot = RiskProfile::new(
            "CUST002",
            Coverage::Life(HealthDetails {
                occupation: Some("Commercial Pilot".into()),
                ..HealthDetails::default()
            }),
        );
        assert!(rules[1].matches(&pilot, &decision));
        assert!(!rules[1].matches(&auto(true), &decision));
    }

    #[test]
    fn test_absent_fact_only_satisfies_absent() {
        let yaml = r#"
name: t
version: "1"
rules:
  - id: LOW
    when: [{ fact: credit_score, op: lt, value: 500 }]
    then: { outcome: reject }
  - id: NOT_LOW
    when: [{ fact: credit_score, op: gte, value: 500 }]
    then: { outcome: approve }
  - id: MISSING
    when: [{ fact: credit_score, op: absent }]
    then: { risk_factors: ["No credit history"] }
"#;
        let rules = RuleSetDefinition::from_yaml(yaml).unwrap().compile().unwrap();
        let profile = auto(false);
        let decision = Decision::new("CUST001");
        assert!(!rules[0].matches(&profile, &decision));
        assert!(!rules[1].matches(&profile, &decision));
        assert!(rules[2].matches(&profile, &decision));
    }

    #[test]
    fn test_text_comparison_ignores_case() {
        assert!(compare(
            &FactValue::Text("REFER".into()),
            Comparison::Eq,
            &FactValue::Text("refer".into())
        ));
        assert!(!compare(
            &FactValue::Number(1.0),
            Comparison::Eq,
            &FactValue::Text("1".into())
        ));
    }

    #[test]
    fn test_action_apply_overwrites_scalars_appends_lists() {
        let mut decision = Decision::new("CUST001");
        decision.risk_factors.push("existing".into());
        decision.risk_score = Some(10);

        let action = ActionDefinition {
            risk_score: Some(55),
            risk_factors: vec!["new".into()],
            ..ActionDefinition::default()
        };
        action.apply(&mut decision);

        assert_eq!(decision.risk_score, Some(55));
        assert_eq!(decision.risk_factors, vec!["existing", "new"]);
        assert!(decision.outcome.is_none());
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let yaml = r#"
name: t
version: "1"
rules:
  - { id: A, then: { outcome: approve } }
  - { id: A, then: { outcome: reject } }
"#;
        assert!(matches!(
            RuleSetDefinition::from_yaml(yaml),
            Err(RuleSetError::DuplicateRuleId(id)) if id == "A"
        ));
    }

    fn refer_rule(id: &str) -> RuleDefinition {
        RuleDefinition {
            id: id.to_string(),
            name: None,
            priority: DEFAULT_PRIORITY,
            categories: Vec::new(),
            when: Vec::new(),
            then: ActionDefinition {
                outcome: Some(Outcome::Refer),
                ..ActionDefinition::default()
            },
        }
    }

    #[test]
    fn test_compile_checks_definitions_built_in_code() {
        let duplicated = RuleSetDefinition {
            name: "t".into(),
            version: "1".into(),
            description: None,
            rules: vec![refer_rule("A"), refer_rule("A")],
        };
        assert!(matches!(
            duplicated.compile(),
            Err(RuleSetError::DuplicateRuleId(id)) if id == "A"
        ));

        let mut out_of_range = refer_rule("B");
        out_of_range.then.risk_score = Some(150);
        let mut empty_action = refer_rule("C");
        empty_action.then = ActionDefinition::default();
        for rule in [out_of_range, empty_action] {
            let definition = RuleSetDefinition {
                name: "t".into(),
                version: "1".into(),
                description: None,
                rules: vec![rule],
            };
            assert!(matches!(
                definition.compile(),
                Err(RuleSetError::InvalidRule { .. })
            ));
        }
    }

    #[test]
    fn test_empty_action_rejected() {
        let yaml = "name: t\nversion: \"1\"\nrules:\n  - { id: A, then: {} }\n";
        assert!(matches!(
            RuleSetDefinition::from_yaml(yaml),
            Err(RuleSetError::InvalidRule { .. })
        ));
    }

    #[test]
    fn test_type_mismatch_rejected_at_compile() {
        let yaml = r#"
name: t
version: "1"
rules:
  - id: A
    when: [{ fact: dui, op: eq, value: 3 }]
    then: { outcome: refer }
"#;
        let definition = RuleSetDefinition::from_yaml(yaml).unwrap();
        assert!(matches!(
            definition.compile(),
            Err(RuleSetError::InvalidRule { rule_id, .. }) if rule_id == "A"
        ));
    }

    #[test]
    fn test_invalid_regex_rejected() {
        let yaml = r#"
name: t
version: "1"
rules:
  - id: A
    when: [{ fact: occupation, op: matches, value: "(unclosed" }]
    then: { risk_factors: ["x"] }
"#;
        let definition = RuleSetDefinition::from_yaml(yaml).unwrap();
        assert!(definition.compile().is_err());
    }

    #[test]
    fn test_unknown_key_rejected_by_schema() {
        let yaml = r#"
name: t
version: "1"
rules:
  - { id: A, salience: 5, then: { outcome: refer } }
"#;
        assert!(matches!(
            RuleSetDefinition::from_yaml(yaml),
            Err(RuleSetError::SchemaError(_))
        ));
    }

    #[test]
    fn test_unknown_fact_rejected() {
        let yaml = r#"
name: t
version: "1"
rules:
  - id: A
    when: [{ fact: shoe_size, op: gt, value: 10 }]
    then: { outcome: refer }
"#;
        assert!(matches!(
            RuleSetDefinition::from_yaml(yaml),
            Err(RuleSetError::JsonError(_))
        ));
    }
}
