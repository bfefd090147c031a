//! Rule evaluation.
//!
//! A [`RuleSet`] is an explicit, ordered list of rules. Each rule is a
//! predicate over `(profile, decision)` plus an action that mutates the
//! decision. Every matching rule fires, in ascending priority and then
//! declaration order, so later rules observe earlier mutations. If no rule sets
//! an outcome the decision comes back undecided and the fallback runs.
//!
//! Rule sets are usually authored as YAML or JSON documents (see
//! [`RuleSetDefinition`]); custom rules implement [`Rule`] directly.

mod definition;
mod facts;
mod schema;

pub use definition::{
    ActionDefinition, ConditionDefinition, DeclarativeRule, Operator, RuleDefinition,
    RuleSetDefinition, RuleSetError,
};
pub use facts::{Fact, FactKind, FactValue};
pub use schema::validate_ruleset_schema;

use std::path::Path;
use thiserror::Error;
use tracing::debug;

use crate::types::{Decision, RiskProfile};

/// Priority given to rules that do not declare one.
pub const DEFAULT_PRIORITY: i32 = 100;

/// Name of the embedded rule set.
pub const STANDARD_RULESET_NAME: &str = "standard-underwriting";

const STANDARD_RULESET_YAML: &str = include_str!("standard.yaml");

/// Errors raised while evaluating rules.
#[derive(Error, Debug)]
pub enum RuleEvaluationError {
    #[error("rule '{rule_id}' failed: {message}")]
    RuleFailed { rule_id: String, message: String },

    #[error("rule evaluator unavailable: {0}")]
    Unavailable(String),
}

/// A single underwriting rule.
pub trait Rule: Send + Sync {
    /// Unique identifier within its rule set.
    fn id(&self) -> &str;

    fn name(&self) -> &str {
        self.id()
    }

    /// Lower runs first.
    fn priority(&self) -> i32 {
        DEFAULT_PRIORITY
    }

    fn matches(&self, profile: &RiskProfile, decision: &Decision) -> bool;

    fn apply(&self, decision: &mut Decision);
}

/// Capability consumed by the pipeline: run rules over a decision.
///
/// Implementations take the decision by value and hand it back, leaving
/// `outcome` unset when no rule decided the case.
pub trait RuleEvaluator: Send + Sync {
    fn name(&self) -> &str;

    fn evaluate(
        &self,
        profile: &RiskProfile,
        decision: Decision,
    ) -> Result<Decision, RuleEvaluationError>;
}

/// Per-evaluation working state.
///
/// Opened for one evaluation and consumed when it ends; never shared.
#[derive(Debug)]
pub struct RuleSession<'a> {
    rule_set: &'a str,
    fired: Vec<String>,
}

impl<'a> RuleSession<'a> {
    pub fn open(rule_set: &'a str) -> Self {
        Self {
            rule_set,
            fired: Vec::new(),
        }
    }

    pub fn record(&mut self, rule_id: &str) {
        self.fired.push(rule_id.to_string());
    }

    /// Close the session, returning fired rule ids in order.
    pub fn close(self) -> Vec<String> {
        debug!(rule_set = self.rule_set, rules_fired = self.fired.len(), "rule session closed");
        self.fired
    }
}

/// Ordered collection of rules.
pub struct RuleSet {
    name: String,
    version: String,
    rules: Vec<Box<dyn Rule>>,
}

impl std::fmt::Debug for RuleSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuleSet")
            .field("name", &self.name)
            .field("version", &self.version)
            .field("rules", &self.rule_ids())
            .finish()
    }
}

impl RuleSet {
    /// Build from rules in declaration order; execution order is fixed here.
    pub fn new(
        name: impl Into<String>,
        version: impl Into<String>,
        mut rules: Vec<Box<dyn Rule>>,
    ) -> Self {
        // stable: equal priorities keep declaration order
        rules.sort_by_key(|rule| rule.priority());
        Self {
            name: name.into(),
            version: version.into(),
            rules,
        }
    }

    /// The embedded standard rule set.
    pub fn standard() -> Result<Self, RuleSetError> {
        Self::from_yaml(STANDARD_RULESET_YAML)
    }

    pub fn from_definition(definition: &RuleSetDefinition) -> Result<Self, RuleSetError> {
        let rules = definition
            .compile()?
            .into_iter()
            .map(|rule| Box::new(rule) as Box<dyn Rule>)
            .collect();
        Ok(Self::new(&definition.name, &definition.version, rules))
    }

    pub fn from_yaml(yaml: &str) -> Result<Self, RuleSetError> {
        Self::from_definition(&RuleSetDefinition::from_yaml(yaml)?)
    }

    pub fn from_json(json: &str) -> Result<Self, RuleSetError> {
        Self::from_definition(&RuleSetDefinition::from_json(json)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, RuleSetError> {
        Self::from_definition(&RuleSetDefinition::from_path(path)?)
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Rules in execution order.
    pub fn rules(&self) -> impl Iterator<Item = &dyn Rule> {
        self.rules.iter().map(|rule| rule.as_ref())
    }

    pub fn rule_ids(&self) -> Vec<&str> {
        self.rules.iter().map(|rule| rule.id()).collect()
    }
}

impl RuleEvaluator for RuleSet {
    fn name(&self) -> &str {
        &self.name
    }

    fn evaluate(
        &self,
        profile: &RiskProfile,
        mut decision: Decision,
    ) -> Result<Decision, RuleEvaluationError> {
        let mut session = RuleSession::open(&self.name);

        for rule in &self.rules {
            if rule.matches(profile, &decision) {
                debug!(rule = rule.id(), "rule fired");
                rule.apply(&mut decision);
                session.record(rule.id());
            }
        }

        decision.rules_fired.extend(session.close());
        Ok(decision)
    }
}
