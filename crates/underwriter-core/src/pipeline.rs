//! The synchronous underwriting pipeline.

use std::sync::Arc;
use tracing::{debug, info};

use crate::classifier::{Classifier, ClassifierAssessor, DecisionTreeClassifier};
use crate::compliance::ComplianceValidator;
use crate::config::UnderwritingConfig;
use crate::fallback::FallbackResolver;
use crate::finalizer::DecisionFinalizer;
use crate::masking::{audit_decision, audit_evaluation_started, Masked};
use crate::rules::{RuleEvaluator, RuleSet};
use crate::scoring::ScoreAssessor;
use crate::types::{Decision, DecisionMethod, RiskProfile};
use crate::UnderwritingError;

/// Runs rules, fallback, scoring, compliance and finalization over a profile.
///
/// Holds no per-evaluation state, so one instance can serve concurrent callers.
pub struct Underwriter {
    rules: Arc<dyn RuleEvaluator>,
    fallback: FallbackResolver,
    scorer: ScoreAssessor,
    compliance: ComplianceValidator,
    finalizer: DecisionFinalizer,
}

impl std::fmt::Debug for Underwriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Underwriter")
            .field("rules", &self.rules.name())
            .field("fallback", &self.fallback)
            .finish()
    }
}

impl Underwriter {
    pub fn new(rules: Arc<dyn RuleEvaluator>, fallback: FallbackResolver) -> Self {
        Self {
            rules,
            fallback,
            scorer: ScoreAssessor::new(),
            compliance: ComplianceValidator::new(),
            finalizer: DecisionFinalizer::new(),
        }
    }

    pub fn builder() -> UnderwriterBuilder {
        UnderwriterBuilder::default()
    }

    /// Standard rules with score-based fallback.
    pub fn standard() -> Result<Self, UnderwritingError> {
        Self::builder().build()
    }

    /// Build from configuration, loading rule sets and models from disk.
    ///
    /// Any loading failure is returned; callers treat it as a startup error.
    pub fn from_config(config: &UnderwritingConfig) -> Result<Self, UnderwritingError> {
        let mut builder = Self::builder();

        if let Some(path) = &config.rules_path {
            builder = builder.rules(Arc::new(RuleSet::from_path(path)?));
        }

        if config.use_classifier {
            let classifier = match &config.classifier_model_path {
                Some(path) => DecisionTreeClassifier::from_json_file(path)?,
                None => DecisionTreeClassifier::standard()?,
            };
            builder = builder.classifier(Arc::new(classifier));
        }

        builder.build()
    }

    pub fn rules_name(&self) -> &str {
        self.rules.name()
    }

    pub fn fallback_method(&self) -> DecisionMethod {
        self.fallback.method()
    }

    pub fn scorer(&self) -> &ScoreAssessor {
        &self.scorer
    }

    /// Record an audit entry, then decide.
    pub fn evaluate(&self, profile: &RiskProfile) -> Result<Decision, UnderwritingError> {
        audit_evaluation_started(profile);
        self.decide(profile)
    }

    /// Decide without the opening audit entry.
    ///
    /// For callers that have already audited the request.
    pub fn decide(&self, profile: &RiskProfile) -> Result<Decision, UnderwritingError> {
        profile.validate()?;

        debug!(rules = self.rules.name(), "applying rules");
        let mut decision = self
            .rules
            .evaluate(profile, Decision::new(&profile.customer_id))?;

        if decision.is_decided() {
            decision.method = Some(DecisionMethod::RulesEngine);
        } else {
            debug!(method = %self.fallback.method(), "rules left case undecided, falling back");
            self.fallback.resolve(profile, &mut decision);
        }

        if decision.risk_score.is_none() {
            decision.risk_score = Some(self.scorer.score(profile));
        }

        self.compliance.validate(&mut decision);
        self.finalizer.finalize(&mut decision);

        info!(
            customer = %Masked(&decision.customer_id),
            outcome = ?decision.outcome,
            risk_score = ?decision.risk_score,
            method = ?decision.method,
            "underwriting completed"
        );
        audit_decision(&decision);

        Ok(decision)
    }
}

/// Builder for [`Underwriter`].
#[derive(Default)]
pub struct UnderwriterBuilder {
    rules: Option<Arc<dyn RuleEvaluator>>,
    classifier: Option<Arc<dyn Classifier>>,
}

impl UnderwriterBuilder {
    /// Rule evaluator. Defaults to the embedded standard rule set.
    pub fn rules(mut self, rules: Arc<dyn RuleEvaluator>) -> Self {
        self.rules = Some(rules);
        self
    }

    /// Enable classifier fallback with this classifier.
    pub fn classifier(mut self, classifier: Arc<dyn Classifier>) -> Self {
        self.classifier = Some(classifier);
        self
    }

    pub fn build(self) -> Result<Underwriter, UnderwritingError> {
        let rules = match self.rules {
            Some(rules) => rules,
            None => Arc::new(RuleSet::standard()?),
        };

        let fallback = match self.classifier {
            Some(classifier) => FallbackResolver::Classifier(ClassifierAssessor::new(classifier)),
            None => FallbackResolver::ScoreBased(ScoreAssessor::new()),
        };

        Ok(Underwriter::new(rules, fallback))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::RuleEvaluationError;
    use crate::types::{Coverage, DrivingRecord, InsuranceCategory, Outcome};

    struct NoRules;

    impl RuleEvaluator for NoRules {
        fn name(&self) -> &str {
            "none"
        }

        fn evaluate(
            &self,
            _profile: &RiskProfile,
            decision: Decision,
        ) -> Result<Decision, RuleEvaluationError> {
            Ok(decision)
        }
    }

    struct BrokenRules;

    impl RuleEvaluator for BrokenRules {
        fn name(&self) -> &str {
            "broken"
        }

        fn evaluate(
            &self,
            _profile: &RiskProfile,
            _decision: Decision,
        ) -> Result<Decision, RuleEvaluationError> {
            Err(RuleEvaluationError::Unavailable("knowledge base offline".into()))
        }
    }

    fn auto(credit: u16, claims: u32, dui: bool) -> RiskProfile {
        RiskProfile {
            credit_score: Some(credit),
            claims_in_last_3_years: claims,
            ..RiskProfile::new(
                "CUST001",
                Coverage::Auto(DrivingRecord {
                    dui,
                    ..DrivingRecord::default()
                }),
            )
        }
    }

    #[test]
    fn test_rule_decided_case_gets_score_and_rule_confidence() {
        let underwriter = Underwriter::standard().unwrap();
        let decision = underwriter.evaluate(&auto(720, 0, true)).unwrap();

        assert_eq!(decision.outcome, Some(Outcome::Refer));
        assert_eq!(decision.method, Some(DecisionMethod::RulesEngine));
        // 10 credit + 20 dui
        assert_eq!(decision.risk_score, Some(30));
        assert_eq!(decision.confidence, Some(0.95));
        assert_eq!(decision.terms.as_deref(), Some("Pending manual review"));
        assert!(decision.compliance_passed);
    }

    #[test]
    fn test_undecided_case_falls_back_to_scoring() {
        let underwriter = Underwriter::builder()
            .rules(Arc::new(NoRules))
            .build()
            .unwrap();
        let decision = underwriter.evaluate(&auto(780, 0, false)).unwrap();

        assert_eq!(decision.outcome, Some(Outcome::Approve));
        assert_eq!(decision.method, Some(DecisionMethod::StandardAssessment));
        assert_eq!(decision.risk_score, Some(0));
        assert_eq!(decision.confidence, Some(0.75));
        assert_eq!(decision.terms.as_deref(), Some("Standard policy terms"));
    }

    #[test]
    fn test_classifier_fallback() {
        let underwriter = Underwriter::builder()
            .rules(Arc::new(NoRules))
            .classifier(Arc::new(DecisionTreeClassifier::standard().unwrap()))
            .build()
            .unwrap();
        assert_eq!(underwriter.fallback_method(), DecisionMethod::MachineLearning);

        let decision = underwriter.evaluate(&auto(560, 4, false)).unwrap();
        assert_eq!(decision.outcome, Some(Outcome::Reject));
        assert_eq!(decision.risk_score, Some(90));
        assert_eq!(decision.method, Some(DecisionMethod::MachineLearning));
        // max class probability from the leaf
        assert!((decision.confidence.unwrap() - 0.88).abs() < 1e-9);
    }

    #[test]
    fn test_rule_failure_propagates() {
        let underwriter = Underwriter::builder()
            .rules(Arc::new(BrokenRules))
            .build()
            .unwrap();
        let result = underwriter.evaluate(&auto(700, 0, false));
        assert!(matches!(result, Err(UnderwritingError::RuleEvaluation(_))));
    }

    #[test]
    fn test_invalid_profile_rejected() {
        let underwriter = Underwriter::standard().unwrap();
        let profile = RiskProfile::new("", Coverage::empty(InsuranceCategory::Life));
        assert!(matches!(
            underwriter.evaluate(&profile),
            Err(UnderwritingError::InvalidProfile(_))
        ));
    }

    #[test]
    fn test_from_config_defaults() {
        let underwriter = Underwriter::from_config(&UnderwritingConfig::default()).unwrap();
        assert_eq!(underwriter.rules_name(), crate::rules::STANDARD_RULESET_NAME);
        assert_eq!(underwriter.fallback_method(), DecisionMethod::StandardAssessment);

        let config = UnderwritingConfig {
            use_classifier: true,
            ..UnderwritingConfig::default()
        };
        let underwriter = Underwriter::from_config(&config).unwrap();
        assert_eq!(underwriter.fallback_method(), DecisionMethod::MachineLearning);
    }

    #[test]
    fn test_from_config_missing_rules_file() {
        let config = UnderwritingConfig {
            rules_path: Some("/nonexistent/rules.yaml".into()),
            ..UnderwritingConfig::default()
        };
        assert!(matches!(
            Underwriter::from_config(&config),
            Err(UnderwritingError::RuleSet(_))
        ));
    }
}
