//! Command implementations.

use anyhow::{bail, Context, Result};
use std::path::Path;
use tracing::{debug, info};

use underwriter_core::masking::Masked;
use underwriter_core::{Decision, RiskProfile, RuleEvaluator, RuleSet, ScoreAssessor};
use underwriter_runtime::{BureauRegistry, RuntimeConfig, UnderwritingOrchestrator};

use crate::EvaluateArgs;

/// Profile file formats, chosen by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ProfileFormat {
    Yaml,
    Json,
}

impl ProfileFormat {
    fn from_path(path: &Path) -> Result<Self> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("yaml") | Some("yml") => Ok(Self::Yaml),
            Some("json") => Ok(Self::Json),
            _ => bail!(
                "unsupported profile format for {}: expected .yaml, .yml or .json",
                path.display()
            ),
        }
    }
}

fn parse_profile(content: &str, format: ProfileFormat) -> Result<RiskProfile> {
    let profile = match format {
        ProfileFormat::Yaml => serde_yaml::from_str(content).context("invalid YAML profile")?,
        ProfileFormat::Json => serde_json::from_str(content).context("invalid JSON profile")?,
    };
    Ok(profile)
}

fn load_profile(path: &Path) -> Result<RiskProfile> {
    let format = ProfileFormat::from_path(path)?;
    debug!(path = %path.display(), ?format, "loading profile");
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read profile {}", path.display()))?;
    let profile =
        parse_profile(&content, format).with_context(|| format!("in {}", path.display()))?;
    debug!(
        customer = %Masked(&profile.customer_id),
        category = profile.category().as_str(),
        "profile loaded"
    );
    Ok(profile)
}

pub(crate) async fn evaluate(args: EvaluateArgs) -> Result<()> {
    let mut config = match &args.config {
        Some(path) => RuntimeConfig::from_yaml_file(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => {
            let mut config = RuntimeConfig::default();
            config.apply_env_overrides()?;
            config
        }
    };
    if let Some(rules) = args.rules {
        debug!(path = %rules.display(), "overriding rule set");
        config.underwriting.rules_path = Some(rules);
    }

    let orchestrator =
        UnderwritingOrchestrator::from_config(&config, &BureauRegistry::with_defaults())
            .context("failed to start underwriting pipeline")?;
    info!(
        rules = orchestrator.underwriter().rules_name(),
        enrichment = orchestrator.enrichment_enabled(),
        "underwriting pipeline ready"
    );

    let profile = load_profile(&args.profile)?;
    let decision = orchestrator
        .evaluate(&profile)
        .await
        .context("evaluation failed")?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&decision)?);
    } else {
        print!("{}", render_decision(&decision));
    }
    Ok(())
}

fn render_decision(decision: &Decision) -> String {
    let mut out = format!("{}\n", decision.summary());

    let sections = [
        ("Risk factors", &decision.risk_factors),
        ("Positive factors", &decision.positive_factors),
        ("Exclusions", &decision.exclusions),
        ("Conditions", &decision.conditions),
        ("Compliance issues", &decision.compliance_issues),
    ];
    for (title, items) in sections {
        if !items.is_empty() {
            out.push_str(&format!("{title}:\n"));
            for item in items {
                out.push_str(&format!("  - {item}\n"));
            }
        }
    }

    if let Some(reason) = decision.referral_reason.as_ref().or(decision.decision_reason.as_ref()) {
        out.push_str(&format!("Reason: {reason}\n"));
    }
    if let Some(terms) = &decision.terms {
        out.push_str(&format!("Terms: {terms}\n"));
    }
    if let Some(multiplier) = decision.premium_multiplier {
        out.push_str(&format!("Premium multiplier: {multiplier:.2}\n"));
    }
    if let Some(confidence) = decision.confidence {
        out.push_str(&format!("Confidence: {confidence:.2}\n"));
    }
    if !decision.rules_fired.is_empty() {
        out.push_str(&format!("Rules fired: {}\n", decision.rules_fired.join(", ")));
    }
    out
}

pub(crate) fn score(path: &Path) -> Result<()> {
    let profile = load_profile(path)?;
    profile
        .validate()
        .with_context(|| format!("invalid profile {}", path.display()))?;

    let breakdown = ScoreAssessor::new().breakdown(&profile);
    println!("Credit:        {:>3}", breakdown.credit);
    println!("Claims:        {:>3}", breakdown.claims);
    println!("Category:      {:>3}", breakdown.category);
    println!("Prior issues:  {:>3}", breakdown.prior_issues);
    println!("Total:         {:>3}", breakdown.total());
    Ok(())
}

pub(crate) fn validate_rules(path: &Path) -> Result<()> {
    let rules = RuleSet::from_path(path)
        .with_context(|| format!("invalid rule set {}", path.display()))?;
    info!(rule_set = rules.name(), rules = rules.len(), "rule set valid");
    println!(
        "OK: {} v{} ({} rules)",
        rules.name(),
        rules.version(),
        rules.len()
    );
    Ok(())
}

pub(crate) fn list_rules(path: Option<&Path>) -> Result<()> {
    let rules = match path {
        Some(path) => RuleSet::from_path(path)
            .with_context(|| format!("invalid rule set {}", path.display()))?,
        None => RuleSet::standard().context("embedded standard rule set is invalid")?,
    };

    println!("{} v{}", rules.name(), rules.version());
    for rule in rules.rules() {
        println!("{:>5}  {:<10} {}", rule.priority(), rule.id(), rule.name());
    }
    Ok(())
}
