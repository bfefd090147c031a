//! Orchestrator runs against the simulated bureau.

use std::sync::Arc;

use underwriter_core::{Coverage, DecisionMethod, DrivingRecord, Outcome, RiskProfile};
use underwriter_runtime::{
    BureauRegistry, RuntimeConfig, SimulatedBureau, TaxId, UnderwritingOrchestrator,
};

const CONFIG: &str = r#"
enrichment:
  enabled: true
  timeout: 5s
  cache_ttl: 10m
bureau:
  provider: simulated
  settings:
    seed: 11
"#;

fn auto_profile(customer_id: &str) -> RiskProfile {
    RiskProfile::new(customer_id, Coverage::Auto(DrivingRecord::default()))
}

fn orchestrator() -> Arc<UnderwritingOrchestrator> {
    let config: RuntimeConfig = serde_yaml::from_str(CONFIG).unwrap();
    Arc::new(UnderwritingOrchestrator::from_config(&config, &BureauRegistry::with_defaults()).unwrap())
}

#[tokio::test]
async fn enriched_profiles_are_scored_from_bureau_band() {
    let orchestrator = orchestrator();
    assert!(orchestrator.enrichment_enabled());

    let decision = orchestrator
        .evaluate_with_tax_id(&auto_profile("CUST-ENR-01"), Some(&TaxId::new("123-45-6789")))
        .await
        .unwrap();

    // simulated scores are 600..800, so only the credit band contributes
    let score = decision.risk_score.unwrap();
    assert!(score <= 30, "unexpected score {score}");
    assert_eq!(decision.outcome, Some(Outcome::Approve));
    assert!(decision.compliance_passed);
}

#[tokio::test]
async fn cached_reports_give_stable_decisions() {
    let orchestrator = orchestrator();
    let first = orchestrator.evaluate(&auto_profile("CUST-ENR-02")).await.unwrap();
    let second = orchestrator.evaluate(&auto_profile("CUST-ENR-02")).await.unwrap();
    assert_eq!(first.risk_score, second.risk_score);
}

#[tokio::test]
async fn batch_mixes_failures_and_successes_in_order() {
    let orchestrator = orchestrator();
    let profiles = vec![
        auto_profile("CUST-ENR-03"),
        auto_profile(""),
        auto_profile("CUST-ENR-04"),
    ];

    let decisions = orchestrator.evaluate_batch(profiles).await;
    assert_eq!(decisions.len(), 3);
    assert_eq!(decisions[0].customer_id, "CUST-ENR-03");
    assert_eq!(decisions[1].method, Some(DecisionMethod::ErrorFallback));
    assert!(decisions[1].manual_review_required);
    assert_eq!(decisions[2].customer_id, "CUST-ENR-04");
    assert_ne!(decisions[2].method, Some(DecisionMethod::ErrorFallback));
}

#[tokio::test]
async fn completed_credit_check_is_not_overwritten() {
    let orchestrator = orchestrator();
    let profile = auto_profile("CUST-ENR-05").with_credit_score(560);

    let decision = orchestrator.evaluate(&profile).await.unwrap();
    // 40 credit points for a score below 600
    assert_eq!(decision.risk_score, Some(40));
    assert_eq!(decision.outcome, Some(Outcome::Approve));
}

#[tokio::test]
async fn seeded_bureau_is_reproducible() {
    use underwriter_runtime::CreditBureau;

    let tax_id = TaxId::placeholder_for("CUST-ENR-06");
    let a = SimulatedBureau::seeded(99);
    let b = SimulatedBureau::seeded(99);
    assert_eq!(
        a.fetch_credit_score("CUST-ENR-06", &tax_id).await.unwrap(),
        b.fetch_credit_score("CUST-ENR-06", &tax_id).await.unwrap()
    );
}
