//! In-process bureau producing plausible scores.
//!
//! Scores are drawn from 600..800. A `seed` setting makes the sequence
//! reproducible.

use async_trait::async_trait;
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::Value as JsonValue;
use std::sync::Arc;

use super::{BureauError, BureauFactory, CreditBureau, CreditReport, TaxId};
use underwriter_core::masking::Masked;

const DEFAULT_BUREAU_NAME: &str = "Simulated Bureau";
const BASE_SCORE: u16 = 600;
const SCORE_SPREAD: u16 = 200;

pub struct SimulatedBureau {
    rng: Mutex<StdRng>,
    bureau_name: String,
}

impl SimulatedBureau {
    /// Bureau with a reproducible score sequence.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
            bureau_name: DEFAULT_BUREAU_NAME.to_string(),
        }
    }

    pub fn from_entropy() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
            bureau_name: DEFAULT_BUREAU_NAME.to_string(),
        }
    }

    pub fn from_config(config: &JsonValue) -> Result<Self, BureauError> {
        let mut bureau = match &config["seed"] {
            JsonValue::Null => Self::from_entropy(),
            value => Self::seeded(value.as_u64().ok_or_else(|| {
                BureauError::NotConfigured("seed must be a non-negative integer".to_string())
            })?),
        };

        if let Some(name) = config["bureau"].as_str() {
            bureau.bureau_name = name.to_string();
        }

        Ok(bureau)
    }
}

impl std::fmt::Debug for SimulatedBureau {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimulatedBureau")
            .field("bureau_name", &self.bureau_name)
            .finish()
    }
}

#[async_trait]
impl CreditBureau for SimulatedBureau {
    async fn fetch_credit_score(
        &self,
        customer_id: &str,
        _tax_id: &TaxId,
    ) -> Result<CreditReport, BureauError> {
        let score = BASE_SCORE + self.rng.lock().gen_range(0..SCORE_SPREAD);
        tracing::debug!(customer = %Masked(customer_id), score, "simulated credit score");
        Ok(CreditReport::new(score, self.bureau_name.clone()))
    }

    fn name(&self) -> &str {
        "simulated"
    }
}

/// Factory for the simulated bureau.
///
/// ## Configuration Format
/// ```json
/// {
///   "seed": 42,                  // Optional, entropy when absent
///   "bureau": "Simulated Bureau" // Optional, reported bureau name
/// }
/// ```
pub struct SimulatedBureauFactory;

impl BureauFactory for SimulatedBureauFactory {
    fn provider_type(&self) -> &'static str {
        "simulated"
    }

    fn create(&self, config: &JsonValue) -> Result<Arc<dyn CreditBureau>, BureauError> {
        Ok(Arc::new(SimulatedBureau::from_config(config)?))
    }

    fn validate_config(&self, config: &JsonValue) -> Result<(), BureauError> {
        SimulatedBureau::from_config(config).map(|_| ())
    }

    fn default_config(&self) -> JsonValue {
        serde_json::json!({ "bureau": DEFAULT_BUREAU_NAME })
    }

    fn description(&self) -> &'static str {
        "Simulated bureau for development and testing"
    }
}
