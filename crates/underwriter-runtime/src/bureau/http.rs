//! HTTP credit bureau client.
//!
//! POSTs `{base_url}/credit-score` with a bearer credential. Transient
//! failures (connection errors, timeouts, 429 and 5xx) are retried with
//! exponential backoff.

use async_trait::async_trait;
use backon::{ExponentialBuilder, Retryable};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::sync::Arc;
use std::time::Duration;

use super::{ApiCredential, BureauError, BureauFactory, CreditBureau, CreditReport, TaxId};
use underwriter_core::masking::Masked;

/// Environment variable for the bureau API key.
pub const CREDIT_BUREAU_API_KEY_ENV: &str = "CREDIT_BUREAU_API_KEY";

const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_MAX_RETRIES: usize = 3;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CreditScoreRequest<'a> {
    customer_id: &'a str,
    tax_id: &'a str,
    request_type: &'static str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreditScoreResponse {
    credit_score: u16,
    #[serde(default)]
    bureau: Option<String>,
    #[serde(default)]
    risk_level: Option<String>,
}

#[derive(Deserialize)]
struct BureauErrorBody {
    #[serde(default)]
    message: String,
}

pub struct HttpBureau {
    credential: ApiCredential,
    base_url: String,
    client: reqwest::Client,
    backoff: ExponentialBuilder,
    request_timeout: Duration,
}

impl HttpBureau {
    /// Create from JSON settings with environment fallback for the key.
    pub fn from_config(config: &JsonValue) -> Result<Self, BureauError> {
        let credential = ApiCredential::from_config_or_env(
            config,
            "api_key",
            CREDIT_BUREAU_API_KEY_ENV,
            "Credit bureau API key",
        )?;

        let base_url = config["base_url"]
            .as_str()
            .ok_or_else(|| BureauError::NotConfigured("base_url is required".to_string()))?
            .trim_end_matches('/')
            .to_string();

        let request_timeout = match config["request_timeout"].as_str() {
            Some(text) => humantime::parse_duration(text)
                .map_err(|e| BureauError::NotConfigured(format!("request_timeout: {e}")))?,
            None => DEFAULT_REQUEST_TIMEOUT,
        };

        let max_retries = config["max_retries"]
            .as_u64()
            .map(|n| n as usize)
            .unwrap_or(DEFAULT_MAX_RETRIES);

        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| BureauError::HttpError(e.to_string()))?;

        Ok(Self {
            credential,
            base_url,
            client,
            backoff: ExponentialBuilder::default()
                .with_min_delay(Duration::from_millis(200))
                .with_max_times(max_retries),
            request_timeout,
        })
    }

    async fn request(
        &self,
        customer_id: &str,
        tax_id: &TaxId,
    ) -> Result<CreditReport, BureauError> {
        let body = CreditScoreRequest {
            customer_id,
            tax_id: tax_id.expose(),
            request_type: "full_report",
        };

        let response = self
            .client
            .post(format!("{}/credit-score", self.base_url))
            .bearer_auth(self.credential.expose())
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    BureauError::Timeout(self.request_timeout)
                } else {
                    BureauError::HttpError(e.to_string())
                }
            })?;

        let status = response.status();

        if status == 429 {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok())
                .map(Duration::from_secs);
            return Err(BureauError::RateLimited { retry_after });
        }

        if status == 401 || status == 403 {
            return Err(BureauError::AuthError);
        }

        if !status.is_success() {
            let message = response
                .json::<BureauErrorBody>()
                .await
                .map(|body| body.message)
                .unwrap_or_default();

            return Err(BureauError::ApiError {
                status: status.as_u16(),
                message,
            });
        }

        let body: CreditScoreResponse = response
            .json()
            .await
            .map_err(|e| BureauError::ParseError(e.to_string()))?;

        let mut report = CreditReport::new(
            body.credit_score,
            body.bureau.unwrap_or_else(|| "unknown".to_string()),
        );
        if let Some(level) = body.risk_level {
            report.risk_level = level;
        }
        Ok(report)
    }
}

#[async_trait]
impl CreditBureau for HttpBureau {
    async fn fetch_credit_score(
        &self,
        customer_id: &str,
        tax_id: &TaxId,
    ) -> Result<CreditReport, BureauError> {
        (|| self.request(customer_id, tax_id))
            .retry(self.backoff)
            .when(BureauError::is_transient)
            .notify(|err: &BureauError, delay: Duration| {
                tracing::warn!(
                    customer = %Masked(customer_id),
                    error = %err,
                    delay = ?delay,
                    "credit bureau call failed, retrying"
                );
            })
            .await
    }

    fn name(&self) -> &str {
        "http"
    }
}

impl std::fmt::Debug for HttpBureau {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpBureau")
            .field("base_url", &self.base_url)
            .field("credential", &self.credential)
            .finish()
    }
}

/// Factory for the HTTP bureau.
///
/// ## Configuration Format
/// ```json
/// {
///   "base_url": "https://bureau.example.com/v1", // Required
///   "api_key": "...",                            // Optional, falls back to CREDIT_BUREAU_API_KEY env
///   "request_timeout": "10s",                    // Optional
///   "max_retries": 3                             // Optional
/// }
/// ```
pub struct HttpBureauFactory;

impl BureauFactory for HttpBureauFactory {
    fn provider_type(&self) -> &'static str {
        "http"
    }

    fn create(&self, config: &JsonValue) -> Result<Arc<dyn CreditBureau>, BureauError> {
        Ok(Arc::new(HttpBureau::from_config(config)?))
    }

    fn validate_config(&self, config: &JsonValue) -> Result<(), BureauError> {
        if !ApiCredential::is_available(config, "api_key", CREDIT_BUREAU_API_KEY_ENV) {
            return Err(BureauError::NotConfigured(format!(
                "Credit bureau API key required: set 'api_key' in bureau settings or {} env",
                CREDIT_BUREAU_API_KEY_ENV
            )));
        }

        match config["base_url"].as_str() {
            Some(url) if url.starts_with("http://") || url.starts_with("https://") => Ok(()),
            Some(_) => Err(BureauError::NotConfigured(
                "base_url must start with http:// or https://".to_string(),
            )),
            None => Err(BureauError::NotConfigured("base_url is required".to_string())),
        }
    }

    fn default_config(&self) -> JsonValue {
        serde_json::json!({
            "request_timeout": "10s",
            "max_retries": DEFAULT_MAX_RETRIES
        })
    }

    fn description(&self) -> &'static str {
        "HTTP credit bureau with bearer authentication and retry"
    }
}
