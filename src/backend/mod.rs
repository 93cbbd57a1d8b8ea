//! Client for the settlement backend that performs on-chain resolve and
//! payout calls on our behalf.

use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};
use thiserror::Error;
use tokio::time::{sleep, Instant};

use crate::config::AppConfig;
use crate::models::Outcome;

const BASE_RETRY_DELAY: Duration = Duration::from_millis(500);
const MAX_RETRY_DELAY: Duration = Duration::from_secs(8);

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("backend returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("backend unavailable after {attempts} attempts: {last}")]
    RetriesExhausted { attempts: u32, last: String },

    #[error("unexpected backend response: {0}")]
    Decode(#[from] reqwest::Error),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimResponse {
    /// True once every winning position has been paid out.
    #[serde(default)]
    pub settled: bool,
    #[serde(default)]
    pub claimed: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct SettlementBackend {
    http: Client,
    base_url: String,
    api_key: Option<String>,
    max_elapsed: Duration,
}

impl SettlementBackend {
    pub fn new(
        http: Client,
        base_url: impl Into<String>,
        api_key: Option<String>,
        max_elapsed: Duration,
    ) -> Self {
        Self {
            http,
            base_url: base_url.into(),
            api_key,
            max_elapsed,
        }
    }

    /// `None` when `BACKEND_URL` is unset (dry-run mode).
    pub fn from_config(http: Client, config: &AppConfig) -> Option<Self> {
        let url = config.backend_url.as_ref()?;
        Some(Self::new(
            http,
            url.clone(),
            config.backend_api_key.clone(),
            Duration::from_secs(config.backend_max_retry_secs),
        ))
    }

    /// Resolve the market contract on-chain with the given outcome.
    pub async fn resolve_market(
        &self,
        market_address: &str,
        chain_id: i64,
        outcome: Outcome,
    ) -> Result<(), BackendError> {
        let body = json!({
            "marketAddress": market_address,
            "chainId": chain_id,
            "outcome": outcome.as_str(),
        });
        self.post_with_retry("/markets/resolve", &body).await?;
        Ok(())
    }

    /// Process payouts for a resolved market.
    pub async fn claim(
        &self,
        market_address: &str,
        chain_id: i64,
    ) -> Result<ClaimResponse, BackendError> {
        let body = json!({
            "marketAddress": market_address,
            "chainId": chain_id,
        });
        let resp = self.post_with_retry("/markets/claim", &body).await?;
        Ok(resp.json().await?)
    }

    /// POST with capped exponential backoff on transport errors, 429 and 5xx,
    /// until `max_elapsed` would be exceeded.
    async fn post_with_retry(&self, path: &str, body: &Value) -> Result<reqwest::Response, BackendError> {
        let url = format!("{}{}", self.base_url.trim_end_matches('/'), path);
        let started = Instant::now();
        let mut attempt: u32 = 0;

        loop {
            let mut req = self.http.post(&url).json(body);
            if let Some(key) = &self.api_key {
                req = req.header("x-api-key", key);
            }

            let last = match req.send().await {
                Ok(resp) if resp.status().is_success() => return Ok(resp),
                Ok(resp) if is_retryable(resp.status()) => format!("status {}", resp.status()),
                Ok(resp) => {
                    let status = resp.status().as_u16();
                    let body = resp.text().await.unwrap_or_default();
                    return Err(BackendError::Status {
                        status,
                        body: body.chars().take(500).collect(),
                    });
                }
                Err(e) => e.to_string(),
            };

            let delay = backoff_delay(attempt);
            attempt = attempt.saturating_add(1);
            if started.elapsed() + delay > self.max_elapsed {
                return Err(BackendError::RetriesExhausted {
                    attempts: attempt,
                    last,
                });
            }

            tracing::warn!(
                url = %url,
                attempt,
                delay_ms = delay.as_millis() as u64,
                reason = %last,
                "Backend call failed, retrying"
            );
            sleep(delay).await;
        }
    }
}

fn is_retryable(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

fn backoff_delay(attempt: u32) -> Duration {
    let delay = BASE_RETRY_DELAY * 2u32.saturating_pow(attempt);
    delay.min(MAX_RETRY_DELAY)
}
