//! Jupiter API Client
//!
//! HTTP client for the Jupiter swap API: quotes and swap transaction building.
//! Single attempt per call; the executor owns retry policy.

use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use thiserror::Error;

use super::quote::{QuoteRequest, QuoteResponse};
use super::swap::{SwapRequest, SwapResponse};

/// Jupiter adapter configuration
#[derive(Debug, Clone)]
pub struct JupiterConfig {
    /// Base URL for Jupiter API
    pub base_url: String,
    /// Optional API key for higher rate limits
    pub api_key: Option<String>,
    /// Per-request HTTP timeout
    pub timeout: Duration,
    /// Quote currency mint (USDC)
    pub quote_mint: String,
    pub quote_decimals: u8,
    pub asset_decimals: u8,
    pub dynamic_compute_units: bool,
    /// Bound for one whole quote-build-sign-send attempt
    pub submit_timeout: Duration,
}

impl Default for JupiterConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.jup.ag/swap/v1".to_string(),
            api_key: None,
            timeout: Duration::from_secs(30),
            quote_mint: crate::config::USDC_MINT.to_string(),
            quote_decimals: 6,
            asset_decimals: 6,
            dynamic_compute_units: true,
            submit_timeout: Duration::from_secs(60),
        }
    }
}

#[derive(Debug, Error)]
pub enum JupiterError {
    #[error("Request failed: {0}")]
    Network(String),
    #[error("Request timed out")]
    Timeout,
    #[error("Rate limit exceeded")]
    RateLimited,
    #[error("Slippage tolerance exceeded")]
    SlippageExceeded,
    #[error("API error {status}: {body}")]
    Api { status: u16, body: String },
    #[error("Failed to parse response: {0}")]
    Parse(String),
    #[error("Failed to decode transaction: {0}")]
    Decode(String),
}

impl JupiterError {
    /// Transport level failure: the request may never have reached Jupiter
    pub fn is_transient(&self) -> bool {
        matches!(self, JupiterError::Network(_) | JupiterError::Timeout | JupiterError::RateLimited)
    }
}

impl From<reqwest::Error> for JupiterError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            JupiterError::Timeout
        } else {
            JupiterError::Network(e.to_string())
        }
    }
}

/// Map a non-success HTTP status and body to an error
fn classify_failure(status: StatusCode, body: String) -> JupiterError {
    if status == StatusCode::TOO_MANY_REQUESTS {
        return JupiterError::RateLimited;
    }
    if body.contains("SlippageToleranceExceeded") || body.contains("6001") {
        return JupiterError::SlippageExceeded;
    }
    JupiterError::Api { status: status.as_u16(), body }
}

/// Jupiter DEX aggregator client
#[derive(Debug, Clone)]
pub struct JupiterClient {
    config: JupiterConfig,
    http: Client,
}

impl JupiterClient {
    pub fn new(config: JupiterConfig) -> Result<Self, JupiterError> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| JupiterError::Network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { config, http })
    }

    pub fn config(&self) -> &JupiterConfig {
        &self.config
    }

    /// Get a quote for a token swap
    pub async fn get_quote(&self, request: &QuoteRequest) -> Result<QuoteResponse, JupiterError> {
        let url = format!("{}/quote", self.config.base_url);

        let mut req = self.http.get(&url).query(&[
            ("inputMint", request.input_mint.clone()),
            ("outputMint", request.output_mint.clone()),
            ("amount", request.amount.to_string()),
            ("slippageBps", request.slippage_bps.to_string()),
        ]);

        if let Some(restrict) = request.restrict_intermediate_tokens {
            req = req.query(&[("restrictIntermediateTokens", restrict.to_string())]);
        }

        if let Some(ref api_key) = self.config.api_key {
            req = req.header("x-api-key", api_key);
        }

        self.handle_response(req.send().await?).await
    }

    /// Build the swap transaction for a quote
    pub async fn get_swap_transaction(&self, request: &SwapRequest) -> Result<SwapResponse, JupiterError> {
        let url = format!("{}/swap", self.config.base_url);

        let mut req = self.http.post(&url).json(request);

        if let Some(ref api_key) = self.config.api_key {
            req = req.header("x-api-key", api_key);
        }

        self.handle_response(req.send().await?).await
    }

    /// Handle API response and deserialize
    async fn handle_response<T: DeserializeOwned>(&self, response: reqwest::Response) -> Result<T, JupiterError> {
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_failure(status, body));
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| JupiterError::Parse(e.to_string()))
    }
}
