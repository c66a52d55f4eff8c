//! Birdeye API Client
//!
//! Position, price and token overview reads. Every call goes to the API;
//! nothing is cached between reads.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

use crate::domain::TokenOverview;
use crate::ports::{MarketDataError, MarketDataPort, RiskError, RiskPort};

use super::types::{overview_from_value, BirdeyeResponse, PriceData, TokenBalanceData};

#[derive(Debug, Clone)]
pub struct BirdeyeConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    /// Per-request timeout
    pub timeout: Duration,
}

impl Default for BirdeyeConfig {
    fn default() -> Self {
        Self {
            base_url: "https://public-api.birdeye.so".to_string(),
            api_key: None,
            timeout: Duration::from_secs(10),
        }
    }
}

#[derive(Debug, Error)]
pub enum BirdeyeError {
    #[error("HTTP error: {0}")]
    Http(String),
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),
    #[error("API error {status}: {body}")]
    Status { status: u16, body: String },
    #[error("Request unsuccessful: {0}")]
    Unsuccessful(String),
    #[error("Malformed payload: {0}")]
    Malformed(String),
}

impl From<BirdeyeError> for MarketDataError {
    fn from(e: BirdeyeError) -> Self {
        match e {
            BirdeyeError::Timeout(after) => MarketDataError::Timeout(after),
            BirdeyeError::Malformed(msg) => MarketDataError::Malformed(msg),
            other => MarketDataError::Http(other.to_string()),
        }
    }
}

impl From<BirdeyeError> for RiskError {
    fn from(e: BirdeyeError) -> Self {
        match e {
            BirdeyeError::Malformed(msg) => RiskError::Malformed(msg),
            other => RiskError::Request(other.to_string()),
        }
    }
}

/// Birdeye client bound to one wallet
#[derive(Debug, Clone)]
pub struct BirdeyeClient {
    config: BirdeyeConfig,
    http: Client,
    /// Wallet whose token balance is the tracked position
    wallet: String,
}

impl BirdeyeClient {
    pub fn new(config: BirdeyeConfig, wallet: impl Into<String>) -> Result<Self, BirdeyeError> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| BirdeyeError::Http(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            config,
            http,
            wallet: wallet.into(),
        })
    }

    pub fn wallet(&self) -> &str {
        &self.wallet
    }

    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<BirdeyeResponse<T>, BirdeyeError> {
        let url = format!("{}{}", self.config.base_url, path);

        let mut req = self
            .http
            .get(&url)
            .query(query)
            .header("x-chain", "solana")
            .header("accept", "application/json");

        if let Some(ref api_key) = self.config.api_key {
            req = req.header("X-API-KEY", api_key);
        }

        let response = req.send().await.map_err(|e| self.transport_error(e))?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(BirdeyeError::Status { status: status.as_u16(), body });
        }

        let body = response.text().await.map_err(|e| self.transport_error(e))?;
        parse_envelope(path, &body)
    }

    fn transport_error(&self, e: reqwest::Error) -> BirdeyeError {
        if e.is_timeout() {
            BirdeyeError::Timeout(self.config.timeout)
        } else {
            BirdeyeError::Http(e.to_string())
        }
    }

    /// Token overview statistics (`/defi/token_overview`)
    pub async fn token_overview(&self, address: &str) -> Result<TokenOverview, BirdeyeError> {
        let data = self.token_data("/defi/token_overview", address).await?;
        overview_from_value(address, &data).map_err(BirdeyeError::Malformed)
    }

    /// Raw security report (`/defi/token_security`): mint and freeze
    /// authorities, holder concentration
    pub async fn token_security(&self, address: &str) -> Result<Value, BirdeyeError> {
        self.token_data("/defi/token_security", address).await
    }

    /// Raw creation record (`/defi/token_creation_info`)
    pub async fn token_creation_info(&self, address: &str) -> Result<Value, BirdeyeError> {
        self.token_data("/defi/token_creation_info", address).await
    }

    async fn token_data(&self, path: &str, address: &str) -> Result<Value, BirdeyeError> {
        let response: BirdeyeResponse<Value> = self.get(path, &[("address", address)]).await?;
        data_from(path, address, response)
    }
}

/// `data` of a successful token endpoint envelope; absent or null is malformed.
pub(crate) fn data_from(
    path: &str,
    address: &str,
    response: BirdeyeResponse<Value>,
) -> Result<Value, BirdeyeError> {
    response
        .data
        .ok_or_else(|| BirdeyeError::Malformed(format!("no data from {} for {}", path, address)))
}

/// Unit price from a price payload. Missing, non-finite or non-positive is malformed.
pub(crate) fn price_from(asset: &str, data: Option<PriceData>) -> Result<f64, MarketDataError> {
    let price = data
        .and_then(|d| d.value)
        .ok_or_else(|| MarketDataError::NoData(asset.to_string()))?;

    if !price.is_finite() || price <= 0.0 {
        return Err(MarketDataError::Malformed(format!("price {} for {}", price, asset)));
    }
    Ok(price)
}

/// Decode a response body and reject envelopes with `success: false`.
pub(crate) fn parse_envelope<T: DeserializeOwned>(
    path: &str,
    body: &str,
) -> Result<BirdeyeResponse<T>, BirdeyeError> {
    let parsed: BirdeyeResponse<T> = serde_json::from_str(body)
        .map_err(|e| BirdeyeError::Malformed(format!("{} ({})", e, path)))?;

    if !parsed.success {
        return Err(BirdeyeError::Unsuccessful(
            parsed.message.unwrap_or_else(|| path.to_string()),
        ));
    }
    Ok(parsed)
}

/// Position from a balance payload.
///
/// `data: null` is `NoData`. An object without `uiAmount` falls back to the
/// raw `balance` scaled by `decimals`; with neither it is malformed.
pub(crate) fn position_from(asset: &str, data: Option<TokenBalanceData>) -> Result<f64, MarketDataError> {
    let data = data.ok_or_else(|| MarketDataError::NoData(asset.to_string()))?;

    let quantity = match (data.ui_amount, data.balance, data.decimals) {
        (Some(ui_amount), _, _) => ui_amount,
        (None, Some(raw), Some(decimals)) => raw / 10f64.powi(i32::from(decimals)),
        _ => {
            return Err(MarketDataError::Malformed(format!(
                "balance payload for {} has no amount",
                asset
            )))
        }
    };

    if !quantity.is_finite() || quantity < 0.0 {
        return Err(MarketDataError::Malformed(format!("balance {} for {}", quantity, asset)));
    }
    Ok(quantity)
}

#[async_trait]
impl MarketDataPort for BirdeyeClient {
    async fn get_position(&self, asset: &str) -> Result<f64, MarketDataError> {
        let response: BirdeyeResponse<TokenBalanceData> = self
            .get(
                "/v1/wallet/token_balance",
                &[("wallet", self.wallet.as_str()), ("token_address", asset)],
            )
            .await?;
        position_from(asset, response.data)
    }

    async fn get_price(&self, asset: &str) -> Result<f64, MarketDataError> {
        let response: BirdeyeResponse<PriceData> =
            self.get("/defi/price", &[("address", asset)]).await?;
        price_from(asset, response.data)
    }
}

#[async_trait]
impl RiskPort for BirdeyeClient {
    async fn token_overview(&self, asset: &str) -> Result<TokenOverview, RiskError> {
        BirdeyeClient::token_overview(self, asset).await.map_err(RiskError::from)
    }
}
