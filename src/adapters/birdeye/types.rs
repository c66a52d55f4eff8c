//! Birdeye API Types
//!
//! Response envelopes for the price, wallet balance and token overview
//! endpoints. The overview is kept as raw JSON because its price-change keys
//! vary by window.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value;

use crate::domain::{extract_links, TokenOverview};

/// Standard `{ success, data, message }` envelope
#[derive(Debug, Deserialize)]
pub struct BirdeyeResponse<T> {
    #[serde(default)]
    pub success: bool,
    pub data: Option<T>,
    #[serde(default)]
    pub message: Option<String>,
}

/// `/defi/price`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceData {
    pub value: Option<f64>,
    #[serde(default)]
    pub update_unix_time: Option<i64>,
}

/// `/v1/wallet/token_balance`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenBalanceData {
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub decimals: Option<u8>,
    /// Raw balance in base units
    #[serde(default)]
    pub balance: Option<f64>,
    /// Balance with decimals applied
    pub ui_amount: Option<f64>,
}

fn count(data: &Value, key: &str) -> u64 {
    data.get(key).and_then(Value::as_f64).map(|v| v.max(0.0) as u64).unwrap_or(0)
}

fn amount(data: &Value, key: &str) -> f64 {
    data.get(key).and_then(Value::as_f64).unwrap_or(0.0)
}

/// Build a `TokenOverview` from the `data` object of `/defi/token_overview`.
/// Missing numeric fields read as zero; null price changes are skipped.
pub fn overview_from_value(address: &str, data: &Value) -> Result<TokenOverview, String> {
    let fields = data
        .as_object()
        .ok_or_else(|| format!("overview data is not an object: {}", data))?;

    let price_changes: BTreeMap<String, f64> = fields
        .iter()
        .filter(|(key, _)| key.contains("priceChange"))
        .filter_map(|(key, value)| value.as_f64().map(|change| (key.clone(), change)))
        .collect();

    let description = data
        .get("extensions")
        .and_then(|ext| ext.get("description"))
        .and_then(Value::as_str)
        .unwrap_or_default();

    Ok(TokenOverview {
        address: address.to_string(),
        buy_1h: count(data, "buy1h"),
        sell_1h: count(data, "sell1h"),
        price_changes,
        unique_wallets_24h: count(data, "uniqueWallet24h"),
        volume_24h_usd: amount(data, "v24hUSD"),
        watch: count(data, "watch"),
        view_24h: count(data, "view24h"),
        liquidity_usd: amount(data, "liquidity"),
        links: extract_links(description),
    })
}
