//! Jupiter Quote Types
//!
//! Request and response structures for the Jupiter quote API, plus the
//! conversion from a USD order to the input amount in base units.

use serde::{Deserialize, Serialize};

use crate::domain::{Direction, OrderAttempt};

/// Request parameters for getting a swap quote
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteRequest {
    /// Input token mint address
    pub input_mint: String,
    /// Output token mint address
    pub output_mint: String,
    /// Input amount in base units
    pub amount: u64,
    /// Slippage tolerance in basis points (1 = 0.01%)
    pub slippage_bps: u16,
    /// Restrict intermediate tokens to high-liquidity paths
    #[serde(skip_serializing_if = "Option::is_none")]
    pub restrict_intermediate_tokens: Option<bool>,
}

impl QuoteRequest {
    /// Create a new quote request with required parameters
    pub fn new(input_mint: String, output_mint: String, amount: u64, slippage_bps: u16) -> Self {
        Self {
            input_mint,
            output_mint,
            amount,
            slippage_bps,
            restrict_intermediate_tokens: None,
        }
    }

    /// Quote for one order attempt.
    ///
    /// Buys spend `notional` of the quote currency; sells spend
    /// `notional / reference_price` of the asset. Returns `None` when the
    /// amount rounds to zero base units or the reference price is unusable.
    pub fn for_order(
        order: &OrderAttempt,
        quote_mint: &str,
        asset_decimals: u8,
        quote_decimals: u8,
    ) -> Option<Self> {
        let (input_mint, output_mint, units) = match order.direction {
            Direction::Buy => (quote_mint, order.asset.as_str(), order.notional_usd),
            Direction::Sell => {
                if !(order.reference_price > 0.0) {
                    return None;
                }
                (order.asset.as_str(), quote_mint, order.notional_usd / order.reference_price)
            }
        };
        let decimals = match order.direction {
            Direction::Buy => quote_decimals,
            Direction::Sell => asset_decimals,
        };

        let amount = to_base_units(units, decimals)?;
        Some(Self::new(input_mint.to_string(), output_mint.to_string(), amount, order.slippage_bps))
    }
}

/// `units × 10^decimals`, floored. `None` for zero, negative or non-finite input.
pub fn to_base_units(units: f64, decimals: u8) -> Option<u64> {
    let scaled = (units * 10f64.powi(i32::from(decimals))).floor();
    if scaled.is_finite() && scaled >= 1.0 && scaled < u64::MAX as f64 {
        Some(scaled as u64)
    } else {
        None
    }
}

/// Response from Jupiter quote API
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteResponse {
    /// Input token mint address
    pub input_mint: String,
    /// Output token mint address
    pub output_mint: String,
    /// Input amount in base units
    pub in_amount: String,
    /// Output amount in base units
    pub out_amount: String,
    /// Minimum output amount after slippage (otherAmountThreshold)
    pub other_amount_threshold: String,
    /// Swap mode (ExactIn or ExactOut)
    pub swap_mode: String,
    /// Slippage in basis points
    pub slippage_bps: u16,
    /// Price impact percentage (as string)
    #[serde(default)]
    pub price_impact_pct: String,
    /// Route plan with swap details
    pub route_plan: Vec<RoutePlanStep>,
    #[serde(default)]
    pub context_slot: Option<u64>,
    /// Catch-all so the quote can be echoed back to /swap unchanged
    #[serde(flatten)]
    pub extra: std::collections::HashMap<String, serde_json::Value>,
}

impl QuoteResponse {
    pub fn input_amount(&self) -> u64 {
        self.in_amount.parse().unwrap_or(0)
    }

    pub fn output_amount(&self) -> u64 {
        self.out_amount.parse().unwrap_or(0)
    }

    /// Minimum output amount after slippage
    pub fn min_output_amount(&self) -> u64 {
        self.other_amount_threshold.parse().unwrap_or(0)
    }

    /// Price impact as f64 percentage
    pub fn price_impact(&self) -> f64 {
        self.price_impact_pct.parse().unwrap_or(0.0)
    }

    /// DEX labels along the route, e.g. "Raydium -> Orca"
    pub fn route_labels(&self) -> String {
        self.route_plan
            .iter()
            .map(|step| step.swap_info.label.as_str())
            .collect::<Vec<_>>()
            .join(" -> ")
    }
}

/// A step in the route plan
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoutePlanStep {
    pub swap_info: SwapInfo,
    /// Percentage of the trade going through this route
    pub percent: u8,
}

/// Information about a single swap in the route
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapInfo {
    /// AMM key (pool identifier)
    pub amm_key: String,
    /// Label for the DEX (e.g., "Raydium", "Pump.fun Amm")
    pub label: String,
    pub input_mint: String,
    pub output_mint: String,
    pub in_amount: String,
    pub out_amount: String,
    /// Not always returned
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fee_amount: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fee_mint: Option<String>,
}
