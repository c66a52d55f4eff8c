//! Order sizing
//!
//! A chunk is never larger than the per-order cap, and a run is finished once the
//! gap to the target is smaller than one minimal chunk.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::snapshot::MarketSnapshot;

/// Swap direction relative to the tracked asset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Quote currency -> asset
    Buy,
    /// Asset -> quote currency
    Sell,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Buy => f.write_str("buy"),
            Direction::Sell => f.write_str("sell"),
        }
    }
}

/// Where a bounded executor run is heading
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Goal {
    /// Sell until the remaining position is worth less than one minimal chunk
    Close,
    /// Buy until the position is worth `target_usd`. With a `price_limit` the run
    /// stops as soon as the price is no longer below it.
    Accumulate {
        target_usd: f64,
        price_limit: Option<f64>,
    },
}

impl Goal {
    pub fn accumulate(target_usd: f64) -> Self {
        Goal::Accumulate { target_usd, price_limit: None }
    }

    /// Target position value in USD (0 for a close)
    pub fn target_usd(&self) -> f64 {
        match self {
            Goal::Close => 0.0,
            Goal::Accumulate { target_usd, .. } => *target_usd,
        }
    }
}

/// Per-order bounds shared by every run
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SizingLimits {
    /// Largest notional a single order may carry
    pub max_order_usd: f64,
    /// Gaps smaller than this count as reached
    pub min_chunk_usd: f64,
}

/// Next order to send, derived fresh from a snapshot
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChunkPlan {
    pub direction: Direction,
    pub notional_usd: f64,
}

/// Size the next chunk, or `None` when the goal is reached.
///
/// Accumulate never sells: a position already at or above the target is reached.
pub fn plan_chunk(goal: &Goal, snapshot: &MarketSnapshot, limits: &SizingLimits) -> Option<ChunkPlan> {
    let value = snapshot.value_usd();
    let (direction, remaining) = match goal {
        Goal::Close => (Direction::Sell, value),
        Goal::Accumulate { target_usd, .. } => (Direction::Buy, target_usd - value),
    };

    if !(remaining >= limits.min_chunk_usd) {
        return None;
    }

    Some(ChunkPlan {
        direction,
        notional_usd: remaining.min(limits.max_order_usd),
    })
}

/// One submission as handed to the swap venue. Lives for a single submit call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderAttempt {
    pub direction: Direction,
    /// Asset mint address
    pub asset: String,
    /// Order size in quote currency (USD)
    pub notional_usd: f64,
    /// Slippage tolerance in basis points (1 = 0.01%)
    pub slippage_bps: u16,
    /// Prioritization fee in lamports
    pub priority_fee_lamports: u64,
    /// Unit price the chunk was sized against, used to convert sells into token units
    pub reference_price: f64,
}

impl OrderAttempt {
    /// Token quantity this order corresponds to at its reference price
    pub fn asset_quantity(&self) -> f64 {
        if self.reference_price > 0.0 {
            self.notional_usd / self.reference_price
        } else {
            0.0
        }
    }
}

impl fmt::Display for OrderAttempt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ${:.4} of {} @ {:.8} (slippage {} bps)",
            self.direction,
            self.notional_usd,
            short_mint(&self.asset),
            self.reference_price,
            self.slippage_bps
        )
    }
}

/// Last four characters of a mint, for log lines
pub fn short_mint(mint: &str) -> &str {
    let start = mint.len().saturating_sub(4);
    mint.get(start..).unwrap_or(mint)
}
