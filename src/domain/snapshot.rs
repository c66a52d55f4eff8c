use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Position and price read together at one decision point.
///
/// Never reused across steps: fills land asynchronously, so every sizing
/// decision takes a fresh snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketSnapshot {
    /// Asset held, in token units (decimals applied)
    pub quantity: f64,
    /// Unit price in quote currency
    pub price: f64,
    pub observed_at: DateTime<Utc>,
}

impl MarketSnapshot {
    pub fn new(quantity: f64, price: f64) -> Self {
        Self {
            quantity,
            price,
            observed_at: Utc::now(),
        }
    }

    /// Position value in quote currency
    pub fn value_usd(&self) -> f64 {
        self.quantity * self.price
    }

    /// Unrealized PnL against an externally supplied reference price
    pub fn pnl(&self, reference_price: f64) -> f64 {
        (self.price - reference_price) * self.quantity
    }

    /// PnL as a percentage of the reference price
    pub fn pnl_pct(&self, reference_price: f64) -> Option<f64> {
        if reference_price > 0.0 {
            Some((self.price - reference_price) / reference_price * 100.0)
        } else {
            None
        }
    }
}
