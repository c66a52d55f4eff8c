//! Operator intent and controller modes.

use std::fmt;

use serde::{Deserialize, Serialize};

/// What the operator asked the bot to do. Fixed for the lifetime of the process.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum Intent {
    /// Sell the whole position in chunks.
    Close,
    /// Buy in chunks until the position is worth `target_usd`.
    Accumulate { target_usd: f64 },
    /// Band-follow: close above `sell_over`, buy back to `target_usd` under `buy_under`.
    MarketMake {
        buy_under: f64,
        sell_over: f64,
        target_usd: f64,
    },
    /// Read-only reporting. PnL is measured against `reference_price` when given.
    MonitorOnly { reference_price: Option<f64> },
}

impl Intent {
    /// Mode the controller runs while this intent is active
    pub fn mode(&self) -> Mode {
        match self {
            Intent::Close => Mode::Close,
            Intent::Accumulate { .. } => Mode::Accumulate,
            Intent::MarketMake { .. } => Mode::MarketMake,
            Intent::MonitorOnly { .. } => Mode::MonitorOnly,
        }
    }

    /// Close and Accumulate finish once the target is reached
    pub fn is_bounded(&self) -> bool {
        matches!(self, Intent::Close | Intent::Accumulate { .. })
    }
}

/// Controller state for a single tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    Close,
    Accumulate,
    MarketMake,
    MonitorOnly,
    Idle,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Mode::Close => "close",
            Mode::Accumulate => "accumulate",
            Mode::MarketMake => "market-make",
            Mode::MonitorOnly => "monitor",
            Mode::Idle => "idle",
        };
        f.write_str(name)
    }
}
