//! Birdeye Adapter
//!
//! Market data (wallet position, spot price) and token overview statistics
//! from the Birdeye public API.

mod client;
mod types;

pub use client::{BirdeyeClient, BirdeyeConfig, BirdeyeError};
pub use types::{overview_from_value, BirdeyeResponse, PriceData, TokenBalanceData};
