//! Jupiter Adapter
//!
//! Swap submission through the Jupiter aggregator: quote fetching, swap
//! building, then signing and broadcast through the Solana adapter.

mod client;
mod quote;
mod swap;
mod submitter;

pub use client::{JupiterClient, JupiterConfig, JupiterError};
pub use quote::{to_base_units, QuoteRequest, QuoteResponse, RoutePlanStep};
pub use swap::{SwapRequest, SwapResponse};
pub use submitter::JupiterSwapSubmitter;
