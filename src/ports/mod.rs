//! Ports Layer - Trait definitions for external dependencies
//!
//! This module defines the interfaces (ports) that adapters must implement.
//! Following hexagonal architecture, these traits abstract:
//! - Position and price reads
//! - Swap submission (quote, build, sign, broadcast)
//! - Token overview / risk statistics

pub mod market_data;
pub mod execution;
pub mod risk;
pub mod mocks;

pub use market_data::{MarketDataError, MarketDataPort};
pub use execution::{SubmissionError, SwapSubmitter, TransactionId};
pub use risk::{RiskError, RiskPort};
