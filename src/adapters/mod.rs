//! Adapters Layer - External System Implementations
//!
//! This module contains implementations of the port traits:
//! - Birdeye: position, price and token overview reads
//! - Jupiter: quote and swap building, submitted through Solana
//! - Solana: RPC client and wallet management
//! - Paper: dry-run venue that never broadcasts
//! - CLI: Command-line argument definitions

pub mod birdeye;
pub mod jupiter;
pub mod solana;
pub mod paper;
pub mod cli;

pub use birdeye::BirdeyeClient;
pub use jupiter::{JupiterClient, JupiterSwapSubmitter};
pub use solana::{SolanaClient, WalletManager};
pub use paper::PaperVenue;
pub use cli::CliApp;
