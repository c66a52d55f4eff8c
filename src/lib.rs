//! Chunkbot - chunked position execution on Solana via Jupiter
//!
//! Closes, accumulates or band-trades one token position without ever
//! sending a swap larger than the configured order cap.
//!
//! # Modules
//!
//! - `domain`: Intents, chunk sizing, snapshots, token risk flags
//! - `ports`: Trait abstractions (MarketDataPort, SwapSubmitter, RiskPort)
//! - `adapters`: External implementations (Birdeye, Jupiter, Solana, paper venue, CLI)
//! - `config`: Configuration loading and validation
//! - `application`: Chunked executor, mode controller, scheduler

pub mod domain;
pub mod ports;
pub mod adapters;
pub mod config;
pub mod application;
