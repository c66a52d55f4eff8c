//! Domain Layer - Core types for the chunked position executor
//!
//! Pure types and sizing logic with no I/O. All external interactions
//! happen through the ports layer.
//!
//! - `intent`: operator intent and controller modes
//! - `order`: directions, goals, chunk sizing and order attempts
//! - `snapshot`: fresh position/price reads, value and PnL
//! - `risk`: token overview statistics and the rug-pull flag

pub mod intent;
pub mod order;
pub mod snapshot;
pub mod risk;

pub use intent::{Intent, Mode};
pub use order::{plan_chunk, short_mint, ChunkPlan, Direction, Goal, OrderAttempt, SizingLimits};
pub use snapshot::MarketSnapshot;
pub use risk::{
    extract_links, RiskAssessment, SocialLink, TokenOverview, DEFAULT_MIN_TRADES_LAST_HOUR,
    RUG_PULL_PRICE_CHANGE_PCT,
};
