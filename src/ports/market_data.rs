use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

/// Market data error type. Every variant means the data is unavailable;
/// callers must never read a failure as a zero position or price.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MarketDataError {
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Malformed payload: {0}")]
    Malformed(String),

    #[error("No data for {0}")]
    NoData(String),
}

/// Position and price reads for a single asset.
///
/// Both calls go to the remote provider every time. Nothing is cached.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MarketDataPort: Send + Sync {
    /// Quantity of `asset` currently held, in token units
    async fn get_position(&self, asset: &str) -> Result<f64, MarketDataError>;

    /// Current unit price of `asset` in quote currency
    async fn get_price(&self, asset: &str) -> Result<f64, MarketDataError>;
}
