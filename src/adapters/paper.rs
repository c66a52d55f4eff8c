//! Paper Venue
//!
//! Dry-run adapter: prices and the starting position come from the real market
//! data provider, orders never leave the process. Each accepted order moves a
//! simulated position delta at the order's reference price, so bounded modes
//! still converge.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rand::Rng;

use crate::domain::{short_mint, Direction, OrderAttempt};
use crate::ports::{MarketDataError, MarketDataPort, SubmissionError, SwapSubmitter, TransactionId};

pub struct PaperVenue {
    market: Arc<dyn MarketDataPort>,
    /// Simulated quantity change since start, in token units
    delta: Mutex<f64>,
}

impl PaperVenue {
    pub fn new(market: Arc<dyn MarketDataPort>) -> Self {
        Self {
            market,
            delta: Mutex::new(0.0),
        }
    }

    /// Quantity bought (+) or sold (-) so far
    pub fn delta(&self) -> f64 {
        *self.delta.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn paper_signature() -> String {
    let mut rng = rand::thread_rng();
    let bytes: [u8; 32] = rng.gen();
    format!("paper-{}", bs58::encode(bytes).into_string())
}

#[async_trait]
impl MarketDataPort for PaperVenue {
    async fn get_position(&self, asset: &str) -> Result<f64, MarketDataError> {
        let real = self.market.get_position(asset).await?;
        Ok((real + self.delta()).max(0.0))
    }

    async fn get_price(&self, asset: &str) -> Result<f64, MarketDataError> {
        self.market.get_price(asset).await
    }
}

#[async_trait]
impl SwapSubmitter for PaperVenue {
    async fn submit(&self, order: &OrderAttempt) -> Result<TransactionId, SubmissionError> {
        if !(order.reference_price > 0.0) {
            return Err(SubmissionError::QuoteFailed(format!(
                "no usable price for {}",
                short_mint(&order.asset)
            )));
        }

        let quantity = order.asset_quantity();
        {
            let mut delta = self.delta.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            match order.direction {
                Direction::Buy => *delta += quantity,
                Direction::Sell => *delta -= quantity,
            }
        }

        let id = TransactionId(paper_signature());
        tracing::info!("[PAPER] {} -> {}", order, id);
        Ok(id)
    }
}
