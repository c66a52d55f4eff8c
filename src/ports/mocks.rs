//! Test doubles for the port traits
//!
//! `SimulatedVenue` plays both the market data provider and the swap venue:
//! accepted orders fill immediately at the order's reference price, so the next
//! position read reflects them. Failures can be queued to exercise retry paths.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;

use super::execution::{SubmissionError, SwapSubmitter, TransactionId};
use super::market_data::{MarketDataError, MarketDataPort};
use crate::domain::{Direction, OrderAttempt};

#[derive(Debug)]
struct VenueState {
    quantity: f64,
    /// Upcoming prices; the last one repeats
    prices: VecDeque<f64>,
    /// Upcoming submission failures, consumed one per submit
    failures: VecDeque<SubmissionError>,
    /// Remaining successful market data reads before every read fails
    reads_before_outage: Option<usize>,
    /// When false, orders are accepted but never filled
    fill_orders: bool,
    submissions: Vec<OrderAttempt>,
    accepted: usize,
    price_reads: usize,
    position_reads: usize,
}

/// In-memory venue with instant fills
#[derive(Debug, Clone)]
pub struct SimulatedVenue {
    state: Arc<Mutex<VenueState>>,
}

impl SimulatedVenue {
    pub fn new(quantity: f64, price: f64) -> Self {
        Self {
            state: Arc::new(Mutex::new(VenueState {
                quantity,
                prices: VecDeque::from([price]),
                failures: VecDeque::new(),
                reads_before_outage: None,
                fill_orders: true,
                submissions: Vec::new(),
                accepted: 0,
                price_reads: 0,
                position_reads: 0,
            })),
        }
    }

    /// Builder method: prices returned by successive `get_price` calls
    pub fn with_price_path(self, prices: &[f64]) -> Self {
        if !prices.is_empty() {
            self.state().prices = prices.iter().copied().collect();
        }
        self
    }

    /// Builder method: accept orders without ever filling them
    pub fn without_fills(self) -> Self {
        self.state().fill_orders = false;
        self
    }

    /// Builder method: the next submissions fail with these errors, in order
    pub fn failing_with(self, errors: &[SubmissionError]) -> Self {
        self.state().failures.extend(errors.iter().cloned());
        self
    }

    /// Builder method: allow `reads` market data calls, then fail every one
    pub fn with_outage_after(self, reads: usize) -> Self {
        self.state().reads_before_outage = Some(reads);
        self
    }

    /// Queue one more submission failure
    pub fn fail_next(&self, error: SubmissionError) {
        self.state().failures.push_back(error);
    }

    /// Move the price for all following reads
    pub fn set_price(&self, price: f64) {
        self.state().prices = VecDeque::from([price]);
    }

    /// Every order handed to `submit`, failed ones included
    pub fn submissions(&self) -> Vec<OrderAttempt> {
        self.state().submissions.clone()
    }

    pub fn accepted(&self) -> usize {
        self.state().accepted
    }

    pub fn quantity(&self) -> f64 {
        self.state().quantity
    }

    pub fn price_reads(&self) -> usize {
        self.state().price_reads
    }

    pub fn position_reads(&self) -> usize {
        self.state().position_reads
    }

    fn state(&self) -> MutexGuard<'_, VenueState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn consume_read(state: &mut VenueState, asset: &str) -> Result<(), MarketDataError> {
    match state.reads_before_outage {
        Some(0) => Err(MarketDataError::Http(format!("provider unavailable for {}", asset))),
        Some(ref mut left) => {
            *left -= 1;
            Ok(())
        }
        None => Ok(()),
    }
}

#[async_trait]
impl MarketDataPort for SimulatedVenue {
    async fn get_position(&self, asset: &str) -> Result<f64, MarketDataError> {
        let mut state = self.state();
        consume_read(&mut state, asset)?;
        state.position_reads += 1;
        Ok(state.quantity)
    }

    async fn get_price(&self, asset: &str) -> Result<f64, MarketDataError> {
        let mut state = self.state();
        consume_read(&mut state, asset)?;
        state.price_reads += 1;
        let price = if state.prices.len() > 1 {
            state.prices.pop_front()
        } else {
            state.prices.front().copied()
        };
        price.ok_or_else(|| MarketDataError::NoData(asset.to_string()))
    }
}

#[async_trait]
impl SwapSubmitter for SimulatedVenue {
    async fn submit(&self, order: &OrderAttempt) -> Result<TransactionId, SubmissionError> {
        let mut state = self.state();
        state.submissions.push(order.clone());

        if let Some(error) = state.failures.pop_front() {
            return Err(error);
        }

        if state.fill_orders {
            let filled = order.asset_quantity();
            state.quantity = match order.direction {
                Direction::Buy => state.quantity + filled,
                Direction::Sell => (state.quantity - filled).max(0.0),
            };
        }

        state.accepted += 1;
        Ok(TransactionId(format!("sim-{}", state.accepted)))
    }
}
