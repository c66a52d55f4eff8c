//! Chunked Order Executor
//!
//! Drives a position toward a goal in orders no larger than the per-order cap:
//! 1. Read position and price fresh
//! 2. Size the next chunk (or stop when the gap is below one minimal chunk)
//! 3. Submit the chunk, replicated `orders_per_chunk` times
//! 4. Pace, then go back to 1
//!
//! A failed batch is retried after a fixed backoff, re-reading state first.
//! After `max_retries` consecutive failures the run reports `Stalled` instead
//! of retrying forever.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use crate::domain::{
    plan_chunk, short_mint, Direction, Goal, MarketSnapshot, OrderAttempt, SizingLimits,
};
use crate::ports::{MarketDataError, MarketDataPort, SubmissionError, SwapSubmitter, TransactionId};

use super::shutdown::ShutdownSignal;

/// Executor tuning, built once from the static configuration
#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    /// Largest notional per order (USD)
    pub max_order_usd: f64,
    /// Gap below which the goal counts as reached (USD)
    pub min_chunk_usd: f64,
    pub slippage_bps: u16,
    pub priority_fee_lamports: u64,
    /// Identical orders sent per chunk to improve fill odds
    pub orders_per_chunk: u32,
    /// Spacing between replicas of one chunk
    pub replica_interval: Duration,
    /// Pause after an accepted chunk before re-reading the position
    pub tx_interval: Duration,
    /// Pause before retrying a failed chunk
    pub retry_backoff: Duration,
    /// Consecutive failed chunks tolerated before stalling
    pub max_retries: u32,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            max_order_usd: 1.0,
            min_chunk_usd: 0.15,
            slippage_bps: 199,
            priority_fee_lamports: 100_000,
            orders_per_chunk: 3,
            replica_interval: Duration::from_secs(1),
            tx_interval: Duration::from_secs(30),
            retry_backoff: Duration::from_secs(30),
            max_retries: 1,
        }
    }
}

impl ExecutorConfig {
    pub fn limits(&self) -> SizingLimits {
        SizingLimits {
            max_order_usd: self.max_order_usd,
            min_chunk_usd: self.min_chunk_usd,
        }
    }
}

#[derive(Debug, Error)]
pub enum ExecutorError {
    #[error("Market data unavailable: {0}")]
    DataUnavailable(#[from] MarketDataError),

    #[error("Stalled: {direction} ${attempted_usd:.4} failed {attempts} times in a row: {source}")]
    Stalled {
        direction: Direction,
        attempted_usd: f64,
        attempts: u32,
        #[source]
        source: SubmissionError,
    },
}

impl ExecutorError {
    /// Notional of the order in flight when the run failed, if any
    pub fn attempted_usd(&self) -> Option<f64> {
        match self {
            ExecutorError::DataUnavailable(_) => None,
            ExecutorError::Stalled { attempted_usd, .. } => Some(*attempted_usd),
        }
    }
}

/// How a run ended without error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionOutcome {
    /// Gap to the goal is smaller than one minimal chunk
    Reached,
    /// Accumulate run stopped because the price left the buy band
    PriceLimit,
    /// Shutdown requested between steps
    Cancelled,
}

/// Summary of one executor run
#[derive(Debug, Clone)]
pub struct ExecutionReport {
    pub outcome: ExecutionOutcome,
    /// Chunks with at least one accepted replica
    pub chunks_accepted: u32,
    /// Individual orders the venue accepted
    pub orders_accepted: u32,
    /// Failed chunks that were retried
    pub retries: u32,
    pub transactions: Vec<TransactionId>,
    /// Last snapshot read, absent when cancelled before the first read
    pub last_snapshot: Option<MarketSnapshot>,
}

impl ExecutionReport {
    fn new() -> Self {
        Self {
            outcome: ExecutionOutcome::Reached,
            chunks_accepted: 0,
            orders_accepted: 0,
            retries: 0,
            transactions: Vec::new(),
            last_snapshot: None,
        }
    }

    fn finish(mut self, outcome: ExecutionOutcome) -> Self {
        self.outcome = outcome;
        self
    }
}

/// Runs bounded goals against the market data provider and the swap venue
#[derive(Clone)]
pub struct ChunkedExecutor {
    config: ExecutorConfig,
    market: Arc<dyn MarketDataPort>,
    submitter: Arc<dyn SwapSubmitter>,
    shutdown: ShutdownSignal,
}

impl ChunkedExecutor {
    pub fn new(
        config: ExecutorConfig,
        market: Arc<dyn MarketDataPort>,
        submitter: Arc<dyn SwapSubmitter>,
    ) -> Self {
        Self {
            config,
            market,
            submitter,
            shutdown: ShutdownSignal::never(),
        }
    }

    /// Stop between steps once `shutdown` fires
    pub fn with_shutdown(mut self, shutdown: ShutdownSignal) -> Self {
        self.shutdown = shutdown;
        self
    }

    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    pub fn shutdown(&self) -> &ShutdownSignal {
        &self.shutdown
    }

    /// Read position then price for `asset`
    pub async fn snapshot(&self, asset: &str) -> Result<MarketSnapshot, MarketDataError> {
        let quantity = self.market.get_position(asset).await?;
        let price = self.market.get_price(asset).await?;
        Ok(MarketSnapshot::new(quantity, price))
    }

    /// Drive `asset` toward `goal` until reached, out of band, cancelled or stalled
    pub async fn run(&self, asset: &str, goal: Goal) -> Result<ExecutionReport, ExecutorError> {
        let limits = self.config.limits();
        let mut report = ExecutionReport::new();
        let mut consecutive_failures: u32 = 0;

        loop {
            if self.shutdown.is_triggered() {
                tracing::info!("{} run cancelled before next chunk", short_mint(asset));
                return Ok(report.finish(ExecutionOutcome::Cancelled));
            }

            let snapshot = self.snapshot(asset).await?;
            let plan = plan_chunk(&goal, &snapshot, &limits);
            report.last_snapshot = Some(snapshot.clone());

            let Some(plan) = plan else {
                tracing::info!(
                    "{} target reached: position {:.4} @ {:.8} = ${:.2} (target ${:.2})",
                    short_mint(asset),
                    snapshot.quantity,
                    snapshot.price,
                    snapshot.value_usd(),
                    goal.target_usd()
                );
                return Ok(report.finish(ExecutionOutcome::Reached));
            };

            if let Goal::Accumulate { price_limit: Some(limit), .. } = goal {
                if snapshot.price >= limit {
                    tracing::info!(
                        "{} price {:.8} no longer under {:.8}, stopping entry",
                        short_mint(asset),
                        snapshot.price,
                        limit
                    );
                    return Ok(report.finish(ExecutionOutcome::PriceLimit));
                }
            }

            let order = OrderAttempt {
                direction: plan.direction,
                asset: asset.to_string(),
                notional_usd: plan.notional_usd,
                slippage_bps: self.config.slippage_bps,
                priority_fee_lamports: self.config.priority_fee_lamports,
                reference_price: snapshot.price,
            };

            tracing::info!(
                "position: {:.4} price: {:.8} value: ${:.2} -> {}",
                snapshot.quantity,
                snapshot.price,
                snapshot.value_usd(),
                order
            );

            match self.submit_chunk(&order).await {
                Ok(ids) => {
                    consecutive_failures = 0;
                    report.chunks_accepted += 1;
                    report.orders_accepted += ids.len() as u32;
                    report.transactions.extend(ids);
                    self.shutdown.sleep(self.config.tx_interval).await;
                }
                Err(e) => {
                    consecutive_failures += 1;
                    if consecutive_failures > self.config.max_retries {
                        tracing::error!(
                            "{} {} ${:.4} failed {} times, stalling: {}",
                            short_mint(asset),
                            order.direction,
                            order.notional_usd,
                            consecutive_failures,
                            e
                        );
                        return Err(ExecutorError::Stalled {
                            direction: order.direction,
                            attempted_usd: order.notional_usd,
                            attempts: consecutive_failures,
                            source: e,
                        });
                    }

                    report.retries += 1;
                    tracing::warn!(
                        "{} {} ${:.4} failed ({}), retrying in {:?}",
                        short_mint(asset),
                        order.direction,
                        order.notional_usd,
                        e,
                        self.config.retry_backoff
                    );
                    self.shutdown.sleep(self.config.retry_backoff).await;
                }
            }
        }
    }

    /// Send every replica of one chunk. Replica outcomes are not checked one by one:
    /// the chunk counts as accepted when any replica got a transaction id.
    async fn submit_chunk(&self, order: &OrderAttempt) -> Result<Vec<TransactionId>, SubmissionError> {
        let replicas = self.config.orders_per_chunk.max(1);
        let mut accepted = Vec::new();
        let mut last_error = None;

        for i in 0..replicas {
            match self.submitter.submit(order).await {
                Ok(id) => {
                    tracing::info!(
                        "chunk {} submitted ({}/{}): {}",
                        order.direction,
                        i + 1,
                        replicas,
                        id.explorer_url()
                    );
                    accepted.push(id);
                }
                Err(e) => {
                    tracing::debug!("replica {}/{} failed: {}", i + 1, replicas, e);
                    last_error = Some(e);
                }
            }

            if i + 1 < replicas {
                tokio::time::sleep(self.config.replica_interval).await;
            }
        }

        match (accepted.is_empty(), last_error) {
            (false, _) => Ok(accepted),
            (true, Some(e)) => Err(e),
            (true, None) => Err(SubmissionError::RejectedByVenue("no replicas sent".to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::market_data::MockMarketDataPort;
    use crate::ports::execution::MockSwapSubmitter;
    use crate::ports::mocks::SimulatedVenue;
    use crate::application::shutdown::shutdown_channel;

    const MINT: &str = "9BB6NFEcjBCtnNLFko2FqVQBq8HHM13kCyYcdQbgpump";

    fn fast_config() -> ExecutorConfig {
        ExecutorConfig {
            max_order_usd: 1.0,
            min_chunk_usd: 0.1,
            slippage_bps: 199,
            priority_fee_lamports: 100_000,
            orders_per_chunk: 1,
            replica_interval: Duration::ZERO,
            tx_interval: Duration::ZERO,
            retry_backoff: Duration::ZERO,
            max_retries: 1,
        }
    }

    fn executor_on(venue: &SimulatedVenue, config: ExecutorConfig) -> ChunkedExecutor {
        ChunkedExecutor::new(config, Arc::new(venue.clone()), Arc::new(venue.clone()))
    }

    #[tokio::test]
    async fn test_accumulate_in_capped_chunks() {
        let venue = SimulatedVenue::new(0.0, 1.0);
        let executor = executor_on(&venue, fast_config());

        let report = executor.run(MINT, Goal::accumulate(5.0)).await.unwrap();

        assert_eq!(report.outcome, ExecutionOutcome::Reached);
        assert_eq!(report.chunks_accepted, 5);
        let submissions = venue.submissions();
        assert_eq!(submissions.len(), 5);
        assert!(submissions.iter().all(|o| o.notional_usd == 1.0 && o.direction == Direction::Buy));
        assert_eq!(venue.quantity(), 5.0);
    }

    #[tokio::test]
    async fn test_accumulate_at_target_submits_nothing() {
        let venue = SimulatedVenue::new(10.0, 1.0);
        let executor = executor_on(&venue, fast_config());

        let report = executor.run(MINT, Goal::accumulate(5.0)).await.unwrap();

        assert_eq!(report.outcome, ExecutionOutcome::Reached);
        assert!(venue.submissions().is_empty());
    }

    #[tokio::test]
    async fn test_close_sells_to_zero() {
        let venue = SimulatedVenue::new(10.0, 0.25);
        let executor = executor_on(&venue, fast_config());

        let report = executor.run(MINT, Goal::Close).await.unwrap();

        assert_eq!(report.outcome, ExecutionOutcome::Reached);
        // $2.50 position: 1.0 + 1.0 + 0.5
        let sizes: Vec<f64> = venue.submissions().iter().map(|o| o.notional_usd).collect();
        assert_eq!(sizes, vec![1.0, 1.0, 0.5]);
        assert!(venue.submissions().iter().all(|o| o.direction == Direction::Sell));
        assert!(venue.quantity() * 0.25 < 0.1);
    }

    #[tokio::test]
    async fn test_single_failure_is_retried() {
        let venue = SimulatedVenue::new(0.0, 1.0)
            .failing_with(&[SubmissionError::NetworkError("timeout".to_string())]);
        let executor = executor_on(&venue, fast_config());

        let report = executor.run(MINT, Goal::accumulate(2.0)).await.unwrap();

        assert_eq!(report.outcome, ExecutionOutcome::Reached);
        assert_eq!(report.retries, 1);
        assert_eq!(venue.submissions().len(), 3);
    }

    #[tokio::test]
    async fn test_two_failures_stall() {
        let venue = SimulatedVenue::new(0.0, 1.0).failing_with(&[
            SubmissionError::QuoteFailed("no route".to_string()),
            SubmissionError::RejectedByVenue("slippage".to_string()),
        ]);
        let executor = executor_on(&venue, fast_config());

        let err = executor.run(MINT, Goal::accumulate(2.0)).await.unwrap_err();

        match err {
            ExecutorError::Stalled { attempts, attempted_usd, source, .. } => {
                assert_eq!(attempts, 2);
                assert_eq!(attempted_usd, 1.0);
                assert!(matches!(source, SubmissionError::RejectedByVenue(_)));
            }
            other => panic!("expected stall, got {other:?}"),
        }
        assert_eq!(venue.submissions().len(), 2);
    }

    #[tokio::test]
    async fn test_replicas_share_chunk_size() {
        let venue = SimulatedVenue::new(0.0, 1.0).without_fills();
        let config = ExecutorConfig { orders_per_chunk: 3, ..fast_config() };
        let executor = executor_on(&venue, config);

        venue.fail_next(SubmissionError::NetworkError("x".to_string()));
        let order = OrderAttempt {
            direction: Direction::Buy,
            asset: MINT.to_string(),
            notional_usd: 0.7,
            slippage_bps: 199,
            priority_fee_lamports: 0,
            reference_price: 1.0,
        };
        let ids = executor.submit_chunk(&order).await.unwrap();

        // one replica failed, two accepted
        assert_eq!(ids.len(), 2);
        let submissions = venue.submissions();
        assert_eq!(submissions.len(), 3);
        assert!(submissions.iter().all(|o| o.notional_usd == 0.7));
    }

    #[tokio::test]
    async fn test_all_replicas_failing_is_a_failed_chunk() {
        let venue = SimulatedVenue::new(0.0, 1.0);
        for _ in 0..6 {
            venue.fail_next(SubmissionError::NetworkError("down".to_string()));
        }
        let config = ExecutorConfig { orders_per_chunk: 3, ..fast_config() };
        let executor = executor_on(&venue, config);

        let err = executor.run(MINT, Goal::accumulate(3.0)).await.unwrap_err();
        assert!(matches!(err, ExecutorError::Stalled { attempts: 2, .. }));
        assert_eq!(venue.submissions().len(), 6);
    }

    #[tokio::test]
    async fn test_price_limit_stops_entry() {
        let venue = SimulatedVenue::new(0.0, 0.5).with_price_path(&[0.5, 0.5, 0.6]);
        let executor = executor_on(&venue, fast_config());

        let goal = Goal::Accumulate { target_usd: 5.0, price_limit: Some(0.55) };
        let report = executor.run(MINT, goal).await.unwrap();

        assert_eq!(report.outcome, ExecutionOutcome::PriceLimit);
        assert_eq!(venue.submissions().len(), 2);
    }

    #[tokio::test]
    async fn test_data_unavailable_submits_nothing() {
        let mut market = MockMarketDataPort::new();
        market.expect_get_position().returning(|_| Ok(0.0));
        market
            .expect_get_price()
            .returning(|_| Err(MarketDataError::Timeout(Duration::from_secs(10))));
        let mut submitter = MockSwapSubmitter::new();
        submitter.expect_submit().never();

        let executor = ChunkedExecutor::new(fast_config(), Arc::new(market), Arc::new(submitter));
        let err = executor.run(MINT, Goal::accumulate(5.0)).await.unwrap_err();

        assert!(matches!(err, ExecutorError::DataUnavailable(MarketDataError::Timeout(_))));
        assert_eq!(err.attempted_usd(), None);
    }

    #[tokio::test]
    async fn test_cancelled_before_first_chunk() {
        let venue = SimulatedVenue::new(0.0, 1.0);
        let (handle, signal) = shutdown_channel();
        let executor = executor_on(&venue, fast_config()).with_shutdown(signal);

        handle.trigger();
        let report = executor.run(MINT, Goal::accumulate(5.0)).await.unwrap();

        assert_eq!(report.outcome, ExecutionOutcome::Cancelled);
        assert!(report.last_snapshot.is_none());
        assert!(venue.submissions().is_empty());
    }

    #[tokio::test]
    async fn test_snapshot_reads_fresh_each_step() {
        let venue = SimulatedVenue::new(0.0, 1.0);
        let executor = executor_on(&venue, fast_config());

        executor.run(MINT, Goal::accumulate(3.0)).await.unwrap();

        // three chunks plus the final read that finds the target reached
        assert_eq!(venue.position_reads(), 4);
        assert_eq!(venue.price_reads(), 4);
    }
}
