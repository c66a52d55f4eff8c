//! Execution Scenario Tests
//!
//! Drive the executor, mode controller and scheduler end to end against the
//! in-memory venue:
//! 1. Chunk sizing never exceeds the order cap
//! 2. Bounded runs terminate once within one minimal chunk of the goal
//! 3. Retry then stall on repeated submission failures
//! 4. Market-make band decisions
//! 5. Market data outages abort the tick before any order
//!
//! All tests are deterministic (no real network calls) and run with zero pacing.

use std::sync::Arc;
use std::time::Duration;

use approx::assert_relative_eq;
use tokio_test::{assert_err, assert_ok};

use chunkbot::adapters::paper::PaperVenue;
use chunkbot::application::{
    shutdown_channel, ChunkedExecutor, ControllerConfig, ControllerError, ExecutionOutcome,
    ExecutorConfig, ExecutorError, ModeController, Scheduler, SchedulerConfig, TickReport,
};
use chunkbot::domain::{Direction, Goal, Intent, Mode};
use chunkbot::ports::mocks::SimulatedVenue;
use chunkbot::ports::SubmissionError;

const MINT: &str = "9BB6NFEcjBCtnNLFko2FqVQBq8HHM13kCyYcdQbgpump";

// ============================================================================
// Test Fixtures
// ============================================================================

fn executor_config(max_order_usd: f64, min_chunk_usd: f64) -> ExecutorConfig {
    ExecutorConfig {
        max_order_usd,
        min_chunk_usd,
        orders_per_chunk: 1,
        replica_interval: Duration::ZERO,
        tx_interval: Duration::ZERO,
        retry_backoff: Duration::ZERO,
        max_retries: 1,
        ..ExecutorConfig::default()
    }
}

fn executor(venue: &SimulatedVenue, config: ExecutorConfig) -> ChunkedExecutor {
    ChunkedExecutor::new(config, Arc::new(venue.clone()), Arc::new(venue.clone()))
}

fn controller(venue: &SimulatedVenue, intent: Intent) -> ModeController {
    let config = ControllerConfig {
        close_cooldown: Duration::ZERO,
        entry_confirm_delay: Duration::ZERO,
        ..ControllerConfig::new(MINT, intent)
    };
    ModeController::new(config, executor(venue, executor_config(1.0, 0.1)))
}

fn network_error() -> SubmissionError {
    SubmissionError::NetworkError("connection reset".to_string())
}

// ============================================================================
// Chunk sizing
// ============================================================================

#[tokio::test]
async fn test_no_chunk_exceeds_order_cap() {
    for (quantity, price, target, cap) in [
        (0.0, 1.0, 5.0, 1.0),
        (0.0, 0.0946, 3.3, 0.7),
        (2.0, 0.5, 10.0, 2.5),
        (0.0, 1.0, 0.4, 1.0),
    ] {
        let venue = SimulatedVenue::new(quantity, price);
        let report = assert_ok!(executor(&venue, executor_config(cap, 0.05))
            .run(MINT, Goal::accumulate(target))
            .await);

        assert_eq!(report.outcome, ExecutionOutcome::Reached);
        for order in venue.submissions() {
            assert!(
                order.notional_usd <= cap + 1e-12,
                "order {} over cap {}",
                order.notional_usd,
                cap
            );
        }
    }
}

#[tokio::test]
async fn test_close_chunks_never_exceed_cap() {
    let venue = SimulatedVenue::new(40.0, 0.1);
    let report = assert_ok!(executor(&venue, executor_config(1.0, 0.1)).run(MINT, Goal::Close).await);

    assert_eq!(report.outcome, ExecutionOutcome::Reached);
    assert_eq!(venue.submissions().len(), 4);
    assert!(venue.submissions().iter().all(|o| o.direction == Direction::Sell));
    assert!(venue.submissions().iter().all(|o| o.notional_usd <= 1.0));
    assert_relative_eq!(venue.quantity(), 0.0, epsilon = 1e-9);
}

#[tokio::test]
async fn test_five_unit_target_takes_five_orders() {
    let venue = SimulatedVenue::new(0.0, 1.0);
    let report = assert_ok!(executor(&venue, executor_config(1.0, 0.1))
        .run(MINT, Goal::accumulate(5.0))
        .await);

    assert_eq!(report.outcome, ExecutionOutcome::Reached);
    assert_eq!(report.chunks_accepted, 5);
    assert_eq!(venue.accepted(), 5);
    assert!(venue.submissions().iter().all(|o| o.notional_usd == 1.0));
    assert_relative_eq!(venue.quantity(), 5.0);
}

#[tokio::test]
async fn test_terminates_within_minimal_chunk() {
    let venue = SimulatedVenue::new(4.95, 1.0);
    let report = assert_ok!(executor(&venue, executor_config(1.0, 0.1))
        .run(MINT, Goal::accumulate(5.0))
        .await);

    assert_eq!(report.outcome, ExecutionOutcome::Reached);
    assert!(venue.submissions().is_empty());
}

#[tokio::test]
async fn test_accumulate_at_target_is_idempotent() {
    let venue = SimulatedVenue::new(60.0, 0.1);
    let mut controller = controller(&venue, Intent::Accumulate { target_usd: 5.0 });

    for _ in 0..3 {
        let tick = assert_ok!(controller.tick().await);
        match tick {
            TickReport::Executed { mode, report } => {
                assert_eq!(mode, Mode::Accumulate);
                assert_eq!(report.outcome, ExecutionOutcome::Reached);
                assert_eq!(report.orders_accepted, 0);
            }
            other => panic!("Expected Executed, got {:?}", other),
        }
    }
    assert!(venue.submissions().is_empty());
}

// ============================================================================
// Retry and stall
// ============================================================================

#[tokio::test]
async fn test_single_failure_is_retried() {
    let venue = SimulatedVenue::new(0.0, 1.0).failing_with(&[network_error()]);
    let report = assert_ok!(executor(&venue, executor_config(1.0, 0.1))
        .run(MINT, Goal::accumulate(2.0))
        .await);

    assert_eq!(report.outcome, ExecutionOutcome::Reached);
    assert_eq!(report.retries, 1);
    assert_eq!(venue.submissions().len(), 3);
    assert_eq!(venue.accepted(), 2);
}

#[tokio::test]
async fn test_two_consecutive_failures_stall() {
    let venue = SimulatedVenue::new(0.0, 1.0).failing_with(&[
        network_error(),
        SubmissionError::RejectedByVenue("blockhash not found".to_string()),
    ]);
    let err = assert_err!(executor(&venue, executor_config(1.0, 0.1))
        .run(MINT, Goal::accumulate(5.0))
        .await);

    match err {
        ExecutorError::Stalled { direction, attempted_usd, attempts, source } => {
            assert_eq!(direction, Direction::Buy);
            assert_eq!(attempted_usd, 1.0);
            assert_eq!(attempts, 2);
            assert!(matches!(source, SubmissionError::RejectedByVenue(_)));
        }
        other => panic!("Expected Stalled, got {:?}", other),
    }
    // No further attempt after the stall
    assert_eq!(venue.submissions().len(), 2);
    assert_eq!(venue.accepted(), 0);
}

#[tokio::test]
async fn test_stall_does_not_stop_scheduler() {
    let venue = SimulatedVenue::new(0.0, 1.0)
        .failing_with(&[network_error(), network_error(), network_error(), network_error()]);
    let controller = controller(&venue, Intent::Accumulate { target_usd: 2.0 });
    let scheduler = Scheduler::new(
        SchedulerConfig {
            cadence: Duration::ZERO,
            fault_cooldown: Duration::ZERO,
            max_ticks: Some(3),
        },
        controller,
    );

    let summary = scheduler.run().await;

    assert_eq!(summary.ticks, 3);
    assert_eq!(summary.errors, 2);
    assert_eq!(summary.orders_accepted, 2);
    assert_relative_eq!(venue.quantity(), 2.0);
}

#[tokio::test]
async fn test_replicas_share_chunk_size() {
    let venue = SimulatedVenue::new(0.0, 1.0);
    let config = ExecutorConfig {
        orders_per_chunk: 3,
        ..executor_config(1.0, 0.1)
    };
    let report = assert_ok!(executor(&venue, config).run(MINT, Goal::accumulate(1.0)).await);

    // Replicas are not checked one by one, so every one of them fills
    assert_eq!(report.outcome, ExecutionOutcome::Reached);
    assert_eq!(report.chunks_accepted, 1);
    assert_eq!(report.orders_accepted, 3);
    assert_eq!(venue.submissions().len(), 3);
    assert!(venue.submissions().iter().all(|o| o.notional_usd == 1.0));
}

#[tokio::test]
async fn test_cancelled_run_places_no_order() {
    let venue = SimulatedVenue::new(0.0, 1.0);
    let (handle, signal) = shutdown_channel();
    let executor = executor(&venue, executor_config(1.0, 0.1)).with_shutdown(signal);

    handle.trigger();
    let report = assert_ok!(executor.run(MINT, Goal::accumulate(5.0)).await);

    assert_eq!(report.outcome, ExecutionOutcome::Cancelled);
    assert!(report.last_snapshot.is_none());
    assert!(venue.submissions().is_empty());
}

#[tokio::test]
async fn test_replica_batch_counts_once() {
    let venue = SimulatedVenue::new(0.0, 1.0).failing_with(&[network_error(), network_error()]);
    let config = ExecutorConfig {
        orders_per_chunk: 3,
        ..executor_config(1.0, 0.1)
    };
    let report = assert_ok!(executor(&venue, config).run(MINT, Goal::accumulate(1.0)).await);

    assert_eq!(report.outcome, ExecutionOutcome::Reached);
    assert_eq!(report.chunks_accepted, 1);
    assert_eq!(report.orders_accepted, 1);
    assert_eq!(report.retries, 0);
    assert!(venue.submissions().iter().all(|o| o.notional_usd == 1.0));
}

// ============================================================================
// Market-make band
// ============================================================================

#[tokio::test]
async fn test_sell_over_closes_regardless_of_buy_band() {
    let venue = SimulatedVenue::new(10.0, 1.2);
    let mut controller = controller(
        &venue,
        Intent::MarketMake { buy_under: 1.1, sell_over: 1.15, target_usd: 50.0 },
    );

    let tick = assert_ok!(controller.tick().await);

    assert!(matches!(tick, TickReport::Executed { mode: Mode::MarketMake, .. }));
    assert!(!venue.submissions().is_empty());
    assert!(venue.submissions().iter().all(|o| o.direction == Direction::Sell));
    assert_relative_eq!(venue.quantity(), 0.0, epsilon = 1e-9);
}

#[tokio::test]
async fn test_dead_band_issues_no_orders() {
    for price in [0.5, 0.7, 1.0] {
        let venue = SimulatedVenue::new(0.0, price);
        let mut controller = controller(
            &venue,
            Intent::MarketMake { buy_under: 0.5, sell_over: 1.0, target_usd: 5.0 },
        );

        let tick = assert_ok!(controller.tick().await);

        assert!(matches!(tick, TickReport::NoAction { .. }), "price {}", price);
        assert!(venue.submissions().is_empty(), "price {}", price);
    }
}

#[tokio::test]
async fn test_buy_under_stops_when_price_leaves_band() {
    // Controller read, two executor steps under the band, then the price recovers
    let venue = SimulatedVenue::new(0.0, 0.4).with_price_path(&[0.4, 0.4, 0.4, 0.6]);
    let mut controller = controller(
        &venue,
        Intent::MarketMake { buy_under: 0.5, sell_over: 1.0, target_usd: 5.0 },
    );

    let tick = assert_ok!(controller.tick().await);

    match tick {
        TickReport::Executed { report, .. } => {
            assert_eq!(report.outcome, ExecutionOutcome::PriceLimit);
            assert_eq!(report.orders_accepted, 2);
        }
        other => panic!("Expected Executed, got {:?}", other),
    }
    assert!(venue.submissions().iter().all(|o| o.direction == Direction::Buy));
}

// ============================================================================
// Data outages
// ============================================================================

#[tokio::test]
async fn test_outage_mid_tick_places_no_order() {
    // Position read succeeds, price read fails
    let venue = SimulatedVenue::new(0.0, 1.0).with_outage_after(1);
    let mut controller = controller(&venue, Intent::Accumulate { target_usd: 5.0 });

    let err = assert_err!(controller.tick().await);

    assert!(matches!(err, ControllerError::DataUnavailable { .. }));
    assert_eq!(err.mode(), Mode::Accumulate);
    assert!(err.to_string().contains(MINT));
    assert!(err.to_string().contains("accumulate"));
    assert!(venue.submissions().is_empty());
}

#[tokio::test]
async fn test_outage_after_progress_keeps_earlier_orders() {
    // Two full snapshots, then the provider goes away
    let venue = SimulatedVenue::new(0.0, 1.0).with_outage_after(4);
    let err = assert_err!(executor(&venue, executor_config(1.0, 0.1))
        .run(MINT, Goal::accumulate(5.0))
        .await);

    assert!(matches!(err, ExecutorError::DataUnavailable(_)));
    assert_eq!(venue.accepted(), 2);
    assert_eq!(venue.submissions().len(), 2);
}

// ============================================================================
// Controller lifecycle
// ============================================================================

#[tokio::test]
async fn test_close_cooldown_across_scheduler_ticks() {
    let venue = SimulatedVenue::new(20.0, 0.1);
    let config = ControllerConfig {
        close_cooldown: Duration::from_secs(600),
        entry_confirm_delay: Duration::ZERO,
        ..ControllerConfig::new(MINT, Intent::Close)
    };
    let controller = ModeController::new(config, executor(&venue, executor_config(1.0, 0.1)));
    let scheduler = Scheduler::new(
        SchedulerConfig {
            cadence: Duration::ZERO,
            fault_cooldown: Duration::ZERO,
            max_ticks: Some(4),
        },
        controller,
    );

    let summary = scheduler.run().await;

    assert_eq!(summary.ticks, 4);
    assert_eq!(summary.errors, 0);
    assert_eq!(summary.orders_accepted, 2);
    // Only the first tick touched the provider
    assert_eq!(venue.price_reads(), 3);
}

#[tokio::test]
async fn test_paper_venue_converges_without_real_orders() {
    let market = SimulatedVenue::new(0.0, 0.25);
    let paper = Arc::new(PaperVenue::new(Arc::new(market.clone())));
    let executor = ChunkedExecutor::new(executor_config(1.0, 0.1), paper.clone(), paper.clone());

    let report = assert_ok!(executor.run(MINT, Goal::accumulate(3.0)).await);

    assert_eq!(report.outcome, ExecutionOutcome::Reached);
    assert_eq!(report.orders_accepted, 3);
    assert_relative_eq!(paper.delta(), 12.0, epsilon = 1e-9);
    assert!(market.submissions().is_empty());
    assert_eq!(market.quantity(), 0.0);
}

#[tokio::test]
async fn test_shutdown_stops_market_maker_between_ticks() {
    let venue = SimulatedVenue::new(0.0, 0.7);
    let controller = controller(
        &venue,
        Intent::MarketMake { buy_under: 0.5, sell_over: 1.0, target_usd: 5.0 },
    );
    let (handle, signal) = shutdown_channel();
    let scheduler = Scheduler::new(
        SchedulerConfig {
            cadence: Duration::from_secs(3600),
            fault_cooldown: Duration::ZERO,
            max_ticks: None,
        },
        controller,
    )
    .with_shutdown(signal);

    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        handle.trigger();
    });

    let summary = tokio::time::timeout(Duration::from_secs(5), scheduler.run())
        .await
        .expect("scheduler did not stop");

    assert_eq!(summary.ticks, 1);
    assert_eq!(summary.orders_accepted, 0);
    assert!(venue.submissions().is_empty());
}
