//! Mode Controller
//!
//! Turns the operator intent into executor runs, one decision per scheduler tick.
//! Nothing carries over between ticks except the close cooldown; every decision
//! starts from a fresh position/price read.
//!
//! Market-make is band-following: above `sell_over` the whole position is
//! closed, under `buy_under` (and below target) it buys back up to target,
//! anywhere in between (ties included) it does nothing.

use std::sync::Arc;
use std::time::{Duration, Instant};

use thiserror::Error;

use crate::domain::{
    short_mint, Direction, Goal, Intent, MarketSnapshot, Mode, RiskAssessment,
    DEFAULT_MIN_TRADES_LAST_HOUR,
};
use crate::ports::{MarketDataError, RiskPort, SubmissionError};

use super::executor::{ChunkedExecutor, ExecutionOutcome, ExecutionReport, ExecutorError};

/// Static controller settings
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// Asset mint address
    pub asset: String,
    pub intent: Intent,
    /// Quiet period after a completed close
    pub close_cooldown: Duration,
    /// Wait before acting on a market-make buy signal
    pub entry_confirm_delay: Duration,
    /// Trades per hour below which the overview is flagged
    pub min_trades_last_hour: u64,
}

impl ControllerConfig {
    pub fn new(asset: impl Into<String>, intent: Intent) -> Self {
        Self {
            asset: asset.into(),
            intent,
            close_cooldown: Duration::from_secs(600),
            entry_confirm_delay: Duration::from_secs(10),
            min_trades_last_hour: DEFAULT_MIN_TRADES_LAST_HOUR,
        }
    }
}

/// Errors contained at the controller boundary. Each carries the asset, the
/// mode and, where an order was in flight, the attempted size.
#[derive(Debug, Error)]
pub enum ControllerError {
    #[error("[{mode}] {asset}: market data unavailable, no order placed: {source}")]
    DataUnavailable {
        asset: String,
        mode: Mode,
        #[source]
        source: MarketDataError,
    },

    #[error("[{mode}] {asset}: stalled on {direction} of ${attempted_usd:.4} after {attempts} attempts: {source}")]
    Stalled {
        asset: String,
        mode: Mode,
        direction: Direction,
        attempted_usd: f64,
        attempts: u32,
        #[source]
        source: SubmissionError,
    },
}

impl ControllerError {
    fn from_executor(err: ExecutorError, asset: &str, mode: Mode) -> Self {
        match err {
            ExecutorError::DataUnavailable(source) => ControllerError::DataUnavailable {
                asset: asset.to_string(),
                mode,
                source,
            },
            ExecutorError::Stalled { direction, attempted_usd, attempts, source } => {
                ControllerError::Stalled {
                    asset: asset.to_string(),
                    mode,
                    direction,
                    attempted_usd,
                    attempts,
                    source,
                }
            }
        }
    }

    pub fn mode(&self) -> Mode {
        match self {
            ControllerError::DataUnavailable { mode, .. } | ControllerError::Stalled { mode, .. } => *mode,
        }
    }
}

/// Read-only report for monitor mode
#[derive(Debug, Clone)]
pub struct MonitorReport {
    pub snapshot: MarketSnapshot,
    pub pnl_usd: Option<f64>,
    pub pnl_pct: Option<f64>,
    pub risk: Option<RiskAssessment>,
}

/// What one tick did
#[derive(Debug, Clone)]
pub enum TickReport {
    /// The executor ran toward a goal
    Executed { mode: Mode, report: ExecutionReport },
    /// Market-make price inside the band, or already at target
    NoAction { mode: Mode, snapshot: MarketSnapshot },
    /// Close finished recently; idle until the cooldown ends
    CoolingDown { remaining: Duration },
    Monitored(MonitorReport),
}

impl TickReport {
    /// Orders the venue accepted during this tick
    pub fn orders_accepted(&self) -> u32 {
        match self {
            TickReport::Executed { report, .. } => report.orders_accepted,
            _ => 0,
        }
    }
}

pub struct ModeController {
    config: ControllerConfig,
    executor: ChunkedExecutor,
    risk: Option<Arc<dyn RiskPort>>,
    cooldown_until: Option<Instant>,
}

impl ModeController {
    pub fn new(config: ControllerConfig, executor: ChunkedExecutor) -> Self {
        Self {
            config,
            executor,
            risk: None,
            cooldown_until: None,
        }
    }

    /// Attach an advisory overview provider
    pub fn with_risk(mut self, risk: Arc<dyn RiskPort>) -> Self {
        self.risk = Some(risk);
        self
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    /// Current state: the intent's mode, or `Idle` during the close cooldown
    pub fn mode(&self) -> Mode {
        if self.cooldown_remaining().is_some() {
            Mode::Idle
        } else {
            self.config.intent.mode()
        }
    }

    fn cooldown_remaining(&self) -> Option<Duration> {
        self.cooldown_until
            .map(|until| until.saturating_duration_since(Instant::now()))
            .filter(|remaining| !remaining.is_zero())
    }

    /// Run one decision for the configured intent
    pub async fn tick(&mut self) -> Result<TickReport, ControllerError> {
        if let Some(remaining) = self.cooldown_remaining() {
            tracing::debug!("close cooldown, {:?} left", remaining);
            return Ok(TickReport::CoolingDown { remaining });
        }
        self.cooldown_until = None;

        match self.config.intent {
            Intent::Close => self.close().await,
            Intent::Accumulate { target_usd } => self.accumulate(target_usd).await,
            Intent::MarketMake { buy_under, sell_over, target_usd } => {
                self.market_make(buy_under, sell_over, target_usd).await
            }
            Intent::MonitorOnly { reference_price } => self.monitor(reference_price).await,
        }
    }

    async fn close(&mut self) -> Result<TickReport, ControllerError> {
        let report = self.run(Mode::Close, Goal::Close).await?;

        if report.outcome == ExecutionOutcome::Reached && !self.config.close_cooldown.is_zero() {
            tracing::info!(
                "{} position closed, cooling down for {:?}",
                short_mint(&self.config.asset),
                self.config.close_cooldown
            );
            self.cooldown_until = Some(Instant::now() + self.config.close_cooldown);
        }

        Ok(TickReport::Executed { mode: Mode::Close, report })
    }

    async fn accumulate(&self, target_usd: f64) -> Result<TickReport, ControllerError> {
        let report = self.run(Mode::Accumulate, Goal::accumulate(target_usd)).await?;
        if report.outcome == ExecutionOutcome::Reached {
            tracing::info!(
                "{} position filled, total ${:.2}",
                short_mint(&self.config.asset),
                report.last_snapshot.as_ref().map(|s| s.value_usd()).unwrap_or_default()
            );
        }
        Ok(TickReport::Executed { mode: Mode::Accumulate, report })
    }

    async fn market_make(
        &self,
        buy_under: f64,
        sell_over: f64,
        target_usd: f64,
    ) -> Result<TickReport, ControllerError> {
        let mode = Mode::MarketMake;
        let asset = short_mint(&self.config.asset);
        let snapshot = self.snapshot(mode).await?;
        let value = snapshot.value_usd();

        // Sell check comes first
        if snapshot.price > sell_over {
            tracing::info!(
                "selling {} because price {:.8} is over {:.8}",
                asset, snapshot.price, sell_over
            );
            let report = self.run(mode, Goal::Close).await?;
            return Ok(TickReport::Executed { mode, report });
        }

        if snapshot.price < buy_under && value < target_usd {
            tracing::info!(
                "buying {} because price {:.8} is under {:.8} (position ${:.2} of ${:.2})",
                asset, snapshot.price, buy_under, value, target_usd
            );
            // run() sees the same signal and returns Cancelled without ordering
            if self.executor.shutdown().sleep(self.config.entry_confirm_delay).await {
                tracing::info!("{} entry confirmation interrupted by shutdown", asset);
            }
            let goal = Goal::Accumulate {
                target_usd,
                price_limit: Some(buy_under),
            };
            let report = self.run(mode, goal).await?;
            return Ok(TickReport::Executed { mode, report });
        }

        tracing::info!(
            "price is {:.8}, not buying or selling; position is ${:.2}, target ${:.2}",
            snapshot.price, value, target_usd
        );
        Ok(TickReport::NoAction { mode, snapshot })
    }

    async fn monitor(&self, reference_price: Option<f64>) -> Result<TickReport, ControllerError> {
        let snapshot = self.snapshot(Mode::MonitorOnly).await?;
        let pnl_usd = reference_price.map(|reference| snapshot.pnl(reference));
        let pnl_pct = reference_price.and_then(|reference| snapshot.pnl_pct(reference));

        match pnl_usd {
            Some(pnl) => tracing::info!(
                "{} position: {:.4} price: {:.8} value: ${:.2} pnl: ${:.4} ({:.2}%)",
                short_mint(&self.config.asset),
                snapshot.quantity,
                snapshot.price,
                snapshot.value_usd(),
                pnl,
                pnl_pct.unwrap_or_default()
            ),
            None => tracing::info!(
                "{} position: {:.4} price: {:.8} value: ${:.2}",
                short_mint(&self.config.asset),
                snapshot.quantity,
                snapshot.price,
                snapshot.value_usd()
            ),
        }

        let risk = self.advisory_check().await;
        Ok(TickReport::Monitored(MonitorReport { snapshot, pnl_usd, pnl_pct, risk }))
    }

    /// Fetch the token overview and log any flags. Failures are logged and ignored.
    pub async fn advisory_check(&self) -> Option<RiskAssessment> {
        let risk = self.risk.as_ref()?;
        match risk.token_overview(&self.config.asset).await {
            Ok(overview) => {
                let assessment = overview.assess(self.config.min_trades_last_hour);
                if assessment.rug_pull {
                    tracing::warn!(
                        "{} price change {:.1}% is below -80%, potential rug pull",
                        short_mint(&self.config.asset),
                        assessment.worst_price_change_pct.unwrap_or_default()
                    );
                }
                if !assessment.minimum_trades_met {
                    tracing::warn!(
                        "{} only {} trades in the last hour (minimum {})",
                        short_mint(&self.config.asset),
                        overview.trade_1h(),
                        self.config.min_trades_last_hour
                    );
                }
                Some(assessment)
            }
            Err(e) => {
                tracing::warn!("token overview unavailable: {}", e);
                None
            }
        }
    }

    async fn snapshot(&self, mode: Mode) -> Result<MarketSnapshot, ControllerError> {
        self.executor
            .snapshot(&self.config.asset)
            .await
            .map_err(|source| ControllerError::DataUnavailable {
                asset: self.config.asset.clone(),
                mode,
                source,
            })
    }

    async fn run(&self, mode: Mode, goal: Goal) -> Result<ExecutionReport, ControllerError> {
        self.executor
            .run(&self.config.asset, goal)
            .await
            .map_err(|e| ControllerError::from_executor(e, &self.config.asset, mode))
    }
}
