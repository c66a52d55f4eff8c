//! CLI Commands
//!
//! Argument definitions for the chunkbot binary. Handlers live in `main.rs`.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::domain::{Direction, Mode};

/// Chunkbot - chunked position executor for Solana/Jupiter
#[derive(Parser, Debug)]
#[command(
    name = "chunkbot",
    version = env!("CARGO_PKG_VERSION"),
    author = env!("CARGO_PKG_AUTHORS"),
    about = "Chunked position executor for Solana/Jupiter",
    long_about = "Chunkbot closes, accumulates or band-trades a single token position \
                  through Jupiter, splitting every move into capped orders so no single \
                  swap exceeds the configured size."
)]
pub struct CliApp {
    /// The command to execute
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start the scheduled controller loop
    Run(RunCmd),

    /// Show wallet balance and the tracked position
    Status(StatusCmd),

    /// Get a quote for one capped order
    Quote(QuoteCmd),

    /// Show token overview statistics and risk flags
    Overview(OverviewCmd),
}

/// Operating mode selected on the command line
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeArg {
    /// Sell the whole position in chunks
    Close,
    /// Buy up to the target value in chunks
    Accumulate,
    /// Close above sell_over, buy back to target under buy_under
    MarketMake,
    /// Report position value and PnL only
    Monitor,
}

impl From<ModeArg> for Mode {
    fn from(arg: ModeArg) -> Self {
        match arg {
            ModeArg::Close => Mode::Close,
            ModeArg::Accumulate => Mode::Accumulate,
            ModeArg::MarketMake => Mode::MarketMake,
            ModeArg::Monitor => Mode::MonitorOnly,
        }
    }
}

/// Order side for the quote command
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SideArg {
    Buy,
    Sell,
}

impl From<SideArg> for Direction {
    fn from(arg: SideArg) -> Self {
        match arg {
            SideArg::Buy => Direction::Buy,
            SideArg::Sell => Direction::Sell,
        }
    }
}

/// `--target-usd` accepts any finite value >= 0, matching `execution.target_usd`.
fn parse_target_usd(raw: &str) -> Result<f64, String> {
    let target: f64 = raw.parse().map_err(|e| format!("{}", e))?;
    if !(target >= 0.0) || !target.is_finite() {
        return Err(format!("must be a finite value >= 0, got {}", raw));
    }
    Ok(target)
}

/// Start the controller loop
#[derive(Parser, Debug)]
pub struct RunCmd {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE", default_value = "config/chunkbot.toml")]
    pub config: PathBuf,

    /// Operating mode
    #[arg(short, long, value_enum, default_value = "monitor")]
    pub mode: ModeArg,

    /// Override execution.target_usd for accumulate / market-make
    #[arg(long, value_name = "USD", value_parser = parse_target_usd)]
    pub target_usd: Option<f64>,

    /// Run in paper trading mode (no real transactions)
    #[arg(short, long)]
    pub paper: bool,

    /// Run a single tick and exit
    #[arg(long)]
    pub once: bool,
}

/// Show wallet status
#[derive(Parser, Debug)]
pub struct StatusCmd {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE", default_value = "config/chunkbot.toml")]
    pub config: PathBuf,
}

/// Quote a single order
#[derive(Parser, Debug)]
pub struct QuoteCmd {
    /// Order side
    #[arg(value_enum, value_name = "SIDE")]
    pub side: SideArg,

    /// Order notional in USD (defaults to execution.max_order_usd)
    #[arg(value_name = "USD")]
    pub usd: Option<f64>,

    /// Path to configuration file
    #[arg(short, long, value_name = "FILE", default_value = "config/chunkbot.toml")]
    pub config: PathBuf,
}

/// Token overview
#[derive(Parser, Debug)]
pub struct OverviewCmd {
    /// Token mint (defaults to asset.mint)
    #[arg(value_name = "MINT")]
    pub address: Option<String>,

    /// Also print the security report and creation record
    #[arg(long)]
    pub security: bool,

    /// Path to configuration file
    #[arg(short, long, value_name = "FILE", default_value = "config/chunkbot.toml")]
    pub config: PathBuf,
}
