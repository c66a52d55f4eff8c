//! Chunkbot - chunked position executor for Solana/Jupiter
//!
//! Closes, accumulates or band-trades one token in capped orders.

use anyhow::{bail, Context, Result};
use clap::Parser;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{fmt, EnvFilter};

use chunkbot::adapters::birdeye::{BirdeyeClient, BirdeyeConfig};
use chunkbot::adapters::cli::{CliApp, Command, OverviewCmd, QuoteCmd, RunCmd, StatusCmd};
use chunkbot::adapters::jupiter::{JupiterClient, JupiterConfig, JupiterSwapSubmitter};
use chunkbot::adapters::paper::PaperVenue;
use chunkbot::adapters::solana::{SolanaClient, WalletManager};
use chunkbot::application::{
    shutdown_channel, ChunkedExecutor, ControllerConfig, ExecutorConfig, ModeController, Scheduler,
    SchedulerConfig,
};
use chunkbot::config::{load_config, Config};
use chunkbot::domain::{short_mint, Direction, Mode, OrderAttempt};
use chunkbot::ports::{MarketDataPort, SwapSubmitter};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists (secrets go here, not in the config file)
    dotenvy::dotenv().ok();

    let app = CliApp::parse();

    match app.command {
        Command::Run(cmd) => run_command(cmd, app.verbose, app.debug).await,
        Command::Status(cmd) => status_command(cmd, app.verbose, app.debug).await,
        Command::Quote(cmd) => quote_command(cmd, app.verbose, app.debug).await,
        Command::Overview(cmd) => overview_command(cmd, app.verbose, app.debug).await,
    }
}

/// RUST_LOG wins, then --debug / --verbose, then `logging.level` from the config
fn init_logging(verbose: bool, debug: bool, config_level: &str) {
    let fallback = if debug {
        "debug"
    } else if verbose {
        "info"
    } else {
        config_level
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::try_new(fallback).unwrap_or_else(|_| EnvFilter::new("info")));

    fmt().with_env_filter(filter).with_target(false).init();
}

fn load(path: &Path, verbose: bool, debug: bool) -> Result<Config> {
    let config = load_config(path)
        .with_context(|| format!("Failed to load configuration from {}", path.display()))?;
    init_logging(verbose, debug, &config.logging.level);
    Ok(config)
}

/// Wallet that owns the tracked position
fn position_wallet(config: &Config, wallet: &WalletManager) -> String {
    config
        .solana
        .wallet_address
        .clone()
        .filter(|address| !address.trim().is_empty())
        .unwrap_or_else(|| wallet.public_key())
}

async fn run_command(cmd: RunCmd, verbose: bool, debug: bool) -> Result<()> {
    let config = load(&cmd.config, verbose, debug)?;
    tracing::info!("Starting chunkbot...");

    let mode = Mode::from(cmd.mode);
    let intent = config
        .intent(mode, cmd.target_usd)
        .context("No intent for the requested mode")?;

    let keypair_path = config.solana.get_keypair_path();
    let private_key = config.solana.private_key();
    let wallet = match load_wallet_with_context(&keypair_path, private_key.as_deref(), cmd.paper) {
        Ok(w) => w,
        Err(e) => {
            if cmd.paper {
                tracing::warn!("Wallet not found at '{}' - using random wallet for paper trading", keypair_path);
                tracing::warn!("To create a real wallet, run: solana-keygen new --outfile {}", keypair_path);
                WalletManager::new_random()
            } else {
                return Err(e);
            }
        }
    };

    let birdeye = Arc::new(
        BirdeyeClient::new(BirdeyeConfig::from(&config), position_wallet(&config, &wallet))
            .context("Failed to create Birdeye client")?,
    );

    let market: Arc<dyn MarketDataPort>;
    let submitter: Arc<dyn SwapSubmitter>;
    if cmd.paper {
        tracing::warn!("PAPER TRADING MODE - no real transactions");
        let venue = Arc::new(PaperVenue::new(birdeye.clone()));
        market = venue.clone();
        submitter = venue;
    } else {
        let jupiter = JupiterClient::new(JupiterConfig::from(&config))
            .context("Failed to create Jupiter client")?;
        let rpc = SolanaClient::new(config.solana.get_rpc_url(), &config.solana.commitment);
        market = birdeye.clone();
        submitter = Arc::new(JupiterSwapSubmitter::new(jupiter, rpc, wallet.clone()));
    }

    let (handle, signal) = shutdown_channel();
    let executor = ChunkedExecutor::new(ExecutorConfig::from(&config), market, submitter)
        .with_shutdown(signal.clone());

    let controller_config = ControllerConfig {
        close_cooldown: Duration::from_secs(config.scheduler.close_cooldown_secs),
        entry_confirm_delay: Duration::from_secs(config.market_maker.entry_confirm_secs),
        min_trades_last_hour: config.monitor.min_trades_last_hour,
        ..ControllerConfig::new(config.asset.mint.clone(), intent)
    };
    let controller = ModeController::new(controller_config, executor).with_risk(birdeye);

    tracing::info!(
        "{} ({}) mode={} wallet={}",
        config.asset.symbol,
        short_mint(&config.asset.mint),
        mode,
        wallet.public_key()
    );
    controller.advisory_check().await;

    let mut scheduler_config = SchedulerConfig::from(&config);
    if cmd.once {
        scheduler_config.max_ticks = Some(1);
    }
    let scheduler = Scheduler::new(scheduler_config, controller).with_shutdown(signal);

    // Setup Ctrl+C handler
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        tracing::info!("Shutdown signal received");
        handle.trigger();
    });

    let summary = scheduler.run().await;
    tracing::info!(
        "chunkbot stopped: {} ticks, {} errors, {} faults, {} orders accepted",
        summary.ticks,
        summary.errors,
        summary.faults,
        summary.orders_accepted
    );
    Ok(())
}

async fn status_command(cmd: StatusCmd, verbose: bool, debug: bool) -> Result<()> {
    let config = load(&cmd.config, verbose, debug)?;
    let rpc = SolanaClient::new(config.solana.get_rpc_url(), &config.solana.commitment);

    let keypair_path = config.solana.get_keypair_path();
    let private_key = config.solana.private_key();
    let wallet = load_wallet_with_context(&keypair_path, private_key.as_deref(), false)?;

    let balance = rpc
        .get_balance(&wallet.public_key())
        .await
        .context("Failed to get balance")?;

    let birdeye = BirdeyeClient::new(BirdeyeConfig::from(&config), position_wallet(&config, &wallet))
        .context("Failed to create Birdeye client")?;
    let quantity = birdeye
        .get_position(&config.asset.mint)
        .await
        .context("Failed to read position")?;
    let price = birdeye
        .get_price(&config.asset.mint)
        .await
        .context("Failed to read price")?;

    println!("Wallet: {}", wallet.public_key());
    println!("Balance: {} lamports ({:.4} SOL)", balance, balance as f64 / 1e9);
    println!(
        "Position: {:.6} {} @ ${:.6} = ${:.4}",
        quantity,
        config.asset.symbol,
        price,
        quantity * price
    );
    if let Some(reference) = config.monitor.reference_price {
        println!("PnL vs {:.6}: ${:+.4}", reference, quantity * (price - reference));
    }

    Ok(())
}

async fn quote_command(cmd: QuoteCmd, verbose: bool, debug: bool) -> Result<()> {
    let config = load(&cmd.config, verbose, debug)?;
    let notional_usd = cmd.usd.unwrap_or(config.execution.max_order_usd);
    if !(notional_usd > 0.0) {
        bail!("Order notional must be positive, got {}", notional_usd);
    }

    let wallet = WalletManager::new_random();
    let birdeye = BirdeyeClient::new(BirdeyeConfig::from(&config), wallet.public_key())
        .context("Failed to create Birdeye client")?;
    let reference_price = birdeye
        .get_price(&config.asset.mint)
        .await
        .context("Failed to read price")?;

    let jupiter = JupiterClient::new(JupiterConfig::from(&config))
        .context("Failed to create Jupiter client")?;
    let rpc = SolanaClient::new(config.solana.get_rpc_url(), &config.solana.commitment);
    let submitter = JupiterSwapSubmitter::new(jupiter, rpc, wallet);

    let direction = Direction::from(cmd.side);
    let order = OrderAttempt {
        direction,
        asset: config.asset.mint.clone(),
        notional_usd,
        slippage_bps: config.execution.slippage_bps,
        priority_fee_lamports: config.execution.priority_fee_lamports,
        reference_price,
    };

    let quote = submitter.quote(&order).await.context("Failed to get quote")?;

    let (in_decimals, out_decimals) = match direction {
        Direction::Buy => (config.asset.quote_decimals, config.asset.decimals),
        Direction::Sell => (config.asset.decimals, config.asset.quote_decimals),
    };
    let scale = |amount: u64, decimals: u8| amount as f64 / 10f64.powi(i32::from(decimals));

    println!("{} ${:.4} of {} @ ${:.6}", direction, notional_usd, config.asset.symbol, reference_price);
    println!(
        "  In: {:.6}  Out: {:.6}  Min out: {:.6}",
        scale(quote.input_amount(), in_decimals),
        scale(quote.output_amount(), out_decimals),
        scale(quote.min_output_amount(), out_decimals)
    );
    println!("  Price impact: {}%", quote.price_impact());
    println!("  Route: {}", quote.route_labels());

    Ok(())
}

async fn overview_command(cmd: OverviewCmd, verbose: bool, debug: bool) -> Result<()> {
    let config = load(&cmd.config, verbose, debug)?;
    let address = cmd.address.unwrap_or_else(|| config.asset.mint.clone());

    let birdeye = BirdeyeClient::new(BirdeyeConfig::from(&config), String::new())
        .context("Failed to create Birdeye client")?;
    let overview = birdeye
        .token_overview(&address)
        .await
        .context("Failed to fetch token overview")?;
    let assessment = overview.assess(config.monitor.min_trades_last_hour);

    println!("Token: {}", address);
    println!(
        "  Trades 1h: {} (buy {:.1}% / sell {:.1}%)",
        overview.trade_1h(),
        overview.buy_percentage(),
        overview.sell_percentage()
    );
    println!("  Unique wallets 24h: {}", overview.unique_wallets_24h);
    println!("  Volume 24h: ${:.2}", overview.volume_24h_usd);
    println!("  Liquidity: ${:.2}", overview.liquidity_usd);
    println!("  Watch: {}  Views 24h: {}", overview.watch, overview.view_24h);
    for (window, change) in &overview.price_changes {
        println!("  {}: {:+.2}%", window, change);
    }
    for link in &overview.links {
        println!("  Link: {:?}", link);
    }
    println!(
        "  Rug pull: {}  Minimum trades met: {}",
        if assessment.rug_pull { "YES" } else { "no" },
        if assessment.minimum_trades_met { "yes" } else { "NO" }
    );

    if cmd.security {
        let security = birdeye
            .token_security(&address)
            .await
            .context("Failed to fetch token security")?;
        println!("Security:\n{}", serde_json::to_string_pretty(&security)?);

        let creation = birdeye
            .token_creation_info(&address)
            .await
            .context("Failed to fetch token creation info")?;
        println!("Creation:\n{}", serde_json::to_string_pretty(&creation)?);
    }

    Ok(())
}

/// Load wallet with helpful error messages
fn load_wallet_with_context(
    keypair_path: &str,
    private_key: Option<&str>,
    is_paper_mode: bool,
) -> Result<WalletManager> {
    if private_key.is_some() {
        return WalletManager::load(keypair_path, private_key)
            .context("Failed to load wallet from SOLANA_PRIVATE_KEY");
    }

    let path = Path::new(keypair_path);

    if !path.exists() {
        let mode_hint = if is_paper_mode {
            "In paper mode, a random wallet will be used instead."
        } else {
            "A wallet is required for live trading."
        };

        bail!(
            "Wallet file not found: {}\n\n\
             {}\n\n\
             To create a new wallet, run:\n  \
             solana-keygen new --outfile {}\n\n\
             Or set 'solana.keypair_path' in your config / SOLANA_PRIVATE_KEY in .env",
            keypair_path,
            mode_hint,
            keypair_path
        );
    }

    WalletManager::from_file(keypair_path).map_err(|e| {
        anyhow::anyhow!(
            "Failed to load wallet from '{}': {}\n\n\
             The file exists but may be corrupted or in the wrong format.\n\
             Expected format: JSON array of bytes (e.g., [1,2,3,...])",
            keypair_path,
            e
        )
    })
}
