//! Configuration Loader
//!
//! Loads and validates the static configuration: a TOML file layered with
//! `CHUNKBOT_<SECTION>__<KEY>` environment overrides. Read once at startup;
//! any problem here is fatal.

use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use crate::adapters::birdeye::BirdeyeConfig;
use crate::adapters::jupiter::JupiterConfig;
use crate::application::{ExecutorConfig, SchedulerConfig};
use crate::domain::Intent;

/// USDC mint on Solana mainnet
pub const USDC_MINT: &str = "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v";

/// Environment variable prefix for overrides
pub const ENV_PREFIX: &str = "CHUNKBOT";

/// Main configuration structure matching chunkbot.toml
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub asset: AssetSection,
    #[serde(default)]
    pub execution: ExecutionSection,
    #[serde(default)]
    pub market_maker: MarketMakerSection,
    #[serde(default)]
    pub monitor: MonitorSection,
    #[serde(default)]
    pub scheduler: SchedulerSection,
    #[serde(default)]
    pub birdeye: BirdeyeSection,
    #[serde(default)]
    pub jupiter: JupiterSection,
    #[serde(default)]
    pub solana: SolanaSection,
    #[serde(default)]
    pub logging: LoggingSection,
}

/// Traded asset
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AssetSection {
    /// Token mint address
    pub mint: String,
    /// Display symbol (for logging)
    pub symbol: String,
    /// Token decimals, used to convert sell notionals to base units
    pub decimals: u8,
    /// Quote currency mint (USDC)
    pub quote_mint: String,
    pub quote_decimals: u8,
}

impl Default for AssetSection {
    fn default() -> Self {
        Self {
            mint: String::new(),
            symbol: String::new(),
            decimals: 6,
            quote_mint: USDC_MINT.to_string(),
            quote_decimals: 6,
        }
    }
}

/// Chunked execution parameters
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ExecutionSection {
    /// Position size to hold in Accumulate / MarketMake (USD)
    pub target_usd: f64,
    /// Max notional of a single order (USD)
    pub max_order_usd: f64,
    /// Gap below which a goal counts as reached (USD)
    pub min_chunk_usd: f64,
    /// Slippage tolerance in basis points (199 = 1.99%)
    pub slippage_bps: u16,
    /// Priority fee per swap in lamports
    pub priority_fee_lamports: u64,
    /// Replicas sent per chunk
    pub orders_per_chunk: u32,
    /// Spacing between replicas in milliseconds
    pub replica_interval_ms: u64,
    /// Sleep between accepted chunks in seconds
    pub tx_interval_secs: u64,
    /// Sleep before retrying a failed chunk in seconds
    pub retry_backoff_secs: u64,
    /// Consecutive failed chunks tolerated before stalling
    pub max_retries: u32,
    /// Upper bound for one quote-build-sign-send attempt in seconds
    pub submit_timeout_secs: u64,
}

impl Default for ExecutionSection {
    fn default() -> Self {
        Self {
            target_usd: 5.0,
            max_order_usd: 1.0,
            min_chunk_usd: 0.15,
            slippage_bps: 199,
            priority_fee_lamports: 100_000,
            orders_per_chunk: 3,
            replica_interval_ms: 1000,
            tx_interval_secs: 30,
            retry_backoff_secs: 30,
            max_retries: 1,
            submit_timeout_secs: 60,
        }
    }
}

/// Band thresholds for market-make mode
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MarketMakerSection {
    /// Buy back to target when price is strictly under this
    pub buy_under: f64,
    /// Close the position when price is strictly over this
    pub sell_over: f64,
    /// Wait before acting on a buy signal in seconds
    pub entry_confirm_secs: u64,
}

impl Default for MarketMakerSection {
    fn default() -> Self {
        Self {
            buy_under: 0.0946,
            sell_over: 1.0,
            entry_confirm_secs: 10,
        }
    }
}

/// Monitor mode and advisory risk checks
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MonitorSection {
    /// Entry price for PnL reporting
    pub reference_price: Option<f64>,
    /// Trades per hour below which the token is flagged
    pub min_trades_last_hour: u64,
}

impl Default for MonitorSection {
    fn default() -> Self {
        Self {
            reference_price: None,
            min_trades_last_hour: crate::domain::DEFAULT_MIN_TRADES_LAST_HOUR,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SchedulerSection {
    /// Tick period in seconds
    pub cadence_secs: u64,
    /// Pause after a faulted tick in seconds
    pub fault_cooldown_secs: u64,
    /// Quiet period after a completed close in seconds
    pub close_cooldown_secs: u64,
}

impl Default for SchedulerSection {
    fn default() -> Self {
        Self {
            cadence_secs: 30,
            fault_cooldown_secs: 15,
            close_cooldown_secs: 600,
        }
    }
}

/// Birdeye market data configuration section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BirdeyeSection {
    pub api_url: String,
    /// API key (falls back to BIRDEYE_API_KEY)
    pub api_key: Option<String>,
    pub timeout_secs: u64,
}

impl Default for BirdeyeSection {
    fn default() -> Self {
        Self {
            api_url: "https://public-api.birdeye.so".to_string(),
            api_key: None,
            timeout_secs: 10,
        }
    }
}

impl BirdeyeSection {
    /// Get API key with environment variable fallback
    pub fn get_api_key(&self) -> Option<String> {
        non_empty(self.api_key.as_deref()).or_else(|| env_non_empty("BIRDEYE_API_KEY"))
    }
}

/// Jupiter API configuration section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct JupiterSection {
    /// Jupiter swap API base URL
    pub api_url: String,
    /// Optional API key for higher rate limits (get from jup.ag)
    pub api_key: Option<String>,
    /// Use dynamic compute unit limits
    pub dynamic_compute_units: bool,
    pub timeout_secs: u64,
}

impl Default for JupiterSection {
    fn default() -> Self {
        Self {
            api_url: "https://api.jup.ag/swap/v1".to_string(),
            api_key: None,
            dynamic_compute_units: true,
            timeout_secs: 30,
        }
    }
}

impl JupiterSection {
    /// Get API key with environment variable fallback
    /// Checks JUPITER_API_KEY env var if config value is empty/None
    pub fn get_api_key(&self) -> Option<String> {
        non_empty(self.api_key.as_deref()).or_else(|| env_non_empty("JUPITER_API_KEY"))
    }
}

/// Solana RPC configuration section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SolanaSection {
    /// RPC endpoint (use private RPC for production)
    pub rpc_url: String,
    /// Commitment level: "processed", "confirmed", "finalized"
    pub commitment: String,
    /// Wallet keypair path (NEVER commit this file!)
    pub keypair_path: String,
    /// Wallet whose balance is tracked. Defaults to the keypair's public key.
    pub wallet_address: Option<String>,
}

impl Default for SolanaSection {
    fn default() -> Self {
        Self {
            rpc_url: "https://api.mainnet-beta.solana.com".to_string(),
            commitment: "confirmed".to_string(),
            keypair_path: "~/.config/solana/id.json".to_string(),
            wallet_address: None,
        }
    }
}

impl SolanaSection {
    /// Get RPC URL with environment variable override
    /// Checks SOLANA_RPC_URL env var first, falls back to config value
    pub fn get_rpc_url(&self) -> String {
        env_non_empty("SOLANA_RPC_URL").unwrap_or_else(|| self.rpc_url.clone())
    }

    /// Get keypair path with environment variable override, `~` expanded
    pub fn get_keypair_path(&self) -> String {
        let raw = env_non_empty("SOLANA_KEYPAIR_PATH").unwrap_or_else(|| self.keypair_path.clone());
        shellexpand::tilde(&raw).into_owned()
    }

    /// Base58 private key from SOLANA_PRIVATE_KEY, if set
    pub fn private_key(&self) -> Option<String> {
        env_non_empty("SOLANA_PRIVATE_KEY")
    }
}

/// Logging configuration section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Log level: "trace", "debug", "info", "warn", "error"
    pub level: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self { level: "info".to_string() }
    }
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config file not found: {0}")]
    NotFound(String),
    #[error("Failed to load config: {0}")]
    Load(#[from] ::config::ConfigError),
    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Validation failed: {0}")]
    ValidationError(String),
}

/// Load configuration from a TOML file, apply `CHUNKBOT_*` overrides and validate
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(ConfigError::NotFound(path.display().to_string()));
    }

    let settings = ::config::Config::builder()
        .add_source(
            ::config::File::new(&path.to_string_lossy(), ::config::FileFormat::Toml).required(true),
        )
        .add_source(
            ::config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    let config: Config = settings.try_deserialize()?;
    config.validate()?;
    Ok(config)
}

impl Config {
    /// Parse and validate a TOML document (no environment overrides)
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate all configuration parameters
    pub fn validate(&self) -> Result<(), ConfigError> {
        // Validate asset
        if self.asset.mint.trim().is_empty() {
            return Err(ConfigError::ValidationError("asset.mint cannot be empty".to_string()));
        }

        if self.asset.quote_mint.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "asset.quote_mint cannot be empty".to_string(),
            ));
        }

        // Validate execution
        let exec = &self.execution;
        if !(exec.max_order_usd > 0.0) {
            return Err(ConfigError::ValidationError(format!(
                "max_order_usd must be > 0, got {}",
                exec.max_order_usd
            )));
        }

        if !(exec.min_chunk_usd > 0.0 && exec.min_chunk_usd <= exec.max_order_usd) {
            return Err(ConfigError::ValidationError(format!(
                "min_chunk_usd must be in (0, max_order_usd], got {}",
                exec.min_chunk_usd
            )));
        }

        if !(exec.target_usd >= 0.0) {
            return Err(ConfigError::ValidationError(format!(
                "target_usd must be >= 0, got {}",
                exec.target_usd
            )));
        }

        if exec.slippage_bps == 0 || exec.slippage_bps > 10_000 {
            return Err(ConfigError::ValidationError(format!(
                "slippage_bps must be 1-10000, got {}",
                exec.slippage_bps
            )));
        }

        if exec.submit_timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "submit_timeout_secs must be > 0".to_string(),
            ));
        }

        if exec.orders_per_chunk == 0 {
            return Err(ConfigError::ValidationError(
                "orders_per_chunk must be >= 1".to_string(),
            ));
        }

        // Validate market maker band
        let mm = &self.market_maker;
        if !(mm.buy_under > 0.0 && mm.buy_under < mm.sell_over) {
            return Err(ConfigError::ValidationError(format!(
                "market_maker band requires 0 < buy_under < sell_over, got {} / {}",
                mm.buy_under, mm.sell_over
            )));
        }

        if let Some(reference) = self.monitor.reference_price {
            if !(reference > 0.0) {
                return Err(ConfigError::ValidationError(format!(
                    "reference_price must be > 0, got {}",
                    reference
                )));
            }
        }

        if self.scheduler.cadence_secs == 0 {
            return Err(ConfigError::ValidationError(
                "cadence_secs must be > 0".to_string(),
            ));
        }

        // Validate endpoints
        if self.jupiter.api_url.is_empty() {
            return Err(ConfigError::ValidationError("jupiter.api_url cannot be empty".to_string()));
        }

        if self.birdeye.api_url.is_empty() {
            return Err(ConfigError::ValidationError("birdeye.api_url cannot be empty".to_string()));
        }

        if self.jupiter.timeout_secs == 0 {
            return Err(ConfigError::ValidationError("jupiter.timeout_secs must be > 0".to_string()));
        }

        if self.birdeye.timeout_secs == 0 {
            return Err(ConfigError::ValidationError("birdeye.timeout_secs must be > 0".to_string()));
        }

        if self.solana.rpc_url.is_empty() {
            return Err(ConfigError::ValidationError("rpc_url cannot be empty".to_string()));
        }

        Ok(())
    }

    /// Operator intent for a CLI-selected mode. `target_usd` overrides the
    /// configured target for Accumulate and MarketMake.
    pub fn intent(&self, mode: crate::domain::Mode, target_usd: Option<f64>) -> Option<Intent> {
        use crate::domain::Mode;

        let target_usd = target_usd.unwrap_or(self.execution.target_usd);
        match mode {
            Mode::Close => Some(Intent::Close),
            Mode::Accumulate => Some(Intent::Accumulate { target_usd }),
            Mode::MarketMake => Some(Intent::MarketMake {
                buy_under: self.market_maker.buy_under,
                sell_over: self.market_maker.sell_over,
                target_usd,
            }),
            Mode::MonitorOnly => Some(Intent::MonitorOnly {
                reference_price: self.monitor.reference_price,
            }),
            Mode::Idle => None,
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty()).map(str::to_string)
}

fn env_non_empty(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

impl From<&Config> for ExecutorConfig {
    fn from(config: &Config) -> Self {
        let exec = &config.execution;
        ExecutorConfig {
            max_order_usd: exec.max_order_usd,
            min_chunk_usd: exec.min_chunk_usd,
            slippage_bps: exec.slippage_bps,
            priority_fee_lamports: exec.priority_fee_lamports,
            orders_per_chunk: exec.orders_per_chunk,
            replica_interval: Duration::from_millis(exec.replica_interval_ms),
            tx_interval: Duration::from_secs(exec.tx_interval_secs),
            retry_backoff: Duration::from_secs(exec.retry_backoff_secs),
            max_retries: exec.max_retries,
        }
    }
}

impl From<&Config> for SchedulerConfig {
    fn from(config: &Config) -> Self {
        SchedulerConfig {
            cadence: Duration::from_secs(config.scheduler.cadence_secs),
            fault_cooldown: Duration::from_secs(config.scheduler.fault_cooldown_secs),
            max_ticks: None,
        }
    }
}

impl From<&Config> for BirdeyeConfig {
    fn from(config: &Config) -> Self {
        BirdeyeConfig {
            base_url: config.birdeye.api_url.clone(),
            api_key: config.birdeye.get_api_key(),
            timeout: Duration::from_secs(config.birdeye.timeout_secs),
        }
    }
}

impl From<&Config> for JupiterConfig {
    fn from(config: &Config) -> Self {
        JupiterConfig {
            base_url: config.jupiter.api_url.clone(),
            api_key: config.jupiter.get_api_key(),
            timeout: Duration::from_secs(config.jupiter.timeout_secs),
            quote_mint: config.asset.quote_mint.clone(),
            quote_decimals: config.asset.quote_decimals,
            asset_decimals: config.asset.decimals,
            dynamic_compute_units: config.jupiter.dynamic_compute_units,
            submit_timeout: Duration::from_secs(config.execution.submit_timeout_secs),
        }
    }
}
