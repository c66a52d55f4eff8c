//! Configuration Module
//!
//! Loads and validates configuration from TOML files with environment overrides.

pub mod loader;

pub use loader::{
    Config, ConfigError, load_config, AssetSection, ExecutionSection, MarketMakerSection,
    MonitorSection, SchedulerSection, BirdeyeSection, JupiterSection, SolanaSection,
    LoggingSection, USDC_MINT, ENV_PREFIX,
};
