//! CLI Adapter
//!
//! Command-line interface for chunkbot.
//! Uses clap derive macros for argument parsing.

mod commands;

pub use commands::{CliApp, Command, ModeArg, OverviewCmd, QuoteCmd, RunCmd, SideArg, StatusCmd};
