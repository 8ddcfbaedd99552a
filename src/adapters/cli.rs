//! CLI definition
//!
//! Command surface for the ranger binary. Handlers live in main.rs.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// DLMM Ranger - concentrated liquidity position manager for Meteora DLMM
#[derive(Parser, Debug)]
#[command(
    name = "dlmm-ranger",
    version = env!("CARGO_PKG_VERSION"),
    about = "Concentrated liquidity position manager for Meteora DLMM",
    long_about = "Scans DLMM pools, classifies market conditions, selects range \
                  strategies from an ordered rule table, and manages position \
                  lifecycle with take-profit, stop-loss, and daily loss limits."
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
    /// Start the scan and manage loop
    Run(RunCmd),

    /// Scan pools once and print the decisions without entering
    Scan(ScanCmd),

    /// Show active positions and today's realized pnl
    Status(StatusCmd),

    /// Close every active position immediately
    ExitAll(ExitAllCmd),
}

/// Start the engine loop
#[derive(Parser, Debug)]
pub struct RunCmd {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE", default_value = "config/ranger.toml")]
    pub config: PathBuf,

    /// Force simulated mode regardless of config (no funds move)
    #[arg(short, long)]
    pub paper: bool,
}

/// One-shot scan
#[derive(Parser, Debug)]
pub struct ScanCmd {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE", default_value = "config/ranger.toml")]
    pub config: PathBuf,

    /// Override the configured pool limit
    #[arg(short, long, value_name = "N")]
    pub limit: Option<usize>,
}

/// Show engine status
#[derive(Parser, Debug)]
pub struct StatusCmd {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE", default_value = "config/ranger.toml")]
    pub config: PathBuf,
}

/// Emergency exit from the command line
#[derive(Parser, Debug)]
pub struct ExitAllCmd {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE", default_value = "config/ranger.toml")]
    pub config: PathBuf,

    /// Reason recorded on every closed position
    #[arg(short, long, default_value = "manual")]
    pub reason: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_run() {
        let app = CliApp::parse_from(["dlmm-ranger", "run", "--paper", "-v"]);
        assert!(app.verbose);
        match app.command {
            Command::Run(cmd) => assert!(cmd.paper),
            _ => panic!("expected run command"),
        }
    }

    #[test]
    fn test_cli_parses_scan_with_limit() {
        let app = CliApp::parse_from(["dlmm-ranger", "scan", "--limit", "10"]);
        match app.command {
            Command::Scan(cmd) => assert_eq!(cmd.limit, Some(10)),
            _ => panic!("expected scan command"),
        }
    }

    #[test]
    fn test_cli_exit_all_default_reason() {
        let app = CliApp::parse_from(["dlmm-ranger", "exit-all"]);
        match app.command {
            Command::ExitAll(cmd) => assert_eq!(cmd.reason, "manual"),
            _ => panic!("expected exit-all command"),
        }
    }
}
