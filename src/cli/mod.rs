//! CLI interface and argument parsing
//!
//! This module provides the command-line interface for Docsift using clap.

pub mod commands;

use clap::{Parser, Subcommand};

/// Docsift - KPI evidence scanner for document libraries
#[derive(Parser, Debug)]
#[command(name = "docsift")]
#[command(version, about, long_about = None)]
#[command(author = "Docsift Contributors")]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "docsift.toml", env = "DOCSIFT_CONFIG")]
    pub config: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "DOCSIFT_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Download and scan every document of a remote package folder
    ScanPackage(commands::scan_package::ScanPackageArgs),

    /// Scan a local document
    ScanFile(commands::scan_file::ScanFileArgs),

    /// Validate configuration file, credentials and KPI definitions
    ValidateConfig(commands::validate::ValidateArgs),

    /// Initialize a new configuration file
    Init(commands::init::InitArgs),
}

impl Commands {
    /// Whether the command reads the configuration file
    pub fn uses_config(&self) -> bool {
        !matches!(self, Commands::Init(_))
    }
}
