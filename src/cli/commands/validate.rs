//! Validate config command implementation
//!
//! Loads the configuration file, the client credential and the KPI
//! definitions without making any network call.

use super::{EXIT_CONFIG, EXIT_OK};
use crate::adapters::graph::CertificateCredential;
use crate::config::{load_config, DocsiftConfig};
use crate::core::scan::load_definitions;
use clap::Args;

/// Arguments for the validate-config command
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Skip loading the certificate and private key
    #[arg(long)]
    pub skip_credentials: bool,
}

impl ValidateArgs {
    /// Execute the validate-config command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!(config_path = %config_path, "Validating configuration");

        println!("Validating configuration file: {config_path}");
        println!();

        let config = match load_config(config_path) {
            Ok(c) => {
                println!("✅ Configuration file loaded and valid");
                c
            }
            Err(e) => {
                println!("❌ Failed to load configuration file");
                println!("   Error: {e}");
                return Ok(EXIT_CONFIG);
            }
        };

        let thumbprint = if self.skip_credentials {
            None
        } else {
            match CertificateCredential::from_config(&config.graph) {
                Ok(credential) => {
                    println!("✅ Certificate and private key loaded");
                    Some(credential.thumbprint().to_string())
                }
                Err(e) => {
                    println!("❌ Failed to load client credential");
                    println!("   Error: {e}");
                    return Ok(EXIT_CONFIG);
                }
            }
        };

        let definitions = match load_definitions(&config.kpi.definitions_path) {
            Ok(d) => {
                println!("✅ KPI definitions loaded");
                d
            }
            Err(e) => {
                println!("❌ Failed to load KPI definitions");
                println!("   Error: {e}");
                return Ok(EXIT_CONFIG);
            }
        };

        println!();
        print_summary(&config, thumbprint.as_deref(), definitions.len());
        Ok(EXIT_OK)
    }
}

fn print_summary(config: &DocsiftConfig, thumbprint: Option<&str>, definitions: usize) {
    println!("Configuration Summary:");
    println!("  Log Level: {}", config.application.log_level);
    println!("  Scratch Dir: {}", config.application.scratch_dir().display());
    println!("  Token Endpoint: {}", config.graph.token_url());
    println!("  Base URL: {}", config.graph.base_url);
    println!("  Drive: {}", config.graph.drive_id);
    println!("  Site: {}", config.graph.site_id);
    if let Some(thumbprint) = thumbprint {
        println!("  Certificate Thumbprint: {thumbprint}");
    }
    println!("  Max Attempts: {}", config.graph.retry.max_attempts);
    println!("  Max Chunks: {}", config.download.max_chunks);
    println!(
        "  Spill Threshold: {} bytes",
        config.extraction.spill_threshold_bytes
    );
    println!("  Extensions: {:?}", config.extraction.extensions);
    println!("  KPI Definitions: {definitions}");
    println!();
}
