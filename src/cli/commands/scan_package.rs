//! Scan-package command implementation
//!
//! Scans one remote package folder, reports the confirmed findings as a JSON
//! line and optionally marks the package's status column.

use super::{EXIT_CONFIG, EXIT_FATAL, EXIT_OK, EXIT_PARTIAL};
use crate::adapters::graph::GraphClient;
use crate::adapters::sink::{JsonLinesSink, ReportSink};
use crate::config::load_config;
use crate::core::package::{DocumentScanner, PackageProcessor};
use crate::core::scan::load_definitions;
use crate::domain::{RemoteItem, ShutdownSignal, WalkPath};
use clap::Args;
use std::sync::Arc;

/// Arguments for the scan-package command
#[derive(Args, Debug)]
pub struct ScanPackageArgs {
    /// Identifier of the package folder
    pub item_id: String,

    /// Package name used in the report (defaults to the item identifier)
    #[arg(long)]
    pub name: Option<String>,

    /// Year folder the package was found under
    #[arg(long, default_value = "")]
    pub year: String,

    /// Business-unit folder the package was found under
    #[arg(long, default_value = "")]
    pub business_unit: String,

    /// Division folder the package was found under
    #[arg(long, default_value = "")]
    pub division: String,

    /// Append results to this file instead of standard output
    #[arg(short, long)]
    pub output: Option<String>,

    /// Set the package's ProcessStatus column once the result is reported
    #[arg(long, value_name = "STATUS")]
    pub mark_status: Option<String>,
}

impl ScanPackageArgs {
    fn package(&self) -> RemoteItem {
        let name = self.name.clone().unwrap_or_else(|| self.item_id.clone());
        RemoteItem::new(&self.item_id, name, true)
    }

    fn walk(&self) -> WalkPath {
        WalkPath {
            year: self.year.clone(),
            business_unit: self.business_unit.clone(),
            division: self.division.clone(),
        }
    }

    /// Execute the scan-package command
    pub async fn execute(&self, config_path: &str, signal: ShutdownSignal) -> anyhow::Result<i32> {
        tracing::info!(item_id = %self.item_id, "Starting scan-package command");

        let config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                tracing::error!(error = %e, "Failed to load configuration");
                eprintln!("{e}");
                return Ok(EXIT_CONFIG);
            }
        };

        let definitions = match load_definitions(&config.kpi.definitions_path) {
            Ok(d) => d,
            Err(e) => {
                tracing::error!(error = %e, "Failed to load KPI definitions");
                eprintln!("{e}");
                return Ok(EXIT_CONFIG);
            }
        };

        let client = match GraphClient::from_config(&config) {
            Ok(c) => Arc::new(c),
            Err(e) => {
                tracing::error!(error = %e, "Failed to create document-library client");
                eprintln!("{e}");
                return Ok(EXIT_CONFIG);
            }
        };

        let processor = PackageProcessor::new(
            client.clone(),
            DocumentScanner::from_config(&config)?,
            definitions,
        );

        let package = self.package();
        let outcome = match processor.scan_package(&package, self.walk(), &signal).await {
            Ok(o) => o,
            Err(e) if e.is_cancelled() => {
                tracing::warn!(item_id = %package.id, "Package scan cancelled");
                eprintln!("Scan cancelled");
                return Ok(EXIT_FATAL);
            }
            Err(e) => {
                tracing::error!(item_id = %package.id, error = %e, "Package scan failed");
                eprintln!("Package scan failed: {e}");
                return Ok(EXIT_FATAL);
            }
        };

        let sink: Box<dyn ReportSink> = match &self.output {
            Some(path) => Box::new(JsonLinesSink::open(path).await?),
            None => Box::new(JsonLinesSink::stdout()),
        };
        sink.submit(&outcome.result).await?;
        sink.flush().await?;

        let mut exit_code = if outcome.skipped > 0 {
            EXIT_PARTIAL
        } else {
            EXIT_OK
        };

        if let Some(status) = &self.mark_status {
            if let Err(e) = client
                .patch_process_status(&package.id, status, &signal)
                .await
            {
                tracing::warn!(item_id = %package.id, error = %e, "Failed to update process status");
                eprintln!("Failed to update process status: {e}");
                exit_code = EXIT_PARTIAL;
            }
        }

        eprintln!(
            "{}: {} documents scanned, {} skipped, {} KPIs confirmed",
            outcome.result.package_name,
            outcome.documents,
            outcome.skipped,
            outcome.result.findings.len()
        );
        Ok(exit_code)
    }
}
