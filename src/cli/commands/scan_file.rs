//! Scan-file command implementation
//!
//! Runs the KPI scan over a single local document. Useful for checking a
//! definitions file against known evidence without touching the remote
//! library.

use super::{EXIT_CONFIG, EXIT_FATAL, EXIT_OK, EXIT_PARTIAL};
use crate::adapters::sink::{JsonLinesSink, ReportSink};
use crate::config::load_config;
use crate::core::package::DocumentScanner;
use crate::core::scan::load_definitions;
use crate::domain::{FindingSet, PackageResult, RemoteItem, ShutdownSignal};
use chrono::Utc;
use clap::Args;
use std::path::PathBuf;

/// Arguments for the scan-file command
#[derive(Args, Debug)]
pub struct ScanFileArgs {
    /// Document to scan (.docx, .xlsx or .pdf)
    pub path: PathBuf,

    /// KPI definitions file (overrides kpi.definitions_path)
    #[arg(long)]
    pub definitions: Option<String>,

    /// Append results to this file instead of standard output
    #[arg(short, long)]
    pub output: Option<String>,
}

impl ScanFileArgs {
    fn item(&self) -> RemoteItem {
        let name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string());
        RemoteItem::new(self.path.display().to_string(), name, false)
    }

    /// Execute the scan-file command
    pub async fn execute(&self, config_path: &str, signal: ShutdownSignal) -> anyhow::Result<i32> {
        tracing::info!(path = %self.path.display(), "Starting scan-file command");

        let config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                tracing::error!(error = %e, "Failed to load configuration");
                eprintln!("{e}");
                return Ok(EXIT_CONFIG);
            }
        };

        let definitions_path = self
            .definitions
            .as_deref()
            .unwrap_or(&config.kpi.definitions_path);
        let definitions = match load_definitions(definitions_path) {
            Ok(d) => d,
            Err(e) => {
                tracing::error!(error = %e, "Failed to load KPI definitions");
                eprintln!("{e}");
                return Ok(EXIT_CONFIG);
            }
        };

        let documents = DocumentScanner::from_config(&config)?;
        let item = self.item();
        let Some(kind) = documents.kind_of(&item) else {
            eprintln!("Unsupported document type: {}", item.name);
            return Ok(EXIT_CONFIG);
        };

        let file = std::fs::File::open(&self.path)?;
        let mut findings = FindingSet::new(&definitions);
        let exit_code = match documents.scan(kind, file, &mut findings, &signal).await {
            Ok(units) => {
                tracing::info!(name = %item.name, units, "Scanned document");
                EXIT_OK
            }
            Err(e) if e.is_document_error() => {
                tracing::warn!(name = %item.name, error = %e, "Document could not be fully decoded");
                eprintln!("Document could not be fully decoded: {e}");
                EXIT_PARTIAL
            }
            Err(e) if e.is_cancelled() => {
                eprintln!("Scan cancelled");
                return Ok(EXIT_FATAL);
            }
            Err(e) => return Err(e.into()),
        };

        let result = PackageResult {
            package_name: item.name,
            date_parsed: Utc::now().date_naive(),
            year: String::new(),
            business_unit: String::new(),
            division: String::new(),
            findings: findings.into_found(),
        };

        let sink: Box<dyn ReportSink> = match &self.output {
            Some(path) => Box::new(JsonLinesSink::open(path).await?),
            None => Box::new(JsonLinesSink::stdout()),
        };
        sink.submit(&result).await?;
        sink.flush().await?;

        Ok(exit_code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_from_path() {
        let args = ScanFileArgs {
            path: PathBuf::from("/data/reports/Scope.DOCX"),
            definitions: None,
            output: None,
        };
        let item = args.item();
        assert_eq!(item.name, "Scope.DOCX");
        assert_eq!(item.extension(), ".docx");
        assert!(!item.is_folder);
    }
}
