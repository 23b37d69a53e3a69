//! Core business logic for Docsift.
//!
//! # Modules
//!
//! - [`extract`] - Text extraction from `.docx`, `.xlsx` and `.pdf` documents
//! - [`scan`] - KPI definitions, text cleanup and sentence extraction
//! - [`package`] - Package processing over a remote document source
//!
//! # Package Workflow
//!
//! 1. **Load definitions**: compile the KPI patterns once per run
//! 2. **List**: enumerate the package folder, following continuation links
//! 3. **Download**: fetch each supported document in byte-range chunks
//! 4. **Scan**: extract text and confirm the first sentence per KPI
//! 5. **Report**: hand the confirmed findings to a sink
//!
//! # Example
//!
//! ```rust,no_run
//! use docsift::adapters::graph::GraphClient;
//! use docsift::config::load_config;
//! use docsift::core::package::{DocumentScanner, PackageProcessor};
//! use docsift::core::scan::load_definitions;
//! use docsift::domain::{RemoteItem, ShutdownSignal, WalkPath};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("docsift.toml")?;
//! let definitions = load_definitions(&config.kpi.definitions_path)?;
//! let client = Arc::new(GraphClient::from_config(&config)?);
//! let processor = PackageProcessor::new(
//!     client,
//!     DocumentScanner::from_config(&config)?,
//!     definitions,
//! );
//!
//! let package = RemoteItem::new("01ABCDEF", "Bridge Tender", true);
//! let outcome = processor
//!     .scan_package(&package, WalkPath::default(), &ShutdownSignal::never())
//!     .await?;
//! println!("Confirmed: {}", outcome.result.findings.len());
//! # Ok(())
//! # }
//! ```

pub mod extract;
pub mod package;
pub mod scan;
