// Docsift - KPI evidence scanner for document libraries
// Copyright (c) 2025 Docsift Contributors
// Licensed under the MIT License

//! # Docsift - KPI evidence scanner
//!
//! Docsift walks packages of business documents held in a remote document
//! library, downloads each supported document, extracts its text and records
//! the first sentence that matches each configured KPI definition.
//!
//! ## Overview
//!
//! This library provides:
//! - **Authentication** with a signed client assertion and cached bearer tokens
//! - **Transport** with bounded retries, exponential backoff and `Retry-After`
//! - **Pagination** over continuation links
//! - **Resumable downloads** in validated byte-range chunks
//! - **Extraction** of paragraphs (`.docx`), cells (`.xlsx`) and lines (`.pdf`)
//! - **Scanning** for KPI evidence sentences
//!
//! ## Architecture
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`core`] - Extraction, scanning and package processing
//! - [`adapters`] - Document-library client and reporting sinks
//! - [`domain`] - Core domain types and errors
//! - [`config`] - Configuration management
//! - [`logging`] - Structured logging
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use docsift::config::load_config;
//! use docsift::core::package::DocumentScanner;
//! use docsift::core::scan::load_definitions;
//! use docsift::domain::{FindingSet, RemoteItem, ShutdownSignal};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = load_config("docsift.toml")?;
//!     let definitions = load_definitions(&config.kpi.definitions_path)?;
//!     let scanner = DocumentScanner::from_config(&config)?;
//!
//!     let item = RemoteItem::new("local", "report.docx", false);
//!     let kind = scanner.kind_of(&item).ok_or("unsupported")?;
//!     let mut findings = FindingSet::new(&definitions);
//!     scanner
//!         .scan(kind, std::fs::File::open("report.docx")?, &mut findings, &ShutdownSignal::never())
//!         .await?;
//!
//!     for finding in findings.iter().filter(|f| f.found()) {
//!         println!("{}: {}", finding.definition().name, finding.sentence());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Error Handling
//!
//! All fallible library operations return [`domain::Result`], whose error type
//! [`domain::DocsiftError`] separates configuration, transport, download and
//! extraction failures. Only extraction failures are local to one document.

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod logging;
