//! External system integrations for Docsift.
//!
//! - [`graph`] - remote document library (tokens, retrying transport,
//!   pagination, resumable downloads)
//! - [`sink`] - reporting sink for package results
//!
//! # Design Pattern
//!
//! Adapters isolate external dependencies behind traits ([`graph::TokenSource`],
//! [`sink::ReportSink`]) so the processing core can be tested against mock
//! servers and in-memory writers.
//!
//! ```rust,no_run
//! use docsift::adapters::graph::GraphClient;
//! use docsift::config::load_config;
//! use docsift::domain::ShutdownSignal;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("docsift.toml")?;
//! let client = GraphClient::from_config(&config)?;
//! let items = client.list_root(&ShutdownSignal::never()).await?;
//! println!("{} items at the drive root", items.len());
//! # Ok(())
//! # }
//! ```

pub mod graph;
pub mod sink;
