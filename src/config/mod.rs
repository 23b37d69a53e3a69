//! Configuration management for Docsift.
//!
//! Docsift uses a TOML configuration file with support for:
//! - Environment variable substitution (`${VAR_NAME}`)
//! - `DOCSIFT_<SECTION>_<KEY>` environment overrides
//! - Default values for optional settings
//! - Validation before any network activity
//!
//! # Example Configuration
//!
//! ```toml
//! [application]
//! log_level = "info"
//!
//! [graph]
//! tenant_id = "${DOCSIFT_TENANT_ID}"
//! client_id = "${DOCSIFT_CLIENT_ID}"
//! drive_id = "b!4f1c..."
//! site_id = "contoso.sharepoint.com,1234,5678"
//! certificate_path = "/etc/docsift/client.crt"
//! private_key_path = "/etc/docsift/client.key"
//!
//! [graph.retry]
//! max_attempts = 5
//!
//! [extraction]
//! spill_threshold_bytes = 104857600
//!
//! [kpi]
//! definitions_path = "./kpiDefinitions.json"
//! ```
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use docsift::config::load_config;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("docsift.toml")?;
//! println!("Drive: {}", config.graph.drive_id);
//! # Ok(())
//! # }
//! ```

pub mod loader;
pub mod schema;
pub mod secret;

// Re-export commonly used types
pub use loader::load_config;
pub use schema::{
    ApplicationConfig, DocsiftConfig, DownloadConfig, ExtractionConfig, GraphConfig, KpiConfig,
    LoggingConfig, RetryConfig, DEFAULT_MAX_CHUNKS, DEFAULT_SPILL_THRESHOLD_BYTES,
};
pub use secret::{secret_string, SecretString, SecretValue};
