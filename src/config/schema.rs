//! Configuration schema types
//!
//! This module defines the configuration structure for Docsift. Every section
//! validates itself and reports the first problem as a message; the loader
//! wraps that in [`crate::domain::DocsiftError::Configuration`].

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Payload size above which spreadsheet shared strings are spilled to disk (100 MiB)
pub const DEFAULT_SPILL_THRESHOLD_BYTES: u64 = 100 * 1024 * 1024;

/// Ceiling on byte-range chunks for a single download
pub const DEFAULT_MAX_CHUNKS: u32 = 10_000;

/// Main Docsift configuration
///
/// This is the root configuration structure that maps to the TOML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocsiftConfig {
    /// Application-level settings
    #[serde(default)]
    pub application: ApplicationConfig,

    /// Remote document library and identity provider
    pub graph: GraphConfig,

    /// Resumable download settings
    #[serde(default)]
    pub download: DownloadConfig,

    /// Document extraction settings
    #[serde(default)]
    pub extraction: ExtractionConfig,

    /// KPI definition source
    #[serde(default)]
    pub kpi: KpiConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl DocsiftConfig {
    /// Validates the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid
    pub fn validate(&self) -> Result<(), String> {
        self.application.validate()?;
        self.graph.validate()?;
        self.download.validate()?;
        self.extraction.validate()?;
        self.kpi.validate()?;
        self.logging.validate()?;
        Ok(())
    }
}

/// Application-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Directory for scratch files (defaults to the OS temp dir)
    #[serde(default)]
    pub scratch_dir: Option<String>,
}

impl ApplicationConfig {
    fn validate(&self) -> Result<(), String> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.log_level.as_str()) {
            return Err(format!(
                "Invalid log_level '{}'. Must be one of: {}",
                self.log_level,
                valid_levels.join(", ")
            ));
        }
        if let Some(dir) = &self.scratch_dir {
            if dir.is_empty() {
                return Err("application.scratch_dir cannot be empty when set".to_string());
            }
        }
        Ok(())
    }

    /// Directory scratch files are created in
    pub fn scratch_dir(&self) -> PathBuf {
        self.scratch_dir
            .as_ref()
            .map(PathBuf::from)
            .unwrap_or_else(std::env::temp_dir)
    }
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            scratch_dir: None,
        }
    }
}

/// Retry configuration shared by API calls and downloads
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of attempts per request
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Delay of the first backoff step in milliseconds
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,

    /// Upper bound of a single backoff step in milliseconds
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
}

impl RetryConfig {
    fn validate(&self) -> Result<(), String> {
        if self.max_attempts == 0 || self.max_attempts > 10 {
            return Err(format!(
                "graph.retry.max_attempts must be between 1 and 10, got {}",
                self.max_attempts
            ));
        }
        if self.base_delay_ms == 0 {
            return Err("graph.retry.base_delay_ms must be greater than 0".to_string());
        }
        if self.max_delay_ms < self.base_delay_ms {
            return Err(format!(
                "graph.retry.max_delay_ms ({}) must be >= base_delay_ms ({})",
                self.max_delay_ms, self.base_delay_ms
            ));
        }
        Ok(())
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
        }
    }
}

/// Remote document library and identity provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphConfig {
    /// Directory (tenant) identifier
    pub tenant_id: String,

    /// Application (client) identifier
    pub client_id: String,

    /// Drive holding the document library
    pub drive_id: String,

    /// Site owning the drive
    pub site_id: String,

    /// PEM certificate whose thumbprint identifies the signing key
    pub certificate_path: String,

    /// PEM RSA private key (PKCS#1 or PKCS#8)
    pub private_key_path: String,

    /// Identity provider host
    #[serde(default = "default_authority_host")]
    pub authority_host: String,

    /// Document-store API root
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Requested token scope
    #[serde(default = "default_scope")]
    pub scope: String,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,

    /// Refresh tokens this many seconds before they expire
    #[serde(default = "default_token_refresh_window_seconds")]
    pub token_refresh_window_seconds: u64,

    /// Retry configuration
    #[serde(default)]
    pub retry: RetryConfig,
}

impl GraphConfig {
    fn validate(&self) -> Result<(), String> {
        let required = [
            ("graph.tenant_id", &self.tenant_id),
            ("graph.client_id", &self.client_id),
            ("graph.drive_id", &self.drive_id),
            ("graph.site_id", &self.site_id),
            ("graph.certificate_path", &self.certificate_path),
            ("graph.private_key_path", &self.private_key_path),
        ];
        for (name, value) in required {
            if value.trim().is_empty() {
                return Err(format!("{name} cannot be empty"));
            }
        }

        for (name, value) in [
            ("graph.authority_host", &self.authority_host),
            ("graph.base_url", &self.base_url),
        ] {
            if !value.starts_with("http://") && !value.starts_with("https://") {
                return Err(format!("{name} must start with http:// or https://"));
            }
            url::Url::parse(value).map_err(|e| format!("{name} is not a valid URL: {e}"))?;
        }

        if self.timeout_seconds == 0 {
            return Err("graph.timeout_seconds must be greater than 0".to_string());
        }

        self.retry.validate()?;
        Ok(())
    }

    /// Token endpoint of the identity provider for this tenant
    pub fn token_url(&self) -> String {
        format!(
            "{}/{}/oauth2/v2.0/token",
            self.authority_host.trim_end_matches('/'),
            self.tenant_id
        )
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    pub fn refresh_window(&self) -> Duration {
        Duration::from_secs(self.token_refresh_window_seconds)
    }
}

/// Resumable download configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadConfig {
    /// Abort once this many chunks have been received
    #[serde(default = "default_max_chunks")]
    pub max_chunks: u32,
}

impl DownloadConfig {
    fn validate(&self) -> Result<(), String> {
        if self.max_chunks == 0 {
            return Err("download.max_chunks must be greater than 0".to_string());
        }
        Ok(())
    }
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            max_chunks: default_max_chunks(),
        }
    }
}

/// Document extraction configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionConfig {
    /// Workbooks larger than this spill shared strings to a scratch file
    #[serde(default = "default_spill_threshold_bytes")]
    pub spill_threshold_bytes: u64,

    /// External PDF-to-text converter executable
    #[serde(default = "default_pdf_converter")]
    pub pdf_converter: String,

    /// File extensions that are downloaded and scanned
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,
}

impl ExtractionConfig {
    fn validate(&self) -> Result<(), String> {
        if self.spill_threshold_bytes == 0 {
            return Err("extraction.spill_threshold_bytes must be greater than 0".to_string());
        }
        if self.pdf_converter.trim().is_empty() {
            return Err("extraction.pdf_converter cannot be empty".to_string());
        }
        let supported = [".docx", ".xlsx", ".pdf"];
        for ext in &self.extensions {
            if !supported.contains(&ext.to_lowercase().as_str()) {
                return Err(format!(
                    "Unsupported extraction extension '{}'. Must be one of: {}",
                    ext,
                    supported.join(", ")
                ));
            }
        }
        Ok(())
    }

    /// Whether documents with this extension are scanned
    pub fn accepts(&self, extension: &str) -> bool {
        self.extensions
            .iter()
            .any(|e| e.eq_ignore_ascii_case(extension))
    }
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            spill_threshold_bytes: default_spill_threshold_bytes(),
            pdf_converter: default_pdf_converter(),
            extensions: default_extensions(),
        }
    }
}

/// KPI definition source
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KpiConfig {
    /// JSON file with `{name, category, regexps}` records
    #[serde(default = "default_definitions_path")]
    pub definitions_path: String,
}

impl KpiConfig {
    fn validate(&self) -> Result<(), String> {
        if self.definitions_path.trim().is_empty() {
            return Err("kpi.definitions_path cannot be empty".to_string());
        }
        Ok(())
    }
}

impl Default for KpiConfig {
    fn default() -> Self {
        Self {
            definitions_path: default_definitions_path(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Enable local file logging
    #[serde(default = "default_true")]
    pub local_enabled: bool,

    /// Local log directory
    #[serde(default = "default_local_path")]
    pub local_path: String,

    /// Log rotation (daily, hourly)
    #[serde(default = "default_local_rotation")]
    pub local_rotation: String,
}

impl LoggingConfig {
    fn validate(&self) -> Result<(), String> {
        if self.local_enabled && self.local_path.is_empty() {
            return Err(
                "logging.local_path cannot be empty when local logging is enabled".to_string(),
            );
        }

        let valid_rotations = ["daily", "hourly"];
        if !valid_rotations.contains(&self.local_rotation.as_str()) {
            return Err(format!(
                "Invalid logging.local_rotation '{}'. Must be one of: {}",
                self.local_rotation,
                valid_rotations.join(", ")
            ));
        }

        Ok(())
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            local_enabled: true,
            local_path: default_local_path(),
            local_rotation: default_local_rotation(),
        }
    }
}

// Default value functions
fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

fn default_max_attempts() -> u32 {
    5
}

fn default_base_delay_ms() -> u64 {
    1_000
}

fn default_max_delay_ms() -> u64 {
    30_000
}

fn default_authority_host() -> String {
    "https://login.microsoftonline.com".to_string()
}

fn default_base_url() -> String {
    "https://graph.microsoft.com/v1.0".to_string()
}

fn default_scope() -> String {
    "https://graph.microsoft.com/.default".to_string()
}

fn default_timeout_seconds() -> u64 {
    300
}

fn default_token_refresh_window_seconds() -> u64 {
    300
}

fn default_max_chunks() -> u32 {
    DEFAULT_MAX_CHUNKS
}

fn default_spill_threshold_bytes() -> u64 {
    DEFAULT_SPILL_THRESHOLD_BYTES
}

fn default_pdf_converter() -> String {
    "pdftotext".to_string()
}

fn default_extensions() -> Vec<String> {
    vec![".docx".to_string(), ".xlsx".to_string(), ".pdf".to_string()]
}

fn default_definitions_path() -> String {
    "./kpiDefinitions.json".to_string()
}

fn default_local_path() -> String {
    "/var/log/docsift".to_string()
}

fn default_local_rotation() -> String {
    "daily".to_string()
}
