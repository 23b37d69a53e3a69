//! Logging and observability
//!
//! Structured logging through `tracing`, with a console layer and an optional
//! rotating JSON file layer. The macros below keep field names consistent
//! across the transport, download and package-processing code.
//!
//! # Example
//!
//! ```no_run
//! use docsift::logging::init_logging;
//! use docsift::config::LoggingConfig;
//!
//! let config = LoggingConfig::default();
//! let _guard = init_logging("info", &config).expect("Failed to initialize logging");
//!
//! tracing::info!(package = "Bridge Tender", "Scanning package");
//! ```

pub mod structured;

pub use structured::{init_logging, LoggingGuard};

/// Log a retry attempt
///
/// # Example
///
/// ```no_run
/// use docsift::log_retry_attempt;
///
/// log_retry_attempt!(2, 5, 1500u64, "status=503");
/// ```
#[macro_export]
macro_rules! log_retry_attempt {
    ($attempt:expr, $max_attempts:expr, $delay_ms:expr, $reason:expr) => {
        tracing::warn!(
            attempt = $attempt,
            max_attempts = $max_attempts,
            delay_ms = $delay_ms,
            reason = %$reason,
            "Retrying request"
        );
    };
}

/// Log a document that was skipped because it could not be decoded
///
/// # Example
///
/// ```no_run
/// use docsift::log_document_skipped;
/// use docsift::domain::{DocsiftError, ExtractError};
///
/// let error = DocsiftError::Extract(ExtractError::MissingPart("word/document.xml".into()));
/// log_document_skipped!("01ABCD", "scope.docx", &error);
/// ```
#[macro_export]
macro_rules! log_document_skipped {
    ($item_id:expr, $name:expr, $error:expr) => {
        tracing::warn!(
            item_id = %$item_id,
            name = %$name,
            error = %$error,
            "Skipping document"
        );
    };
}

/// Log the completion of a package scan
///
/// # Example
///
/// ```no_run
/// use docsift::log_package_complete;
/// use std::time::Duration;
///
/// log_package_complete!("Bridge Tender", 12, 4, Duration::from_secs(9));
/// ```
#[macro_export]
macro_rules! log_package_complete {
    ($package:expr, $documents:expr, $found:expr, $duration:expr) => {
        tracing::info!(
            package = %$package,
            documents = $documents,
            kpis_found = $found,
            duration_ms = $duration.as_millis() as u64,
            "Package scan completed"
        );
    };
}
