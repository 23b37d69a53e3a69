//! Domain error types
//!
//! This module defines the error hierarchy for Docsift. The taxonomy mirrors how
//! failures are handled by callers:
//!
//! - configuration errors abort before any network activity
//! - transport errors are retried by the executor and surface once exhausted
//! - download protocol violations are fatal for the download that hit them
//! - extraction errors only skip the document that produced them
//!
//! None of the variants expose third-party error types.

use thiserror::Error;

/// Main Docsift error type
#[derive(Debug, Error)]
pub enum DocsiftError {
    /// Configuration-related errors (credentials, keys, definitions)
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Token acquisition or token response errors
    #[error("Authentication error: {0}")]
    Authentication(String),

    /// Remote API transport errors
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// Resumable download errors
    #[error("Download error: {0}")]
    Download(#[from] DownloadError),

    /// Document decoding errors
    #[error("Extraction error: {0}")]
    Extract(#[from] ExtractError),

    /// The operation observed the cancellation signal
    #[error("Operation cancelled")]
    Cancelled,

    /// Error annotated with the remote item it belongs to
    #[error("Item {item_id} ({name}): {source}")]
    Item {
        item_id: String,
        name: String,
        #[source]
        source: Box<DocsiftError>,
    },

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// Generic errors with context
    #[error("{0}")]
    Other(String),
}

impl DocsiftError {
    /// Annotate an error with the remote item it was produced for
    pub fn for_item(self, item_id: impl Into<String>, name: impl Into<String>) -> Self {
        DocsiftError::Item {
            item_id: item_id.into(),
            name: name.into(),
            source: Box::new(self),
        }
    }

    /// Whether the error only affects the single document being decoded
    ///
    /// Package processing logs these and moves on to the next document.
    pub fn is_document_error(&self) -> bool {
        match self {
            DocsiftError::Extract(_) => true,
            DocsiftError::Item { source, .. } => source.is_document_error(),
            _ => false,
        }
    }

    /// Whether another attempt could succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            DocsiftError::Transport(
                TransportError::ConnectionFailed(_) | TransportError::ServerError { .. },
            ) => true,
            DocsiftError::Item { source, .. } => source.is_retryable(),
            _ => false,
        }
    }

    /// Whether the error came from the cancellation signal
    pub fn is_cancelled(&self) -> bool {
        match self {
            DocsiftError::Cancelled => true,
            DocsiftError::Item { source, .. } => source.is_cancelled(),
            _ => false,
        }
    }
}

/// Remote API transport errors
#[derive(Debug, Error)]
pub enum TransportError {
    /// Connection-level failure (DNS, TLS, reset, timeout)
    #[error("Failed to reach server: {0}")]
    ConnectionFailed(String),

    /// Could not assemble the request
    #[error("Failed to build request: {0}")]
    InvalidRequest(String),

    /// Non-retryable 4xx response
    #[error("Client error: {status} - {body}")]
    ClientError { status: u16, body: String },

    /// 429 or 5xx response
    #[error("Server error: {status}")]
    ServerError { status: u16 },

    /// Response body could not be decoded into the expected shape
    #[error("Invalid response from server: {0}")]
    InvalidResponse(String),

    /// Retry budget exhausted
    #[error("Giving up after {attempts} attempts: {last_error}")]
    RetriesExhausted { attempts: u32, last_error: String },
}

/// Resumable download errors
///
/// Everything except `RetriesExhausted` is a protocol violation or a hard
/// refusal, and is never retried.
#[derive(Debug, Error)]
pub enum DownloadError {
    /// Server answered 200 to a ranged request after bytes were written
    #[error("Server ignored range request after {written} bytes")]
    RangeIgnored { written: u64 },

    /// 206 without a Content-Range header
    #[error("206 response missing Content-Range")]
    MissingContentRange,

    /// Content-Range present but unparseable or inconsistent
    #[error("Invalid Content-Range '{0}'")]
    InvalidContentRange(String),

    /// Chunk does not start where the previous one ended
    #[error("Unexpected Content-Range start: {actual}, expected: {expected}")]
    RangeStartMismatch { expected: u64, actual: u64 },

    /// Total size changed during the download
    #[error("Total size changed from {previous} to {current}")]
    TotalSizeChanged { previous: u64, current: u64 },

    /// Fewer (or more) bytes arrived than the range announced
    #[error("Copied {actual} bytes, expected {expected}")]
    TruncatedChunk { expected: u64, actual: u64 },

    /// No progress, or chunk ceiling reached
    #[error("Download stalled after {chunks} chunks")]
    Stalled { chunks: u32 },

    /// 401, 403 or 404
    #[error("Download refused with status {status}")]
    NotAccessible { status: u16 },

    /// 416 before the known total was reached
    #[error("Range not satisfiable at offset {written}")]
    RangeNotSatisfiable { written: u64 },

    /// Any other status code
    #[error("Unexpected status: {0}")]
    UnexpectedStatus(u16),

    /// Transient failures exceeded the retry budget
    #[error("Download failed after {attempts} retries: {last_error}")]
    RetriesExhausted { attempts: u32, last_error: String },
}

/// Document decoding errors
#[derive(Debug, Error)]
pub enum ExtractError {
    /// The container is not a readable ZIP archive
    #[error("Invalid container: {0}")]
    Archive(String),

    /// A required part is absent from the container
    #[error("Missing container part: {0}")]
    MissingPart(String),

    /// Malformed XML in a container part
    #[error("Malformed XML: {0}")]
    Xml(String),

    /// External converter failure
    #[error("Converter failed: {0}")]
    Converter(String),
}

// Conversion from std::io::Error
impl From<std::io::Error> for DocsiftError {
    fn from(err: std::io::Error) -> Self {
        DocsiftError::Io(err.to_string())
    }
}

// Conversion from serde_json::Error
impl From<serde_json::Error> for DocsiftError {
    fn from(err: serde_json::Error) -> Self {
        DocsiftError::Serialization(err.to_string())
    }
}

// Conversion from toml parse errors
impl From<toml::de::Error> for DocsiftError {
    fn from(err: toml::de::Error) -> Self {
        DocsiftError::Configuration(format!("TOML parse error: {err}"))
    }
}

impl From<zip::result::ZipError> for DocsiftError {
    fn from(err: zip::result::ZipError) -> Self {
        match err {
            zip::result::ZipError::Io(e) => DocsiftError::Io(e.to_string()),
            other => DocsiftError::Extract(ExtractError::Archive(other.to_string())),
        }
    }
}

impl From<quick_xml::Error> for DocsiftError {
    fn from(err: quick_xml::Error) -> Self {
        DocsiftError::Extract(ExtractError::Xml(err.to_string()))
    }
}
