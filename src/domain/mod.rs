//! Domain models and types for Docsift.
//!
//! The domain layer provides:
//! - **Error types** ([`DocsiftError`], [`TransportError`], [`DownloadError`], [`ExtractError`])
//! - **Result type alias** ([`Result`])
//! - **Remote item snapshots** ([`RemoteItem`], [`PackageItem`], [`Page`])
//! - **KPI models** ([`KpiDefinition`], [`KpiFinding`], [`FindingSet`], [`PackageResult`])
//! - **Cancellation** ([`ShutdownSignal`])
//!
//! # Error Handling
//!
//! All fallible operations return [`Result<T, DocsiftError>`]:
//!
//! ```rust
//! use docsift::domain::{DocsiftError, Result};
//!
//! fn example() -> Result<()> {
//!     Err(DocsiftError::Configuration("graph.tenant_id cannot be empty".into()))
//! }
//! ```

pub mod errors;
pub mod items;
pub mod kpi;
pub mod result;
pub mod signal;

// Re-export commonly used types for convenience
pub use errors::{DocsiftError, DownloadError, ExtractError, TransportError};
pub use items::{ListItemFields, ListItemMetadata, PackageItem, Page, ProcessStatus, RemoteItem};
pub use kpi::{FindingSet, KpiDefinition, KpiFinding, PackageResult, WalkPath};
pub use result::Result;
pub use signal::ShutdownSignal;
