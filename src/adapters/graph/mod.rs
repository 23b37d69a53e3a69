//! Remote document-library integration
//!
//! - [`auth`] - certificate-based client-credentials tokens
//! - [`transport`] - retrying request executor and backoff
//! - [`pagination`] - continuation-link listing
//! - [`download`] - resumable byte-range downloads
//! - [`client`] - endpoint facade used by package processing

pub mod auth;
pub mod client;
pub mod download;
pub mod pagination;
pub mod transport;

pub use auth::{AccessToken, CertificateCredential, StaticToken, TokenProvider, TokenSource};
pub use client::{http_client, GraphClient};
pub use download::{ChunkedDownloader, ContentRange};
pub use pagination::list_all;
pub use transport::{classify_status, Backoff, Disposition, RequestExecutor};
