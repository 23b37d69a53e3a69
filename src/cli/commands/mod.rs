//! CLI command implementations
//!
//! Commands return process exit codes:
//!
//! - `0` success
//! - `2` configuration error
//! - `3` partial failure (documents skipped or status not updated)
//! - `5` fatal error or cancellation

pub mod init;
pub mod scan_file;
pub mod scan_package;
pub mod validate;

pub(crate) const EXIT_OK: i32 = 0;
pub(crate) const EXIT_CONFIG: i32 = 2;
pub(crate) const EXIT_PARTIAL: i32 = 3;
pub(crate) const EXIT_FATAL: i32 = 5;
