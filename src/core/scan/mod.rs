//! KPI scanning
//!
//! - [`definitions`] - loading and compiling the definitions file
//! - [`cleanup`] - text normalization rules
//! - [`scanner`] - sentence extraction and finding bookkeeping

pub mod cleanup;
pub mod definitions;
pub mod scanner;

pub use cleanup::CleanupRules;
pub use definitions::{load_definitions, parse_definitions};
pub use scanner::KpiScanner;
