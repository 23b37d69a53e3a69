//! KPI definition loading
//!
//! Definitions come from a JSON array:
//!
//! ```json
//! [
//!   {"name": "Lost time injuries", "category": "Safety", "regexps": ["(?i)lost[- ]time"]}
//! ]
//! ```
//!
//! `patterns` is accepted as an alias for `regexps`. Every pattern is compiled
//! up front; an empty file, an invalid regex or a definition without patterns
//! is a configuration error.

use crate::domain::{DocsiftError, KpiDefinition, Result};
use regex::Regex;
use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;

/// Record as it appears in the definitions file
#[derive(Debug, Deserialize)]
struct DefinitionRecord {
    name: String,
    #[serde(default)]
    category: String,
    #[serde(alias = "patterns")]
    regexps: Vec<String>,
}

/// Load and compile definitions from a JSON file
pub fn load_definitions(path: impl AsRef<Path>) -> Result<Vec<Arc<KpiDefinition>>> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| {
        DocsiftError::Configuration(format!(
            "Failed to read KPI definitions {}: {e}",
            path.display()
        ))
    })?;

    let definitions = parse_definitions(&content)?;
    tracing::info!(
        path = %path.display(),
        count = definitions.len(),
        "Loaded KPI definitions"
    );
    Ok(definitions)
}

/// Compile definitions from JSON text
pub fn parse_definitions(content: &str) -> Result<Vec<Arc<KpiDefinition>>> {
    let records: Vec<DefinitionRecord> = serde_json::from_str(content).map_err(|e| {
        DocsiftError::Configuration(format!("Failed to parse KPI definitions: {e}"))
    })?;

    if records.is_empty() {
        return Err(DocsiftError::Configuration(
            "KPI definitions file contains no definitions".to_string(),
        ));
    }

    records
        .into_iter()
        .map(|record| {
            if record.name.trim().is_empty() {
                return Err(DocsiftError::Configuration(
                    "KPI definition with empty name".to_string(),
                ));
            }
            if record.regexps.is_empty() {
                return Err(DocsiftError::Configuration(format!(
                    "KPI definition '{}' has no patterns",
                    record.name
                )));
            }

            let patterns = record
                .regexps
                .iter()
                .map(|p| {
                    Regex::new(p).map_err(|e| {
                        DocsiftError::Configuration(format!(
                            "Invalid regex in KPI definition '{}': {p}: {e}",
                            record.name
                        ))
                    })
                })
                .collect::<Result<Vec<_>>>()?;

            Ok(Arc::new(KpiDefinition::new(
                record.name,
                record.category,
                patterns,
            )))
        })
        .collect()
}
