//! Configuration loader with TOML parsing and environment variable overrides

use super::schema::DocsiftConfig;
use crate::domain::errors::DocsiftError;
use crate::domain::result::Result;
use regex::Regex;
use std::fs;
use std::path::Path;

/// Loads configuration from a TOML file
///
/// This function:
/// 1. Reads the TOML file
/// 2. Performs environment variable substitution (${VAR} syntax)
/// 3. Parses the TOML into DocsiftConfig
/// 4. Applies environment variable overrides (DOCSIFT_* prefix)
/// 5. Validates the configuration
///
/// # Errors
///
/// Returns [`DocsiftError::Configuration`] if the file cannot be read or
/// parsed, a referenced variable is unset, or validation fails.
///
/// # Examples
///
/// ```no_run
/// use docsift::config::loader::load_config;
///
/// let config = load_config("docsift.toml").expect("Failed to load config");
/// ```
pub fn load_config(path: impl AsRef<Path>) -> Result<DocsiftConfig> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(DocsiftError::Configuration(format!(
            "Configuration file not found: {}",
            path.display()
        )));
    }

    let contents = fs::read_to_string(path).map_err(|e| {
        DocsiftError::Configuration(format!(
            "Failed to read configuration file {}: {}",
            path.display(),
            e
        ))
    })?;

    let contents = substitute_env_vars(&contents)?;

    let mut config: DocsiftConfig = toml::from_str(&contents)
        .map_err(|e| DocsiftError::Configuration(format!("Failed to parse TOML: {}", e)))?;

    apply_env_overrides(&mut config);

    config.validate().map_err(|e| {
        DocsiftError::Configuration(format!("Configuration validation failed: {}", e))
    })?;

    Ok(config)
}

/// Substitutes environment variables in the format ${VAR_NAME}
///
/// Comment lines are copied untouched.
fn substitute_env_vars(input: &str) -> Result<String> {
    let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}")
        .map_err(|e| DocsiftError::Other(format!("Invalid substitution pattern: {e}")))?;
    let mut result = String::with_capacity(input.len());
    let mut missing_vars: Vec<String> = Vec::new();

    for line in input.lines() {
        if line.trim_start().starts_with('#') {
            result.push_str(line);
            result.push('\n');
            continue;
        }

        let processed = re.replace_all(line, |caps: &regex::Captures| {
            let var_name = &caps[1];
            match std::env::var(var_name) {
                Ok(value) => value,
                Err(_) => {
                    if !missing_vars.iter().any(|v| v == var_name) {
                        missing_vars.push(var_name.to_string());
                    }
                    caps[0].to_string()
                }
            }
        });
        result.push_str(&processed);
        result.push('\n');
    }

    if !missing_vars.is_empty() {
        return Err(DocsiftError::Configuration(format!(
            "Missing required environment variables: {}",
            missing_vars.join(", ")
        )));
    }

    Ok(result)
}

/// Applies environment variable overrides using DOCSIFT_* prefix
///
/// Environment variables follow the pattern: DOCSIFT_<SECTION>_<KEY>
/// For example: DOCSIFT_GRAPH_TENANT_ID, DOCSIFT_DOWNLOAD_MAX_CHUNKS
fn apply_env_overrides(config: &mut DocsiftConfig) {
    let var = |name: &str| std::env::var(name).ok();

    // Application overrides
    if let Some(val) = var("DOCSIFT_APPLICATION_LOG_LEVEL") {
        config.application.log_level = val;
    }
    if let Some(val) = var("DOCSIFT_APPLICATION_SCRATCH_DIR") {
        config.application.scratch_dir = Some(val);
    }

    // Graph overrides
    if let Some(val) = var("DOCSIFT_GRAPH_TENANT_ID") {
        config.graph.tenant_id = val;
    }
    if let Some(val) = var("DOCSIFT_GRAPH_CLIENT_ID") {
        config.graph.client_id = val;
    }
    if let Some(val) = var("DOCSIFT_GRAPH_DRIVE_ID") {
        config.graph.drive_id = val;
    }
    if let Some(val) = var("DOCSIFT_GRAPH_SITE_ID") {
        config.graph.site_id = val;
    }
    if let Some(val) = var("DOCSIFT_GRAPH_CERTIFICATE_PATH") {
        config.graph.certificate_path = val;
    }
    if let Some(val) = var("DOCSIFT_GRAPH_PRIVATE_KEY_PATH") {
        config.graph.private_key_path = val;
    }
    if let Some(val) = var("DOCSIFT_GRAPH_BASE_URL") {
        config.graph.base_url = val;
    }
    if let Some(val) = var("DOCSIFT_GRAPH_AUTHORITY_HOST") {
        config.graph.authority_host = val;
    }
    if let Some(Ok(attempts)) = var("DOCSIFT_GRAPH_RETRY_MAX_ATTEMPTS").map(|v| v.parse()) {
        config.graph.retry.max_attempts = attempts;
    }

    // Download overrides
    if let Some(Ok(chunks)) = var("DOCSIFT_DOWNLOAD_MAX_CHUNKS").map(|v| v.parse()) {
        config.download.max_chunks = chunks;
    }

    // Extraction overrides
    if let Some(Ok(bytes)) = var("DOCSIFT_EXTRACTION_SPILL_THRESHOLD_BYTES").map(|v| v.parse()) {
        config.extraction.spill_threshold_bytes = bytes;
    }
    if let Some(val) = var("DOCSIFT_EXTRACTION_PDF_CONVERTER") {
        config.extraction.pdf_converter = val;
    }

    // KPI overrides
    if let Some(val) = var("DOCSIFT_KPI_DEFINITIONS_PATH") {
        config.kpi.definitions_path = val;
    }

    // Logging overrides
    if let Some(val) = var("DOCSIFT_LOGGING_LOCAL_ENABLED") {
        config.logging.local_enabled = val.parse().unwrap_or(true);
    }
    if let Some(val) = var("DOCSIFT_LOGGING_LOCAL_PATH") {
        config.logging.local_path = val;
    }
}
