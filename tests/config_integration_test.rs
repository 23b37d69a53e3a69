//! Integration tests for configuration loading and validation
//!
//! Tests that modify environment variables hold `ENV_MUTEX` so they do not
//! interfere with each other.

use docsift::config::load_config;
use docsift::domain::DocsiftError;
use std::io::Write;
use std::sync::Mutex;
use tempfile::NamedTempFile;

static ENV_MUTEX: Mutex<()> = Mutex::new(());

const OVERRIDES: &[&str] = &[
    "DOCSIFT_APPLICATION_LOG_LEVEL",
    "DOCSIFT_GRAPH_DRIVE_ID",
    "DOCSIFT_GRAPH_RETRY_MAX_ATTEMPTS",
    "DOCSIFT_DOWNLOAD_MAX_CHUNKS",
    "DOCSIFT_EXTRACTION_SPILL_THRESHOLD_BYTES",
    "DOCSIFT_KPI_DEFINITIONS_PATH",
    "DOCSIFT_TEST_TENANT",
    "DOCSIFT_TEST_CLIENT",
];

fn cleanup_env_vars() {
    for name in OVERRIDES {
        std::env::remove_var(name);
    }
}

fn write_config(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

const MINIMAL: &str = r#"
[graph]
tenant_id = "tenant"
client_id = "client"
drive_id = "drive"
site_id = "site"
certificate_path = "/etc/docsift/client.crt"
private_key_path = "/etc/docsift/client.key"
"#;

#[test]
fn test_load_complete_config() {
    let _lock = ENV_MUTEX.lock().unwrap();
    cleanup_env_vars();

    let file = write_config(
        r#"
[application]
log_level = "debug"
scratch_dir = "/var/tmp/docsift"

[graph]
tenant_id = "contoso"
client_id = "00000000-0000-0000-0000-000000000001"
drive_id = "b!drive"
site_id = "contoso.sharepoint.com,1,2"
certificate_path = "/etc/docsift/client.crt"
private_key_path = "/etc/docsift/client.key"
authority_host = "https://login.example.com"
base_url = "https://graph.example.com/v1.0"
scope = "https://graph.example.com/.default"
timeout_seconds = 60
token_refresh_window_seconds = 120

[graph.retry]
max_attempts = 4
base_delay_ms = 250
max_delay_ms = 8000

[download]
max_chunks = 500

[extraction]
spill_threshold_bytes = 1048576
pdf_converter = "/usr/local/bin/pdftotext"
extensions = [".docx", ".pdf"]

[kpi]
definitions_path = "/etc/docsift/kpiDefinitions.json"

[logging]
local_enabled = false
local_path = "/tmp/docsift"
local_rotation = "hourly"
"#,
    );

    let config = load_config(file.path()).expect("Failed to load config");

    assert_eq!(config.application.log_level, "debug");
    assert_eq!(
        config.application.scratch_dir(),
        std::path::PathBuf::from("/var/tmp/docsift")
    );

    assert_eq!(config.graph.tenant_id, "contoso");
    assert_eq!(
        config.graph.token_url(),
        "https://login.example.com/contoso/oauth2/v2.0/token"
    );
    assert_eq!(config.graph.base_url, "https://graph.example.com/v1.0");
    assert_eq!(config.graph.timeout().as_secs(), 60);
    assert_eq!(config.graph.refresh_window().as_secs(), 120);
    assert_eq!(config.graph.retry.max_attempts, 4);
    assert_eq!(config.graph.retry.base_delay_ms, 250);
    assert_eq!(config.graph.retry.max_delay_ms, 8000);

    assert_eq!(config.download.max_chunks, 500);
    assert_eq!(config.extraction.spill_threshold_bytes, 1_048_576);
    assert!(config.extraction.accepts(".pdf"));
    assert!(!config.extraction.accepts(".xlsx"));
    assert_eq!(
        config.kpi.definitions_path,
        "/etc/docsift/kpiDefinitions.json"
    );

    assert!(!config.logging.local_enabled);
    assert_eq!(config.logging.local_rotation, "hourly");
}

#[test]
fn test_load_minimal_config_with_defaults() {
    let _lock = ENV_MUTEX.lock().unwrap();
    cleanup_env_vars();

    let file = write_config(MINIMAL);
    let config = load_config(file.path()).expect("Failed to load config");

    assert_eq!(config.application.log_level, "info");
    assert_eq!(config.application.scratch_dir(), std::env::temp_dir());
    assert_eq!(config.graph.authority_host, "https://login.microsoftonline.com");
    assert_eq!(config.graph.base_url, "https://graph.microsoft.com/v1.0");
    assert_eq!(config.graph.scope, "https://graph.microsoft.com/.default");
    assert_eq!(config.graph.timeout_seconds, 300);
    assert_eq!(config.graph.token_refresh_window_seconds, 300);
    assert_eq!(config.graph.retry.max_attempts, 5);
    assert_eq!(config.download.max_chunks, 10_000);
    assert_eq!(config.extraction.spill_threshold_bytes, 100 * 1024 * 1024);
    assert_eq!(config.extraction.pdf_converter, "pdftotext");
    assert_eq!(config.extraction.extensions.len(), 3);
    assert_eq!(config.kpi.definitions_path, "./kpiDefinitions.json");
}

#[test]
fn test_env_var_substitution() {
    let _lock = ENV_MUTEX.lock().unwrap();
    cleanup_env_vars();
    std::env::set_var("DOCSIFT_TEST_TENANT", "contoso");
    std::env::set_var("DOCSIFT_TEST_CLIENT", "client-42");

    let file = write_config(
        r#"
[graph]
# tenant_id = "${DOCSIFT_COMMENTED_OUT}"
tenant_id = "${DOCSIFT_TEST_TENANT}"
client_id = "${DOCSIFT_TEST_CLIENT}"
drive_id = "drive"
site_id = "site"
certificate_path = "/etc/docsift/client.crt"
private_key_path = "/etc/docsift/client.key"
"#,
    );

    let config = load_config(file.path()).expect("Failed to load config");
    assert_eq!(config.graph.tenant_id, "contoso");
    assert_eq!(config.graph.client_id, "client-42");

    cleanup_env_vars();
}

#[test]
fn test_missing_env_var_is_configuration_error() {
    let _lock = ENV_MUTEX.lock().unwrap();
    cleanup_env_vars();

    let file = write_config(&MINIMAL.replace("\"tenant\"", "\"${DOCSIFT_TEST_TENANT}\""));
    let err = load_config(file.path()).unwrap_err();

    assert!(matches!(err, DocsiftError::Configuration(_)));
    assert!(err.to_string().contains("DOCSIFT_TEST_TENANT"));
}

#[test]
fn test_env_var_overrides() {
    let _lock = ENV_MUTEX.lock().unwrap();
    cleanup_env_vars();
    std::env::set_var("DOCSIFT_APPLICATION_LOG_LEVEL", "warn");
    std::env::set_var("DOCSIFT_GRAPH_DRIVE_ID", "override-drive");
    std::env::set_var("DOCSIFT_GRAPH_RETRY_MAX_ATTEMPTS", "2");
    std::env::set_var("DOCSIFT_DOWNLOAD_MAX_CHUNKS", "42");
    std::env::set_var("DOCSIFT_EXTRACTION_SPILL_THRESHOLD_BYTES", "1024");
    std::env::set_var("DOCSIFT_KPI_DEFINITIONS_PATH", "/tmp/kpi.json");

    let file = write_config(MINIMAL);
    let config = load_config(file.path()).expect("Failed to load config");

    assert_eq!(config.application.log_level, "warn");
    assert_eq!(config.graph.drive_id, "override-drive");
    assert_eq!(config.graph.retry.max_attempts, 2);
    assert_eq!(config.download.max_chunks, 42);
    assert_eq!(config.extraction.spill_threshold_bytes, 1024);
    assert_eq!(config.kpi.definitions_path, "/tmp/kpi.json");

    cleanup_env_vars();
}

#[test]
fn test_invalid_override_fails_validation() {
    let _lock = ENV_MUTEX.lock().unwrap();
    cleanup_env_vars();
    std::env::set_var("DOCSIFT_DOWNLOAD_MAX_CHUNKS", "0");

    let file = write_config(MINIMAL);
    let err = load_config(file.path()).unwrap_err();
    assert!(err.to_string().contains("download.max_chunks"));

    cleanup_env_vars();
}

#[test]
fn test_validation_errors() {
    let _lock = ENV_MUTEX.lock().unwrap();
    cleanup_env_vars();

    let cases = [
        (MINIMAL.replace("\"drive\"", "\"\""), "graph.drive_id"),
        (
            format!("[application]\nlog_level = \"verbose\"\n{MINIMAL}"),
            "log_level",
        ),
        (
            format!("{MINIMAL}\n[graph.retry]\nmax_attempts = 0\n"),
            "max_attempts",
        ),
        (
            format!("{MINIMAL}\n[extraction]\nextensions = [\".pptx\"]\n"),
            ".pptx",
        ),
        (
            format!("{MINIMAL}\n[logging]\nlocal_rotation = \"size\"\n"),
            "local_rotation",
        ),
    ];

    for (content, expected) in cases {
        let file = write_config(&content);
        let err = load_config(file.path()).unwrap_err();
        assert!(matches!(err, DocsiftError::Configuration(_)));
        assert!(
            err.to_string().contains(expected),
            "expected '{expected}' in '{err}'"
        );
    }
}

#[test]
fn test_invalid_toml_syntax() {
    let file = write_config("[graph\ntenant_id = ");
    let err = load_config(file.path()).unwrap_err();
    assert!(err.to_string().contains("Failed to parse TOML"));
}

#[test]
fn test_missing_graph_section() {
    let file = write_config("[application]\nlog_level = \"info\"\n");
    assert!(load_config(file.path()).is_err());
}
