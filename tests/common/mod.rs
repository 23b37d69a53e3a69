//! Shared helpers for integration tests

#![allow(dead_code)]

use chrono::{Duration, Utc};
use docsift::adapters::graph::{http_client, AccessToken, GraphClient, StaticToken};
use docsift::config::DocsiftConfig;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub const TOKEN: &str = "test-token";

pub fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

pub fn read_fixture(name: &str) -> String {
    std::fs::read_to_string(fixture(name)).unwrap()
}

/// Configuration pointing every endpoint at `server_url`
///
/// Backoff steps are a few milliseconds so retry paths run quickly.
pub fn config(server_url: &str, scratch_dir: &Path) -> DocsiftConfig {
    let toml = format!(
        r#"
[application]
scratch_dir = '{scratch}'

[graph]
tenant_id = "tenant"
client_id = "client-id"
drive_id = "drive"
site_id = "site"
certificate_path = '{cert}'
private_key_path = '{key}'
authority_host = "{url}"
base_url = "{url}"
timeout_seconds = 10

[graph.retry]
max_attempts = 3
base_delay_ms = 1
max_delay_ms = 5

[logging]
local_enabled = false
"#,
        scratch = scratch_dir.display(),
        cert = fixture("client.crt").display(),
        key = fixture("client_pkcs8.key").display(),
        url = server_url,
    );
    let config: DocsiftConfig = toml::from_str(&toml).unwrap();
    config.validate().unwrap();
    config
}

/// A client that sends a fixed bearer token
pub fn client(config: &DocsiftConfig) -> GraphClient {
    let token = AccessToken::new(TOKEN, Utc::now() + Duration::hours(1));
    GraphClient::with_token_source(
        config,
        http_client(config).unwrap(),
        Arc::new(StaticToken::new(token)),
    )
    .unwrap()
}

pub fn bearer() -> String {
    format!("Bearer {TOKEN}")
}

pub fn file_count(dir: &Path) -> usize {
    std::fs::read_dir(dir).unwrap().count()
}
