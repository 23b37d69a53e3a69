//! Init command implementation
//!
//! This module implements the `init` command for generating a sample
//! configuration file and, optionally, a starter KPI definitions file.

use super::{EXIT_CONFIG, EXIT_FATAL, EXIT_OK};
use clap::Args;
use std::fs;
use std::path::Path;

/// Arguments for the init command
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Path where to create the configuration file
    #[arg(short, long, default_value = "docsift.toml")]
    pub output: String,

    /// Also write a starter KPI definitions file at this path
    #[arg(long, value_name = "PATH")]
    pub definitions: Option<String>,

    /// Overwrite existing files
    #[arg(long)]
    pub force: bool,
}

impl InitArgs {
    /// Execute the init command
    pub async fn execute(&self) -> anyhow::Result<i32> {
        tracing::info!(output = %self.output, "Initializing configuration file");

        let mut targets = vec![(self.output.as_str(), Self::generate_config())];
        if let Some(path) = &self.definitions {
            targets.push((path.as_str(), Self::generate_definitions()));
        }

        for (path, _) in &targets {
            if Path::new(path).exists() && !self.force {
                println!("❌ File already exists: {path}");
                println!("   Use --force to overwrite");
                return Ok(EXIT_CONFIG);
            }
        }

        for (path, content) in &targets {
            if let Err(e) = fs::write(path, content) {
                println!("❌ Failed to write {path}");
                println!("   Error: {e}");
                return Ok(EXIT_FATAL);
            }
            println!("✅ Created: {path}");
        }

        println!();
        println!("Next steps:");
        println!("  1. Edit {} with your tenant, drive and site", self.output);
        println!("  2. Set DOCSIFT_TENANT_ID and DOCSIFT_CLIENT_ID (or use a .env file)");
        println!("  3. Validate configuration: docsift validate-config");
        println!("  4. Scan a package: docsift scan-package <ITEM_ID>");
        println!();
        Ok(EXIT_OK)
    }

    fn generate_config() -> String {
        r#"# Docsift Configuration File

[application]
# Log level (trace, debug, info, warn, error)
log_level = "info"
# Directory for download and spill scratch files (defaults to the OS temp dir)
# scratch_dir = "/var/tmp/docsift"

[graph]
tenant_id = "${DOCSIFT_TENANT_ID}"
client_id = "${DOCSIFT_CLIENT_ID}"
drive_id = "b!replace-with-drive-id"
site_id = "contoso.sharepoint.com,site-guid,web-guid"
certificate_path = "/etc/docsift/client.crt"
private_key_path = "/etc/docsift/client.key"
# authority_host = "https://login.microsoftonline.com"
# base_url = "https://graph.microsoft.com/v1.0"
# scope = "https://graph.microsoft.com/.default"
timeout_seconds = 300
token_refresh_window_seconds = 300

[graph.retry]
max_attempts = 5
base_delay_ms = 1000
max_delay_ms = 30000

[download]
# Abort a download after this many byte-range chunks
max_chunks = 10000

[extraction]
# Spreadsheets larger than this resolve shared strings from disk
spill_threshold_bytes = 104857600
pdf_converter = "pdftotext"
extensions = [".docx", ".xlsx", ".pdf"]

[kpi]
definitions_path = "./kpiDefinitions.json"

[logging]
local_enabled = false
local_path = "/var/log/docsift"
local_rotation = "daily"
"#
        .to_string()
    }

    fn generate_definitions() -> String {
        r#"[
  {
    "name": "Availability",
    "category": "Operations",
    "regexps": ["(?i)uptime of \\d+(\\.\\d+)?%", "(?i)availability"]
  },
  {
    "name": "Lost Time Injuries",
    "category": "Safety",
    "regexps": ["(?i)lost[- ]time injur"]
  }
]
"#
        .to_string()
    }
}
