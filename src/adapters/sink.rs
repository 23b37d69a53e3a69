//! Reporting sink
//!
//! Package results leave the crate through [`ReportSink`]. The bundled
//! implementation appends one JSON object per package (NDJSON) to a file or
//! to standard output.

use crate::domain::{PackageResult, Result};
use async_trait::async_trait;
use std::path::Path;
use tokio::fs::{File, OpenOptions};
use tokio::io::{AsyncWrite, AsyncWriteExt, BufWriter};
use tokio::sync::Mutex;

/// Destination for confirmed package findings
#[async_trait]
pub trait ReportSink: Send + Sync {
    /// Deliver one package result
    ///
    /// Delivery is at-most-once from the caller's point of view.
    async fn submit(&self, result: &PackageResult) -> Result<()>;

    /// Flush anything buffered
    async fn flush(&self) -> Result<()> {
        Ok(())
    }
}

/// Newline-delimited JSON sink
pub struct JsonLinesSink<W> {
    writer: Mutex<W>,
}

impl JsonLinesSink<BufWriter<File>> {
    /// Open or create `path` in append mode
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path.as_ref())
            .await?;
        Ok(Self::new(BufWriter::new(file)))
    }
}

impl JsonLinesSink<tokio::io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(tokio::io::stdout())
    }
}

impl<W> JsonLinesSink<W>
where
    W: AsyncWrite + Unpin + Send,
{
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    /// Consume the sink and return the underlying writer
    pub fn into_inner(self) -> W {
        self.writer.into_inner()
    }
}

#[async_trait]
impl<W> ReportSink for JsonLinesSink<W>
where
    W: AsyncWrite + Unpin + Send,
{
    async fn submit(&self, result: &PackageResult) -> Result<()> {
        let mut line = serde_json::to_vec(result)?;
        line.push(b'\n');

        let mut writer = self.writer.lock().await;
        writer.write_all(&line).await?;

        tracing::debug!(
            package = %result.package_name,
            findings = result.findings.len(),
            "Submitted package result"
        );
        Ok(())
    }

    async fn flush(&self) -> Result<()> {
        self.writer.lock().await.flush().await?;
        Ok(())
    }
}
