//! PDF text through an external converter
//!
//! The downloaded file is piped to `<converter> - -` (poppler's `pdftotext`
//! by default) and the converter's standard output is read line by line.
//! The child process is killed if the cancellation signal fires or the
//! future is dropped.

use crate::domain::{DocsiftError, ExtractError, Result, ShutdownSignal};
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;

/// Wrapper around the external PDF-to-text program
#[derive(Debug, Clone)]
pub struct PdfConverter {
    program: String,
}

impl PdfConverter {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Convert `input` and hand each output line to `on_line`
    ///
    /// Returns the number of lines read. A converter that cannot be started
    /// or exits unsuccessfully is reported as [`ExtractError::Converter`].
    pub async fn convert_lines<F>(
        &self,
        input: std::fs::File,
        signal: &ShutdownSignal,
        mut on_line: F,
    ) -> Result<usize>
    where
        F: FnMut(&str) -> Result<()>,
    {
        let mut child = Command::new(&self.program)
            .args(["-", "-"])
            .stdin(Stdio::from(input))
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                ExtractError::Converter(format!("Failed to start {}: {e}", self.program))
            })?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| ExtractError::Converter("Converter stdout unavailable".to_string()))?;
        let mut reader = BufReader::new(stdout);
        let mut raw = Vec::new();
        let mut count = 0;

        loop {
            raw.clear();
            let read = tokio::select! {
                read = reader.read_until(b'\n', &mut raw) => read.map_err(|e| {
                    ExtractError::Converter(format!("Failed to read converter output: {e}"))
                })?,
                _ = signal.cancelled() => {
                    let _ = child.kill().await;
                    return Err(DocsiftError::Cancelled);
                }
            };
            if read == 0 {
                break;
            }
            // Converter output is not guaranteed to be UTF-8
            let line = String::from_utf8_lossy(&raw);
            on_line(line.trim_end_matches(['\n', '\r']))?;
            count += 1;
        }

        let status = tokio::select! {
            status = child.wait() => status?,
            _ = signal.cancelled() => {
                let _ = child.kill().await;
                return Err(DocsiftError::Cancelled);
            }
        };
        if !status.success() {
            return Err(ExtractError::Converter(format!(
                "{} exited with {status}",
                self.program
            ))
            .into());
        }

        Ok(count)
    }
}
