//! Resumable chunked download into a scratch file
//!
//! The first request is unranged. Once any bytes have been written, every
//! further request asks for `Range: bytes=<written>-` and the response must
//! continue exactly where the file ends:
//!
//! | status | handling |
//! |--------|----------|
//! | 200    | accepted only while nothing has been written; records `Content-Length` |
//! | 206    | `Content-Range: bytes s-e/t` must satisfy `s == written`, `e >= s`, a stable `t`, and exactly `e - s + 1` bytes |
//! | 416    | success only if the total is known and already reached |
//! | 401/403/404 | fatal |
//! | 429/5xx | retried with backoff or `Retry-After` |
//!
//! A chunk that adds no bytes is a stall, and the chunk count has a hard
//! ceiling. The scratch file is a [`NamedTempFile`], so every failure path
//! removes it when the handle is dropped.

use super::transport::{retry_after, sleep_or_cancel, Backoff};
use crate::config::RetryConfig;
use crate::domain::{DocsiftError, DownloadError, Result, ShutdownSignal};
use crate::log_retry_attempt;
use reqwest::header::{HeaderValue, CONTENT_RANGE, RANGE};
use reqwest::{Request, Response, StatusCode};
use std::future::Future;
use std::io::{Seek, SeekFrom};
use std::path::PathBuf;
use tempfile::NamedTempFile;
use tokio::io::{AsyncSeekExt, AsyncWriteExt};

/// Parsed `Content-Range: bytes start-end/total`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContentRange {
    pub start: u64,
    pub end: u64,
    pub total: u64,
}

impl ContentRange {
    /// Parse and sanity-check a header value
    pub fn parse(value: &str) -> std::result::Result<Self, DownloadError> {
        let invalid = || DownloadError::InvalidContentRange(value.to_string());

        let ranges = value.trim().strip_prefix("bytes ").ok_or_else(invalid)?;
        let (range, total) = ranges.split_once('/').ok_or_else(invalid)?;
        let (start, end) = range.split_once('-').ok_or_else(invalid)?;

        let start: u64 = start.trim().parse().map_err(|_| invalid())?;
        let end: u64 = end.trim().parse().map_err(|_| invalid())?;
        let total: u64 = total.trim().parse().map_err(|_| invalid())?;

        if end < start || total == 0 || end >= total {
            return Err(invalid());
        }
        Ok(Self { start, end, total })
    }

    /// Number of bytes the range announces
    pub fn span(&self) -> u64 {
        self.end - self.start + 1
    }
}

/// Progress of a single download
#[derive(Debug, Default)]
struct DownloadState {
    bytes_written: u64,
    expected_total: Option<u64>,
    chunks: u32,
    consecutive_retries: u32,
}

impl DownloadState {
    fn is_complete(&self) -> bool {
        matches!(self.expected_total, Some(total) if self.bytes_written >= total)
    }
}

/// What to do after handling one response
enum Step {
    Continue,
    Complete,
    Retry {
        wait: Option<std::time::Duration>,
        reason: String,
    },
}

/// Downloads a remote item into a scratch file with resumable range requests
#[derive(Clone)]
pub struct ChunkedDownloader {
    client: reqwest::Client,
    max_attempts: u32,
    backoff: Backoff,
    max_chunks: u32,
    scratch_dir: PathBuf,
}

impl ChunkedDownloader {
    pub fn new(
        client: reqwest::Client,
        retry: &RetryConfig,
        max_chunks: u32,
        scratch_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            client,
            max_attempts: retry.max_attempts.max(1),
            backoff: Backoff::from_config(retry),
            max_chunks: max_chunks.max(1),
            scratch_dir: scratch_dir.into(),
        }
    }

    /// Download into a new scratch file positioned at offset 0
    ///
    /// `build` produces the base request for each attempt; the `Range`
    /// header is added here.
    pub async fn download<F, Fut>(&self, build: F, signal: &ShutdownSignal) -> Result<NamedTempFile>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<Request>>,
    {
        let mut scratch = tempfile::Builder::new()
            .prefix("docsift-dl-")
            .tempfile_in(&self.scratch_dir)?;
        let mut file = tokio::fs::File::from_std(scratch.as_file().try_clone()?);
        let mut state = DownloadState::default();

        loop {
            signal.check()?;

            let mut request = build().await?;
            if state.bytes_written > 0 {
                let range = HeaderValue::from_str(&format!("bytes={}-", state.bytes_written))
                    .map_err(|e| DocsiftError::Other(e.to_string()))?;
                request.headers_mut().insert(RANGE, range);
            }

            let outcome = tokio::select! {
                outcome = self.client.execute(request) => outcome,
                _ = signal.cancelled() => return Err(DocsiftError::Cancelled),
            };

            let step = match outcome {
                Ok(response) => self.handle(response, &mut state, &mut file, signal).await?,
                Err(e) => {
                    signal.check()?;
                    Step::Retry {
                        wait: None,
                        reason: e.to_string(),
                    }
                }
            };

            match step {
                Step::Complete => break,
                Step::Continue if state.is_complete() => break,
                Step::Continue => {}
                Step::Retry { wait, reason } => {
                    state.consecutive_retries += 1;
                    if state.consecutive_retries >= self.max_attempts {
                        return Err(DownloadError::RetriesExhausted {
                            attempts: state.consecutive_retries,
                            last_error: reason,
                        }
                        .into());
                    }
                    let delay =
                        wait.unwrap_or_else(|| self.backoff.delay(state.consecutive_retries - 1));
                    log_retry_attempt!(
                        state.consecutive_retries,
                        self.max_attempts,
                        delay.as_millis() as u64,
                        reason
                    );
                    sleep_or_cancel(delay, signal).await?;
                }
            }
        }

        file.flush().await?;
        drop(file);
        scratch.as_file_mut().seek(SeekFrom::Start(0))?;

        tracing::debug!(
            bytes = state.bytes_written,
            chunks = state.chunks,
            path = %scratch.path().display(),
            "Download complete"
        );
        Ok(scratch)
    }

    async fn handle(
        &self,
        mut response: Response,
        state: &mut DownloadState,
        file: &mut tokio::fs::File,
        signal: &ShutdownSignal,
    ) -> Result<Step> {
        let status = response.status();
        match status {
            StatusCode::OK => {
                if state.bytes_written > 0 {
                    return Err(DownloadError::RangeIgnored {
                        written: state.bytes_written,
                    }
                    .into());
                }
                if let Some(length) = response.content_length() {
                    state.expected_total = Some(length);
                }

                let (copied, interrupted) = copy_body(&mut response, file, 0, signal).await?;
                state.bytes_written = copied;
                if let Some(reason) = interrupted {
                    return Ok(Step::Retry { wait: None, reason });
                }

                state.chunks += 1;
                state.consecutive_retries = 0;
                match state.expected_total {
                    // without a length the single unranged body is the whole item
                    None => Ok(Step::Complete),
                    Some(_) if state.is_complete() => Ok(Step::Complete),
                    Some(_) if copied == 0 => Err(DownloadError::Stalled {
                        chunks: state.chunks,
                    }
                    .into()),
                    Some(_) => Ok(Step::Continue),
                }
            }
            StatusCode::PARTIAL_CONTENT => {
                let range = content_range(&response)?;
                if range.start != state.bytes_written {
                    return Err(DownloadError::RangeStartMismatch {
                        expected: state.bytes_written,
                        actual: range.start,
                    }
                    .into());
                }
                match state.expected_total {
                    Some(previous) if previous != range.total => {
                        return Err(DownloadError::TotalSizeChanged {
                            previous,
                            current: range.total,
                        }
                        .into());
                    }
                    _ => state.expected_total = Some(range.total),
                }
                if state.chunks >= self.max_chunks {
                    return Err(DownloadError::Stalled {
                        chunks: state.chunks,
                    }
                    .into());
                }

                let (copied, interrupted) =
                    copy_body(&mut response, file, state.bytes_written, signal).await?;
                state.bytes_written += copied;
                if let Some(reason) = interrupted {
                    return Ok(Step::Retry { wait: None, reason });
                }
                if copied == 0 {
                    return Err(DownloadError::Stalled {
                        chunks: state.chunks,
                    }
                    .into());
                }
                if copied != range.span() {
                    return Err(DownloadError::TruncatedChunk {
                        expected: range.span(),
                        actual: copied,
                    }
                    .into());
                }

                state.chunks += 1;
                state.consecutive_retries = 0;
                Ok(Step::Continue)
            }
            StatusCode::RANGE_NOT_SATISFIABLE => {
                if state.is_complete() {
                    Ok(Step::Complete)
                } else {
                    Err(DownloadError::RangeNotSatisfiable {
                        written: state.bytes_written,
                    }
                    .into())
                }
            }
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN | StatusCode::NOT_FOUND => {
                Err(DownloadError::NotAccessible {
                    status: status.as_u16(),
                }
                .into())
            }
            s if s == StatusCode::TOO_MANY_REQUESTS || s.is_server_error() => Ok(Step::Retry {
                wait: retry_after(response.headers()),
                reason: format!("status={}", s.as_u16()),
            }),
            s => Err(DownloadError::UnexpectedStatus(s.as_u16()).into()),
        }
    }
}

fn content_range(response: &Response) -> Result<ContentRange> {
    let value = response
        .headers()
        .get(CONTENT_RANGE)
        .ok_or(DownloadError::MissingContentRange)?;
    let value = value
        .to_str()
        .map_err(|_| DownloadError::InvalidContentRange(format!("{value:?}")))?;
    Ok(ContentRange::parse(value)?)
}

/// Stream the response body to `file` at `offset`
///
/// Returns the number of bytes written and, if the body stream broke off,
/// the reason. Bytes received before the break are kept.
async fn copy_body(
    response: &mut Response,
    file: &mut tokio::fs::File,
    offset: u64,
    signal: &ShutdownSignal,
) -> Result<(u64, Option<String>)> {
    file.seek(SeekFrom::Start(offset)).await?;
    let mut copied = 0u64;

    loop {
        let chunk = tokio::select! {
            chunk = response.chunk() => chunk,
            _ = signal.cancelled() => return Err(DocsiftError::Cancelled),
        };
        match chunk {
            Ok(Some(bytes)) => {
                file.write_all(&bytes).await?;
                copied += bytes.len() as u64;
            }
            Ok(None) => return Ok((copied, None)),
            Err(e) => return Ok((copied, Some(e.to_string()))),
        }
    }
}
