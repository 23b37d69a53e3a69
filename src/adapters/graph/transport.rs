//! Retrying request executor
//!
//! Every API call goes through [`RequestExecutor::execute`]. The request is
//! rebuilt on each attempt so the bearer token is re-read from the token
//! source, which refreshes it on demand.
//!
//! Status handling:
//!
//! - 2xx decodes the body; a decode failure is not retried
//! - 429 and 5xx are retried, honoring `Retry-After` seconds when present
//! - any other status fails immediately with the response body
//! - connection failures are retried unless cancellation was requested

use crate::config::RetryConfig;
use crate::domain::{DocsiftError, Result, ShutdownSignal, TransportError};
use crate::log_retry_attempt;
use rand::Rng;
use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::{Request, StatusCode};
use serde::de::DeserializeOwned;
use std::future::Future;
use std::time::Duration;

/// How a response status is handled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    Success,
    Retry,
    Fatal,
}

/// Classify a response status
pub fn classify_status(status: StatusCode) -> Disposition {
    if status.is_success() {
        Disposition::Success
    } else if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
        Disposition::Retry
    } else {
        Disposition::Fatal
    }
}

/// Parse a `Retry-After` header given in whole seconds
///
/// HTTP-date values are ignored and the caller falls back to backoff.
pub fn retry_after(headers: &HeaderMap) -> Option<Duration> {
    let value = headers.get(RETRY_AFTER)?.to_str().ok()?;
    let seconds: u64 = value.trim().parse().ok()?;
    Some(Duration::from_secs(seconds))
}

/// Capped exponential backoff with jitter
#[derive(Debug, Clone, Copy)]
pub struct Backoff {
    base: Duration,
    max: Duration,
}

impl Backoff {
    pub fn new(base: Duration, max: Duration) -> Self {
        Self { base, max }
    }

    pub fn from_config(config: &RetryConfig) -> Self {
        Self::new(
            Duration::from_millis(config.base_delay_ms),
            Duration::from_millis(config.max_delay_ms),
        )
    }

    /// `min(base * 2^attempt, max)`
    pub fn ceiling(&self, attempt: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt.min(31)).unwrap_or(u32::MAX);
        self.base.saturating_mul(factor).min(self.max)
    }

    /// A delay in `[ceiling/2, ceiling]`
    pub fn delay(&self, attempt: u32) -> Duration {
        let ceiling = self.ceiling(attempt);
        let half = ceiling / 2;
        let spread = (ceiling - half).as_millis() as u64;
        let jitter = if spread == 0 {
            0
        } else {
            rand::thread_rng().gen_range(0..=spread)
        };
        (half + Duration::from_millis(jitter)).max(Duration::from_millis(1))
    }
}

/// Sleep for `delay` unless cancellation arrives first
pub(crate) async fn sleep_or_cancel(delay: Duration, signal: &ShutdownSignal) -> Result<()> {
    tokio::select! {
        _ = tokio::time::sleep(delay) => Ok(()),
        _ = signal.cancelled() => Err(DocsiftError::Cancelled),
    }
}

/// Sends requests with retry, backoff and cancellation
#[derive(Clone)]
pub struct RequestExecutor {
    client: reqwest::Client,
    max_attempts: u32,
    backoff: Backoff,
}

impl RequestExecutor {
    pub fn new(client: reqwest::Client, retry: &RetryConfig) -> Self {
        Self {
            client,
            max_attempts: retry.max_attempts.max(1),
            backoff: Backoff::from_config(retry),
        }
    }

    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn backoff(&self) -> Backoff {
        self.backoff
    }

    /// Send the request produced by `build` and decode a JSON body
    ///
    /// # Errors
    ///
    /// - [`DocsiftError::Cancelled`] as soon as the signal fires
    /// - [`TransportError::ClientError`] for non-retryable statuses
    /// - [`TransportError::InvalidResponse`] when a 2xx body does not decode
    /// - [`TransportError::RetriesExhausted`] once every attempt failed
    pub async fn execute<T, F, Fut>(&self, build: F, signal: &ShutdownSignal) -> Result<T>
    where
        T: DeserializeOwned,
        F: Fn() -> Fut,
        Fut: Future<Output = Result<Request>>,
    {
        let mut last_error = String::new();

        for attempt in 0..self.max_attempts {
            signal.check()?;
            let request = build().await?;
            let method = request.method().clone();
            let url = request.url().clone();

            let outcome = tokio::select! {
                outcome = self.client.execute(request) => outcome,
                _ = signal.cancelled() => return Err(DocsiftError::Cancelled),
            };

            let server_wait = match outcome {
                Err(e) => {
                    signal.check()?;
                    last_error = TransportError::ConnectionFailed(e.to_string()).to_string();
                    None
                }
                Ok(response) => {
                    let status = response.status();
                    match classify_status(status) {
                        Disposition::Success => match response.bytes().await {
                            Ok(body) => {
                                tracing::debug!(%method, %url, status = status.as_u16(), "Request succeeded");
                                return serde_json::from_slice(&body).map_err(|e| {
                                    TransportError::InvalidResponse(e.to_string()).into()
                                });
                            }
                            Err(e) => {
                                signal.check()?;
                                last_error =
                                    TransportError::ConnectionFailed(e.to_string()).to_string();
                                None
                            }
                        },
                        Disposition::Fatal => {
                            let body = response.text().await.unwrap_or_default();
                            return Err(TransportError::ClientError {
                                status: status.as_u16(),
                                body,
                            }
                            .into());
                        }
                        Disposition::Retry => {
                            last_error = TransportError::ServerError {
                                status: status.as_u16(),
                            }
                            .to_string();
                            retry_after(response.headers())
                        }
                    }
                }
            };

            if attempt + 1 >= self.max_attempts {
                break;
            }

            let delay = server_wait.unwrap_or_else(|| self.backoff.delay(attempt));
            log_retry_attempt!(attempt + 1, self.max_attempts, delay.as_millis() as u64, last_error);
            sleep_or_cancel(delay, signal).await?;
        }

        Err(TransportError::RetriesExhausted {
            attempts: self.max_attempts,
            last_error,
        }
        .into())
    }
}
