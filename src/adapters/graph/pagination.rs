//! Continuation-link pagination
//!
//! Listing responses carry at most one page of values plus an optional
//! `@odata.nextLink`. [`list_all`] follows the chain until it ends and returns
//! the concatenated values in page order. Continuation requests are plain
//! GETs to the link, carrying the headers of a freshly built first request so
//! the bearer token stays current across long listings.
//!
//! A failure on any page aborts the whole listing; no partial result is
//! returned.

use super::transport::RequestExecutor;
use crate::domain::{DocsiftError, Page, Result, ShutdownSignal, TransportError};
use reqwest::{Method, Request};
use serde::de::DeserializeOwned;
use std::future::Future;
use url::Url;

/// Where the next page comes from
#[derive(Debug, Clone, PartialEq, Eq)]
enum Cursor {
    First,
    Next(Url),
    Done,
}

impl Cursor {
    fn after(page_link: Option<String>) -> Result<Self> {
        match page_link.filter(|l| !l.is_empty()) {
            None => Ok(Cursor::Done),
            Some(link) => Url::parse(&link).map(Cursor::Next).map_err(|e| {
                TransportError::InvalidResponse(format!("Invalid continuation link '{link}': {e}"))
                    .into()
            }),
        }
    }
}

/// Build a GET to `next` that carries the headers of `template`
pub fn continuation_request(template: &Request, next: &Url) -> Request {
    let mut request = Request::new(Method::GET, next.clone());
    *request.headers_mut() = template.headers().clone();
    *request.timeout_mut() = template.timeout().copied();
    request
}

/// Fetch every page starting from the request produced by `build`
pub async fn list_all<T, F, Fut>(
    executor: &RequestExecutor,
    build: F,
    signal: &ShutdownSignal,
) -> Result<Vec<T>>
where
    T: DeserializeOwned,
    F: Fn() -> Fut,
    Fut: Future<Output = Result<Request>>,
{
    let mut values = Vec::new();
    let mut cursor = Cursor::First;
    let mut pages = 0usize;

    loop {
        let page: Page<T> = match &cursor {
            Cursor::First => executor.execute(&build, signal).await?,
            Cursor::Next(next) => {
                let build = &build;
                executor
                    .execute(
                        || async move {
                            let template = build().await?;
                            Ok::<_, DocsiftError>(continuation_request(&template, next))
                        },
                        signal,
                    )
                    .await?
            }
            Cursor::Done => break,
        };

        pages += 1;
        values.extend(page.values);
        cursor = Cursor::after(page.continuation)?;
    }

    tracing::debug!(pages, items = values.len(), "Listing complete");
    Ok(values)
}
