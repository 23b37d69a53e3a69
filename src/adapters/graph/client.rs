//! Document-library client
//!
//! Thin facade that turns listing, download and status-patch operations into
//! authorized requests and hands them to the executor, paginator or
//! downloader.

use super::auth::{CertificateCredential, TokenProvider, TokenSource};
use super::download::ChunkedDownloader;
use super::pagination::list_all;
use super::transport::RequestExecutor;
use crate::config::DocsiftConfig;
use crate::domain::{
    DocsiftError, PackageItem, ProcessStatus, RemoteItem, Result, ShutdownSignal, TransportError,
};
use reqwest::header::{HeaderValue, AUTHORIZATION};
use reqwest::{Method, Request};
use std::sync::Arc;
use tempfile::NamedTempFile;

/// Client for one drive of the remote document library
pub struct GraphClient {
    base_url: String,
    drive_id: String,
    site_id: String,
    tokens: Arc<dyn TokenSource>,
    executor: RequestExecutor,
    downloader: ChunkedDownloader,
}

impl GraphClient {
    /// Build a client that authenticates with the configured certificate
    pub fn from_config(config: &DocsiftConfig) -> Result<Self> {
        let http = http_client(config)?;
        let credential = CertificateCredential::from_config(&config.graph)?;
        let tokens = TokenProvider::new(http.clone(), credential, config.graph.refresh_window());
        Self::with_token_source(config, http, Arc::new(tokens))
    }

    /// Build a client around an existing token source
    pub fn with_token_source(
        config: &DocsiftConfig,
        http: reqwest::Client,
        tokens: Arc<dyn TokenSource>,
    ) -> Result<Self> {
        let graph = &config.graph;
        Ok(Self {
            base_url: graph.base_url.trim_end_matches('/').to_string(),
            drive_id: graph.drive_id.clone(),
            site_id: graph.site_id.clone(),
            tokens,
            executor: RequestExecutor::new(http.clone(), &graph.retry),
            downloader: ChunkedDownloader::new(
                http,
                &graph.retry,
                config.download.max_chunks,
                config.application.scratch_dir(),
            ),
        })
    }

    /// Children of the drive root
    pub async fn list_root(&self, signal: &ShutdownSignal) -> Result<Vec<RemoteItem>> {
        let url = format!("{}/drives/{}/root/children", self.base_url, self.drive_id);
        self.list(&url, signal).await
    }

    /// Children of a folder
    pub async fn list_children(
        &self,
        item_id: &str,
        signal: &ShutdownSignal,
    ) -> Result<Vec<RemoteItem>> {
        let url = self.children_url(item_id);
        self.list(&url, signal).await
    }

    /// Children of a folder with their list-item metadata expanded
    pub async fn list_packages(
        &self,
        item_id: &str,
        signal: &ShutdownSignal,
    ) -> Result<Vec<PackageItem>> {
        let url = format!("{}?expand=listItem", self.children_url(item_id));
        self.list(&url, signal).await
    }

    /// Download an item's content into a scratch file
    pub async fn download(&self, item_id: &str, signal: &ShutdownSignal) -> Result<NamedTempFile> {
        let url = format!(
            "{}/sites/{}/drives/{}/items/{}/content",
            self.base_url, self.site_id, self.drive_id, item_id
        );
        let url = &url;
        self.downloader
            .download(
                || async move { self.request(Method::GET, url, None, signal).await },
                signal,
            )
            .await
    }

    /// Set the `ProcessStatus` column of an item's list entry
    pub async fn patch_process_status(
        &self,
        item_id: &str,
        status: &str,
        signal: &ShutdownSignal,
    ) -> Result<ProcessStatus> {
        let url = format!(
            "{}/sites/{}/drives/{}/items/{}/listItem/fields",
            self.base_url, self.site_id, self.drive_id, item_id
        );
        let body = serde_json::to_value(ProcessStatus {
            process_status: status.to_string(),
        })?;

        let (url, body) = (&url, &body);
        let echoed: ProcessStatus = self
            .executor
            .execute(
                || async move { self.request(Method::PATCH, url, Some(body), signal).await },
                signal,
            )
            .await?;

        tracing::info!(item_id, status = %echoed.process_status, "Updated process status");
        Ok(echoed)
    }

    fn children_url(&self, item_id: &str) -> String {
        format!(
            "{}/drives/{}/items/{}/children",
            self.base_url, self.drive_id, item_id
        )
    }

    async fn list<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        signal: &ShutdownSignal,
    ) -> Result<Vec<T>> {
        list_all(
            &self.executor,
            || async move { self.request(Method::GET, url, None, signal).await },
            signal,
        )
        .await
    }

    /// Build a request carrying a current bearer token
    async fn request(
        &self,
        method: Method,
        url: &str,
        body: Option<&serde_json::Value>,
        signal: &ShutdownSignal,
    ) -> Result<Request> {
        let token = self.tokens.access_token(signal).await?;
        let bearer = HeaderValue::from_str(&token.bearer())
            .map_err(|e| DocsiftError::Authentication(format!("Unusable access token: {e}")))?;

        let mut builder = self
            .executor
            .client()
            .request(method, url)
            .header(AUTHORIZATION, bearer);
        if let Some(body) = body {
            builder = builder.json(body);
        }
        builder
            .build()
            .map_err(|e| TransportError::InvalidRequest(e.to_string()).into())
    }
}

/// Shared HTTP client with the configured per-request timeout
pub fn http_client(config: &DocsiftConfig) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(config.graph.timeout())
        .user_agent(concat!("docsift/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| DocsiftError::Configuration(format!("Failed to build HTTP client: {e}")))
}
