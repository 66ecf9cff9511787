use async_trait::async_trait;
use backon::{ExponentialBuilder, Retryable};
use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderMap, HeaderValue};
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;
use zywrap_schema::{BundleDocument, UpdateCheck};

use super::{BODY_PREVIEW_CHARS, RemoteCatalog, decode_bundle};
use crate::config::{RemoteConfig, SyncConfig};
use crate::error::{FetchError, SyncError};
use crate::utils::logging::debug_payload;

/// `reqwest` client for the export API.
#[derive(Clone)]
pub struct HttpRemote {
    client: reqwest::Client,
    api_key: String,
    updates_url: Url,
    bundle_url: Url,
    bundle_entry: String,
    retry_policy: ExponentialBuilder,
}

impl HttpRemote {
    pub fn new(remote: &RemoteConfig, sync: &SyncConfig) -> Result<Self, SyncError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let mut builder = reqwest::Client::builder()
            .user_agent(concat!("zywrap-mirror/", env!("CARGO_PKG_VERSION")))
            .default_headers(headers)
            .connect_timeout(remote.connect_timeout())
            .timeout(remote.request_timeout());

        if let Some(proxy_url) = &remote.proxy {
            let proxy = reqwest::Proxy::all(proxy_url.as_str())
                .map_err(|e| SyncError::Config(format!("invalid remote.proxy: {e}")))?;
            builder = builder.proxy(proxy);
        }

        let client = builder
            .build()
            .map_err(|e| SyncError::Config(format!("failed to build HTTP client: {e}")))?;

        let retry_policy = ExponentialBuilder::default()
            .with_min_delay(Duration::from_millis(200))
            .with_max_delay(Duration::from_secs(2))
            .with_max_times(remote.retry_max_times)
            .with_jitter();

        Ok(Self {
            client,
            api_key: remote.api_key.clone(),
            updates_url: remote.updates_url.clone(),
            bundle_url: remote.bundle_url.clone(),
            bundle_entry: sync.bundle_entry.clone(),
            retry_policy,
        })
    }

    /// Raw bundle bytes, rejected when the server answers with a JSON or
    /// HTML document instead of an archive.
    pub async fn download_bundle_bytes(&self, url: Option<&str>) -> Result<Vec<u8>, FetchError> {
        let url = url.map_or_else(|| self.bundle_url.to_string(), str::to_string);
        info!(url = %url, "downloading bundle");

        let resp = self.get_with_retry(&url, None).await?;
        let content_type = resp
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_ascii_lowercase();

        if content_type.contains("application/json") || content_type.contains("text/html") {
            let body = resp.text().await.unwrap_or_default();
            return Err(FetchError::BundleRejected {
                content_type,
                body: preview(&body),
            });
        }

        let bytes = resp.bytes().await?;
        debug!(bytes = bytes.len(), content_type = %content_type, "bundle downloaded");
        Ok(bytes.to_vec())
    }

    /// GET with bearer auth. 5xx answers and connection failures are retried
    /// per the configured policy; any other non-success status is returned
    /// as [`FetchError::Status`] right away.
    async fn get_with_retry(
        &self,
        url: &str,
        from_version: Option<&str>,
    ) -> Result<reqwest::Response, FetchError> {
        (|| async move {
            let mut request = self.client.get(url).bearer_auth(&self.api_key);
            if let Some(version) = from_version {
                request = request.query(&[("fromVersion", version)]);
            }

            let resp = request.send().await?;
            let status = resp.status();
            if status.is_success() {
                return Ok(resp);
            }

            let body = match resp.text().await {
                Ok(body) => preview(&body),
                Err(e) => format!("<failed to read body: {e}>"),
            };
            Err(FetchError::Status { status, body })
        })
        .retry(self.retry_policy)
        .when(should_retry)
        .notify(|err: &FetchError, dur: Duration| {
            warn!(url, error = %err, retry_in = ?dur, "export API request failed, retrying");
        })
        .await
    }
}

fn should_retry(err: &FetchError) -> bool {
    match err {
        FetchError::Status { status, .. } => status.is_server_error(),
        FetchError::Http(e) => e.is_connect(),
        _ => false,
    }
}

fn preview(body: &str) -> String {
    body.chars().take(BODY_PREVIEW_CHARS).collect()
}

#[async_trait]
impl RemoteCatalog for HttpRemote {
    async fn check_updates(&self, from_version: Option<&str>) -> Result<UpdateCheck, FetchError> {
        info!(from_version = from_version.unwrap_or("<none>"), "checking for updates");

        let resp = self
            .get_with_retry(self.updates_url.as_str(), from_version)
            .await?;
        let raw = resp.bytes().await?;
        let check: UpdateCheck = serde_json::from_slice(&raw)?;

        debug_payload("update check", &check);
        Ok(check)
    }

    async fn fetch_bundle(&self, url: Option<&str>) -> Result<BundleDocument, FetchError> {
        let bytes = self.download_bundle_bytes(url).await?;
        let entry = self.bundle_entry.clone();
        tokio::task::spawn_blocking(move || decode_bundle(&bytes, &entry))
            .await
            .map_err(|e| FetchError::Archive(format!("bundle decode task failed: {e}")))?
    }
}

impl std::fmt::Debug for HttpRemote {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpRemote")
            .field("updates_url", &self.updates_url.as_str())
            .field("bundle_url", &self.bundle_url.as_str())
            .field("bundle_entry", &self.bundle_entry)
            .finish_non_exhaustive()
    }
}
