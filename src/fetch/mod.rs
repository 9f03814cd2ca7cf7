// src/fetch/mod.rs

use anyhow::{Context, Result};
use reqwest::{header, Client};
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, error, instrument, warn};
use url::Url;

use crate::config::FetchSettings;
use crate::sdmx::Payload;

/// Media type for SDMX-JSON data messages, with plain JSON as a fallback.
pub const SDMX_JSON_ACCEPT: &str = "application/vnd.sdmx.data+json;version=1.0.0, application/json;q=0.9";

/// Anything that can produce an SDMX-JSON payload for a data URL.
pub trait PayloadSource: Send + Sync + 'static {
    fn fetch(&self, url: &Url) -> impl Future<Output = Result<Payload>> + Send;
}

/// Fetches payloads over HTTP, retrying transient failures with
/// exponential backoff.
#[derive(Debug, Clone)]
pub struct HttpSource {
    client: Client,
    max_retries: u32,
    initial_backoff_ms: u64,
}

impl HttpSource {
    pub fn new(settings: &FetchSettings) -> Result<Self> {
        let client = Client::builder()
            .timeout(settings.timeout())
            .gzip(true)
            .build()
            .context("building HTTP client")?;
        Ok(Self::with_client(client, settings))
    }

    pub fn with_client(client: Client, settings: &FetchSettings) -> Self {
        Self {
            client,
            max_retries: settings.max_retries,
            initial_backoff_ms: settings.initial_backoff_ms,
        }
    }

    async fn get_text_core(&self, url: &Url) -> Result<String> {
        debug!("Fetching text from {}", url);
        self.client
            .get(url.clone())
            .header(header::ACCEPT, SDMX_JSON_ACCEPT)
            .send()
            .await
            .with_context(|| format!("GET {} failed", url))?
            .error_for_status()
            .with_context(|| format!("Non-success status {}", url))?
            .text()
            .await
            .with_context(|| format!("Reading text from {}", url))
    }

    async fn get_text_with_retry(&self, url: &Url) -> Result<String> {
        let mut attempts = 0;
        loop {
            match self.get_text_core(url).await {
                Ok(t) => return Ok(t),
                Err(e) if attempts < self.max_retries => {
                    attempts += 1;
                    let backoff = self.initial_backoff_ms * 2u64.pow(attempts - 1);
                    warn!(%url, attempt = attempts, delay_ms = backoff, error = %e, "Retrying");
                    sleep(Duration::from_millis(backoff)).await;
                }
                Err(e) => {
                    error!(%url, error = %e, "Exhausted retries");
                    return Err(e);
                }
            }
        }
    }
}

impl PayloadSource for HttpSource {
    #[instrument(level = "info", skip(self, url), fields(url = %url))]
    async fn fetch(&self, url: &Url) -> Result<Payload> {
        let body = self.get_text_with_retry(url).await?;
        debug!(bytes = body.len(), "payload received");
        Payload::from_json(&body).with_context(|| format!("decoding SDMX-JSON from {}", url))
    }
}
