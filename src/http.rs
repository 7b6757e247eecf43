//! HTTP client for the API source
//!
//! A thin wrapper over `reqwest`: timeout, JSON decode, and non-2xx status
//! mapped to an error carrying the URL. Retry/backoff is deliberately absent;
//! the external scheduler owns retries.

use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use crate::error::{Error, Result};

/// Default request timeout
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTP client for fetching JSON collections
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    /// Create a client with the default timeout
    pub fn new() -> Self {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    /// Create a client with a custom timeout
    pub fn with_timeout(timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("cartflow/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_default();
        Self { client }
    }

    /// GET a URL and decode the body as JSON.
    ///
    /// Any non-2xx status is an error; the pipeline never continues past a
    /// failed source request.
    pub async fn get_json(&self, url: &str) -> Result<Value> {
        debug!(url, "GET");
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::http_status(status.as_u16(), url));
        }
        let body = response.json::<Value>().await?;
        Ok(body)
    }
}

impl Default for HttpClient {
    fn default() -> Self {
        Self::new()
    }
}
