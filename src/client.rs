//! HTTP access behind a trait seam.
//!
//! [`RemoteSource`] is the one boundary every upstream request crosses, so
//! tests can substitute canned responses without a network. The real
//! implementation is a thin `reqwest` wrapper.

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::time::Duration;

use crate::config::HttpConfig;

/// Response from an upstream GET: status plus raw body bytes.
#[derive(Debug, Clone)]
pub struct RemoteResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl RemoteResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Body as text, lossily decoded.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Anything that can GET a URL. Errors mean transport failure; HTTP-level
/// failures come back as a [`RemoteResponse`] with a non-2xx status.
#[async_trait]
pub trait RemoteSource: Send + Sync {
    async fn get(&self, url: &str) -> Result<RemoteResponse>;
}

/// `reqwest`-backed [`RemoteSource`].
pub struct HttpSource {
    client: reqwest::Client,
}

impl HttpSource {
    pub fn new(config: &HttpConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self { client })
    }
}

#[async_trait]
impl RemoteSource for HttpSource {
    async fn get(&self, url: &str) -> Result<RemoteResponse> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .with_context(|| format!("GET {} failed", url))?;

        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .with_context(|| format!("Failed to read body from {}", url))?
            .to_vec();

        Ok(RemoteResponse { status, body })
    }
}
