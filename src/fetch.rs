//! Page fetching seam: the workflows only see [`ArticleFetcher`], tests
//! substitute a canned-HTML implementation.
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::Client;

#[async_trait]
pub trait ArticleFetcher: Send + Sync {
    /// Fetch a page and return its HTML body.
    async fn fetch_html(&self, url: &str) -> Result<String>;
}

/// Production fetcher backed by reqwest.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    http: Client,
}

impl HttpFetcher {
    pub fn new() -> Self {
        let http = Client::builder()
            .user_agent("pwnews-bot/0.1")
            .build()
            .expect("reqwest client");
        Self { http }
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ArticleFetcher for HttpFetcher {
    async fn fetch_html(&self, url: &str) -> Result<String> {
        let res = self
            .http
            .get(url)
            .send()
            .await
            .with_context(|| format!("failed to reach {url}"))?;
        if !res.status().is_success() {
            return Err(anyhow!("fetch of {} failed with status {}", url, res.status()));
        }
        res.text()
            .await
            .with_context(|| format!("failed to read body of {url}"))
    }
}
