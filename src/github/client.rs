use async_trait::async_trait;
use reqwest::header::{ACCEPT, AUTHORIZATION, LINK, USER_AGENT};
use reqwest::Client;
use std::time::Duration;

use crate::error::{Error, Result};

pub const DEFAULT_API_BASE: &str = "https://api.github.com";
const ACCEPT_V3: &str = "application/vnd.github.v3+json";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// One raw HTTP response: status, the `Link` header if any, and the body.
#[derive(Debug, Clone)]
pub struct RawPage {
    pub status: u16,
    pub link: Option<String>,
    pub body: String,
}

/// A GET operation. Status classification is left to the caller.
#[async_trait]
pub trait HttpGet: Send + Sync {
    async fn get(&self, url: &str) -> Result<RawPage>;
}

/// Authenticated transport for the GitHub REST API.
pub struct GitHubClient {
    client: Client,
    token: String,
    api_base: String,
}

impl GitHubClient {
    pub fn new(token: impl Into<String>, api_base: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .map_err(|e| Error::Config(format!("cannot build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            token: token.into(),
            api_base: api_base.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn api_base(&self) -> &str {
        &self.api_base
    }
}

#[async_trait]
impl HttpGet for GitHubClient {
    async fn get(&self, url: &str) -> Result<RawPage> {
        let response = self
            .client
            .get(url)
            .header(AUTHORIZATION, format!("token {}", self.token))
            .header(ACCEPT, ACCEPT_V3)
            .header(USER_AGENT, concat!("repo-digest/", env!("CARGO_PKG_VERSION")))
            .send()
            .await
            .map_err(|e| Error::transport(url, e))?;

        let status = response.status().as_u16();
        let link = response
            .headers()
            .get(LINK)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response.text().await.map_err(|e| Error::transport(url, e))?;

        Ok(RawPage { status, link, body })
    }
}
