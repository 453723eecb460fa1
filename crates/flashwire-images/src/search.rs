use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

/// One image search hit with the dimensions the quality filter needs.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageHit {
    pub url: String,
    pub width: u32,
    pub height: u32,
}

/// Image search backend: `search(query, region) -> hits`.
#[async_trait]
pub trait ImageSearch: Send + Sync {
    async fn search(
        &self,
        query: &str,
        region: &str,
        proxy: Option<&str>,
    ) -> Result<Vec<ImageHit>>;
}

static VQD_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"vqd=['"]?([\d-]+)['"]?"#).expect("regex"));

#[derive(Debug, Deserialize)]
struct DdgResults {
    #[serde(default)]
    results: Vec<DdgHit>,
}

#[derive(Debug, Deserialize)]
struct DdgHit {
    #[serde(default)]
    image: String,
    #[serde(default)]
    width: u32,
    #[serde(default)]
    height: u32,
}

/// DuckDuckGo images backend. Each call fetches a request token from the
/// HTML front page, then queries the JSON endpoint with the given region.
pub struct DuckDuckGoImages {
    base_url: String,
    timeout: Duration,
}

impl DuckDuckGoImages {
    pub fn new() -> Self {
        Self::with_base_url("https://duckduckgo.com")
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: Duration::from_secs(20),
        }
    }

    fn client(&self, proxy: Option<&str>) -> Result<reqwest::Client> {
        let mut builder = reqwest::Client::builder()
            .user_agent(
                "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                 (KHTML, like Gecko) Chrome/126.0.0.0 Safari/537.36",
            )
            .timeout(self.timeout);
        if let Some(proxy) = proxy {
            builder = builder.proxy(reqwest::Proxy::all(format!("http://{proxy}"))?);
        }
        Ok(builder.build()?)
    }

    async fn fetch_token(&self, client: &reqwest::Client, query: &str) -> Result<String> {
        let response = client
            .get(format!("{}/", self.base_url))
            .query(&[("q", query), ("iax", "images"), ("ia", "images")])
            .send()
            .await
            .context("token page")?
            .error_for_status()
            .context("token status")?;
        let html = response.text().await.context("token body")?;
        VQD_TOKEN
            .captures(&html)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
            .ok_or_else(|| anyhow!("no request token in search page"))
    }
}

impl Default for DuckDuckGoImages {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ImageSearch for DuckDuckGoImages {
    async fn search(
        &self,
        query: &str,
        region: &str,
        proxy: Option<&str>,
    ) -> Result<Vec<ImageHit>> {
        if query.trim().is_empty() {
            return Err(anyhow!("search query cannot be empty"));
        }

        let client = self.client(proxy)?;
        let token = self.fetch_token(&client, query).await?;

        let response = client
            .get(format!("{}/i.js", self.base_url))
            .query(&[
                ("l", region),
                ("o", "json"),
                ("q", query),
                ("vqd", &token),
                ("f", ",,,"),
                ("p", "1"),
            ])
            .send()
            .await
            .context("image search request")?
            .error_for_status()
            .context("image search status")?;

        let listing: DdgResults = response.json().await.context("image search body")?;
        debug!(query = %query, region = %region, hits = listing.results.len(), "Image search done");

        Ok(listing
            .results
            .into_iter()
            .filter(|hit| !hit.image.is_empty())
            .map(|hit| ImageHit {
                url: hit.image,
                width: hit.width,
                height: hit.height,
            })
            .collect())
    }
}
