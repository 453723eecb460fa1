//! Two-stage content extraction with field-wise merge.

use crate::article::{self, ArticleData};
use crate::cleaner;
use crate::headless::PageRenderer;
use crate::stealth;
use anyhow::{anyhow, Result};
use chrono::Utc;
use flashwire_proxy::ProxyPool;
use flashwire_types::{EnrichError, EnrichResult, ExtractResult};
use flashwire_utils::{retry, text};
use rand::seq::SliceRandom;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Extraction thresholds and timeouts.
#[derive(Debug, Clone)]
pub struct ExtractorConfig {
    /// Direct-fetch timeout.
    pub request_timeout: Duration,
    /// Minimum word count for the primary stage to win outright.
    pub primary_min_words: usize,
    /// Minimum word count accepted from the proxy-retried fallback.
    pub fallback_min_words: usize,
    /// Fallback retry attempts (backoff 1, 2, 4 s).
    pub retry_attempts: u32,
    pub retry_initial_delay: Duration,
    /// Run the content cleaner over extracted text.
    pub clean_text: bool,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(30),
            primary_min_words: 1000,
            fallback_min_words: 2000,
            retry_attempts: 3,
            retry_initial_delay: Duration::from_secs(1),
            clean_text: true,
        }
    }
}

/// Per-URL scraping seam the pipeline depends on.
#[async_trait::async_trait]
pub trait Scraper: Send + Sync {
    async fn extract(&self, url: &str) -> EnrichResult<ExtractResult>;
}

#[async_trait::async_trait]
impl Scraper for ContentExtractor {
    async fn extract(&self, url: &str) -> EnrichResult<ExtractResult> {
        ContentExtractor::extract(self, url).await
    }
}

/// Resilient per-URL extractor: direct HTTP first, headless render second,
/// complementary fields merged.
pub struct ContentExtractor {
    config: ExtractorConfig,
    proxies: Arc<dyn ProxyPool>,
    renderer: Arc<dyn PageRenderer>,
}

impl ContentExtractor {
    pub fn new(
        config: ExtractorConfig,
        proxies: Arc<dyn ProxyPool>,
        renderer: Arc<dyn PageRenderer>,
    ) -> Self {
        Self {
            config,
            proxies,
            renderer,
        }
    }

    /// Produce a populated [`ExtractResult`] for `url`, or a scraping error
    /// when both stages fail.
    pub async fn extract(&self, url: &str) -> EnrichResult<ExtractResult> {
        // Redirector links (news aggregators) resolve to the publisher URL
        // before any scraping attempt.
        let url = crate::urls::normalize_url(url).await;
        let url = url.as_str();

        let proxies = self.proxies.snapshot().await;
        if proxies.is_empty() {
            warn!(url = %url, "Proxy cache empty, scraping directly");
        }

        // Stage 1: direct fetch. Kept for the merge even when the word gate
        // rejects it.
        let primary = match self.primary_stage(url, &proxies).await {
            Ok(result) => {
                if result.word_count > self.config.primary_min_words {
                    info!(url = %url, words = result.word_count, "Primary extraction succeeded");
                    return Ok(result);
                }
                debug!(
                    url = %url,
                    words = result.word_count,
                    "Primary extraction below word gate, falling back"
                );
                Some(result)
            }
            Err(err) => {
                warn!(url = %url, error = %err, "Primary extraction failed");
                None
            }
        };

        // Stage 2: headless render, then once more with proxy rotation and
        // exponential backoff.
        let fallback = match self.fallback_stage(url, &proxies).await {
            Ok(result) => result,
            Err(err) => {
                return Err(EnrichError::scraping(
                    url,
                    format!("both extraction stages failed: {err}"),
                ));
            }
        };

        Ok(self.merge(primary, fallback))
    }

    async fn primary_stage(&self, url: &str, proxies: &[String]) -> Result<ExtractResult> {
        let html = self.fetch_direct(url, proxies).await?;
        let data = article::extract_article(&html, url);
        if data.text.trim().is_empty() {
            return Err(anyhow!("no article text extracted"));
        }
        Ok(self.into_result(url, data))
    }

    async fn fetch_direct(&self, url: &str, proxies: &[String]) -> Result<String> {
        let mut builder = reqwest::Client::builder()
            .user_agent(stealth::random_user_agent())
            .timeout(self.config.request_timeout);
        if let Some(proxy) = proxies.choose(&mut rand::thread_rng()) {
            builder = builder.proxy(reqwest::Proxy::all(format!("http://{proxy}"))?);
        }
        let client = builder.build()?;

        let response = client.get(url).send().await?.error_for_status()?;
        Ok(response.text().await?)
    }

    async fn fallback_stage(&self, url: &str, proxies: &[String]) -> Result<ExtractResult> {
        // Quick render without a proxy first. Its output goes through the
        // same word gate as the retried attempt; a thin render is never
        // accepted just because it came back first.
        match self.render_and_extract(url, None).await {
            Ok(result) if result.word_count >= self.config.fallback_min_words => {
                return Ok(result);
            }
            Ok(result) => debug!(
                url = %url,
                words = result.word_count,
                "Quick render below word gate, retrying with proxy"
            ),
            Err(err) => debug!(url = %url, error = %err, "Quick render failed"),
        }

        // Proxy-rotated retries with exponential backoff.
        let result = retry::with_backoff(
            "headless_render",
            self.config.retry_attempts,
            self.config.retry_initial_delay,
            || {
                let proxy = proxies
                    .choose(&mut rand::thread_rng())
                    .map(String::as_str);
                self.render_and_extract(url, proxy)
            },
        )
        .await?;

        if result.word_count < self.config.fallback_min_words {
            return Err(anyhow!(
                "fallback produced only {} words (minimum {})",
                result.word_count,
                self.config.fallback_min_words
            ));
        }
        Ok(result)
    }

    async fn render_and_extract(&self, url: &str, proxy: Option<&str>) -> Result<ExtractResult> {
        let html = self.renderer.render(url, proxy).await?;
        let data = article::extract_article(&html, url);
        if data.text.trim().is_empty() {
            return Err(anyhow!("rendered page yielded no article text"));
        }
        Ok(self.into_result(url, data))
    }

    fn into_result(&self, url: &str, data: ArticleData) -> ExtractResult {
        let content = if self.config.clean_text {
            cleaner::clean_content(&data.text)
        } else {
            data.text.clone()
        };
        let word_count = if content == cleaner::ERROR_SENTINEL {
            0
        } else {
            text::word_count(&content)
        };

        let mut images = Vec::new();
        if !data.main_image.is_empty() {
            images.push(data.main_image.clone());
        }

        ExtractResult {
            url: url.to_string(),
            title: data.title,
            author: data.author,
            published_date: data.published_date,
            content,
            images,
            hostname: data.hostname,
            scraped_at: Utc::now().to_rfc3339(),
            word_count,
            ..Default::default()
        }
    }

    /// Fill the fallback's empty fields from the primary stage.
    fn merge(&self, primary: Option<ExtractResult>, mut fallback: ExtractResult) -> ExtractResult {
        if let Some(primary) = primary {
            if fallback.author.is_empty() && !primary.author.is_empty() {
                fallback.author = primary.author;
            }
            if fallback.published_date.is_empty() && !primary.published_date.is_empty() {
                fallback.published_date = primary.published_date;
            }
            if fallback.images.is_empty() && !primary.images.is_empty() {
                fallback.images = primary.images;
            }
            if fallback.content.is_empty() && !primary.content.is_empty() {
                fallback.content = primary.content;
                fallback.word_count = primary.word_count;
            }
            if fallback.scraped_at.is_empty() && !primary.scraped_at.is_empty() {
                fallback.scraped_at = primary.scraped_at;
            }
        }
        fallback
    }
}
