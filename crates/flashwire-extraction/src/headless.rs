//! Headless-browser rendering for pages the direct fetch cannot read.
//!
//! One short-lived stealth browser session per render: navigate, dismiss
//! cookie banners and overlays, poll a readiness predicate (content landmark
//! present and the DOM quiet, or enough text/paragraph density), then hand
//! the settled HTML back to the article extractor.

use crate::stealth;
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use futures::StreamExt;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Readiness predicate evaluated in the page. A landmark plus a quiet DOM
/// (no mutations for 1000 ms) wins; otherwise body text >= 300 chars or
/// >= 2 paragraphs plus the same quiet window.
const READY_PREDICATE: &str = r#"(() => {
  if (!window.__fw) {
    window.__fw = { lastMut: performance.now(), stableMs: 1000, textMin: 300, pMin: 2 };
    const obs = new MutationObserver(() => { window.__fw.lastMut = performance.now(); });
    obs.observe(document, {subtree: true, childList: true, characterData: true, attributes: true});
  }
  if (document.readyState === 'loading' || !document.body) return false;
  const quiet = performance.now() - window.__fw.lastMut > window.__fw.stableMs;
  const landmark = document.querySelector(
    "main, article, [role=main], .article, .article-body, [itemprop='articleBody']");
  if (landmark) return quiet;
  const textLen = (document.body.textContent || '').trim().length;
  const pCount = document.getElementsByTagName('p').length;
  return quiet && (textLen >= window.__fw.textMin || pCount >= window.__fw.pMin);
})()"#;

/// Click common consent buttons, then remove banner/overlay elements and
/// unlock scrolling.
const DISMISS_OVERLAYS: &str = r#"(() => {
  const clickFirst = (sel) => { const el = document.querySelector(sel); if (el) el.click(); };
  clickFirst('#onetrust-accept-btn-handler, .onetrust-accept-btn-handler');
  clickFirst('.qc-cmp2-accept-all, .qc-cmp2-summary-buttons .qc-cmp2-accept-all');
  clickFirst('.accept, .accept-all, [data-testid*="accept"]');
  const btns = Array.from(document.querySelectorAll('button, [role="button"]'));
  const accept = btns.find(b => /accept/i.test(b.textContent || ''));
  if (accept) accept.click();
  const rm = (sel) => document.querySelectorAll(sel).forEach(el => el.remove());
  rm('#onetrust-banner-sdk, .onetrust-pc-dark-filter, .qc-cmp2-container, .qc-cmp2-ui, ' +
     '.consent-banner, [id*="cookie"], [class*="cookie"], .backdrop, .modal, .overlay');
  [document.documentElement, document.body].forEach(el => {
    if (!el) return;
    el.style.overflow = 'visible';
    el.style.position = 'static';
    el.classList.remove('modal-open', 'scroll-locked');
  });
})()"#;

/// Renders a URL to settled HTML. The extractor depends on this seam so
/// tests can render from canned fixtures.
#[async_trait]
pub trait PageRenderer: Send + Sync {
    async fn render(&self, url: &str, proxy: Option<&str>) -> Result<String>;
}

/// Renderer tuning.
#[derive(Debug, Clone)]
pub struct RendererConfig {
    /// Hard ceiling for one render, navigation included.
    pub page_timeout: Duration,
    /// Ceiling for the readiness polling loop.
    pub ready_timeout: Duration,
    /// Readiness poll cadence.
    pub poll_interval: Duration,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            page_timeout: Duration::from_secs(100),
            ready_timeout: Duration::from_secs(60),
            poll_interval: Duration::from_millis(500),
        }
    }
}

/// Chromium-backed renderer with a stealth launch profile.
pub struct HeadlessRenderer {
    config: RendererConfig,
}

impl HeadlessRenderer {
    pub fn new(config: RendererConfig) -> Self {
        Self { config }
    }

    async fn render_inner(&self, url: &str, proxy: Option<&str>) -> Result<String> {
        let mut args = stealth::stealth_launch_args();
        if let Some(proxy) = proxy {
            args.push(format!("--proxy-server=http://{proxy}"));
        }

        let browser_config = BrowserConfig::builder()
            .args(args.iter().map(String::as_str).collect::<Vec<_>>())
            .build()
            .map_err(|e| anyhow!("browser config: {e}"))?;

        let (mut browser, mut handler) = Browser::launch(browser_config)
            .await
            .context("launching headless browser")?;
        let handler_task = tokio::spawn(async move { while handler.next().await.is_some() {} });

        let render = async {
            let page = browser.new_page("about:blank").await.context("new page")?;
            page.goto(url).await.context("navigation")?;

            if let Err(err) = page.evaluate(DISMISS_OVERLAYS).await {
                debug!(error = %err, "Overlay dismissal script failed");
            }

            let deadline = Instant::now() + self.config.ready_timeout;
            loop {
                let ready = page
                    .evaluate(READY_PREDICATE)
                    .await
                    .ok()
                    .and_then(|result| result.into_value::<bool>().ok())
                    .unwrap_or(false);
                if ready {
                    break;
                }
                if Instant::now() >= deadline {
                    warn!(url = %url, "Readiness predicate never fired, using current DOM");
                    break;
                }
                tokio::time::sleep(self.config.poll_interval).await;
            }

            page.content().await.context("reading page content")
        };

        let html = tokio::time::timeout(self.config.page_timeout, render)
            .await
            .unwrap_or_else(|_| Err(anyhow!("headless render timed out for {url}")));

        if let Err(err) = browser.close().await {
            debug!(error = %err, "Browser close failed");
        }
        handler_task.abort();

        html
    }
}

#[async_trait]
impl PageRenderer for HeadlessRenderer {
    async fn render(&self, url: &str, proxy: Option<&str>) -> Result<String> {
        debug!(url = %url, proxy = ?proxy, "Starting headless render");
        self.render_inner(url, proxy).await
    }
}
