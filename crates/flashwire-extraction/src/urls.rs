//! Feed-URL normalization.
//!
//! Aggregator feeds frequently carry redirector links instead of publisher
//! URLs. Known redirectors (Google News RSS) are resolved to their final
//! target before scraping; consent interstitials are unwrapped via their
//! `continue` parameter. Resolution is best effort: any failure returns the
//! URL unchanged.

use crate::stealth;
use once_cell::sync::Lazy;
use regex::Regex;
use std::time::Duration;
use tracing::debug;
use url::Url;

static GOOGLE_NEWS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^https?://news\.google\.com/rss/articles/").expect("regex"));

const RESOLVE_TIMEOUT: Duration = Duration::from_secs(6);

fn is_safe_url(url: &str) -> bool {
    Url::parse(url)
        .map(|u| matches!(u.scheme(), "http" | "https") && u.host_str().is_some())
        .unwrap_or(false)
}

/// Pull the target out of a consent interstitial
/// (`…/consent?continue=<encoded-url>`), or return the input unchanged.
pub fn extract_continue_param(url: &str) -> String {
    let Ok(parsed) = Url::parse(url) else {
        return url.to_string();
    };
    parsed
        .query_pairs()
        .find(|(key, _)| key == "continue")
        .map(|(_, value)| value.into_owned())
        .unwrap_or_else(|| url.to_string())
}

/// Follow redirects with a browser-like UA and return the final URL,
/// unwrapping consent interstitials along the way.
async fn resolve_redirects(url: &str) -> String {
    let client = match reqwest::Client::builder()
        .user_agent(stealth::random_user_agent())
        .timeout(RESOLVE_TIMEOUT)
        .build()
    {
        Ok(client) => client,
        Err(_) => return url.to_string(),
    };

    // HEAD is cheaper but not universally allowed; fall back to GET.
    let landed = match client.head(url).send().await {
        Ok(response) => response.url().to_string(),
        Err(_) => match client.get(url).send().await {
            Ok(response) => response.url().to_string(),
            Err(_) => return url.to_string(),
        },
    };

    let unwrapped = extract_continue_param(&landed);
    if is_safe_url(&unwrapped) {
        debug!(from = %url, to = %unwrapped, "Resolved redirector URL");
        unwrapped
    } else {
        url.to_string()
    }
}

/// Entry point for all URL normalization. Non-redirector URLs come back
/// unchanged without any network traffic.
pub async fn normalize_url(url: &str) -> String {
    if !is_safe_url(url) {
        return url.to_string();
    }
    if GOOGLE_NEWS.is_match(url) {
        return resolve_redirects(url).await;
    }
    url.to_string()
}
