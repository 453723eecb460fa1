use crate::prober::{HttpProber, ProxyProber};
use chrono::{DateTime, Utc};
use flashwire_types::{EnrichError, EnrichResult};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex, Semaphore};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Configuration for the proxy provider endpoints.
#[derive(Debug, Clone)]
pub struct ProxyConfig {
    pub base_url: String,
    pub api_key: String,
    pub start_endpoint: String,
    pub proxies_endpoint: String,
    /// Concurrent liveness probes.
    pub validate_concurrency: usize,
    /// Background refresh cadence.
    pub refresh_interval: Duration,
}

impl ProxyConfig {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            start_endpoint: "/proxy/start".to_string(),
            proxies_endpoint: "/proxy/list".to_string(),
            validate_concurrency: 10,
            refresh_interval: Duration::from_secs(180),
        }
    }
}

/// Wire shape of the provider's proxy listing.
#[derive(Debug, Deserialize)]
struct ProxyListResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    data: Vec<String>,
    #[serde(default)]
    message: String,
}

#[derive(Debug, Default)]
struct ProxyCache {
    proxies: Vec<String>,
    updated_at: Option<DateTime<Utc>>,
}

/// Configuration readiness report for the control plane.
#[derive(Debug, Clone, Serialize)]
pub struct ProxyStats {
    pub base_url: String,
    pub start_endpoint: String,
    pub proxies_endpoint: String,
    pub api_key_configured: bool,
    pub cached_proxies: usize,
    pub updated_at: Option<DateTime<Utc>>,
    pub refresher_running: bool,
}

/// Process-lifetime proxy pool service.
///
/// The cache is a single shared list behind a mutex; readers snapshot it,
/// and the refresher holds the lock only for the swap.
pub struct ProxyService {
    config: ProxyConfig,
    client: reqwest::Client,
    prober: Arc<dyn ProxyProber>,
    cache: Mutex<ProxyCache>,
    refresher: Mutex<Option<(watch::Sender<bool>, JoinHandle<()>)>>,
}

impl ProxyService {
    pub fn new(config: ProxyConfig) -> EnrichResult<Arc<Self>> {
        Self::with_prober(config, Arc::new(HttpProber::default()))
    }

    pub fn with_prober(config: ProxyConfig, prober: Arc<dyn ProxyProber>) -> EnrichResult<Arc<Self>> {
        let client = reqwest::Client::builder()
            .user_agent("flashwire/0.3")
            .timeout(Duration::from_secs(300))
            .build()
            .map_err(|e| EnrichError::internal(format!("proxy client: {e}")))?;

        if config.api_key.is_empty() {
            warn!("Proxy API key not configured, proxy operations may fail");
        }

        Ok(Arc::new(Self {
            config,
            client,
            prober,
            cache: Mutex::new(ProxyCache::default()),
            refresher: Mutex::new(None),
        }))
    }

    /// Current cache snapshot; fetches synchronously when empty or forced.
    pub async fn get(&self, force_refresh: bool) -> Vec<String> {
        {
            let cache = self.cache.lock().await;
            if !cache.proxies.is_empty() && !force_refresh {
                return cache.proxies.clone();
            }
        }

        match self.fetch_validated().await {
            Ok(proxies) => {
                self.swap_cache(proxies.clone()).await;
                proxies
            }
            Err(err) => {
                error!(error = %err, "Proxy fetch failed, serving stale cache");
                self.cache.lock().await.proxies.clone()
            }
        }
    }

    /// Warm the upstream provider, then start the background refresher.
    pub async fn ping_start(self: &Arc<Self>) -> EnrichResult<()> {
        let url = format!("{}{}", self.config.base_url, self.config.start_endpoint);
        info!(url = %url, "Starting proxy warm-up");

        let response = self
            .client
            .post(&url)
            .headers(self.auth_headers())
            .timeout(Duration::from_secs(30))
            .send()
            .await
            .map_err(|e| EnrichError::network(format!("proxy start: {e}")))?;

        match response.status().as_u16() {
            200 => {
                info!("Proxy warm-up accepted");
                self.start_background_refresh(self.config.refresh_interval)
                    .await;
                Ok(())
            }
            401 => Err(EnrichError::auth("invalid proxy API key")),
            429 => Err(EnrichError::rate_limited("proxy provider throttled start")),
            status => {
                let body = response.text().await.unwrap_or_default();
                Err(EnrichError::network(format!(
                    "proxy start failed with status {status}: {body}"
                )))
            }
        }
    }

    /// Spawn the refresher loop. Idempotent: a running refresher is kept.
    pub async fn start_background_refresh(self: &Arc<Self>, interval: Duration) {
        let mut guard = self.refresher.lock().await;
        if let Some((_, handle)) = guard.as_ref() {
            if !handle.is_finished() {
                debug!("Proxy refresher already running");
                return;
            }
        }

        info!(interval_secs = interval.as_secs(), "Starting proxy refresher");
        let (stop_tx, mut stop_rx) = watch::channel(false);
        let service = Arc::clone(self);
        let handle = tokio::spawn(async move {
            loop {
                match service.fetch_validated().await {
                    Ok(proxies) if !proxies.is_empty() => {
                        service.swap_cache(proxies).await;
                        debug!("Proxy cache refreshed in background");
                    }
                    Ok(_) => warn!("Background refresh returned no proxies, keeping cache"),
                    Err(err) => error!(error = %err, "Background proxy refresh failed"),
                }

                tokio::select! {
                    _ = tokio::time::sleep(interval) => {}
                    _ = stop_rx.changed() => {
                        info!("Proxy refresher stopping");
                        return;
                    }
                }
            }
        });

        *guard = Some((stop_tx, handle));
    }

    /// Cooperative stop; waits for the loop to exit.
    pub async fn stop_refresher(&self) {
        let taken = self.refresher.lock().await.take();
        if let Some((stop_tx, handle)) = taken {
            let _ = stop_tx.send(true);
            let _ = handle.await;
            info!("Proxy refresher stopped");
        }
    }

    pub async fn health_check(&self) -> bool {
        match self.fetch_validated().await {
            Ok(proxies) => !proxies.is_empty(),
            Err(err) => {
                warn!(error = %err, "Proxy health check failed");
                false
            }
        }
    }

    pub async fn stats(&self) -> ProxyStats {
        let cache = self.cache.lock().await;
        let refresher_running = self
            .refresher
            .lock()
            .await
            .as_ref()
            .map(|(_, handle)| !handle.is_finished())
            .unwrap_or(false);
        ProxyStats {
            base_url: self.config.base_url.clone(),
            start_endpoint: self.config.start_endpoint.clone(),
            proxies_endpoint: self.config.proxies_endpoint.clone(),
            api_key_configured: !self.config.api_key.is_empty(),
            cached_proxies: cache.proxies.len(),
            updated_at: cache.updated_at,
            refresher_running,
        }
    }

    async fn swap_cache(&self, proxies: Vec<String>) {
        let mut cache = self.cache.lock().await;
        cache.proxies = proxies;
        cache.updated_at = Some(Utc::now());
    }

    /// Fetch and validate; retries once after 2 s when the validated set is
    /// empty. An empty final result is not an error.
    async fn fetch_validated(&self) -> EnrichResult<Vec<String>> {
        let proxies = self.fetch_once(1).await?;
        if !proxies.is_empty() {
            return Ok(proxies);
        }

        warn!("No valid proxies found, retrying once after 2s");
        tokio::time::sleep(Duration::from_secs(2)).await;
        let proxies = self.fetch_once(2).await?;
        if proxies.is_empty() {
            error!("Retry produced no proxies");
        } else {
            info!(count = proxies.len(), "Retry succeeded");
        }
        Ok(proxies)
    }

    async fn fetch_once(&self, attempt: u32) -> EnrichResult<Vec<String>> {
        if self.config.api_key.is_empty() {
            return Err(EnrichError::auth("proxy API key not configured"));
        }

        let url = format!("{}{}", self.config.base_url, self.config.proxies_endpoint);
        debug!(url = %url, attempt, "Retrieving proxy list");

        let response = self
            .client
            .get(&url)
            .headers(self.auth_headers())
            .send()
            .await
            .map_err(|e| EnrichError::network(format!("proxy list: {e}")))?;

        match response.status().as_u16() {
            200 => {}
            401 => return Err(EnrichError::auth("invalid proxy API key")),
            429 => return Err(EnrichError::rate_limited("proxy provider throttled list")),
            status => {
                let body = response.text().await.unwrap_or_default();
                return Err(EnrichError::network(format!(
                    "proxy retrieval failed: {status} {body}"
                )));
            }
        }

        let listing: ProxyListResponse = response
            .json()
            .await
            .map_err(|e| EnrichError::network(format!("proxy list body: {e}")))?;

        if !listing.success {
            return Err(EnrichError::network(format!(
                "proxy provider error: {}",
                listing.message
            )));
        }

        if listing.data.is_empty() {
            warn!("Provider returned zero proxies");
            return Ok(Vec::new());
        }

        info!(count = listing.data.len(), message = %listing.message, "Retrieved proxies");
        Ok(self.validate(listing.data).await)
    }

    /// Probe candidates with bounded parallelism; keep only live ones.
    async fn validate(&self, candidates: Vec<String>) -> Vec<String> {
        let total = candidates.len();
        let semaphore = Arc::new(Semaphore::new(self.config.validate_concurrency.max(1)));

        let checks = candidates.into_iter().map(|proxy| {
            let semaphore = Arc::clone(&semaphore);
            let prober = Arc::clone(&self.prober);
            async move {
                let _permit = semaphore.acquire_owned().await.ok()?;
                prober.probe(&proxy).await.then_some(proxy)
            }
        });

        let valid: Vec<String> = join_all(checks).await.into_iter().flatten().collect();
        info!(valid = valid.len(), total, "Validated proxies");
        valid
    }

    fn auth_headers(&self) -> reqwest::header::HeaderMap {
        let mut headers = reqwest::header::HeaderMap::new();
        if let Ok(value) = reqwest::header::HeaderValue::from_str(&self.config.api_key) {
            headers.insert("X-API-Key", value);
        }
        headers.insert(
            reqwest::header::CONTENT_TYPE,
            reqwest::header::HeaderValue::from_static("application/json"),
        );
        headers
    }
}
