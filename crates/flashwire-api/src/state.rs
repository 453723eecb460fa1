use flashwire_config::ConfigSummary;
use flashwire_pipeline::FeedProcessor;
use flashwire_proxy::ProxyService;
use std::sync::Arc;
use std::time::Instant;

/// Feature switches surfaced by the health endpoint.
#[derive(Debug, Clone)]
pub struct FeatureFlags {
    pub geotagging: bool,
    pub image_search: bool,
    pub image_download: bool,
    pub clean_text: bool,
}

/// Everything the handlers need, wired once at startup.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<Inner>,
}

struct Inner {
    processor: Arc<FeedProcessor>,
    proxy_service: Option<Arc<ProxyService>>,
    api_key: String,
    require_api_key: bool,
    features: FeatureFlags,
    config_summary: ConfigSummary,
    /// Probed by the health endpoint to certify outbound egress.
    egress_probe_url: String,
    started_at: Instant,
}

impl AppState {
    pub fn new(
        processor: Arc<FeedProcessor>,
        proxy_service: Option<Arc<ProxyService>>,
        api_key: impl Into<String>,
        require_api_key: bool,
        features: FeatureFlags,
        config_summary: ConfigSummary,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                processor,
                proxy_service,
                api_key: api_key.into(),
                require_api_key,
                features,
                config_summary,
                egress_probe_url: "https://1.1.1.1".to_string(),
                started_at: Instant::now(),
            }),
        }
    }

    /// Point the egress probe somewhere else (tests use a local server).
    pub fn with_egress_probe_url(mut self, url: impl Into<String>) -> Self {
        let inner = Arc::get_mut(&mut self.inner).expect("state not yet shared");
        inner.egress_probe_url = url.into();
        self
    }

    pub fn processor(&self) -> &Arc<FeedProcessor> {
        &self.inner.processor
    }

    pub fn proxy_service(&self) -> Option<&Arc<ProxyService>> {
        self.inner.proxy_service.as_ref()
    }

    pub fn api_key(&self) -> &str {
        &self.inner.api_key
    }

    pub fn require_api_key(&self) -> bool {
        self.inner.require_api_key
    }

    pub fn features(&self) -> &FeatureFlags {
        &self.inner.features
    }

    pub fn config_summary(&self) -> &ConfigSummary {
        &self.inner.config_summary
    }

    pub fn egress_probe_url(&self) -> &str {
        &self.inner.egress_probe_url
    }

    pub fn uptime_secs(&self) -> f64 {
        self.inner.started_at.elapsed().as_secs_f64()
    }
}
