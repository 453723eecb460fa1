use crate::service::ProxyService;
use async_trait::async_trait;

/// Read side of the proxy cache. Consumers that only draw proxies depend on
/// this seam instead of the full service.
#[async_trait]
pub trait ProxyPool: Send + Sync {
    /// Snapshot of the current `host:port` list; may be empty.
    async fn snapshot(&self) -> Vec<String>;
}

#[async_trait]
impl ProxyPool for ProxyService {
    async fn snapshot(&self) -> Vec<String> {
        self.get(false).await
    }
}

/// Fixed proxy list; used by tests and local runs without a provider.
#[derive(Debug, Clone, Default)]
pub struct StaticPool {
    proxies: Vec<String>,
}

impl StaticPool {
    pub fn new(proxies: Vec<String>) -> Self {
        Self { proxies }
    }

    pub fn empty() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProxyPool for StaticPool {
    async fn snapshot(&self) -> Vec<String> {
        self.proxies.clone()
    }
}
