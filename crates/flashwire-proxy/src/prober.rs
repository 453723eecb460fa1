use async_trait::async_trait;
use std::time::Duration;
use tracing::trace;

/// Liveness check for one candidate proxy.
#[async_trait]
pub trait ProxyProber: Send + Sync {
    /// Returns true when the proxy relays an HTTPS request successfully.
    async fn probe(&self, proxy: &str) -> bool;
}

/// Probes by issuing an HTTPS GET through the candidate proxy.
pub struct HttpProber {
    probe_url: String,
    timeout: Duration,
}

impl HttpProber {
    pub fn new(probe_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            probe_url: probe_url.into(),
            timeout,
        }
    }
}

impl Default for HttpProber {
    fn default() -> Self {
        Self::new("https://httpbin.org/ip", Duration::from_secs(5))
    }
}

#[async_trait]
impl ProxyProber for HttpProber {
    async fn probe(&self, proxy: &str) -> bool {
        let proxy_url = format!("http://{proxy}");
        let client = match reqwest::Proxy::all(&proxy_url)
            .map_err(anyhow::Error::from)
            .and_then(|p| {
                reqwest::Client::builder()
                    .proxy(p)
                    .timeout(self.timeout)
                    .build()
                    .map_err(anyhow::Error::from)
            }) {
            Ok(client) => client,
            Err(err) => {
                trace!(proxy = %proxy, error = %err, "Could not build probe client");
                return false;
            }
        };

        match client.get(&self.probe_url).send().await {
            Ok(response) => response.status().is_success(),
            Err(err) => {
                trace!(proxy = %proxy, error = %err, "Proxy probe failed");
                false
            }
        }
    }
}
