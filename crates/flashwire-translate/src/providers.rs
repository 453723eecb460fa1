use crate::languages;
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Stable identifiers for the cascade members.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderId {
    Google,
    FreeApi,
    MyMemory,
}

impl ProviderId {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderId::Google => "google",
            ProviderId::FreeApi => "freeapi",
            ProviderId::MyMemory => "mymemory",
        }
    }
}

#[derive(Error, Debug)]
pub enum TranslateError {
    /// Language pair or input shape the provider cannot handle.
    /// Does not count against the provider's circuit.
    #[error("unsupported by provider: {0}")]
    Unsupported(String),

    /// Provider call failed; counts toward the circuit breaker.
    #[error("provider failure: {0}")]
    Failed(String),
}

/// One translation backend in the cascade.
#[async_trait]
pub trait TranslateBackend: Send + Sync {
    fn id(&self) -> ProviderId;

    /// Translate `text` between validated ISO-639-1 codes.
    /// Empty output is a `Failed`, never an `Ok`.
    async fn translate(&self, text: &str, source: &str, target: &str)
        -> Result<String, TranslateError>;
}

fn client(timeout: Duration) -> reqwest::Client {
    reqwest::Client::builder()
        .user_agent("flashwire/0.3")
        .timeout(timeout)
        .build()
        .expect("translation client")
}

fn non_empty(out: String, provider: ProviderId) -> Result<String, TranslateError> {
    let trimmed = out.trim().to_string();
    if trimmed.is_empty() {
        Err(TranslateError::Failed(format!(
            "{} returned empty result",
            provider.as_str()
        )))
    } else {
        Ok(trimmed)
    }
}

/// Public Google endpoint (gtx client).
pub struct GoogleBackend {
    base_url: String,
    client: reqwest::Client,
}

impl GoogleBackend {
    pub fn new(timeout: Duration) -> Self {
        Self::with_base_url("https://translate.googleapis.com", timeout)
    }

    pub fn with_base_url(base_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            base_url: base_url.into(),
            client: client(timeout),
        }
    }
}

#[async_trait]
impl TranslateBackend for GoogleBackend {
    fn id(&self) -> ProviderId {
        ProviderId::Google
    }

    async fn translate(
        &self,
        text: &str,
        source: &str,
        target: &str,
    ) -> Result<String, TranslateError> {
        if !languages::google_supports(source) || !languages::google_supports(target) {
            return Err(TranslateError::Unsupported(format!("{source}->{target}")));
        }

        let url = format!("{}/translate_a/single", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[
                ("client", "gtx"),
                ("sl", source),
                ("tl", target),
                ("dt", "t"),
                ("q", text),
            ])
            .send()
            .await
            .map_err(|e| TranslateError::Failed(e.to_string()))?
            .error_for_status()
            .map_err(|e| TranslateError::Failed(e.to_string()))?;

        let body: Value = response
            .json()
            .await
            .map_err(|e| TranslateError::Failed(e.to_string()))?;

        // Response shape: [[["translated","original",...], ...], ...]
        let segments = body
            .get(0)
            .and_then(Value::as_array)
            .ok_or_else(|| TranslateError::Failed("unexpected response shape".into()))?;
        let out: String = segments
            .iter()
            .filter_map(|seg| seg.get(0).and_then(Value::as_str))
            .collect();

        debug!(provider = "google", chars = out.len(), "Translated");
        non_empty(out, ProviderId::Google)
    }
}

/// ftapi.pythonanywhere.com free endpoint.
pub struct FreeApiBackend {
    base_url: String,
    client: reqwest::Client,
}

impl FreeApiBackend {
    pub fn new(timeout: Duration) -> Self {
        Self::with_base_url("https://ftapi.pythonanywhere.com", timeout)
    }

    pub fn with_base_url(base_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            base_url: base_url.into(),
            client: client(timeout),
        }
    }
}

#[async_trait]
impl TranslateBackend for FreeApiBackend {
    fn id(&self) -> ProviderId {
        ProviderId::FreeApi
    }

    async fn translate(
        &self,
        text: &str,
        source: &str,
        target: &str,
    ) -> Result<String, TranslateError> {
        let url = format!("{}/translate", self.base_url);
        let mut query: Vec<(&str, &str)> = vec![("dl", target), ("text", text)];
        if !source.is_empty() && source != "auto" {
            query.push(("sl", source));
        }

        let response = self
            .client
            .get(&url)
            .query(&query)
            .send()
            .await
            .map_err(|e| TranslateError::Failed(e.to_string()))?
            .error_for_status()
            .map_err(|e| TranslateError::Failed(e.to_string()))?;

        let body: Value = response
            .json()
            .await
            .map_err(|e| TranslateError::Failed(e.to_string()))?;

        let out = body
            .get("destination-text")
            .or_else(|| body.get("translated-text"))
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        non_empty(out, ProviderId::FreeApi)
    }
}

/// api.mymemory.translated.net; limited to 500-character inputs and BCP-47
/// language pairs.
pub struct MyMemoryBackend {
    base_url: String,
    client: reqwest::Client,
}

impl MyMemoryBackend {
    pub const MAX_CHARS: usize = 500;

    pub fn new(timeout: Duration) -> Self {
        Self::with_base_url("https://api.mymemory.translated.net", timeout)
    }

    pub fn with_base_url(base_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            base_url: base_url.into(),
            client: client(timeout),
        }
    }
}

#[async_trait]
impl TranslateBackend for MyMemoryBackend {
    fn id(&self) -> ProviderId {
        ProviderId::MyMemory
    }

    async fn translate(
        &self,
        text: &str,
        source: &str,
        target: &str,
    ) -> Result<String, TranslateError> {
        if text.chars().count() > Self::MAX_CHARS {
            return Err(TranslateError::Unsupported(format!(
                "input length {} over limit",
                text.chars().count()
            )));
        }

        let source_tag = languages::mymemory_tag(source)
            .ok_or_else(|| TranslateError::Unsupported(format!("source {source}")))?;
        let target_tag = languages::mymemory_tag(target)
            .ok_or_else(|| TranslateError::Unsupported(format!("target {target}")))?;

        let url = format!("{}/get", self.base_url);
        let langpair = format!("{source_tag}|{target_tag}");
        let response = self
            .client
            .get(&url)
            .query(&[("q", text), ("langpair", &langpair)])
            .send()
            .await
            .map_err(|e| TranslateError::Failed(e.to_string()))?
            .error_for_status()
            .map_err(|e| TranslateError::Failed(e.to_string()))?;

        let body: Value = response
            .json()
            .await
            .map_err(|e| TranslateError::Failed(e.to_string()))?;

        let out = body
            .pointer("/responseData/translatedText")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        non_empty(out, ProviderId::MyMemory)
    }
}
