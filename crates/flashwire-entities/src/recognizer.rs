use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

/// One span emitted by the recognizer, before label remapping.
#[derive(Debug, Clone, PartialEq)]
pub struct RecognizedSpan {
    /// Model label (`PER`, `ORG`, `LOC`).
    pub label: String,
    pub text: String,
    pub score: f64,
}

/// Black-box token-classification model: `extract(text) -> spans`.
#[async_trait]
pub trait EntityRecognizer: Send + Sync {
    async fn extract(&self, text: &str) -> Result<Vec<RecognizedSpan>>;

    /// Identifier recorded in bundle metadata.
    fn model_id(&self) -> &str;
}

#[derive(Debug, Deserialize)]
struct WireSpan {
    #[serde(default)]
    entity_group: Option<String>,
    #[serde(default)]
    entity: Option<String>,
    #[serde(default)]
    word: String,
    #[serde(default)]
    score: f64,
}

/// HTTP client for a hosted token-classification endpoint speaking the
/// standard inference protocol (`{"inputs": text}` in, span array out).
pub struct HttpNerClient {
    endpoint: String,
    api_key: String,
    model_id: String,
    client: reqwest::Client,
}

impl HttpNerClient {
    pub const DEFAULT_MODEL: &'static str = "Davlan/distilbert-base-multilingual-cased-ner-hrl";

    pub fn new(endpoint: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            model_id: Self::DEFAULT_MODEL.to_string(),
            client: reqwest::Client::builder()
                .user_agent("flashwire/0.3")
                .timeout(Duration::from_secs(60))
                .build()
                .expect("ner client"),
        }
    }

    pub fn with_model_id(mut self, model_id: impl Into<String>) -> Self {
        self.model_id = model_id.into();
        self
    }
}

#[async_trait]
impl EntityRecognizer for HttpNerClient {
    async fn extract(&self, text: &str) -> Result<Vec<RecognizedSpan>> {
        let mut request = self
            .client
            .post(&self.endpoint)
            .json(&serde_json::json!({ "inputs": text }));
        if !self.api_key.is_empty() {
            request = request.bearer_auth(&self.api_key);
        }

        let response = request
            .send()
            .await
            .context("ner request")?
            .error_for_status()
            .context("ner status")?;

        let body: serde_json::Value = response.json().await.context("ner body")?;

        // Single inputs come back as a flat span array; batched protocols
        // nest one array per input.
        let spans: Vec<WireSpan> = match body {
            serde_json::Value::Array(items)
                if items.first().map(|v| v.is_array()).unwrap_or(false) =>
            {
                items
                    .into_iter()
                    .flat_map(|inner| {
                        serde_json::from_value::<Vec<WireSpan>>(inner).unwrap_or_default()
                    })
                    .collect()
            }
            other => serde_json::from_value(other).context("ner span shape")?,
        };

        Ok(spans
            .into_iter()
            .filter_map(|span| {
                let label = span.entity_group.or(span.entity)?;
                // Strip BIO prefixes some models keep ("B-PER" -> "PER").
                let label = label
                    .rsplit('-')
                    .next()
                    .unwrap_or(label.as_str())
                    .to_string();
                let text = span.word.trim().to_string();
                if text.is_empty() {
                    return None;
                }
                Some(RecognizedSpan {
                    label,
                    text,
                    score: span.score,
                })
            })
            .collect())
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}

impl std::fmt::Debug for HttpNerClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpNerClient")
            .field("endpoint", &self.endpoint)
            .field("model_id", &self.model_id)
            .field("api_key", &"***")
            .finish()
    }
}
