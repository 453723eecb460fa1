use crate::circuit::Circuit;
use crate::providers::{
    FreeApiBackend, GoogleBackend, MyMemoryBackend, ProviderId, TranslateBackend, TranslateError,
};
use flashwire_utils::lang;
use lru::LruCache;
use rand::seq::SliceRandom;
use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::sync::Mutex;
use std::time::Duration;
use tracing::{debug, warn};

const FAIL_THRESHOLD: u32 = 3;
const COOLDOWN: Duration = Duration::from_secs(120);
const CACHE_CAPACITY: usize = 100_000;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(12);

type CacheKey = (String, String, String);

/// Tuning knobs for the cascade.
#[derive(Debug, Clone)]
pub struct TranslationConfig {
    pub target: String,
    pub fail_threshold: u32,
    pub cooldown: Duration,
    pub cache_capacity: usize,
    pub request_timeout: Duration,
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            target: "en".to_string(),
            fail_threshold: FAIL_THRESHOLD,
            cooldown: COOLDOWN,
            cache_capacity: CACHE_CAPACITY,
            request_timeout: REQUEST_TIMEOUT,
        }
    }
}

struct Member {
    backend: Box<dyn TranslateBackend>,
    circuit: Circuit,
}

/// Process-lifetime translation service.
pub struct TranslationService {
    default_target: String,
    members: Vec<Member>,
    enabled: Mutex<HashMap<ProviderId, bool>>,
    cache: Mutex<LruCache<CacheKey, String>>,
}

impl TranslationService {
    /// Cascade over the three public providers.
    pub fn new(config: TranslationConfig) -> Self {
        let backends: Vec<Box<dyn TranslateBackend>> = vec![
            Box::new(GoogleBackend::new(config.request_timeout)),
            Box::new(FreeApiBackend::new(config.request_timeout)),
            Box::new(MyMemoryBackend::new(config.request_timeout)),
        ];
        Self::with_backends(config, backends)
    }

    /// Cascade over explicit backends (tests inject fakes or rebased URLs).
    pub fn with_backends(
        config: TranslationConfig,
        backends: Vec<Box<dyn TranslateBackend>>,
    ) -> Self {
        let enabled = backends.iter().map(|b| (b.id(), true)).collect();
        let members = backends
            .into_iter()
            .map(|backend| Member {
                circuit: Circuit::new(config.fail_threshold, config.cooldown),
                backend,
            })
            .collect();
        Self {
            default_target: config.target,
            members,
            enabled: Mutex::new(enabled),
            cache: Mutex::new(LruCache::new(
                NonZeroUsize::new(config.cache_capacity.max(1)).expect("non-zero capacity"),
            )),
        }
    }

    /// Translate `text` from `source` (or `auto`) into `target`.
    ///
    /// Returns `None` when the input is empty, the language codes do not
    /// validate, or every enabled provider fails.
    pub async fn translate(
        &self,
        text: &str,
        source: &str,
        target: Option<&str>,
        _proxies: &[String],
    ) -> Option<String> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }
        let target = target.unwrap_or(&self.default_target).to_lowercase();

        let source = if source.is_empty() || source == "auto" {
            lang::detect_language(text)
        } else {
            source.to_lowercase()
        };

        if !lang::is_valid_iso_639_1(&source) || !lang::is_valid_iso_639_1(&target) {
            warn!(source = %source, target = %target, "Invalid ISO-639-1 pair");
            return None;
        }

        let key = (text.to_string(), source.clone(), target.clone());
        if let Some(hit) = self.cache_get(&key) {
            return Some(hit);
        }

        for index in self.shuffled_member_indexes() {
            let member = &self.members[index];
            let id = member.backend.id();
            if !self.is_enabled(id) || !member.circuit.allow() {
                continue;
            }

            match member.backend.translate(text, &source, &target).await {
                Ok(out) => {
                    member.circuit.on_success();
                    self.cache_put(key, out.clone());
                    return Some(out);
                }
                Err(TranslateError::Unsupported(reason)) => {
                    debug!(provider = id.as_str(), reason = %reason, "Provider skipped");
                }
                Err(TranslateError::Failed(reason)) => {
                    warn!(provider = id.as_str(), reason = %reason, "Provider failed");
                    if member.circuit.on_failure() {
                        // Circuit opened: the provider is done for this process.
                        self.disable(id);
                    }
                }
            }
        }

        None
    }

    fn shuffled_member_indexes(&self) -> Vec<usize> {
        let mut indexes: Vec<usize> = (0..self.members.len()).collect();
        indexes.shuffle(&mut rand::thread_rng());
        indexes
    }

    fn is_enabled(&self, id: ProviderId) -> bool {
        *self
            .enabled
            .lock()
            .expect("enabled lock")
            .get(&id)
            .unwrap_or(&false)
    }

    fn disable(&self, id: ProviderId) {
        warn!(provider = id.as_str(), "Disabling provider for this session");
        self.enabled.lock().expect("enabled lock").insert(id, false);
    }

    fn cache_get(&self, key: &CacheKey) -> Option<String> {
        self.cache.lock().expect("cache lock").get(key).cloned()
    }

    fn cache_put(&self, key: CacheKey, value: String) {
        self.cache.lock().expect("cache lock").put(key, value);
    }
}
