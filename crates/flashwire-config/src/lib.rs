//! Environment-driven configuration for the Flashwire pipeline.
//!
//! All knobs come from the process environment; missing required values are
//! fatal at startup. Loading never panics — callers get a typed
//! [`ConfigError`] and decide how to exit.

mod env;

pub use env::{ConfigError, EnvLoader};

use serde::Serialize;

/// Complete application configuration.
///
/// Secrets are kept out of `Debug`/`Serialize` output.
#[derive(Clone)]
pub struct AppConfig {
    // Storage
    pub supabase_url: String,
    pub supabase_key: String,
    pub supabase_service_key: String,
    pub supabase_image_bucket: String,
    pub supabase_db_url: String,
    pub supabase_use_signed_urls: bool,
    pub supabase_signed_url_expiry_secs: u64,

    // Control plane
    pub api_key: String,
    pub require_api_key: bool,
    pub host: String,
    pub port: u16,

    // Pipeline
    pub max_workers: usize,
    pub db_batch_size: usize,
    pub request_timeout_secs: u64,
    pub retry_attempts: u32,
    pub retry_delay_secs: f64,

    // Feature toggles
    pub enable_image_search: bool,
    pub enable_geotagging: bool,
    pub enable_clean_text: bool,
    pub enable_image_download: bool,

    // Image downloader
    pub image_download_max_bytes: u64,
    pub image_download_max_concurrency: usize,

    // Proxy provider
    pub proxy_base: String,
    pub proxy_api_key: String,
    pub proxy_post_start_service: String,
    pub proxy_get_proxies: String,

    // Entity recognizer endpoint (black-box token-classification model)
    pub ner_endpoint: String,
    pub ner_api_key: String,

    pub log_level: String,
}

impl AppConfig {
    /// Load from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_loader(&EnvLoader::new())
    }

    /// Load from an explicit loader (tests inject their own variables).
    pub fn from_loader(env: &EnvLoader) -> Result<Self, ConfigError> {
        let config = Self {
            supabase_url: env.require("SUPABASE_URL")?,
            supabase_key: env.require("SUPABASE_KEY")?,
            supabase_service_key: env.require("SUPABASE_SERVICE_KEY")?,
            supabase_image_bucket: env.require("SUPABASE_IMAGE_BUCKET")?,
            supabase_db_url: env.require("SUPABASE_DB_URL")?,
            supabase_use_signed_urls: env.bool_or("SUPABASE_USE_SIGNED_URLS", false)?,
            supabase_signed_url_expiry_secs: env.uint_or("SUPABASE_SIGNED_URL_EXPIRY", 3600)?,

            api_key: env.require("API_KEY")?,
            require_api_key: env.bool_or("REQUIRE_API_KEY", true)?,
            host: env.string_or("HOST", "0.0.0.0"),
            port: env.uint_or("PORT", 8000)? as u16,

            max_workers: env.uint_or("MAX_WORKERS", 4)? as usize,
            db_batch_size: env.uint_or("DB_BATCH_SIZE", 100)? as usize,
            request_timeout_secs: env.uint_or("REQUEST_TIMEOUT", 30)?,
            retry_attempts: env.uint_or("RETRY_ATTEMPTS", 3)? as u32,
            retry_delay_secs: env.float_or("RETRY_DELAY", 1.0)?,

            enable_image_search: env.bool_or("ENABLE_IMAGE_SEARCH", true)?,
            enable_geotagging: env.bool_or("ENABLE_GEOTAGGING", true)?,
            enable_clean_text: env.bool_or("ENABLE_CLEAN_TEXT", true)?,
            enable_image_download: env.bool_or("ENABLE_IMAGE_DOWNLOAD", true)?,

            image_download_max_bytes: env.uint_or("IMAGE_DOWNLOAD_MAX_BYTES", 5_242_880)?,
            image_download_max_concurrency: env.uint_or("IMAGE_DOWNLOAD_MAX_CONCURRENCY", 4)?
                as usize,

            proxy_base: env.require("PROXY_BASE")?,
            proxy_api_key: env.require("PROXY_API_KEY")?,
            proxy_post_start_service: env.string_or("PROXY_POST_START_SERVICE", "/proxy/start"),
            proxy_get_proxies: env.string_or("PROXY_GET_PROXIES", "/proxy/list"),

            ner_endpoint: env.string_or(
                "NER_ENDPOINT",
                "https://api-inference.huggingface.co/models/Davlan/distilbert-base-multilingual-cased-ner-hrl",
            ),
            ner_api_key: env.string_or("NER_API_KEY", ""),

            log_level: env.string_or("LOG_LEVEL", "info"),
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.max_workers == 0 || self.max_workers > 64 {
            return Err(ConfigError::invalid(
                "MAX_WORKERS",
                "must be between 1 and 64",
            ));
        }
        if self.db_batch_size == 0 || self.db_batch_size > 1000 {
            return Err(ConfigError::invalid(
                "DB_BATCH_SIZE",
                "must be between 1 and 1000",
            ));
        }
        if self.image_download_max_concurrency == 0 {
            return Err(ConfigError::invalid(
                "IMAGE_DOWNLOAD_MAX_CONCURRENCY",
                "must be at least 1",
            ));
        }
        if !matches!(
            self.log_level.to_lowercase().as_str(),
            "trace" | "debug" | "info" | "warn" | "error"
        ) {
            return Err(ConfigError::invalid(
                "LOG_LEVEL",
                "must be one of trace, debug, info, warn, error",
            ));
        }
        Ok(())
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("supabase_url", &self.supabase_url)
            .field("supabase_image_bucket", &self.supabase_image_bucket)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("max_workers", &self.max_workers)
            .field("require_api_key", &self.require_api_key)
            .field("api_key", &"***")
            .field("proxy_base", &self.proxy_base)
            .field("proxy_api_key", &"***")
            .field("log_level", &self.log_level)
            .finish_non_exhaustive()
    }
}

/// Public, non-secret view of the configuration for the stats endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct ConfigSummary {
    pub host: String,
    pub port: u16,
    pub max_workers: usize,
    pub db_batch_size: usize,
    pub enable_image_search: bool,
    pub enable_geotagging: bool,
    pub enable_clean_text: bool,
    pub enable_image_download: bool,
}

impl From<&AppConfig> for ConfigSummary {
    fn from(config: &AppConfig) -> Self {
        Self {
            host: config.host.clone(),
            port: config.port,
            max_workers: config.max_workers,
            db_batch_size: config.db_batch_size,
            enable_image_search: config.enable_image_search,
            enable_geotagging: config.enable_geotagging,
            enable_clean_text: config.enable_clean_text,
            enable_image_download: config.enable_image_download,
        }
    }
}
