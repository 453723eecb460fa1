use thiserror::Error;

/// Error kinds shared across the enrichment pipeline.
///
/// The variants map one-to-one onto the failure classes the control plane
/// distinguishes: configuration problems are fatal at startup, validation
/// and auth problems surface as 4xx responses, missing date partitions as
/// 404, and the remaining kinds describe per-article or per-call failures
/// that the batch machinery captures without propagating.
#[derive(Error, Debug)]
pub enum EnrichError {
    /// Missing or malformed configuration; fatal at startup.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Malformed date, missing required field, bad request body.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Missing or wrong API key, or an upstream 401.
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Upstream 429.
    #[error("Rate limited: {0}")]
    RateLimited(String),

    /// Date partition does not exist.
    #[error("Table {table} not available")]
    TableMissing { table: String },

    /// Transient connect/timeout failure.
    #[error("Network error: {0}")]
    Network(String),

    /// Both extractor stages failed for a URL; fatal for the article.
    #[error("Scraping failed for {url}: {message}")]
    Scraping { url: String, message: String },

    /// Row upsert or object upload failed for one article.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Anything that escaped a stage boundary.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl EnrichError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn auth(message: impl Into<String>) -> Self {
        Self::Auth(message.into())
    }

    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self::RateLimited(message.into())
    }

    pub fn table_missing(table: impl Into<String>) -> Self {
        Self::TableMissing {
            table: table.into(),
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::Network(message.into())
    }

    pub fn scraping(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Scraping {
            url: url.into(),
            message: message.into(),
        }
    }

    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage(message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Whether a retry with backoff is worth attempting.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Network(_) | Self::RateLimited(_))
    }
}

pub type EnrichResult<T> = Result<T, EnrichError>;
