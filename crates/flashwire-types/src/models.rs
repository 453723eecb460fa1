use crate::entities::EntityBundle;
use crate::geo::GeoEntity;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One row of a date-partitioned feed table.
///
/// Written by the upstream collector and read-only to this pipeline until an
/// enriched copy is upserted back. Identity within a partition is
/// `(id, flashpoint_id)`. Unknown row keys (`compressed_content`, `summary`,
/// …) are tolerated and dropped on deserialization.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeedEntry {
    pub id: String,
    pub flashpoint_id: String,
    pub url: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub title_en: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub published_date: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub language: String,
    #[serde(default)]
    pub source_country: String,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub hostname: String,
    #[serde(default)]
    pub entities: Option<EntityBundle>,
    #[serde(default)]
    pub geo_entities: Vec<GeoEntity>,
}

/// Working record for one article while it moves through the pipeline.
///
/// Created by and exclusively owned by one pipeline invocation; `id` and
/// `parent_id` are preserved end-to-end, `images` is never null (empty list
/// sentinel) and fields populated by earlier stages survive later soft
/// failures.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractResult {
    pub id: String,
    pub parent_id: String,
    pub url: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub title_en: String,
    /// ISO-639-1 code or empty string.
    #[serde(default)]
    pub language: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub published_date: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub source_country: String,
    #[serde(default)]
    pub hostname: String,
    #[serde(default)]
    pub entities: Option<EntityBundle>,
    #[serde(default)]
    pub geo_entities: Vec<GeoEntity>,
    #[serde(default)]
    pub scraped_at: String,
    #[serde(default)]
    pub word_count: usize,
}

impl ExtractResult {
    /// Seed a working record from a feed entry.
    pub fn from_entry(entry: &FeedEntry) -> Self {
        Self {
            id: entry.id.clone(),
            parent_id: entry.flashpoint_id.clone(),
            url: entry.url.clone(),
            title: entry.title.clone(),
            source_country: entry.source_country.clone(),
            hostname: entry.hostname.clone(),
            images: Vec::new(),
            ..Default::default()
        }
    }

    /// Fold the enrichment back into the feed-entry shape for persistence.
    pub fn merge_into(&self, entry: &mut FeedEntry) {
        entry.title = self.title.clone();
        entry.title_en = self.title_en.clone();
        entry.language = self.language.clone();
        entry.author = self.author.clone();
        entry.published_date = self.published_date.clone();
        entry.content = self.content.clone();
        entry.images = self.images.clone();
        if !self.hostname.is_empty() {
            entry.hostname = self.hostname.clone();
        }
        entry.entities = self.entities.clone();
        entry.geo_entities = self.geo_entities.clone();
    }
}

/// Terminal status of one article.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArticleStatus {
    Completed,
    Failed,
}

/// Per-article outcome returned by the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessingResult {
    pub article_id: String,
    pub status: ArticleStatus,
    pub processing_time_sec: f64,
    pub processing_steps: Vec<String>,
    pub enriched_data: Option<FeedEntry>,
    pub errors: Vec<String>,
    pub timestamp: DateTime<Utc>,
}

impl ProcessingResult {
    pub fn failed(article_id: impl Into<String>, steps: Vec<String>, error: String) -> Self {
        Self {
            article_id: article_id.into(),
            status: ArticleStatus::Failed,
            processing_time_sec: 0.0,
            processing_steps: steps,
            enriched_data: None,
            errors: vec![error],
            timestamp: Utc::now(),
        }
    }
}

/// Batch-level status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BatchStatus {
    Completed,
    Failed,
}

/// Aggregate outcome of one batch run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchSummary {
    pub status: BatchStatus,
    pub total_articles: usize,
    pub processed: usize,
    pub successful: usize,
    pub failed: usize,
    pub processing_time_sec: f64,
    pub sub_batches_processed: usize,
    pub results: Vec<ProcessingResult>,
}

impl BatchSummary {
    /// Summary for an empty input; completes immediately.
    pub fn empty() -> Self {
        Self {
            status: BatchStatus::Completed,
            total_articles: 0,
            processed: 0,
            successful: 0,
            failed: 0,
            processing_time_sec: 0.0,
            sub_batches_processed: 0,
            results: Vec::new(),
        }
    }
}
