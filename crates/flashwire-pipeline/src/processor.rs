use crate::article::ArticlePipeline;
use crate::batch::BatchExecutor;
use crate::repository::FeedRepository;
use chrono::Utc;
use flashwire_proxy::ProxyService;
use flashwire_types::{
    ArticleStatus, BatchStatus, BatchSummary, EnrichError, EnrichResult, FeedEntry,
    ProcessingResult,
};
use flashwire_utils::dates;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;
use tracing::{info, warn};

/// Outcome of a warm-up call.
#[derive(Debug, Clone, Serialize)]
pub struct WarmupReport {
    pub status: String,
    pub date: String,
    pub total_entries: usize,
    pub message: String,
    pub timestamp: chrono::DateTime<Utc>,
}

/// Aggregate counters exposed on the stats route.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProcessorStats {
    pub total_loaded: usize,
    pub total_processed: usize,
    pub successful: usize,
    pub failed: usize,
    pub last_processed_date: Option<String>,
    pub loaded_dates: Vec<String>,
    pub total_loaded_entries: usize,
}

/// Orchestrates date-level jobs: loads partitions, drives the batch
/// executor or the sequential path, and persists enriched rows.
pub struct FeedProcessor {
    repository: Arc<dyn FeedRepository>,
    pipeline: Arc<ArticlePipeline>,
    executor: BatchExecutor,
    proxy_service: Option<Arc<ProxyService>>,
    warmed: Mutex<HashMap<String, Vec<FeedEntry>>>,
    stats: Mutex<ProcessorStats>,
}

impl FeedProcessor {
    pub fn new(
        repository: Arc<dyn FeedRepository>,
        pipeline: Arc<ArticlePipeline>,
        max_workers: usize,
    ) -> Self {
        Self {
            repository,
            executor: BatchExecutor::new(Arc::clone(&pipeline), max_workers),
            pipeline,
            proxy_service: None,
            warmed: Mutex::new(HashMap::new()),
            stats: Mutex::new(ProcessorStats::default()),
        }
    }

    /// Attach the proxy service whose warm-up/refresh lifecycle brackets
    /// full processing runs.
    pub fn with_proxy_service(mut self, proxy_service: Arc<ProxyService>) -> Self {
        self.proxy_service = Some(proxy_service);
        self
    }

    /// Load a date partition into memory.
    pub async fn warm_up(&self, date: &str) -> EnrichResult<WarmupReport> {
        dates::validate_wire_date(date)?;
        let entries = self.repository.fetch_entries(date).await?;
        let total = entries.len();

        {
            let mut warmed = self.warmed.lock().await;
            warmed.insert(date.to_string(), entries);
        }
        {
            let mut stats = self.stats.lock().await;
            stats.total_loaded = total;
            stats.last_processed_date = Some(date.to_string());
        }

        info!(date = %date, entries = total, "Warm-up complete");
        Ok(WarmupReport {
            status: "warmed_up".to_string(),
            date: date.to_string(),
            total_entries: total,
            message: format!("Server warmed up with {total} feed entries for date {date}"),
            timestamp: Utc::now(),
        })
    }

    /// Process every entry of a date, batched or sequential.
    pub async fn process_all(&self, date: &str, batch_mode: bool) -> EnrichResult<BatchSummary> {
        dates::validate_wire_date(date)?;
        let entries = self.load_or_reuse(date).await?;

        // Proxy warm-up + background refresh bracket the run.
        if let Some(proxy) = &self.proxy_service {
            if let Err(err) = proxy.ping_start().await {
                warn!(error = %err, "Proxy warm-up failed, continuing with cached proxies");
            }
        }

        let mut summary = if batch_mode {
            self.executor.process_batch(entries, date).await
        } else {
            self.process_sequential(entries, date).await
        };
        self.persist_results(date, &mut summary).await;

        if let Some(proxy) = &self.proxy_service {
            proxy.stop_refresher().await;
        }

        self.record(&summary, date).await;
        Ok(summary)
    }

    /// Sequential processing of one flashpoint's entries.
    pub async fn process_by_flashpoint(
        &self,
        date: &str,
        flashpoint_id: &str,
    ) -> EnrichResult<BatchSummary> {
        dates::validate_wire_date(date)?;
        let entries = self
            .repository
            .fetch_entries_by_flashpoint(date, flashpoint_id)
            .await?;

        let mut summary = self.process_sequential(entries, date).await;
        self.persist_results(date, &mut summary).await;
        self.record(&summary, date).await;
        Ok(summary)
    }

    /// Single-article path.
    pub async fn process_by_article(
        &self,
        date: &str,
        flashpoint_id: &str,
        article_id: &str,
    ) -> EnrichResult<ProcessingResult> {
        dates::validate_wire_date(date)?;
        let entry = self
            .repository
            .fetch_entry(date, flashpoint_id, article_id)
            .await?
            .ok_or_else(|| {
                EnrichError::validation(format!(
                    "article {article_id} not found in flashpoint {flashpoint_id} for {date}"
                ))
            })?;

        let mut result = self.pipeline.process(&entry, date).await;
        self.persist_one(date, &mut result).await;
        let summary = summary_of(std::slice::from_ref(&result));
        self.record(&summary, date).await;
        Ok(result)
    }

    /// Process an explicit id list within a date (any flashpoint).
    pub async fn process_articles(
        &self,
        date: &str,
        article_ids: &[String],
    ) -> EnrichResult<BatchSummary> {
        dates::validate_wire_date(date)?;
        if article_ids.is_empty() {
            return Err(EnrichError::validation("articles_ids must not be empty"));
        }

        let entries: Vec<FeedEntry> = self
            .repository
            .fetch_entries(date)
            .await?
            .into_iter()
            .filter(|entry| article_ids.contains(&entry.id))
            .collect();

        let mut summary = self.process_sequential(entries, date).await;
        self.persist_results(date, &mut summary).await;
        self.record(&summary, date).await;
        Ok(summary)
    }

    /// Warmed entries for a date, if any.
    pub async fn entries(&self, date: &str) -> Vec<FeedEntry> {
        self.warmed
            .lock()
            .await
            .get(date)
            .cloned()
            .unwrap_or_default()
    }

    /// Drop warmed entries for one date, or everything.
    pub async fn clear(&self, date: Option<&str>) {
        let mut warmed = self.warmed.lock().await;
        match date {
            Some(date) => {
                warmed.remove(date);
                info!(date = %date, "Cleared warmed entries");
            }
            None => {
                warmed.clear();
                info!("Cleared all warmed entries");
            }
        }
    }

    pub async fn stats(&self) -> ProcessorStats {
        let warmed = self.warmed.lock().await;
        let mut stats = self.stats.lock().await.clone();
        stats.loaded_dates = warmed.keys().cloned().collect();
        stats.loaded_dates.sort();
        stats.total_loaded_entries = warmed.values().map(Vec::len).sum();
        stats
    }

    pub async fn health_check(&self) -> bool {
        self.repository.health_check().await
    }

    async fn load_or_reuse(&self, date: &str) -> EnrichResult<Vec<FeedEntry>> {
        if let Some(entries) = self.warmed.lock().await.get(date) {
            return Ok(entries.clone());
        }
        let entries = self.repository.fetch_entries(date).await?;
        self.warmed
            .lock()
            .await
            .insert(date.to_string(), entries.clone());
        Ok(entries)
    }

    async fn process_sequential(&self, entries: Vec<FeedEntry>, date: &str) -> BatchSummary {
        let started = Instant::now();
        let mut results = Vec::with_capacity(entries.len());
        for entry in &entries {
            results.push(self.pipeline.process(entry, date).await);
        }
        let mut summary = summary_of(&results);
        summary.results = results;
        summary.processing_time_sec = started.elapsed().as_secs_f64();
        summary
    }

    async fn persist_results(&self, date: &str, summary: &mut BatchSummary) {
        let mut results = std::mem::take(&mut summary.results);
        for result in &mut results {
            self.persist_one(date, result).await;
        }
        summary.successful = results
            .iter()
            .filter(|r| r.status == ArticleStatus::Completed)
            .count();
        summary.failed = results.len() - summary.successful;
        summary.results = results;
    }

    /// Upsert one completed article; a storage failure flips the article to
    /// failed but never fails the batch.
    async fn persist_one(&self, date: &str, result: &mut ProcessingResult) {
        if result.status != ArticleStatus::Completed {
            return;
        }
        let Some(enriched) = &result.enriched_data else {
            return;
        };
        if let Err(err) = self.repository.upsert_enriched(date, enriched).await {
            warn!(article_id = %result.article_id, error = %err, "Failed to persist article");
            result.status = ArticleStatus::Failed;
            result.errors.push(format!("storage: {err}"));
        }
    }

    async fn record(&self, summary: &BatchSummary, date: &str) {
        let mut stats = self.stats.lock().await;
        stats.total_processed += summary.processed;
        stats.successful += summary.successful;
        stats.failed += summary.failed;
        stats.last_processed_date = Some(date.to_string());
    }
}

fn summary_of(results: &[ProcessingResult]) -> BatchSummary {
    let successful = results
        .iter()
        .filter(|r| r.status == ArticleStatus::Completed)
        .count();
    BatchSummary {
        status: BatchStatus::Completed,
        total_articles: results.len(),
        processed: results.len(),
        successful,
        failed: results.len() - successful,
        processing_time_sec: 0.0,
        sub_batches_processed: if results.is_empty() { 0 } else { 1 },
        results: Vec::new(),
    }
}
