use crate::article::ArticlePipeline;
use flashwire_types::{ArticleStatus, BatchStatus, BatchSummary, FeedEntry, ProcessingResult};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing::{error, info};

/// Pause between sub-batches to throttle resource pressure.
const INTER_BATCH_PAUSE: Duration = Duration::from_millis(100);

#[derive(Debug, Default)]
struct Accumulator {
    results: Vec<ProcessingResult>,
    successful: usize,
    failed: usize,
    sub_batches_processed: usize,
}

/// Runs article pipelines over a list with bounded parallelism.
///
/// Articles are split into contiguous sub-batches of `max_workers`; within
/// a sub-batch every article runs concurrently and results are joined in
/// submission order, while sub-batches themselves are strictly sequential.
/// An error escaping the executor itself marks the batch failed, keeping
/// the results accumulated so far and failing the remaining articles.
pub struct BatchExecutor {
    pipeline: Arc<ArticlePipeline>,
    max_workers: usize,
}

impl BatchExecutor {
    pub fn new(pipeline: Arc<ArticlePipeline>, max_workers: usize) -> Self {
        Self {
            pipeline,
            max_workers: max_workers.max(1),
        }
    }

    pub async fn process_batch(&self, entries: Vec<FeedEntry>, date: &str) -> BatchSummary {
        if entries.is_empty() {
            return BatchSummary::empty();
        }

        let started = Instant::now();
        let total = entries.len();
        let article_ids: Vec<String> = entries.iter().map(|entry| entry.id.clone()).collect();
        let accumulator = Arc::new(Mutex::new(Accumulator::default()));

        // The whole sub-batch loop runs in its own task: a defect in the
        // executor's bookkeeping surfaces as a failed batch, never as a
        // panic unwinding into the caller.
        let worker = tokio::spawn(Self::run_sub_batches(
            Arc::clone(&self.pipeline),
            entries,
            date.to_string(),
            self.max_workers,
            Arc::clone(&accumulator),
        ));

        let status = match worker.await {
            Ok(()) => BatchStatus::Completed,
            Err(join_error) => {
                error!(error = %join_error, "Batch executor aborted");
                BatchStatus::Failed
            }
        };

        let mut accumulated = match accumulator.lock() {
            Ok(mut guard) => std::mem::take(&mut *guard),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        };

        if status == BatchStatus::Failed {
            // Articles the aborted run never reached count as failed.
            for article_id in article_ids.iter().skip(accumulated.results.len()) {
                accumulated.failed += 1;
                accumulated.results.push(ProcessingResult::failed(
                    article_id.clone(),
                    Vec::new(),
                    "batch executor aborted before this article ran".to_string(),
                ));
            }
        }

        BatchSummary {
            status,
            total_articles: total,
            processed: accumulated.results.len(),
            successful: accumulated.successful,
            failed: accumulated.failed,
            processing_time_sec: started.elapsed().as_secs_f64(),
            sub_batches_processed: accumulated.sub_batches_processed,
            results: accumulated.results,
        }
    }

    async fn run_sub_batches(
        pipeline: Arc<ArticlePipeline>,
        entries: Vec<FeedEntry>,
        date: String,
        max_workers: usize,
        accumulator: Arc<Mutex<Accumulator>>,
    ) {
        let sub_batches: Vec<Vec<FeedEntry>> = entries
            .chunks(max_workers)
            .map(|chunk| chunk.to_vec())
            .collect();
        let sub_batch_count = sub_batches.len();
        info!(
            total = entries.len(),
            sub_batches = sub_batch_count,
            batch_size = max_workers,
            "Starting batch processing"
        );

        for (index, sub_batch) in sub_batches.into_iter().enumerate() {
            let batch_started = Instant::now();

            // One task per article; a panic in one never cancels siblings,
            // and join order preserves submission order.
            let handles: Vec<_> = sub_batch
                .iter()
                .map(|entry| {
                    let pipeline = Arc::clone(&pipeline);
                    let entry = entry.clone();
                    let date = date.clone();
                    tokio::spawn(async move { pipeline.process(&entry, &date).await })
                })
                .collect();

            for (handle, entry) in handles.into_iter().zip(sub_batch.iter()) {
                let result = match handle.await {
                    Ok(result) => result,
                    Err(join_error) => {
                        error!(
                            article_id = %entry.id,
                            error = %join_error,
                            "Article task aborted"
                        );
                        ProcessingResult::failed(
                            entry.id.clone(),
                            Vec::new(),
                            format!("article task aborted: {join_error}"),
                        )
                    }
                };

                let mut accumulated = accumulator.lock().expect("accumulator lock");
                match result.status {
                    ArticleStatus::Completed => accumulated.successful += 1,
                    ArticleStatus::Failed => accumulated.failed += 1,
                }
                accumulated.results.push(result);
            }

            if let Ok(mut accumulated) = accumulator.lock() {
                accumulated.sub_batches_processed += 1;
            }
            info!(
                sub_batch = index + 1,
                of = sub_batch_count,
                seconds = batch_started.elapsed().as_secs_f64(),
                "Sub-batch complete"
            );

            if index + 1 < sub_batch_count {
                tokio::time::sleep(INTER_BATCH_PAUSE).await;
            }
        }
    }
}
