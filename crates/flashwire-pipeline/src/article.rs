use chrono::Utc;
use flashwire_entities::EntityTagger;
use flashwire_extraction::Scraper;
use flashwire_geo::Geotagger;
use flashwire_images::{ImageDownloader, ImageFinder};
use flashwire_proxy::ProxyPool;
use flashwire_translate::TranslationService;
use flashwire_types::{
    ArticleStatus, EntityBundle, ExtractResult, FeedEntry, ProcessingResult,
};
use flashwire_utils::{lang, text};
use rand::seq::SliceRandom;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info};

/// Ordered per-article state machine.
///
/// Scraping is fatal for the article; every later stage fails soft, so a
/// partially enriched article still completes and is persisted with the
/// fields populated so far.
pub struct ArticlePipeline {
    scraper: Arc<dyn Scraper>,
    translator: Arc<TranslationService>,
    entity_tagger: Arc<EntityTagger>,
    geotagger: Arc<Geotagger>,
    image_finder: Arc<ImageFinder>,
    image_downloader: Arc<ImageDownloader>,
    proxies: Arc<dyn ProxyPool>,
}

impl ArticlePipeline {
    pub fn new(
        scraper: Arc<dyn Scraper>,
        translator: Arc<TranslationService>,
        entity_tagger: Arc<EntityTagger>,
        geotagger: Arc<Geotagger>,
        image_finder: Arc<ImageFinder>,
        image_downloader: Arc<ImageDownloader>,
        proxies: Arc<dyn ProxyPool>,
    ) -> Self {
        Self {
            scraper,
            translator,
            entity_tagger,
            geotagger,
            image_finder,
            image_downloader,
            proxies,
        }
    }

    /// Run one article through every stage.
    pub async fn process(&self, entry: &FeedEntry, date: &str) -> ProcessingResult {
        let article_id = entry.id.clone();
        let started = Instant::now();
        let mut steps: Vec<String> = Vec::new();

        info!(article_id = %article_id, url = %entry.url, "Starting article pipeline");

        // Stage 1: scrape. The only fatal stage.
        let mut extracted = match self.scrape(entry).await {
            Ok(extracted) => extracted,
            Err(message) => {
                error!(article_id = %article_id, error = %message, "Scraping failed");
                let mut result = ProcessingResult::failed(article_id, steps, message);
                result.processing_time_sec = started.elapsed().as_secs_f64();
                return result;
            }
        };
        steps.push("scraping".to_string());

        // Stage 2: language.
        extracted.language = self.detect_language(&extracted);
        steps.push("language_setting".to_string());

        // Stage 3: title translation.
        self.translate_title(&mut extracted).await;
        steps.push("translation".to_string());

        // Stage 4: entities.
        let bundle = self.entity_tagger.extract(&extracted.content).await;
        extracted.entities = Some(bundle);
        steps.push("entity_extraction".to_string());

        // Stage 5: geotagging.
        let empty = EntityBundle::default();
        let locations = &extracted.entities.as_ref().unwrap_or(&empty).LOC;
        extracted.geo_entities =
            self.geotagger
                .extract(&extracted.title, &extracted.content, locations);
        steps.push("geotagging".to_string());

        // Stage 6: image search.
        let found = self.image_finder.find(&extracted).await;
        if !found.is_empty() {
            for url in found {
                if !extracted.images.contains(&url) {
                    extracted.images.push(url);
                }
            }
        }
        steps.push("image_search".to_string());

        // Stage 7: image download, skipped when there are no candidates.
        if !extracted.images.is_empty() {
            let parent_id = extracted.parent_id.clone();
            extracted = self
                .image_downloader
                .download(date, &parent_id, extracted)
                .await;
            steps.push("image_download".to_string());
        }

        // Fold back into the feed-entry shape.
        let mut enriched = entry.clone();
        extracted.merge_into(&mut enriched);

        let processing_time = started.elapsed().as_secs_f64();
        info!(
            article_id = %extracted.id,
            seconds = processing_time,
            "Article pipeline completed"
        );

        ProcessingResult {
            article_id: extracted.id,
            status: ArticleStatus::Completed,
            processing_time_sec: processing_time,
            processing_steps: steps,
            enriched_data: Some(enriched),
            errors: Vec::new(),
            timestamp: Utc::now(),
        }
    }

    async fn scrape(&self, entry: &FeedEntry) -> Result<ExtractResult, String> {
        let mut extracted = self
            .scraper
            .extract(&entry.url)
            .await
            .map_err(|e| e.to_string())?;

        // The scraper knows nothing about feed identity; restore it.
        extracted.id = entry.id.clone();
        extracted.parent_id = entry.flashpoint_id.clone();
        extracted.source_country = entry.source_country.clone();
        if extracted.title.is_empty() {
            extracted.title = entry.title.clone();
        }
        if extracted.hostname.is_empty() {
            extracted.hostname = entry.hostname.clone();
        }
        Ok(extracted)
    }

    /// Sample up to three sentences from the head of the content plus the
    /// title, detect each, and take the modal language. Empty on failure.
    fn detect_language(&self, extracted: &ExtractResult) -> String {
        let head: String = extracted.content.chars().take(500).collect();
        let mut sentences = text::split_sentences(&head, 10);
        if sentences.len() > 3 {
            sentences.shuffle(&mut rand::thread_rng());
            sentences.truncate(3);
        }
        if !extracted.title.is_empty() {
            sentences.push(extracted.title.clone());
        }

        let mut votes: HashMap<String, u32> = HashMap::new();
        for sentence in &sentences {
            let detected = lang::detect_language(sentence);
            if !detected.is_empty() {
                *votes.entry(detected).or_default() += 1;
            }
        }

        let modal = votes
            .into_iter()
            .max_by(|a, b| a.1.cmp(&b.1).then_with(|| b.0.cmp(&a.0)))
            .map(|(code, _)| code)
            .unwrap_or_default();
        debug!(language = %modal, "Language set");
        modal
    }

    async fn translate_title(&self, extracted: &mut ExtractResult) {
        if extracted.language == "en" {
            extracted.title_en = extracted.title.clone();
            return;
        }
        if extracted.title.is_empty() {
            return;
        }

        let proxies = self.proxies.snapshot().await;
        extracted.title_en = self
            .translator
            .translate(&extracted.title, &extracted.language, Some("en"), &proxies)
            .await
            .unwrap_or_default();
    }
}
