//! End-to-end pipeline tests over faked external services: scraper, NER,
//! image search, object bucket and feed repository are all in-memory or
//! wiremock-backed; the enrichment logic in between is real.

use anyhow::Result;
use async_trait::async_trait;
use flashwire_entities::{EntityRecognizer, EntityTagger, RecognizedSpan, TaggerConfig};
use flashwire_extraction::Scraper;
use flashwire_geo::{Geotagger, GeotaggerConfig};
use flashwire_images::{
    DownloaderConfig, FinderConfig, ImageDownloader, ImageFinder, ImageHit, ImageSearch,
    ImageStore,
};
use flashwire_pipeline::{ArticlePipeline, BatchExecutor, FeedProcessor, FeedRepository};
use flashwire_proxy::StaticPool;
use flashwire_translate::{ProviderId, TranslateBackend, TranslateError, TranslationConfig, TranslationService};
use flashwire_types::{
    ArticleStatus, BatchStatus, EnrichError, EnrichResult, ExtractResult, FeedEntry,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Instant;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ---------------------------------------------------------------- fakes --

struct FakeScraper {
    /// Per-URL canned results; URLs not present fail to scrape.
    pages: HashMap<String, ExtractResult>,
    /// URLs whose scrape panics instead of erroring.
    panic_urls: Vec<String>,
}

#[async_trait]
impl Scraper for FakeScraper {
    async fn extract(&self, url: &str) -> EnrichResult<ExtractResult> {
        if self.panic_urls.iter().any(|p| p == url) {
            panic!("scraper blew up on {url}");
        }
        self.pages
            .get(url)
            .cloned()
            .ok_or_else(|| EnrichError::scraping(url, "both extraction stages failed"))
    }
}

struct FakeRecognizer {
    spans: Vec<RecognizedSpan>,
}

#[async_trait]
impl EntityRecognizer for FakeRecognizer {
    async fn extract(&self, _text: &str) -> Result<Vec<RecognizedSpan>> {
        Ok(self.spans.clone())
    }

    fn model_id(&self) -> &str {
        "fake-ner"
    }
}

struct FakeTranslator;

#[async_trait]
impl TranslateBackend for FakeTranslator {
    fn id(&self) -> ProviderId {
        ProviderId::Google
    }

    async fn translate(
        &self,
        text: &str,
        _source: &str,
        _target: &str,
    ) -> Result<String, TranslateError> {
        Ok(format!("EN:{text}"))
    }
}

struct FakeImageSearch {
    hits: Vec<ImageHit>,
}

#[async_trait]
impl ImageSearch for FakeImageSearch {
    async fn search(
        &self,
        _query: &str,
        _region: &str,
        _proxy: Option<&str>,
    ) -> Result<Vec<ImageHit>> {
        Ok(self.hits.clone())
    }
}

#[derive(Default)]
struct MemoryBucket {
    objects: Mutex<HashMap<String, Vec<u8>>>,
}

#[async_trait]
impl ImageStore for MemoryBucket {
    async fn list(&self, prefix: &str) -> Result<Vec<String>> {
        Ok(self
            .objects
            .lock()
            .unwrap()
            .keys()
            .filter_map(|k| k.strip_prefix(&format!("{prefix}/")).map(str::to_string))
            .collect())
    }

    async fn remove(&self, paths: &[String]) -> Result<()> {
        let mut objects = self.objects.lock().unwrap();
        for path in paths {
            objects.remove(path);
        }
        Ok(())
    }

    async fn upload(&self, path: &str, bytes: Vec<u8>, _content_type: &str) -> Result<()> {
        self.objects
            .lock()
            .unwrap()
            .insert(path.to_string(), bytes);
        Ok(())
    }

    async fn served_url(&self, path: &str) -> Result<String> {
        Ok(format!("https://bucket.example.com/{path}"))
    }
}

#[derive(Default)]
struct MemoryRepository {
    entries: Mutex<HashMap<String, Vec<FeedEntry>>>,
    upserts: Mutex<Vec<(String, FeedEntry)>>,
    fail_upserts: bool,
}

#[async_trait]
impl FeedRepository for MemoryRepository {
    async fn fetch_entries(&self, date: &str) -> EnrichResult<Vec<FeedEntry>> {
        self.entries
            .lock()
            .unwrap()
            .get(date)
            .cloned()
            .ok_or_else(|| {
                EnrichError::table_missing(format!("feed_entries_{}", date.replace('-', "")))
            })
    }

    async fn fetch_entries_by_flashpoint(
        &self,
        date: &str,
        flashpoint_id: &str,
    ) -> EnrichResult<Vec<FeedEntry>> {
        Ok(self
            .fetch_entries(date)
            .await?
            .into_iter()
            .filter(|e| e.flashpoint_id == flashpoint_id)
            .collect())
    }

    async fn fetch_entry(
        &self,
        date: &str,
        flashpoint_id: &str,
        article_id: &str,
    ) -> EnrichResult<Option<FeedEntry>> {
        Ok(self
            .fetch_entries(date)
            .await?
            .into_iter()
            .find(|e| e.flashpoint_id == flashpoint_id && e.id == article_id))
    }

    async fn upsert_enriched(&self, date: &str, entry: &FeedEntry) -> EnrichResult<()> {
        if self.fail_upserts {
            return Err(EnrichError::storage("upsert rejected"));
        }
        self.upserts
            .lock()
            .unwrap()
            .push((date.to_string(), entry.clone()));
        Ok(())
    }

    async fn health_check(&self) -> bool {
        true
    }
}

// ------------------------------------------------------------- builders --

fn english_article_body() -> String {
    let mut body = String::from(
        "Brazil confirmed that it will host COP30 in Belém next November. \
         Brazil expects more than forty delegations, president Lula said. \
         Brazil allocated R$ 500 milhões for the summit logistics in 2025.\n",
    );
    for _ in 0..30 {
        body.push_str(
            "Officials said the planning for the climate conference continues \
             across several ministries and agencies this year.\n",
        );
    }
    body
}

fn entry(id: &str, flashpoint: &str, url: &str, title: &str) -> FeedEntry {
    FeedEntry {
        id: id.to_string(),
        flashpoint_id: flashpoint.to_string(),
        url: url.to_string(),
        title: title.to_string(),
        ..Default::default()
    }
}

fn scraped(url: &str, title: &str, content: String) -> ExtractResult {
    ExtractResult {
        url: url.to_string(),
        title: title.to_string(),
        content: content.clone(),
        hostname: "example.com".to_string(),
        word_count: content.split_whitespace().count(),
        scraped_at: "2025-07-02T00:00:00Z".to_string(),
        images: Vec::new(),
        ..Default::default()
    }
}

struct PipelineBuilder {
    pages: HashMap<String, ExtractResult>,
    panic_urls: Vec<String>,
    spans: Vec<RecognizedSpan>,
    hits: Vec<ImageHit>,
    geotagging_enabled: bool,
    bucket: Arc<MemoryBucket>,
}

impl PipelineBuilder {
    fn new() -> Self {
        Self {
            pages: HashMap::new(),
            panic_urls: Vec::new(),
            spans: Vec::new(),
            hits: Vec::new(),
            geotagging_enabled: true,
            bucket: Arc::new(MemoryBucket::default()),
        }
    }

    fn page(mut self, url: &str, result: ExtractResult) -> Self {
        self.pages.insert(url.to_string(), result);
        self
    }

    fn panics_on(mut self, url: &str) -> Self {
        self.panic_urls.push(url.to_string());
        self
    }

    fn spans(mut self, spans: Vec<RecognizedSpan>) -> Self {
        self.spans = spans;
        self
    }

    fn image_hits(mut self, hits: Vec<ImageHit>) -> Self {
        self.hits = hits;
        self
    }

    fn without_geotagging(mut self) -> Self {
        self.geotagging_enabled = false;
        self
    }

    fn build(self) -> (Arc<ArticlePipeline>, Arc<MemoryBucket>) {
        let pool = Arc::new(StaticPool::empty());
        let translator = Arc::new(TranslationService::with_backends(
            TranslationConfig::default(),
            vec![Box::new(FakeTranslator)],
        ));
        let tagger = Arc::new(EntityTagger::new(
            TaggerConfig::default(),
            Arc::new(FakeRecognizer { spans: self.spans }),
        ));
        let geotagger = Arc::new(Geotagger::new(GeotaggerConfig {
            enabled: self.geotagging_enabled,
            ..Default::default()
        }));
        let finder = Arc::new(ImageFinder::new(
            FinderConfig::default(),
            Arc::new(FakeImageSearch { hits: self.hits }),
            pool.clone(),
        ));
        let downloader = Arc::new(ImageDownloader::new(
            DownloaderConfig::default(),
            self.bucket.clone(),
        ));
        let pipeline = Arc::new(ArticlePipeline::new(
            Arc::new(FakeScraper {
                pages: self.pages,
                panic_urls: self.panic_urls,
            }),
            translator,
            tagger,
            geotagger,
            finder,
            downloader,
            pool,
        ));
        (pipeline, self.bucket)
    }
}

fn span(label: &str, text: &str, score: f64) -> RecognizedSpan {
    RecognizedSpan {
        label: label.to_string(),
        text: text.to_string(),
        score,
    }
}

// --------------------------------------------------------------- tests --

#[tokio::test]
async fn happy_path_english_article() {
    let image_server = MockServer::start().await;
    let mut png = vec![0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];
    png.resize(1024, 0);
    Mock::given(method("GET"))
        .and(path("/lead.png"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "image/png")
                .set_body_bytes(png.clone()),
        )
        .mount(&image_server)
        .await;
    Mock::given(method("HEAD"))
        .and(path("/lead.png"))
        .respond_with(ResponseTemplate::new(200).insert_header("content-type", "image/png"))
        .mount(&image_server)
        .await;

    let url = "https://example.com/news/x";
    let title = "Brazil hosts COP30 in Belém";
    let (pipeline, bucket) = PipelineBuilder::new()
        .page(url, scraped(url, title, english_article_body()))
        .spans(vec![
            span("PER", "Lula", 0.99),
            span("LOC", "Brazil", 0.98),
            span("LOC", "Belém", 0.95),
        ])
        .image_hits(vec![ImageHit {
            url: format!("{}/lead.png", image_server.uri()),
            width: 1200,
            height: 800,
        }])
        .build();

    let entry = entry("a1", "fp1", url, title);
    let result = pipeline.process(&entry, "2025-07-02").await;

    assert_eq!(result.status, ArticleStatus::Completed);
    assert_eq!(result.article_id, "a1");
    assert!(result.errors.is_empty());

    let enriched = result.enriched_data.unwrap();
    assert_eq!(enriched.id, "a1");
    assert_eq!(enriched.flashpoint_id, "fp1");
    assert_eq!(enriched.language, "en");
    // English article: the title is its own translation.
    assert_eq!(enriched.title_en, enriched.title);

    let entities = enriched.entities.unwrap();
    assert!(entities.EVENT.iter().any(|m| m.text == "COP30"));
    assert!(entities.PERSON.iter().any(|m| m.text == "Lula"));

    assert_eq!(enriched.geo_entities[0].alpha2, "BR");
    assert_eq!(enriched.geo_entities[0].alpha3, "BRA");

    assert_eq!(enriched.images.len(), 1);
    assert!(enriched.images[0].starts_with("https://bucket.example.com/2025-07-02/fp1/img_0_"));
    assert_eq!(bucket.objects.lock().unwrap().len(), 1);

    // The full stage list ran.
    assert_eq!(
        result.processing_steps,
        vec![
            "scraping",
            "language_setting",
            "translation",
            "entity_extraction",
            "geotagging",
            "image_search",
            "image_download"
        ]
    );
}

#[tokio::test]
async fn non_english_title_is_translated() {
    let url = "https://jornal.example.com/noticia";
    let body = "O Brasil confirmou a cúpula do clima em Belém. \
                O Brasil espera mais de quarenta delegações para o evento. \
                O governo brasileiro anunciou o orçamento da conferência.\n"
        .repeat(10);
    let (pipeline, _) = PipelineBuilder::new()
        .page(url, scraped(url, "Brasil sedia a COP30 em Belém", body))
        .build();

    let entry = entry("b1", "fp2", url, "Brasil sedia a COP30 em Belém");
    let result = pipeline.process(&entry, "2025-07-02").await;
    let enriched = result.enriched_data.unwrap();

    assert_eq!(enriched.language, "pt");
    assert_eq!(enriched.title_en, "EN:Brasil sedia a COP30 em Belém");
    assert_eq!(enriched.geo_entities[0].alpha2, "BR");
}

#[tokio::test]
async fn scrape_failure_fails_the_article() {
    let (pipeline, _) = PipelineBuilder::new().build();
    let entry = entry("c1", "fp1", "https://example.com/missing", "Gone");
    let result = pipeline.process(&entry, "2025-07-02").await;

    assert_eq!(result.status, ArticleStatus::Failed);
    assert!(result.enriched_data.is_none());
    assert!(!result.errors.is_empty());
    assert_eq!(result.processing_steps, Vec::<String>::new());
}

#[tokio::test]
async fn geotagging_failure_is_soft() {
    let url = "https://example.com/news/partial";
    let (pipeline, _) = PipelineBuilder::new()
        .page(url, scraped(url, "Summit update", english_article_body()))
        .without_geotagging()
        .build();

    let entry = entry("d1", "fp1", url, "Summit update");
    let result = pipeline.process(&entry, "2025-07-02").await;

    assert_eq!(result.status, ArticleStatus::Completed);
    let enriched = result.enriched_data.unwrap();
    assert!(enriched.geo_entities.is_empty());
    assert!(!enriched.content.is_empty());
    assert!(result.processing_steps.contains(&"geotagging".to_string()));
}

#[tokio::test]
async fn reprocessing_is_deterministic() {
    let url = "https://example.com/news/x";
    let title = "Brazil hosts COP30 in Belém";
    let builder = || {
        PipelineBuilder::new()
            .page(url, scraped(url, title, english_article_body()))
            .spans(vec![span("LOC", "Brazil", 0.98)])
            .build()
    };

    let entry = entry("a1", "fp1", url, title);
    let (pipeline, _) = builder();
    let first = pipeline.process(&entry, "2025-07-02").await;
    let (pipeline, _) = builder();
    let second = pipeline.process(&entry, "2025-07-02").await;

    let first = first.enriched_data.unwrap();
    let second = second.enriched_data.unwrap();
    assert_eq!(first.entities, second.entities);
    assert_eq!(first.geo_entities, second.geo_entities);
}

#[tokio::test]
async fn batch_preserves_submission_order_and_counts_failures() {
    let url_ok = "https://example.com/ok";
    let (pipeline, _) = PipelineBuilder::new()
        .page(url_ok, scraped(url_ok, "Fine", english_article_body()))
        .build();
    let executor = BatchExecutor::new(pipeline, 2);

    let entries = vec![
        entry("one", "fp1", url_ok, "Fine"),
        entry("two", "fp1", "https://example.com/broken", "Broken"),
        entry("three", "fp1", url_ok, "Fine"),
    ];
    let summary = executor.process_batch(entries, "2025-07-02").await;

    assert_eq!(summary.status, BatchStatus::Completed);
    assert_eq!(summary.total_articles, 3);
    assert_eq!(summary.successful, 2);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.sub_batches_processed, 2);
    let ids: Vec<_> = summary.results.iter().map(|r| r.article_id.as_str()).collect();
    assert_eq!(ids, vec!["one", "two", "three"]);
}

#[tokio::test]
async fn article_panic_is_captured_without_cancelling_siblings() {
    let url_ok = "https://example.com/ok";
    let url_panics = "https://example.com/panics";
    let (pipeline, _) = PipelineBuilder::new()
        .page(url_ok, scraped(url_ok, "Fine", english_article_body()))
        .panics_on(url_panics)
        .build();
    let executor = BatchExecutor::new(pipeline, 3);

    let entries = vec![
        entry("one", "fp1", url_ok, "Fine"),
        entry("two", "fp1", url_panics, "Boom"),
        entry("three", "fp1", url_ok, "Fine"),
    ];
    let summary = executor.process_batch(entries, "2025-07-02").await;

    // The panicking article fails alone; its siblings complete and the
    // batch itself still reports completed.
    assert_eq!(summary.status, BatchStatus::Completed);
    assert_eq!(summary.successful, 2);
    assert_eq!(summary.failed, 1);
    let ids: Vec<_> = summary.results.iter().map(|r| r.article_id.as_str()).collect();
    assert_eq!(ids, vec!["one", "two", "three"]);
    assert_eq!(summary.results[1].status, ArticleStatus::Failed);
    assert!(summary.results[1].errors[0].contains("aborted"));
}

#[tokio::test]
async fn empty_batch_completes_immediately() {
    let (pipeline, _) = PipelineBuilder::new().build();
    let executor = BatchExecutor::new(pipeline, 4);

    let started = Instant::now();
    let summary = executor.process_batch(Vec::new(), "2025-07-02").await;
    assert!(started.elapsed().as_millis() < 100);
    assert_eq!(summary.status, BatchStatus::Completed);
    assert_eq!(summary.total_articles, 0);
    assert_eq!(summary.successful, 0);
    assert_eq!(summary.failed, 0);
}

#[tokio::test]
async fn processor_persists_completed_articles() {
    let url = "https://example.com/news/x";
    let (pipeline, _) = processor_pipeline(url);
    let repository = Arc::new(MemoryRepository::default());
    repository.entries.lock().unwrap().insert(
        "2025-07-02".to_string(),
        vec![entry("a1", "fp1", url, "Brazil hosts COP30 in Belém")],
    );

    let processor = FeedProcessor::new(repository.clone(), pipeline, 2);
    let summary = processor.process_all("2025-07-02", true).await.unwrap();

    assert_eq!(summary.successful, 1);
    let upserts = repository.upserts.lock().unwrap();
    assert_eq!(upserts.len(), 1);
    assert_eq!(upserts[0].1.id, "a1");
    assert_eq!(upserts[0].1.flashpoint_id, "fp1");
}

// Small helper so the processor tests share one pipeline shape.
fn processor_pipeline(url: &str) -> (Arc<ArticlePipeline>, Arc<MemoryBucket>) {
    PipelineBuilder::new()
        .page(
            url,
            scraped(url, "Brazil hosts COP30 in Belém", english_article_body()),
        )
        .build()
}

#[tokio::test]
async fn storage_failure_counts_the_article_as_failed() {
    let url = "https://example.com/news/x";
    let (pipeline, _) = processor_pipeline(url);
    let repository = Arc::new(MemoryRepository {
        fail_upserts: true,
        ..Default::default()
    });
    repository.entries.lock().unwrap().insert(
        "2025-07-02".to_string(),
        vec![entry("a1", "fp1", url, "Brazil hosts COP30 in Belém")],
    );

    let processor = FeedProcessor::new(repository, pipeline, 2);
    let summary = processor.process_all("2025-07-02", false).await.unwrap();
    assert_eq!(summary.successful, 0);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.results[0].status, ArticleStatus::Failed);
}

#[tokio::test]
async fn missing_partition_surfaces_as_table_missing() {
    let (pipeline, _) = PipelineBuilder::new().build();
    let processor = FeedProcessor::new(Arc::new(MemoryRepository::default()), pipeline, 2);
    let err = processor.warm_up("2099-01-01").await.unwrap_err();
    assert!(matches!(err, EnrichError::TableMissing { .. }));
    assert_eq!(err.to_string(), "Table feed_entries_20990101 not available");
}

#[tokio::test]
async fn invalid_dates_are_rejected_before_any_io() {
    let (pipeline, _) = PipelineBuilder::new().build();
    let processor = FeedProcessor::new(Arc::new(MemoryRepository::default()), pipeline, 2);
    for bad in ["20990101", "2099/01/01", "soon"] {
        let err = processor.process_all(bad, true).await.unwrap_err();
        assert!(matches!(err, EnrichError::Validation(_)), "for {bad:?}");
    }
}

#[tokio::test]
async fn warm_up_entries_and_clear_round_trip() {
    let url = "https://example.com/news/x";
    let (pipeline, _) = processor_pipeline(url);
    let repository = Arc::new(MemoryRepository::default());
    repository.entries.lock().unwrap().insert(
        "2025-07-02".to_string(),
        vec![entry("a1", "fp1", url, "t")],
    );

    let processor = FeedProcessor::new(repository, pipeline, 2);
    let report = processor.warm_up("2025-07-02").await.unwrap();
    assert_eq!(report.status, "warmed_up");
    assert_eq!(report.total_entries, 1);

    assert_eq!(processor.entries("2025-07-02").await.len(), 1);
    let stats = processor.stats().await;
    assert_eq!(stats.loaded_dates, vec!["2025-07-02"]);
    assert_eq!(stats.total_loaded_entries, 1);

    processor.clear(Some("2025-07-02")).await;
    assert!(processor.entries("2025-07-02").await.is_empty());
}

#[tokio::test]
async fn process_articles_filters_by_id() {
    let url = "https://example.com/news/x";
    let (pipeline, _) = processor_pipeline(url);
    let repository = Arc::new(MemoryRepository::default());
    repository.entries.lock().unwrap().insert(
        "2025-07-02".to_string(),
        vec![
            entry("a1", "fp1", url, "t"),
            entry("a2", "fp1", "https://example.com/other", "t"),
        ],
    );

    let processor = FeedProcessor::new(repository.clone(), pipeline, 2);
    let summary = processor
        .process_articles("2025-07-02", &["a1".to_string()])
        .await
        .unwrap();
    assert_eq!(summary.total_articles, 1);
    assert_eq!(summary.results[0].article_id, "a1");

    let err = processor
        .process_articles("2025-07-02", &[])
        .await
        .unwrap_err();
    assert!(matches!(err, EnrichError::Validation(_)));
}
