//! Control-plane tests driving the full router with in-memory services.

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use flashwire_api::state::{AppState, FeatureFlags};
use flashwire_api::{build_router, dto};
use flashwire_config::{AppConfig, ConfigSummary, EnvLoader};
use flashwire_entities::{EntityRecognizer, EntityTagger, RecognizedSpan, TaggerConfig};
use flashwire_extraction::Scraper;
use flashwire_geo::{Geotagger, GeotaggerConfig};
use flashwire_images::{
    DownloaderConfig, FinderConfig, ImageDownloader, ImageFinder, ImageHit, ImageSearch,
    ImageStore,
};
use flashwire_pipeline::{ArticlePipeline, FeedProcessor, FeedRepository};
use flashwire_proxy::StaticPool;
use flashwire_translate::{TranslationConfig, TranslationService};
use flashwire_types::{EnrichError, EnrichResult, ExtractResult, FeedEntry};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tower::util::ServiceExt;

// ----------------------------------------------------------------- fakes --

struct FakeScraper;

#[async_trait]
impl Scraper for FakeScraper {
    async fn extract(&self, url: &str) -> EnrichResult<ExtractResult> {
        if url.contains("broken") {
            return Err(EnrichError::scraping(url, "both stages failed"));
        }
        Ok(ExtractResult {
            url: url.to_string(),
            title: "Brazil hosts the summit".to_string(),
            content: "Brazil confirmed the summit. Brazil expects delegations. \
                      The plans continued through the year as agencies prepared."
                .repeat(4),
            word_count: 200,
            hostname: "example.com".to_string(),
            images: Vec::new(),
            ..Default::default()
        })
    }
}

struct NoopRecognizer;

#[async_trait]
impl EntityRecognizer for NoopRecognizer {
    async fn extract(&self, _text: &str) -> anyhow::Result<Vec<RecognizedSpan>> {
        Ok(Vec::new())
    }

    fn model_id(&self) -> &str {
        "noop"
    }
}

struct NoHits;

#[async_trait]
impl ImageSearch for NoHits {
    async fn search(
        &self,
        _query: &str,
        _region: &str,
        _proxy: Option<&str>,
    ) -> anyhow::Result<Vec<ImageHit>> {
        Ok(Vec::new())
    }
}

#[derive(Default)]
struct NullBucket;

#[async_trait]
impl ImageStore for NullBucket {
    async fn list(&self, _prefix: &str) -> anyhow::Result<Vec<String>> {
        Ok(Vec::new())
    }

    async fn remove(&self, _paths: &[String]) -> anyhow::Result<()> {
        Ok(())
    }

    async fn upload(&self, _path: &str, _bytes: Vec<u8>, _ct: &str) -> anyhow::Result<()> {
        Ok(())
    }

    async fn served_url(&self, path: &str) -> anyhow::Result<String> {
        Ok(format!("https://bucket.example.com/{path}"))
    }
}

#[derive(Default)]
struct MemoryRepository {
    entries: Mutex<HashMap<String, Vec<FeedEntry>>>,
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

    async fn upsert_enriched(&self, _date: &str, _entry: &FeedEntry) -> EnrichResult<()> {
        Ok(())
    }

    async fn health_check(&self) -> bool {
        true
    }
}

// --------------------------------------------------------------- helpers --

fn test_config_summary() -> ConfigSummary {
    let loader = EnvLoader::from_pairs([
        ("SUPABASE_URL", "https://proj.supabase.co"),
        ("SUPABASE_KEY", "anon"),
        ("SUPABASE_SERVICE_KEY", "service"),
        ("SUPABASE_IMAGE_BUCKET", "flashpoint-images"),
        ("SUPABASE_DB_URL", "postgres://u:p@localhost/db"),
        ("API_KEY", "test-key"),
        ("PROXY_BASE", "https://proxies.example.com"),
        ("PROXY_API_KEY", "pk"),
    ]);
    ConfigSummary::from(&AppConfig::from_loader(&loader).unwrap())
}

fn app_with_entries(
    entries: Vec<(String, Vec<FeedEntry>)>,
    require_api_key: bool,
) -> axum::Router {
    let pool = Arc::new(StaticPool::empty());
    let pipeline = Arc::new(ArticlePipeline::new(
        Arc::new(FakeScraper),
        Arc::new(TranslationService::with_backends(
            TranslationConfig::default(),
            Vec::new(),
        )),
        Arc::new(EntityTagger::new(
            TaggerConfig::default(),
            Arc::new(NoopRecognizer),
        )),
        Arc::new(Geotagger::new(GeotaggerConfig::default())),
        Arc::new(ImageFinder::new(
            FinderConfig::default(),
            Arc::new(NoHits),
            pool.clone(),
        )),
        Arc::new(ImageDownloader::new(
            DownloaderConfig::default(),
            Arc::new(NullBucket),
        )),
        pool,
    ));

    let repository = Arc::new(MemoryRepository::default());
    {
        let mut map = repository.entries.lock().unwrap();
        for (date, dated_entries) in entries {
            map.insert(date, dated_entries);
        }
    }

    let processor = Arc::new(FeedProcessor::new(repository, pipeline, 2));
    let state = AppState::new(
        processor,
        None,
        "test-key",
        require_api_key,
        FeatureFlags {
            geotagging: true,
            image_search: true,
            image_download: true,
            clean_text: true,
        },
        test_config_summary(),
    );
    build_router(state)
}

fn entry(id: &str, flashpoint: &str) -> FeedEntry {
    FeedEntry {
        id: id.to_string(),
        flashpoint_id: flashpoint.to_string(),
        url: format!("https://example.com/{id}"),
        title: "Title".to_string(),
        ..Default::default()
    }
}

fn get(path: &str) -> Request<Body> {
    Request::builder()
        .uri(path)
        .header("x-api-key", "test-key")
        .body(Body::empty())
        .unwrap()
}

fn post_json(path: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(path)
        .header("content-type", "application/json")
        .header("x-api-key", "test-key")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

// ----------------------------------------------------------------- tests --

#[tokio::test]
async fn root_and_ready_are_open() {
    let app = app_with_entries(Vec::new(), true);

    let response = app
        .clone()
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "operational");

    let response = app
        .oneshot(Request::builder().uri("/ready").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "ready");
}

#[tokio::test]
async fn protected_routes_require_the_key() {
    let app = app_with_entries(Vec::new(), true);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/feed/stats")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/feed/stats")
                .header("x-api-key", "wrong")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // Bearer form works too.
    let response = app
        .oneshot(
            Request::builder()
                .uri("/feed/stats")
                .header("authorization", "Bearer test-key")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn warmup_reports_loaded_entries() {
    let app = app_with_entries(
        vec![(
            "2025-07-02".to_string(),
            vec![entry("a1", "fp1"), entry("a2", "fp1")],
        )],
        true,
    );

    let response = app
        .oneshot(post_json("/feed/warmup", serde_json::json!({"date": "2025-07-02"})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "warmed_up");
    assert_eq!(body["total_entries"], 2);
}

#[tokio::test]
async fn missing_partition_is_404_with_table_detail() {
    let app = app_with_entries(Vec::new(), true);
    let response = app
        .oneshot(post_json("/feed/warmup", serde_json::json!({"date": "2099-01-01"})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_json(response).await;
    assert_eq!(body["detail"], "Table feed_entries_20990101 not available");
}

#[tokio::test]
async fn malformed_date_is_400() {
    let app = app_with_entries(Vec::new(), true);
    let response = app
        .clone()
        .oneshot(post_json("/feed/warmup", serde_json::json!({"date": "20990101"})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .oneshot(get("/feed/entries/not-a-date"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn background_trigger_returns_started_immediately() {
    let entries: Vec<FeedEntry> = (0..10)
        .map(|i| entry(&format!("a{i}"), "fp1"))
        .collect();
    let app = app_with_entries(vec![("2025-07-02".to_string(), entries)], true);

    let started = std::time::Instant::now();
    let response = app
        .oneshot(post_json(
            "/feed/process",
            serde_json::json!({"date": "2025-07-02", "trigger": dto::BACKGROUND_TRIGGER}),
        ))
        .await
        .unwrap();
    assert!(started.elapsed().as_millis() < 100);
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "started");
    assert_eq!(body["total_entries"], 0);
}

#[tokio::test]
async fn blocking_process_returns_the_summary() {
    let app = app_with_entries(
        vec![(
            "2025-07-02".to_string(),
            vec![entry("ok1", "fp1"), entry("broken-1", "fp1")],
        )],
        true,
    );

    let response = app
        .oneshot(post_json(
            "/feed/process",
            serde_json::json!({"date": "2025-07-02"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "completed");
    assert_eq!(body["total_articles"], 2);
    assert_eq!(body["successful"], 1);
    assert_eq!(body["failed"], 1);
}

#[tokio::test]
async fn flashpoint_route_requires_the_id() {
    let app = app_with_entries(Vec::new(), true);
    let response = app
        .oneshot(post_json(
            "/feed/process/flashpoint",
            serde_json::json!({"date": "2025-07-02"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn article_route_requires_all_three_fields() {
    let app = app_with_entries(Vec::new(), true);
    let response = app
        .oneshot(post_json(
            "/feed/process/article",
            serde_json::json!({"date": "2025-07-02", "flashpoint_id": "fp1"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn batch_articles_requires_a_non_empty_list() {
    let app = app_with_entries(Vec::new(), true);
    let response = app
        .oneshot(post_json(
            "/feed/process/batch_articles",
            serde_json::json!({"date": "2025-07-02", "articles_ids": []}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn entries_and_clear_round_trip() {
    let app = app_with_entries(
        vec![("2025-07-02".to_string(), vec![entry("a1", "fp1")])],
        true,
    );

    // Warm first so the cache has something to show.
    let response = app
        .clone()
        .oneshot(post_json("/feed/warmup", serde_json::json!({"date": "2025-07-02"})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(get("/feed/entries/2025-07-02"))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["total_entries"], 1);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri("/feed/clear/2025-07-02")
                .header("x-api-key", "test-key")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(get("/feed/entries/2025-07-02"))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["total_entries"], 0);
}

#[tokio::test]
async fn stats_reports_uptime_and_config() {
    let app = app_with_entries(Vec::new(), true);
    let response = app.oneshot(get("/stats")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert!(body["uptime"].as_f64().unwrap() >= 0.0);
    assert_eq!(body["thread_pool_stats"]["max_workers"], 4);
}

#[tokio::test]
async fn auth_can_be_disabled() {
    let app = app_with_entries(Vec::new(), false);
    let response = app
        .oneshot(
            Request::builder()
                .uri("/feed/stats")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
