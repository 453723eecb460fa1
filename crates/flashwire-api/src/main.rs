use flashwire_api::state::{AppState, FeatureFlags};
use flashwire_config::{AppConfig, ConfigSummary};
use flashwire_entities::{EntityTagger, HttpNerClient, TaggerConfig};
use flashwire_extraction::{
    ContentExtractor, ExtractorConfig, HeadlessRenderer, RendererConfig,
};
use flashwire_geo::{Geotagger, GeotaggerConfig};
use flashwire_images::{
    DownloaderConfig, DuckDuckGoImages, FinderConfig, ImageDownloader, ImageFinder,
};
use flashwire_pipeline::{ArticlePipeline, FeedProcessor};
use flashwire_proxy::{ProxyConfig, ProxyService};
use flashwire_store::{BucketConfig, BucketStorage, FeedStore};
use flashwire_translate::{TranslationConfig, TranslationService};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    let exit_code = match run().await {
        Ok(()) => 0,
        Err(err) => {
            eprintln!("fatal: {err:#}");
            1
        }
    };
    std::process::exit(exit_code);
}

async fn run() -> anyhow::Result<()> {
    let config = AppConfig::from_env()?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level)),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        host = %config.host,
        port = config.port,
        max_workers = config.max_workers,
        "Starting Flashwire API server"
    );

    let (state, store, proxy_service) = build_application(&config).await?;
    let app = flashwire_api::build_router(state);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(addr = %addr, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Graceful teardown: stop the refresher, close the pool.
    if let Some(proxy) = proxy_service {
        proxy.stop_refresher().await;
    }
    store.close().await;
    tracing::info!("Server shutdown completed");
    Ok(())
}

async fn build_application(
    config: &AppConfig,
) -> anyhow::Result<(AppState, Arc<FeedStore>, Option<Arc<ProxyService>>)> {
    // Shared outbound services.
    let proxy_service = ProxyService::new(ProxyConfig {
        start_endpoint: config.proxy_post_start_service.clone(),
        proxies_endpoint: config.proxy_get_proxies.clone(),
        ..ProxyConfig::new(config.proxy_base.clone(), config.proxy_api_key.clone())
    })?;

    let translator = Arc::new(TranslationService::new(TranslationConfig::default()));

    let renderer = Arc::new(HeadlessRenderer::new(RendererConfig::default()));
    let scraper = Arc::new(ContentExtractor::new(
        ExtractorConfig {
            request_timeout: Duration::from_secs(config.request_timeout_secs),
            retry_attempts: config.retry_attempts,
            retry_initial_delay: Duration::from_secs_f64(config.retry_delay_secs),
            clean_text: config.enable_clean_text,
            ..Default::default()
        },
        proxy_service.clone(),
        renderer,
    ));

    let entity_tagger = Arc::new(EntityTagger::new(
        TaggerConfig::default(),
        Arc::new(HttpNerClient::new(
            config.ner_endpoint.clone(),
            config.ner_api_key.clone(),
        )),
    ));

    let geotagger = Arc::new(Geotagger::new(GeotaggerConfig {
        enabled: config.enable_geotagging,
        ..Default::default()
    }));

    let image_finder = Arc::new(ImageFinder::new(
        FinderConfig {
            enabled: config.enable_image_search,
            ..Default::default()
        },
        Arc::new(DuckDuckGoImages::new()),
        proxy_service.clone(),
    ));

    let bucket = Arc::new(BucketStorage::new(BucketConfig {
        base_url: config.supabase_url.clone(),
        service_key: config.supabase_service_key.clone(),
        bucket: config.supabase_image_bucket.clone(),
        use_signed_urls: config.supabase_use_signed_urls,
        signed_url_expiry_secs: config.supabase_signed_url_expiry_secs,
    }));
    let image_downloader = Arc::new(ImageDownloader::new(
        DownloaderConfig {
            enabled: config.enable_image_download,
            max_bytes: config.image_download_max_bytes,
            max_concurrency: config.image_download_max_concurrency,
            ..Default::default()
        },
        bucket,
    ));

    let pipeline = Arc::new(ArticlePipeline::new(
        scraper,
        translator,
        entity_tagger,
        geotagger,
        image_finder,
        image_downloader,
        proxy_service.clone(),
    ));

    let store = Arc::new(
        FeedStore::connect(&config.supabase_db_url, config.db_batch_size.min(32) as u32).await?,
    );
    let processor = Arc::new(
        FeedProcessor::new(store.clone(), pipeline, config.max_workers)
            .with_proxy_service(proxy_service.clone()),
    );

    let state = AppState::new(
        processor,
        Some(proxy_service.clone()),
        config.api_key.clone(),
        config.require_api_key,
        FeatureFlags {
            geotagging: config.enable_geotagging,
            image_search: config.enable_image_search,
            image_download: config.enable_image_download,
            clean_text: config.enable_clean_text,
        },
        ConfigSummary::from(config),
    );

    Ok((state, store, Some(proxy_service)))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("install ctrl-c handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("SIGINT received, shutting down"),
        _ = terminate => tracing::info!("SIGTERM received, shutting down"),
    }
}
