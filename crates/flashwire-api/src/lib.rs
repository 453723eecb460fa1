//! HTTP control plane for the enrichment pipeline.
//!
//! A thin axum facade over the feed processor: warm-up and processing
//! triggers (synchronous or fire-and-forget), cached-entry accessors,
//! health and stats. All state is owned by an explicitly constructed
//! [`state::AppState`]; there are no module-level singletons.

pub mod auth;
pub mod dto;
pub mod errors;
pub mod handlers;
pub mod health;
pub mod state;

use axum::routing::{delete, get, post};
use axum::{middleware, Router};
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Assemble the full router over an application state.
pub fn build_router(state: state::AppState) -> Router {
    Router::new()
        .route("/", get(handlers::root))
        .route("/ready", get(handlers::ready))
        .route("/health", get(handlers::health))
        .route("/stats", get(handlers::stats))
        .route("/feed/warmup", post(handlers::feed_warmup))
        .route("/feed/process", post(handlers::feed_process))
        .route(
            "/feed/process/flashpoint",
            post(handlers::feed_process_flashpoint),
        )
        .route("/feed/process/article", post(handlers::feed_process_article))
        .route(
            "/feed/process/batch_articles",
            post(handlers::feed_process_batch_articles),
        )
        .route("/feed/entries/:date", get(handlers::feed_entries))
        .route("/feed/stats", get(handlers::feed_stats))
        .route("/feed/clear/:date", delete(handlers::feed_clear_date))
        .route("/feed/clear", delete(handlers::feed_clear_all))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_api_key,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .layer(CompressionLayer::new())
        .with_state(state)
}
