use crate::dto::{
    ProcessArticleRequest, ProcessBatchArticlesRequest, ProcessFlashpointRequest, ProcessRequest,
    StartedResponse, WarmupRequest, BACKGROUND_TRIGGER,
};
use crate::errors::ApiError;
use crate::health;
use crate::state::AppState;
use axum::extract::{Path, State};
use axum::Json;
use chrono::Utc;
use flashwire_types::EnrichError;
use serde_json::{json, Value};
use tracing::{error, info};

fn today() -> String {
    Utc::now().format("%Y-%m-%d").to_string()
}

fn date_or_today(date: Option<String>) -> String {
    date.filter(|d| !d.is_empty()).unwrap_or_else(today)
}

fn required(value: Option<String>, field: &str) -> Result<String, ApiError> {
    value
        .filter(|v| !v.is_empty())
        .ok_or_else(|| EnrichError::validation(format!("{field} is required")).into())
}

fn is_background(trigger: &Option<String>) -> bool {
    trigger.as_deref() == Some(BACKGROUND_TRIGGER)
}

pub async fn root() -> Json<Value> {
    Json(json!({
        "message": "Flashwire news enrichment pipeline API",
        "version": env!("CARGO_PKG_VERSION"),
        "status": "operational",
        "endpoints": {
            "health": "/health",
            "stats": "/stats",
            "warmup": "/feed/warmup",
            "process": "/feed/process",
            "process_flashpoint": "/feed/process/flashpoint",
            "process_article": "/feed/process/article",
            "process_batch_articles": "/feed/process/batch_articles",
            "entries": "/feed/entries/{date}",
            "feed_stats": "/feed/stats",
            "clear": "/feed/clear",
        },
    }))
}

pub async fn ready() -> Json<Value> {
    Json(json!({ "status": "ready" }))
}

pub async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(health::health_report(&state).await)
}

pub async fn stats(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let feed_stats = state.processor().stats().await;
    let proxy_stats = match state.proxy_service() {
        Some(proxy) => serde_json::to_value(proxy.stats().await)
            .map_err(|e| ApiError::Internal(e.to_string()))?,
        None => Value::Null,
    };

    Ok(Json(json!({
        "pipeline_stats": feed_stats,
        "thread_pool_stats": { "max_workers": state.config_summary().max_workers },
        "database_stats": { "healthy": state.processor().health_check().await },
        "proxy_stats": proxy_stats,
        "config": state.config_summary(),
        "uptime": state.uptime_secs(),
    })))
}

pub async fn feed_warmup(
    State(state): State<AppState>,
    Json(request): Json<WarmupRequest>,
) -> Result<Json<Value>, ApiError> {
    let date = date_or_today(request.date);
    let report = state.processor().warm_up(&date).await?;
    Ok(Json(serde_json::to_value(report).map_err(|e| {
        ApiError::Internal(e.to_string())
    })?))
}

pub async fn feed_process(
    State(state): State<AppState>,
    Json(request): Json<ProcessRequest>,
) -> Result<Json<Value>, ApiError> {
    let date = date_or_today(request.date);
    flashwire_utils::dates::validate_wire_date(&date)?;

    if is_background(&request.trigger) {
        let processor = state.processor().clone();
        let background_date = date.clone();
        tokio::spawn(async move {
            info!(date = %background_date, "Background feed processing started");
            match processor.process_all(&background_date, true).await {
                Ok(summary) => info!(
                    date = %background_date,
                    successful = summary.successful,
                    failed = summary.failed,
                    "Background feed processing finished"
                ),
                Err(err) => error!(date = %background_date, error = %err, "Background feed processing failed"),
            }
        });
        return Ok(Json(
            serde_json::to_value(StartedResponse::for_date(&date, "Feed processing"))
                .map_err(|e| ApiError::Internal(e.to_string()))?,
        ));
    }

    let summary = state.processor().process_all(&date, true).await?;
    Ok(Json(serde_json::to_value(summary).map_err(|e| {
        ApiError::Internal(e.to_string())
    })?))
}

pub async fn feed_process_flashpoint(
    State(state): State<AppState>,
    Json(request): Json<ProcessFlashpointRequest>,
) -> Result<Json<Value>, ApiError> {
    let date = date_or_today(request.date);
    let flashpoint_id = required(request.flashpoint_id, "flashpoint_id")?;

    if is_background(&request.trigger) {
        let processor = state.processor().clone();
        let background_date = date.clone();
        let background_fp = flashpoint_id.clone();
        tokio::spawn(async move {
            if let Err(err) = processor
                .process_by_flashpoint(&background_date, &background_fp)
                .await
            {
                error!(
                    date = %background_date,
                    flashpoint_id = %background_fp,
                    error = %err,
                    "Background flashpoint processing failed"
                );
            }
        });
        return Ok(Json(
            serde_json::to_value(StartedResponse::for_date(&date, "Flashpoint processing"))
                .map_err(|e| ApiError::Internal(e.to_string()))?,
        ));
    }

    let summary = state
        .processor()
        .process_by_flashpoint(&date, &flashpoint_id)
        .await?;
    let mut body = serde_json::to_value(summary).map_err(|e| ApiError::Internal(e.to_string()))?;
    if let Some(map) = body.as_object_mut() {
        map.insert("flashpoint_id".to_string(), json!(flashpoint_id));
        map.insert("date".to_string(), json!(date));
    }
    Ok(Json(body))
}

pub async fn feed_process_article(
    State(state): State<AppState>,
    Json(request): Json<ProcessArticleRequest>,
) -> Result<Json<Value>, ApiError> {
    let date = required(request.date, "date")?;
    let flashpoint_id = required(request.flashpoint_id, "flashpoint_id")?;
    let article_id = required(request.article_id, "article_id")?;

    let result = state
        .processor()
        .process_by_article(&date, &flashpoint_id, &article_id)
        .await?;
    Ok(Json(serde_json::to_value(result).map_err(|e| {
        ApiError::Internal(e.to_string())
    })?))
}

pub async fn feed_process_batch_articles(
    State(state): State<AppState>,
    Json(request): Json<ProcessBatchArticlesRequest>,
) -> Result<Json<Value>, ApiError> {
    let date = required(request.date, "date")?;
    if request.articles_ids.is_empty() {
        return Err(EnrichError::validation("articles_ids must not be empty").into());
    }

    let summary = state
        .processor()
        .process_articles(&date, &request.articles_ids)
        .await?;
    Ok(Json(serde_json::to_value(summary).map_err(|e| {
        ApiError::Internal(e.to_string())
    })?))
}

pub async fn feed_entries(
    State(state): State<AppState>,
    Path(date): Path<String>,
) -> Result<Json<Value>, ApiError> {
    flashwire_utils::dates::validate_wire_date(&date)?;
    let entries = state.processor().entries(&date).await;
    Ok(Json(json!({
        "date": date,
        "total_entries": entries.len(),
        "entries": entries,
    })))
}

pub async fn feed_stats(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let stats = state.processor().stats().await;
    Ok(Json(serde_json::to_value(stats).map_err(|e| {
        ApiError::Internal(e.to_string())
    })?))
}

pub async fn feed_clear_date(
    State(state): State<AppState>,
    Path(date): Path<String>,
) -> Result<Json<Value>, ApiError> {
    flashwire_utils::dates::validate_wire_date(&date)?;
    state.processor().clear(Some(&date)).await;
    Ok(Json(json!({ "status": "cleared", "date": date })))
}

pub async fn feed_clear_all(State(state): State<AppState>) -> Json<Value> {
    state.processor().clear(None).await;
    Json(json!({ "status": "cleared" }))
}
