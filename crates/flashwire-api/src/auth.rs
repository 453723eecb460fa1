use crate::errors::ApiError;
use crate::state::AppState;
use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;
use flashwire_types::EnrichError;

/// Paths that stay open without a key.
const OPEN_PATHS: &[&str] = &["/", "/ready"];

/// Shared-key check: `X-API-Key: <key>` or `Authorization: Bearer <key>`.
pub async fn require_api_key(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if !state.require_api_key() || OPEN_PATHS.contains(&request.uri().path()) {
        return Ok(next.run(request).await);
    }

    let headers = request.headers();
    let provided = headers
        .get("x-api-key")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .or_else(|| {
            headers
                .get(axum::http::header::AUTHORIZATION)
                .and_then(|v| v.to_str().ok())
                .map(|v| v.strip_prefix("Bearer ").unwrap_or(v).to_string())
        });

    match provided {
        None => Err(EnrichError::auth(
            "API key required. Provide X-API-Key or Authorization header",
        )
        .into()),
        Some(key) if key == state.api_key() => Ok(next.run(request).await),
        Some(_) => Err(EnrichError::auth("Invalid API key").into()),
    }
}
