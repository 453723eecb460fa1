use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use flashwire_types::EnrichError;
use serde_json::json;
use thiserror::Error;

/// Control-plane error with an HTTP mapping.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    Enrich(#[from] EnrichError),

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Enrich(err) => match err {
                EnrichError::Validation(_) => StatusCode::BAD_REQUEST,
                EnrichError::Auth(_) => StatusCode::UNAUTHORIZED,
                EnrichError::TableMissing { .. } => StatusCode::NOT_FOUND,
                EnrichError::RateLimited(_) => StatusCode::SERVICE_UNAVAILABLE,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let detail = self.to_string();
        let body = if status == StatusCode::INTERNAL_SERVER_ERROR {
            json!({ "detail": detail, "type": "internal_error" })
        } else {
            json!({ "detail": detail })
        };
        (status, Json(body)).into_response()
    }
}
