use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde_json::json;
use thiserror::Error;

/// Application error taxonomy.
///
/// Capacity overflow is deliberately absent: landing on the waitlist is
/// a normal successful outcome, not a failure.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("invalid weekday: '{0}'")]
    InvalidWeekday(String),
    #[error("invalid time format: '{0}'")]
    InvalidTimeFormat(String),
    #[error("{0}")]
    Validation(String),
    #[error("{0} not found")]
    NotFound(String),
    #[error("chat transport error: {0}")]
    Transport(String),
    #[error("database unavailable: {0}")]
    Persistence(#[from] sqlx::Error),
    #[error("unauthorized")]
    Unauthorized,
    #[error("forbidden")]
    Forbidden,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::InvalidWeekday(_)
            | AppError::InvalidTimeFormat(_)
            | AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::Transport(_) => StatusCode::BAD_GATEWAY,
            AppError::Persistence(_) => StatusCode::SERVICE_UNAVAILABLE,
        };

        if let AppError::Persistence(e) = &self {
            tracing::error!("Database error surfaced to client: {}", e);
        }

        (status, Json(json!({ "success": false, "error": self.to_string() }))).into_response()
    }
}
