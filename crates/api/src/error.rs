use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use reelswap_core::error::CoreError;
use serde_json::json;

/// Application-level error type for HTTP handlers.
///
/// Wraps [`CoreError`] for domain errors and adds HTTP-specific variants.
/// Implements [`IntoResponse`] to produce consistent `{ error, code }` JSON
/// responses; remote failures never escape as unhandled faults.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `reelswap_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A bad request with a human-readable message.
    #[error("Bad request: {0}")]
    BadRequest(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Core(core) => match core {
                CoreError::Config(msg) => {
                    tracing::error!(error = %msg, "Configuration error");
                    (StatusCode::INTERNAL_SERVER_ERROR, "CONFIG_ERROR", msg.clone())
                }
                CoreError::Validation(msg) => {
                    (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
                }
                CoreError::Upstream(msg) => {
                    tracing::error!(error = %msg, "Upstream error");
                    (StatusCode::INTERNAL_SERVER_ERROR, "UPSTREAM_ERROR", msg.clone())
                }
                CoreError::Timeout { .. } => {
                    (StatusCode::GATEWAY_TIMEOUT, "TIMEOUT", core.to_string())
                }
                CoreError::Parse(msg) => (StatusCode::BAD_REQUEST, "PARSE_ERROR", msg.clone()),
                CoreError::Cancelled(msg) => {
                    tracing::warn!(error = %msg, "Operation cancelled");
                    (StatusCode::INTERNAL_SERVER_ERROR, "CANCELLED", core.to_string())
                }
            },

            // --- HTTP-specific errors ---
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
        };

        let body = json!({
            "error": message,
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}
