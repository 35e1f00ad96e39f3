use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use pixarify_core::error::CoreError;
use serde_json::json;

/// Application-level error type for HTTP handlers.
///
/// Wraps [`CoreError`] for domain errors and adds HTTP-specific variants.
/// Implements [`IntoResponse`] to produce consistent JSON error responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `pixarify_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A bad request with a human-readable message.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// An internal error with a human-readable message.
    #[error("Internal error: {0}")]
    InternalError(String),
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

const INTERNAL_MESSAGE: &str = "An internal error occurred";

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message, details) = match &self {
            // --- CoreError variants ---
            AppError::Core(core) => match core {
                CoreError::InvalidInput(msg) => (
                    StatusCode::BAD_REQUEST,
                    "VALIDATION_ERROR",
                    msg.clone(),
                    None,
                ),
                CoreError::NotFound { entity, id } => (
                    StatusCode::NOT_FOUND,
                    "NOT_FOUND",
                    format!("{entity} with id {id} not found"),
                    None,
                ),
                CoreError::InvalidTransition { .. } | CoreError::InvalidUpdate(_) => {
                    tracing::warn!(error = %core, "Rejected job state change");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "INVALID_TRANSITION",
                        "Job state change not allowed".to_string(),
                        Some(core.to_string()),
                    )
                }
                CoreError::Backend(msg) => {
                    tracing::error!(error = %msg, "Generation backend error");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "BACKEND_ERROR",
                        "Generation failed".to_string(),
                        Some(msg.clone()),
                    )
                }
                CoreError::MalformedStory { reason, .. } => {
                    tracing::warn!(error = %reason, "Backend returned an unparseable story");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "PARSE_ERROR",
                        "Failed to parse story content".to_string(),
                        Some(reason.clone()),
                    )
                }
                CoreError::Internal(msg) => {
                    tracing::error!(error = %msg, "Internal core error");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "INTERNAL_ERROR",
                        INTERNAL_MESSAGE.to_string(),
                        None,
                    )
                }
            },

            // --- HTTP-specific errors ---
            AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone(), None)
            }
            AppError::InternalError(msg) => {
                tracing::error!(error = %msg, "Internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    INTERNAL_MESSAGE.to_string(),
                    None,
                )
            }
        };

        let mut body = json!({
            "error": message,
            "code": code,
        });
        if let Some(details) = details {
            body["details"] = json!(details);
        }
        if let AppError::Core(CoreError::MalformedStory { raw, .. }) = &self {
            body["rawContent"] = json!(raw);
        }

        (status, axum::Json(body)).into_response()
    }
}
