use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use vidra_core::error::CoreError;
use vidra_engine::{EngineError, WebhookError};

/// Application-level error type for HTTP handlers.
///
/// Wraps [`CoreError`] and [`EngineError`] for domain errors and adds
/// HTTP-specific variants. Implements [`IntoResponse`] to produce
/// consistent `{"error", "code"}` JSON bodies.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `vidra_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// An error from the orchestration engine.
    #[error(transparent)]
    Engine(#[from] EngineError),

    /// A bad request with a human-readable message.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Download requested for an unsupported artifact kind.
    #[error("Unknown artifact kind: {0}")]
    UnknownKind(String),

    /// An internal error with a human-readable message.
    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl From<WebhookError> for AppError {
    fn from(err: WebhookError) -> Self {
        match err {
            WebhookError::Unauthorized => {
                AppError::Core(CoreError::Unauthorized(err.to_string()))
            }
            WebhookError::Malformed(msg) => AppError::BadRequest(msg),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Core(core) => classify_core_error(core),

            AppError::Engine(engine) => match engine {
                EngineError::Core(core) => classify_core_error(core),
                EngineError::JobNotFound(id) => (
                    StatusCode::NOT_FOUND,
                    "NOT_FOUND",
                    format!("Job {id} not found"),
                ),
                EngineError::ParentNotReady { state } => (
                    StatusCode::CONFLICT,
                    "PARENT_NOT_READY",
                    format!("Parent job is not completed (state: {state})"),
                ),
                EngineError::NotReady { state } => (
                    StatusCode::CONFLICT,
                    "NOT_READY",
                    format!("Job artifacts are not ready (state: {state})"),
                ),
                EngineError::Provider(err) => {
                    tracing::error!(error = %err, "Provider request failed");
                    (
                        StatusCode::BAD_GATEWAY,
                        "PROVIDER_ERROR",
                        "Provider request failed".to_string(),
                    )
                }
                EngineError::Store(err) => {
                    tracing::error!(error = %err, "Store error on request path");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "INTERNAL_ERROR",
                        "An internal error occurred".to_string(),
                    )
                }
                EngineError::Internal(msg) => {
                    tracing::error!(error = %msg, "Internal engine error");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "INTERNAL_ERROR",
                        "An internal error occurred".to_string(),
                    )
                }
            },

            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
            AppError::UnknownKind(kind) => (
                StatusCode::BAD_REQUEST,
                "UNKNOWN_KIND",
                format!("Unknown artifact kind: {kind}"),
            ),
            AppError::InternalError(msg) => {
                tracing::error!(error = %msg, "Internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal error occurred".to_string(),
                )
            }
        };

        let body = json!({
            "error": message,
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}

/// Map a [`CoreError`] to an HTTP status, error code, and message.
fn classify_core_error(err: &CoreError) -> (StatusCode, &'static str, String) {
    match err {
        CoreError::NotFound { entity, id } => (
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            format!("{entity} with id {id} not found"),
        ),
        CoreError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
        CoreError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg.clone()),
        CoreError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg.clone()),
        CoreError::Internal(msg) => {
            tracing::error!(error = %msg, "Internal core error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "An internal error occurred".to_string(),
            )
        }
    }
}
