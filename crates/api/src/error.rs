use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use lostsons_core::error::CoreError;
use lostsons_db::StoreError;
use lostsons_mux::webhook::WebhookError;
use lostsons_mux::ProviderError;
use lostsons_pipeline::PipelineError;
use serde_json::json;

use crate::auth::discord::DiscordError;

/// Application-level error type for HTTP handlers.
///
/// Wraps the error enums of the library crates and adds HTTP-specific
/// variants. Implements [`IntoResponse`] to produce `{"error": "<message>"}`.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `lostsons_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A failed submit, read, delete, or webhook resolution.
    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error(transparent)]
    Webhook(#[from] WebhookError),

    #[error(transparent)]
    Discord(#[from] DiscordError),

    /// The multipart body could not be read (malformed, or over the limit).
    #[error(transparent)]
    Multipart(#[from] MultipartError),

    /// A bad request with a human-readable message.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// An internal error with a human-readable message.
    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::Core(core) => classify_core_error(core),
            AppError::Pipeline(pipeline) => match pipeline {
                PipelineError::Invalid(core) => classify_core_error(core),
                PipelineError::Provider(provider) => classify_provider_error(provider),
                PipelineError::Store(store) => classify_store_error(store),
                PipelineError::Staging(err) => {
                    tracing::error!(error = %err, "Failed to stage upload");
                    internal()
                }
            },
            AppError::Webhook(err) => match err {
                WebhookError::Malformed(_) | WebhookError::MissingPlaybackId(_) => {
                    (StatusCode::BAD_REQUEST, err.to_string())
                }
                WebhookError::MissingSignature
                | WebhookError::InvalidSignature
                | WebhookError::Expired => (StatusCode::UNAUTHORIZED, err.to_string()),
            },
            AppError::Discord(err) => {
                tracing::warn!(error = %err, "Discord login failed");
                (StatusCode::BAD_GATEWAY, "Discord login failed".to_string())
            }
            AppError::Multipart(err) => (err.status(), err.body_text()),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::InternalError(msg) => {
                tracing::error!(error = %msg, "Internal error");
                internal()
            }
        };

        (status, axum::Json(json!({ "error": message }))).into_response()
    }
}

fn internal() -> (StatusCode, String) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "An internal error occurred".to_string(),
    )
}

fn classify_core_error(err: &CoreError) -> (StatusCode, String) {
    match err {
        CoreError::NotFound { entity, id } => {
            (StatusCode::NOT_FOUND, format!("{entity} with id {id} not found"))
        }
        CoreError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
        CoreError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg.clone()),
    }
}

/// Repository errors: not-found is 404, uniqueness is 409, and anything the
/// database itself raised is a sanitized 500.
fn classify_store_error(err: &StoreError) -> (StatusCode, String) {
    match err {
        StoreError::NotFound(id) => (StatusCode::NOT_FOUND, format!("Clip {id} not found")),
        StoreError::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),
        StoreError::Database(db_err) => {
            tracing::error!(error = %db_err, "Database error");
            internal()
        }
    }
}

fn classify_provider_error(err: &ProviderError) -> (StatusCode, String) {
    match err {
        ProviderError::NotFound(asset_id) => (
            StatusCode::NOT_FOUND,
            format!("Asset {asset_id} not found at video provider"),
        ),
        other => {
            tracing::error!(error = %other, "Video provider error");
            (
                StatusCode::BAD_GATEWAY,
                "Video provider request failed".to_string(),
            )
        }
    }
}
