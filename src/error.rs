use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use chrono::Utc;
use thiserror::Error;

use crate::adapter::AdapterError;
use crate::config::ConfigError;
use crate::envelope;

pub type Result<T> = std::result::Result<T, Assure360Error>;

#[derive(Debug, Error)]
pub enum Assure360Error {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Adapter(#[from] AdapterError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("lambda runtime error: {0}")]
    Lambda(String),
}

/// Request-level failures, rendered as JSON error envelopes.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("no route for {path}")]
    NotFound { path: String },
    #[error("internal fault: {0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let now = Utc::now();
        match self {
            ApiError::NotFound { path } => {
                (StatusCode::NOT_FOUND, Json(envelope::not_found(&path, now))).into_response()
            }
            ApiError::Internal(cause) => {
                tracing::error!(%cause, "internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(envelope::internal_error(now)),
                )
                    .into_response()
            }
        }
    }
}
