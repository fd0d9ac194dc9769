use axum::Json;
use axum::response::{IntoResponse, Response};
use http::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    /// The model answered with no text at all; nothing to recover from.
    #[error("the model returned an empty response")]
    GenerationEmpty,

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("model request failed: {0}")]
    Model(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, AppError>;

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            AppError::GenerationEmpty | AppError::Model(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            AppError::Model(e) => tracing::error!(error = ?e, "Model request failed"),
            AppError::GenerationEmpty => tracing::error!("Model returned an empty response"),
            AppError::InvalidRequest(msg) => tracing::debug!(%msg, "Rejected request"),
        }
        (status, Json(serde_json::json!({ "error": self.to_string() }))).into_response()
    }
}
