//! HTTP error mapping

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use inference_engine::InferenceError;
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

/// Errors returned by request handlers
#[derive(Debug, Error)]
pub enum ApiError {
    /// Artifacts failed to load at startup
    #[error("{0}")]
    ModelsUnavailable(String),
    #[error("{0}")]
    BadRequest(String),
    #[error(transparent)]
    Inference(#[from] InferenceError),
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::ModelsUnavailable(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Inference(e) => match e {
                InferenceError::MissingColumnMetadata(_) => StatusCode::INTERNAL_SERVER_ERROR,
                // Anything raised while serving a request is reported to the client
                InferenceError::InvalidInput(_)
                | InferenceError::Scaling(_)
                | InferenceError::PredictionFailed { .. }
                | InferenceError::TaskFailed(_) => StatusCode::BAD_REQUEST,
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = %self, "Request failed");
        } else {
            warn!(error = %self, "Request rejected");
        }

        let body = match &self {
            ApiError::Inference(InferenceError::Scaling(e)) => json!({
                "error": e.to_string(),
                "provided_columns_sample": e.provided_columns,
                "expected_scaler": e.expected,
            }),
            ApiError::Inference(
                e @ (InferenceError::InvalidInput(_)
                | InferenceError::PredictionFailed { .. }
                | InferenceError::TaskFailed(_)),
            ) => {
                json!({ "error": format!("An error occurred on the server: {}", e) })
            }
            other => json!({ "error": other.to_string() }),
        };

        (status, Json(body)).into_response()
    }
}
