//! Fault prediction endpoint

use crate::{ApiError, AppState};
use axum::body::Bytes;
use axum::extract::State;
use axum::Json;
use inference_engine::Diagnosis;
use metrics::{counter, histogram};
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

/// Predict a fault from one telemetry snapshot. The body is read as JSON
/// whatever its content type.
pub async fn predict(State(state): State<Arc<AppState>>, body: Bytes) -> Result<Json<Diagnosis>, ApiError> {
    let engine = state.engine.clone().ok_or_else(|| {
        ApiError::ModelsUnavailable(
            state
                .load_error
                .clone()
                .unwrap_or_else(|| "Models are not loaded".to_string()),
        )
    })?;
    engine.ensure_ready()?;

    let payload: Value =
        serde_json::from_slice(&body).map_err(|e| ApiError::BadRequest(format!("Invalid JSON body: {}", e)))?;

    let start = Instant::now();
    let result = engine.predict_async(payload).await;
    histogram!("fault_prediction_latency_seconds").record(start.elapsed().as_secs_f64());

    match result {
        Ok(result) => {
            let outcome = if result.diagnosis.is_fault() { "fault" } else { "no_fault" };
            counter!("fault_predictions_total", "outcome" => outcome).increment(1);
            debug!(outcome, latency_ms = result.latency_ms, "Prediction served");
            Ok(Json(result.diagnosis))
        }
        Err(e) => {
            counter!("fault_predictions_total", "outcome" => "error").increment(1);
            Err(e.into())
        }
    }
}
