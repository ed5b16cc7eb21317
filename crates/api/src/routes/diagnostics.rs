//! Model diagnostics and metrics exposition

use crate::AppState;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use inference_engine::{ArtifactKinds, ColumnSource};
use serde::Serialize;
use std::sync::Arc;

/// Columns shown per list
const SAMPLE_LEN: usize = 10;

/// Snapshot of what was loaded and how the column layouts were recovered
#[derive(Debug, Default, Serialize)]
pub struct ModelDiagnostics {
    pub model_load_error: Option<String>,
    pub models_dir: Option<String>,
    pub feature_columns_len: Option<usize>,
    pub scaler_columns_len: Option<usize>,
    pub feature_columns_sample: Option<Vec<String>>,
    pub scaler_columns_sample: Option<Vec<String>>,
    pub feature_columns_source: Option<ColumnSource>,
    pub scaler_columns_source: Option<ColumnSource>,
    pub detection_model_n_features_in: Option<usize>,
    pub scaler_n_features_in: Option<usize>,
    pub schema_id: Option<String>,
    pub artifact_kinds: Option<ArtifactKinds>,
}

fn sample(columns: Option<&[String]>) -> Option<Vec<String>> {
    columns.map(|c| c.iter().take(SAMPLE_LEN).cloned().collect())
}

pub async fn debug_models(State(state): State<Arc<AppState>>) -> Json<ModelDiagnostics> {
    let mut report = ModelDiagnostics {
        model_load_error: state.load_error.clone(),
        models_dir: state.models_dir.as_ref().map(|d| d.display().to_string()),
        ..Default::default()
    };

    if let Some(engine) = &state.engine {
        let models = engine.models();
        report.feature_columns_len = models.feature_columns().map(<[String]>::len);
        report.scaler_columns_len = models.scaler_columns().map(<[String]>::len);
        report.feature_columns_sample = sample(models.feature_columns());
        report.scaler_columns_sample = sample(models.scaler_columns());
        report.feature_columns_source = models.feature_source();
        report.scaler_columns_source = models.scaler_source();
        report.detection_model_n_features_in = models.detection().n_features_in();
        report.scaler_n_features_in = models.scaler().n_features_in();
        report.schema_id = models.schema_id().map(str::to_string);
        report.artifact_kinds = Some(models.kinds().clone());
    }

    Json(report)
}

/// Prometheus text exposition
pub async fn metrics(State(state): State<Arc<AppState>>) -> Response {
    match &state.metrics {
        Some(handle) => (
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            handle.render(),
        )
            .into_response(),
        None => (StatusCode::SERVICE_UNAVAILABLE, "metrics recorder not installed").into_response(),
    }
}
