//! Fault Inference Engine
//!
//! Locates and loads the trained model artifacts, scales assembled feature
//! frames and runs the staged detection/diagnosis pipeline.

mod artifact;
mod columns;
mod engine;
mod loader;
mod locator;
pub mod models;
mod scaling;

pub use artifact::{ArtifactEnvelope, ArtifactFormat, ModelArtifact, FORMAT_VERSION};
pub use columns::{ColumnContext, ColumnSource, ResolvedColumns};
pub use engine::{Diagnosis, InferenceEngine, InferenceResult};
pub use loader::{
    locate_and_load, ArtifactKinds, ArtifactLoader, LoadReport, ModelSet, DETECTION_MODEL_FILE,
    DIAGNOSIS_MODEL_FILE, REQUIRED_ARTIFACTS, SCALER_FILE, SEVERITY_MODEL_FILE, UNIT_MODEL_FILE,
};
pub use locator::{ArtifactLocator, MODELS_DIR_ENV, MODELS_DIR_NAME};
pub use models::{ClassLabel, InputSchema, ModelError, Predictor, Transformer};
pub use scaling::scale;

use data_validator::ValidationError;
use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

/// Errors while locating or loading model artifacts
#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("Models directory not found. Place a 'Models' folder in the repo root, or set MODELS_DIR env var to the absolute path.")]
    NotFound,
    #[error("Missing model files in {}: {files:?}", .dir.display())]
    MissingArtifacts { dir: PathBuf, files: Vec<String> },
    #[error("Failed to load {file}: {reason}")]
    CorruptArtifact { file: String, reason: String },
    #[error("Incompatible artifacts: {0}")]
    IncompatibleArtifacts(String),
}

/// What the scaler expected, reported alongside a scaling failure
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ExpectedColumns {
    Names(Vec<String>),
    Count(usize),
    Unknown,
}

/// Scaler transform failure with column diagnostics
#[derive(Debug, Clone, Error)]
#[error("Scaler transform error: {message}")]
pub struct ScalingError {
    pub message: String,
    /// First columns of the frame handed to the scaler
    pub provided_columns: Vec<String>,
    pub expected: ExpectedColumns,
}

/// Errors during a prediction request
#[derive(Debug, Error)]
pub enum InferenceError {
    #[error(transparent)]
    InvalidInput(#[from] ValidationError),
    #[error(transparent)]
    Scaling(#[from] ScalingError),
    #[error("Server is missing {0}. Please save feature_columns and scaler_columns into the Models folder.")]
    MissingColumnMetadata(&'static str),
    #[error("{model} model failed: {source}")]
    PredictionFailed {
        model: &'static str,
        #[source]
        source: ModelError,
    },
    #[error("Inference task failed: {0}")]
    TaskFailed(String),
}
