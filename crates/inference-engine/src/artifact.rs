//! Serialized artifact formats
//!
//! Artifacts are written as postcard (primary, binary) or JSON (fallback).
//! Both carry the same [`ArtifactEnvelope`].

use crate::models::{
    ForestClassifier, ForestRegressor, LinearRegression, LogisticRegression, MinMaxScaler,
    OnnxParams, OnnxPredictor, Predictor, StandardScaler, Transformer,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Envelope version this build reads and writes
pub const FORMAT_VERSION: u32 = 1;

/// Encoding an artifact was decoded from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactFormat {
    Binary,
    Json,
}

/// On-disk wrapper around a fitted model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactEnvelope {
    pub format_version: u32,
    /// Fingerprint of the training schema; artifacts that declare one must
    /// agree
    #[serde(default)]
    pub schema_id: Option<String>,
    pub model: ModelArtifact,
}

/// Fitted model parameters, by model kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelArtifact {
    StandardScaler(StandardScaler),
    MinMaxScaler(MinMaxScaler),
    LogisticRegression(LogisticRegression),
    LinearRegression(LinearRegression),
    ForestClassifier(ForestClassifier),
    ForestRegressor(ForestRegressor),
    Onnx(OnnxParams),
}

impl ModelArtifact {
    /// Serialized kind name
    pub fn kind(&self) -> &'static str {
        match self {
            ModelArtifact::StandardScaler(_) => "standard_scaler",
            ModelArtifact::MinMaxScaler(_) => "min_max_scaler",
            ModelArtifact::LogisticRegression(_) => "logistic_regression",
            ModelArtifact::LinearRegression(_) => "linear_regression",
            ModelArtifact::ForestClassifier(_) => "forest_classifier",
            ModelArtifact::ForestRegressor(_) => "forest_regressor",
            ModelArtifact::Onnx(_) => "onnx",
        }
    }

    /// Validate and build a transformer runtime
    pub fn into_transformer(self) -> Result<Box<dyn Transformer>, String> {
        match self {
            ModelArtifact::StandardScaler(s) => Ok(Box::new(s.validated()?)),
            ModelArtifact::MinMaxScaler(s) => Ok(Box::new(s.validated()?)),
            other => Err(format!("expected a scaler, found {}", other.kind())),
        }
    }

    /// Validate and build a predictor runtime
    pub fn into_predictor(self) -> Result<Box<dyn Predictor>, String> {
        match self {
            ModelArtifact::LogisticRegression(m) => Ok(Box::new(m.validated()?)),
            ModelArtifact::LinearRegression(m) => Ok(Box::new(m.validated()?)),
            ModelArtifact::ForestClassifier(m) => Ok(Box::new(m.validated()?)),
            ModelArtifact::ForestRegressor(m) => Ok(Box::new(m.validated()?)),
            ModelArtifact::Onnx(params) => Ok(Box::new(OnnxPredictor::load(params)?)),
            other => Err(format!("expected a predictor, found {}", other.kind())),
        }
    }
}

impl ArtifactEnvelope {
    /// Wrap a model in a current-version envelope
    pub fn new(model: ModelArtifact) -> Self {
        Self {
            format_version: FORMAT_VERSION,
            schema_id: None,
            model,
        }
    }

    pub fn with_schema_id(mut self, schema_id: impl Into<String>) -> Self {
        self.schema_id = Some(schema_id.into());
        self
    }

    pub fn to_binary(&self) -> Result<Vec<u8>, String> {
        postcard::to_allocvec(self).map_err(|e| e.to_string())
    }

    pub fn to_json(&self) -> Result<Vec<u8>, String> {
        serde_json::to_vec_pretty(self).map_err(|e| e.to_string())
    }

    /// Decode binary first, then JSON
    pub fn decode(bytes: &[u8]) -> Result<(Self, ArtifactFormat), String> {
        decode_with_fallback(bytes, |envelope: &Self| {
            if envelope.format_version == FORMAT_VERSION {
                Ok(())
            } else {
                Err(format!(
                    "unsupported format version {} (expected {})",
                    envelope.format_version, FORMAT_VERSION
                ))
            }
        })
    }
}

/// Decode a value as postcard, falling back to JSON.
///
/// `check` runs on each successful decode; a binary decode it rejects still
/// falls through to JSON. The error names both failures.
pub(crate) fn decode_with_fallback<T, F>(bytes: &[u8], check: F) -> Result<(T, ArtifactFormat), String>
where
    T: DeserializeOwned,
    F: Fn(&T) -> Result<(), String>,
{
    let binary_err = match postcard::from_bytes::<T>(bytes) {
        Ok(value) => match check(&value) {
            Ok(()) => return Ok((value, ArtifactFormat::Binary)),
            Err(e) => e,
        },
        Err(e) => e.to_string(),
    };

    match serde_json::from_slice::<T>(bytes) {
        Ok(value) => check(&value).map(|()| (value, ArtifactFormat::Json)),
        Err(json_err) => Err(format!("binary decode failed ({}); JSON decode failed ({})", binary_err, json_err)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ClassLabel, InputSchema};

    fn scaler() -> ModelArtifact {
        ModelArtifact::StandardScaler(
            StandardScaler::new(Some(vec![1.0, 2.0]), Some(vec![0.5, 0.5]), InputSchema::default()).unwrap(),
        )
    }

    #[test]
    fn test_binary_preferred() {
        let envelope = ArtifactEnvelope::new(scaler()).with_schema_id("v3");
        let bytes = envelope.to_binary().unwrap();
        let (decoded, format) = ArtifactEnvelope::decode(&bytes).unwrap();
        assert_eq!(format, ArtifactFormat::Binary);
        assert_eq!(decoded.schema_id.as_deref(), Some("v3"));
        assert_eq!(decoded.model.kind(), "standard_scaler");
    }

    #[test]
    fn test_json_fallback() {
        let bytes = ArtifactEnvelope::new(scaler()).to_json().unwrap();
        let (_, format) = ArtifactEnvelope::decode(&bytes).unwrap();
        assert_eq!(format, ArtifactFormat::Json);
    }

    #[test]
    fn test_handwritten_json() {
        let json = br#"{
            "format_version": 1,
            "model": { "linear_regression": { "coef": [1.0, 2.0], "intercept": 0.5 } }
        }"#;
        let (envelope, format) = ArtifactEnvelope::decode(json).unwrap();
        assert_eq!(format, ArtifactFormat::Json);
        let model = envelope.model.into_predictor().unwrap();
        assert_eq!(model.predict(&[1.0, 1.0]).unwrap(), ClassLabel::Number(3.5));
    }

    #[test]
    fn test_garbage_reports_both_failures() {
        let err = ArtifactEnvelope::decode(b"\xff\xfe garbage").unwrap_err();
        assert!(err.contains("binary decode failed"));
        assert!(err.contains("JSON decode failed"));
    }

    #[test]
    fn test_version_checked() {
        let mut envelope = ArtifactEnvelope::new(scaler());
        envelope.format_version = 9;
        let bytes = envelope.to_json().unwrap();
        let err = ArtifactEnvelope::decode(&bytes).unwrap_err();
        assert!(err.contains("unsupported format version 9"));
    }

    #[test]
    fn test_kind_mismatch() {
        assert!(scaler().into_predictor().is_err());
        assert!(scaler().into_transformer().is_ok());
    }
}
