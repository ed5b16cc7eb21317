//! Model runtimes
//!
//! Fitted transformers and predictors behind the two traits the pipeline
//! consumes. Each runtime is built from its serialized parameters and
//! validated once at load time.

mod linear;
mod onnx;
mod scaler;
mod tree;

pub use linear::{LinearRegression, LogisticRegression};
pub use onnx::{OnnxParams, OnnxPredictor};
pub use scaler::{MinMaxScaler, StandardScaler};
pub use tree::{ForestClassifier, ForestRegressor, Tree};

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Errors raised by a fitted model at prediction time
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ModelError {
    #[error("X has {actual} features, but {kind} is expecting {expected} features as input.")]
    FeatureCount {
        kind: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("The feature names should match those that were passed during fit to {kind}.")]
    FeatureNames { kind: &'static str },
    #[error("{0}")]
    Runtime(String),
}

/// Output label of a predictor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ClassLabel {
    Number(f64),
    Text(String),
}

impl ClassLabel {
    /// Numeric value of the label; text labels are parsed
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ClassLabel::Number(n) => Some(*n),
            ClassLabel::Text(s) => s.trim().parse().ok(),
        }
    }

    /// JSON form: integral numbers become integers
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            ClassLabel::Number(n) if n.fract() == 0.0 && n.abs() < i64::MAX as f64 => {
                serde_json::Value::from(*n as i64)
            }
            ClassLabel::Number(n) => serde_json::Value::from(*n),
            ClassLabel::Text(s) => serde_json::Value::from(s.as_str()),
        }
    }
}

impl fmt::Display for ClassLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClassLabel::Number(n) => write!(f, "{}", n),
            ClassLabel::Text(s) => f.write_str(s),
        }
    }
}

/// Input metadata recorded when the model was fitted
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InputSchema {
    #[serde(default)]
    pub n_features_in: Option<usize>,
    #[serde(default)]
    pub feature_names_in: Option<Vec<String>>,
    /// Legacy attribute name used by older exporters
    #[serde(default)]
    pub feature_names: Option<Vec<String>>,
}

impl InputSchema {
    /// Input width, reconciling the declared count, the recorded names and
    /// the width implied by the fitted parameters.
    pub(crate) fn resolve_width(&self, from_params: Option<usize>) -> Result<usize, String> {
        let names = self.feature_names_in.as_ref().map(Vec::len);
        let known: Vec<(&str, usize)> = [
            ("n_features_in", self.n_features_in),
            ("feature_names_in", names),
            ("parameters", from_params),
        ]
        .into_iter()
        .filter_map(|(what, width)| width.map(|w| (what, w)))
        .collect();

        let (_, width) = *known
            .first()
            .ok_or_else(|| "input width is not recorded".to_string())?;
        if let Some((what, other)) = known.iter().find(|(_, w)| *w != width) {
            return Err(format!(
                "inconsistent input width: {} gives {}, expected {}",
                what, other, width
            ));
        }
        Ok(width)
    }
}

/// A fitted column transformer such as a scaler
pub trait Transformer: Send + Sync {
    /// Short model kind name
    fn kind(&self) -> &'static str;

    fn inputs(&self) -> &InputSchema;

    /// Number of input columns
    fn n_features_in(&self) -> Option<usize> {
        self.inputs().n_features_in
    }

    fn feature_names_in(&self) -> Option<&[String]> {
        self.inputs().feature_names_in.as_deref()
    }

    /// Output column names. One-to-one transformers keep the input names.
    fn feature_names_out(&self) -> Option<Vec<String>> {
        self.feature_names_in().map(<[String]>::to_vec)
    }

    /// Transform one row whose values correspond to `columns`
    fn transform(&self, columns: &[String], row: &[f64]) -> Result<Vec<f64>, ModelError>;
}

/// A fitted model mapping one feature row to a label
pub trait Predictor: Send + Sync {
    /// Short model kind name
    fn kind(&self) -> &'static str;

    fn inputs(&self) -> &InputSchema;

    fn n_features_in(&self) -> Option<usize> {
        self.inputs().n_features_in
    }

    fn feature_names_in(&self) -> Option<&[String]> {
        self.inputs().feature_names_in.as_deref()
    }

    /// Feature names under the legacy attribute
    fn legacy_feature_names(&self) -> Option<&[String]> {
        self.inputs().feature_names.as_deref()
    }

    fn predict(&self, row: &[f64]) -> Result<ClassLabel, ModelError>;
}

pub(crate) fn check_width(kind: &'static str, expected: usize, row: &[f64]) -> Result<(), ModelError> {
    if row.len() != expected {
        return Err(ModelError::FeatureCount {
            kind,
            expected,
            actual: row.len(),
        });
    }
    Ok(())
}

/// Fitted feature names must match the supplied columns exactly
pub(crate) fn check_names(
    kind: &'static str,
    inputs: &InputSchema,
    columns: &[String],
) -> Result<(), ModelError> {
    match &inputs.feature_names_in {
        Some(names) if names.as_slice() != columns => Err(ModelError::FeatureNames { kind }),
        _ => Ok(()),
    }
}

/// Index of the largest score; ties keep the first
pub(crate) fn argmax(scores: &[f64]) -> Option<usize> {
    scores
        .iter()
        .enumerate()
        .fold(None, |best: Option<(usize, f64)>, (i, &s)| match best {
            Some((_, b)) if b >= s => best,
            _ => Some((i, s)),
        })
        .map(|(i, _)| i)
}
