//! Linear models

use super::{argmax, check_width, ClassLabel, InputSchema, ModelError, Predictor};
use serde::{Deserialize, Serialize};

/// Logistic regression classifier.
///
/// A single coefficient row is a binary model whose positive score selects
/// `classes[1]`; otherwise the highest-scoring row wins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticRegression {
    pub coef: Vec<Vec<f64>>,
    pub intercept: Vec<f64>,
    pub classes: Vec<ClassLabel>,
    #[serde(default)]
    pub inputs: InputSchema,
    #[serde(skip)]
    width: usize,
}

impl LogisticRegression {
    pub fn new(
        coef: Vec<Vec<f64>>,
        intercept: Vec<f64>,
        classes: Vec<ClassLabel>,
        inputs: InputSchema,
    ) -> Result<Self, String> {
        Self {
            coef,
            intercept,
            classes,
            inputs,
            width: 0,
        }
        .validated()
    }

    pub(crate) fn validated(mut self) -> Result<Self, String> {
        let first = self.coef.first().ok_or("coef is empty")?;
        if self.coef.iter().any(|row| row.len() != first.len()) {
            return Err("coef rows differ in length".to_string());
        }
        if self.intercept.len() != self.coef.len() {
            return Err(format!(
                "{} intercepts for {} coefficient rows",
                self.intercept.len(),
                self.coef.len()
            ));
        }
        let expected_classes = if self.coef.len() == 1 { 2 } else { self.coef.len() };
        if self.classes.len() != expected_classes {
            return Err(format!(
                "expected {} classes, found {}",
                expected_classes,
                self.classes.len()
            ));
        }
        self.width = self.inputs.resolve_width(Some(first.len()))?;
        Ok(self)
    }

    fn scores(&self, row: &[f64]) -> Vec<f64> {
        self.coef
            .iter()
            .zip(&self.intercept)
            .map(|(weights, b)| dot(weights, row) + b)
            .collect()
    }
}

impl Predictor for LogisticRegression {
    fn kind(&self) -> &'static str {
        "LogisticRegression"
    }

    fn inputs(&self) -> &InputSchema {
        &self.inputs
    }

    fn n_features_in(&self) -> Option<usize> {
        Some(self.width)
    }

    fn predict(&self, row: &[f64]) -> Result<ClassLabel, ModelError> {
        check_width(self.kind(), self.width, row)?;
        let scores = self.scores(row);
        let index = if scores.len() == 1 {
            usize::from(scores[0] > 0.0)
        } else {
            argmax(&scores).ok_or_else(|| ModelError::Runtime("no class scores".to_string()))?
        };
        Ok(self.classes[index].clone())
    }
}

/// Ordinary least squares regressor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearRegression {
    pub coef: Vec<f64>,
    pub intercept: f64,
    #[serde(default)]
    pub inputs: InputSchema,
}

impl LinearRegression {
    pub(crate) fn validated(self) -> Result<Self, String> {
        if self.coef.is_empty() {
            return Err("coef is empty".to_string());
        }
        self.inputs.resolve_width(Some(self.coef.len()))?;
        Ok(self)
    }
}

impl Predictor for LinearRegression {
    fn kind(&self) -> &'static str {
        "LinearRegression"
    }

    fn inputs(&self) -> &InputSchema {
        &self.inputs
    }

    fn n_features_in(&self) -> Option<usize> {
        Some(self.coef.len())
    }

    fn predict(&self, row: &[f64]) -> Result<ClassLabel, ModelError> {
        check_width(self.kind(), self.coef.len(), row)?;
        Ok(ClassLabel::Number(dot(&self.coef, row) + self.intercept))
    }
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}
