//! Fitted scalers

use super::{check_names, check_width, InputSchema, ModelError, Transformer};
use serde::{Deserialize, Serialize};

/// Standardizes columns as `(x - mean) / scale`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    /// Absent when fitted without centering
    #[serde(default)]
    pub mean: Option<Vec<f64>>,
    /// Absent when fitted without scaling
    #[serde(default)]
    pub scale: Option<Vec<f64>>,
    #[serde(default)]
    pub inputs: InputSchema,
    #[serde(skip)]
    width: usize,
}

impl StandardScaler {
    pub fn new(mean: Option<Vec<f64>>, scale: Option<Vec<f64>>, inputs: InputSchema) -> Result<Self, String> {
        Self {
            mean,
            scale,
            inputs,
            width: 0,
        }
        .validated()
    }

    pub(crate) fn validated(mut self) -> Result<Self, String> {
        let mean_len = self.mean.as_ref().map(Vec::len);
        let scale_len = self.scale.as_ref().map(Vec::len);
        if let (Some(m), Some(s)) = (mean_len, scale_len) {
            if m != s {
                return Err(format!("mean has {} entries but scale has {}", m, s));
            }
        }
        self.width = self.inputs.resolve_width(mean_len.or(scale_len))?;
        Ok(self)
    }
}

impl Transformer for StandardScaler {
    fn kind(&self) -> &'static str {
        "StandardScaler"
    }

    fn inputs(&self) -> &InputSchema {
        &self.inputs
    }

    fn n_features_in(&self) -> Option<usize> {
        Some(self.width)
    }

    fn transform(&self, columns: &[String], row: &[f64]) -> Result<Vec<f64>, ModelError> {
        check_width(self.kind(), self.width, row)?;
        check_names(self.kind(), &self.inputs, columns)?;

        Ok(row
            .iter()
            .enumerate()
            .map(|(i, &x)| {
                let centered = match &self.mean {
                    Some(mean) => x - mean[i],
                    None => x,
                };
                match &self.scale {
                    Some(scale) if scale[i] != 0.0 => centered / scale[i],
                    _ => centered,
                }
            })
            .collect())
    }
}

/// Rescales columns as `x * scale + min`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MinMaxScaler {
    pub scale: Vec<f64>,
    pub min: Vec<f64>,
    #[serde(default)]
    pub inputs: InputSchema,
}

impl MinMaxScaler {
    pub(crate) fn validated(self) -> Result<Self, String> {
        if self.scale.len() != self.min.len() {
            return Err(format!(
                "scale has {} entries but min has {}",
                self.scale.len(),
                self.min.len()
            ));
        }
        self.inputs.resolve_width(Some(self.scale.len()))?;
        Ok(self)
    }
}

impl Transformer for MinMaxScaler {
    fn kind(&self) -> &'static str {
        "MinMaxScaler"
    }

    fn inputs(&self) -> &InputSchema {
        &self.inputs
    }

    fn n_features_in(&self) -> Option<usize> {
        Some(self.scale.len())
    }

    fn transform(&self, columns: &[String], row: &[f64]) -> Result<Vec<f64>, ModelError> {
        check_width(self.kind(), self.scale.len(), row)?;
        check_names(self.kind(), &self.inputs, columns)?;

        Ok(row
            .iter()
            .zip(self.scale.iter().zip(&self.min))
            .map(|(&x, (&scale, &min))| x * scale + min)
            .collect())
    }
}
