//! ONNX graph predictors executed with tract

use super::{check_width, ClassLabel, InputSchema, ModelError, Predictor};
use serde::{Deserialize, Serialize};
use std::io::Cursor;
use tract_onnx::pb::ModelProto;
use tract_onnx::prelude::*;
use tracing::debug;

type TractModel = SimplePlan<TypedFact, Box<dyn TypedOp>, Graph<TypedFact, Box<dyn TypedOp>>>;

/// Serialized form of an ONNX predictor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OnnxParams {
    /// Raw ONNX protobuf
    pub graph: Vec<u8>,
    /// Labels indexed by integral model output; outputs pass through as
    /// numbers when absent
    #[serde(default)]
    pub classes: Option<Vec<ClassLabel>>,
    #[serde(default)]
    pub inputs: InputSchema,
}

/// A single-input ONNX model taking one `f32` row of shape `[1, width]`.
/// The first element of the first output is the prediction.
pub struct OnnxPredictor {
    model: TractModel,
    width: usize,
    classes: Option<Vec<ClassLabel>>,
    inputs: InputSchema,
}

impl OnnxPredictor {
    /// Parse and optimize the graph
    pub fn load(params: OnnxParams) -> Result<Self, String> {
        let width = params.inputs.resolve_width(None)?;
        let proto = tract_onnx::onnx()
            .proto_model_for_read(&mut Cursor::new(&params.graph))
            .map_err(|e| format!("failed to parse ONNX graph: {}", e))?;

        debug!(width, bytes = params.graph.len(), "ONNX graph decoded");
        Self::from_proto(&proto, width, params.classes, params.inputs)
    }

    fn from_proto(
        proto: &ModelProto,
        width: usize,
        classes: Option<Vec<ClassLabel>>,
        inputs: InputSchema,
    ) -> Result<Self, String> {
        let model = tract_onnx::onnx()
            .model_for_proto_model(proto)
            .map_err(|e| format!("failed to translate ONNX graph: {}", e))?
            .with_input_fact(0, f32::fact([1, width]).into())
            .map_err(|e| format!("failed to set input shape: {}", e))?
            .into_optimized()
            .map_err(|e| format!("failed to optimize graph: {}", e))?
            .into_runnable()
            .map_err(|e| format!("failed to build runnable graph: {}", e))?;

        Ok(Self {
            model,
            width,
            classes,
            inputs,
        })
    }

    fn label(&self, value: f64) -> Result<ClassLabel, ModelError> {
        match &self.classes {
            None => Ok(ClassLabel::Number(value)),
            Some(classes) => {
                let index = value as usize;
                if value < 0.0 || value.fract() != 0.0 || index >= classes.len() {
                    return Err(ModelError::Runtime(format!(
                        "model output {} is not a class index below {}",
                        value,
                        classes.len()
                    )));
                }
                Ok(classes[index].clone())
            }
        }
    }
}

impl Predictor for OnnxPredictor {
    fn kind(&self) -> &'static str {
        "OnnxModel"
    }

    fn inputs(&self) -> &InputSchema {
        &self.inputs
    }

    fn n_features_in(&self) -> Option<usize> {
        Some(self.width)
    }

    fn predict(&self, row: &[f64]) -> Result<ClassLabel, ModelError> {
        check_width(self.kind(), self.width, row)?;

        let data: Vec<f32> = row.iter().map(|&v| v as f32).collect();
        let input: Tensor = tract_ndarray::Array2::from_shape_vec((1, self.width), data)
            .map_err(|e| ModelError::Runtime(e.to_string()))?
            .into();

        let outputs = self
            .model
            .run(tvec!(input.into()))
            .map_err(|e| ModelError::Runtime(format!("ONNX execution failed: {}", e)))?;
        let output = outputs
            .first()
            .ok_or_else(|| ModelError::Runtime("model produced no output".to_string()))?;
        let values = output
            .cast_to::<f64>()
            .map_err(|e| ModelError::Runtime(format!("unsupported output type: {}", e)))?;
        let first = values
            .as_slice::<f64>()
            .map_err(|e| ModelError::Runtime(e.to_string()))?
            .first()
            .copied()
            .ok_or_else(|| ModelError::Runtime("model output is empty".to_string()))?;

        self.label(first)
    }
}
