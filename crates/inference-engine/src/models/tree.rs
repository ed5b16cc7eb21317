//! Decision tree ensembles

use super::{argmax, check_width, ClassLabel, InputSchema, ModelError, Predictor};
use serde::{Deserialize, Serialize};

/// Marker for a missing child in the node arrays
const LEAF: i64 = -1;

/// A binary decision tree in flat node-array layout.
///
/// Node `i` is a leaf when both children are [`LEAF`]; otherwise rows with
/// `row[feature[i]] <= threshold[i]` go left. Children always come after
/// their parent, so traversal terminates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tree {
    pub children_left: Vec<i64>,
    pub children_right: Vec<i64>,
    pub feature: Vec<i64>,
    pub threshold: Vec<f64>,
    /// Per-node output: class weights for classifiers, one value for
    /// regressors
    pub value: Vec<Vec<f64>>,
}

impl Tree {
    fn validate(&self, width: usize, outputs: usize) -> Result<(), String> {
        let n = self.children_left.len();
        if n == 0 {
            return Err("tree has no nodes".to_string());
        }
        if [
            self.children_right.len(),
            self.feature.len(),
            self.threshold.len(),
            self.value.len(),
        ]
        .iter()
        .any(|&len| len != n)
        {
            return Err("tree node arrays differ in length".to_string());
        }

        for node in 0..n {
            let (left, right) = (self.children_left[node], self.children_right[node]);
            if left == LEAF && right == LEAF {
                if self.value[node].len() != outputs {
                    return Err(format!(
                        "leaf {} has {} outputs, expected {}",
                        node,
                        self.value[node].len(),
                        outputs
                    ));
                }
                continue;
            }
            for child in [left, right] {
                if child <= node as i64 || child >= n as i64 {
                    return Err(format!("node {} has invalid child {}", node, child));
                }
            }
            let feature = self.feature[node];
            if feature < 0 || feature as usize >= width {
                return Err(format!("node {} splits on feature {} of {}", node, feature, width));
            }
        }
        Ok(())
    }

    /// Output of the leaf reached by `row`
    fn leaf(&self, row: &[f64]) -> &[f64] {
        let mut node = 0usize;
        while self.children_left[node] != LEAF {
            let feature = self.feature[node] as usize;
            node = if row[feature] <= self.threshold[node] {
                self.children_left[node] as usize
            } else {
                self.children_right[node] as usize
            };
        }
        &self.value[node]
    }

    fn max_feature(&self) -> Option<usize> {
        self.feature
            .iter()
            .zip(&self.children_left)
            .filter(|&(_, &left)| left != LEAF)
            .filter_map(|(&f, _)| usize::try_from(f).ok())
            .max()
    }
}

/// Width recorded in `inputs`, else the smallest width every split fits in
fn ensemble_width(inputs: &InputSchema, trees: &[Tree]) -> Result<usize, String> {
    let from_splits = trees
        .iter()
        .filter_map(Tree::max_feature)
        .max()
        .map(|f| f + 1);
    match inputs.resolve_width(None) {
        Ok(width) => Ok(width),
        Err(_) => from_splits.ok_or_else(|| "input width is not recorded".to_string()),
    }
}

/// Averaged-probability tree ensemble classifier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForestClassifier {
    pub classes: Vec<ClassLabel>,
    pub trees: Vec<Tree>,
    #[serde(default)]
    pub inputs: InputSchema,
    #[serde(skip)]
    width: usize,
}

impl ForestClassifier {
    pub fn new(classes: Vec<ClassLabel>, trees: Vec<Tree>, inputs: InputSchema) -> Result<Self, String> {
        Self {
            classes,
            trees,
            inputs,
            width: 0,
        }
        .validated()
    }

    pub(crate) fn validated(mut self) -> Result<Self, String> {
        if self.trees.is_empty() {
            return Err("ensemble has no trees".to_string());
        }
        if self.classes.is_empty() {
            return Err("classifier has no classes".to_string());
        }
        self.width = ensemble_width(&self.inputs, &self.trees)?;
        for (i, tree) in self.trees.iter().enumerate() {
            tree.validate(self.width, self.classes.len())
                .map_err(|e| format!("tree {}: {}", i, e))?;
        }
        Ok(self)
    }
}

impl Predictor for ForestClassifier {
    fn kind(&self) -> &'static str {
        "ForestClassifier"
    }

    fn inputs(&self) -> &InputSchema {
        &self.inputs
    }

    fn n_features_in(&self) -> Option<usize> {
        Some(self.width)
    }

    fn predict(&self, row: &[f64]) -> Result<ClassLabel, ModelError> {
        check_width(self.kind(), self.width, row)?;

        let mut proba = vec![0.0; self.classes.len()];
        for tree in &self.trees {
            let weights = tree.leaf(row);
            let total: f64 = weights.iter().sum();
            let norm = if total > 0.0 { total } else { 1.0 };
            for (p, w) in proba.iter_mut().zip(weights) {
                *p += w / norm;
            }
        }

        let index = argmax(&proba).ok_or_else(|| ModelError::Runtime("no class probabilities".to_string()))?;
        Ok(self.classes[index].clone())
    }
}

/// Mean-of-leaves tree ensemble regressor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForestRegressor {
    pub trees: Vec<Tree>,
    #[serde(default)]
    pub inputs: InputSchema,
    #[serde(skip)]
    width: usize,
}

impl ForestRegressor {
    pub fn new(trees: Vec<Tree>, inputs: InputSchema) -> Result<Self, String> {
        Self {
            trees,
            inputs,
            width: 0,
        }
        .validated()
    }

    pub(crate) fn validated(mut self) -> Result<Self, String> {
        if self.trees.is_empty() {
            return Err("ensemble has no trees".to_string());
        }
        self.width = ensemble_width(&self.inputs, &self.trees)?;
        for (i, tree) in self.trees.iter().enumerate() {
            tree.validate(self.width, 1)
                .map_err(|e| format!("tree {}: {}", i, e))?;
        }
        Ok(self)
    }
}

impl Predictor for ForestRegressor {
    fn kind(&self) -> &'static str {
        "ForestRegressor"
    }

    fn inputs(&self) -> &InputSchema {
        &self.inputs
    }

    fn n_features_in(&self) -> Option<usize> {
        Some(self.width)
    }

    fn predict(&self, row: &[f64]) -> Result<ClassLabel, ModelError> {
        check_width(self.kind(), self.width, row)?;
        let sum: f64 = self.trees.iter().map(|tree| tree.leaf(row)[0]).sum();
        Ok(ClassLabel::Number(sum / self.trees.len() as f64))
    }
}
