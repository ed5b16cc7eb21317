//! Named single-row feature frame

use serde::Serialize;
use std::collections::HashMap;

/// One row of named numeric features.
///
/// Column order is insertion order and is preserved by every operation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureFrame {
    columns: Vec<String>,
    values: Vec<f64>,
    #[serde(skip)]
    index: HashMap<String, usize>,
}

impl FeatureFrame {
    /// Create a frame with every column set to zero
    pub fn zeros(columns: &[String]) -> Self {
        let mut index = HashMap::with_capacity(columns.len());
        for (i, name) in columns.iter().enumerate() {
            index.entry(name.clone()).or_insert(i);
        }
        Self {
            columns: columns.to_vec(),
            values: vec![0.0; columns.len()],
            index,
        }
    }

    /// Number of columns
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Whether the frame has no columns
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Column names in order
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Values in column order
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Whether a column exists
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Value of a column
    pub fn get(&self, name: &str) -> Option<f64> {
        self.index.get(name).map(|&i| self.values[i])
    }

    /// Overwrite an existing column. Returns false if the column is unknown.
    pub fn set(&mut self, name: &str, value: f64) -> bool {
        match self.index.get(name) {
            Some(&i) => {
                self.values[i] = value;
                true
            }
            None => false,
        }
    }

    /// Append a zero column if absent. Returns true if the column was added.
    pub fn ensure_column(&mut self, name: &str) -> bool {
        if self.contains(name) {
            return false;
        }
        self.index.insert(name.to_string(), self.columns.len());
        self.columns.push(name.to_string());
        self.values.push(0.0);
        true
    }

    /// Values of the named columns, in the order given
    pub fn select(&self, names: &[String]) -> Option<Vec<f64>> {
        names.iter().map(|name| self.get(name)).collect()
    }

    /// Write values back into the named columns.
    ///
    /// Returns the number of columns written; names the frame does not
    /// contain are skipped.
    pub fn assign(&mut self, names: &[String], values: &[f64]) -> usize {
        names
            .iter()
            .zip(values)
            .filter(|&(name, &value)| self.set(name, value))
            .count()
    }
}
