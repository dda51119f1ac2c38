//! Hyperparameter tuples and the grids that enumerate them.
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{GridError, Result};

/// A single hyperparameter value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Bool(v) => write!(f, "{}", v),
            ParamValue::Int(v) => write!(f, "{}", v),
            ParamValue::Float(v) => write!(f, "{}", v),
            ParamValue::Text(v) => write!(f, "{}", v),
        }
    }
}

impl From<i64> for ParamValue {
    fn from(v: i64) -> Self {
        ParamValue::Int(v)
    }
}

impl From<i32> for ParamValue {
    fn from(v: i32) -> Self {
        ParamValue::Int(v as i64)
    }
}

impl From<usize> for ParamValue {
    fn from(v: usize) -> Self {
        ParamValue::Int(v as i64)
    }
}

impl From<f64> for ParamValue {
    fn from(v: f64) -> Self {
        ParamValue::Float(v)
    }
}

impl From<bool> for ParamValue {
    fn from(v: bool) -> Self {
        ParamValue::Bool(v)
    }
}

impl From<&str> for ParamValue {
    fn from(v: &str) -> Self {
        ParamValue::Text(v.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(v: String) -> Self {
        ParamValue::Text(v)
    }
}

/// One named configuration of hyperparameters, in grid declaration order.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct HyperparameterTuple {
    values: Vec<(String, ParamValue)>,
}

impl HyperparameterTuple {
    pub fn new(values: Vec<(String, ParamValue)>) -> Self {
        Self { values }
    }

    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.values.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.iter().map(|(n, _)| n.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.values.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Numeric value of `name`; integers are widened. `None` when absent.
    pub fn get_f64(&self, name: &str) -> Result<Option<f64>> {
        match self.get(name) {
            None => Ok(None),
            Some(ParamValue::Float(v)) => Ok(Some(*v)),
            Some(ParamValue::Int(v)) => Ok(Some(*v as f64)),
            Some(other) => Err(wrong_type(name, "a number", other)),
        }
    }

    /// Integer value of `name`; must be non-negative.
    pub fn get_usize(&self, name: &str) -> Result<Option<usize>> {
        match self.get(name) {
            None => Ok(None),
            Some(ParamValue::Int(v)) if *v >= 0 => Ok(Some(*v as usize)),
            Some(other) => Err(wrong_type(name, "a non-negative integer", other)),
        }
    }

    pub fn get_str(&self, name: &str) -> Result<Option<&str>> {
        match self.get(name) {
            None => Ok(None),
            Some(ParamValue::Text(v)) => Ok(Some(v.as_str())),
            Some(other) => Err(wrong_type(name, "a string", other)),
        }
    }

    pub fn get_bool(&self, name: &str) -> Result<Option<bool>> {
        match self.get(name) {
            None => Ok(None),
            Some(ParamValue::Bool(v)) => Ok(Some(*v)),
            Some(other) => Err(wrong_type(name, "a boolean", other)),
        }
    }

    /// Fail on any parameter name an adapter does not understand.
    pub fn ensure_known(&self, known: &[&str]) -> Result<()> {
        match self.names().find(|n| !known.contains(n)) {
            Some(unknown) => Err(GridError::Training(format!(
                "unknown hyperparameter '{}' (expected one of {:?})",
                unknown, known
            ))),
            None => Ok(()),
        }
    }
}

fn wrong_type(name: &str, expected: &str, got: &ParamValue) -> GridError {
    GridError::Training(format!(
        "hyperparameter '{}' must be {}, got {}",
        name, expected, got
    ))
}

impl fmt::Display for HyperparameterTuple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (name, value)) in self.values.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}={}", name, value)?;
        }
        Ok(())
    }
}

/// Candidate values for one hyperparameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridAxis {
    pub name: String,
    pub values: Vec<ParamValue>,
}

/// Ordered set of axes whose Cartesian product is evaluated exhaustively.
///
/// Serializes as a list so the declaration order, which fixes the
/// enumeration order, survives a JSON round trip.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HyperparameterGrid {
    axes: Vec<GridAxis>,
}

impl HyperparameterGrid {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an axis. Later axes vary faster during enumeration.
    pub fn axis<V, I>(mut self, name: &str, values: I) -> Self
    where
        V: Into<ParamValue>,
        I: IntoIterator<Item = V>,
    {
        self.axes.push(GridAxis {
            name: name.to_string(),
            values: values.into_iter().map(Into::into).collect(),
        });
        self
    }

    pub fn axes(&self) -> &[GridAxis] {
        &self.axes
    }

    /// Check that axis names are unique and every axis has a candidate.
    pub fn validate(&self) -> Result<()> {
        for (i, axis) in self.axes.iter().enumerate() {
            if axis.values.is_empty() {
                return Err(GridError::InvalidGrid(format!(
                    "axis '{}' has no candidate values",
                    axis.name
                )));
            }
            if self.axes[..i].iter().any(|a| a.name == axis.name) {
                return Err(GridError::InvalidGrid(format!(
                    "axis '{}' declared twice",
                    axis.name
                )));
            }
        }
        Ok(())
    }

    /// Number of grid points (1 for an empty grid: the default configuration).
    pub fn len(&self) -> usize {
        self.axes.iter().map(|a| a.values.len()).product()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All combinations in nested order: the first declared axis is the
    /// outermost loop, the last declared axis the innermost.
    pub fn combinations(&self) -> Result<Vec<HyperparameterTuple>> {
        self.validate()?;
        let total = self.len();
        let mut combos = Vec::with_capacity(total);
        for flat in 0..total {
            let mut rest = flat;
            let mut picked = vec![0usize; self.axes.len()];
            for (slot, axis) in picked.iter_mut().zip(self.axes.iter()).rev() {
                *slot = rest % axis.values.len();
                rest /= axis.values.len();
            }
            combos.push(HyperparameterTuple::new(
                self.axes
                    .iter()
                    .zip(picked)
                    .map(|(axis, idx)| (axis.name.clone(), axis.values[idx].clone()))
                    .collect(),
            ));
        }
        Ok(combos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_combinations_nested_order() {
        let grid = HyperparameterGrid::new()
            .axis("shrinkage", [0.01, 0.1])
            .axis("depth", [1, 2, 3]);
        let combos = grid.combinations().unwrap();
        assert_eq!(combos.len(), 6);
        let rendered: Vec<String> = combos.iter().map(|c| c.to_string()).collect();
        assert_eq!(rendered[0], "shrinkage=0.01, depth=1");
        assert_eq!(rendered[1], "shrinkage=0.01, depth=2");
        assert_eq!(rendered[3], "shrinkage=0.1, depth=1");
        assert_eq!(rendered[5], "shrinkage=0.1, depth=3");
    }

    #[test]
    fn test_empty_grid_is_single_default_point() {
        let combos = HyperparameterGrid::new().combinations().unwrap();
        assert_eq!(combos.len(), 1);
        assert!(combos[0].is_empty());
    }

    #[test]
    fn test_validate_rejects_empty_and_duplicate_axes() {
        let empty_axis = HyperparameterGrid::new().axis("depth", Vec::<i64>::new());
        assert!(matches!(
            empty_axis.combinations(),
            Err(GridError::InvalidGrid(_))
        ));
        let duplicate = HyperparameterGrid::new().axis("depth", [1]).axis("depth", [2]);
        assert!(duplicate.validate().is_err());
    }

    #[test]
    fn test_typed_getters() {
        let tuple = HyperparameterTuple::new(vec![
            ("depth".to_string(), ParamValue::Int(3)),
            ("shrinkage".to_string(), ParamValue::Float(0.1)),
            ("kernel".to_string(), ParamValue::Text("linear".to_string())),
        ]);
        assert_eq!(tuple.get_usize("depth").unwrap(), Some(3));
        assert_eq!(tuple.get_f64("depth").unwrap(), Some(3.0));
        assert_eq!(tuple.get_str("kernel").unwrap(), Some("linear"));
        assert_eq!(tuple.get_f64("missing").unwrap(), None);
        assert!(tuple.get_usize("shrinkage").is_err());
        assert!(tuple.ensure_known(&["depth", "shrinkage"]).is_err());
        assert!(tuple.ensure_known(&["depth", "shrinkage", "kernel"]).is_ok());
    }

    #[test]
    fn test_negative_integer_is_not_usize() {
        let tuple = HyperparameterTuple::new(vec![("depth".to_string(), ParamValue::Int(-1))]);
        assert!(matches!(tuple.get_usize("depth"), Err(GridError::Training(_))));
    }

    #[test]
    fn test_grid_json_keeps_declaration_order() {
        let json = r#"[
            {"name": "kernel", "values": ["linear", "gaussian"]},
            {"name": "cost", "values": [0.1, 1, 10]}
        ]"#;
        let grid: HyperparameterGrid = serde_json::from_str(json).unwrap();
        assert_eq!(grid.axes()[0].name, "kernel");
        assert_eq!(grid.axes()[1].values[1], ParamValue::Int(1));
        assert_eq!(grid.len(), 6);
    }
}
