use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::grid::HyperparameterGrid;
use crate::models::adapter::PredictionMode;

/// Supported model families.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    #[default]
    GradientBoostedTrees,
    RandomForest,
    SupportVectorMachine,
}

impl ModelKind {
    pub fn name(&self) -> &'static str {
        match self {
            ModelKind::GradientBoostedTrees => "gbdt",
            ModelKind::RandomForest => "random_forest",
            ModelKind::SupportVectorMachine => "svm",
        }
    }

    /// Prediction mode a grid over this family uses unless told otherwise.
    pub fn default_mode(&self) -> PredictionMode {
        match self {
            ModelKind::GradientBoostedTrees | ModelKind::RandomForest => PredictionMode::RawScore,
            ModelKind::SupportVectorMachine => PredictionMode::ClassLabel,
        }
    }

    /// A small starting grid for the family.
    pub fn default_grid(&self) -> HyperparameterGrid {
        match self {
            ModelKind::GradientBoostedTrees => HyperparameterGrid::new()
                .axis("shrinkage", [0.01, 0.1])
                .axis("depth", [1i64, 2, 4])
                .axis("iterations", [100i64]),
            ModelKind::RandomForest => HyperparameterGrid::new()
                .axis("n_trees", [50i64, 200])
                .axis("depth", [2i64, 4, 8]),
            ModelKind::SupportVectorMachine => HyperparameterGrid::new()
                .axis("kernel", ["linear", "gaussian"])
                .axis("cost", [0.1, 1.0, 10.0]),
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for ModelKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "gbdt" | "gbm" | "gradient_boosted_trees" => Ok(ModelKind::GradientBoostedTrees),
            "rf" | "random_forest" => Ok(ModelKind::RandomForest),
            "svm" | "support_vector_machine" => Ok(ModelKind::SupportVectorMachine),
            _ => Err(format!(
                "Unknown model type: {}. Valid options are: gbdt, random_forest, svm",
                s
            )),
        }
    }
}

/// A model family together with the grid to evaluate it over.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct ModelConfig {
    pub kind: ModelKind,
    pub grid: HyperparameterGrid,
}

impl ModelConfig {
    pub fn new(kind: ModelKind, grid: HyperparameterGrid) -> Self {
        Self { kind, grid }
    }

    /// The family with its default grid.
    pub fn for_kind(kind: ModelKind) -> Self {
        Self {
            kind,
            grid: kind.default_grid(),
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self::for_kind(ModelKind::default())
    }
}
