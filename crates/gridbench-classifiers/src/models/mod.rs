//! Model adapters: one uniform fit/predict contract over the classifier
//! families compared by a grid search.
pub mod adapter;
pub mod factory;
pub mod gbdt;
pub mod random_forest;
pub mod svm;
pub mod utils;

pub use adapter::{ModelAdapter, PredictionMode, Predictions, TrainedModel};
pub use gbdt::GradientBoostedTreeAdapter;
pub use random_forest::RandomForestAdapter;
pub use svm::SupportVectorMachineAdapter;
