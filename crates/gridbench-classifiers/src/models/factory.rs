use crate::config::ModelKind;
use crate::models::adapter::ModelAdapter;
use crate::models::gbdt::GradientBoostedTreeAdapter;
use crate::models::random_forest::RandomForestAdapter;
use crate::models::svm::SupportVectorMachineAdapter;

/// Build a boxed adapter for a model family.
pub fn build_adapter(kind: ModelKind) -> Box<dyn ModelAdapter> {
    match kind {
        ModelKind::GradientBoostedTrees => Box::new(GradientBoostedTreeAdapter::new()),
        ModelKind::RandomForest => Box::new(RandomForestAdapter::new()),
        ModelKind::SupportVectorMachine => Box::new(SupportVectorMachineAdapter::new()),
    }
}
