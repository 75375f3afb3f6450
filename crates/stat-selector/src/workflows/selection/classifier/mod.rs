mod forest;
mod tree;

pub use forest::{ForestParams, RandomForestClassifier};
pub use tree::{DecisionTreeClassifier, TreeParams};

use aprender::primitives::Matrix;
use serde::{Deserialize, Serialize};

/// Multi-class prediction over an encoded feature vector.
///
/// Implementations are read-only after construction so one instance can serve
/// any number of concurrent callers.
pub trait Classifier: Send + Sync {
    /// Known labels, indexed by class id.
    fn classes(&self) -> &[String];

    /// Width of the feature vectors the model accepts.
    fn n_features(&self) -> usize;

    /// Single top label for `features`.
    fn predict(&self, features: &[f32]) -> Result<&str, PredictionError>;
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PredictionError {
    #[error("expected {expected} features, got {actual}")]
    FeatureWidth { expected: usize, actual: usize },
    #[error("estimator rejected the feature vector: {0}")]
    Estimator(String),
    #[error("estimator predicted class {class} of {n_classes}")]
    UnknownClass { class: usize, n_classes: usize },
}

/// Problems found while fitting or validating a model.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModelError {
    #[error("model declares no classes")]
    NoClasses,
    #[error("class labels must be unique and non-empty")]
    InvalidClasses,
    #[error("class labels must be sorted so class ids are stable")]
    UnsortedClasses,
    #[error("model declares zero features")]
    NoFeatures,
    #[error("forest needs at least one tree")]
    EmptyForest,
    #[error("cannot fit a model on an empty training set")]
    EmptyTrainingSet,
    #[error("training set has {rows} rows but {labels} labels")]
    LabelCount { rows: usize, labels: usize },
    #[error("training row {row} has {actual} features, expected {expected}")]
    RowWidth {
        row: usize,
        expected: usize,
        actual: usize,
    },
    #[error("estimator failed to fit: {0}")]
    Fit(String),
}

/// Serialized model kinds understood by the artifact loader.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ClassifierModel {
    DecisionTree(DecisionTreeClassifier),
    RandomForest(RandomForestClassifier),
}

impl ClassifierModel {
    pub fn validate(&self) -> Result<(), ModelError> {
        match self {
            ClassifierModel::DecisionTree(model) => model.validate(),
            ClassifierModel::RandomForest(model) => model.validate(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ClassifierModel::DecisionTree(_) => "decision_tree",
            ClassifierModel::RandomForest(_) => "random_forest",
        }
    }
}

impl Classifier for ClassifierModel {
    fn classes(&self) -> &[String] {
        match self {
            ClassifierModel::DecisionTree(model) => model.classes(),
            ClassifierModel::RandomForest(model) => model.classes(),
        }
    }

    fn n_features(&self) -> usize {
        match self {
            ClassifierModel::DecisionTree(model) => model.n_features(),
            ClassifierModel::RandomForest(model) => model.n_features(),
        }
    }

    fn predict(&self, features: &[f32]) -> Result<&str, PredictionError> {
        match self {
            ClassifierModel::DecisionTree(model) => model.predict(features),
            ClassifierModel::RandomForest(model) => model.predict(features),
        }
    }
}

pub(crate) fn validate_classes(classes: &[String]) -> Result<(), ModelError> {
    if classes.is_empty() {
        return Err(ModelError::NoClasses);
    }
    if classes.iter().any(|label| label.trim().is_empty()) {
        return Err(ModelError::InvalidClasses);
    }
    let mut sorted: Vec<&str> = classes.iter().map(String::as_str).collect();
    sorted.sort_unstable();
    if sorted.windows(2).any(|pair| pair[0] == pair[1]) {
        return Err(ModelError::InvalidClasses);
    }
    if classes.windows(2).any(|pair| pair[0] > pair[1]) {
        return Err(ModelError::UnsortedClasses);
    }
    Ok(())
}

pub(crate) fn check_width(expected: usize, features: &[f32]) -> Result<(), PredictionError> {
    if features.len() == expected {
        Ok(())
    } else {
        Err(PredictionError::FeatureWidth {
            expected,
            actual: features.len(),
        })
    }
}

/// Training rows and labels in the shape aprender estimators fit on.
///
/// Classes are the sorted distinct labels; targets index into them.
pub(crate) struct TrainingSet {
    pub(crate) matrix: Matrix<f32>,
    pub(crate) n_features: usize,
    pub(crate) classes: Vec<String>,
    pub(crate) targets: Vec<usize>,
}

impl TrainingSet {
    pub(crate) fn new(rows: &[Vec<f32>], labels: &[String]) -> Result<Self, ModelError> {
        if rows.is_empty() {
            return Err(ModelError::EmptyTrainingSet);
        }
        if rows.len() != labels.len() {
            return Err(ModelError::LabelCount {
                rows: rows.len(),
                labels: labels.len(),
            });
        }
        let n_features = rows[0].len();
        if n_features == 0 {
            return Err(ModelError::NoFeatures);
        }
        if let Some((row, actual)) = rows
            .iter()
            .map(Vec::len)
            .enumerate()
            .find(|(_, width)| *width != n_features)
        {
            return Err(ModelError::RowWidth {
                row,
                expected: n_features,
                actual,
            });
        }

        let mut classes: Vec<String> = labels.to_vec();
        classes.sort();
        classes.dedup();
        let targets = labels
            .iter()
            .map(|label| classes.binary_search(label).unwrap_or_default())
            .collect();

        let values: Vec<f32> = rows.iter().flatten().copied().collect();
        let matrix = Matrix::from_vec(rows.len(), n_features, values)
            .map_err(|error| ModelError::Fit(error.to_string()))?;

        Ok(Self {
            matrix,
            n_features,
            classes,
            targets,
        })
    }
}

/// Wraps one feature vector as a single-row matrix.
pub(crate) fn single_row(features: &[f32]) -> Result<Matrix<f32>, PredictionError> {
    Matrix::from_vec(1, features.len(), features.to_vec())
        .map_err(|error| PredictionError::Estimator(error.to_string()))
}

/// Maps the estimator's class id for a single-row prediction back to its label.
pub(crate) fn class_label<'a>(
    classes: &'a [String],
    predicted: &[usize],
) -> Result<&'a str, PredictionError> {
    let class = predicted
        .first()
        .copied()
        .ok_or_else(|| PredictionError::Estimator("no prediction returned".to_string()))?;
    classes
        .get(class)
        .map(String::as_str)
        .ok_or(PredictionError::UnknownClass {
            class,
            n_classes: classes.len(),
        })
}
