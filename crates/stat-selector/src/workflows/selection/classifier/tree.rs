use aprender::tree as cart;
use serde::{Deserialize, Serialize};

use super::{
    check_width, class_label, single_row, validate_classes, Classifier, ModelError,
    PredictionError, TrainingSet,
};

/// Limits applied while growing a tree.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TreeParams {
    /// Unlimited when `None`; the tree grows until every leaf is pure.
    pub max_depth: Option<usize>,
}

impl TreeParams {
    fn estimator(self) -> cart::DecisionTreeClassifier {
        let estimator = cart::DecisionTreeClassifier::new();
        match self.max_depth {
            Some(depth) => estimator.with_max_depth(depth),
            None => estimator,
        }
    }
}

/// A fitted CART tree plus the labels its class ids index into.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "RawDecisionTree")]
pub struct DecisionTreeClassifier {
    classes: Vec<String>,
    n_features: usize,
    estimator: cart::DecisionTreeClassifier,
}

#[derive(Deserialize)]
struct RawDecisionTree {
    classes: Vec<String>,
    n_features: usize,
    estimator: cart::DecisionTreeClassifier,
}

impl TryFrom<RawDecisionTree> for DecisionTreeClassifier {
    type Error = ModelError;

    fn try_from(raw: RawDecisionTree) -> Result<Self, Self::Error> {
        Self::from_parts(raw.classes, raw.n_features, raw.estimator)
    }
}

impl DecisionTreeClassifier {
    pub fn from_parts(
        classes: Vec<String>,
        n_features: usize,
        estimator: cart::DecisionTreeClassifier,
    ) -> Result<Self, ModelError> {
        let model = Self {
            classes,
            n_features,
            estimator,
        };
        model.validate()?;
        Ok(model)
    }

    pub fn validate(&self) -> Result<(), ModelError> {
        validate_classes(&self.classes)?;
        if self.n_features == 0 {
            return Err(ModelError::NoFeatures);
        }
        Ok(())
    }

    pub fn estimator(&self) -> &cart::DecisionTreeClassifier {
        &self.estimator
    }

    /// Fits a Gini CART tree on indicator rows.
    ///
    /// Classes are the sorted distinct labels, so class ids stay stable across
    /// retraining on the same label set.
    pub fn fit(
        rows: &[Vec<f32>],
        labels: &[String],
        params: TreeParams,
    ) -> Result<Self, ModelError> {
        let set = TrainingSet::new(rows, labels)?;

        let mut estimator = params.estimator();
        estimator
            .fit(&set.matrix, &set.targets)
            .map_err(|error| ModelError::Fit(error.to_string()))?;

        Self::from_parts(set.classes, set.n_features, estimator)
    }
}

impl Classifier for DecisionTreeClassifier {
    fn classes(&self) -> &[String] {
        &self.classes
    }

    fn n_features(&self) -> usize {
        self.n_features
    }

    fn predict(&self, features: &[f32]) -> Result<&str, PredictionError> {
        check_width(self.n_features, features)?;
        let row = single_row(features)?;
        class_label(&self.classes, &self.estimator.predict(&row))
    }
}
