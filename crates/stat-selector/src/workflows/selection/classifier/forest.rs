use aprender::tree as cart;
use serde::{Deserialize, Serialize};

use super::{
    check_width, class_label, single_row, validate_classes, Classifier, ModelError,
    PredictionError, TrainingSet,
};

/// Size and seed of a bagged forest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForestParams {
    pub n_trees: usize,
    pub max_depth: Option<usize>,
    /// Fixes bootstrap sampling so retraining reproduces the same forest.
    pub seed: u64,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            n_trees: 50,
            max_depth: None,
            seed: 42,
        }
    }
}

impl ForestParams {
    fn estimator(self) -> cart::RandomForestClassifier {
        let estimator =
            cart::RandomForestClassifier::new(self.n_trees).with_random_state(self.seed);
        match self.max_depth {
            Some(depth) => estimator.with_max_depth(depth),
            None => estimator,
        }
    }
}

/// Bagged ensemble of CART trees sharing one class list; predictions are the vote winner.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "RawForest")]
pub struct RandomForestClassifier {
    classes: Vec<String>,
    n_features: usize,
    estimator: cart::RandomForestClassifier,
}

#[derive(Deserialize)]
struct RawForest {
    classes: Vec<String>,
    n_features: usize,
    estimator: cart::RandomForestClassifier,
}

impl TryFrom<RawForest> for RandomForestClassifier {
    type Error = ModelError;

    fn try_from(raw: RawForest) -> Result<Self, Self::Error> {
        Self::from_parts(raw.classes, raw.n_features, raw.estimator)
    }
}

impl RandomForestClassifier {
    pub fn from_parts(
        classes: Vec<String>,
        n_features: usize,
        estimator: cart::RandomForestClassifier,
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

    pub fn estimator(&self) -> &cart::RandomForestClassifier {
        &self.estimator
    }

    pub fn fit(
        rows: &[Vec<f32>],
        labels: &[String],
        params: ForestParams,
    ) -> Result<Self, ModelError> {
        if params.n_trees == 0 {
            return Err(ModelError::EmptyForest);
        }
        let set = TrainingSet::new(rows, labels)?;

        let mut estimator = params.estimator();
        estimator
            .fit(&set.matrix, &set.targets)
            .map_err(|error| ModelError::Fit(error.to_string()))?;

        Self::from_parts(set.classes, set.n_features, estimator)
    }
}

impl Classifier for RandomForestClassifier {
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
