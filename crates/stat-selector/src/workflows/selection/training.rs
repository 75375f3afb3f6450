//! Fits the encoder and a tree or forest classifier from a labelled CSV corpus.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::{debug, info};

use super::artifacts::{ClassifierArtifact, EncoderArtifact};
use super::classifier::{
    Classifier, ClassifierModel, DecisionTreeClassifier, ForestParams, ModelError,
    RandomForestClassifier, TreeParams,
};
use super::domain::{CaseDescriptor, CaseSubmission, InvalidInput};
use super::encoding::{
    EncodingError, FeatureRow, HandleUnknown, OneHotEncoder, VARIABLES_COLUMN,
};

#[derive(Debug, thiserror::Error)]
pub enum TrainingError {
    #[error("failed to read training corpus: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid training corpus: {0}")]
    Csv(#[from] csv::Error),
    #[error("training corpus line {line}: {source}")]
    InvalidRow { line: u64, source: InvalidInput },
    #[error("training corpus line {line} has an empty Test label")]
    MissingLabel { line: u64 },
    #[error("training corpus has no rows")]
    Empty,
    #[error(transparent)]
    Encoding(#[from] EncodingError),
    #[error(transparent)]
    Model(#[from] ModelError),
}

#[derive(Debug, Deserialize)]
struct CorpusRow {
    #[serde(rename = "Variables", default)]
    variables: String,
    #[serde(rename = "Variable Types")]
    variable_types: String,
    #[serde(rename = "Number of Groups")]
    num_groups: i64,
    #[serde(rename = "Paired or Independent")]
    paired: String,
    #[serde(rename = "Normality")]
    normality: String,
    #[serde(rename = "Outcome Type")]
    outcome_type: String,
    #[serde(rename = "Test")]
    test: String,
}

/// One labelled design.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrainingExample {
    pub descriptor: CaseDescriptor,
    pub test_name: String,
}

/// Labelled designs read from CSV, in file order.
#[derive(Debug, Clone, Default)]
pub struct TrainingCorpus {
    examples: Vec<TrainingExample>,
}

impl TrainingCorpus {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, TrainingError> {
        let file = File::open(path)?;
        Self::from_reader(file)
    }

    /// Columns beyond the six model fields and `Test` are ignored.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, TrainingError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let mut examples = Vec::new();

        let headers = csv_reader.headers()?.clone();
        for result in csv_reader.records() {
            let record = result?;
            let line = record.position().map_or(0, |position| position.line());
            let row: CorpusRow = record.deserialize(Some(&headers))?;

            if row.test.is_empty() {
                return Err(TrainingError::MissingLabel { line });
            }

            let submission = CaseSubmission {
                variables: row.variables,
                variable_types: row.variable_types,
                num_groups: row.num_groups,
                paired: row.paired,
                normality: row.normality,
                outcome_type: row.outcome_type,
                description: String::new(),
            };
            let descriptor = CaseDescriptor::try_from(submission)
                .map_err(|source| TrainingError::InvalidRow { line, source })?;

            examples.push(TrainingExample {
                descriptor,
                test_name: row.test,
            });
        }

        if examples.is_empty() {
            return Err(TrainingError::Empty);
        }

        debug!(rows = examples.len(), "training corpus parsed");
        Ok(Self { examples })
    }

    pub fn examples(&self) -> &[TrainingExample] {
        &self.examples
    }

    pub fn len(&self) -> usize {
        self.examples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.examples.is_empty()
    }

    pub fn feature_rows(&self) -> Vec<FeatureRow> {
        self.examples
            .iter()
            .map(|example| FeatureRow::from_descriptor(&example.descriptor))
            .collect()
    }
}

/// Which estimator `train_bundle` fits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelParams {
    DecisionTree(TreeParams),
    RandomForest(ForestParams),
}

impl Default for ModelParams {
    fn default() -> Self {
        ModelParams::DecisionTree(TreeParams::default())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrainingOptions {
    pub version: String,
    pub handle_unknown: HandleUnknown,
    pub model: ModelParams,
    pub trained_at: Option<DateTime<Utc>>,
}

impl TrainingOptions {
    /// Ignores unknown categories, since `Variables` is free text.
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            handle_unknown: HandleUnknown::Ignore,
            model: ModelParams::default(),
            trained_at: None,
        }
    }
}

pub fn fit_encoder(corpus: &TrainingCorpus, handle_unknown: HandleUnknown) -> OneHotEncoder {
    OneHotEncoder::fit(&corpus.feature_rows(), handle_unknown)
}

/// Fits an encoder and classifier of one shared version.
///
/// The `Variables` indicators are zeroed in the training matrix, so the fitted
/// model only ever splits on the five structural columns.
pub fn train_bundle(
    corpus: &TrainingCorpus,
    options: &TrainingOptions,
) -> Result<(ClassifierArtifact, EncoderArtifact), TrainingError> {
    if corpus.is_empty() {
        return Err(TrainingError::Empty);
    }

    let rows = corpus.feature_rows();
    let encoder = OneHotEncoder::fit(&rows, options.handle_unknown);

    let mut matrix = rows
        .iter()
        .map(|row| encoder.transform(row).map(|encoded| encoded.values))
        .collect::<Result<Vec<_>, _>>()?;
    if let Some(span) = encoder.column_span(VARIABLES_COLUMN) {
        for row in &mut matrix {
            row[span.clone()].fill(0.0);
        }
    }
    let labels: Vec<String> = corpus
        .examples()
        .iter()
        .map(|example| example.test_name.clone())
        .collect();

    let model = match options.model {
        ModelParams::DecisionTree(params) => {
            ClassifierModel::DecisionTree(DecisionTreeClassifier::fit(&matrix, &labels, params)?)
        }
        ModelParams::RandomForest(params) => {
            ClassifierModel::RandomForest(RandomForestClassifier::fit(&matrix, &labels, params)?)
        }
    };

    info!(
        version = %options.version,
        kind = model.kind(),
        rows = corpus.len(),
        features = encoder.width(),
        classes = model.classes().len(),
        "trained classifier"
    );

    let classifier = ClassifierArtifact {
        version: options.version.clone(),
        trained_at: options.trained_at,
        model,
    };
    let encoder = EncoderArtifact {
        version: options.version.clone(),
        trained_at: options.trained_at,
        encoder,
    };

    Ok((classifier, encoder))
}
