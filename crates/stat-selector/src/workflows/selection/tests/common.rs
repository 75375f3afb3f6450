use std::sync::Arc;

use axum::response::Response;
use serde_json::Value;

use crate::workflows::selection::artifacts::{ClassifierArtifact, EncoderArtifact, ModelBundle};
use crate::workflows::selection::classifier::{ClassifierModel, DecisionTreeClassifier, TreeParams};
use crate::workflows::selection::domain::{
    CaseDescriptor, CaseSubmission, Normality, OutcomeType, Pairing, VariableTypes,
};
use crate::workflows::selection::encoding::{
    FeatureCategories, FeatureRow, HandleUnknown, OneHotEncoder,
};
use crate::workflows::selection::service::TestSelectionService;
use crate::workflows::selection::training::{train_bundle, TrainingCorpus, TrainingOptions};

pub(super) const CORPUS: &str = include_str!("../../../../data/training_corpus.csv");
pub(super) const VERSION: &str = "test-2025.1";

pub(super) fn corpus() -> TrainingCorpus {
    TrainingCorpus::from_reader(CORPUS.as_bytes()).expect("bundled corpus parses")
}

pub(super) fn trained_artifacts(policy: HandleUnknown) -> (ClassifierArtifact, EncoderArtifact) {
    let mut options = TrainingOptions::new(VERSION);
    options.handle_unknown = policy;
    train_bundle(&corpus(), &options).expect("bundled corpus trains")
}

pub(super) fn trained_bundle(policy: HandleUnknown) -> Arc<ModelBundle> {
    let (classifier, encoder) = trained_artifacts(policy);
    Arc::new(ModelBundle::new(classifier, encoder).expect("artifacts pair up"))
}

pub(super) fn service() -> TestSelectionService {
    TestSelectionService::new(trained_bundle(HandleUnknown::Ignore))
}

pub(super) fn strict_service() -> TestSelectionService {
    TestSelectionService::new(trained_bundle(HandleUnknown::Error))
}

pub(super) fn descriptor(
    variable_types: VariableTypes,
    num_groups: i64,
    paired: Pairing,
    normality: Normality,
    outcome_type: OutcomeType,
) -> CaseDescriptor {
    CaseDescriptor::new(variable_types, num_groups, paired, normality, outcome_type)
        .expect("valid descriptor")
}

/// Matches the `Cholesterol; Group` row of the bundled corpus.
pub(super) fn two_group_normal() -> CaseDescriptor {
    descriptor(
        VariableTypes::Continuous,
        2,
        Pairing::Independent,
        Normality::Yes,
        OutcomeType::Continuous,
    )
    .with_variables("Cholesterol; Group")
}

pub(super) fn submission() -> CaseSubmission {
    CaseSubmission {
        variables: "Cholesterol; Group".to_string(),
        variable_types: "continuous".to_string(),
        num_groups: 2,
        paired: "independent".to_string(),
        normality: "yes".to_string(),
        outcome_type: "continuous".to_string(),
        description: "Does cholesterol differ between the two clinics?".to_string(),
    }
}

pub(super) fn paired_three_group_submission() -> CaseSubmission {
    CaseSubmission {
        num_groups: 3,
        paired: "paired".to_string(),
        ..submission()
    }
}

pub(super) fn toy_encoder(policy: HandleUnknown) -> OneHotEncoder {
    let column = |name: &str, categories: &[&str]| FeatureCategories {
        name: name.to_string(),
        categories: categories.iter().map(|value| value.to_string()).collect(),
    };

    OneHotEncoder::new(
        policy,
        vec![
            column("Variables", &["Glucose; Treatment"]),
            column("Variable Types", &["continuous", "continuous + categorical"]),
            column("Number of Groups", &["2", "3"]),
            column("Paired or Independent", &["independent", "paired"]),
            column("Normality", &["no", "yes"]),
            column("Outcome Type", &["continuous"]),
        ],
    )
    .expect("toy encoder schema is valid")
}

/// Index of `Normality = yes` in the toy encoder's output.
pub(super) const TOY_NORMALITY_YES: usize = 8;
pub(super) const TOY_WIDTH: usize = 10;

pub(super) fn toy_classes() -> Vec<String> {
    vec![
        "Independent t-test".to_string(),
        "Mann-Whitney U test".to_string(),
    ]
}

fn toy_case(
    variable_types: VariableTypes,
    num_groups: i64,
    paired: Pairing,
    normality: Normality,
) -> FeatureRow {
    let case = descriptor(variable_types, num_groups, paired, normality, OutcomeType::Continuous)
        .with_variables("Glucose; Treatment");
    FeatureRow::from_descriptor(&case)
}

/// Toy designs whose label depends only on normality.
pub(super) fn toy_training_set() -> (Vec<Vec<f32>>, Vec<String>) {
    let encoder = toy_encoder(HandleUnknown::Error);
    let designs = [
        (VariableTypes::Continuous, 2, Pairing::Independent),
        (VariableTypes::ContinuousCategorical, 3, Pairing::Independent),
        (VariableTypes::Continuous, 3, Pairing::Paired),
        (VariableTypes::ContinuousCategorical, 2, Pairing::Paired),
    ];

    let mut rows = Vec::new();
    let mut labels = Vec::new();
    for (variable_types, num_groups, paired) in designs {
        for (normality, label) in [
            (Normality::Yes, "Independent t-test"),
            (Normality::No, "Mann-Whitney U test"),
        ] {
            let row = toy_case(variable_types, num_groups, paired, normality);
            rows.push(encoder.transform(&row).expect("toy vocabulary").values);
            labels.push(label.to_string());
        }
    }
    (rows, labels)
}

/// Sends normal data to the t-test and everything else to Mann-Whitney.
pub(super) fn toy_classifier() -> DecisionTreeClassifier {
    let (rows, labels) = toy_training_set();
    DecisionTreeClassifier::fit(&rows, &labels, TreeParams::default()).expect("toy tree fits")
}

pub(super) fn toy_artifacts(policy: HandleUnknown) -> (ClassifierArtifact, EncoderArtifact) {
    (
        ClassifierArtifact {
            version: VERSION.to_string(),
            trained_at: None,
            model: ClassifierModel::DecisionTree(toy_classifier()),
        },
        EncoderArtifact {
            version: VERSION.to_string(),
            trained_at: None,
            encoder: toy_encoder(policy),
        },
    )
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
