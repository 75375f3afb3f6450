//! Statistical test selection: eligibility rules, categorical encoding, and the
//! classifier that turns an eligible research design into a test name.

pub mod artifacts;
pub mod classifier;
pub mod domain;
pub mod eligibility;
pub mod encoding;
pub mod router;
pub mod service;
pub mod training;

#[cfg(test)]
mod tests;

pub use artifacts::{
    ArtifactError, ArtifactKind, ClassifierArtifact, EncoderArtifact, ModelBundle,
    Recommendation, RecommendError,
};
pub use classifier::{
    Classifier, ClassifierModel, DecisionTreeClassifier, ForestParams, ModelError,
    PredictionError, RandomForestClassifier, TreeParams,
};
pub use domain::{
    CaseDescriptor, CaseSubmission, InputSummary, InvalidInput, Normality, OutcomeType,
    Pairing, RecommendationResult, VariableTypes, MAX_GROUPS, MIN_GROUPS,
};
pub use eligibility::{is_unsupported, EligibilityFilter, TimeToEventSource, UnsupportedReason};
pub use encoding::{
    EncodedRow, EncoderSchemaError, EncodingError, FeatureCategories, FeatureRow, HandleUnknown,
    OneHotEncoder, UnknownCategory, FEATURE_COLUMNS, VARIABLES_COLUMN,
};
pub use router::selection_router;
pub use service::{SelectionError, TestSelectionService};
pub use training::{
    fit_encoder, train_bundle, ModelParams, TrainingCorpus, TrainingError, TrainingExample,
    TrainingOptions,
};
