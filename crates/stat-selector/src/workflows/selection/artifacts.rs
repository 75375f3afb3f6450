//! Versioned classifier/encoder artifacts and the bundle built from them at startup.

use std::fmt;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::classifier::{Classifier, ClassifierModel, PredictionError};
use super::domain::CaseDescriptor;
use super::encoding::{
    EncoderSchemaError, EncodingError, FeatureRow, OneHotEncoder, UnknownCategory,
};
use crate::config::ArtifactConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    Classifier,
    Encoder,
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArtifactKind::Classifier => f.write_str("classifier"),
            ArtifactKind::Encoder => f.write_str("encoder"),
        }
    }
}

/// Failures that leave the process without a usable model. None of these are retried.
#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    #[error("failed to read {artifact} artifact at {}: {source}", path.display())]
    Read {
        artifact: ArtifactKind,
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to write {artifact} artifact at {}: {source}", path.display())]
    Write {
        artifact: ArtifactKind,
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("{artifact} artifact is not valid: {source}")]
    Parse {
        artifact: ArtifactKind,
        source: serde_json::Error,
    },
    #[error("failed to serialize {artifact} artifact: {source}")]
    Serialize {
        artifact: ArtifactKind,
        source: serde_json::Error,
    },
    #[error("encoder artifact has an unexpected schema: {0}")]
    EncoderSchema(#[from] EncoderSchemaError),
    #[error("classifier version '{classifier}' does not match encoder version '{encoder}'")]
    VersionMismatch { classifier: String, encoder: String },
    #[error("configured model version '{expected}' but artifacts are version '{actual}'")]
    UnexpectedVersion { expected: String, actual: String },
    #[error("encoder produces {encoder} features but the classifier expects {classifier}")]
    FeatureWidth { encoder: usize, classifier: usize },
}

/// Serialized classifier plus its provenance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierArtifact {
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trained_at: Option<DateTime<Utc>>,
    pub model: ClassifierModel,
}

/// Serialized encoder plus its provenance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncoderArtifact {
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trained_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub encoder: OneHotEncoder,
}

impl ClassifierArtifact {
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, ArtifactError> {
        parse(ArtifactKind::Classifier, reader)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ArtifactError> {
        read_path(ArtifactKind::Classifier, path.as_ref())
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ArtifactError> {
        write_path(ArtifactKind::Classifier, path.as_ref(), self)
    }
}

impl EncoderArtifact {
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, ArtifactError> {
        let artifact: Self = parse(ArtifactKind::Encoder, reader)?;
        artifact.encoder.validate()?;
        Ok(artifact)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ArtifactError> {
        let artifact: Self = read_path(ArtifactKind::Encoder, path.as_ref())?;
        artifact.encoder.validate()?;
        Ok(artifact)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ArtifactError> {
        write_path(ArtifactKind::Encoder, path.as_ref(), self)
    }
}

fn parse<T: DeserializeOwned, R: Read>(artifact: ArtifactKind, reader: R) -> Result<T, ArtifactError> {
    serde_json::from_reader(reader).map_err(|source| ArtifactError::Parse { artifact, source })
}

fn read_path<T: DeserializeOwned>(artifact: ArtifactKind, path: &Path) -> Result<T, ArtifactError> {
    let file = File::open(path).map_err(|source| ArtifactError::Read {
        artifact,
        path: path.to_path_buf(),
        source,
    })?;
    parse(artifact, BufReader::new(file))
}

fn write_path<T: Serialize>(artifact: ArtifactKind, path: &Path, value: &T) -> Result<(), ArtifactError> {
    let write_error = |source| ArtifactError::Write {
        artifact,
        path: path.to_path_buf(),
        source,
    };
    let file = File::create(path).map_err(write_error)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, value)
        .map_err(|source| ArtifactError::Serialize { artifact, source })?;
    writer.write_all(b"\n").map_err(write_error)?;
    writer.flush().map_err(write_error)
}

/// Label chosen by the classifier plus any categories the encoder zeroed out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recommendation {
    pub test_name: String,
    pub warnings: Vec<UnknownCategory>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RecommendError {
    #[error(transparent)]
    Encoding(#[from] EncodingError),
    #[error(transparent)]
    Prediction(#[from] PredictionError),
}

/// Immutable classifier/encoder pair of one artifact version.
///
/// Built once before serving; share it behind an `Arc`.
pub struct ModelBundle {
    classifier: Box<dyn Classifier>,
    encoder: OneHotEncoder,
    version: String,
}

impl fmt::Debug for ModelBundle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelBundle")
            .field("version", &self.version)
            .field("classes", &self.classifier.classes())
            .field("n_features", &self.classifier.n_features())
            .field("handle_unknown", &self.encoder.handle_unknown())
            .finish()
    }
}

impl ModelBundle {
    pub fn new(
        classifier: ClassifierArtifact,
        encoder: EncoderArtifact,
    ) -> Result<Self, ArtifactError> {
        if classifier.version != encoder.version {
            return Err(ArtifactError::VersionMismatch {
                classifier: classifier.version,
                encoder: encoder.version,
            });
        }
        Self::from_parts(
            Box::new(classifier.model),
            encoder.encoder,
            classifier.version,
        )
    }

    /// Pairs any classifier with an encoder of the same version.
    pub fn from_parts(
        classifier: Box<dyn Classifier>,
        encoder: OneHotEncoder,
        version: impl Into<String>,
    ) -> Result<Self, ArtifactError> {
        encoder.validate()?;
        if encoder.width() != classifier.n_features() {
            return Err(ArtifactError::FeatureWidth {
                encoder: encoder.width(),
                classifier: classifier.n_features(),
            });
        }

        Ok(Self {
            classifier,
            encoder,
            version: version.into(),
        })
    }

    pub fn load(
        classifier_path: impl AsRef<Path>,
        encoder_path: impl AsRef<Path>,
    ) -> Result<Self, ArtifactError> {
        let classifier = ClassifierArtifact::from_path(classifier_path)?;
        let encoder = EncoderArtifact::from_path(encoder_path)?;
        Self::new(classifier, encoder)
    }

    /// Loads the configured artifacts and enforces the optional version pin.
    pub fn load_configured(config: &ArtifactConfig) -> Result<Self, ArtifactError> {
        let bundle = Self::load(&config.model_path, &config.encoder_path)?;

        if let Some(expected) = &config.expected_version {
            if expected != &bundle.version {
                return Err(ArtifactError::UnexpectedVersion {
                    expected: expected.clone(),
                    actual: bundle.version,
                });
            }
        }

        info!(
            version = %bundle.version,
            classes = bundle.classifier.classes().len(),
            features = bundle.encoder.width(),
            model = %config.model_path.display(),
            "model bundle loaded"
        );
        Ok(bundle)
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn classifier(&self) -> &dyn Classifier {
        self.classifier.as_ref()
    }

    pub fn encoder(&self) -> &OneHotEncoder {
        &self.encoder
    }

    /// Encodes the six model fields and returns the classifier's top label.
    ///
    /// Callers are expected to have run the eligibility filter first.
    pub fn recommend(&self, descriptor: &CaseDescriptor) -> Result<Recommendation, RecommendError> {
        let row = FeatureRow::from_descriptor(descriptor);
        let encoded = self.encoder.transform(&row)?;
        let test_name = self.classifier.predict(&encoded.values)?.to_string();

        Ok(Recommendation {
            test_name,
            warnings: encoded.unknown,
        })
    }
}
