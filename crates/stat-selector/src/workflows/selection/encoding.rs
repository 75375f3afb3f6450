//! Projection of a descriptor onto the model columns and the frozen one-hot encoding.

use std::ops::Range;

use serde::{Deserialize, Serialize};

use super::domain::{CaseDescriptor, Normality, OutcomeType, Pairing, VariableTypes};

/// Free-text column; encoded like the others but never split on during training.
pub const VARIABLES_COLUMN: &str = "Variables";

/// Model columns, in the order the encoder was fit on.
pub const FEATURE_COLUMNS: [&str; 6] = [
    VARIABLES_COLUMN,
    VariableTypes::FIELD,
    "Number of Groups",
    Pairing::FIELD,
    Normality::FIELD,
    OutcomeType::FIELD,
];

/// String-typed projection of a descriptor. The description never makes it in here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureRow {
    values: [String; 6],
}

impl FeatureRow {
    pub fn from_descriptor(descriptor: &CaseDescriptor) -> Self {
        Self {
            values: [
                descriptor.variables().to_string(),
                descriptor.variable_types().label().to_string(),
                descriptor.num_groups().to_string(),
                descriptor.paired().label().to_string(),
                descriptor.normality().label().to_string(),
                descriptor.outcome_type().label().to_string(),
            ],
        }
    }

    pub fn values(&self) -> &[String; 6] {
        &self.values
    }

    /// `(column, value)` pairs in column order.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> + '_ {
        FEATURE_COLUMNS
            .iter()
            .copied()
            .zip(self.values.iter().map(String::as_str))
    }
}

impl From<&CaseDescriptor> for FeatureRow {
    fn from(descriptor: &CaseDescriptor) -> Self {
        Self::from_descriptor(descriptor)
    }
}

/// What the encoder does with a value it never saw during fitting.
///
/// Always written out in the artifact; there is no implicit default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HandleUnknown {
    /// Emit an all-zero block for the column and report a warning.
    Ignore,
    /// Refuse to encode the row.
    Error,
}

/// Learned vocabulary for one column. Categories are kept sorted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureCategories {
    pub name: String,
    pub categories: Vec<String>,
}

/// A value absent from the training vocabulary of its column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnknownCategory {
    pub feature: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EncodingError {
    #[error("'{value}' was not seen for {feature} during training")]
    UnknownCategory { feature: String, value: String },
}

/// Indicator vector plus whatever unknown categories were zeroed out.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedRow {
    pub values: Vec<f32>,
    pub unknown: Vec<UnknownCategory>,
}

/// Frozen one-hot encoder over the six model columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OneHotEncoder {
    handle_unknown: HandleUnknown,
    features: Vec<FeatureCategories>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EncoderSchemaError {
    #[error("encoder must describe {expected} columns, found {actual}")]
    ColumnCount { expected: usize, actual: usize },
    #[error("encoder column {index} is '{actual}', expected '{expected}'")]
    ColumnName {
        index: usize,
        expected: &'static str,
        actual: String,
    },
    #[error("encoder column '{feature}' has no categories")]
    EmptyColumn { feature: String },
    #[error("encoder column '{feature}' categories are not sorted and unique")]
    UnsortedCategories { feature: String },
}

impl OneHotEncoder {
    pub fn new(
        handle_unknown: HandleUnknown,
        features: Vec<FeatureCategories>,
    ) -> Result<Self, EncoderSchemaError> {
        let encoder = Self {
            handle_unknown,
            features,
        };
        encoder.validate()?;
        Ok(encoder)
    }

    /// Learns sorted, de-duplicated vocabularies from training rows.
    pub fn fit<'a, I>(rows: I, handle_unknown: HandleUnknown) -> Self
    where
        I: IntoIterator<Item = &'a FeatureRow>,
    {
        let mut vocabularies: [Vec<String>; 6] = Default::default();
        for row in rows {
            for (vocabulary, value) in vocabularies.iter_mut().zip(row.values()) {
                vocabulary.push(value.clone());
            }
        }

        let features = FEATURE_COLUMNS
            .iter()
            .zip(vocabularies)
            .map(|(name, mut categories)| {
                categories.sort();
                categories.dedup();
                FeatureCategories {
                    name: (*name).to_string(),
                    categories,
                }
            })
            .collect();

        Self {
            handle_unknown,
            features,
        }
    }

    pub fn validate(&self) -> Result<(), EncoderSchemaError> {
        if self.features.len() != FEATURE_COLUMNS.len() {
            return Err(EncoderSchemaError::ColumnCount {
                expected: FEATURE_COLUMNS.len(),
                actual: self.features.len(),
            });
        }

        for (index, (feature, expected)) in self.features.iter().zip(FEATURE_COLUMNS).enumerate()
        {
            if feature.name != expected {
                return Err(EncoderSchemaError::ColumnName {
                    index,
                    expected,
                    actual: feature.name.clone(),
                });
            }
            if feature.categories.is_empty() {
                return Err(EncoderSchemaError::EmptyColumn {
                    feature: feature.name.clone(),
                });
            }
            if feature
                .categories
                .windows(2)
                .any(|pair| pair[0] >= pair[1])
            {
                return Err(EncoderSchemaError::UnsortedCategories {
                    feature: feature.name.clone(),
                });
            }
        }

        Ok(())
    }

    pub fn handle_unknown(&self) -> HandleUnknown {
        self.handle_unknown
    }

    pub fn features(&self) -> &[FeatureCategories] {
        &self.features
    }

    /// Length of every encoded vector.
    pub fn width(&self) -> usize {
        self.features
            .iter()
            .map(|feature| feature.categories.len())
            .sum()
    }

    /// Positions of one column's indicators within an encoded vector.
    pub fn column_span(&self, column: &str) -> Option<Range<usize>> {
        let mut offset = 0;
        for feature in &self.features {
            let end = offset + feature.categories.len();
            if feature.name == column {
                return Some(offset..end);
            }
            offset = end;
        }
        None
    }

    pub fn transform(&self, row: &FeatureRow) -> Result<EncodedRow, EncodingError> {
        let mut values = vec![0.0_f32; self.width()];
        let mut unknown = Vec::new();
        let mut offset = 0;

        for (feature, value) in self.features.iter().zip(row.values()) {
            match feature.categories.binary_search(value) {
                Ok(position) => values[offset + position] = 1.0,
                Err(_) => match self.handle_unknown {
                    HandleUnknown::Ignore => unknown.push(UnknownCategory {
                        feature: feature.name.clone(),
                        value: value.clone(),
                    }),
                    HandleUnknown::Error => {
                        return Err(EncodingError::UnknownCategory {
                            feature: feature.name.clone(),
                            value: value.clone(),
                        })
                    }
                },
            }
            offset += feature.categories.len();
        }

        Ok(EncodedRow { values, unknown })
    }
}
