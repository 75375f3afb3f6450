use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::eligibility::UnsupportedReason;
use super::encoding::UnknownCategory;

/// Smallest number of groups a design may declare.
pub const MIN_GROUPS: i64 = 1;
/// Largest number of groups a design may declare.
pub const MAX_GROUPS: i64 = 20;

/// Compares two labels ignoring case and any whitespace, so that
/// `continuous+categorical` and `Continuous + Categorical` agree.
fn same_label(raw: &str, label: &str) -> bool {
    let mut raw = raw.chars().filter(|c| !c.is_whitespace());
    let mut label = label.chars().filter(|c| !c.is_whitespace());
    loop {
        match (raw.next(), label.next()) {
            (None, None) => return true,
            (Some(a), Some(b)) if a.eq_ignore_ascii_case(&b) => continue,
            _ => return false,
        }
    }
}

macro_rules! categorical_field {
    (
        $(#[$meta:meta])*
        $name:ident, $field:literal {
            $($variant:ident => $label:literal $(| $alias:literal)*),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(
                #[serde(rename = $label $(, alias = $alias)*)]
                $variant,
            )+
        }

        impl $name {
            /// Name of the model column this value is encoded under.
            pub const FIELD: &'static str = $field;

            pub const fn ordered() -> &'static [Self] {
                &[$(Self::$variant),+]
            }

            pub const fn label(self) -> &'static str {
                match self {
                    $(Self::$variant => $label),+
                }
            }

            fn allowed() -> Vec<&'static str> {
                Self::ordered().iter().map(|value| value.label()).collect()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.label())
            }
        }

        impl FromStr for $name {
            type Err = InvalidInput;

            fn from_str(raw: &str) -> Result<Self, Self::Err> {
                Self::ordered()
                    .iter()
                    .copied()
                    .find(|value| same_label(raw, value.label()))
                    .ok_or_else(|| InvalidInput::UnknownValue {
                        field: Self::FIELD,
                        value: raw.to_string(),
                        allowed: Self::allowed(),
                    })
            }
        }
    };
}

categorical_field! {
    /// Kinds of variables involved in the analysis.
    VariableTypes, "Variable Types" {
        Continuous => "continuous",
        Categorical => "categorical",
        ContinuousCategorical => "continuous + categorical" | "continuous+categorical",
        CategoricalCategorical => "categorical + categorical" | "categorical+categorical",
        TimeToEvent => "time-to-event",
        Mixed => "mixed",
    }
}

categorical_field! {
    /// Whether observations across groups come from the same subjects.
    Pairing, "Paired or Independent" {
        Independent => "independent",
        Paired => "paired",
        Unknown => "unknown",
    }
}

categorical_field! {
    /// Whether the outcome may be assumed normally distributed.
    Normality, "Normality" {
        Yes => "yes",
        No => "no",
        Unknown => "unknown",
    }
}

categorical_field! {
    /// Measurement scale of the outcome variable.
    OutcomeType, "Outcome Type" {
        Continuous => "continuous",
        Categorical => "categorical",
        TimeToEvent => "time-to-event",
        Other => "other",
    }
}

/// Raw research-design fields as handed over by an input collector.
///
/// Nothing here is trusted yet; [`CaseDescriptor::try_from`] is the boundary that
/// rejects out-of-range group counts and values outside the declared vocabularies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseSubmission {
    #[serde(default)]
    pub variables: String,
    pub variable_types: String,
    pub num_groups: i64,
    pub paired: String,
    pub normality: String,
    pub outcome_type: String,
    #[serde(default)]
    pub description: String,
}

/// Validated, immutable description of a research design.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CaseDescriptor {
    variables: String,
    variable_types: VariableTypes,
    num_groups: u8,
    paired: Pairing,
    normality: Normality,
    outcome_type: OutcomeType,
    description: String,
}

impl CaseDescriptor {
    pub fn new(
        variable_types: VariableTypes,
        num_groups: i64,
        paired: Pairing,
        normality: Normality,
        outcome_type: OutcomeType,
    ) -> Result<Self, InvalidInput> {
        let num_groups = validate_num_groups(num_groups)?;
        Ok(Self {
            variables: String::new(),
            variable_types,
            num_groups,
            paired,
            normality,
            outcome_type,
            description: String::new(),
        })
    }

    pub fn with_variables(mut self, variables: impl Into<String>) -> Self {
        self.variables = variables.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn variables(&self) -> &str {
        &self.variables
    }

    pub fn variable_types(&self) -> VariableTypes {
        self.variable_types
    }

    pub fn num_groups(&self) -> u8 {
        self.num_groups
    }

    pub fn paired(&self) -> Pairing {
        self.paired
    }

    pub fn normality(&self) -> Normality {
        self.normality
    }

    pub fn outcome_type(&self) -> OutcomeType {
        self.outcome_type
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// Echo of the six model fields, keyed by their column names.
    pub fn input_summary(&self) -> InputSummary {
        InputSummary {
            variables: self.variables.clone(),
            variable_types: self.variable_types.label(),
            number_of_groups: self.num_groups,
            paired_or_independent: self.paired.label(),
            normality: self.normality.label(),
            outcome_type: self.outcome_type.label(),
        }
    }
}

impl TryFrom<CaseSubmission> for CaseDescriptor {
    type Error = InvalidInput;

    fn try_from(submission: CaseSubmission) -> Result<Self, Self::Error> {
        let descriptor = Self::new(
            submission.variable_types.parse()?,
            submission.num_groups,
            submission.paired.parse()?,
            submission.normality.parse()?,
            submission.outcome_type.parse()?,
        )?;

        Ok(descriptor
            .with_variables(submission.variables)
            .with_description(submission.description))
    }
}

fn validate_num_groups(value: i64) -> Result<u8, InvalidInput> {
    if (MIN_GROUPS..=MAX_GROUPS).contains(&value) {
        u8::try_from(value).map_err(|_| InvalidInput::NumGroupsOutOfRange { value })
    } else {
        Err(InvalidInput::NumGroupsOutOfRange { value })
    }
}

/// Caller contract violations caught before any rule or model is consulted.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidInput {
    #[error("Number of Groups must be between 1 and 20, got {value}")]
    NumGroupsOutOfRange { value: i64 },
    #[error("{field} does not accept '{value}' (expected one of: {})", .allowed.join(", "))]
    UnknownValue {
        field: &'static str,
        value: String,
        allowed: Vec<&'static str>,
    },
}

impl InvalidInput {
    /// Column name of the offending field.
    pub fn field(&self) -> &'static str {
        match self {
            InvalidInput::NumGroupsOutOfRange { .. } => "Number of Groups",
            InvalidInput::UnknownValue { field, .. } => *field,
        }
    }
}

/// Structured echo of the model inputs, serialized in column order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InputSummary {
    #[serde(rename = "Variables")]
    pub variables: String,
    #[serde(rename = "Variable Types")]
    pub variable_types: &'static str,
    #[serde(rename = "Number of Groups")]
    pub number_of_groups: u8,
    #[serde(rename = "Paired or Independent")]
    pub paired_or_independent: &'static str,
    #[serde(rename = "Normality")]
    pub normality: &'static str,
    #[serde(rename = "Outcome Type")]
    pub outcome_type: &'static str,
}

/// Outcome of a single evaluation, built fresh per request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecommendationResult {
    pub eligible: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub test_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason_code: Option<UnsupportedReason>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_version: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<UnknownCategory>,
    pub input_summary: InputSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl RecommendationResult {
    pub fn unsupported(descriptor: &CaseDescriptor, reason: UnsupportedReason) -> Self {
        Self {
            eligible: false,
            test_name: None,
            reason: Some(reason.summary()),
            reason_code: Some(reason),
            model_version: None,
            warnings: Vec::new(),
            input_summary: descriptor.input_summary(),
            description: display_description(descriptor),
        }
    }

    pub fn recommended(
        descriptor: &CaseDescriptor,
        test_name: String,
        model_version: &str,
        warnings: Vec<UnknownCategory>,
    ) -> Self {
        Self {
            eligible: true,
            test_name: Some(test_name),
            reason: None,
            reason_code: None,
            model_version: Some(model_version.to_string()),
            warnings,
            input_summary: descriptor.input_summary(),
            description: display_description(descriptor),
        }
    }
}

fn display_description(descriptor: &CaseDescriptor) -> Option<String> {
    let trimmed = descriptor.description().trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}
