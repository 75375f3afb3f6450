mod rules;

use serde::{Deserialize, Serialize};

use super::domain::CaseDescriptor;

/// Which field declared a time-to-event design.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeToEventSource {
    VariableTypes,
    OutcomeType,
}

/// Reasons a design falls outside what the recommender was trained on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "code", rename_all = "snake_case")]
pub enum UnsupportedReason {
    PairedGroupsExceedTwo { num_groups: u8 },
    TimeToEvent { source: TimeToEventSource },
    MixedVariableTypes,
}

impl UnsupportedReason {
    pub fn summary(&self) -> String {
        match self {
            UnsupportedReason::PairedGroupsExceedTwo { num_groups } => format!(
                "paired groups > 2 with a continuous outcome ({num_groups} groups) is not supported"
            ),
            UnsupportedReason::TimeToEvent { source } => {
                let field = match source {
                    TimeToEventSource::VariableTypes => "variable types",
                    TimeToEventSource::OutcomeType => "outcome type",
                };
                format!("time-to-event (survival) designs are not supported ({field})")
            }
            UnsupportedReason::MixedVariableTypes => {
                "mixed variable types are not supported".to_string()
            }
        }
    }
}

/// Stateless gate applied before a descriptor is encoded.
#[derive(Debug, Clone, Copy, Default)]
pub struct EligibilityFilter;

impl EligibilityFilter {
    pub fn new() -> Self {
        Self
    }

    /// First matching reason in rule order, or `None` when the design is supported.
    pub fn check(&self, descriptor: &CaseDescriptor) -> Option<UnsupportedReason> {
        rules::RULES.iter().find_map(|rule| rule(descriptor))
    }

    /// Every matching reason, in rule order.
    pub fn matching_rules(&self, descriptor: &CaseDescriptor) -> Vec<UnsupportedReason> {
        rules::RULES
            .iter()
            .filter_map(|rule| rule(descriptor))
            .collect()
    }

    pub fn is_unsupported(&self, descriptor: &CaseDescriptor) -> bool {
        self.check(descriptor).is_some()
    }
}

pub fn is_unsupported(descriptor: &CaseDescriptor) -> bool {
    EligibilityFilter.is_unsupported(descriptor)
}
