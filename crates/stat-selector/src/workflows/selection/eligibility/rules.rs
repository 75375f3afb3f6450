use super::super::domain::{CaseDescriptor, OutcomeType, Pairing, VariableTypes};
use super::{TimeToEventSource, UnsupportedReason};

pub(crate) type Rule = fn(&CaseDescriptor) -> Option<UnsupportedReason>;

pub(crate) const RULES: [Rule; 3] = [
    paired_groups_exceed_two,
    time_to_event,
    mixed_variable_types,
];

const TIME_TO_EVENT: &str = "time-to-event";

fn paired_groups_exceed_two(descriptor: &CaseDescriptor) -> Option<UnsupportedReason> {
    let applies = descriptor.outcome_type() == OutcomeType::Continuous
        && descriptor.num_groups() > 2
        && descriptor.paired() == Pairing::Paired;

    applies.then_some(UnsupportedReason::PairedGroupsExceedTwo {
        num_groups: descriptor.num_groups(),
    })
}

fn time_to_event(descriptor: &CaseDescriptor) -> Option<UnsupportedReason> {
    // Substring match so any combined variable-type label naming survival data is caught.
    if descriptor.variable_types().label().contains(TIME_TO_EVENT) {
        return Some(UnsupportedReason::TimeToEvent {
            source: TimeToEventSource::VariableTypes,
        });
    }

    (descriptor.outcome_type() == OutcomeType::TimeToEvent).then_some(
        UnsupportedReason::TimeToEvent {
            source: TimeToEventSource::OutcomeType,
        },
    )
}

fn mixed_variable_types(descriptor: &CaseDescriptor) -> Option<UnsupportedReason> {
    (descriptor.variable_types() == VariableTypes::Mixed)
        .then_some(UnsupportedReason::MixedVariableTypes)
}
