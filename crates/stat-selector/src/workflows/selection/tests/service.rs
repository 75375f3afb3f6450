use super::common::*;
use crate::workflows::selection::artifacts::RecommendError;
use crate::workflows::selection::domain::{
    CaseSubmission, InvalidInput, Normality, OutcomeType, Pairing, VariableTypes,
};
use crate::workflows::selection::eligibility::{TimeToEventSource, UnsupportedReason};
use crate::workflows::selection::encoding::{EncodingError, UnknownCategory};
use crate::workflows::selection::service::SelectionError;

#[test]
fn two_group_normal_design_gets_the_t_test() {
    let service = service();

    let result = service.evaluate(&two_group_normal()).expect("evaluates");

    assert!(result.eligible);
    assert_eq!(result.test_name.as_deref(), Some("Independent t-test"));
    assert_eq!(result.model_version.as_deref(), Some(VERSION));
    assert!(result.reason.is_none());
    assert!(result.reason_code.is_none());
    assert!(result.warnings.is_empty());
}

#[test]
fn every_corpus_row_is_recommended_its_own_label() {
    let service = service();

    for example in corpus().examples() {
        let result = service.evaluate(&example.descriptor).expect("evaluates");
        assert_eq!(
            result.test_name.as_deref(),
            Some(example.test_name.as_str()),
            "row {:?}",
            example.descriptor
        );
    }
}

#[test]
fn unseen_variable_names_do_not_change_any_corpus_recommendation() {
    let service = service();

    for example in corpus().examples() {
        let renamed = example.descriptor.clone().with_variables("Serum sodium; Ward");

        let result = service.evaluate(&renamed).expect("evaluates");

        assert_eq!(
            result.test_name.as_deref(),
            Some(example.test_name.as_str()),
            "row {:?}",
            example.descriptor
        );
        assert_eq!(result.warnings.len(), 1);
    }
}

#[test]
fn variable_names_borrowed_from_another_row_are_ignored() {
    let service = service();
    let examples = corpus().examples().to_vec();

    for (example, donor) in examples.iter().zip(examples.iter().rev()) {
        let borrowed = example
            .descriptor
            .clone()
            .with_variables(donor.descriptor.variables());

        let result = service.evaluate(&borrowed).expect("evaluates");

        assert_eq!(
            result.test_name.as_deref(),
            Some(example.test_name.as_str()),
            "row {:?} with variables of {:?}",
            example.descriptor,
            donor.descriptor
        );
    }
}

#[test]
fn paired_three_group_design_is_declined_without_a_test() {
    let result = service()
        .submit(paired_three_group_submission())
        .expect("evaluates");

    assert!(!result.eligible);
    assert!(result.test_name.is_none());
    assert!(result.model_version.is_none());
    assert_eq!(
        result.reason_code,
        Some(UnsupportedReason::PairedGroupsExceedTwo { num_groups: 3 })
    );
    assert!(result
        .reason
        .as_deref()
        .is_some_and(|reason| reason.contains("paired groups > 2")));
}

#[test]
fn time_to_event_outcome_is_declined() {
    let case = descriptor(
        VariableTypes::ContinuousCategorical,
        2,
        Pairing::Independent,
        Normality::Unknown,
        OutcomeType::TimeToEvent,
    );

    let result = service().evaluate(&case).expect("evaluates");

    assert!(!result.eligible);
    assert_eq!(
        result.reason_code,
        Some(UnsupportedReason::TimeToEvent {
            source: TimeToEventSource::OutcomeType
        })
    );
}

#[test]
fn mixed_variable_types_are_declined() {
    let case = descriptor(
        VariableTypes::Mixed,
        2,
        Pairing::Independent,
        Normality::Unknown,
        OutcomeType::Categorical,
    );

    let result = service().evaluate(&case).expect("evaluates");

    assert!(!result.eligible);
    assert_eq!(result.reason_code, Some(UnsupportedReason::MixedVariableTypes));
    assert!(result
        .reason
        .as_deref()
        .is_some_and(|reason| reason.contains("mixed variable types")));
}

#[test]
fn recommendations_are_deterministic_and_ignore_the_description() {
    let service = service();
    let plain = two_group_normal();
    let annotated = two_group_normal().with_description("Clinic A against clinic B, 2019 cohort");

    let first = service.evaluate(&plain).expect("evaluates");
    let second = service.evaluate(&plain).expect("evaluates");
    let third = service.evaluate(&annotated).expect("evaluates");

    assert_eq!(first, second);
    assert_eq!(first.test_name, third.test_name);
    assert_eq!(first.input_summary, third.input_summary);
    assert!(first.description.is_none());
    assert_eq!(
        third.description.as_deref(),
        Some("Clinic A against clinic B, 2019 cohort")
    );
}

#[test]
fn unseen_variables_are_recommended_with_a_warning() {
    let submission = CaseSubmission {
        variables: "Serum sodium; Ward".to_string(),
        ..submission()
    };

    let result = service().submit(submission).expect("unknowns tolerated");

    assert!(result.eligible);
    assert!(result.test_name.is_some());
    assert_eq!(
        result.warnings,
        vec![UnknownCategory {
            feature: "Variables".to_string(),
            value: "Serum sodium; Ward".to_string(),
        }]
    );
}

#[test]
fn strict_bundle_rejects_unseen_variables() {
    let submission = CaseSubmission {
        variables: "Serum sodium; Ward".to_string(),
        ..submission()
    };

    let err = strict_service().submit(submission).expect_err("unknown rejected");

    assert!(matches!(
        err,
        SelectionError::Recommend(RecommendError::Encoding(EncodingError::UnknownCategory {
            ref feature,
            ..
        })) if feature == "Variables"
    ));
}

#[test]
fn strict_bundle_still_declines_unsupported_designs_first() {
    let submission = CaseSubmission {
        variables: "Serum sodium; Ward".to_string(),
        ..paired_three_group_submission()
    };

    let result = strict_service().submit(submission).expect("filter runs first");

    assert!(!result.eligible);
}

#[test]
fn malformed_submissions_are_invalid_input() {
    let too_many = CaseSubmission {
        num_groups: 21,
        ..submission()
    };
    let err = service().submit(too_many).expect_err("range enforced");
    assert!(matches!(
        err,
        SelectionError::InvalidInput(InvalidInput::NumGroupsOutOfRange { value: 21 })
    ));

    let bad_normality = CaseSubmission {
        normality: "maybe".to_string(),
        ..submission()
    };
    let err = service().submit(bad_normality).expect_err("vocabulary enforced");
    match err {
        SelectionError::InvalidInput(input) => assert_eq!(input.field(), "Normality"),
        other => panic!("expected invalid input, got {other:?}"),
    }
}

#[test]
fn input_summary_echoes_fields_in_column_order() {
    let result = service().submit(submission()).expect("evaluates");

    let json = serde_json::to_string(&result.input_summary).expect("serializes");
    let positions: Vec<usize> = [
        "\"Variables\"",
        "\"Variable Types\"",
        "\"Number of Groups\"",
        "\"Paired or Independent\"",
        "\"Normality\"",
        "\"Outcome Type\"",
    ]
    .iter()
    .map(|key| json.find(key).expect("key present"))
    .collect();

    assert!(positions.windows(2).all(|pair| pair[0] < pair[1]));
    assert!(json.contains("\"Number of Groups\":2"));
    assert!(!json.contains("cholesterol differ"));
}
