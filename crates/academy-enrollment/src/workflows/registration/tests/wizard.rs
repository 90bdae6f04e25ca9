use std::collections::{BTreeMap, BTreeSet};

use super::common::*;
use crate::workflows::registration::domain::{
    ApplicationForm, EducationalAttainment, FieldValue, FormError, SelectionGroup,
};
use crate::workflows::registration::fields::{FieldName, Step, ValueKind};
use crate::workflows::registration::links::RouteTable;
use crate::workflows::registration::reference::OTHER_CLASSIFICATION_ID;
use crate::workflows::registration::submission::{PartValue, RegistrationReceipt, SubmissionError};
use crate::workflows::registration::validation::validate_step;
use crate::workflows::registration::wizard::{
    NotificationLevel, RegistrationWizard, SubmissionOutcome, SubmitBlocked, Transition,
};

#[test]
fn blank_last_name_blocks_until_filled() {
    let mut wizard = wizard();
    fill_personal(&mut wizard);
    set_text(&mut wizard, FieldName::LastName, "");

    let transition = wizard.advance();
    assert!(matches!(
        transition,
        Transition::Blocked {
            step: Step::Personal,
            ..
        }
    ));
    assert_eq!(wizard.step().index(), 0);
    assert_eq!(
        wizard.error(FieldName::LastName),
        Some("The last name field is required.")
    );
    assert!(!wizard.can_advance());

    set_text(&mut wizard, FieldName::LastName, "Cruz");
    assert!(wizard.error(FieldName::LastName).is_none());
    assert!(wizard.can_advance());

    let transition = wizard.advance();
    assert_eq!(
        transition,
        Transition::Moved {
            from: Step::Personal,
            to: Step::Contact
        }
    );
    assert_eq!(wizard.step().index(), 1);
}

#[test]
fn advance_reports_every_missing_field_on_the_step() {
    let mut wizard = wizard();
    let transition = wizard.advance();

    let expected = validate_step(Step::Personal, &ApplicationForm::default());
    assert_eq!(
        transition,
        Transition::Blocked {
            step: Step::Personal,
            errors: expected.len()
        }
    );
    assert_eq!(wizard.step_errors(Step::Personal), expected);
    assert!(expected.contains_key(&FieldName::FirstName));
    assert!(expected.contains_key(&FieldName::Birthdate));
    assert!(!expected.contains_key(&FieldName::MiddleName));
}

#[test]
fn advance_moves_exactly_one_step_when_valid() {
    let mut wizard = filled_wizard();
    for expected in 1..Step::COUNT {
        let before = wizard.step().index();
        assert!(wizard.advance().is_moved());
        assert_eq!(wizard.step().index(), before + 1);
        assert_eq!(wizard.step().index(), expected);
    }
    assert_eq!(wizard.step(), Step::Review);
    assert_eq!(wizard.advance(), Transition::Unchanged);
    assert!(!wizard.can_advance());
    assert!(wizard.can_submit());
}

#[test]
fn retreat_ignores_validation_and_keeps_data() {
    let mut wizard = wizard_on_review();
    wizard.retreat();
    wizard.retreat();
    assert_eq!(wizard.step(), Step::Course);

    set_text(&mut wizard, FieldName::ProgramId, "");
    assert!(wizard.error(FieldName::ProgramId).is_some());

    let before = wizard.form().clone();
    let transition = wizard.retreat();
    assert_eq!(
        transition,
        Transition::Moved {
            from: Step::Course,
            to: Step::Class
        }
    );
    assert_eq!(wizard.form(), &before);
    assert_eq!(wizard.form().last_name, "Dela Cruz");
}

#[test]
fn retreat_from_first_step_is_a_no_op() {
    let mut wizard = wizard();
    assert_eq!(wizard.retreat(), Transition::Unchanged);
    assert_eq!(wizard.step(), Step::Personal);
}

#[test]
fn jump_forward_is_gated_by_current_step_only() {
    let mut wizard = wizard();
    assert!(matches!(
        wizard.jump_to(Step::Course),
        Transition::Blocked { .. }
    ));
    assert_eq!(wizard.step(), Step::Personal);

    fill_personal(&mut wizard);
    assert_eq!(
        wizard.jump_to(Step::Course),
        Transition::Moved {
            from: Step::Personal,
            to: Step::Course
        }
    );

    // Skipped steps are still empty and get caught on submit.
    assert!(!validate_step(Step::Contact, wizard.form()).is_empty());
}

#[test]
fn jump_backward_never_validates() {
    let mut wizard = filled_wizard();
    wizard.jump_to(Step::Education);
    wizard.set_educational_attainment(EducationalAttainment::CollegeGraduate);
    set_text(&mut wizard, FieldName::FirstName, "");

    assert!(wizard.jump_to(Step::Personal).is_moved());
    assert_eq!(wizard.step(), Step::Personal);
}

#[test]
fn jump_to_index_rejects_out_of_range() {
    let mut wizard = wizard();
    assert_eq!(
        wizard.jump_to_index(Step::COUNT),
        Err(FormError::StepOutOfRange(Step::COUNT))
    );
    assert_eq!(wizard.jump_to_index(0), Ok(Transition::Unchanged));
}

#[test]
fn attainment_is_a_single_choice() {
    let mut wizard = wizard();
    fill_personal(&mut wizard);
    fill_contact(&mut wizard);
    wizard.jump_to(Step::Education);

    assert!(matches!(wizard.advance(), Transition::Blocked { .. }));
    assert!(wizard.error(FieldName::EducationalAttainment).is_some());

    for level in EducationalAttainment::ALL {
        wizard.set_educational_attainment(EducationalAttainment::Doctorate);
        wizard.set_educational_attainment(level);
        assert_eq!(wizard.form().educational_attainment, Some(level));
    }
    assert!(wizard.error(FieldName::EducationalAttainment).is_none());
    assert!(wizard.advance().is_moved());
}

#[test]
fn toggling_twice_restores_the_selection() {
    let mut wizard = wizard();
    wizard
        .toggle_selection(SelectionGroup::Classifications, 13)
        .expect("offered classification");
    let original = wizard.form().classifications.clone();

    assert_eq!(
        wizard.toggle_selection(SelectionGroup::Classifications, 18),
        Ok(true)
    );
    assert_eq!(
        wizard.toggle_selection(SelectionGroup::Classifications, 18),
        Ok(false)
    );
    assert_eq!(wizard.form().classifications, original);

    assert_eq!(
        wizard.toggle_selection(SelectionGroup::DisabilityTypes, 2),
        Ok(true)
    );
    assert_eq!(
        wizard.toggle_selection(SelectionGroup::DisabilityTypes, 2),
        Ok(false)
    );
    assert!(wizard.form().disability_types.is_empty());
}

#[test]
fn toggling_an_unknown_option_is_rejected() {
    let mut wizard = wizard();
    assert_eq!(
        wizard.toggle_selection(SelectionGroup::DisabilityTypes, 99),
        Err(FormError::UnknownOption {
            group: SelectionGroup::DisabilityTypes,
            id: 99
        })
    );
    assert!(wizard.form().disability_types.is_empty());
}

#[test]
fn setting_a_selection_with_an_unknown_option_is_rejected() {
    let mut wizard = wizard();
    assert_eq!(
        wizard.set_field(
            FieldName::DisabilityTypes,
            FieldValue::Selection(BTreeSet::from([2, 99]))
        ),
        Err(FormError::UnknownOption {
            group: SelectionGroup::DisabilityTypes,
            id: 99
        })
    );
    assert!(wizard.form().disability_types.is_empty());

    wizard
        .set_field(
            FieldName::DisabilityTypes,
            FieldValue::Selection(BTreeSet::from([2])),
        )
        .expect("offered ids are accepted");
    assert_eq!(wizard.form().disability_types, BTreeSet::from([2]));
}

#[test]
fn other_classification_requires_details() {
    let mut wizard = filled_wizard();
    wizard.jump_to(Step::Class);
    assert!(validate_step(Step::Class, wizard.form()).is_empty());

    wizard
        .toggle_selection(SelectionGroup::Classifications, OTHER_CLASSIFICATION_ID)
        .expect("others is offered");
    let errors = validate_step(Step::Class, wizard.form());
    assert_eq!(
        errors.get(&FieldName::OtherClassificationDetails).map(String::as_str),
        Some("Please specify your other classification.")
    );
    assert!(matches!(wizard.advance(), Transition::Blocked { .. }));

    set_text(
        &mut wizard,
        FieldName::OtherClassificationDetails,
        "Solo parent",
    );
    assert!(validate_step(Step::Class, wizard.form()).is_empty());
    assert!(wizard.can_advance());
    assert!(wizard.advance().is_moved());
}

#[test]
fn deselecting_other_clears_a_showing_details_error() {
    let mut wizard = filled_wizard();
    wizard.jump_to(Step::Class);
    wizard
        .toggle_selection(SelectionGroup::Classifications, OTHER_CLASSIFICATION_ID)
        .expect("others is offered");
    assert!(wizard.error(FieldName::OtherClassificationDetails).is_none());

    wizard.advance();
    assert!(wizard.error(FieldName::OtherClassificationDetails).is_some());

    wizard
        .toggle_selection(SelectionGroup::Classifications, OTHER_CLASSIFICATION_ID)
        .expect("others is offered");
    assert!(wizard.error(FieldName::OtherClassificationDetails).is_none());
}

#[test]
fn disability_requires_a_cause() {
    let mut wizard = filled_wizard();
    wizard.jump_to(Step::Class);
    wizard
        .toggle_selection(SelectionGroup::DisabilityTypes, 4)
        .expect("visual disability is offered");

    assert!(matches!(wizard.advance(), Transition::Blocked { .. }));
    assert_eq!(
        wizard.error(FieldName::DisabilityCause),
        Some("Please state the cause of your disability.")
    );

    set_text(&mut wizard, FieldName::DisabilityCause, "Congenital");
    assert!(wizard.error(FieldName::DisabilityCause).is_none());
    assert!(wizard.advance().is_moved());
}

#[test]
fn birthdate_drives_the_derived_age() {
    let mut wizard = wizard();
    set_text(&mut wizard, FieldName::Birthdate, "2000-06-16");
    assert_eq!(wizard.form().age, "24");
    set_text(&mut wizard, FieldName::Birthdate, "2000-06-15");
    assert_eq!(wizard.form().age, "25");
    set_text(&mut wizard, FieldName::Birthdate, "not a date");
    assert_eq!(wizard.form().age, "");
    assert!(wizard.error(FieldName::Birthdate).is_some());

    assert_eq!(
        wizard.set_field(FieldName::Age, FieldValue::text("40")),
        Err(FormError::DerivedField(FieldName::Age))
    );
}

#[test]
fn future_birthdate_is_flagged_on_the_birthdate_control() {
    let mut wizard = wizard();
    fill_personal(&mut wizard);
    set_text(&mut wizard, FieldName::Birthdate, "2030-01-01");
    assert_eq!(wizard.form().age, "");
    assert_eq!(
        wizard.error(FieldName::Birthdate),
        Some("The birthdate must not be in the future.")
    );

    assert!(matches!(
        wizard.advance(),
        Transition::Blocked {
            step: Step::Personal,
            ..
        }
    ));
    assert_eq!(
        wizard.error(FieldName::Birthdate),
        Some("The birthdate must not be in the future.")
    );

    set_text(&mut wizard, FieldName::Birthdate, "2025-06-15");
    assert!(wizard.error(FieldName::Birthdate).is_none());
    assert_eq!(wizard.form().age, "0");
}

#[test]
fn set_field_rejects_the_wrong_value_shape() {
    let mut wizard = wizard();
    let result = wizard.set_field(FieldName::Consent, FieldValue::text("yes"));
    assert!(matches!(result, Err(FormError::ValueKind { .. })));
    assert!(!wizard.form().consent);
}

#[test]
fn review_step_shows_every_field() {
    let wizard = wizard_on_review();
    let view = wizard.step_view();
    assert_eq!(view.step, Step::Review);
    assert_eq!(view.controls.len(), FieldName::ALL.len());
    assert!(view.can_submit);
    assert!(!view.can_advance);
    assert!(view.can_retreat);

    let age = view
        .controls
        .iter()
        .find(|control| control.field == FieldName::Age)
        .expect("age control");
    assert!(age.read_only);
}

#[test]
fn submit_is_only_offered_on_review() {
    let mut wizard = filled_wizard();
    let backend = ScriptedBackend::accepting("lrn-000001");
    assert_eq!(
        wizard.submit(&backend),
        Err(SubmitBlocked::NotOnReview(Step::Personal))
    );
    assert_eq!(backend.calls(), 0);
}

#[test]
fn submit_serializes_the_whole_form() {
    let mut wizard = wizard_on_review();
    wizard
        .toggle_selection(SelectionGroup::Classifications, 13)
        .expect("offered");
    wizard
        .toggle_selection(SelectionGroup::Classifications, 18)
        .expect("offered");

    let request = wizard.begin_submission().expect("valid form");
    assert!(wizard.is_processing());
    assert!(!wizard.can_submit());
    assert_eq!(request.endpoint, "http://academy.test/api/v1/learners/register");
    assert_eq!(request.text_value("last_name"), Some("Dela Cruz"));
    assert_eq!(request.text_value("consent"), Some("true"));
    assert_eq!(request.text_value("educational_attainment"), Some("senior_high_school"));
    let classifications: Vec<&str> = request
        .parts
        .iter()
        .filter(|part| part.name == "classifications[]")
        .filter_map(|part| match &part.value {
            PartValue::Text(value) => Some(value.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(classifications, vec!["13", "18"]);
    assert_eq!(
        request.file_value("picture").map(|file| file.file_name.as_str()),
        Some("photo.png")
    );

    assert_eq!(wizard.begin_submission(), Err(SubmitBlocked::InProgress));
}

#[test]
fn submission_success_resets_the_wizard() {
    let mut wizard = wizard_on_review();
    let backend = ScriptedBackend::accepting("lrn-000042");

    let outcome = wizard.submit(&backend).expect("dispatched");
    assert_eq!(
        outcome,
        SubmissionOutcome::Registered(RegistrationReceipt {
            learner_id: Some("lrn-000042".to_string())
        })
    );
    assert_eq!(backend.calls(), 1);
    assert_eq!(wizard.form(), &ApplicationForm::default());
    assert_eq!(wizard.step().index(), 0);
    assert!(wizard.errors().is_empty());
    assert!(!wizard.is_processing());

    let notification = wizard.notification().expect("success shown");
    assert_eq!(notification.level, NotificationLevel::Success);
}

#[test]
fn server_error_routes_to_the_owning_step() {
    let mut wizard = wizard_on_review();
    let backend = ScriptedBackend::answering(Err(SubmissionError::Rejected(BTreeMap::from([(
        "program_id".to_string(),
        "required".to_string(),
    )]))));

    let outcome = wizard.submit(&backend).expect("dispatched");
    assert_eq!(
        outcome,
        SubmissionOutcome::Rejected {
            landed_on: Some(Step::Course),
            errors: 1
        }
    );
    assert_eq!(wizard.step().index(), 4);
    assert_eq!(wizard.error(FieldName::ProgramId), Some("required"));
    assert!(!wizard.can_advance());

    let notification = wizard.notification().expect("error shown");
    assert_eq!(notification.level, NotificationLevel::Error);
    assert_eq!(notification.messages, vec!["required".to_string()]);
}

#[test]
fn server_errors_land_on_the_earliest_step() {
    let mut wizard = wizard_on_review();
    let outcome = wizard.finish_submission(Err(SubmissionError::Rejected(BTreeMap::from([
        ("picture".to_string(), "The picture must be an image.".to_string()),
        (
            "email".to_string(),
            "The email has already been taken.".to_string(),
        ),
        ("classifications.0".to_string(), "Invalid.".to_string()),
        ("captcha".to_string(), "Try again.".to_string()),
    ]))));

    assert_eq!(
        outcome,
        SubmissionOutcome::Rejected {
            landed_on: Some(Step::Contact),
            errors: 4
        }
    );
    assert_eq!(wizard.step(), Step::Contact);
    assert!(wizard.error(FieldName::Picture).is_some());
    assert!(wizard.error(FieldName::Classifications).is_some());

    let notification = wizard.notification().expect("error shown");
    assert!(notification
        .messages
        .iter()
        .any(|message| message == "Try again."));
}

#[test]
fn server_errors_for_unknown_fields_stay_on_review() {
    let mut wizard = wizard_on_review();
    let outcome = wizard.finish_submission(Err(SubmissionError::Rejected(BTreeMap::from([(
        "captcha".to_string(),
        "Try again.".to_string(),
    )]))));
    assert_eq!(
        outcome,
        SubmissionOutcome::Rejected {
            landed_on: None,
            errors: 1
        }
    );
    assert_eq!(wizard.step(), Step::Review);
}

#[test]
fn transport_failure_leaves_form_and_step_untouched() {
    let mut wizard = wizard_on_review();
    let before = wizard.form().clone();
    let backend =
        ScriptedBackend::answering(Err(SubmissionError::Transport("connection reset".into())));

    let outcome = wizard.submit(&backend).expect("dispatched");
    assert_eq!(outcome, SubmissionOutcome::Failed);
    assert_eq!(wizard.form(), &before);
    assert_eq!(wizard.step(), Step::Review);
    assert!(wizard.errors().is_empty());
    assert!(!wizard.is_processing());

    let notification = wizard.dismiss_notification().expect("failure shown");
    assert_eq!(notification.level, NotificationLevel::Error);
    assert!(wizard.notification().is_none());
}

#[test]
fn invalid_submission_lands_on_first_incomplete_step() {
    let mut wizard = filled_wizard();
    set_text(&mut wizard, FieldName::City, "");
    wizard.jump_to(Step::Review);
    assert_eq!(wizard.step(), Step::Review);

    let backend = ScriptedBackend::accepting("lrn-000001");
    assert_eq!(
        wizard.submit(&backend),
        Err(SubmitBlocked::Invalid(Step::Contact))
    );
    assert_eq!(backend.calls(), 0);
    assert_eq!(wizard.step(), Step::Contact);
    assert!(wizard.error(FieldName::City).is_some());
    assert_eq!(
        wizard.notification().map(|notification| notification.level),
        Some(NotificationLevel::Warning)
    );
}

#[test]
fn missing_route_blocks_submission() {
    let mut wizard =
        RegistrationWizard::new(catalog(), RouteTable::new("http://academy.test"), today());
    fill_personal(&mut wizard);
    fill_contact(&mut wizard);
    fill_education(&mut wizard);
    fill_course(&mut wizard);
    fill_consent(&mut wizard);
    wizard.jump_to(Step::Review);

    let backend = ScriptedBackend::accepting("lrn-000001");
    assert!(matches!(
        wizard.submit(&backend),
        Err(SubmitBlocked::UnresolvedRoute(_))
    ));
    assert!(!wizard.is_processing());
    assert_eq!(backend.calls(), 0);
}

#[test]
fn step_validation_matches_required_fields() {
    let form = complete_form();
    for step in Step::ALL {
        assert!(validate_step(step, &form).is_empty(), "{step:?} should pass");
    }

    for field in FieldName::ALL.into_iter().filter(|field| field.is_required()) {
        let mut broken = form.clone();
        let blank = match field.value_kind() {
            ValueKind::Text => FieldValue::text(""),
            ValueKind::Flag => FieldValue::Flag(false),
            ValueKind::Attainment => FieldValue::Attainment(None),
            ValueKind::Selection => FieldValue::Selection(BTreeSet::new()),
            ValueKind::File => FieldValue::File(None),
        };
        broken.apply(field, blank).expect("shape matches");
        let errors = validate_step(field.step(), &broken);
        assert!(errors.contains_key(&field), "{field:?} should be required");
    }
}
