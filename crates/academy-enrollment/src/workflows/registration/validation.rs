use std::collections::BTreeMap;

use chrono::NaiveDate;

use super::domain::{ApplicationForm, FieldInput, FieldValue, DATE_FORMAT};
use super::fields::{FieldName, Step};
use super::reference::{ReferenceCatalog, OTHER_CLASSIFICATION_ID};

/// Client-side error messages keyed by field.
pub type FieldErrors = BTreeMap<FieldName, String>;

/// Rule set applied by the wizard: which classification counts as "other",
/// and optionally the date birthdates are checked against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidationRules {
    other_classification_id: u32,
    today: Option<NaiveDate>,
}

impl Default for ValidationRules {
    fn default() -> Self {
        Self {
            other_classification_id: OTHER_CLASSIFICATION_ID,
            today: None,
        }
    }
}

impl From<&ReferenceCatalog> for ValidationRules {
    fn from(catalog: &ReferenceCatalog) -> Self {
        Self {
            other_classification_id: catalog.other_classification_id,
            today: None,
        }
    }
}

impl ValidationRules {
    /// Reject birthdates later than `today`.
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    pub fn other_classification_id(&self) -> u32 {
        self.other_classification_id
    }

    fn born_in_the_future(&self, form: &ApplicationForm) -> bool {
        match (self.today, form.parsed_birthdate()) {
            (Some(today), Some(birthdate)) => birthdate > today,
            _ => false,
        }
    }

    /// Error for one field, taking the rest of the form into account for
    /// conditional requirements.
    pub fn field_error(&self, field: FieldName, form: &ApplicationForm) -> Option<String> {
        if let Some(message) = check_input(field, form.input(field)) {
            return Some(message);
        }

        match field {
            FieldName::Birthdate if self.born_in_the_future(form) => {
                Some("The birthdate must not be in the future.".to_string())
            }
            FieldName::OtherClassificationDetails
                if form
                    .classifications
                    .contains(&self.other_classification_id)
                    && is_blank(&form.other_classification_details) =>
            {
                Some("Please specify your other classification.".to_string())
            }
            FieldName::DisabilityCause
                if !form.disability_types.is_empty() && is_blank(&form.disability_cause) =>
            {
                Some("Please state the cause of your disability.".to_string())
            }
            _ => None,
        }
    }

    /// Every error on `step`, not just the first.
    pub fn validate_step(&self, step: Step, form: &ApplicationForm) -> FieldErrors {
        step.fields()
            .iter()
            .filter_map(|&field| self.field_error(field, form).map(|message| (field, message)))
            .collect()
    }

    /// Earliest step with at least one error, along with that step's errors.
    pub fn first_invalid_step(&self, form: &ApplicationForm) -> Option<(Step, FieldErrors)> {
        Step::ALL.into_iter().find_map(|step| {
            let errors = self.validate_step(step, form);
            (!errors.is_empty()).then_some((step, errors))
        })
    }
}

/// Keystroke-level check of a single value in isolation.
pub fn validate_field(field: FieldName, value: &FieldValue) -> Option<String> {
    check_input(field, value.as_input())
}

/// Step check with the standard rule set.
pub fn validate_step(step: Step, form: &ApplicationForm) -> FieldErrors {
    ValidationRules::default().validate_step(step, form)
}

pub fn required_message(field: FieldName) -> String {
    match field {
        FieldName::EducationalAttainment => {
            "Please select your highest educational attainment.".to_string()
        }
        FieldName::Consent => "You must agree to the data privacy consent.".to_string(),
        FieldName::Thumbmark | FieldName::Picture => {
            format!("Please upload your {}.", field.label().to_lowercase())
        }
        _ => format!("The {} field is required.", field.label().to_lowercase()),
    }
}

fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

fn check_input(field: FieldName, input: FieldInput<'_>) -> Option<String> {
    match input {
        FieldInput::Text(raw) => {
            let value = raw.trim();
            if value.is_empty() {
                return field.is_required().then(|| required_message(field));
            }
            if field.is_numeric() && value.parse::<u32>().is_err() {
                return Some(format!(
                    "The {} must be a number.",
                    field.label().to_lowercase()
                ));
            }
            if field == FieldName::Birthdate
                && NaiveDate::parse_from_str(value, DATE_FORMAT).is_err()
            {
                return Some("The birthdate must be a valid date (YYYY-MM-DD).".to_string());
            }
            None
        }
        FieldInput::Flag(checked) => {
            (field.is_required() && !checked).then(|| required_message(field))
        }
        FieldInput::Attainment(level) => {
            (field.is_required() && level.is_none()).then(|| required_message(field))
        }
        FieldInput::Selection(_) => None,
        FieldInput::File(file) => {
            (field.is_required() && file.is_none()).then(|| required_message(field))
        }
    }
}
