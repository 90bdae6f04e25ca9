//! Stateless presentation of wizard fields.
//!
//! A [`ControlView`] is everything a front end needs to draw one labeled control
//! and its inline error. [`interpret_change`] turns the raw event coming back from
//! that control into a typed [`FieldValue`].

use std::fmt;

use serde::Serialize;

use super::domain::{
    ApplicationForm, Attachment, EducationalAttainment, FieldInput, FieldValue, FormError,
    SelectionGroup, CIVIL_STATUS_OPTIONS, SEX_OPTIONS,
};
use super::fields::{FieldName, InputKind, OptionSource, ValueKind};
use super::reference::ReferenceCatalog;

/// One selectable option of a choice control.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OptionView {
    pub value: String,
    pub label: String,
    pub selected: bool,
}

/// Upload summary shown in place of the raw bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileSummary {
    pub file_name: String,
    pub content_type: String,
    pub size: usize,
}

impl From<&Attachment> for FileSummary {
    fn from(file: &Attachment) -> Self {
        Self {
            file_name: file.file_name.clone(),
            content_type: file.content_type.clone(),
            size: file.len(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum ControlValue {
    Text(String),
    Checked(bool),
    Choice(Option<String>),
    Selected(Vec<u32>),
    File(Option<FileSummary>),
}

/// Fully controlled view of a labeled input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ControlView {
    pub field: FieldName,
    pub label: &'static str,
    pub kind: InputKind,
    pub required: bool,
    pub read_only: bool,
    pub value: ControlValue,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<OptionView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Raw change emitted by a control.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawChange {
    Text(String),
    Checked(bool),
    Files(Vec<Attachment>),
}

pub fn render_control(
    field: FieldName,
    form: &ApplicationForm,
    catalog: &ReferenceCatalog,
    error: Option<&str>,
) -> ControlView {
    let value = match form.input(field) {
        FieldInput::Text(text) if field.option_source().is_some() => {
            let text = text.trim();
            ControlValue::Choice((!text.is_empty()).then(|| text.to_string()))
        }
        FieldInput::Text(text) => ControlValue::Text(text.to_string()),
        FieldInput::Flag(checked) => ControlValue::Checked(checked),
        FieldInput::Attainment(level) => {
            ControlValue::Choice(level.map(|level| level.key().to_string()))
        }
        FieldInput::Selection(ids) => ControlValue::Selected(ids.iter().copied().collect()),
        FieldInput::File(file) => ControlValue::File(file.map(FileSummary::from)),
    };

    ControlView {
        field,
        label: field.label(),
        kind: field.input_kind(),
        required: field.is_required(),
        read_only: field.is_derived(),
        options: options_for(field, form, catalog),
        value,
        error: error.map(str::to_string),
    }
}

fn options_for(
    field: FieldName,
    form: &ApplicationForm,
    catalog: &ReferenceCatalog,
) -> Vec<OptionView> {
    let Some(source) = field.option_source() else {
        return Vec::new();
    };

    let current = match form.input(field) {
        FieldInput::Text(text) => Some(text.trim().to_string()),
        FieldInput::Attainment(level) => level.map(|level| level.key().to_string()),
        _ => None,
    };
    let single = |value: String, label: String| OptionView {
        selected: current.as_deref() == Some(value.as_str()),
        value,
        label,
    };

    match source {
        OptionSource::Sex => SEX_OPTIONS
            .iter()
            .map(|option| single(option.to_string(), option.to_string()))
            .collect(),
        OptionSource::CivilStatus => CIVIL_STATUS_OPTIONS
            .iter()
            .map(|option| single(option.to_string(), option.to_string()))
            .collect(),
        OptionSource::Attainment => EducationalAttainment::ALL
            .iter()
            .map(|level| single(level.key().to_string(), level.label().to_string()))
            .collect(),
        OptionSource::Programs => catalog
            .programs
            .iter()
            .map(|program| single(program.id.to_string(), program.label.clone()))
            .collect(),
        OptionSource::Classifications => {
            group_options(form, catalog, SelectionGroup::Classifications)
        }
        OptionSource::DisabilityTypes => {
            group_options(form, catalog, SelectionGroup::DisabilityTypes)
        }
    }
}

fn group_options(
    form: &ApplicationForm,
    catalog: &ReferenceCatalog,
    group: SelectionGroup,
) -> Vec<OptionView> {
    let selected = form.selection(group);
    catalog
        .options(group)
        .iter()
        .map(|option| OptionView {
            value: option.id.to_string(),
            label: option.label.clone(),
            selected: selected.contains(&option.id),
        })
        .collect()
}

/// Convert a control event into the field's typed value. File inputs keep only
/// the first selected file; an empty selection clears the upload.
pub fn interpret_change(field: FieldName, change: RawChange) -> Result<FieldValue, FormError> {
    let expected = field.value_kind();
    match (expected, change) {
        (ValueKind::Text, RawChange::Text(text)) => Ok(FieldValue::Text(text)),
        (ValueKind::Flag, RawChange::Checked(checked)) => Ok(FieldValue::Flag(checked)),
        (ValueKind::Attainment, RawChange::Text(key)) if key.trim().is_empty() => {
            Ok(FieldValue::Attainment(None))
        }
        (ValueKind::Attainment, RawChange::Text(key)) => {
            Ok(FieldValue::Attainment(Some(key.parse()?)))
        }
        (ValueKind::File, RawChange::Files(files)) => {
            Ok(FieldValue::File(files.into_iter().next()))
        }
        (expected, change) => Err(FormError::ValueKind {
            field,
            expected,
            found: match change {
                RawChange::Text(_) => ValueKind::Text,
                RawChange::Checked(_) => ValueKind::Flag,
                RawChange::Files(_) => ValueKind::File,
            },
        }),
    }
}

impl fmt::Display for ControlView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let marker = if self.required { " *" } else { "" };
        let value = match &self.value {
            ControlValue::Text(text) | ControlValue::Choice(Some(text)) => {
                let label = self
                    .options
                    .iter()
                    .find(|option| option.selected)
                    .map(|option| option.label.as_str());
                label.unwrap_or(text).to_string()
            }
            ControlValue::Choice(None) | ControlValue::File(None) => "-".to_string(),
            ControlValue::Checked(checked) => (if *checked { "[x]" } else { "[ ]" }).to_string(),
            ControlValue::Selected(_) => {
                let labels: Vec<_> = self
                    .options
                    .iter()
                    .filter(|option| option.selected)
                    .map(|option| option.label.as_str())
                    .collect();
                if labels.is_empty() {
                    "-".to_string()
                } else {
                    labels.join(", ")
                }
            }
            ControlValue::File(Some(file)) => {
                format!("{} ({}, {} bytes)", file.file_name, file.content_type, file.size)
            }
        };

        write!(f, "{}{}: {}", self.label, marker, value)?;
        if let Some(error) = &self.error {
            write!(f, "\n    ! {error}")?;
        }
        Ok(())
    }
}
