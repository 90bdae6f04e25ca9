use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::domain::{ApplicationForm, Attachment, EducationalAttainment, FieldInput, FieldValue};
use super::fields::{FieldName, ValueKind};

/// Body of one multipart part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PartValue {
    Text(String),
    File(Attachment),
}

/// Named multipart part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormPart {
    pub name: String,
    pub value: PartValue,
}

impl FormPart {
    pub fn text(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: PartValue::Text(value.into()),
        }
    }

    pub fn file(name: impl Into<String>, attachment: Attachment) -> Self {
        Self {
            name: name.into(),
            value: PartValue::File(attachment),
        }
    }
}

/// A fully packaged registration, ready for the backend collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationRequest {
    pub endpoint: String,
    pub parts: Vec<FormPart>,
}

impl RegistrationRequest {
    /// Flatten the form into multipart parts: text fields by name, booleans as
    /// `true`/`false`, selections as repeated `name[]` parts, uploads as files.
    pub fn from_form(endpoint: impl Into<String>, form: &ApplicationForm) -> Self {
        let mut parts = Vec::new();
        for field in FieldName::ALL {
            let name = field.as_str();
            match form.input(field) {
                FieldInput::Text(value) => parts.push(FormPart::text(name, value.trim())),
                FieldInput::Flag(checked) => parts.push(FormPart::text(name, checked.to_string())),
                FieldInput::Attainment(level) => parts.push(FormPart::text(
                    name,
                    level.map(EducationalAttainment::key).unwrap_or_default(),
                )),
                FieldInput::Selection(ids) => parts.extend(
                    ids.iter()
                        .map(|id| FormPart::text(format!("{name}[]"), id.to_string())),
                ),
                FieldInput::File(Some(file)) => parts.push(FormPart::file(name, file.clone())),
                FieldInput::File(None) => {}
            }
        }

        Self {
            endpoint: endpoint.into(),
            parts,
        }
    }

    pub fn text_value(&self, name: &str) -> Option<&str> {
        self.parts.iter().find_map(|part| match &part.value {
            PartValue::Text(value) if part.name == name => Some(value.as_str()),
            _ => None,
        })
    }

    pub fn file_value(&self, name: &str) -> Option<&Attachment> {
        self.parts.iter().find_map(|part| match &part.value {
            PartValue::File(file) if part.name == name => Some(file),
            _ => None,
        })
    }
}

/// Rebuild a form from multipart parts. Malformed values are reported per
/// field key instead of aborting; unknown part names are ignored.
pub fn decode_parts(parts: Vec<FormPart>) -> (ApplicationForm, BTreeMap<String, String>) {
    let mut form = ApplicationForm::default();
    let mut errors = BTreeMap::new();

    for part in parts {
        let Some(field) = FieldName::from_wire(&part.name) else {
            continue;
        };

        match (field.value_kind(), part.value) {
            (ValueKind::File, PartValue::File(file)) => {
                let slot = if field == FieldName::Thumbmark {
                    &mut form.thumbmark
                } else {
                    &mut form.picture
                };
                *slot = (!file.is_empty()).then_some(file);
            }
            (ValueKind::File, PartValue::Text(_)) => {
                errors.insert(
                    field.as_str().to_string(),
                    format!("The {} must be a file.", field.label().to_lowercase()),
                );
            }
            (_, PartValue::File(_)) => {
                errors.insert(
                    field.as_str().to_string(),
                    format!("The {} must not be a file.", field.label().to_lowercase()),
                );
            }
            (ValueKind::Text, PartValue::Text(value)) => {
                // Kinds already match, so the write cannot fail.
                let _ = form.apply(field, FieldValue::Text(value));
            }
            (ValueKind::Flag, PartValue::Text(value)) => {
                match value.trim().to_ascii_lowercase().as_str() {
                    "true" | "1" | "on" | "yes" => form.consent = true,
                    "false" | "0" | "off" | "no" | "" => form.consent = false,
                    _ => {
                        errors.insert(
                            field.as_str().to_string(),
                            format!("The {} must be true or false.", field.label().to_lowercase()),
                        );
                    }
                }
            }
            (ValueKind::Attainment, PartValue::Text(value)) => {
                if value.trim().is_empty() {
                    form.educational_attainment = None;
                } else {
                    match value.parse::<EducationalAttainment>() {
                        Ok(level) => form.educational_attainment = Some(level),
                        Err(_) => {
                            errors.insert(
                                field.as_str().to_string(),
                                "The selected educational attainment is invalid.".to_string(),
                            );
                        }
                    }
                }
            }
            (ValueKind::Selection, PartValue::Text(value)) => match value.trim().parse::<u32>() {
                Ok(id) => {
                    let set = if field == FieldName::Classifications {
                        &mut form.classifications
                    } else {
                        &mut form.disability_types
                    };
                    set.insert(id);
                }
                Err(_) => {
                    errors.insert(
                        part.name.clone(),
                        format!("The selected {} is invalid.", field.label().to_lowercase()),
                    );
                }
            },
        }
    }

    (form, errors)
}

/// What the backend returns on acceptance.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationReceipt {
    #[serde(default)]
    pub learner_id: Option<String>,
}

/// Failure reported by a backend collaborator.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SubmissionError {
    #[error("registration rejected with {} field error(s)", .0.len())]
    Rejected(BTreeMap<String, String>),
    #[error("registration transport failed: {0}")]
    Transport(String),
}

/// The opaque service that persists and validates registrations.
pub trait RegistrationBackend: Send + Sync {
    fn register(
        &self,
        request: &RegistrationRequest,
    ) -> Result<RegistrationReceipt, SubmissionError>;
}

/// Parse a validation-failure body. Accepts `{"errors": {...}}` or a bare map;
/// values may be strings or arrays of strings.
pub fn parse_rejection_body(body: &[u8]) -> Option<BTreeMap<String, String>> {
    let value: Value = serde_json::from_slice(body).ok()?;
    let map = match value {
        Value::Object(mut map) => match map.remove("errors") {
            Some(Value::Object(errors)) => errors,
            Some(_) => return None,
            None => map,
        },
        _ => return None,
    };

    let errors: BTreeMap<String, String> = map
        .into_iter()
        .filter_map(|(key, value)| {
            let message = match value {
                Value::String(message) => message,
                Value::Array(messages) => messages
                    .iter()
                    .filter_map(Value::as_str)
                    .collect::<Vec<_>>()
                    .join(" "),
                _ => return None,
            };
            Some((key, message))
        })
        .collect();

    (!errors.is_empty()).then_some(errors)
}
