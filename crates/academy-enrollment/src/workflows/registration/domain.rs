use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use super::fields::{FieldName, ValueKind};

pub const DATE_FORMAT: &str = "%Y-%m-%d";

pub const SEX_OPTIONS: [&str; 2] = ["Male", "Female"];

pub const CIVIL_STATUS_OPTIONS: [&str; 5] = [
    "Single",
    "Married",
    "Separated/Divorced/Annulled",
    "Widow/er",
    "Common Law/Live-in",
];

/// Highest educational attainment; exactly one level can be chosen.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum EducationalAttainment {
    NoGradeCompleted,
    ElementaryUndergraduate,
    ElementaryGraduate,
    HighSchoolUndergraduate,
    HighSchoolGraduate,
    JuniorHighSchool,
    SeniorHighSchool,
    PostSecondaryUndergraduate,
    PostSecondaryGraduate,
    CollegeUndergraduate,
    CollegeGraduate,
    Masteral,
    Doctorate,
}

impl EducationalAttainment {
    pub const ALL: [EducationalAttainment; 13] = [
        EducationalAttainment::NoGradeCompleted,
        EducationalAttainment::ElementaryUndergraduate,
        EducationalAttainment::ElementaryGraduate,
        EducationalAttainment::HighSchoolUndergraduate,
        EducationalAttainment::HighSchoolGraduate,
        EducationalAttainment::JuniorHighSchool,
        EducationalAttainment::SeniorHighSchool,
        EducationalAttainment::PostSecondaryUndergraduate,
        EducationalAttainment::PostSecondaryGraduate,
        EducationalAttainment::CollegeUndergraduate,
        EducationalAttainment::CollegeGraduate,
        EducationalAttainment::Masteral,
        EducationalAttainment::Doctorate,
    ];

    pub const fn key(self) -> &'static str {
        match self {
            EducationalAttainment::NoGradeCompleted => "no_grade_completed",
            EducationalAttainment::ElementaryUndergraduate => "elementary_undergraduate",
            EducationalAttainment::ElementaryGraduate => "elementary_graduate",
            EducationalAttainment::HighSchoolUndergraduate => "high_school_undergraduate",
            EducationalAttainment::HighSchoolGraduate => "high_school_graduate",
            EducationalAttainment::JuniorHighSchool => "junior_high_school",
            EducationalAttainment::SeniorHighSchool => "senior_high_school",
            EducationalAttainment::PostSecondaryUndergraduate => "post_secondary_undergraduate",
            EducationalAttainment::PostSecondaryGraduate => "post_secondary_graduate",
            EducationalAttainment::CollegeUndergraduate => "college_undergraduate",
            EducationalAttainment::CollegeGraduate => "college_graduate",
            EducationalAttainment::Masteral => "masteral",
            EducationalAttainment::Doctorate => "doctorate",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            EducationalAttainment::NoGradeCompleted => "No Grade Completed",
            EducationalAttainment::ElementaryUndergraduate => "Elementary Undergraduate",
            EducationalAttainment::ElementaryGraduate => "Elementary Graduate",
            EducationalAttainment::HighSchoolUndergraduate => "High School Undergraduate",
            EducationalAttainment::HighSchoolGraduate => "High School Graduate",
            EducationalAttainment::JuniorHighSchool => "Junior High (K-12)",
            EducationalAttainment::SeniorHighSchool => "Senior High (K-12)",
            EducationalAttainment::PostSecondaryUndergraduate => {
                "Post-Secondary Non-Tertiary/Technical Vocational Undergraduate"
            }
            EducationalAttainment::PostSecondaryGraduate => {
                "Post-Secondary Non-Tertiary/Technical Vocational Graduate"
            }
            EducationalAttainment::CollegeUndergraduate => "College Undergraduate",
            EducationalAttainment::CollegeGraduate => "College Graduate",
            EducationalAttainment::Masteral => "Masteral",
            EducationalAttainment::Doctorate => "Doctorate",
        }
    }
}

impl FromStr for EducationalAttainment {
    type Err = FormError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let key = value.trim();
        Self::ALL
            .into_iter()
            .find(|level| level.key() == key)
            .ok_or_else(|| FormError::UnknownAttainment(key.to_string()))
    }
}

/// Binary upload attached to the form.
#[derive(Clone, PartialEq, Eq)]
pub struct Attachment {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl Attachment {
    pub fn new(
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        bytes: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.into(),
            bytes: bytes.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn is_image(&self) -> bool {
        self.content_type
            .parse::<mime::Mime>()
            .map(|parsed| parsed.type_() == mime::IMAGE)
            .unwrap_or(false)
    }
}

impl fmt::Debug for Attachment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Attachment")
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// Multi-select groups on the classification step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionGroup {
    Classifications,
    DisabilityTypes,
}

impl SelectionGroup {
    pub const fn for_field(field: FieldName) -> Option<Self> {
        match field {
            FieldName::Classifications => Some(SelectionGroup::Classifications),
            FieldName::DisabilityTypes => Some(SelectionGroup::DisabilityTypes),
            _ => None,
        }
    }

    pub const fn field(self) -> FieldName {
        match self {
            SelectionGroup::Classifications => FieldName::Classifications,
            SelectionGroup::DisabilityTypes => FieldName::DisabilityTypes,
        }
    }

    /// Free-text field whose requirement depends on this group.
    pub const fn dependent(self) -> FieldName {
        match self {
            SelectionGroup::Classifications => FieldName::OtherClassificationDetails,
            SelectionGroup::DisabilityTypes => FieldName::DisabilityCause,
        }
    }
}

/// Owned value written into a field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Text(String),
    Flag(bool),
    Attainment(Option<EducationalAttainment>),
    Selection(BTreeSet<u32>),
    File(Option<Attachment>),
}

impl FieldValue {
    pub fn text(value: impl Into<String>) -> Self {
        FieldValue::Text(value.into())
    }

    pub const fn kind(&self) -> ValueKind {
        match self {
            FieldValue::Text(_) => ValueKind::Text,
            FieldValue::Flag(_) => ValueKind::Flag,
            FieldValue::Attainment(_) => ValueKind::Attainment,
            FieldValue::Selection(_) => ValueKind::Selection,
            FieldValue::File(_) => ValueKind::File,
        }
    }

    pub fn as_input(&self) -> FieldInput<'_> {
        match self {
            FieldValue::Text(value) => FieldInput::Text(value),
            FieldValue::Flag(value) => FieldInput::Flag(*value),
            FieldValue::Attainment(value) => FieldInput::Attainment(*value),
            FieldValue::Selection(value) => FieldInput::Selection(value),
            FieldValue::File(value) => FieldInput::File(value.as_ref()),
        }
    }
}

/// Borrowed view of a field value so rules can run without cloning uploads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldInput<'a> {
    Text(&'a str),
    Flag(bool),
    Attainment(Option<EducationalAttainment>),
    Selection(&'a BTreeSet<u32>),
    File(Option<&'a Attachment>),
}

/// Programming errors raised when a caller writes the wrong shape of value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FormError {
    #[error("field {field} expects a {expected:?} value, got {found:?}")]
    ValueKind {
        field: FieldName,
        expected: ValueKind,
        found: ValueKind,
    },
    #[error("field {0} is derived and cannot be edited")]
    DerivedField(FieldName),
    #[error("unknown educational attainment '{0}'")]
    UnknownAttainment(String),
    #[error("option {id} is not offered for {group:?}")]
    UnknownOption { group: SelectionGroup, id: u32 },
    #[error("step index {0} is out of range")]
    StepOutOfRange(usize),
}

/// The learner's enrollment application as edited by the wizard.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplicationForm {
    pub last_name: String,
    pub first_name: String,
    pub middle_name: String,
    pub extension_name: String,
    pub sex: String,
    pub civil_status: String,
    pub birthdate: String,
    pub age: String,
    pub nationality: String,
    pub email: String,
    pub contact_number: String,
    pub street: String,
    pub barangay: String,
    pub city: String,
    pub province: String,
    pub region: String,
    pub facebook: String,
    pub guardian_name: String,
    pub guardian_contact: String,
    pub guardian_address: String,
    pub educational_attainment: Option<EducationalAttainment>,
    pub classifications: BTreeSet<u32>,
    pub other_classification_details: String,
    pub disability_types: BTreeSet<u32>,
    pub disability_cause: String,
    pub program_id: String,
    pub scholarship_package: String,
    pub consent: bool,
    pub thumbmark: Option<Attachment>,
    pub picture: Option<Attachment>,
}

impl ApplicationForm {
    fn text_slot(&self, field: FieldName) -> Option<&String> {
        let slot = match field {
            FieldName::LastName => &self.last_name,
            FieldName::FirstName => &self.first_name,
            FieldName::MiddleName => &self.middle_name,
            FieldName::ExtensionName => &self.extension_name,
            FieldName::Sex => &self.sex,
            FieldName::CivilStatus => &self.civil_status,
            FieldName::Birthdate => &self.birthdate,
            FieldName::Age => &self.age,
            FieldName::Nationality => &self.nationality,
            FieldName::Email => &self.email,
            FieldName::ContactNumber => &self.contact_number,
            FieldName::Street => &self.street,
            FieldName::Barangay => &self.barangay,
            FieldName::City => &self.city,
            FieldName::Province => &self.province,
            FieldName::Region => &self.region,
            FieldName::Facebook => &self.facebook,
            FieldName::GuardianName => &self.guardian_name,
            FieldName::GuardianContact => &self.guardian_contact,
            FieldName::GuardianAddress => &self.guardian_address,
            FieldName::OtherClassificationDetails => &self.other_classification_details,
            FieldName::DisabilityCause => &self.disability_cause,
            FieldName::ProgramId => &self.program_id,
            FieldName::ScholarshipPackage => &self.scholarship_package,
            _ => return None,
        };
        Some(slot)
    }

    fn text_slot_mut(&mut self, field: FieldName) -> Option<&mut String> {
        let slot = match field {
            FieldName::LastName => &mut self.last_name,
            FieldName::FirstName => &mut self.first_name,
            FieldName::MiddleName => &mut self.middle_name,
            FieldName::ExtensionName => &mut self.extension_name,
            FieldName::Sex => &mut self.sex,
            FieldName::CivilStatus => &mut self.civil_status,
            FieldName::Birthdate => &mut self.birthdate,
            FieldName::Age => &mut self.age,
            FieldName::Nationality => &mut self.nationality,
            FieldName::Email => &mut self.email,
            FieldName::ContactNumber => &mut self.contact_number,
            FieldName::Street => &mut self.street,
            FieldName::Barangay => &mut self.barangay,
            FieldName::City => &mut self.city,
            FieldName::Province => &mut self.province,
            FieldName::Region => &mut self.region,
            FieldName::Facebook => &mut self.facebook,
            FieldName::GuardianName => &mut self.guardian_name,
            FieldName::GuardianContact => &mut self.guardian_contact,
            FieldName::GuardianAddress => &mut self.guardian_address,
            FieldName::OtherClassificationDetails => &mut self.other_classification_details,
            FieldName::DisabilityCause => &mut self.disability_cause,
            FieldName::ProgramId => &mut self.program_id,
            FieldName::ScholarshipPackage => &mut self.scholarship_package,
            _ => return None,
        };
        Some(slot)
    }

    /// Borrow the current value of a field.
    pub fn input(&self, field: FieldName) -> FieldInput<'_> {
        match field {
            FieldName::Consent => FieldInput::Flag(self.consent),
            FieldName::EducationalAttainment => {
                FieldInput::Attainment(self.educational_attainment)
            }
            FieldName::Classifications => FieldInput::Selection(&self.classifications),
            FieldName::DisabilityTypes => FieldInput::Selection(&self.disability_types),
            FieldName::Thumbmark => FieldInput::File(self.thumbmark.as_ref()),
            FieldName::Picture => FieldInput::File(self.picture.as_ref()),
            other => FieldInput::Text(self.text_slot(other).map(String::as_str).unwrap_or("")),
        }
    }

    /// Write a value, rejecting values whose shape does not match the field.
    pub fn apply(&mut self, field: FieldName, value: FieldValue) -> Result<(), FormError> {
        let expected = field.value_kind();
        let found = value.kind();
        if expected != found {
            return Err(FormError::ValueKind {
                field,
                expected,
                found,
            });
        }

        match (field, value) {
            (FieldName::Consent, FieldValue::Flag(checked)) => self.consent = checked,
            (FieldName::EducationalAttainment, FieldValue::Attainment(level)) => {
                self.educational_attainment = level
            }
            (FieldName::Classifications, FieldValue::Selection(ids)) => self.classifications = ids,
            (FieldName::DisabilityTypes, FieldValue::Selection(ids)) => {
                self.disability_types = ids
            }
            (FieldName::Thumbmark, FieldValue::File(file)) => self.thumbmark = file,
            (FieldName::Picture, FieldValue::File(file)) => self.picture = file,
            (field, FieldValue::Text(text)) => {
                if let Some(slot) = self.text_slot_mut(field) {
                    *slot = text;
                }
            }
            _ => {}
        }
        Ok(())
    }

    pub fn selection(&self, group: SelectionGroup) -> &BTreeSet<u32> {
        match group {
            SelectionGroup::Classifications => &self.classifications,
            SelectionGroup::DisabilityTypes => &self.disability_types,
        }
    }

    /// Add `id` when absent, remove it when present. Returns whether it is now selected.
    pub fn toggle(&mut self, group: SelectionGroup, id: u32) -> bool {
        let set = match group {
            SelectionGroup::Classifications => &mut self.classifications,
            SelectionGroup::DisabilityTypes => &mut self.disability_types,
        };
        if set.remove(&id) {
            false
        } else {
            set.insert(id);
            true
        }
    }

    pub fn parsed_birthdate(&self) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(self.birthdate.trim(), DATE_FORMAT).ok()
    }

    pub fn full_name(&self) -> String {
        [
            self.first_name.trim(),
            self.middle_name.trim(),
            self.last_name.trim(),
            self.extension_name.trim(),
        ]
        .into_iter()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
    }
}

/// Completed years between `birthdate` and `today`; `None` for future dates.
pub fn age_on(birthdate: NaiveDate, today: NaiveDate) -> Option<u32> {
    if birthdate > today {
        return None;
    }
    let mut years = today.year() - birthdate.year();
    if (today.month(), today.day()) < (birthdate.month(), birthdate.day()) {
        years -= 1;
    }
    u32::try_from(years).ok()
}
