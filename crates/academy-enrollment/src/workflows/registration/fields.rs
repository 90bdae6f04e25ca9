use std::fmt;

use serde::{Deserialize, Serialize};

/// Ordered sections of the registration wizard.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    Personal,
    Contact,
    Education,
    Class,
    Course,
    Consent,
    Review,
}

impl Step {
    pub const ALL: [Step; 7] = [
        Step::Personal,
        Step::Contact,
        Step::Education,
        Step::Class,
        Step::Course,
        Step::Consent,
        Step::Review,
    ];

    pub const COUNT: usize = Self::ALL.len();

    pub const fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn next(self) -> Option<Self> {
        Self::from_index(self.index() + 1)
    }

    pub fn previous(self) -> Option<Self> {
        self.index().checked_sub(1).and_then(Self::from_index)
    }

    pub const fn is_terminal(self) -> bool {
        matches!(self, Step::Review)
    }

    pub const fn title(self) -> &'static str {
        match self {
            Step::Personal => "Personal Information",
            Step::Contact => "Contact & Address",
            Step::Education => "Educational Attainment",
            Step::Class => "Classification & Disability",
            Step::Course => "Course Selection",
            Step::Consent => "Consent & Uploads",
            Step::Review => "Review",
        }
    }

    /// Fields owned by this step. Server error routing is the reverse of this table.
    pub const fn fields(self) -> &'static [FieldName] {
        use FieldName::*;
        match self {
            Step::Personal => &[
                LastName,
                FirstName,
                MiddleName,
                ExtensionName,
                Sex,
                CivilStatus,
                Birthdate,
                Age,
                Nationality,
            ],
            Step::Contact => &[
                Email,
                ContactNumber,
                Street,
                Barangay,
                City,
                Province,
                Region,
                Facebook,
                GuardianName,
                GuardianContact,
                GuardianAddress,
            ],
            Step::Education => &[EducationalAttainment],
            Step::Class => &[
                Classifications,
                OtherClassificationDetails,
                DisabilityTypes,
                DisabilityCause,
            ],
            Step::Course => &[ProgramId, ScholarshipPackage],
            Step::Consent => &[Consent, Thumbmark, Picture],
            Step::Review => &[],
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}/{})", self.title(), self.index() + 1, Self::COUNT)
    }
}

/// Every input collected by the wizard, named as it travels on the wire.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum FieldName {
    LastName,
    FirstName,
    MiddleName,
    ExtensionName,
    Sex,
    CivilStatus,
    Birthdate,
    Age,
    Nationality,
    Email,
    ContactNumber,
    Street,
    Barangay,
    City,
    Province,
    Region,
    Facebook,
    GuardianName,
    GuardianContact,
    GuardianAddress,
    EducationalAttainment,
    Classifications,
    OtherClassificationDetails,
    DisabilityTypes,
    DisabilityCause,
    ProgramId,
    ScholarshipPackage,
    Consent,
    Thumbmark,
    Picture,
}

/// Control kinds understood by the field renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputKind {
    Text,
    Email,
    Number,
    Date,
    Select,
    Textarea,
    Radio,
    Checkbox,
    File,
}

/// Shape of the value a field stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueKind {
    Text,
    Flag,
    Attainment,
    Selection,
    File,
}

/// Where a choice control gets its options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionSource {
    Sex,
    CivilStatus,
    Attainment,
    Programs,
    Classifications,
    DisabilityTypes,
}

impl FieldName {
    pub const ALL: [FieldName; 30] = [
        FieldName::LastName,
        FieldName::FirstName,
        FieldName::MiddleName,
        FieldName::ExtensionName,
        FieldName::Sex,
        FieldName::CivilStatus,
        FieldName::Birthdate,
        FieldName::Age,
        FieldName::Nationality,
        FieldName::Email,
        FieldName::ContactNumber,
        FieldName::Street,
        FieldName::Barangay,
        FieldName::City,
        FieldName::Province,
        FieldName::Region,
        FieldName::Facebook,
        FieldName::GuardianName,
        FieldName::GuardianContact,
        FieldName::GuardianAddress,
        FieldName::EducationalAttainment,
        FieldName::Classifications,
        FieldName::OtherClassificationDetails,
        FieldName::DisabilityTypes,
        FieldName::DisabilityCause,
        FieldName::ProgramId,
        FieldName::ScholarshipPackage,
        FieldName::Consent,
        FieldName::Thumbmark,
        FieldName::Picture,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            FieldName::LastName => "last_name",
            FieldName::FirstName => "first_name",
            FieldName::MiddleName => "middle_name",
            FieldName::ExtensionName => "extension_name",
            FieldName::Sex => "sex",
            FieldName::CivilStatus => "civil_status",
            FieldName::Birthdate => "birthdate",
            FieldName::Age => "age",
            FieldName::Nationality => "nationality",
            FieldName::Email => "email",
            FieldName::ContactNumber => "contact_number",
            FieldName::Street => "street",
            FieldName::Barangay => "barangay",
            FieldName::City => "city",
            FieldName::Province => "province",
            FieldName::Region => "region",
            FieldName::Facebook => "facebook",
            FieldName::GuardianName => "guardian_name",
            FieldName::GuardianContact => "guardian_contact",
            FieldName::GuardianAddress => "guardian_address",
            FieldName::EducationalAttainment => "educational_attainment",
            FieldName::Classifications => "classifications",
            FieldName::OtherClassificationDetails => "other_classification_details",
            FieldName::DisabilityTypes => "disability_types",
            FieldName::DisabilityCause => "disability_cause",
            FieldName::ProgramId => "program_id",
            FieldName::ScholarshipPackage => "scholarship_package",
            FieldName::Consent => "consent",
            FieldName::Thumbmark => "thumbmark",
            FieldName::Picture => "picture",
        }
    }

    /// Resolve a wire key. Array-style keys such as `classifications.0` or
    /// `classifications[]` resolve to their base field.
    pub fn from_wire(key: &str) -> Option<Self> {
        let base = key
            .split(['.', '['])
            .next()
            .unwrap_or_default()
            .trim();
        Self::ALL.iter().copied().find(|field| field.as_str() == base)
    }

    pub const fn label(self) -> &'static str {
        match self {
            FieldName::LastName => "Last name",
            FieldName::FirstName => "First name",
            FieldName::MiddleName => "Middle name",
            FieldName::ExtensionName => "Name extension",
            FieldName::Sex => "Sex",
            FieldName::CivilStatus => "Civil status",
            FieldName::Birthdate => "Birthdate",
            FieldName::Age => "Age",
            FieldName::Nationality => "Nationality",
            FieldName::Email => "Email",
            FieldName::ContactNumber => "Contact number",
            FieldName::Street => "Number & street",
            FieldName::Barangay => "Barangay",
            FieldName::City => "City / municipality",
            FieldName::Province => "Province",
            FieldName::Region => "Region",
            FieldName::Facebook => "Facebook account",
            FieldName::GuardianName => "Parent / guardian name",
            FieldName::GuardianContact => "Parent / guardian contact",
            FieldName::GuardianAddress => "Parent / guardian address",
            FieldName::EducationalAttainment => "Highest educational attainment",
            FieldName::Classifications => "Learner classification",
            FieldName::OtherClassificationDetails => "Other classification",
            FieldName::DisabilityTypes => "Type of disability",
            FieldName::DisabilityCause => "Cause of disability",
            FieldName::ProgramId => "Program",
            FieldName::ScholarshipPackage => "Scholarship package",
            FieldName::Consent => "Privacy consent",
            FieldName::Thumbmark => "Thumbmark",
            FieldName::Picture => "Picture",
        }
    }

    pub const fn input_kind(self) -> InputKind {
        match self {
            FieldName::Email => InputKind::Email,
            FieldName::Age => InputKind::Number,
            FieldName::Birthdate => InputKind::Date,
            FieldName::CivilStatus | FieldName::ProgramId => InputKind::Select,
            FieldName::Street
            | FieldName::GuardianAddress
            | FieldName::OtherClassificationDetails
            | FieldName::DisabilityCause => InputKind::Textarea,
            FieldName::Sex | FieldName::EducationalAttainment => InputKind::Radio,
            FieldName::Classifications | FieldName::DisabilityTypes | FieldName::Consent => {
                InputKind::Checkbox
            }
            FieldName::Thumbmark | FieldName::Picture => InputKind::File,
            _ => InputKind::Text,
        }
    }

    pub const fn value_kind(self) -> ValueKind {
        match self {
            FieldName::Consent => ValueKind::Flag,
            FieldName::EducationalAttainment => ValueKind::Attainment,
            FieldName::Classifications | FieldName::DisabilityTypes => ValueKind::Selection,
            FieldName::Thumbmark | FieldName::Picture => ValueKind::File,
            _ => ValueKind::Text,
        }
    }

    pub const fn option_source(self) -> Option<OptionSource> {
        match self {
            FieldName::Sex => Some(OptionSource::Sex),
            FieldName::CivilStatus => Some(OptionSource::CivilStatus),
            FieldName::EducationalAttainment => Some(OptionSource::Attainment),
            FieldName::ProgramId => Some(OptionSource::Programs),
            FieldName::Classifications => Some(OptionSource::Classifications),
            FieldName::DisabilityTypes => Some(OptionSource::DisabilityTypes),
            _ => None,
        }
    }

    /// Presence rule. Conditional requirements live in the validation rules.
    pub const fn is_required(self) -> bool {
        !matches!(
            self,
            FieldName::MiddleName
                | FieldName::ExtensionName
                | FieldName::Facebook
                | FieldName::GuardianName
                | FieldName::GuardianContact
                | FieldName::GuardianAddress
                | FieldName::Classifications
                | FieldName::OtherClassificationDetails
                | FieldName::DisabilityTypes
                | FieldName::DisabilityCause
                | FieldName::ScholarshipPackage
        )
    }

    pub const fn is_numeric(self) -> bool {
        matches!(self, FieldName::Age | FieldName::ProgramId)
    }

    /// Derived from the birthdate; never edited directly.
    pub const fn is_derived(self) -> bool {
        matches!(self, FieldName::Age)
    }

    pub fn step(self) -> Step {
        Step::ALL
            .into_iter()
            .find(|step| step.fields().contains(&self))
            .unwrap_or(Step::Review)
    }
}

impl fmt::Display for FieldName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
