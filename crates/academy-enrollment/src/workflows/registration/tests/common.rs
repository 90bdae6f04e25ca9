use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::response::Response;
use chrono::NaiveDate;
use serde_json::Value;

use crate::workflows::registration::domain::{
    ApplicationForm, Attachment, EducationalAttainment, FieldValue, SelectionGroup,
};
use crate::workflows::registration::fields::FieldName;
use crate::workflows::registration::intake::{
    LearnerId, LearnerRecord, LearnerRepository, RegistrationService, RepositoryError,
};
use crate::workflows::registration::links::RouteTable;
use crate::workflows::registration::reference::{ReferenceCatalog, ReferenceOption};
use crate::workflows::registration::submission::{
    FormPart, PartValue, RegistrationBackend, RegistrationReceipt, RegistrationRequest,
    SubmissionError,
};
use crate::workflows::registration::wizard::RegistrationWizard;

pub(super) const BOUNDARY: &str = "academy-form-boundary";

pub(super) fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 6, 15).expect("valid date")
}

pub(super) fn catalog() -> Arc<ReferenceCatalog> {
    Arc::new(ReferenceCatalog::standard().with_programs(vec![
        ReferenceOption::new(3, "Bread and Pastry Production NC II"),
        ReferenceOption::new(7, "Electrical Installation and Maintenance NC II"),
    ]))
}

pub(super) fn wizard() -> RegistrationWizard {
    RegistrationWizard::new(catalog(), RouteTable::standard("http://academy.test"), today())
}

pub(super) fn png(name: &str) -> Attachment {
    Attachment::new(name, "image/png", vec![0x89, b'P', b'N', b'G', 1, 2, 3])
}

pub(super) fn set_text(wizard: &mut RegistrationWizard, field: FieldName, value: &str) {
    wizard
        .set_field(field, FieldValue::text(value))
        .expect("text field accepts text");
}

pub(super) fn fill_personal(wizard: &mut RegistrationWizard) {
    set_text(wizard, FieldName::LastName, "Dela Cruz");
    set_text(wizard, FieldName::FirstName, "Maria");
    set_text(wizard, FieldName::MiddleName, "Santos");
    set_text(wizard, FieldName::Sex, "Female");
    set_text(wizard, FieldName::CivilStatus, "Single");
    set_text(wizard, FieldName::Birthdate, "2000-03-04");
    set_text(wizard, FieldName::Nationality, "Filipino");
}

pub(super) fn fill_contact(wizard: &mut RegistrationWizard) {
    set_text(wizard, FieldName::Email, "maria.delacruz@example.com");
    set_text(wizard, FieldName::ContactNumber, "09171234567");
    set_text(wizard, FieldName::Street, "12 Mabini St.");
    set_text(wizard, FieldName::Barangay, "San Isidro");
    set_text(wizard, FieldName::City, "Tarlac City");
    set_text(wizard, FieldName::Province, "Tarlac");
    set_text(wizard, FieldName::Region, "Region III");
}

pub(super) fn fill_education(wizard: &mut RegistrationWizard) {
    wizard.set_educational_attainment(EducationalAttainment::SeniorHighSchool);
}

pub(super) fn fill_course(wizard: &mut RegistrationWizard) {
    set_text(wizard, FieldName::ProgramId, "3");
}

pub(super) fn fill_consent(wizard: &mut RegistrationWizard) {
    wizard
        .set_field(FieldName::Consent, FieldValue::Flag(true))
        .expect("consent accepts a flag");
    wizard
        .set_field(FieldName::Thumbmark, FieldValue::File(Some(png("thumb.png"))))
        .expect("thumbmark accepts a file");
    wizard
        .set_field(FieldName::Picture, FieldValue::File(Some(png("photo.png"))))
        .expect("picture accepts a file");
}

/// Wizard with every required field filled, still on the first step.
pub(super) fn filled_wizard() -> RegistrationWizard {
    let mut wizard = wizard();
    fill_personal(&mut wizard);
    fill_contact(&mut wizard);
    fill_education(&mut wizard);
    fill_course(&mut wizard);
    fill_consent(&mut wizard);
    wizard
}

/// Walk a filled wizard all the way to the review step.
pub(super) fn wizard_on_review() -> RegistrationWizard {
    let mut wizard = filled_wizard();
    while !wizard.step().is_terminal() {
        assert!(wizard.advance().is_moved(), "step {:?} should pass", wizard.step());
    }
    wizard
}

pub(super) fn complete_form() -> ApplicationForm {
    filled_wizard().form().clone()
}

pub(super) fn complete_parts() -> Vec<FormPart> {
    RegistrationRequest::from_form("/api/v1/learners/register", &complete_form()).parts
}

pub(super) fn with_selection(
    mut parts: Vec<FormPart>,
    group: SelectionGroup,
    id: u32,
) -> Vec<FormPart> {
    parts.push(FormPart::text(
        format!("{}[]", group.field().as_str()),
        id.to_string(),
    ));
    parts
}

pub(super) fn replace_text(mut parts: Vec<FormPart>, name: &str, value: &str) -> Vec<FormPart> {
    for part in parts.iter_mut().filter(|part| part.name == name) {
        part.value = PartValue::Text(value.to_string());
    }
    parts
}

pub(super) fn build_service() -> (RegistrationService<MemoryLearners>, Arc<MemoryLearners>) {
    let repository = Arc::new(MemoryLearners::default());
    let service = RegistrationService::new(repository.clone(), catalog()).with_today(today());
    (service, repository)
}

#[derive(Default, Clone)]
pub(super) struct MemoryLearners {
    pub(super) records: Arc<Mutex<HashMap<LearnerId, LearnerRecord>>>,
}

impl MemoryLearners {
    pub(super) fn len(&self) -> usize {
        self.records.lock().expect("repository mutex poisoned").len()
    }
}

impl LearnerRepository for MemoryLearners {
    fn insert(&self, record: LearnerRecord) -> Result<LearnerRecord, RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        if guard.contains_key(&record.learner_id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(record.learner_id.clone(), record.clone());
        Ok(record)
    }

    fn fetch(&self, id: &LearnerId) -> Result<Option<LearnerRecord>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn find_by_email(&self, email: &str) -> Result<Option<LearnerRecord>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard
            .values()
            .find(|record| record.profile.email.eq_ignore_ascii_case(email))
            .cloned())
    }
}

pub(super) struct ConflictLearners;

impl LearnerRepository for ConflictLearners {
    fn insert(&self, _record: LearnerRecord) -> Result<LearnerRecord, RepositoryError> {
        Err(RepositoryError::Conflict)
    }

    fn fetch(&self, _id: &LearnerId) -> Result<Option<LearnerRecord>, RepositoryError> {
        Ok(None)
    }

    fn find_by_email(&self, _email: &str) -> Result<Option<LearnerRecord>, RepositoryError> {
        Ok(None)
    }
}

pub(super) struct UnavailableLearners;

impl LearnerRepository for UnavailableLearners {
    fn insert(&self, _record: LearnerRecord) -> Result<LearnerRecord, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn fetch(&self, _id: &LearnerId) -> Result<Option<LearnerRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn find_by_email(&self, _email: &str) -> Result<Option<LearnerRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

/// Backend double that records requests and replays a canned answer.
pub(super) struct ScriptedBackend {
    answer: Result<RegistrationReceipt, SubmissionError>,
    pub(super) requests: Mutex<Vec<RegistrationRequest>>,
}

impl ScriptedBackend {
    pub(super) fn accepting(learner_id: &str) -> Self {
        Self::answering(Ok(RegistrationReceipt {
            learner_id: Some(learner_id.to_string()),
        }))
    }

    pub(super) fn answering(answer: Result<RegistrationReceipt, SubmissionError>) -> Self {
        Self {
            answer,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub(super) fn calls(&self) -> usize {
        self.requests.lock().expect("backend mutex poisoned").len()
    }
}

impl RegistrationBackend for ScriptedBackend {
    fn register(
        &self,
        request: &RegistrationRequest,
    ) -> Result<RegistrationReceipt, SubmissionError> {
        self.requests
            .lock()
            .expect("backend mutex poisoned")
            .push(request.clone());
        self.answer.clone()
    }
}

/// Encode parts as a `multipart/form-data` body.
pub(super) fn multipart_body(parts: &[FormPart]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        match &part.value {
            PartValue::Text(value) => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{}\"\r\n\r\n",
                        part.name
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(value.as_bytes());
            }
            PartValue::File(file) => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                        part.name, file.file_name, file.content_type
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(&file.bytes);
            }
        }
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
