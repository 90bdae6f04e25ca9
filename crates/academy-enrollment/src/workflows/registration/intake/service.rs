use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{Local, NaiveDate, Utc};
use tracing::{info, warn};

use super::repository::{
    EnrollmentStatus, LearnerId, LearnerProfile, LearnerRecord, LearnerRepository,
    RepositoryError,
};
use crate::workflows::registration::domain::{ApplicationForm, SelectionGroup};
use crate::workflows::registration::fields::{FieldName, Step};
use crate::workflows::registration::reference::ReferenceCatalog;
use crate::workflows::registration::renderer::FileSummary;
use crate::workflows::registration::submission::{
    decode_parts, FormPart, RegistrationBackend, RegistrationReceipt, RegistrationRequest,
    SubmissionError,
};
use crate::workflows::registration::validation::ValidationRules;

pub const EMAIL_TAKEN: &str = "The email has already been taken.";

/// Server-side half of the registration contract: validates a multipart
/// submission and stores the learner.
pub struct RegistrationService<R> {
    repository: Arc<R>,
    catalog: Arc<ReferenceCatalog>,
    rules: ValidationRules,
    today: Option<NaiveDate>,
}

static LEARNER_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_learner_id() -> LearnerId {
    let id = LEARNER_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    LearnerId(format!("lrn-{id:06}"))
}

impl<R> RegistrationService<R>
where
    R: LearnerRepository + 'static,
{
    pub fn new(repository: Arc<R>, catalog: Arc<ReferenceCatalog>) -> Self {
        let rules = ValidationRules::from(catalog.as_ref());
        Self {
            repository,
            catalog,
            rules,
            today: None,
        }
    }

    /// Pin the date used for birthdate checks.
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    pub fn catalog(&self) -> &ReferenceCatalog {
        &self.catalog
    }

    fn today(&self) -> NaiveDate {
        self.today.unwrap_or_else(|| Local::now().date_naive())
    }

    /// Validate and store a registration.
    pub fn register_learner(
        &self,
        parts: Vec<FormPart>,
    ) -> Result<LearnerRecord, RegistrationServiceError> {
        let (form, mut errors) = decode_parts(parts);

        for step in Step::ALL {
            for (field, message) in self.rules.validate_step(step, &form) {
                errors.entry(field.as_str().to_string()).or_insert(message);
            }
        }
        for (field, message) in self.server_rules(&form) {
            errors.entry(field.as_str().to_string()).or_insert(message);
        }

        let email = form.email.trim().to_ascii_lowercase();
        if !errors.contains_key(FieldName::Email.as_str())
            && self.repository.find_by_email(&email)?.is_some()
        {
            errors.extend(email_taken());
        }

        if !errors.is_empty() {
            warn!(errors = errors.len(), "registration failed validation");
            return Err(RegistrationServiceError::Validation(errors));
        }

        let record = self.record_from(form, email)?;
        let stored = self.repository.insert(record).map_err(|err| match err {
            // Lost a race with another registration for the same address.
            RepositoryError::Conflict => {
                warn!("registration conflicted on insert");
                RegistrationServiceError::Validation(email_taken())
            }
            other => other.into(),
        })?;
        info!(learner_id = %stored.learner_id.0, "learner registered");
        Ok(stored)
    }

    pub fn get(&self, learner_id: &LearnerId) -> Result<LearnerRecord, RegistrationServiceError> {
        let record = self
            .repository
            .fetch(learner_id)?
            .ok_or(RepositoryError::NotFound)?;
        Ok(record)
    }

    fn server_rules(&self, form: &ApplicationForm) -> Vec<(FieldName, String)> {
        let mut errors = Vec::new();

        let email = form.email.trim();
        if !email.is_empty() && !looks_like_email(email) {
            errors.push((
                FieldName::Email,
                "The email must be a valid email address.".to_string(),
            ));
        }

        if let Some(birthdate) = form.parsed_birthdate() {
            if birthdate >= self.today() {
                errors.push((
                    FieldName::Birthdate,
                    "The birthdate must be a date before today.".to_string(),
                ));
            }
        }

        if let Ok(program_id) = form.program_id.trim().parse::<u32>() {
            if self.catalog.program(program_id).is_none() {
                errors.push((
                    FieldName::ProgramId,
                    "The selected program is invalid.".to_string(),
                ));
            }
        }

        for group in [SelectionGroup::Classifications, SelectionGroup::DisabilityTypes] {
            if form
                .selection(group)
                .iter()
                .any(|id| !self.catalog.offers(group, *id))
            {
                let field = group.field();
                errors.push((
                    field,
                    format!("The selected {} is invalid.", field.label().to_lowercase()),
                ));
            }
        }

        for (field, file) in [
            (FieldName::Thumbmark, form.thumbmark.as_ref()),
            (FieldName::Picture, form.picture.as_ref()),
        ] {
            if file.is_some_and(|file| !file.is_image()) {
                errors.push((
                    field,
                    format!("The {} must be an image.", field.label().to_lowercase()),
                ));
            }
        }

        errors
    }

    fn record_from(
        &self,
        form: ApplicationForm,
        email: String,
    ) -> Result<LearnerRecord, RegistrationServiceError> {
        let program_id = form.program_id.trim().parse::<u32>().map_err(|_| {
            RegistrationServiceError::Validation(BTreeMap::from([(
                FieldName::ProgramId.as_str().to_string(),
                "The program must be a number.".to_string(),
            )]))
        })?;
        let scholarship = form.scholarship_package.trim();

        let uploads = [form.thumbmark.as_ref(), form.picture.as_ref()]
            .into_iter()
            .flatten()
            .map(FileSummary::from)
            .collect();

        Ok(LearnerRecord {
            learner_id: next_learner_id(),
            status: EnrollmentStatus::Pending,
            submitted_at: Utc::now(),
            profile: LearnerProfile {
                full_name: form.full_name(),
                email,
                birthdate: form.birthdate.trim().to_string(),
                contact_number: form.contact_number.trim().to_string(),
                program_id,
                scholarship_package: (!scholarship.is_empty()).then(|| scholarship.to_string()),
                educational_attainment: form.educational_attainment,
                classifications: form.classifications,
                disability_types: form.disability_types,
            },
            uploads,
        })
    }
}

fn email_taken() -> BTreeMap<String, String> {
    BTreeMap::from([(FieldName::Email.as_str().to_string(), EMAIL_TAKEN.to_string())])
}

fn looks_like_email(value: &str) -> bool {
    let mut pieces = value.splitn(2, '@');
    let (Some(local), Some(domain)) = (pieces.next(), pieces.next()) else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !value.chars().any(char::is_whitespace)
}

impl<R> RegistrationBackend for RegistrationService<R>
where
    R: LearnerRepository + 'static,
{
    fn register(
        &self,
        request: &RegistrationRequest,
    ) -> Result<RegistrationReceipt, SubmissionError> {
        match self.register_learner(request.parts.clone()) {
            Ok(record) => Ok(RegistrationReceipt {
                learner_id: Some(record.learner_id.0),
            }),
            Err(RegistrationServiceError::Validation(errors)) => {
                Err(SubmissionError::Rejected(errors))
            }
            Err(other) => Err(SubmissionError::Transport(other.to_string())),
        }
    }
}

/// Error raised by the registration service.
#[derive(Debug, thiserror::Error)]
pub enum RegistrationServiceError {
    #[error("registration failed validation on {} field(s)", .0.len())]
    Validation(BTreeMap<String, String>),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
