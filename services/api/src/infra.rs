use academy_enrollment::error::AppError;
use academy_enrollment::workflows::registration::intake::{
    LearnerId, LearnerRecord, LearnerRepository, RepositoryError,
};
use academy_enrollment::workflows::registration::{Attachment, ReferenceCatalog, ReferenceOption};
use chrono::NaiveDate;
use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};
use tracing::info;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
    pub(crate) catalog: Arc<ReferenceCatalog>,
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryLearnerRepository {
    records: Arc<Mutex<HashMap<LearnerId, LearnerRecord>>>,
}

impl InMemoryLearnerRepository {
    fn guard(
        &self,
    ) -> Result<std::sync::MutexGuard<'_, HashMap<LearnerId, LearnerRecord>>, RepositoryError>
    {
        self.records
            .lock()
            .map_err(|_| RepositoryError::Unavailable("learner store lock poisoned".to_string()))
    }
}

impl LearnerRepository for InMemoryLearnerRepository {
    fn insert(&self, record: LearnerRecord) -> Result<LearnerRecord, RepositoryError> {
        let mut guard = self.guard()?;
        let email_taken = guard
            .values()
            .any(|existing| existing.profile.email.eq_ignore_ascii_case(&record.profile.email));
        if email_taken || guard.contains_key(&record.learner_id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(record.learner_id.clone(), record.clone());
        Ok(record)
    }

    fn fetch(&self, id: &LearnerId) -> Result<Option<LearnerRecord>, RepositoryError> {
        Ok(self.guard()?.get(id).cloned())
    }

    fn find_by_email(&self, email: &str) -> Result<Option<LearnerRecord>, RepositoryError> {
        Ok(self
            .guard()?
            .values()
            .find(|record| record.profile.email.eq_ignore_ascii_case(email))
            .cloned())
    }
}

/// Programs offered when no reference file is configured.
pub(crate) fn default_programs() -> Vec<ReferenceOption> {
    [
        (1, "Bread and Pastry Production NC II"),
        (2, "Cookery NC II"),
        (3, "Electrical Installation and Maintenance NC II"),
        (4, "Shielded Metal Arc Welding NC II"),
        (5, "Computer Systems Servicing NC II"),
        (6, "Driving NC II"),
    ]
    .into_iter()
    .map(|(id, label)| ReferenceOption::new(id, label))
    .collect()
}

pub(crate) fn load_catalog(path: Option<&Path>) -> Result<ReferenceCatalog, AppError> {
    match path {
        Some(path) => {
            let catalog = ReferenceCatalog::load(path)?;
            info!(
                path = %path.display(),
                programs = catalog.programs.len(),
                "reference catalog loaded"
            );
            Ok(catalog)
        }
        None => Ok(ReferenceCatalog::standard().with_programs(default_programs())),
    }
}

/// Read an upload from disk, guessing its content type from the extension.
pub(crate) fn read_attachment(path: &Path) -> Result<Attachment, AppError> {
    let bytes = std::fs::read(path)?;
    let content_type = mime_guess::from_path(path)
        .first_or_octet_stream()
        .essence_str()
        .to_string();
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "upload".to_string());
    Ok(Attachment::new(file_name, content_type, bytes))
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}
