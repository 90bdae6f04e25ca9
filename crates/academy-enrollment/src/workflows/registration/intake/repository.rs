use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::workflows::registration::domain::EducationalAttainment;
use crate::workflows::registration::renderer::FileSummary;

/// Identifier assigned to an accepted registration.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LearnerId(pub String);

/// Review state of an enrollment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EnrollmentStatus {
    Pending,
    Accepted,
    Rejected,
}

impl EnrollmentStatus {
    pub const fn label(self) -> &'static str {
        match self {
            EnrollmentStatus::Pending => "pending",
            EnrollmentStatus::Accepted => "accepted",
            EnrollmentStatus::Rejected => "rejected",
        }
    }
}

/// Stored learner data. Uploads are kept as metadata only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LearnerProfile {
    pub full_name: String,
    pub email: String,
    pub birthdate: String,
    pub contact_number: String,
    pub program_id: u32,
    pub scholarship_package: Option<String>,
    pub educational_attainment: Option<EducationalAttainment>,
    pub classifications: BTreeSet<u32>,
    pub disability_types: BTreeSet<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LearnerRecord {
    pub learner_id: LearnerId,
    pub status: EnrollmentStatus,
    pub submitted_at: DateTime<Utc>,
    pub profile: LearnerProfile,
    pub uploads: Vec<FileSummary>,
}

impl LearnerRecord {
    pub fn status_view(&self) -> LearnerStatusView {
        LearnerStatusView {
            learner_id: self.learner_id.clone(),
            status: self.status.label(),
            full_name: self.profile.full_name.clone(),
            program_id: self.profile.program_id,
            submitted_at: self.submitted_at,
        }
    }
}

/// Sanitized registration status returned by the API.
#[derive(Debug, Clone, Serialize)]
pub struct LearnerStatusView {
    pub learner_id: LearnerId,
    pub status: &'static str,
    pub full_name: String,
    pub program_id: u32,
    pub submitted_at: DateTime<Utc>,
}

/// Storage abstraction so the intake service can be exercised in isolation.
pub trait LearnerRepository: Send + Sync {
    fn insert(&self, record: LearnerRecord) -> Result<LearnerRecord, RepositoryError>;
    fn fetch(&self, id: &LearnerId) -> Result<Option<LearnerRecord>, RepositoryError>;
    fn find_by_email(&self, email: &str) -> Result<Option<LearnerRecord>, RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}
