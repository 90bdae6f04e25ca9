//! Reference implementation of the backend collaborator: the "register learner"
//! endpoint the wizard submits to.

pub mod repository;
pub mod router;
pub mod service;

pub use repository::{
    EnrollmentStatus, LearnerId, LearnerProfile, LearnerRecord, LearnerRepository,
    LearnerStatusView, RepositoryError,
};
pub use router::registration_router;
pub use service::{RegistrationService, RegistrationServiceError, EMAIL_TAKEN};
