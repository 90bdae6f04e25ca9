//! Learner registration wizard: the seven-step enrollment form, its validation
//! rules, and the controller that submits it to the backend collaborator.

pub mod domain;
pub mod fields;
pub mod http;
pub mod intake;
pub mod links;
pub mod reference;
pub mod renderer;
pub mod submission;
pub mod validation;
pub mod wizard;

#[cfg(test)]
mod tests;

pub use domain::{
    age_on, ApplicationForm, Attachment, EducationalAttainment, FieldInput, FieldValue,
    FormError, SelectionGroup,
};
pub use fields::{FieldName, InputKind, Step, ValueKind};
pub use http::HttpRegistrationBackend;
pub use links::{LinkResolver, RouteTable, REGISTER_LEARNER};
pub use reference::{CatalogError, ReferenceCatalog, ReferenceOption, OTHER_CLASSIFICATION_ID};
pub use renderer::{interpret_change, render_control, ControlValue, ControlView, RawChange};
pub use submission::{
    FormPart, PartValue, RegistrationBackend, RegistrationReceipt, RegistrationRequest,
    SubmissionError,
};
pub use validation::{validate_field, validate_step, FieldErrors, ValidationRules};
pub use wizard::{
    Notification, NotificationLevel, RegistrationWizard, StepView, SubmissionOutcome,
    SubmitBlocked, Transition,
};
