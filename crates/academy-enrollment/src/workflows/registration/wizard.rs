use std::sync::Arc;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{debug, info, warn};

use super::domain::{
    age_on, ApplicationForm, EducationalAttainment, FieldValue, FormError, SelectionGroup,
};
use super::fields::{FieldName, Step};
use super::links::{LinkResolver, RouteTable, REGISTER_LEARNER};
use super::reference::ReferenceCatalog;
use super::renderer::{render_control, ControlView};
use super::submission::{
    RegistrationBackend, RegistrationReceipt, RegistrationRequest, SubmissionError,
};
use super::validation::{FieldErrors, ValidationRules};

/// Result of a navigation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Transition {
    /// The wizard moved; the presentation layer scrolls back to the top.
    Moved { from: Step, to: Step },
    /// Validation of `step` failed and the move was refused.
    Blocked { step: Step, errors: usize },
    Unchanged,
}

impl Transition {
    pub fn is_moved(&self) -> bool {
        matches!(self, Transition::Moved { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationLevel {
    Success,
    Warning,
    Error,
}

/// Dialog the presentation layer should currently show.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub level: NotificationLevel,
    pub title: String,
    pub messages: Vec<String>,
}

impl Notification {
    fn new(level: NotificationLevel, title: impl Into<String>, messages: Vec<String>) -> Self {
        Self {
            level,
            title: title.into(),
            messages,
        }
    }
}

/// Reasons a submission never reached the backend.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SubmitBlocked {
    #[error("submission is only available from the review step (currently on {0:?})")]
    NotOnReview(Step),
    #[error("a submission is already in progress")]
    InProgress,
    #[error("application has errors on the {0:?} step")]
    Invalid(Step),
    #[error("no route registered for '{0}'")]
    UnresolvedRoute(String),
}

/// How a dispatched submission ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionOutcome {
    Registered(RegistrationReceipt),
    Rejected {
        landed_on: Option<Step>,
        errors: usize,
    },
    Failed,
}

/// Everything needed to draw the current step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepView {
    pub step: Step,
    pub index: usize,
    pub title: &'static str,
    pub controls: Vec<ControlView>,
    pub can_advance: bool,
    pub can_retreat: bool,
    pub can_submit: bool,
    pub processing: bool,
}

/// Client-side controller for the seven-step learner registration form.
pub struct RegistrationWizard<L = RouteTable> {
    form: ApplicationForm,
    step: Step,
    errors: FieldErrors,
    processing: bool,
    notification: Option<Notification>,
    catalog: Arc<ReferenceCatalog>,
    rules: ValidationRules,
    links: L,
    today: NaiveDate,
}

impl<L> RegistrationWizard<L>
where
    L: LinkResolver,
{
    pub fn new(catalog: Arc<ReferenceCatalog>, links: L, today: NaiveDate) -> Self {
        let rules = ValidationRules::from(catalog.as_ref()).with_today(today);
        Self {
            form: ApplicationForm::default(),
            step: Step::Personal,
            errors: FieldErrors::new(),
            processing: false,
            notification: None,
            catalog,
            rules,
            links,
            today,
        }
    }

    pub fn form(&self) -> &ApplicationForm {
        &self.form
    }

    pub fn step(&self) -> Step {
        self.step
    }

    pub fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    pub fn error(&self, field: FieldName) -> Option<&str> {
        self.errors.get(&field).map(String::as_str)
    }

    pub fn is_processing(&self) -> bool {
        self.processing
    }

    pub fn notification(&self) -> Option<&Notification> {
        self.notification.as_ref()
    }

    pub fn dismiss_notification(&mut self) -> Option<Notification> {
        self.notification.take()
    }

    pub fn catalog(&self) -> &ReferenceCatalog {
        &self.catalog
    }

    /// Errors currently shown for fields owned by `step`.
    pub fn step_errors(&self, step: Step) -> FieldErrors {
        step.fields()
            .iter()
            .filter_map(|field| self.errors.get(field).map(|message| (*field, message.clone())))
            .collect()
    }

    /// Whether the Next control is enabled.
    pub fn can_advance(&self) -> bool {
        !self.step.is_terminal()
            && !self.processing
            && !self
                .step
                .fields()
                .iter()
                .any(|field| self.errors.contains_key(field))
    }

    pub fn can_submit(&self) -> bool {
        self.step.is_terminal() && !self.processing
    }

    pub fn advance(&mut self) -> Transition {
        let errors = self.rules.validate_step(self.step, &self.form);
        if !errors.is_empty() {
            return self.block(errors);
        }
        self.clear_step_errors(self.step);

        match self.step.next() {
            Some(next) => self.move_to(next),
            None => Transition::Unchanged,
        }
    }

    /// Step back one section. Never validates and never clears entered data.
    pub fn retreat(&mut self) -> Transition {
        match self.step.previous() {
            Some(previous) => self.move_to(previous),
            None => Transition::Unchanged,
        }
    }

    /// Backward jumps are free; forward jumps are gated by the current step only.
    pub fn jump_to(&mut self, target: Step) -> Transition {
        if target == self.step {
            return Transition::Unchanged;
        }
        if target < self.step {
            return self.move_to(target);
        }

        let errors = self.rules.validate_step(self.step, &self.form);
        if !errors.is_empty() {
            return self.block(errors);
        }
        self.clear_step_errors(self.step);
        self.move_to(target)
    }

    pub fn jump_to_index(&mut self, index: usize) -> Result<Transition, FormError> {
        let target = Step::from_index(index).ok_or(FormError::StepOutOfRange(index))?;
        Ok(self.jump_to(target))
    }

    /// Write one field and refresh its error immediately.
    pub fn set_field(&mut self, field: FieldName, value: FieldValue) -> Result<(), FormError> {
        if field.is_derived() {
            return Err(FormError::DerivedField(field));
        }
        let group = SelectionGroup::for_field(field);
        if let (Some(group), FieldValue::Selection(ids)) = (group, &value) {
            if let Some(&id) = ids.iter().find(|id| !self.catalog.offers(group, **id)) {
                return Err(FormError::UnknownOption { group, id });
            }
        }
        self.form.apply(field, value)?;

        if field == FieldName::Birthdate {
            self.form.age = self
                .form
                .parsed_birthdate()
                .and_then(|birthdate| age_on(birthdate, self.today))
                .map(|age| age.to_string())
                .unwrap_or_default();
            if self.errors.contains_key(&FieldName::Age) {
                self.refresh_error(FieldName::Age);
            }
        }

        self.refresh_error(field);
        if let Some(group) = group {
            self.refresh_dependent(group);
        }
        Ok(())
    }

    /// Choose the single attainment level.
    pub fn set_educational_attainment(&mut self, level: EducationalAttainment) {
        self.form.educational_attainment = Some(level);
        self.errors.remove(&FieldName::EducationalAttainment);
    }

    /// Toggle `id` in a multi-select group. Returns whether it is now selected.
    pub fn toggle_selection(&mut self, group: SelectionGroup, id: u32) -> Result<bool, FormError> {
        if !self.catalog.offers(group, id) {
            return Err(FormError::UnknownOption { group, id });
        }
        let selected = self.form.toggle(group, id);
        self.refresh_dependent(group);
        Ok(selected)
    }

    pub fn step_view(&self) -> StepView {
        let fields: Vec<FieldName> = if self.step.is_terminal() {
            FieldName::ALL.to_vec()
        } else {
            self.step.fields().to_vec()
        };

        StepView {
            step: self.step,
            index: self.step.index(),
            title: self.step.title(),
            controls: fields
                .into_iter()
                .map(|field| render_control(field, &self.form, &self.catalog, self.error(field)))
                .collect(),
            can_advance: self.can_advance(),
            can_retreat: self.step.previous().is_some(),
            can_submit: self.can_submit(),
            processing: self.processing,
        }
    }

    /// Validate and package the application. On success the wizard is marked as
    /// processing until [`finish_submission`](Self::finish_submission) is called.
    pub fn begin_submission(&mut self) -> Result<RegistrationRequest, SubmitBlocked> {
        if self.processing {
            return Err(SubmitBlocked::InProgress);
        }
        if !self.step.is_terminal() {
            return Err(SubmitBlocked::NotOnReview(self.step));
        }

        if let Some((step, errors)) = self.rules.first_invalid_step(&self.form) {
            let messages = errors.values().cloned().collect();
            self.store_errors(step, errors);
            self.notification = Some(Notification::new(
                NotificationLevel::Warning,
                format!("Please complete the {} step", step.title()),
                messages,
            ));
            self.move_to(step);
            return Err(SubmitBlocked::Invalid(step));
        }

        let Some(endpoint) = self.links.resolve(REGISTER_LEARNER) else {
            warn!(route = REGISTER_LEARNER, "registration route is not configured");
            self.notification = Some(generic_failure());
            return Err(SubmitBlocked::UnresolvedRoute(REGISTER_LEARNER.to_string()));
        };

        self.processing = true;
        self.notification = None;
        Ok(RegistrationRequest::from_form(endpoint, &self.form))
    }

    /// Apply the backend's answer to a submission started with
    /// [`begin_submission`](Self::begin_submission).
    pub fn finish_submission(
        &mut self,
        result: Result<RegistrationReceipt, SubmissionError>,
    ) -> SubmissionOutcome {
        self.processing = false;

        match result {
            Ok(receipt) => {
                info!(learner_id = ?receipt.learner_id, "learner registration accepted");
                self.form = ApplicationForm::default();
                self.errors.clear();
                self.step = Step::Personal;
                self.notification = Some(Notification::new(
                    NotificationLevel::Success,
                    "Registration submitted",
                    vec!["Your enrollment application was received.".to_string()],
                ));
                SubmissionOutcome::Registered(receipt)
            }
            Err(SubmissionError::Rejected(server_errors)) => {
                warn!(errors = server_errors.len(), "learner registration rejected");
                let messages = server_errors.values().cloned().collect();
                let mut landed_on: Option<Step> = None;
                for (key, message) in &server_errors {
                    let Some(field) = FieldName::from_wire(key) else {
                        debug!(%key, "server error for unknown field");
                        continue;
                    };
                    self.errors.insert(field, message.clone());
                    let owner = field.step();
                    landed_on = Some(landed_on.map_or(owner, |current| current.min(owner)));
                }

                self.notification = Some(Notification::new(
                    NotificationLevel::Error,
                    "Registration was not accepted",
                    messages,
                ));
                if let Some(step) = landed_on {
                    self.move_to(step);
                }
                SubmissionOutcome::Rejected {
                    landed_on,
                    errors: server_errors.len(),
                }
            }
            Err(SubmissionError::Transport(reason)) => {
                warn!(%reason, "learner registration transport failure");
                self.notification = Some(generic_failure());
                SubmissionOutcome::Failed
            }
        }
    }

    /// Validate, dispatch and apply the outcome in one call.
    pub fn submit<B>(&mut self, backend: &B) -> Result<SubmissionOutcome, SubmitBlocked>
    where
        B: RegistrationBackend + ?Sized,
    {
        let request = self.begin_submission()?;
        info!(
            endpoint = %request.endpoint,
            parts = request.parts.len(),
            "submitting learner registration"
        );
        let result = backend.register(&request);
        Ok(self.finish_submission(result))
    }

    fn move_to(&mut self, target: Step) -> Transition {
        let from = self.step;
        self.step = target;
        debug!(?from, to = ?target, "wizard step changed");
        Transition::Moved { from, to: target }
    }

    fn block(&mut self, errors: FieldErrors) -> Transition {
        let step = self.step;
        let count = errors.len();
        self.store_errors(step, errors);
        debug!(?step, errors = count, "wizard transition blocked");
        Transition::Blocked {
            step,
            errors: count,
        }
    }

    fn store_errors(&mut self, step: Step, errors: FieldErrors) {
        self.clear_step_errors(step);
        self.errors.extend(errors);
    }

    fn clear_step_errors(&mut self, step: Step) {
        for field in step.fields() {
            self.errors.remove(field);
        }
    }

    fn refresh_error(&mut self, field: FieldName) {
        match self.rules.field_error(field, &self.form) {
            Some(message) => {
                self.errors.insert(field, message);
            }
            None => {
                self.errors.remove(&field);
            }
        }
    }

    /// Re-check the free-text field tied to a group, but only while it is showing an error.
    fn refresh_dependent(&mut self, group: SelectionGroup) {
        let dependent = group.dependent();
        if self.errors.contains_key(&dependent) {
            self.refresh_error(dependent);
        }
    }
}

fn generic_failure() -> Notification {
    Notification::new(
        NotificationLevel::Error,
        "Something went wrong",
        vec!["We could not submit your application. Please try again.".to_string()],
    )
}
