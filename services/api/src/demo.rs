use crate::infra::{load_catalog, parse_date, read_attachment, InMemoryLearnerRepository};
use academy_enrollment::config::AppConfig;
use academy_enrollment::error::AppError;
use academy_enrollment::workflows::registration::intake::RegistrationService;
use academy_enrollment::workflows::registration::{
    ApplicationForm, Attachment, EducationalAttainment, FieldInput, FieldName, FieldValue,
    HttpRegistrationBackend, Notification, ReferenceCatalog, RegistrationBackend,
    RegistrationWizard, RouteTable, SelectionGroup, SubmissionOutcome, Transition,
};
use chrono::{Local, NaiveDate};
use clap::Args;
use std::path::{Path, PathBuf};
use std::sync::Arc;

const PLACEHOLDER_PNG: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Image to upload as the thumbmark. A placeholder PNG is used when omitted.
    #[arg(long)]
    pub(crate) thumbmark: Option<PathBuf>,
    /// Image to upload as the learner's picture. A placeholder PNG is used when omitted.
    #[arg(long)]
    pub(crate) picture: Option<PathBuf>,
    /// Date used for the age calculation (defaults to today).
    #[arg(long, value_parser = parse_date)]
    pub(crate) today: Option<NaiveDate>,
    /// Submit to the service at APP_BACKEND_URL instead of an in-process one.
    #[arg(long)]
    pub(crate) remote: bool,
}

#[derive(Args, Debug, Default)]
pub(crate) struct CatalogArgs {
    /// Reference catalog JSON file (overrides APP_REFERENCE_DATA).
    #[arg(long)]
    pub(crate) reference: Option<PathBuf>,
    /// Print the catalog as JSON.
    #[arg(long)]
    pub(crate) json: bool,
}

pub(crate) fn run_catalog(args: CatalogArgs) -> Result<(), AppError> {
    let CatalogArgs { reference, json } = args;
    let reference = match reference {
        Some(path) => Some(path),
        None => AppConfig::load()?.reference_data,
    };
    let catalog = load_catalog(reference.as_deref())?;

    if json {
        let rendered = serde_json::to_string_pretty(&catalog)
            .map_err(|err| AppError::Io(std::io::Error::other(err)))?;
        println!("{rendered}");
        return Ok(());
    }

    render_catalog(&catalog);
    Ok(())
}

fn render_catalog(catalog: &ReferenceCatalog) {
    println!("Programs");
    for program in &catalog.programs {
        println!("  {:>3}  {}", program.id, program.label);
    }
    for group in [SelectionGroup::Classifications, SelectionGroup::DisabilityTypes] {
        println!("{}", group.field().label());
        for option in catalog.options(group) {
            let marker = if group == SelectionGroup::Classifications
                && option.id == catalog.other_classification_id
            {
                " (requires details)"
            } else {
                ""
            };
            println!("  {:>3}  {}{marker}", option.id, option.label);
        }
    }
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        thumbmark,
        picture,
        today,
        remote,
    } = args;

    let today = today.unwrap_or_else(|| Local::now().date_naive());
    let thumbmark = upload(thumbmark.as_deref(), "thumbmark.png")?;
    let picture = upload(picture.as_deref(), "picture.png")?;

    println!("Learner registration wizard demo ({today})");

    if remote {
        let config = AppConfig::load()?;
        let backend = HttpRegistrationBackend::new(config.backend.timeout())?;
        let links = RouteTable::standard(config.backend.base_url.clone());
        let catalog = Arc::new(load_catalog(config.reference_data.as_deref())?);
        println!("Submitting to {}", config.backend.base_url);
        return walk_through(catalog, links, today, &backend, thumbmark, picture);
    }

    let catalog = Arc::new(load_catalog(None)?);
    let service = RegistrationService::new(
        Arc::new(InMemoryLearnerRepository::default()),
        catalog.clone(),
    )
    .with_today(today);
    println!("Submitting to an in-process registration service");
    walk_through(
        catalog,
        RouteTable::default(),
        today,
        &service,
        thumbmark,
        picture,
    )
}

fn upload(path: Option<&Path>, fallback_name: &str) -> Result<Attachment, AppError> {
    match path {
        Some(path) => read_attachment(path),
        None => Ok(Attachment::new(
            fallback_name,
            "image/png",
            PLACEHOLDER_PNG.to_vec(),
        )),
    }
}

fn walk_through<B>(
    catalog: Arc<ReferenceCatalog>,
    links: RouteTable,
    today: NaiveDate,
    backend: &B,
    thumbmark: Attachment,
    picture: Attachment,
) -> Result<(), AppError>
where
    B: RegistrationBackend + ?Sized,
{
    let program_id = catalog
        .programs
        .first()
        .map(|program| program.id.to_string())
        .unwrap_or_default();

    let mut wizard = RegistrationWizard::new(catalog.clone(), links.clone(), today);

    println!("\n{}", wizard.step());
    report(wizard.advance(), &wizard);

    fill(
        &mut wizard,
        &[
            (FieldName::LastName, "Dela Cruz"),
            (FieldName::FirstName, "Maria"),
            (FieldName::MiddleName, "Santos"),
            (FieldName::Sex, "Female"),
            (FieldName::CivilStatus, "Single"),
            (FieldName::Birthdate, "2000-03-04"),
            (FieldName::Nationality, "Filipino"),
        ],
    )?;
    println!("  age derived from birthdate: {}", wizard.form().age);
    report(wizard.advance(), &wizard);

    fill(
        &mut wizard,
        &[
            (FieldName::Email, "maria.delacruz@example.com"),
            (FieldName::ContactNumber, "09171234567"),
            (FieldName::Street, "12 Mabini St."),
            (FieldName::Barangay, "San Isidro"),
            (FieldName::City, "Tarlac City"),
            (FieldName::Province, "Tarlac"),
            (FieldName::Region, "Region III"),
        ],
    )?;
    report(wizard.advance(), &wizard);

    wizard.set_educational_attainment(EducationalAttainment::SeniorHighSchool);
    report(wizard.advance(), &wizard);

    let other = wizard.catalog().other_classification_id;
    wizard.toggle_selection(SelectionGroup::Classifications, other)?;
    report(wizard.advance(), &wizard);
    fill(
        &mut wizard,
        &[(FieldName::OtherClassificationDetails, "Solo parent")],
    )?;
    report(wizard.advance(), &wizard);

    fill(&mut wizard, &[(FieldName::ProgramId, program_id.as_str())])?;
    report(wizard.advance(), &wizard);

    wizard.set_field(FieldName::Consent, FieldValue::Flag(true))?;
    wizard.set_field(FieldName::Thumbmark, FieldValue::File(Some(thumbmark)))?;
    wizard.set_field(FieldName::Picture, FieldValue::File(Some(picture)))?;
    report(wizard.advance(), &wizard);

    println!("\nReview");
    for control in wizard.step_view().controls {
        println!("  {control}");
    }

    let snapshot = wizard.form().clone();
    let outcome = wizard.submit(backend)?;
    describe_outcome(&outcome, wizard.notification());

    if matches!(outcome, SubmissionOutcome::Registered(_)) {
        println!("\nSubmitting the same learner again");
        let mut repeat = RegistrationWizard::new(catalog, links, today);
        replay(&mut repeat, &snapshot)?;
        let outcome = repeat.submit(backend)?;
        describe_outcome(&outcome, repeat.notification());
        println!("  wizard now on {}", repeat.step());
    }
    Ok(())
}

fn fill(wizard: &mut RegistrationWizard, values: &[(FieldName, &str)]) -> Result<(), AppError> {
    for (field, value) in values {
        wizard.set_field(*field, FieldValue::text(*value))?;
    }
    Ok(())
}

/// Copy a finished form into a fresh wizard and walk it to review.
fn replay(wizard: &mut RegistrationWizard, form: &ApplicationForm) -> Result<(), AppError> {
    for field in FieldName::ALL {
        if field.is_derived() {
            continue;
        }
        let value = match form.input(field) {
            FieldInput::Text(text) => FieldValue::text(text),
            FieldInput::Flag(flag) => FieldValue::Flag(flag),
            FieldInput::Attainment(level) => FieldValue::Attainment(level),
            FieldInput::Selection(ids) => FieldValue::Selection(ids.clone()),
            FieldInput::File(file) => FieldValue::File(file.cloned()),
        };
        wizard.set_field(field, value)?;
    }
    while wizard.advance().is_moved() {}
    Ok(())
}

fn report(transition: Transition, wizard: &RegistrationWizard) {
    match transition {
        Transition::Moved { from, to } => println!("  {} -> {}", from.title(), to),
        Transition::Blocked { step, errors } => {
            println!("  {} blocked with {errors} error(s):", step.title());
            for (field, message) in wizard.step_errors(step) {
                println!("    - {}: {message}", field.as_str());
            }
        }
        Transition::Unchanged => println!("  (no change)"),
    }
}

fn describe_outcome(outcome: &SubmissionOutcome, notification: Option<&Notification>) {
    match outcome {
        SubmissionOutcome::Registered(receipt) => println!(
            "  registered as {}",
            receipt.learner_id.as_deref().unwrap_or("(no id returned)")
        ),
        SubmissionOutcome::Rejected { landed_on, errors } => println!(
            "  rejected with {errors} error(s); landed on {}",
            landed_on.map(|step| step.title()).unwrap_or("review")
        ),
        SubmissionOutcome::Failed => println!("  submission failed"),
    }
    if let Some(notification) = notification {
        println!("  [{:?}] {}", notification.level, notification.title);
        for message in &notification.messages {
            println!("    {message}");
        }
    }
}
