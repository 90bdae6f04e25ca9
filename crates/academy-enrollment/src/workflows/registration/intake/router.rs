use std::sync::Arc;

use axum::{
    extract::{multipart::MultipartError, DefaultBodyLimit, Multipart, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde_json::json;
use tracing::warn;

use super::repository::{LearnerId, LearnerRepository, RepositoryError};
use super::service::{RegistrationService, RegistrationServiceError};
use crate::workflows::registration::domain::Attachment;
use crate::workflows::registration::links::{REGISTER_LEARNER_PATH, SHOW_LEARNER_PATH};
use crate::workflows::registration::submission::FormPart;

/// Upper bound for a registration body, two images included.
pub const MAX_REGISTRATION_BYTES: usize = 10 * 1024 * 1024;

/// Router builder exposing the learner registration endpoints.
pub fn registration_router<R>(service: Arc<RegistrationService<R>>) -> Router
where
    R: LearnerRepository + 'static,
{
    Router::new()
        .route(REGISTER_LEARNER_PATH, post(register_handler::<R>))
        .route(SHOW_LEARNER_PATH, get(status_handler::<R>))
        .layer(DefaultBodyLimit::max(MAX_REGISTRATION_BYTES))
        .with_state(service)
}

pub(crate) async fn register_handler<R>(
    State(service): State<Arc<RegistrationService<R>>>,
    mut multipart: Multipart,
) -> Response
where
    R: LearnerRepository + 'static,
{
    let parts = match collect_parts(&mut multipart).await {
        Ok(parts) => parts,
        Err(error) => {
            warn!(%error, "unreadable registration body");
            let payload = json!({ "error": error.body_text() });
            return (StatusCode::BAD_REQUEST, axum::Json(payload)).into_response();
        }
    };

    match service.register_learner(parts) {
        Ok(record) => (StatusCode::CREATED, axum::Json(record.status_view())).into_response(),
        Err(RegistrationServiceError::Validation(errors)) => {
            let payload = json!({
                "message": "The given data was invalid.",
                "errors": errors,
            });
            (StatusCode::UNPROCESSABLE_ENTITY, axum::Json(payload)).into_response()
        }
        Err(other) => {
            let payload = json!({
                "error": other.to_string(),
            });
            (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(payload)).into_response()
        }
    }
}

pub(crate) async fn status_handler<R>(
    State(service): State<Arc<RegistrationService<R>>>,
    Path(learner_id): Path<String>,
) -> Response
where
    R: LearnerRepository + 'static,
{
    let id = LearnerId(learner_id);
    match service.get(&id) {
        Ok(record) => (StatusCode::OK, axum::Json(record.status_view())).into_response(),
        Err(RegistrationServiceError::Repository(RepositoryError::NotFound)) => {
            let payload = json!({
                "learner_id": id.0,
                "error": "learner not found",
            });
            (StatusCode::NOT_FOUND, axum::Json(payload)).into_response()
        }
        Err(other) => {
            let payload = json!({
                "error": other.to_string(),
            });
            (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(payload)).into_response()
        }
    }
}

async fn collect_parts(multipart: &mut Multipart) -> Result<Vec<FormPart>, MultipartError> {
    let mut parts = Vec::new();
    while let Some(field) = multipart.next_field().await? {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };

        match field.file_name().map(str::to_string) {
            Some(file_name) => {
                let content_type = field
                    .content_type()
                    .unwrap_or(mime::APPLICATION_OCTET_STREAM.as_ref())
                    .to_string();
                let bytes = field.bytes().await?;
                parts.push(FormPart::file(
                    name,
                    Attachment::new(file_name, content_type, bytes.to_vec()),
                ));
            }
            None => parts.push(FormPart::text(name, field.text().await?)),
        }
    }
    Ok(parts)
}
