use std::time::Duration;

use reqwest::blocking::{multipart, Client};
use reqwest::StatusCode;
use tracing::debug;

use super::submission::{
    parse_rejection_body, PartValue, RegistrationBackend, RegistrationReceipt,
    RegistrationRequest, SubmissionError,
};

/// Backend collaborator reached over HTTP with a multipart POST.
#[derive(Debug, Clone)]
pub struct HttpRegistrationBackend {
    client: Client,
}

impl HttpRegistrationBackend {
    pub fn new(timeout: Duration) -> Result<Self, SubmissionError> {
        let client = Client::builder()
            .user_agent(concat!("academy-enrollment/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .map_err(|err| {
                SubmissionError::Transport(format!("failed to create HTTP client: {err}"))
            })?;
        Ok(Self { client })
    }

    fn form(request: &RegistrationRequest) -> Result<multipart::Form, SubmissionError> {
        let mut form = multipart::Form::new();
        for part in &request.parts {
            form = match &part.value {
                PartValue::Text(value) => form.text(part.name.clone(), value.clone()),
                PartValue::File(file) => {
                    let body = multipart::Part::bytes(file.bytes.clone())
                        .file_name(file.file_name.clone())
                        .mime_str(&file.content_type)
                        .map_err(|err| {
                            SubmissionError::Transport(format!(
                                "invalid content type for {}: {err}",
                                part.name
                            ))
                        })?;
                    form.part(part.name.clone(), body)
                }
            };
        }
        Ok(form)
    }
}

impl RegistrationBackend for HttpRegistrationBackend {
    fn register(
        &self,
        request: &RegistrationRequest,
    ) -> Result<RegistrationReceipt, SubmissionError> {
        let form = Self::form(request)?;
        let response = self
            .client
            .post(&request.endpoint)
            .multipart(form)
            .send()
            .map_err(|err| {
                SubmissionError::Transport(format!("POST {} failed: {err}", request.endpoint))
            })?;

        let status = response.status();
        let body = response
            .bytes()
            .map_err(|err| SubmissionError::Transport(format!("unreadable response: {err}")))?;
        debug!(%status, bytes = body.len(), "registration response received");

        classify_response(status, &body)
    }
}

/// Map a response to the wizard's three outcomes: 2xx is success, 422 with a
/// field map is a rejection, anything else is a transport failure.
pub fn classify_response(
    status: StatusCode,
    body: &[u8],
) -> Result<RegistrationReceipt, SubmissionError> {
    if status.is_success() {
        return Ok(serde_json::from_slice(body).unwrap_or_default());
    }

    if status == StatusCode::UNPROCESSABLE_ENTITY {
        if let Some(errors) = parse_rejection_body(body) {
            return Err(SubmissionError::Rejected(errors));
        }
    }

    Err(SubmissionError::Transport(format!(
        "unexpected response status {status}"
    )))
}
