use crate::error::{ErrorResponse, HttpAppError};
use crate::middleware::RequestId;
use crate::state::AppState;
use crate::upload::{build_generate_msg, FieldValidator, SectionReader};
use axum::{
    body::Body,
    extract::State,
    http::{header::LOCATION, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Extension,
};
use depot_core::RequestContext;
use std::sync::Arc;
use tracing::Span;

#[utoipa::path(
    post,
    path = "/api/v1/artifacts/generate",
    tag = "artifacts",
    request_body(
        content = inline(Object),
        content_type = "multipart/form-data",
        description = "Ordered form: name, description, size (required, before the file), device_types_compatible, type, args, then the artifact file"
    ),
    responses(
        (status = 201, description = "Artifact generated", headers(
            ("Location" = String, description = "Relative location of the new artifact")
        )),
        (status = 400, description = "Malformed form, invalid field order or unusable artifact", body = ErrorResponse),
        (status = 422, description = "Artifact not unique", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip_all, fields(request_id = tracing::field::Empty, artifact_id = tracing::field::Empty))]
pub async fn generate_artifact(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    headers: HeaderMap,
    body: Body,
) -> Result<Response, HttpAppError> {
    Span::current().record("request_id", request_id.as_str());

    let mut reader = SectionReader::from_headers(&headers, body, state.config.max_field_bytes())?;
    let mut validator = FieldValidator::new();

    let upload = loop {
        let Some(section) = reader.next_section().await? else {
            return Err(validator.finish().into());
        };
        if let Some(upload) = validator.accept(section)? {
            break upload;
        }
    };

    let (msg, tail) =
        build_generate_msg(upload, reader, state.config.max_artifact_size_bytes())?;
    tracing::debug!(
        name = %msg.name,
        size = msg.size,
        artifact_type = %msg.artifact_type,
        content_type = %msg.content_type,
        "Artifact upload validated"
    );

    let ctx = RequestContext::new(request_id.as_str());
    let result = state.generator.generate_image(&ctx, msg).await;

    // A failed read is reported as such, whatever the engine made of it. On success
    // the part may be partly unread, and nothing may follow it.
    let fault = match &result {
        Ok(_) => tail.finish().await,
        Err(_) => tail.fault().await,
    };
    if let Some(fault) = fault {
        return Err(fault.into());
    }
    let artifact_id = result?;

    Span::current().record("artifact_id", artifact_id.as_str());
    tracing::info!(artifact_id = %artifact_id, "Artifact generated");

    Ok((
        StatusCode::CREATED,
        [(LOCATION, format!("./{}", artifact_id))],
    )
        .into_response())
}
