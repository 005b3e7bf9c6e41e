//! OpenAPI documentation.

use utoipa::OpenApi;

use crate::error;
use crate::handlers;

/// Returns the OpenAPI spec served at `/api/openapi.json`.
pub fn get_openapi_spec() -> utoipa::openapi::OpenApi {
    ApiDoc::openapi()
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Depot API",
        version = "0.1.0",
        description = "Artifact generation API. Artifacts are uploaded as an ordered multipart/form-data stream and handed to the generation engine without being buffered. All endpoints are versioned under /api/v1/."
    ),
    paths(
        handlers::artifacts_generate::generate_artifact,
    ),
    components(
        schemas(
            error::ErrorResponse,
        )
    ),
    tags(
        (name = "artifacts", description = "Artifact generation from uploaded files")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{API_PREFIX, GENERATE_ARTIFACT_PATH};

    #[test]
    fn test_spec_lists_generate_path() {
        let spec = get_openapi_spec();
        let path = format!("{}{}", API_PREFIX, GENERATE_ARTIFACT_PATH);
        assert!(spec.paths.paths.contains_key(&path));
    }
}
