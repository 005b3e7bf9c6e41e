//! HTTP client for the remote artifact generator.
//!
//! The request is forwarded as a streaming multipart form with the same field names
//! the API accepts, file last, so the upload is never buffered in memory.

use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use depot_core::{GenerateError, GenerateImageMsg, ImageGenerator, RequestContext};
use reqwest::header::LOCATION;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, StatusCode};
use serde::Deserialize;

/// Body returned by the generator on success.
#[derive(Debug, Deserialize)]
struct GeneratedArtifact {
    id: String,
}

/// [`ImageGenerator`] backed by an HTTP service.
#[derive(Clone, Debug)]
pub struct RemoteImageGenerator {
    client: Client,
    endpoint: String,
}

impl RemoteImageGenerator {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn build_form(msg: GenerateImageMsg) -> Result<Form, GenerateError> {
        // Normalised to a plain comma separated list.
        let device_types = msg.device_types().join(",");
        let GenerateImageMsg {
            name,
            description,
            size,
            artifact_type,
            args,
            content_type,
            file,
            ..
        } = msg;

        let file_part = Part::stream(reqwest::Body::wrap_stream(file))
            .file_name("artifact")
            .mime_str(&content_type)
            .map_err(|e| {
                GenerateError::ArtifactParsingFailed(format!(
                    "invalid content type '{}': {}",
                    content_type, e
                ))
            })?;

        Ok(Form::new()
            .text("name", name)
            .text("description", description)
            .text("size", size.to_string())
            .text("device_types_compatible", device_types)
            .text("type", artifact_type)
            .text("args", args)
            .part("file", file_part))
    }
}

/// Last path segment of a `Location` header, e.g. `./abc` or `/artifacts/abc`.
fn id_from_location(location: &str) -> Option<String> {
    location
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .filter(|segment| !segment.is_empty() && *segment != ".")
        .map(str::to_string)
}

#[async_trait]
impl ImageGenerator for RemoteImageGenerator {
    async fn generate_image(
        &self,
        ctx: &RequestContext,
        msg: GenerateImageMsg,
    ) -> Result<String, GenerateError> {
        let size = msg.size;
        let form = Self::build_form(msg)?;

        tracing::debug!(
            endpoint = %self.endpoint,
            request_id = %ctx.request_id(),
            size,
            "Forwarding artifact to generator"
        );

        let response = self
            .client
            .post(&self.endpoint)
            .header("X-Request-ID", ctx.request_id())
            .multipart(form)
            .send()
            .await
            .context("Failed to send request to artifact generator")?;

        let status = response.status();
        let location_id = response
            .headers()
            .get(LOCATION)
            .and_then(|value| value.to_str().ok())
            .and_then(id_from_location);
        let body = response
            .bytes()
            .await
            .context("Failed to read artifact generator response")?;

        match status {
            s if s.is_success() => {
                if let Ok(artifact) = serde_json::from_slice::<GeneratedArtifact>(&body) {
                    return Ok(artifact.id);
                }
                location_id.ok_or_else(|| {
                    GenerateError::Other(anyhow::anyhow!(
                        "artifact generator responded {} without an artifact id",
                        status
                    ))
                })
            }
            StatusCode::CONFLICT | StatusCode::UNPROCESSABLE_ENTITY => {
                Err(GenerateError::ArtifactNotUnique)
            }
            StatusCode::PAYLOAD_TOO_LARGE => Err(GenerateError::ArtifactFileTooLarge),
            StatusCode::BAD_REQUEST => Err(GenerateError::ArtifactParsingFailed(
                String::from_utf8_lossy(&body).trim().to_string(),
            )),
            _ => {
                tracing::warn!(
                    status = %status,
                    request_id = %ctx.request_id(),
                    "Artifact generator returned an unexpected status"
                );
                Err(GenerateError::Other(anyhow::anyhow!(
                    "artifact generator responded {}: {}",
                    status,
                    String::from_utf8_lossy(&body)
                )))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        extract::{Multipart, State},
        http::{HeaderMap, HeaderValue},
        response::IntoResponse,
        routing::post,
        Router,
    };
    use bytes::Bytes;
    use depot_core::ArtifactStream;
    use std::sync::{Arc, Mutex};

    type Received = Arc<Mutex<Vec<(String, Bytes)>>>;

    #[derive(Clone)]
    struct Stub {
        status: StatusCode,
        headers: HeaderMap,
        body: &'static str,
        received: Received,
    }

    async fn generate(State(stub): State<Stub>, mut multipart: Multipart) -> impl IntoResponse {
        while let Some(field) = multipart.next_field().await.unwrap() {
            let name = field.name().unwrap_or_default().to_string();
            let data = field.bytes().await.unwrap();
            stub.received.lock().unwrap().push((name, data));
        }
        (stub.status, stub.headers.clone(), stub.body)
    }

    async fn spawn_stub(status: StatusCode, headers: HeaderMap, body: &'static str) -> (String, Received) {
        let received: Received = Arc::new(Mutex::new(Vec::new()));
        let stub = Stub {
            status,
            headers,
            body,
            received: received.clone(),
        };
        let app = Router::new()
            .route("/generate", post(generate))
            .with_state(stub);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (format!("http://{}/generate", addr), received)
    }

    fn sample_msg() -> GenerateImageMsg {
        GenerateImageMsg {
            name: "name".to_string(),
            description: "description".to_string(),
            size: 9,
            device_types_compatible: "Beagle Bone".to_string(),
            artifact_type: "single_file".to_string(),
            args: "args".to_string(),
            content_type: "application/octet-stream".to_string(),
            file: ArtifactStream::from_bytes("123456790"),
        }
    }

    async fn call(endpoint: String) -> Result<String, GenerateError> {
        let generator = RemoteImageGenerator::new(endpoint, Duration::from_secs(5)).unwrap();
        generator
            .generate_image(&RequestContext::new("req-1"), sample_msg())
            .await
    }

    #[tokio::test]
    async fn test_success_returns_id_and_forwards_fields_in_order() {
        let (endpoint, received) =
            spawn_stub(StatusCode::CREATED, HeaderMap::new(), r#"{"id":"artifact-1"}"#).await;

        let id = call(endpoint).await.unwrap();
        assert_eq!(id, "artifact-1");

        let received = received.lock().unwrap();
        let names: Vec<&str> = received.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(
            names,
            vec!["name", "description", "size", "device_types_compatible", "type", "args", "file"]
        );
        assert_eq!(received[2].1, Bytes::from_static(b"9"));
        assert_eq!(received[6].1, Bytes::from_static(b"123456790"));
    }

    #[tokio::test]
    async fn test_device_types_are_normalised() {
        let (endpoint, received) =
            spawn_stub(StatusCode::CREATED, HeaderMap::new(), r#"{"id":"artifact-1"}"#).await;
        let generator = RemoteImageGenerator::new(endpoint, Duration::from_secs(5)).unwrap();
        let msg = GenerateImageMsg {
            device_types_compatible: " Beagle Bone,, raspberrypi4 ".to_string(),
            ..sample_msg()
        };

        generator
            .generate_image(&RequestContext::new("req-1"), msg)
            .await
            .unwrap();

        let received = received.lock().unwrap();
        assert_eq!(
            received[3],
            (
                "device_types_compatible".to_string(),
                Bytes::from_static(b"Beagle Bone,raspberrypi4")
            )
        );
    }

    #[tokio::test]
    async fn test_success_falls_back_to_location_header() {
        let mut headers = HeaderMap::new();
        headers.insert(LOCATION, HeaderValue::from_static("./artifact-2"));
        let (endpoint, _) = spawn_stub(StatusCode::CREATED, headers, "").await;

        assert_eq!(call(endpoint).await.unwrap(), "artifact-2");
    }

    #[tokio::test]
    async fn test_status_mapping() {
        let (endpoint, _) = spawn_stub(StatusCode::CONFLICT, HeaderMap::new(), "").await;
        assert!(matches!(
            call(endpoint).await,
            Err(GenerateError::ArtifactNotUnique)
        ));

        let (endpoint, _) = spawn_stub(StatusCode::PAYLOAD_TOO_LARGE, HeaderMap::new(), "").await;
        assert!(matches!(
            call(endpoint).await,
            Err(GenerateError::ArtifactFileTooLarge)
        ));

        let (endpoint, _) =
            spawn_stub(StatusCode::BAD_REQUEST, HeaderMap::new(), "bad header").await;
        match call(endpoint).await {
            Err(GenerateError::ArtifactParsingFailed(detail)) => assert_eq!(detail, "bad header"),
            other => panic!("expected parsing failure, got {:?}", other),
        }

        let (endpoint, _) = spawn_stub(StatusCode::BAD_GATEWAY, HeaderMap::new(), "").await;
        assert!(matches!(call(endpoint).await, Err(GenerateError::Other(_))));
    }

    #[test]
    fn test_id_from_location() {
        assert_eq!(id_from_location("./abc").as_deref(), Some("abc"));
        assert_eq!(id_from_location("/api/v1/artifacts/abc/").as_deref(), Some("abc"));
        assert_eq!(id_from_location("./"), None);
    }
}
