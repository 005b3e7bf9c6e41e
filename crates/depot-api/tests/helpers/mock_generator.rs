//! In-memory generation engine that records what it was asked to generate.

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use depot_core::{ArtifactStream, GenerateError, GenerateImageMsg, ImageGenerator, RequestContext};
use futures::StreamExt;
use std::sync::Mutex;

/// How the mock answers the next calls.
#[derive(Debug, Clone)]
pub enum MockBehaviour {
    Succeed(String),
    /// Reads only the declared `size` bytes of the file, then succeeds.
    SucceedReadingDeclaredSize(String),
    NotUnique,
    TooLarge,
    ParsingFailed(String),
    /// Unclassified failure carrying an internal detail that must not leak.
    Fail(String),
}

/// One `generate_image` call as seen by the engine.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub request_id: String,
    pub name: String,
    pub description: String,
    pub size: u64,
    pub device_types_compatible: String,
    pub artifact_type: String,
    pub args: String,
    pub content_type: String,
    /// File bytes, or the read error message
    pub file: Result<Bytes, String>,
}

pub struct MockImageGenerator {
    behaviour: Mutex<MockBehaviour>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl MockImageGenerator {
    pub fn new(behaviour: MockBehaviour) -> Self {
        Self {
            behaviour: Mutex::new(behaviour),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn set_behaviour(&self, behaviour: MockBehaviour) {
        *self.behaviour.lock().unwrap() = behaviour;
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl ImageGenerator for MockImageGenerator {
    async fn generate_image(
        &self,
        ctx: &RequestContext,
        msg: GenerateImageMsg,
    ) -> Result<String, GenerateError> {
        let GenerateImageMsg {
            name,
            description,
            size,
            device_types_compatible,
            artifact_type,
            args,
            content_type,
            file,
        } = msg;
        let behaviour = self.behaviour.lock().unwrap().clone();
        let file = match behaviour {
            MockBehaviour::SucceedReadingDeclaredSize(_) => read_prefix(file, size).await,
            _ => file.collect_bytes().await,
        }
        .map_err(|e| e.to_string());
        let read_error = file.as_ref().err().cloned();

        self.calls.lock().unwrap().push(RecordedCall {
            request_id: ctx.request_id().to_string(),
            name,
            description,
            size,
            device_types_compatible,
            artifact_type,
            args,
            content_type,
            file,
        });

        // A real engine cannot make sense of a file it failed to read.
        if let Some(err) = read_error {
            return Err(GenerateError::ArtifactParsingFailed(err));
        }

        match behaviour {
            MockBehaviour::Succeed(id) | MockBehaviour::SucceedReadingDeclaredSize(id) => Ok(id),
            MockBehaviour::NotUnique => Err(GenerateError::ArtifactNotUnique),
            MockBehaviour::TooLarge => Err(GenerateError::ArtifactFileTooLarge),
            MockBehaviour::ParsingFailed(detail) => Err(GenerateError::ArtifactParsingFailed(detail)),
            MockBehaviour::Fail(detail) => Err(GenerateError::Other(anyhow::anyhow!(detail))),
        }
    }
}

/// Read up to `len` bytes and leave the rest of the stream unpolled.
async fn read_prefix(mut file: ArtifactStream, len: u64) -> std::io::Result<Bytes> {
    let mut buf = BytesMut::new();
    while (buf.len() as u64) < len {
        match file.next().await {
            Some(chunk) => buf.extend_from_slice(&chunk?),
            None => break,
        }
    }
    buf.truncate(len as usize);
    Ok(buf.freeze())
}
