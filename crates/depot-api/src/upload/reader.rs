//! Streaming multipart section reader
//!
//! Wraps `multer` so each part of the body is handed out in arrival order, either as
//! a small text field or as the still-unread file part. Nothing beyond the current
//! field value is buffered.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use axum::body::Body;
use axum::http::{header::CONTENT_TYPE, HeaderMap};
use bytes::BytesMut;
use futures::StreamExt;
use multer::{Field, Multipart};

/// Form name of the artifact file part.
pub const FILE_FIELD: &str = "file";

/// Transport level failures while decoding the request body.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    /// Content type is missing or is not a multipart form.
    #[error("{0}")]
    ContentType(String),

    /// Body is truncated or a part cannot be parsed.
    #[error("{0}")]
    Body(String),
}

impl From<multer::Error> for DecodeError {
    fn from(err: multer::Error) -> Self {
        DecodeError::Body(err.to_string())
    }
}

/// The file part of the form, positioned at the start of its data.
pub struct FilePart {
    name: String,
    file_name: Option<String>,
    content_type: Option<String>,
    field: Field<'static>,
}

impl FilePart {
    fn new(name: String, field: Field<'static>) -> Self {
        let file_name = field.file_name().map(str::to_string);
        let content_type = field
            .content_type()
            .map(|mime| mime.to_string())
            .filter(|ct| !ct.trim().is_empty());
        Self {
            name,
            file_name,
            content_type,
            field,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn file_name(&self) -> Option<&str> {
        self.file_name.as_deref()
    }

    /// `None` when the part carried no (or an empty) Content-Type header.
    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    pub(crate) fn into_field(self) -> Field<'static> {
        self.field
    }
}

impl std::fmt::Debug for FilePart {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilePart")
            .field("name", &self.name)
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .finish_non_exhaustive()
    }
}

/// One part of the multipart body.
#[derive(Debug)]
pub enum UploadSection {
    Field { name: String, value: String },
    File(FilePart),
}

/// Lazy reader over the sections of a multipart body.
pub struct SectionReader {
    multipart: Multipart<'static>,
    max_field_bytes: usize,
    received_data: Arc<AtomicBool>,
}

impl SectionReader {
    /// Validate the request content type and start reading `body`.
    pub fn from_headers(
        headers: &HeaderMap,
        body: Body,
        max_field_bytes: usize,
    ) -> Result<Self, DecodeError> {
        let content_type = match headers.get(CONTENT_TYPE) {
            Some(value) => value
                .to_str()
                .map_err(|_| DecodeError::ContentType("mime: invalid media type".to_string()))?,
            None => "",
        };
        let boundary = parse_boundary(content_type)?;
        Ok(Self::new(body, boundary, max_field_bytes))
    }

    pub fn new(body: Body, boundary: impl Into<String>, max_field_bytes: usize) -> Self {
        let received_data = Arc::new(AtomicBool::new(false));
        let seen = received_data.clone();
        let stream = body.into_data_stream().inspect(move |chunk| {
            if matches!(chunk, Ok(data) if !data.is_empty()) {
                seen.store(true, Ordering::Relaxed);
            }
        });

        Self {
            multipart: Multipart::new(stream, boundary.into()),
            max_field_bytes,
            received_data,
        }
    }

    /// Next section in body order, or `None` once the closing boundary is read.
    ///
    /// A file section must be dropped (or fully read) before this is called again.
    pub async fn next_section(&mut self) -> Result<Option<UploadSection>, DecodeError> {
        loop {
            let Some(field) = self.next_field().await? else {
                return Ok(None);
            };

            let Some(name) = field.name().map(str::to_string) else {
                tracing::debug!("Skipping multipart section without a name");
                continue;
            };

            if name == FILE_FIELD || field.file_name().is_some() {
                return Ok(Some(UploadSection::File(FilePart::new(name, field))));
            }

            let value = read_field_value(field, &name, self.max_field_bytes).await?;
            return Ok(Some(UploadSection::Field { name, value }));
        }
    }

    /// Whether another section follows the one just consumed.
    pub(crate) async fn has_more_sections(&mut self) -> Result<bool, DecodeError> {
        Ok(self.next_field().await?.is_some())
    }

    async fn next_field(&mut self) -> Result<Option<Field<'static>>, DecodeError> {
        match self.multipart.next_field().await {
            Ok(field) => Ok(field),
            // An empty body has no sections at all.
            Err(multer::Error::IncompleteStream) if !self.received_data.load(Ordering::Relaxed) => {
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// Extract the multipart boundary, rejecting anything that is not a multipart form.
pub fn parse_boundary(content_type: &str) -> Result<String, DecodeError> {
    let media_type = content_type.split(';').next().unwrap_or_default().trim();
    if media_type.is_empty() {
        return Err(DecodeError::ContentType("mime: no media type".to_string()));
    }

    multer::parse_boundary(content_type).map_err(|e| match e {
        multer::Error::NoMultipart => DecodeError::ContentType(
            "request Content-Type isn't multipart/form-data".to_string(),
        ),
        multer::Error::NoBoundary => {
            DecodeError::ContentType("no multipart boundary param in Content-Type".to_string())
        }
        other => DecodeError::ContentType(format!("mime: {}", other)),
    })
}

async fn read_field_value(
    mut field: Field<'static>,
    name: &str,
    limit: usize,
) -> Result<String, DecodeError> {
    let mut buf = BytesMut::new();
    while let Some(chunk) = field.chunk().await? {
        if buf.len() + chunk.len() > limit {
            return Err(DecodeError::Body(format!(
                "form field '{}' exceeds {} bytes",
                name, limit
            )));
        }
        buf.extend_from_slice(&chunk);
    }

    String::from_utf8(buf.to_vec())
        .map_err(|_| DecodeError::Body(format!("form field '{}' is not valid UTF-8", name)))
}
