//! Artifact generation request models

use std::fmt;
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::{Bytes, BytesMut};
use futures::stream::{self, BoxStream};
use futures::{Stream, StreamExt, TryStreamExt};

/// Per-request information handed to the generation engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    request_id: String,
}

impl RequestContext {
    pub fn new(request_id: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
        }
    }

    pub fn request_id(&self) -> &str {
        &self.request_id
    }
}

/// Forward-only byte stream of the uploaded artifact file.
///
/// The stream is read straight off the request body. It can be consumed once;
/// dropping it releases the underlying connection.
pub struct ArtifactStream {
    inner: BoxStream<'static, io::Result<Bytes>>,
}

impl ArtifactStream {
    pub fn new<S>(stream: S) -> Self
    where
        S: Stream<Item = io::Result<Bytes>> + Send + 'static,
    {
        Self {
            inner: stream.boxed(),
        }
    }

    /// In-memory stream, mostly useful for engines under test.
    pub fn from_bytes(data: impl Into<Bytes>) -> Self {
        Self::new(stream::once(futures::future::ready(Ok(data.into()))))
    }

    /// Drain the whole stream into memory.
    pub async fn collect_bytes(self) -> io::Result<Bytes> {
        let buf = self
            .inner
            .try_fold(BytesMut::new(), |mut buf, chunk| async move {
                buf.extend_from_slice(&chunk);
                Ok(buf)
            })
            .await?;
        Ok(buf.freeze())
    }
}

impl Stream for ArtifactStream {
    type Item = io::Result<Bytes>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inner.as_mut().poll_next(cx)
    }
}

impl fmt::Debug for ArtifactStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArtifactStream").finish_non_exhaustive()
    }
}

/// A validated artifact generation request.
///
/// Absent optional form fields are carried as empty strings.
#[derive(Debug)]
pub struct GenerateImageMsg {
    pub name: String,
    pub description: String,
    /// Declared size of the artifact file in bytes; always positive
    pub size: u64,
    pub device_types_compatible: String,
    pub artifact_type: String,
    pub args: String,
    /// Content type of the file part
    pub content_type: String,
    pub file: ArtifactStream,
}

impl GenerateImageMsg {
    /// Compatible device types as a list (comma separated in the form).
    pub fn device_types(&self) -> Vec<&str> {
        self.device_types_compatible
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn msg(device_types: &str) -> GenerateImageMsg {
        GenerateImageMsg {
            name: "name".to_string(),
            description: String::new(),
            size: 3,
            device_types_compatible: device_types.to_string(),
            artifact_type: "single_file".to_string(),
            args: String::new(),
            content_type: "application/octet-stream".to_string(),
            file: ArtifactStream::from_bytes("abc"),
        }
    }

    #[test]
    fn test_device_types_split() {
        assert_eq!(
            msg("Beagle Bone, raspberrypi4,,").device_types(),
            vec!["Beagle Bone", "raspberrypi4"]
        );
        assert!(msg("").device_types().is_empty());
    }

    #[tokio::test]
    async fn test_collect_bytes_joins_chunks() {
        let chunks = vec![Ok(Bytes::from_static(b"123")), Ok(Bytes::from_static(b"45"))];
        let stream = ArtifactStream::new(stream::iter(chunks));
        assert_eq!(stream.collect_bytes().await.unwrap(), Bytes::from_static(b"12345"));
    }

    #[tokio::test]
    async fn test_collect_bytes_surfaces_errors() {
        let chunks = vec![
            Ok(Bytes::from_static(b"123")),
            Err(io::Error::other("connection reset")),
        ];
        let stream = ArtifactStream::new(stream::iter(chunks));
        let err = stream.collect_bytes().await.unwrap_err();
        assert_eq!(err.to_string(), "connection reset");
    }
}
