//! Generation request assembly
//!
//! The file part is handed to the engine as a lazy stream. While the engine reads it
//! the stream enforces the artifact size limit and, once the part is exhausted, checks
//! that nothing follows it in the body. Problems found this way end the stream with an
//! I/O error and are recorded for the handler, which reports them instead of whatever
//! the engine made of the failed read.
//!
//! The engine may stop reading before the end of the part. [`FileTail`] keeps a handle
//! on the same cursor so the handler can finish the part and check the rest of the
//! body once the engine is done with it.

use std::io;
use std::sync::Arc;

use bytes::Bytes;
use depot_core::{ArtifactStream, GenerateImageMsg};
use futures::stream;
use multer::Field;
use tokio::sync::Mutex;

use super::reader::SectionReader;
use super::validator::{UploadError, ValidatedUpload};

/// Problem detected while streaming the artifact file.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StreamFault {
    #[error("artifact file exceeds the maximum size of {limit} bytes")]
    TooLarge { limit: u64 },

    #[error("unexpected section after the artifact file")]
    TrailingSection,

    #[error("failed to read artifact file: {0}")]
    Transport(String),
}

struct FileCursor {
    field: Option<Field<'static>>,
    reader: SectionReader,
    read: u64,
    limit: u64,
    /// Set once the part and the rest of the body have been checked.
    done: bool,
    /// First fault wins.
    fault: Option<StreamFault>,
}

impl FileCursor {
    async fn next_chunk(&mut self) -> Option<io::Result<Bytes>> {
        if self.done {
            return None;
        }
        let next = match self.field.as_mut() {
            Some(field) => field.chunk().await,
            None => return None,
        };

        match next {
            Ok(Some(chunk)) => {
                self.read += chunk.len() as u64;
                if self.read > self.limit {
                    let limit = self.limit;
                    return Some(self.fail(StreamFault::TooLarge { limit }));
                }
                Some(Ok(chunk))
            }
            Ok(None) => {
                // Release the part so the reader can look past it.
                self.field = None;
                self.done = true;
                match self.reader.has_more_sections().await {
                    Ok(false) => None,
                    Ok(true) => Some(self.fail(StreamFault::TrailingSection)),
                    Err(e) => Some(self.fail(StreamFault::Transport(e.to_string()))),
                }
            }
            Err(e) => Some(self.fail(StreamFault::Transport(e.to_string()))),
        }
    }

    fn fail(&mut self, fault: StreamFault) -> io::Result<Bytes> {
        tracing::debug!(fault = %fault, bytes_read = self.read, "Artifact stream aborted");
        self.field = None;
        self.done = true;
        let err = io::Error::other(fault.to_string());
        self.record(fault);
        Err(err)
    }

    fn record(&mut self, fault: StreamFault) {
        self.fault.get_or_insert(fault);
    }
}

/// Handler side of the artifact stream handed to the engine.
pub struct FileTail(Arc<Mutex<FileCursor>>);

impl std::fmt::Debug for FileTail {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileTail").finish_non_exhaustive()
    }
}

impl FileTail {
    /// Fault recorded while the engine was reading, if any.
    pub async fn fault(&self) -> Option<StreamFault> {
        self.0.lock().await.fault.take()
    }

    /// Read whatever the engine left of the file part, check that no section follows
    /// it, and return the first fault seen.
    pub async fn finish(&self) -> Option<StreamFault> {
        let mut cursor = self.0.lock().await;
        let mut skipped = 0u64;
        while let Some(chunk) = cursor.next_chunk().await {
            match chunk {
                Ok(data) => skipped += data.len() as u64,
                Err(_) => break,
            }
        }
        if skipped > 0 {
            tracing::debug!(skipped, "Artifact bytes left unread by the engine");
        }
        cursor.fault.take()
    }
}

/// Build the engine request from a validated upload.
///
/// `reader` must be the reader the upload came from; it is kept alive by the file
/// stream. Absent optional fields become empty strings.
pub fn build_generate_msg(
    upload: ValidatedUpload,
    reader: SectionReader,
    max_artifact_bytes: u64,
) -> Result<(GenerateImageMsg, FileTail), UploadError> {
    let (record, size, file) = upload.into_parts();
    if size > max_artifact_bytes {
        tracing::debug!(
            size,
            max_artifact_bytes,
            "Declared artifact size exceeds the limit"
        );
        return Err(UploadError::ArtifactTooLarge);
    }

    let content_type = file.content_type().unwrap_or_default().to_string();
    let cursor = Arc::new(Mutex::new(FileCursor {
        field: Some(file.into_field()),
        reader,
        read: 0,
        limit: max_artifact_bytes,
        done: false,
        fault: None,
    }));
    let file = ArtifactStream::new(stream::unfold(cursor.clone(), |cursor| async move {
        let chunk = cursor.lock().await.next_chunk().await;
        chunk.map(|chunk| (chunk, cursor))
    }));

    let msg = GenerateImageMsg {
        name: record.name.unwrap_or_default(),
        description: record.description.unwrap_or_default(),
        size,
        device_types_compatible: record.device_types_compatible.unwrap_or_default(),
        artifact_type: record.artifact_type.unwrap_or_default(),
        args: record.args.unwrap_or_default(),
        content_type,
        file,
    };

    Ok((msg, FileTail(cursor)))
}
