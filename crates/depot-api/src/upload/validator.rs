//! Ordered field validation
//!
//! The body is a forward-only stream, so everything the file depends on has to be
//! checked before the file part is handed over. The validator is a small state
//! machine: it stays in `CollectingFields` until a usable `size` arrives, moves to
//! `AwaitingFile`, and ends in `Terminal` on the file part.

use super::reader::{FilePart, UploadSection};

pub const NAME_FIELD: &str = "name";
pub const DESCRIPTION_FIELD: &str = "description";
pub const SIZE_FIELD: &str = "size";
pub const DEVICE_TYPES_FIELD: &str = "device_types_compatible";
pub const TYPE_FIELD: &str = "type";
pub const ARGS_FIELD: &str = "args";

/// Validation failures of the upload form.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UploadError {
    #[error("Request does not contain artifact")]
    MissingArtifact,

    #[error("No size provided before the file part of the message or the size value is wrong.")]
    SizeRequiredBeforeFile,

    #[error("The last part of the multipart/form-data message should be a file.")]
    FileSectionNotLast,

    #[error("The last part of the multipart/form-data message should be a file.")]
    TrailingDataAfterFile,

    #[error("Artifact file too large")]
    ArtifactTooLarge,

    /// A section was offered after the validator already finished.
    #[error("upload section received after validation ended ({0:?})")]
    OutOfOrder(Terminal),
}

/// State of the `size` field as last seen.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SizeField {
    #[default]
    Absent,
    Valid(u64),
    /// Raw value that is not a positive integer.
    Invalid(String),
}

impl SizeField {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().parse::<u64>() {
            Ok(size) if size > 0 => SizeField::Valid(size),
            _ => SizeField::Invalid(raw.to_string()),
        }
    }

    pub fn valid(&self) -> Option<u64> {
        match self {
            SizeField::Valid(size) => Some(*size),
            _ => None,
        }
    }
}

/// Form fields collected so far, one instance per request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkingRecord {
    pub name: Option<String>,
    pub description: Option<String>,
    pub size: SizeField,
    pub device_types_compatible: Option<String>,
    pub artifact_type: Option<String>,
    pub args: Option<String>,
}

impl WorkingRecord {
    /// Store a field value; later values overwrite earlier ones.
    /// Returns `false` for field names the form does not know.
    fn set(&mut self, name: &str, value: String) -> bool {
        match name {
            NAME_FIELD => self.name = Some(value),
            DESCRIPTION_FIELD => self.description = Some(value),
            SIZE_FIELD => self.size = SizeField::parse(&value),
            DEVICE_TYPES_FIELD => self.device_types_compatible = Some(value),
            TYPE_FIELD => self.artifact_type = Some(value),
            ARGS_FIELD => self.args = Some(value),
            _ => return false,
        }
        true
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Terminal {
    Success,
    Failure,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidatorState {
    /// No valid `size` seen yet.
    CollectingFields,
    /// A valid `size` is on record; more fields may still arrive.
    AwaitingFile,
    Terminal(Terminal),
}

/// Upload whose fields passed validation, positioned at the start of the file data.
///
/// Only [`FieldValidator`] can produce one.
#[derive(Debug)]
pub struct ValidatedUpload {
    record: WorkingRecord,
    size: u64,
    file: FilePart,
}

impl ValidatedUpload {
    pub fn record(&self) -> &WorkingRecord {
        &self.record
    }

    /// Declared artifact size in bytes, always positive.
    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn file(&self) -> &FilePart {
        &self.file
    }

    pub(crate) fn into_parts(self) -> (WorkingRecord, u64, FilePart) {
        (self.record, self.size, self.file)
    }
}

/// Consumes upload sections in body order.
#[derive(Debug)]
pub struct FieldValidator {
    state: ValidatorState,
    record: WorkingRecord,
}

impl Default for FieldValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldValidator {
    pub fn new() -> Self {
        Self {
            state: ValidatorState::CollectingFields,
            record: WorkingRecord::default(),
        }
    }

    pub fn state(&self) -> ValidatorState {
        self.state
    }

    pub fn record(&self) -> &WorkingRecord {
        &self.record
    }

    /// Feed the next section.
    ///
    /// Returns `Ok(None)` while more sections are expected, and the validated upload
    /// once the file section is accepted.
    pub fn accept(
        &mut self,
        section: UploadSection,
    ) -> Result<Option<ValidatedUpload>, UploadError> {
        if let ValidatorState::Terminal(terminal) = self.state {
            return Err(UploadError::OutOfOrder(terminal));
        }

        match section {
            UploadSection::Field { name, value } => {
                self.accept_field(&name, value);
                Ok(None)
            }
            UploadSection::File(file) => self.accept_file(file).map(Some),
        }
    }

    /// The body ended; report why no upload was produced.
    pub fn finish(&mut self) -> UploadError {
        match self.state {
            ValidatorState::Terminal(terminal) => UploadError::OutOfOrder(terminal),
            _ => self.fail(UploadError::MissingArtifact),
        }
    }

    fn accept_field(&mut self, name: &str, value: String) {
        if !self.record.set(name, value) {
            tracing::debug!(field = %name, "Ignoring unknown form field");
            return;
        }

        if name == SIZE_FIELD {
            self.state = match self.record.size {
                SizeField::Valid(_) => ValidatorState::AwaitingFile,
                _ => ValidatorState::CollectingFields,
            };
        }
    }

    fn accept_file(&mut self, file: FilePart) -> Result<ValidatedUpload, UploadError> {
        let size = match (self.state, self.record.size.valid()) {
            (ValidatorState::AwaitingFile, Some(size)) => size,
            _ => return Err(self.fail(UploadError::SizeRequiredBeforeFile)),
        };

        if file.content_type().is_none() {
            return Err(self.fail(UploadError::FileSectionNotLast));
        }

        self.state = ValidatorState::Terminal(Terminal::Success);
        Ok(ValidatedUpload {
            record: std::mem::take(&mut self.record),
            size,
            file,
        })
    }

    fn fail(&mut self, err: UploadError) -> UploadError {
        self.state = ValidatorState::Terminal(Terminal::Failure);
        err
    }
}
