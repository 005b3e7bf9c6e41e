//! Streaming artifact upload pipeline
//!
//! `reader` splits the multipart body into sections, `validator` enforces the field
//! ordering rules and `builder` turns the validated upload into a [`GenerateImageMsg`]
//! whose file stream is read straight off the request body.
//!
//! [`GenerateImageMsg`]: depot_core::GenerateImageMsg

pub mod builder;
pub mod reader;
pub mod validator;

pub use builder::{build_generate_msg, FileTail, StreamFault};
pub use reader::{DecodeError, FilePart, SectionReader, UploadSection, FILE_FIELD};
pub use validator::{
    FieldValidator, SizeField, Terminal, UploadError, ValidatedUpload, ValidatorState,
    WorkingRecord,
};
