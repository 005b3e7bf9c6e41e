//! Domain models

pub mod generate;

pub use generate::{ArtifactStream, GenerateImageMsg, RequestContext};
