//! Artifact generation engine contract
//!
//! The engine turns a validated [`GenerateImageMsg`] into an artifact identifier.
//! Implementations live outside the request pipeline (see `depot-services`); the
//! API only depends on this single-method trait so it can run against test doubles.

use async_trait::async_trait;

use crate::models::{GenerateImageMsg, RequestContext};

/// Domain failures reported by the generation engine.
///
/// New kinds must be mapped explicitly by callers; unmapped kinds are treated as
/// internal errors.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum GenerateError {
    #[error("artifact not unique")]
    ArtifactNotUnique,

    #[error("artifact file too large")]
    ArtifactFileTooLarge,

    #[error("cannot parse artifact file: {0}")]
    ArtifactParsingFailed(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Generation engine
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    /// Generate an artifact from the request, returning its identifier.
    ///
    /// The engine owns `msg.file` and may stop reading it early; whatever it leaves
    /// unread is checked by the caller after it returns.
    async fn generate_image(
        &self,
        ctx: &RequestContext,
        msg: GenerateImageMsg,
    ) -> Result<String, GenerateError>;
}
