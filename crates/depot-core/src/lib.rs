//! Depot Core Library
//!
//! This crate provides the error types, configuration, generation request models and
//! the generation engine contract shared by all Depot components.

pub mod config;
pub mod error;
pub mod generator;
pub mod models;

// Re-export commonly used types
pub use config::{BaseConfig, Config, GenerationConfig};
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use generator::{GenerateError, ImageGenerator};
pub use models::{ArtifactStream, GenerateImageMsg, RequestContext};
