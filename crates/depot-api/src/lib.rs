//! Depot API Library
//!
//! This crate provides the artifact generation HTTP handler, the streaming upload
//! pipeline behind it, and application setup.

// Module declarations
mod api_doc;
pub mod constants;
mod handlers;
mod middleware;
pub mod setup;
pub mod upload;

// Public modules
pub mod error;
pub mod state;

// Re-exports
pub use error::{ErrorResponse, HttpAppError};
pub use state::AppState;
