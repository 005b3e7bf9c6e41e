//! Depot Services Layer
//!
//! This crate hosts the clients for the services the API delegates to. Today that is
//! the remote artifact generator; the HTTP handling itself stays in depot-api.

pub mod services;

pub use services::RemoteImageGenerator;
