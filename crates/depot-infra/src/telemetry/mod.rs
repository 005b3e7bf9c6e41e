//! Telemetry initialization
//!
//! Structured logging through `tracing`; compact console output during development
//! and JSON lines in production.

mod init_basic;

pub use init_basic::{init_telemetry, shutdown_telemetry};
