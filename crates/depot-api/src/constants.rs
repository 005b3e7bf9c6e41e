//! API constants
//!
//! All versioned routes live under [`API_PREFIX`].

/// API base path prefix (version-independent)
pub const API_BASE: &str = "/api";

/// Current API version
pub const API_VERSION: &str = "v1";

/// Versioned prefix for all API routes, e.g. `/api/v1`
pub const API_PREFIX: &str = "/api/v1";

/// Path of the artifact generation endpoint relative to [`API_PREFIX`]
pub const GENERATE_ARTIFACT_PATH: &str = "/artifacts/generate";
