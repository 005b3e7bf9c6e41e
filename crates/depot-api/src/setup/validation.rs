//! Configuration validation
//!
//! Validates critical configuration values at startup to catch misconfigurations early.

use anyhow::Result;
use depot_core::Config;

/// Generator timeout above which a warning is logged.
const LONG_GENERATOR_TIMEOUT_SECS: u64 = 3600;

/// Validate critical configuration values
///
/// Runs the config's own checks, then warns about settings that are legal but
/// likely to be mistakes.
pub fn validate_config(config: &Config) -> Result<()> {
    config.validate()?;

    if config.is_production() && config.generator_url().starts_with("http://") {
        tracing::warn!(
            generator_url = %config.generator_url(),
            "Artifact generator is reached over plain HTTP in production"
        );
    }

    if config.generator_timeout_secs() > LONG_GENERATOR_TIMEOUT_SECS {
        tracing::warn!(
            generator_timeout_secs = config.generator_timeout_secs(),
            "Artifact generator timeout is longer than an hour"
        );
    }

    if config.max_field_bytes() as u64 > config.max_artifact_size_bytes() {
        tracing::warn!(
            max_field_bytes = config.max_field_bytes(),
            max_artifact_size_bytes = config.max_artifact_size_bytes(),
            "Form field limit is larger than the artifact size limit"
        );
    }

    Ok(())
}
