//! Service initialization

use crate::state::AppState;
use anyhow::{Context, Result};
use depot_core::{Config, ImageGenerator};
use depot_services::RemoteImageGenerator;
use std::sync::Arc;
use std::time::Duration;

/// Build the application state around the remote generation engine.
pub fn initialize_services(config: &Config) -> Result<Arc<AppState>> {
    let generator = RemoteImageGenerator::new(
        config.generator_url(),
        Duration::from_secs(config.generator_timeout_secs()),
    )
    .context("Failed to create artifact generator client")?;

    tracing::info!(
        generator_url = %generator.endpoint(),
        timeout_secs = config.generator_timeout_secs(),
        "Artifact generator client initialized"
    );

    let generator: Arc<dyn ImageGenerator> = Arc::new(generator);
    Ok(Arc::new(AppState::new(config.clone(), generator)))
}
