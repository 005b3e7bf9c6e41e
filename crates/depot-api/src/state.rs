//! Application state shared by all handlers.

use depot_core::{Config, ImageGenerator};
use std::sync::Arc;

pub struct AppState {
    pub config: Config,
    /// Generation engine; the only dependency shared across requests
    pub generator: Arc<dyn ImageGenerator>,
}

impl AppState {
    pub fn new(config: Config, generator: Arc<dyn ImageGenerator>) -> Self {
        Self { config, generator }
    }
}
