use std::sync::Arc;
use transcriptor_core::{Config, JobRegistry};

/// Shared application state
pub struct AppState {
    config: Config,
    registry: Arc<JobRegistry>,
}

impl AppState {
    pub fn new(config: Config, registry: Arc<JobRegistry>) -> Self {
        Self { config, registry }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn registry(&self) -> &JobRegistry {
        &self.registry
    }
}
