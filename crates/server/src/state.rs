//! Shared application state across all handlers.

use std::sync::Arc;

use veritas_config::Settings;
use veritas_orchestrator::Orchestrator;

#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<Orchestrator>,
    pub settings: Arc<Settings>,
}

impl AppState {
    pub fn new(orchestrator: Orchestrator, settings: Settings) -> Self {
        Self { orchestrator: Arc::new(orchestrator), settings: Arc::new(settings) }
    }
}
