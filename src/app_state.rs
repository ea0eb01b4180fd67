use crate::config::AppConfig;
use crate::orchestrator::Orchestrator;
use std::sync::Arc;

/// Shared application state: immutable configuration plus the orchestrator
/// wired to the two gateway clients. No mutable state lives here; every
/// request is self-contained.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub orchestrator: Arc<Orchestrator>,
}
