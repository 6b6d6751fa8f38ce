//! Application state management
//!
//! Contains shared state accessible across all handlers. The orchestrator
//! holds only its collaborator set, so the state is immutable after startup.

use crate::pipeline::GovernanceOrchestrator;
use std::sync::Arc;

/// Application state shared across all handlers
pub struct AppState {
    /// Governance orchestrator over the configured collaborators
    pub orchestrator: GovernanceOrchestrator,

    /// Service name reported by `/health` and `/`
    pub service_name: String,
}

impl AppState {
    pub fn new(orchestrator: GovernanceOrchestrator, service_name: impl Into<String>) -> Self {
        Self {
            orchestrator,
            service_name: service_name.into(),
        }
    }
}

/// Type alias for shared state
pub type SharedState = Arc<AppState>;
