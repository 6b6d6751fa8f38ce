//! Test fixture wiring the orchestrator to in-memory collaborators

use crate::adapters::memory::{
    AuditSchemaRegistry, MemoryConfigStore, RecordingAnalytics, RecordingDashboard, StaticCost,
    StaticPolicy,
};
use crate::adapters::Collaborators;
use crate::models::GovernanceRequest;
use crate::pipeline::GovernanceOrchestrator;
use std::sync::Arc;

/// Handles on every in-memory collaborator behind one orchestrator
pub struct Harness {
    pub policy: Arc<StaticPolicy>,
    pub cost: Arc<StaticCost>,
    pub analytics: Arc<RecordingAnalytics>,
    pub config: Arc<MemoryConfigStore>,
    pub schema: Arc<AuditSchemaRegistry>,
    pub dashboard: Arc<RecordingDashboard>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_policy(StaticPolicy::new())
    }

    pub fn with_policy(policy: StaticPolicy) -> Self {
        Self {
            policy: Arc::new(policy),
            cost: Arc::new(StaticCost::new()),
            analytics: Arc::new(RecordingAnalytics::new()),
            config: Arc::new(MemoryConfigStore::new()),
            schema: Arc::new(AuditSchemaRegistry::new()),
            dashboard: Arc::new(RecordingDashboard::new()),
        }
    }

    pub fn collaborators(&self) -> Collaborators {
        Collaborators {
            policy: self.policy.clone(),
            cost: self.cost.clone(),
            analytics: self.analytics.clone(),
            config: self.config.clone(),
            schema: self.schema.clone(),
            dashboard: self.dashboard.clone(),
        }
    }

    pub fn orchestrator(&self) -> GovernanceOrchestrator {
        GovernanceOrchestrator::new(self.collaborators())
    }
}

pub fn request(request_id: &str, action: &str) -> GovernanceRequest {
    GovernanceRequest {
        request_id: request_id.to_string(),
        resource_id: "db-prod".to_string(),
        action: action.to_string(),
        principal: "alice".to_string(),
        context: None,
    }
}
