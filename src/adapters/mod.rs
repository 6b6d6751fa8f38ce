//! Collaborator adapters
//!
//! The orchestrator owns no domain logic; it reaches six external services
//! through the contracts in [`traits`]. Two families of implementations:
//!
//! - [`http`]: remote collaborators over JSON/HTTP
//! - [`memory`]: in-process stand-ins for local runs and tests

pub mod http;
pub mod memory;
pub mod traits;

pub use traits::*;

use crate::config::{CollaboratorMode, CollaboratorSettings};
use self::http::HttpCollaborator;
use self::memory::{
    AuditSchemaRegistry, MemoryConfigStore, RecordingAnalytics, RecordingDashboard, Seed,
    StaticCost, StaticPolicy,
};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// The fixed collaborator set handed to the orchestrator
#[derive(Clone)]
pub struct Collaborators {
    pub policy: Arc<dyn PolicyAdapter>,
    pub cost: Arc<dyn CostAdapter>,
    pub analytics: Arc<dyn AnalyticsAdapter>,
    pub config: Arc<dyn ConfigAdapter>,
    pub schema: Arc<dyn SchemaAdapter>,
    pub dashboard: Arc<dyn DashboardAdapter>,
}

impl Collaborators {
    /// Build the collaborator set described by the settings
    pub async fn from_settings(settings: &CollaboratorSettings) -> AdapterResult<Self> {
        match settings.mode {
            CollaboratorMode::Memory => {
                info!("Using in-memory collaborators");
                let seed = match &settings.seed {
                    Some(path) => load_seed(path).await?,
                    None => Seed::default(),
                };
                Ok(Self::in_memory(seed).await)
            }
            CollaboratorMode::Http => {
                info!("Using HTTP collaborators");
                Self::http(settings)
            }
        }
    }

    fn http(settings: &CollaboratorSettings) -> AdapterResult<Self> {
        let endpoints = settings
            .endpoints
            .as_ref()
            .ok_or_else(|| AdapterError::configuration("collaborator URLs are not set"))?;
        let timeout = settings.timeout;

        Ok(Self {
            policy: Arc::new(HttpCollaborator::new("policy", endpoints.policy.clone(), timeout)?),
            cost: Arc::new(HttpCollaborator::new("cost", endpoints.cost.clone(), timeout)?),
            analytics: Arc::new(HttpCollaborator::new(
                "analytics",
                endpoints.analytics.clone(),
                timeout,
            )?),
            config: Arc::new(HttpCollaborator::new("config", endpoints.config.clone(), timeout)?),
            schema: Arc::new(HttpCollaborator::new("schema", endpoints.schema.clone(), timeout)?),
            dashboard: Arc::new(HttpCollaborator::new(
                "dashboard",
                endpoints.dashboard.clone(),
                timeout,
            )?),
        })
    }

    /// In-memory collaborators preloaded from a seed
    pub async fn in_memory(seed: Seed) -> Self {
        let policy = seed
            .denied_actions
            .into_iter()
            .fold(StaticPolicy::new(), |policy, action| policy.deny(action));

        let cost = StaticCost::new();
        for (resource_id, c) in seed.costs {
            cost.set_cost(resource_id, c.current, c.forecast).await;
        }

        let config = MemoryConfigStore::new();
        for (key, value) in seed.config {
            config.set(key, value).await;
        }

        Self {
            policy: Arc::new(policy),
            cost: Arc::new(cost),
            analytics: Arc::new(RecordingAnalytics::new()),
            config: Arc::new(config),
            schema: Arc::new(AuditSchemaRegistry::new()),
            dashboard: Arc::new(RecordingDashboard::new()),
        }
    }
}

async fn load_seed(path: &Path) -> AdapterResult<Seed> {
    let raw = tokio::fs::read_to_string(path).await.map_err(|e| {
        AdapterError::configuration(format!("cannot read seed {}: {}", path.display(), e))
    })?;
    let seed = serde_json::from_str(&raw).map_err(|e| {
        AdapterError::configuration(format!("invalid seed {}: {}", path.display(), e))
    })?;
    info!("Loaded collaborator seed from {}", path.display());
    Ok(seed)
}
