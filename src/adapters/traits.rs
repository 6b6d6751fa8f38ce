//! Collaborator contracts
//!
//! Every external service the orchestrator talks to is reached through one of
//! the traits below. Implementations answer with an [`AdapterResult`], which is
//! the two-variant form of the `{success, data, error, metadata}` envelope the
//! collaborators speak on the wire.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Result alias used by collaborator adapters.
pub type AdapterResult<T> = Result<T, AdapterError>;

/// Default message when a collaborator fails without saying why.
pub const DEFAULT_FAILURE_REASON: &str = "collaborator reported failure";

/// Schema id the schema registry validates audit signals against.
pub const AUDIT_SIGNAL_SCHEMA: &str = "audit.signal.v1";

/// Collaborator failures
#[derive(Debug, Error)]
pub enum AdapterError {
    /// The collaborator answered with `success: false`.
    #[error("{reason}")]
    Rejected { reason: String },

    /// The collaborator reported success but sent no payload.
    #[error("collaborator returned no data")]
    MissingPayload,

    /// Network or protocol failure reaching the collaborator.
    #[error("collaborator transport error: {reason}")]
    Transport { reason: String },

    /// The collaborator answered with something we could not decode.
    #[error("collaborator response error: {reason}")]
    Response { reason: String },

    /// Adapter is missing configuration (base URL, client, ...).
    #[error("collaborator not configured: {reason}")]
    Configuration { reason: String },
}

impl AdapterError {
    pub fn rejected(reason: impl Into<String>) -> Self {
        Self::Rejected {
            reason: reason.into(),
        }
    }

    pub fn transport(reason: impl Into<String>) -> Self {
        Self::Transport {
            reason: reason.into(),
        }
    }

    pub fn response(reason: impl Into<String>) -> Self {
        Self::Response {
            reason: reason.into(),
        }
    }

    pub fn configuration(reason: impl Into<String>) -> Self {
        Self::Configuration {
            reason: reason.into(),
        }
    }
}

// =============================================================================
// ENVELOPE
// =============================================================================

/// Uniform response envelope returned by every collaborator
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdapterResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,
}

impl<T> AdapterResponse<T> {
    /// Collapse the envelope, requiring a payload on success.
    pub fn into_result(self) -> AdapterResult<T> {
        if !self.success {
            return Err(AdapterError::rejected(
                self.error
                    .unwrap_or_else(|| DEFAULT_FAILURE_REASON.to_string()),
            ));
        }
        self.data.ok_or(AdapterError::MissingPayload)
    }

    /// Collapse the envelope of a void operation, ignoring any payload.
    pub fn into_unit(self) -> AdapterResult<()> {
        if self.success {
            Ok(())
        } else {
            Err(AdapterError::rejected(
                self.error
                    .unwrap_or_else(|| DEFAULT_FAILURE_REASON.to_string()),
            ))
        }
    }
}

// =============================================================================
// PAYLOADS
// =============================================================================

/// Query sent to the policy engine
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyQuery {
    pub principal: String,
    pub action: String,
    pub resource: String,
    pub context: Map<String, Value>,
}

/// Raw policy engine verdict
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyVerdict {
    pub allowed: bool,
    #[serde(default)]
    pub reasons: Vec<String>,
    #[serde(default)]
    pub applied_policies: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CostMetricsQuery {
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub services: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CostMetrics {
    pub total_cost: f64,
    #[serde(default)]
    pub currency: String,
    #[serde(default)]
    pub period: Option<String>,
    #[serde(default)]
    pub breakdown: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastQuery {
    pub horizon_days: u32,
    pub services: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CostForecast {
    pub projected_cost: f64,
    #[serde(default)]
    pub confidence: Option<f64>,
    #[serde(default)]
    pub period: Option<String>,
}

/// Analytics event record
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsEvent {
    pub event_name: String,
    pub timestamp: DateTime<Utc>,
    pub properties: Map<String, Value>,
    pub user_id: Option<String>,
}

/// Versioned configuration entry
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigEntry {
    pub key: String,
    pub value: Value,
    pub version: u64,
    pub last_updated: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SchemaViolation {
    pub path: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaValidation {
    pub valid: bool,
    #[serde(default)]
    pub errors: Vec<SchemaViolation>,
}

/// Dashboard event severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventSeverity {
    Info,
    Warning,
}

/// Event published to the dashboard
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GovernanceEvent {
    pub event_type: String,
    pub severity: EventSeverity,
    pub timestamp: DateTime<Utc>,
    pub details: Value,
}

// =============================================================================
// CONTRACTS
// =============================================================================

#[async_trait]
pub trait PolicyAdapter: Send + Sync {
    async fn evaluate_policy(&self, query: &PolicyQuery) -> AdapterResult<PolicyVerdict>;
}

#[async_trait]
pub trait CostAdapter: Send + Sync {
    async fn get_cost_metrics(&self, query: &CostMetricsQuery) -> AdapterResult<CostMetrics>;

    async fn get_forecast(&self, query: &ForecastQuery) -> AdapterResult<CostForecast>;
}

#[async_trait]
pub trait AnalyticsAdapter: Send + Sync {
    async fn track(&self, event: &AnalyticsEvent) -> AdapterResult<()>;
}

#[async_trait]
pub trait ConfigAdapter: Send + Sync {
    async fn get_config(&self, key: &str) -> AdapterResult<ConfigEntry>;
}

#[async_trait]
pub trait SchemaAdapter: Send + Sync {
    async fn validate(&self, schema_id: &str, data: &Value) -> AdapterResult<SchemaValidation>;
}

#[async_trait]
pub trait DashboardAdapter: Send + Sync {
    async fn publish_event(&self, event: &GovernanceEvent) -> AdapterResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_failed_envelope_carries_collaborator_message() {
        let envelope: AdapterResponse<PolicyVerdict> =
            serde_json::from_value(json!({ "success": false, "error": "engine offline" })).unwrap();
        let err = envelope.into_result().unwrap_err();
        assert_eq!(err.to_string(), "engine offline");
    }

    #[test]
    fn test_failed_envelope_without_message_uses_default() {
        let envelope: AdapterResponse<PolicyVerdict> =
            serde_json::from_value(json!({ "success": false })).unwrap();
        let err = envelope.into_result().unwrap_err();
        assert_eq!(err.to_string(), DEFAULT_FAILURE_REASON);
    }

    #[test]
    fn test_success_without_data_is_missing_payload() {
        let envelope: AdapterResponse<CostMetrics> =
            serde_json::from_value(json!({ "success": true })).unwrap();
        assert!(matches!(envelope.into_result(), Err(AdapterError::MissingPayload)));
    }

    #[test]
    fn test_void_operation_ignores_payload() {
        let envelope: AdapterResponse<Value> =
            serde_json::from_value(json!({ "success": true, "metadata": { "latencyMs": 3 } }))
                .unwrap();
        assert!(envelope.into_unit().is_ok());
    }

    #[test]
    fn test_policy_verdict_decodes_camel_case() {
        let verdict: PolicyVerdict = serde_json::from_value(json!({
            "allowed": true,
            "reasons": ["matched rule"],
            "appliedPolicies": ["p-1"]
        }))
        .unwrap();
        assert!(verdict.allowed);
        assert_eq!(verdict.applied_policies, vec!["p-1".to_string()]);
    }
}
