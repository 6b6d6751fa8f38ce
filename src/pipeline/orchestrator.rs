//! Orchestrator - sequences collaborator calls into one governance decision
//!
//! Evaluation order is fixed: policy, cost, analytics, audit. Later steps
//! consume earlier results, so the steps never overlap. Only the cost step is
//! best-effort; every other collaborator failure fails the operation.

use crate::adapters::{
    AdapterError, AnalyticsEvent, Collaborators, EventSeverity, GovernanceEvent, PolicyQuery,
    AUDIT_SIGNAL_SCHEMA,
};
use crate::error::GovernanceError;
use crate::models::{parse_iso8601, AuditOutcome, AuditSignal, GovernanceRequest};
use crate::pipeline::types::{GovernanceDecision, PolicyEvaluationResult};
use chrono::{SecondsFormat, Utc};
use serde_json::{json, Map, Value};
use thiserror::Error;
use tracing::{debug, info, warn};

pub const EVALUATION_EVENT: &str = "governance.evaluation";
pub const AUDIT_EVENT_TYPE: &str = "audit.signal";

/// Why an evaluation stopped before producing a decision
#[derive(Debug, Error)]
enum EvaluationFailure {
    #[error("Policy evaluation failed: {0}")]
    Policy(AdapterError),

    #[error(transparent)]
    Audit(#[from] GovernanceError),
}

/// Why an audit signal was not published
#[derive(Debug, Error)]
enum AuditFailure {
    #[error("Audit signal validation failed: {0}")]
    Validation(String),

    #[error("invalid audit timestamp '{timestamp}': {source}")]
    Timestamp {
        timestamp: String,
        source: chrono::ParseError,
    },

    #[error("Dashboard publish failed: {0}")]
    Publish(AdapterError),

    #[error("could not encode audit signal: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Coordinates the six collaborators; holds no other state
#[derive(Clone)]
pub struct GovernanceOrchestrator {
    pub(crate) collaborators: Collaborators,
}

impl GovernanceOrchestrator {
    pub fn new(collaborators: Collaborators) -> Self {
        Self { collaborators }
    }

    /// Evaluate an action on a resource by a principal
    pub async fn evaluate_governance(
        &self,
        request: &GovernanceRequest,
    ) -> Result<GovernanceDecision, GovernanceError> {
        self.run_evaluation(request)
            .await
            .map_err(|cause| GovernanceError::Evaluation(cause.to_string()))
    }

    async fn run_evaluation(
        &self,
        request: &GovernanceRequest,
    ) -> Result<GovernanceDecision, EvaluationFailure> {
        debug!(
            "Evaluating {} on {} by {} ({})",
            request.action, request.resource_id, request.principal, request.request_id
        );

        let query = PolicyQuery {
            principal: request.principal.clone(),
            action: request.action.clone(),
            resource: request.resource_id.clone(),
            context: request.context_map(),
        };
        let verdict = self
            .collaborators
            .policy
            .evaluate_policy(&query)
            .await
            .map_err(EvaluationFailure::Policy)?;

        let policy_results = PolicyEvaluationResult {
            allowed: verdict.allowed,
            policies: verdict.applied_policies,
            reasons: verdict.reasons,
        };

        let cost_impact = match self.get_finops_summary(&request.resource_id).await {
            Ok(summary) => Some(summary),
            Err(e) => {
                warn!(
                    "Cost impact unavailable for {} ({}): {}",
                    request.resource_id, request.request_id, e
                );
                None
            }
        };

        self.track_evaluation(request, policy_results.allowed).await;

        let audited_at = Utc::now();
        let audit_id = format!("audit-{}-{}", request.request_id, audited_at.timestamp_millis());
        let signal = AuditSignal {
            timestamp: audited_at.to_rfc3339_opts(SecondsFormat::Millis, true),
            action: request.action.clone(),
            principal: request.principal.clone(),
            resource: request.resource_id.clone(),
            outcome: AuditOutcome::from_allowed(policy_results.allowed),
            metadata: Some(json!({
                "requestId": request.request_id,
                "policies": policy_results.policies,
                "reasons": policy_results.reasons,
            })),
            extra: Map::new(),
        };
        self.emit_audit_signal(&signal).await?;

        info!(
            "Request {} {} ({})",
            request.request_id,
            if policy_results.allowed { "allowed" } else { "denied" },
            audit_id
        );

        Ok(GovernanceDecision {
            request_id: request.request_id.clone(),
            allowed: policy_results.allowed,
            policy_results,
            cost_impact,
            audit_id,
        })
    }

    /// Record the evaluation; the outcome never affects the decision
    async fn track_evaluation(&self, request: &GovernanceRequest, allowed: bool) {
        let mut properties = Map::new();
        properties.insert("requestId".into(), Value::from(request.request_id.clone()));
        properties.insert("resourceId".into(), Value::from(request.resource_id.clone()));
        properties.insert("action".into(), Value::from(request.action.clone()));
        properties.insert("principal".into(), Value::from(request.principal.clone()));
        properties.insert("allowed".into(), Value::from(allowed));

        let event = AnalyticsEvent {
            event_name: EVALUATION_EVENT.to_string(),
            timestamp: Utc::now(),
            properties,
            user_id: Some(request.principal.clone()),
        };

        if let Err(e) = self.collaborators.analytics.track(&event).await {
            debug!("Analytics tracking for {} not recorded: {}", request.request_id, e);
        }
    }

    /// Validate an audit signal and publish it to the dashboard
    pub async fn emit_audit_signal(&self, signal: &AuditSignal) -> Result<(), GovernanceError> {
        self.publish_audit_signal(signal)
            .await
            .map_err(|cause| GovernanceError::AuditEmission(cause.to_string()))
    }

    async fn publish_audit_signal(&self, signal: &AuditSignal) -> Result<(), AuditFailure> {
        let payload = serde_json::to_value(signal)?;

        let validation = self
            .collaborators
            .schema
            .validate(AUDIT_SIGNAL_SCHEMA, &payload)
            .await
            .map_err(|e| AuditFailure::Validation(e.to_string()))?;

        if !validation.valid {
            let messages: Vec<String> = validation.errors.into_iter().map(|e| e.message).collect();
            return Err(AuditFailure::Validation(messages.join(", ")));
        }

        let timestamp = parse_iso8601(&signal.timestamp).map_err(|source| AuditFailure::Timestamp {
            timestamp: signal.timestamp.clone(),
            source,
        })?;

        let severity = match signal.outcome {
            AuditOutcome::Denied => EventSeverity::Warning,
            AuditOutcome::Allowed => EventSeverity::Info,
        };

        let event = GovernanceEvent {
            event_type: AUDIT_EVENT_TYPE.to_string(),
            severity,
            timestamp,
            details: payload,
        };

        self.collaborators
            .dashboard
            .publish_event(&event)
            .await
            .map_err(AuditFailure::Publish)?;

        debug!("Published audit signal for {} on {}", signal.principal, signal.resource);
        Ok(())
    }
}
