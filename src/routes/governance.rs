//! Governance Routes
//!
//! HTTP entry points for the four orchestrator operations. Each handler runs
//! boundary validation, then hands off to the orchestrator.

use crate::error::{validation_error, ApiResult};
use crate::models::{require_identifier, AuditSignal, GovernanceRequest, MessageResponse};
use crate::pipeline::{FinOpsSummary, GovernanceDecision, RbacContext};
use crate::state::SharedState;
use axum::{
    extract::{Path, State},
    Json,
};
use tracing::debug;
use validator::Validate;

/// Evaluate a governance request
pub async fn evaluate_governance(
    State(state): State<SharedState>,
    Json(payload): Json<GovernanceRequest>,
) -> ApiResult<Json<GovernanceDecision>> {
    payload.validate().map_err(|e| validation_error(e.to_string()))?;
    debug!("Evaluate request {}", payload.request_id);

    let decision = state.orchestrator.evaluate_governance(&payload).await?;
    Ok(Json(decision))
}

/// Resolve roles and permissions of a principal
pub async fn resolve_rbac(
    State(state): State<SharedState>,
    Path(principal): Path<String>,
) -> ApiResult<Json<RbacContext>> {
    require_identifier("principal", &principal).map_err(validation_error)?;

    let context = state.orchestrator.resolve_rbac(&principal).await?;
    Ok(Json(context))
}

/// Cost summary of a resource
pub async fn finops_summary(
    State(state): State<SharedState>,
    Path(resource_id): Path<String>,
) -> ApiResult<Json<FinOpsSummary>> {
    require_identifier("resourceId", &resource_id).map_err(validation_error)?;

    let summary = state.orchestrator.get_finops_summary(&resource_id).await?;
    Ok(Json(summary))
}

/// Validate and publish an audit signal
pub async fn emit_audit_signal(
    State(state): State<SharedState>,
    Json(payload): Json<AuditSignal>,
) -> ApiResult<Json<MessageResponse>> {
    payload.validate().map_err(|e| validation_error(e.to_string()))?;

    state.orchestrator.emit_audit_signal(&payload).await?;
    Ok(Json(MessageResponse::new("Audit signal published")))
}
