//! Result types produced by the governance pipeline

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Policy verdict as exposed to callers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyEvaluationResult {
    pub allowed: bool,
    pub policies: Vec<String>,
    pub reasons: Vec<String>,
}

/// Forecast cost relative to current cost
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BudgetStatus {
    Within,
    Warning,
    Exceeded,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinOpsSummary {
    pub resource_id: String,
    pub current_cost: f64,
    pub forecast: f64,
    pub budget_status: BudgetStatus,
}

/// Final answer of a governance evaluation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GovernanceDecision {
    pub request_id: String,
    pub allowed: bool,
    pub policy_results: PolicyEvaluationResult,
    /// Absent when cost lookup failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cost_impact: Option<FinOpsSummary>,
    pub audit_id: String,
}

/// Roles and effective permissions of a principal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RbacContext {
    pub principal: String,
    pub roles: Vec<String>,
    pub permissions: BTreeSet<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
}

impl RbacContext {
    /// Valid context for a principal with no role mapping
    pub fn empty(principal: impl Into<String>) -> Self {
        Self {
            principal: principal.into(),
            roles: Vec::new(),
            permissions: BTreeSet::new(),
            scope: None,
        }
    }
}
