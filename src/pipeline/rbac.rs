//! RBAC resolution - roles of a principal and the permissions they grant
//!
//! Role mappings live in the configuration collaborator:
//!
//! - `rbac.roles.<principal>` → `{ "roles": [..], "scope": ".." }`
//! - `rbac.permissions.<role>` → `{ "permissions": [..] }` or a bare array

use crate::error::GovernanceError;
use crate::pipeline::orchestrator::GovernanceOrchestrator;
use crate::pipeline::types::RbacContext;
use futures::future::join_all;
use serde_json::Value;
use std::collections::BTreeSet;
use tracing::debug;

pub fn roles_key(principal: &str) -> String {
    format!("rbac.roles.{}", principal)
}

pub fn permissions_key(role: &str) -> String {
    format!("rbac.permissions.{}", role)
}

impl GovernanceOrchestrator {
    /// Resolve roles and the union of their permissions
    ///
    /// Unknown principals resolve to an empty context, and a role whose
    /// permissions cannot be looked up contributes nothing.
    pub async fn resolve_rbac(&self, principal: &str) -> Result<RbacContext, GovernanceError> {
        let entry = match self.collaborators.config.get_config(&roles_key(principal)).await {
            Ok(entry) if !entry.value.is_null() => entry,
            Ok(_) => return Ok(RbacContext::empty(principal)),
            Err(e) => {
                debug!("No role mapping for {}: {}", principal, e);
                return Ok(RbacContext::empty(principal));
            }
        };

        let roles = string_list(entry.value.get("roles"), "roles").map_err(GovernanceError::Rbac)?;
        let scope = entry
            .value
            .get("scope")
            .and_then(Value::as_str)
            .map(str::to_string);

        let lookups = roles.iter().map(|role| self.role_permissions(role));
        let mut permissions = BTreeSet::new();
        for granted in join_all(lookups).await {
            permissions.extend(granted.map_err(GovernanceError::Rbac)?);
        }

        debug!(
            "Resolved {} role(s) and {} permission(s) for {}",
            roles.len(),
            permissions.len(),
            principal
        );

        Ok(RbacContext {
            principal: principal.to_string(),
            roles,
            permissions,
            scope,
        })
    }

    /// Permissions granted by one role; a failed lookup grants none
    async fn role_permissions(&self, role: &str) -> Result<Vec<String>, String> {
        match self.collaborators.config.get_config(&permissions_key(role)).await {
            Ok(entry) => match &entry.value {
                Value::Array(_) => string_list(Some(&entry.value), "permissions"),
                Value::Object(map) => string_list(map.get("permissions"), "permissions"),
                Value::Null => Ok(Vec::new()),
                _ => Err(format!("permissions for role '{}' must be an array or object", role)),
            },
            Err(e) => {
                debug!("No permissions for role {}: {}", role, e);
                Ok(Vec::new())
            }
        }
    }
}

/// Absent or null means empty; anything but an array of strings is malformed
fn string_list(value: Option<&Value>, field: &str) -> Result<Vec<String>, String> {
    match value {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| {
                item.as_str()
                    .map(str::to_string)
                    .ok_or_else(|| format!("{} must contain only strings", field))
            })
            .collect(),
        Some(_) => Err(format!("{} must be an array of strings", field)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::testing::Harness;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    async fn seeded() -> Harness {
        let harness = Harness::new();
        harness
            .config
            .set(roles_key("alice"), json!({ "roles": ["admin", "developer"], "scope": "org:acme" }))
            .await;
        harness
            .config
            .set(permissions_key("admin"), json!({ "permissions": ["read", "write", "delete"] }))
            .await;
        harness
            .config
            .set(permissions_key("developer"), json!(["read", "write"]))
            .await;
        harness
    }

    #[tokio::test]
    async fn test_permissions_are_deduplicated_union() {
        let harness = seeded().await;
        let context = harness.orchestrator().resolve_rbac("alice").await.unwrap();

        assert_eq!(context.roles, vec!["admin".to_string(), "developer".to_string()]);
        assert_eq!(context.permissions.len(), 3);
        assert_eq!(
            context.permissions,
            ["delete", "read", "write"].iter().map(|s| s.to_string()).collect::<BTreeSet<_>>()
        );
        assert_eq!(context.scope.as_deref(), Some("org:acme"));
    }

    #[tokio::test]
    async fn test_unknown_principal_is_empty_context() {
        let harness = seeded().await;
        let context = harness.orchestrator().resolve_rbac("mallory").await.unwrap();

        assert_eq!(context, RbacContext::empty("mallory"));
    }

    #[tokio::test]
    async fn test_config_outage_is_empty_context() {
        let harness = seeded().await;
        harness.config.set_outage(true);

        let context = harness.orchestrator().resolve_rbac("alice").await.unwrap();
        assert!(context.roles.is_empty());
        assert!(context.permissions.is_empty());
    }

    #[tokio::test]
    async fn test_missing_role_permissions_degrade_to_empty() {
        let harness = seeded().await;
        harness
            .config
            .set(roles_key("bob"), json!({ "roles": ["developer", "ghost"] }))
            .await;

        let context = harness.orchestrator().resolve_rbac("bob").await.unwrap();
        assert_eq!(context.roles.len(), 2);
        assert_eq!(
            context.permissions,
            ["read", "write"].iter().map(|s| s.to_string()).collect::<BTreeSet<_>>()
        );
        assert!(context.scope.is_none());
    }

    #[tokio::test]
    async fn test_mapping_without_roles_field() {
        let harness = Harness::new();
        harness.config.set(roles_key("carol"), json!({ "team": "sre" })).await;

        let context = harness.orchestrator().resolve_rbac("carol").await.unwrap();
        assert!(context.roles.is_empty());
        assert!(context.permissions.is_empty());
    }

    #[tokio::test]
    async fn test_malformed_roles_fail() {
        let harness = Harness::new();
        harness.config.set(roles_key("dave"), json!({ "roles": "admin" })).await;

        let err = harness.orchestrator().resolve_rbac("dave").await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "RBAC resolution failed: roles must be an array of strings"
        );
    }
}
