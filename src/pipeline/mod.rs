//! Governance Pipeline Module
//!
//! Sequences the collaborators into the four public operations:
//!
//! 1. **Evaluate**: policy verdict, best-effort cost impact, analytics, audit
//! 2. **RBAC**: roles of a principal and the union of their permissions
//! 3. **FinOps**: 30-day cost and forecast with a budget classification
//! 4. **Audit**: schema-validated signal published to the dashboard

pub mod finops;
pub mod orchestrator;
pub mod rbac;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;

// Re-export main types for convenient access
pub use orchestrator::GovernanceOrchestrator;
pub use types::*;
