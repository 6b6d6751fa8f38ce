//! Command-line interface
//!
//! Thin wrapper over the orchestrator: parse, validate, run one operation,
//! print JSON on stdout.

use crate::error::{validation_error, AppError};
use crate::models::{require_identifier, AuditSignal, GovernanceRequest, HealthStatus, MessageResponse};
use crate::pipeline::GovernanceOrchestrator;
use clap::{Parser, Subcommand};
use serde::de::DeserializeOwned;
use serde_json::Value;
use validator::Validate;

#[derive(Parser, Debug)]
#[command(name = "governance-orchestrator", version, about = "Unified governance decisions over policy, cost, RBAC and audit collaborators")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the HTTP server
    Serve,
    /// Evaluate a governance request
    Evaluate {
        #[arg(long, help = "GovernanceRequest as JSON")]
        request: String,
    },
    /// Resolve roles and permissions of a principal
    Rbac {
        #[arg(long)]
        principal: String,
    },
    /// Cost summary of a resource over the last 30 days
    Finops {
        #[arg(long)]
        resource: String,
    },
    /// Validate and publish an audit signal
    Audit {
        #[arg(long, help = "AuditSignal as JSON")]
        signal: String,
    },
    /// Print service health
    Health,
}

fn parse_json<T: DeserializeOwned>(raw: &str, what: &str) -> Result<T, AppError> {
    serde_json::from_str(raw).map_err(|e| AppError::BadRequest(format!("invalid {} JSON: {}", what, e)))
}

/// Health report; needs no collaborators and no collaborator configuration
pub fn health(service_name: &str) -> Result<Value, AppError> {
    serde_json::to_value(HealthStatus::healthy(service_name))
        .map_err(|e| AppError::Internal(format!("could not encode output: {}", e)))
}

/// Run a one-shot command and return the JSON to print
pub async fn run_command(
    command: &Commands,
    orchestrator: &GovernanceOrchestrator,
    service_name: &str,
) -> Result<Value, AppError> {
    let output = match command {
        Commands::Evaluate { request } => {
            let request: GovernanceRequest = parse_json(request, "request")?;
            request.validate().map_err(|e| validation_error(e.to_string()))?;
            serde_json::to_value(orchestrator.evaluate_governance(&request).await?)
        }
        Commands::Rbac { principal } => {
            require_identifier("principal", principal).map_err(validation_error)?;
            serde_json::to_value(orchestrator.resolve_rbac(principal).await?)
        }
        Commands::Finops { resource } => {
            require_identifier("resource", resource).map_err(validation_error)?;
            serde_json::to_value(orchestrator.get_finops_summary(resource).await?)
        }
        Commands::Audit { signal } => {
            let signal: AuditSignal = parse_json(signal, "signal")?;
            signal.validate().map_err(|e| validation_error(e.to_string()))?;
            orchestrator.emit_audit_signal(&signal).await?;
            serde_json::to_value(MessageResponse::new("Audit signal published"))
        }
        Commands::Health => return health(service_name),
        Commands::Serve => {
            return Err(AppError::BadRequest("serve is not a one-shot command".to_string()))
        }
    };

    output.map_err(|e| AppError::Internal(format!("could not encode output: {}", e)))
}
