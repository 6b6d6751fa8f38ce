//! Governance Orchestrator
//!
//! Coordination layer producing one governance decision for an action on a
//! resource by a principal. Every substantive answer comes from an external
//! collaborator; this service only sequences the calls:
//!
//! - Policy: allow/deny with reasons
//! - Cost: current spend and forecast
//! - Analytics: evaluation events
//! - Configuration: role and permission mappings
//! - Schema: audit signal validation
//! - Dashboard: audit signal publication
//!
//! Runs either as an HTTP server (`serve`) or as a one-shot CLI.

mod adapters;
mod cli;
mod config;
mod error;
mod models;
mod pipeline;
mod routes;
mod state;

use crate::adapters::Collaborators;
use crate::cli::{Cli, Commands};
use crate::config::Settings;
use crate::pipeline::GovernanceOrchestrator;
use crate::routes::create_router;
use crate::state::AppState;
use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing subscriber for structured logging
    init_tracing();

    // Health answers without configuration or collaborators
    if let Commands::Health = cli.command {
        let output = cli::health(&Settings::load_service_name())?;
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    // Load configuration
    let settings = Settings::load()?;
    info!("Configuration loaded ({:?} collaborators)", settings.collaborators.mode);

    let collaborators = Collaborators::from_settings(&settings.collaborators).await?;
    let orchestrator = GovernanceOrchestrator::new(collaborators);

    match cli.command {
        Commands::Serve => serve(orchestrator, &settings).await,
        command => {
            let output = cli::run_command(&command, &orchestrator, &settings.service_name).await?;
            println!("{}", serde_json::to_string_pretty(&output)?);
            Ok(())
        }
    }
}

async fn serve(orchestrator: GovernanceOrchestrator, settings: &Settings) -> anyhow::Result<()> {
    let state = Arc::new(AppState::new(orchestrator, settings.service_name.clone()));
    let app = create_router(state, settings);

    let addr = SocketAddr::from((settings.server.host, settings.server.port));

    info!("Server listening on http://{}", addr);
    info!("   GET  /health                   - Service health");
    info!("   POST /api/governance/evaluate  - Evaluate a governance request");
    info!("   GET  /api/rbac/{{principal}}     - Resolve roles and permissions");
    info!("   GET  /api/finops/{{resource_id}} - 30-day cost summary");
    info!("   POST /api/audit                - Emit an audit signal");

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Initialize tracing with structured logging on stderr
fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,governance_orchestrator=debug,tower_http=debug"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_level(true)
                .with_file(true)
                .with_line_number(true)
                .compact(),
        )
        .init();
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal, initiating graceful shutdown...");
        },
        _ = terminate => {
            info!("Received terminate signal, initiating graceful shutdown...");
        },
    }
}
