//! Switchboard API server.
//!
//! Wires the policy engine, audit service, adapter registry, and approval
//! store into one process-scoped router, then serves the HTTP surface.
//! All configuration comes from the environment (see the README for the
//! full variable list); `--bind` overrides `SWITCHBOARD_BIND`.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use sb_adapters::AdapterRegistry;
use sb_api::{app, AppState};
use sb_approvals::ApprovalStore;
use sb_audit::AuditService;
use sb_policy::PolicyEngine;
use sb_router::ActionRouter;

const DEFAULT_BIND: &str = "0.0.0.0:8080";

/// Switchboard action-routing API.
#[derive(Parser)]
#[command(name = "sb-api", about = "Switchboard action-routing API")]
struct Cli {
    /// Address to listen on (overrides SWITCHBOARD_BIND).
    #[arg(long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    let cli = Cli::parse();
    let bind = cli
        .bind
        .or_else(|| std::env::var("SWITCHBOARD_BIND").ok())
        .unwrap_or_else(|| DEFAULT_BIND.to_string());

    let policy = PolicyEngine::from_env().context("loading policy configuration")?;
    let audit = AuditService::from_env().context("initializing audit service")?;
    let registry = AdapterRegistry::from_env().context("registering adapters")?;
    let approvals = ApprovalStore::from_env();

    let state = Arc::new(AppState::new(ActionRouter::new(
        policy, audit, registry, approvals,
    )));
    state
        .router
        .approvals()
        .warmup()
        .await
        .context("warming up approval store")?;

    let listener = tokio::net::TcpListener::bind(&bind)
        .await
        .with_context(|| format!("binding {bind}"))?;
    tracing::info!(bind = %bind, "switchboard api listening");

    axum::serve(listener, app(Arc::clone(&state)))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving")?;

    state.router.approvals().shutdown().await;
    tracing::info!("switchboard api shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %error, "failed to install ctrl-c handler");
    }
}
