//! Function agent CLI entry point.
//!
//! This is the main entry point for running the per-function execution
//! agent. The orchestrator starts one agent process per deployed function,
//! `POST /load`s the function source, then routes invocations to it.

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use fn_agent_common::{AgentConfig, ConfigFile};
use fn_agent_core::function::FunctionSpec;
use fn_agent_server::{AgentServer, ServerConfig};

/// Per-function execution agent for a self-hosted FaaS platform.
#[derive(Debug, Parser)]
#[command(name = "fn-agent", version, about)]
struct Cli {
    /// Address to bind the control-plane server.
    #[arg(long, env = "BIND_ADDR", default_value = "0.0.0.0:8080")]
    bind: SocketAddr,

    /// Path to a TOML configuration file.
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,fn_agent=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting function agent");

    let cli = Cli::parse();

    // Load configuration file if provided
    let config_file = match &cli.config {
        Some(path) => ConfigFile::from_file(path)
            .with_context(|| format!("Failed to load config file '{}'", path.display()))?,
        None => ConfigFile::default(),
    };

    let agent_config: AgentConfig = config_file.agent.clone();

    let bind_addr = config_file
        .server
        .bind_addr
        .parse()
        .ok()
        .filter(|_| cli.config.is_some())
        .unwrap_or(cli.bind);

    let server_config = ServerConfig::default()
        .with_bind_addr(bind_addr)
        .with_timeout(config_file.server.request_timeout_secs);

    info!(bind_addr = %bind_addr, "Configuration loaded");

    let server = AgentServer::new(&agent_config, server_config);

    // Pre-load a function from disk if the config names one. The normal path
    // is the orchestrator calling /load after startup; this exists for local
    // development.
    if let Some(entry) = &config_file.function {
        let source = std::fs::read_to_string(&entry.path)
            .with_context(|| format!("Failed to read function source '{}'", entry.path))?;
        let version = server.state().load_function(FunctionSpec {
            source,
            handler_name: entry.handler.clone(),
            env: entry.env_vars.clone(),
        })?;
        info!(path = %entry.path, handler = %entry.handler, version, "Function pre-loaded");
    }

    info!("Agent initialized. Available endpoints:");
    info!("  GET  /health   - Health check");
    info!("  GET  /ready    - Readiness check");
    info!("  POST /load     - Load function code");
    info!("  POST /invoke   - Invoke the loaded function");

    server.run().await?;

    Ok(())
}
