//! `schema-insight` server binary.

use anyhow::{Context, Result};
use clap::Parser;
use schema_insight::config::ServiceConfig;
use schema_insight::service;
use schema_insight::telemetry::{self, TelemetryConfig};
use tracing::{info, warn};

/// Suggests field roles, dataset names and Druid rollups for JSON events.
#[derive(Debug, Parser)]
#[command(name = "schema-insight", version, about)]
struct Cli {
    /// Address to bind [default: 0.0.0.0, env: INSIGHT_HOST]
    #[arg(long)]
    host: Option<String>,

    /// Port to bind [default: 8000, env: INSIGHT_PORT]
    #[arg(long)]
    port: Option<u16>,

    /// Model identifier [env: HF_MODEL]
    #[arg(long)]
    model: Option<String>,

    /// Log filter directives; falls back to RUST_LOG, then `info`
    #[arg(long, env = "INSIGHT_LOG")]
    log: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    // Loaded before telemetry so `.env` can set RUST_LOG; reported once logging is up.
    let env_file = ServiceConfig::load_dotenv();

    let mut telemetry_config = TelemetryConfig::new();
    if let Some(filter) = &cli.log {
        telemetry_config = telemetry_config.with_filter(filter);
    }
    telemetry::init(&telemetry_config)?;

    match env_file {
        Ok(Some(path)) => info!(path = %path.display(), "environment file loaded"),
        Ok(None) => {}
        Err(err) => warn!(%err, "ignoring unreadable environment file"),
    }

    let mut config = ServiceConfig::from_env().context("invalid configuration")?;
    if let Some(host) = cli.host {
        config = config.with_host(host);
    }
    if let Some(port) = cli.port {
        config = config.with_port(port);
    }
    if let Some(model) = cli.model {
        config = config.with_model(model);
    }

    service::serve(&config).await
}
