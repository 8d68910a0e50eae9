//! Focal-plane end-of-night dashboard.
//!
//! Loads the night registry, selects a night and loads its six diagnostic
//! assets, then prints the outcome. With `--serve` the dashboard stays up
//! behind a JSON status API so nights can be selected remotely.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use eon_dashboard::config::DashboardConfig;
use eon_dashboard::server::{run_server, AppState};
use eon_dashboard::state::DashboardState;
use eon_fetch::RetrievalPipeline;
use eon_ingest::{NightRegistry, Session, SetNightOptions};

#[derive(Parser, Debug)]
#[command(name = "eon-dashboard")]
#[command(about = "Focal-plane end-of-night summary dashboard")]
struct Args {
    /// Night to load (YYYYMMDD); defaults to the most recent registry night
    #[arg(long)]
    night: Option<String>,

    /// Load from this exposure's raw-data directory
    #[arg(long)]
    eon_expid: Option<String>,

    /// Load from the local root instead of the mirrors
    #[arg(long)]
    local: bool,

    /// YAML configuration file
    #[arg(long, env = "EON_CONFIG")]
    config: Option<PathBuf>,

    /// Override the curated mirror root
    #[arg(long, env = "EON_ROOT")]
    eon_root: Option<String>,

    /// Override the raw data root
    #[arg(long, env = "EON_DATA_ROOT")]
    data_root: Option<String>,

    /// Override the local root
    #[arg(long, env = "EON_LOCAL_ROOT")]
    local_root: Option<String>,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Keep running and serve the status API
    #[arg(long)]
    serve: bool,

    /// Port for status HTTP server
    #[arg(long, env = "STATUS_PORT")]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment from .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();

    // Initialize tracing
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_thread_ids(true)
        .json()
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting end-of-night dashboard");

    let mut config = DashboardConfig::load_or_default(args.config.as_deref())?;
    if let Some(root) = args.eon_root {
        config.eon_root = root;
    }
    if let Some(root) = args.data_root {
        config.data_root = root;
    }
    if let Some(root) = args.local_root {
        config.local_root = root;
    }
    let port = args.port.unwrap_or(config.status_port);

    let roots = config.source_roots()?;
    info!(
        eon_root = %roots.eon_root,
        data_root = %roots.data_root,
        local_root = %roots.local_root,
        "Resolved source roots"
    );

    let pipeline = RetrievalPipeline::http(&config.fetch).context("Failed to build HTTP client")?;
    let registry = NightRegistry::load(&pipeline, &roots.eon_root, &config.registry).await;

    let host = Arc::new(DashboardState::new());
    let session = Arc::new(
        Session::new(pipeline, roots, registry, host.clone())
            .with_stale_after_days(config.stale_after_days),
    );
    session.report_registry_status(Utc::now());

    let night = match args.night.or_else(|| session.default_night().map(|n| n.to_string())) {
        Some(night) => Some(night),
        None if args.serve => {
            warn!("No night given and the registry lists none; waiting for a selection");
            None
        }
        None => anyhow::bail!("No night given and the registry lists none"),
    };

    if let Some(night) = night {
        let options = SetNightOptions {
            exposure_id_override: args.eon_expid,
            local: args.local,
        };
        match session.set_night(&night, options).await {
            Ok(report) => {
                info!(
                    night = %report.night,
                    succeeded = report.succeeded(),
                    failed = report.failed(),
                    "Night loaded"
                );
                println!("{}", serde_json::to_string_pretty(&report)?);
            }
            Err(e) if args.serve => warn!(error = %e, "Initial night selection rejected"),
            Err(e) => return Err(e.into()),
        }
    }

    if !args.serve {
        return Ok(());
    }

    let state = Arc::new(AppState::new(session, host));
    tokio::select! {
        result = run_server(state, port) => result?,
        _ = tokio::signal::ctrl_c() => info!("Shutting down"),
    }

    Ok(())
}
