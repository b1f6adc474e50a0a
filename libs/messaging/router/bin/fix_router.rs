//! FIX router binary
//!
//! Usage:
//!   fix-router
//!   fix-router --config config/router.toml
//!   fix-router --schema schemas/fix_schema.toml --broker-port 6000 --market-port 6001

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use router_config::{FixSchema, RouterConfig};
use router_core::Router;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "fix-router")]
#[command(about = "Routes FIX-style messages between broker and market connections")]
#[command(version)]
struct Args {
    /// Path to configuration file (FIX_ROUTER__* environment variables override it)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Protocol schema file; the bundled schema is used when absent
    #[arg(short, long)]
    schema: Option<PathBuf>,

    /// Override the broker listening port
    #[arg(long)]
    broker_port: Option<u16>,

    /// Override the market listening port
    #[arg(long)]
    market_port: Option<u16>,

    /// Override the number of processing workers
    #[arg(long)]
    workers: Option<usize>,

    /// Log level (trace, debug, info, warn, error); RUST_LOG takes precedence
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Enable JSON logging format
    #[arg(long)]
    json_logs: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args);

    info!("Starting FIX router");

    let mut config = RouterConfig::load(args.config.as_deref()).map_err(|e| {
        error!("Failed to load configuration: {:#}", e);
        e
    })?;
    if let Some(port) = args.broker_port {
        config.server.broker_port = port;
    }
    if let Some(port) = args.market_port {
        config.server.market_port = port;
    }
    if let Some(workers) = args.workers {
        config.pipeline.worker_threads = workers;
    }
    if args.schema.is_some() {
        config.schema.path = args.schema.clone();
    }
    config.validate()?;
    info!("Configuration: {}", config.summary());

    let schema = match &config.schema.path {
        Some(path) => FixSchema::from_file(path)?,
        None => FixSchema::builtin()?,
    };
    info!(
        "Loaded {} {} schema: {} tags, {} message types",
        schema.protocol(),
        schema.version(),
        schema.tag_count(),
        schema.message_type_count()
    );

    let mut handle = Router::new(config, schema)
        .start()
        .context("Failed to start router")?;

    let signals = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to build signal runtime")?;
    signals
        .block_on(tokio::signal::ctrl_c())
        .context("Failed to install CTRL+C signal handler")?;
    info!("Received shutdown signal");

    handle.stop();
    Ok(())
}

fn init_logging(args: &Args) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(args.log_level.to_lowercase()));

    if args.json_logs {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_thread_names(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_thread_names(true)
            .init();
    }
}
