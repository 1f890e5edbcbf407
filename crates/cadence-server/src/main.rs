//! Cadence Server - SM-2 review scheduling over HTTP
//!
//! Serves `POST /review/sm2` and the item/session JSON API.
//!
//! Configuration comes from `CADENCE_*` environment variables, overridden
//! by the flags below. See `cadence-server --help`.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::info;

use cadence_core::QualityPolicy;
use cadence_server::api;
use cadence_server::config::{ServeArgs, ServerConfig};
use cadence_server::logging::init_tracing;

/// SM-2 review scheduling server
#[derive(Parser)]
#[command(name = "cadence-server")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "HTTP server for SM-2 spaced repetition reviews")]
struct Args {
    /// Directory holding cadence.db (env: CADENCE_DATA_DIR)
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// How to handle ratings outside 0-5: reject, clamp or accept (env: CADENCE_QUALITY_POLICY)
    #[arg(long)]
    quality_policy: Option<QualityPolicy>,

    #[command(flatten)]
    serve: ServeArgs,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse CLI arguments first (before logging init, so --help/--version work cleanly)
    let args = Args::parse();

    let mut config = ServerConfig::from_env()?;
    config.apply_args(&args.serve);
    if let Some(dir) = args.data_dir {
        config.data_dir = Some(dir);
    }
    if let Some(policy) = args.quality_policy {
        config.quality_policy = policy;
    }

    init_tracing(config.log_format);
    info!("Cadence Server v{} starting...", env!("CARGO_PKG_VERSION"));

    let storage = Arc::new(config.open_storage().context("Failed to initialize storage")?);
    info!(path = %storage.path().display(), "Storage initialized");

    let result = api::serve(&config, Arc::clone(&storage)).await;
    api::shutdown_storage(storage);

    info!("Cadence Server shutting down");
    result
}
