//! Aero Tutor Daemon - serves the tutor pipeline over HTTP on localhost.

use aerotutord::{run, AppState};
use aero_common::TutorConfig;
use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "aerotutord", version, about = "Conceptual aircraft-systems tutor daemon")]
struct Args {
    /// Config file (otherwise discovered)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the configured bind address
    #[arg(long)]
    bind: Option<String>,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Load before logging is up; problems are replayed below
    let loaded = TutorConfig::load(args.config.as_deref());

    let level = if args.verbose {
        "debug".to_string()
    } else {
        loaded.config.log.level.clone()
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)),
        )
        .init();

    info!("Aero Tutor Daemon v{} starting", env!("CARGO_PKG_VERSION"));
    for diagnostic in &loaded.diagnostics {
        warn!("  {}", diagnostic);
    }
    if loaded.is_fail_safe() {
        warn!("  No usable config: every question will be redirected");
    }

    let bind = args
        .bind
        .unwrap_or_else(|| loaded.config.server.bind.clone());
    let state = AppState::from_config(loaded);

    run(state, &bind).await
}
