//! config-plane server binary.
//!
//! # Architecture Overview
//!
//! ```text
//!   resource dirs ──▶ reconcile ──▶ decode/classify ──▶ snapshot builder
//!        ▲                                                    │
//!   SIGHUP, watcher,                                          ▼
//!   admin POST                                         snapshot store
//!                                                             │ watch
//!   subscribers ◀══ WebSocket ══ distribution engine ◀────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;

use config_plane::config::{load_config, Overrides};
use config_plane::lifecycle::run_signal_loop;
use config_plane::observability::{logging, metrics};
use config_plane::{ConfigPlane, Shutdown};

#[derive(Parser, Debug)]
#[command(name = "config-plane", version, about = "Serve on-disk resource files to subscribers")]
struct Args {
    /// Server configuration file (TOML).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Force debug logging.
    #[arg(long)]
    debug: bool,

    /// Discovery listener port.
    #[arg(long, value_name = "PORT")]
    ads: Option<u16>,

    /// Reconcile when files in the resource directories change.
    #[arg(long)]
    watch: bool,

    /// Resource directories (default: current directory).
    directories: Vec<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let overrides = Overrides {
        debug: args.debug,
        ads_port: args.ads,
        watch: args.watch,
        directories: args.directories,
    };
    let config = load_config(args.config.as_deref(), &overrides)?;

    logging::init_logging(&config.observability)?;
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "config-plane starting");
    tracing::info!(
        bind_address = %config.listener.bind_address,
        directories = ?config.sources.directories,
        watch = config.sources.watch,
        group_key = %config.distribution.group_key,
        suppress_identical_pushes = config.distribution.suppress_identical_pushes,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => {
                if let Err(e) = metrics::init_metrics(addr) {
                    tracing::error!(error = %e, "Failed to start metrics exporter");
                }
            }
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let shutdown = Shutdown::new();
    let plane = ConfigPlane::start(config, shutdown).await?;

    if let Err(e) = run_signal_loop(plane.trigger().clone()).await {
        tracing::error!(error = %e, "Cannot install signal handlers, waiting for Ctrl-C");
        tokio::signal::ctrl_c().await?;
    }

    plane.stop().await;
    Ok(())
}
