//! # tickcast
//!
//! Relays the latest trade price from the upstream WebSocket feed to a local
//! consumer process through a shared memory slot and a wake-up FIFO.
//!
//! Runs with built-in defaults when started bare.
//!
//! # Usage
//!
//! ```bash
//! tickcast
//! tickcast --config feed.json --log-level debug
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tc_core::config::FeedConfig;
use tc_core::pipe::PipeNotifier;
use tc_core::shm::{self, ShmPricePublisher};
use tc_feed::PricePipeline;
use tc_feed::output::PriceOutputs;
use tracing::info;

/// Trade price relay over shared memory and a named pipe.
#[derive(Parser)]
#[command(name = "tickcast", about = "Trade price relay over shared memory and a named pipe")]
struct Cli {
    /// Optional JSON file overriding the built-in settings.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Optional log directory for file output.
    #[arg(long)]
    log_dir: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tc_core::logging::init_logging(&cli.log_level, cli.log_dir.as_deref(), "tickcast");

    let config = match &cli.config {
        Some(path) => tc_core::config::load_config(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => FeedConfig::default(),
    };
    info!("tickcast starting: upstream={}, step={}", config.ws_url, config.step);

    // Resources live for the whole process and are shared by every session.
    let mut shm = ShmPricePublisher::create(&config.shm_path)?;
    if let Some(previous) = shm::parse_slot(&shm.snapshot()) {
        info!("shm {} holds previous price {previous:.2}", shm.path().display());
    }

    info!("waiting for a reader on {}", config.pipe_path.display());
    let pipe_path = config.pipe_path.clone();
    let mut pipe = tokio::task::spawn_blocking(move || PipeNotifier::open(&pipe_path)).await??;
    info!("pipe {} open", pipe.path().display());

    let mut pipeline = PricePipeline::new(config.step, PriceOutputs { shm: &mut shm, pipe: &mut pipe });

    // A pipe write stuck on a stalled consumer delays Ctrl+C handling until it returns.
    tokio::select! {
        _ = pipeline.run(&config) => {}
        res = tokio::signal::ctrl_c() => {
            res?;
            info!("shutdown signal received");
        }
    }

    info!("goodbye");
    Ok(())
}
