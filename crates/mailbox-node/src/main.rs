//! # Mailbox Node
//!
//! Serves mailbox requests read as JSON lines from stdin and writes one
//! JSON reply per line to stdout.
//!
//! ## Startup Sequence
//!
//! 1. Load configuration (defaults, then `MBX_*` environment overrides)
//! 2. Initialize logging (`RUST_LOG` wins over `MBX_LOG_LEVEL`)
//! 3. Validate configuration
//! 4. Start the request loop
//! 5. Serve stdin until EOF or Ctrl+C

use anyhow::{Context, Result};
use mailbox_node::{load_config, serve_lines, MailboxServer};
use tokio::io::{stdin, stdout, BufReader};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let (config, rejected) = load_config();

    // Initialize logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.logging.level.as_str()));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    for message in rejected {
        warn!("Ignoring override: {}", message);
    }
    config.validate().context("Invalid configuration")?;

    info!(
        max_message_len = config.mailbox.max_message_len,
        max_message_count = config.mailbox.max_message_count,
        delivery_model = %config.mailbox.default_delivery_model,
        queue_depth = config.server.request_queue_depth,
        "Starting mailbox node"
    );

    let (server, handle) = MailboxServer::new(&config);
    let server_task = tokio::spawn(server.run());

    tokio::select! {
        served = serve_lines(&handle, BufReader::new(stdin()), stdout()) => {
            let served = served?;
            info!(served, "Input closed");
        }
        signal = tokio::signal::ctrl_c() => {
            signal?;
            info!("Ctrl+C received");
        }
    }

    // Graceful shutdown
    handle.shutdown();
    let served = server_task.await.context("Request loop panicked")?;
    info!(served, "Shutdown complete");

    Ok(())
}
