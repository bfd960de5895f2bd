//! Heisenpad relay binary.
//!
//! # Usage
//!
//! ```bash
//! heisenpad-server --bind 127.0.0.1:9002
//! ```

use clap::Parser;
use heisenpad_server::{DEFAULT_BIND_ADDRESS, Server, ServerConfig};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Heisenpad relay server
#[derive(Parser, Debug)]
#[command(name = "heisenpad-server")]
#[command(about = "Ephemeral channel relay for Heisenpad")]
#[command(version)]
struct Args {
    /// Address to bind to
    #[arg(short, long, default_value = DEFAULT_BIND_ADDRESS)]
    bind: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::registry().with(fmt::layer()).with(filter).init();

    let server = Server::bind(ServerConfig { bind_address: args.bind }).await?;
    tracing::info!("relay listening on {}", server.local_addr()?);

    server
        .run_until(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("shutting down");
        })
        .await?;

    Ok(())
}
