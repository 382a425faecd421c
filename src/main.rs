//! Walkie-Talkie Signaling Relay - Entry Point
//!
//! Loads configuration, binds the listener and serves until Ctrl+C.

use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

use walkie_relay::{serve, Config};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Use RUST_LOG env var to control log level
    // e.g., RUST_LOG=debug or RUST_LOG=walkie_relay=trace
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("walkie_relay=info")),
        )
        .init();

    let config = Config::from_env()?;
    let addr = config.bind_addr();

    let listener = TcpListener::bind(&addr).await?;
    info!("Walkie Talkie Signaling Server listening on {}", addr);
    info!("Clients can connect to ws://{}", listener.local_addr()?);

    tokio::select! {
        result = serve(listener) => result?,
        result = tokio::signal::ctrl_c() => {
            result?;
            info!("Shutdown signal received");
        }
    }

    Ok(())
}
