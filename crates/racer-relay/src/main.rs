//! Racer Relay
//!
//! Axum WebSocket relay that forwards race events between the members of
//! a room. Clients simulate their own car; the relay only re-addresses and
//! fans out their snapshots.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::{config::RelayConfig, relay::RoomRegistry};

mod config;
mod error;
mod handler;
mod relay;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = RelayConfig::from_env()?;
    let app = handler::router(RoomRegistry::new());

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    tracing::info!("[relay] listening on {}", config.addr);
    axum::serve(listener, app).await?;
    Ok(())
}
