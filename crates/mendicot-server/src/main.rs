//! Mendicot multiplayer game server.

use mendicot_server::{run_server, ServerConfig, ServerState};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ServerConfig::from_env()?;

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(&config.log_filter))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        follow_suit = config.game.follow_suit,
        seeded = config.seed.is_some(),
        "Starting Mendicot server..."
    );

    let addr = config.addr;
    let state = Arc::new(ServerState::new(config));

    run_server(addr, state).await
}
