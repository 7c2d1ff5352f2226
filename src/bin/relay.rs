//! Relay server binary: rooms, identity assignment and frame forwarding

use tokio::net::TcpListener;
use tracing::info;

use gravwell::config::RelayConfig;
use gravwell::relay::{build_router, RelayState};
use gravwell::util::{init_tracing, shutdown_signal};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = RelayConfig::from_env()?;
    init_tracing(&config.log_level);

    info!("Starting relay");

    let router = build_router(RelayState::new());
    let listener = TcpListener::bind(config.server_addr).await?;

    info!("Relay listening on {}", config.server_addr);
    info!("Health check: http://{}/health", config.server_addr);
    info!("Room endpoint: ws://{}/ws/<room>", config.server_addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Relay shutdown complete");
    Ok(())
}
