//! MeshPrint Relay Server

use std::net::SocketAddr;

use tokio::net::TcpListener;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use meshprint_relay::{routes, AppState, Config};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    // Load config
    let config = Config::from_env();
    let addr: SocketAddr = config.bind_addr.parse()?;

    info!(
        generation = %config.generation_base_url,
        upload = %config.upload_base_url,
        "Starting MeshPrint relay"
    );

    // Create shared state and router
    let state = AppState::new(config);
    let router = routes::create_router(state);

    let listener = TcpListener::bind(addr).await?;
    info!("HTTP server listening on {}", addr);

    axum::serve(listener, router).await?;

    Ok(())
}
