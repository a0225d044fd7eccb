mod handlers;
mod models;
mod routes;
mod services;
mod utils;

use axum::serve;
use std::error::Error;
use tokio::net::TcpListener;
use tracing::info;
use utils::config::Config;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    dotenv::dotenv().ok();
    let config = Config::init()?;
    routes::init_tracing(&config.log_level);
    info!("Configuration loaded successfully");

    let addr = config.bind_addr;
    let (app, state) = routes::make_app(config).await?;

    let listener = TcpListener::bind(addr).await?;
    info!("Listening on http://{}", addr);
    serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    state.ticker.stop().await;
    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
}
