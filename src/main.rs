use std::net::SocketAddr;

use config::{logger::initialize_logger, settings::Settings, startup::AppState};
use tracing::info;

mod app;
mod config;
mod controllers;
mod dtos;
mod error;
mod events;
mod lifecycle;
mod middleware;
mod models;
mod repositories;
mod routes;


#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize logging
    initialize_logger();

    info!("🚀 Server starting initialization...");

    let settings = Settings::from_env()?;

    // Initialize App State
    let state = AppState::new(&settings);

    // Background expiry sweep, independent of request traffic
    lifecycle::spawn_sweeper(state.store.clone(), settings.sweep_interval);

    let app = app::create_app(state, &settings)?;

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", settings.port)).await?;
    info!("🚀 Server started successfully at port {}", settings.port);
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
