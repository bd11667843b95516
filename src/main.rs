// region:    --- Imports
use auction_market::app;
use auction_market::database::DatabaseManager;
use axum::extract::DefaultBodyLimit;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};
// endregion: --- Imports

// region:    --- Main
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // logging setup
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .without_time()
        .with_target(false)
        .init();

    // database pool
    let db_manager = Arc::new(DatabaseManager::new().await);

    // schema setup
    if let Err(e) = db_manager.initialize_database().await {
        error!("{:<12} --> Database initialization failed: {:?}", "Main", e);
        return Err(e.into());
    }
    info!("{:<12} --> Database initialized", "Main");

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // route table
    let routes_all = app(db_manager)
        .layer(cors)
        .layer(DefaultBodyLimit::max(1024 * 1024));

    // listener
    let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
    let listener = TcpListener::bind(&bind_addr).await?;
    info!(
        "{:<12} --> Web Server: Listening on {}",
        "Main",
        listener.local_addr()?
    );

    // serve
    if let Err(err) = axum::serve(listener, routes_all.into_make_service()).await {
        error!("{:<12} --> Server error: {}", "Main", err);
    }
    Ok(())
}
// endregion: --- Main
