mod auth;
mod config;
mod dispatch;
mod errors;
mod fields;
mod handlers;
mod requests;
mod schema;
mod scoring;
mod store;

use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::store::RedisStore;

/// Main entry point for the application.
///
/// Initializes tracing, loads configuration, builds the resilient store
/// client and starts the Axum server with the `/method` RPC endpoint.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rust_scoring_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env()?;

    // Build the store client. Connecting is deferred to the first operation,
    // so an unreachable store delays nothing at startup.
    let store = Arc::new(RedisStore::from_config(&config)?);
    tracing::info!("Store client initialized: {}", config.store_url);

    let app_state = Arc::new(handlers::AppState {
        config: config.clone(),
        store,
    });

    let app = handlers::app(app_state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
