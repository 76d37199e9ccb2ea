//! Order API Service
//!
//! REST API for admin login and storefront order management

use anyhow::{Context, Result};
use order_api::{create_router, AppState, Config, MemoryStore, RedisStore, StoreBackend};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "order_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Order API Service");

    // Load configuration
    let config = Config::from_env().context("Failed to load configuration")?;
    info!("Store backend: {:?}", config.store_backend);

    // Initialize storage
    let state = match config.store_backend {
        StoreBackend::Redis => {
            info!("Redis URL: {}", config.redis_url);
            let store = Arc::new(
                RedisStore::new(&config.redis_url)
                    .await
                    .context("Failed to initialize storage")?,
            );
            AppState::new(store.clone(), store, &config.jwt_secret)
        }
        StoreBackend::Memory => {
            warn!("Using in-memory store, data will not survive a restart");
            let store = Arc::new(MemoryStore::new());
            AppState::new(store.clone(), store, &config.jwt_secret)
        }
    };

    // A failed seed leaves the API usable for orders
    if let Err(e) = state
        .authenticator
        .ensure_seed_credential(&config.seed)
        .await
    {
        error!("Failed to create admin user: {}", e);
    }

    // Create router
    let app = create_router(state);

    // Bind and serve
    let addr = config.api_address();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    info!("Order API running on http://{}", addr);

    axum::serve(listener, app)
        .await
        .context("Server error")?;

    Ok(())
}
