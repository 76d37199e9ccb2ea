//! Order API Service
//!
//! Issues access tokens for the store administrator and manages the orders
//! submitted by the sneaker storefront.
//!
//! ## Endpoints
//!
//! - `POST /api/login` - Exchange username/password for an access token
//! - `GET /api/protected` - Verify a bearer token
//! - `POST /api/orders` - Submit an order
//! - `GET /api/orders` - List orders
//! - `GET /api/orders/{id}` - Get an order
//! - `PATCH /api/orders/{id}` - Change an order's status
//! - `DELETE /api/orders/{id}` - Delete an order
//! - `GET /health` - Health check

pub mod auth;
pub mod config;
pub mod handlers;
pub mod orders;
pub mod storage;

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub use auth::{Authenticator, SeedCredential};
pub use config::{Config, StoreBackend};
pub use handlers::AppState;
pub use orders::OrderRegistry;
pub use storage::{CredentialStore, MemoryStore, OrderStore, RedisStore};

impl AppState {
    /// Compose both components over the given store handles
    pub fn new(
        credentials: Arc<dyn CredentialStore>,
        orders: Arc<dyn OrderStore>,
        signing_key: &str,
    ) -> Self {
        Self {
            authenticator: Authenticator::new(credentials, signing_key),
            orders: OrderRegistry::new(orders),
        }
    }
}

/// Create the application router
pub fn create_router(state: AppState) -> Router {
    let shared_state = Arc::new(state);

    Router::new()
        .route("/health", get(handlers::health_handler))
        .route("/api/login", post(handlers::login_handler))
        .route("/api/protected", get(handlers::protected_handler))
        .route(
            "/api/orders",
            post(handlers::create_order_handler).get(handlers::list_orders_handler),
        )
        .route(
            "/api/orders/{id}",
            get(handlers::get_order_handler)
                .patch(handlers::update_order_handler)
                .delete(handlers::delete_order_handler),
        )
        .with_state(shared_state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}
