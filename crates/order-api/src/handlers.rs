//! API request handlers for the Order API

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use sneakerstore_common::{AuthError, Claims, NewOrder, Order, OrderError, OrderStatus};
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::{auth::Authenticator, orders::OrderRegistry};

/// Shared application state
pub struct AppState {
    pub authenticator: Authenticator,
    pub orders: OrderRegistry,
}

/// API Error type
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    /// Map a registry error, hiding store internals behind `failure`
    fn order(err: OrderError, failure: &str) -> Self {
        match err {
            OrderError::InvalidIdentifier(_) => {
                Self::new(StatusCode::BAD_REQUEST, "Invalid order ID format")
            }
            OrderError::NotFound(_) => Self::new(StatusCode::NOT_FOUND, "Order not found"),
            OrderError::Store(e) => {
                error!("{}: {}", failure, e);
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, failure)
            }
        }
    }
}

/// Request body, falling back to an empty payload when none was sent.
///
/// A missing content type or an unparsable document reads as "no fields
/// supplied"; well-formed JSON of the wrong shape is still rejected.
fn body_or_default<T: Default>(body: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    match body {
        Ok(Json(payload)) => Ok(payload),
        Err(JsonRejection::MissingJsonContentType(_)) | Err(JsonRejection::JsonSyntaxError(_)) => {
            Ok(T::default())
        }
        Err(rejection) => Err(ApiError::new(rejection.status(), rejection.body_text())),
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({
            "message": self.message
        });

        (self.status, Json(body)).into_response()
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        let status = match &err {
            AuthError::MissingInput => StatusCode::BAD_REQUEST,
            AuthError::NotFound => StatusCode::NOT_FOUND,
            AuthError::InvalidCredential | AuthError::MissingToken => StatusCode::UNAUTHORIZED,
            AuthError::InvalidOrExpiredToken => StatusCode::FORBIDDEN,
            AuthError::PasswordHash | AuthError::TokenEncoding(_) | AuthError::Store(_) => {
                error!("Error logging in: {}", err);
                return Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Failed to log in");
            }
        };

        Self::new(status, err.to_string())
    }
}

/// Login request body
#[derive(Debug, Default, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct ProtectedResponse {
    pub message: String,
    pub claims: Claims,
}

#[derive(Debug, Serialize)]
pub struct OrderCreatedResponse {
    pub message: String,
    pub order: Order,
}

/// Status change request body
#[derive(Debug, Default, Deserialize)]
pub struct UpdateStatusRequest {
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Health check endpoint
pub async fn health_handler(State(state): State<Arc<AppState>>) -> Response {
    match state.orders.health_check().await {
        Ok(()) => Json(serde_json::json!({
            "status": "healthy",
            "service": "order-api"
        }))
        .into_response(),
        Err(e) => {
            warn!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(serde_json::json!({
                    "status": "unavailable",
                    "service": "order-api"
                })),
            )
                .into_response()
        }
    }
}

/// Exchange a username/password pair for an access token
pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>, ApiError> {
    let payload = body_or_default(body)?;
    let token = state
        .authenticator
        .authenticate(payload.username.as_deref(), payload.password.as_deref())
        .await?;

    Ok(Json(LoginResponse { token }))
}

/// Check a bearer token and echo its claims
pub async fn protected_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<ProtectedResponse>, ApiError> {
    let token = bearer_token(&headers)?;
    let claims = state.authenticator.verify(token)?;

    Ok(Json(ProtectedResponse {
        message: "Access granted".to_string(),
        claims,
    }))
}

/// Submit a new order
pub async fn create_order_handler(
    State(state): State<Arc<AppState>>,
    body: Result<Json<NewOrder>, JsonRejection>,
) -> Result<(StatusCode, Json<OrderCreatedResponse>), ApiError> {
    let payload = body_or_default(body)?;
    let order = state
        .orders
        .create(payload)
        .await
        .map_err(|e| ApiError::order(e, "Failed to create order"))?;

    Ok((
        StatusCode::CREATED,
        Json(OrderCreatedResponse {
            message: "Order created successfully".to_string(),
            order,
        }),
    ))
}

/// List all orders
pub async fn list_orders_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Order>>, ApiError> {
    let orders = state
        .orders
        .list()
        .await
        .map_err(|e| ApiError::order(e, "Failed to fetch orders"))?;

    Ok(Json(orders))
}

/// Get a single order
pub async fn get_order_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Order>, ApiError> {
    let order = state
        .orders
        .get(&id)
        .await
        .map_err(|e| ApiError::order(e, "Failed to fetch order"))?;

    Ok(Json(order))
}

/// Change the status of an order
pub async fn update_order_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    body: Result<Json<UpdateStatusRequest>, JsonRejection>,
) -> Result<Json<Order>, ApiError> {
    info!("Updating order: {}", id);
    let payload = body_or_default(body)?;

    // Without a status there is nothing to change
    let result = match payload.status {
        Some(status) => state.orders.update_status(&id, OrderStatus::new(status)).await,
        None => state.orders.get(&id).await,
    };

    let order = result.map_err(|e| ApiError::order(e, "Failed to update order"))?;

    Ok(Json(order))
}

/// Delete an order
pub async fn delete_order_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    info!("Deleting order: {}", id);

    state
        .orders
        .delete(&id)
        .await
        .map_err(|e| ApiError::order(e, "Failed to delete order"))?;

    Ok(Json(MessageResponse {
        message: "Order successfully deleted".to_string(),
    }))
}

/// Token part of an `Authorization: Bearer <token>` header.
///
/// No header means no token. A header without a token after the first
/// space is treated as an invalid token.
fn bearer_token(headers: &HeaderMap) -> Result<Option<&str>, AuthError> {
    let Some(value) = headers.get(AUTHORIZATION) else {
        return Ok(None);
    };

    let value = value
        .to_str()
        .map_err(|_| AuthError::InvalidOrExpiredToken)?;

    match value.split(' ').nth(1) {
        Some(token) if !token.is_empty() => Ok(Some(token)),
        _ => Err(AuthError::InvalidOrExpiredToken),
    }
}
