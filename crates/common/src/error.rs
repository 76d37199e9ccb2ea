use thiserror::Error;

/// Failures of the backing document store.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Store backend error: {0}")]
    Backend(String),

    #[error("Document serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Failures raised while authenticating or verifying access tokens.
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Username and password are required")]
    MissingInput,

    #[error("User not found")]
    NotFound,

    #[error("Invalid credentials")]
    InvalidCredential,

    #[error("Token required")]
    MissingToken,

    #[error("Invalid or expired token")]
    InvalidOrExpiredToken,

    #[error("Password hashing error")]
    PasswordHash,

    #[error("Token encoding error: {0}")]
    TokenEncoding(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Failures raised by the order registry.
#[derive(Error, Debug)]
pub enum OrderError {
    #[error("Invalid order ID format: {0}")]
    InvalidIdentifier(String),

    #[error("Order not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}
