//! Shared domain types for the sneakerstore backend.

pub mod error;
pub mod models;

pub use error::{AuthError, OrderError, StoreError};
pub use models::{Claims, Credential, NewOrder, Order, OrderId, OrderStatus};
