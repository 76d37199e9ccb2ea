//! Records persisted by the sneakerstore backend

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::error::OrderError;

/// Stored login credential. Only the salted hash of the secret is kept.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credential {
    /// Unique login name (email shaped)
    pub username: String,

    /// PHC-formatted password hash
    pub password_hash: String,
}

impl Credential {
    pub fn new(username: impl Into<String>, password_hash: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password_hash: password_hash.into(),
        }
    }
}

/// Opaque order identifier assigned by the registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(Uuid);

impl OrderId {
    /// Generate a fresh identifier
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse an identifier received from a caller
    pub fn parse(raw: &str) -> Result<Self, OrderError> {
        Uuid::parse_str(raw)
            .map(Self)
            .map_err(|_| OrderError::InvalidIdentifier(raw.to_string()))
    }
}

impl FromStr for OrderId {
    type Err = OrderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Order status.
///
/// Orders start as `new`; administrators may assign any other value afterwards,
/// so this is a free-form string rather than a closed enumeration.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderStatus(String);

impl OrderStatus {
    pub const NEW: &'static str = "new";

    pub fn new(status: impl Into<String>) -> Self {
        Self(status.into())
    }

    pub fn initial() -> Self {
        Self(Self::NEW.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for OrderStatus {
    fn default() -> Self {
        Self::initial()
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Fields a storefront submits when placing an order
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOrder {
    #[serde(default)]
    pub customer_name: Option<String>,

    #[serde(default)]
    pub email: Option<String>,

    #[serde(default)]
    pub address: Option<String>,

    #[serde(default)]
    pub size: Option<String>,

    /// Product customization payload, stored verbatim
    #[serde(default)]
    pub configuration: Option<Value>,
}

/// Order record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    /// Immutable identifier
    pub id: OrderId,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub configuration: Option<Value>,

    #[serde(default)]
    pub status: OrderStatus,

    /// When the order was submitted
    pub created_at: DateTime<Utc>,
}

impl Order {
    /// Build a fresh order in the initial `new` status
    pub fn new(fields: NewOrder) -> Self {
        Self {
            id: OrderId::generate(),
            customer_name: fields.customer_name,
            email: fields.email,
            address: fields.address,
            size: fields.size,
            configuration: fields.configuration,
            status: OrderStatus::initial(),
            created_at: Utc::now(),
        }
    }
}

/// Claims carried by a signed access token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Identifier of the authenticated credential
    pub username: String,

    /// Issued-at, seconds since the epoch
    pub iat: i64,

    /// Expiry, seconds since the epoch
    pub exp: i64,
}
