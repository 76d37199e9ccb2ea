//! Document storage for credentials and orders
//!
//! Redis layout:
//! - credential:{username} → JSON credential document
//! - order:{id} → JSON order document
//! - orders:all → List of order ids in insertion order

use std::collections::HashMap;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use sneakerstore_common::{Credential, Order, OrderId, OrderStatus, StoreError};
use tokio::sync::RwLock;
use tracing::{debug, info};

const ORDER_INDEX_KEY: &str = "orders:all";

fn credential_key(username: &str) -> String {
    format!("credential:{}", username)
}

fn order_key(id: impl std::fmt::Display) -> String {
    format!("order:{}", id)
}

fn backend(err: redis::RedisError) -> StoreError {
    StoreError::Backend(err.to_string())
}

/// Persistence for login credentials
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Look up a credential by username
    async fn find_credential(&self, username: &str) -> Result<Option<Credential>, StoreError>;

    /// Store a credential unless one with the same username exists.
    /// Returns `Ok(true)` if it was written.
    async fn insert_credential_if_absent(&self, credential: &Credential)
        -> Result<bool, StoreError>;
}

/// Persistence for order documents
#[async_trait]
pub trait OrderStore: Send + Sync {
    async fn insert_order(&self, order: &Order) -> Result<(), StoreError>;

    /// All orders, oldest first
    async fn list_orders(&self) -> Result<Vec<Order>, StoreError>;

    async fn get_order(&self, id: &OrderId) -> Result<Option<Order>, StoreError>;

    /// Overwrite the status of an existing order.
    /// Returns the updated order, or `None` if no order has this id.
    async fn update_order_status(
        &self,
        id: &OrderId,
        status: &OrderStatus,
    ) -> Result<Option<Order>, StoreError>;

    /// Remove an order. Returns `Ok(false)` if it did not exist.
    async fn delete_order(&self, id: &OrderId) -> Result<bool, StoreError>;

    /// Check the backend is reachable
    async fn health_check(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

/// Redis-backed store shared by every request
#[derive(Clone)]
pub struct RedisStore {
    conn: ConnectionManager,
}

impl RedisStore {
    /// Connect to Redis
    pub async fn new(redis_url: &str) -> Result<Self, StoreError> {
        let client = redis::Client::open(redis_url).map_err(backend)?;

        let conn = ConnectionManager::new(client).await.map_err(backend)?;

        info!("Connected to Redis at {}", redis_url);

        Ok(Self { conn })
    }
}

#[async_trait]
impl CredentialStore for RedisStore {
    async fn find_credential(&self, username: &str) -> Result<Option<Credential>, StoreError> {
        let mut conn = self.conn.clone();
        let json: Option<String> = conn.get(credential_key(username)).await.map_err(backend)?;

        match json {
            Some(data) => Ok(Some(serde_json::from_str(&data)?)),
            None => Ok(None),
        }
    }

    async fn insert_credential_if_absent(
        &self,
        credential: &Credential,
    ) -> Result<bool, StoreError> {
        let mut conn = self.conn.clone();
        let json = serde_json::to_string(credential)?;

        // SET NX keeps the username unique even with concurrent seeding
        let created: bool = conn
            .set_nx(credential_key(&credential.username), json)
            .await
            .map_err(backend)?;

        if !created {
            debug!("Credential already exists for: {}", credential.username);
        }

        Ok(created)
    }
}

#[async_trait]
impl OrderStore for RedisStore {
    async fn insert_order(&self, order: &Order) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        let json = serde_json::to_string(order)?;

        let _: () = conn.set(order_key(&order.id), json).await.map_err(backend)?;
        let _: () = conn
            .rpush(ORDER_INDEX_KEY, order.id.to_string())
            .await
            .map_err(backend)?;

        debug!("Stored order: {}", order.id);
        Ok(())
    }

    async fn list_orders(&self) -> Result<Vec<Order>, StoreError> {
        let mut conn = self.conn.clone();
        let ids: Vec<String> = conn.lrange(ORDER_INDEX_KEY, 0, -1).await.map_err(backend)?;

        let mut orders = Vec::with_capacity(ids.len());
        for id in ids {
            let json: Option<String> = conn
                .get(order_key(&id))
                .await
                .map_err(backend)?;

            // An id can outlive its document briefly while a delete is in flight
            if let Some(data) = json {
                orders.push(serde_json::from_str(&data)?);
            }
        }

        Ok(orders)
    }

    async fn get_order(&self, id: &OrderId) -> Result<Option<Order>, StoreError> {
        let mut conn = self.conn.clone();
        let json: Option<String> = conn.get(order_key(id)).await.map_err(backend)?;

        match json {
            Some(data) => Ok(Some(serde_json::from_str(&data)?)),
            None => Ok(None),
        }
    }

    async fn update_order_status(
        &self,
        id: &OrderId,
        status: &OrderStatus,
    ) -> Result<Option<Order>, StoreError> {
        let Some(mut order) = self.get_order(id).await? else {
            return Ok(None);
        };

        order.status = status.clone();
        let json = serde_json::to_string(&order)?;

        // SET XX only overwrites an existing key, so a concurrent delete wins
        let mut conn = self.conn.clone();
        let written: Option<String> = redis::cmd("SET")
            .arg(order_key(id))
            .arg(json)
            .arg("XX")
            .query_async(&mut conn)
            .await
            .map_err(backend)?;

        Ok(written.map(|_| order))
    }

    async fn delete_order(&self, id: &OrderId) -> Result<bool, StoreError> {
        let mut conn = self.conn.clone();

        let deleted: bool = conn.del(order_key(id)).await.map_err(backend)?;
        let _: () = conn
            .lrem(ORDER_INDEX_KEY, 0, id.to_string())
            .await
            .map_err(backend)?;

        if deleted {
            debug!("Deleted order: {}", id);
        }

        Ok(deleted)
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        let _: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(backend)?;
        Ok(())
    }
}

/// In-process store for local development and tests
#[derive(Default)]
pub struct MemoryStore {
    credentials: RwLock<HashMap<String, Credential>>,
    orders: RwLock<Vec<Order>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CredentialStore for MemoryStore {
    async fn find_credential(&self, username: &str) -> Result<Option<Credential>, StoreError> {
        Ok(self.credentials.read().await.get(username).cloned())
    }

    async fn insert_credential_if_absent(
        &self,
        credential: &Credential,
    ) -> Result<bool, StoreError> {
        let mut credentials = self.credentials.write().await;
        if credentials.contains_key(&credential.username) {
            return Ok(false);
        }
        credentials.insert(credential.username.clone(), credential.clone());
        Ok(true)
    }
}

#[async_trait]
impl OrderStore for MemoryStore {
    async fn insert_order(&self, order: &Order) -> Result<(), StoreError> {
        self.orders.write().await.push(order.clone());
        Ok(())
    }

    async fn list_orders(&self) -> Result<Vec<Order>, StoreError> {
        Ok(self.orders.read().await.clone())
    }

    async fn get_order(&self, id: &OrderId) -> Result<Option<Order>, StoreError> {
        Ok(self.orders.read().await.iter().find(|o| o.id == *id).cloned())
    }

    async fn update_order_status(
        &self,
        id: &OrderId,
        status: &OrderStatus,
    ) -> Result<Option<Order>, StoreError> {
        let mut orders = self.orders.write().await;
        Ok(orders.iter_mut().find(|o| o.id == *id).map(|order| {
            order.status = status.clone();
            order.clone()
        }))
    }

    async fn delete_order(&self, id: &OrderId) -> Result<bool, StoreError> {
        let mut orders = self.orders.write().await;
        let before = orders.len();
        orders.retain(|o| o.id != *id);
        Ok(orders.len() != before)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use sneakerstore_common::NewOrder;

    async fn get_test_storage() -> RedisStore {
        RedisStore::new("redis://127.0.0.1:6379/15")
            .await
            .expect("Failed to connect to test Redis")
    }

    fn sample_order(name: &str) -> Order {
        Order::new(NewOrder {
            customer_name: Some(name.to_string()),
            email: Some(format!("{}@example.com", name.to_lowercase())),
            configuration: Some(json!({ "color": "red", "laces": "white" })),
            ..Default::default()
        })
    }

    #[tokio::test]
    async fn test_memory_credential_insert_is_idempotent() {
        let store = MemoryStore::new();
        let credential = Credential::new("admin@admin.com", "hash-1");

        assert!(store.insert_credential_if_absent(&credential).await.unwrap());
        assert!(!store
            .insert_credential_if_absent(&Credential::new("admin@admin.com", "hash-2"))
            .await
            .unwrap());

        let stored = store.find_credential("admin@admin.com").await.unwrap().unwrap();
        assert_eq!(stored.password_hash, "hash-1");
        assert!(store.find_credential("nobody@admin.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_memory_orders_keep_insertion_order() {
        let store = MemoryStore::new();
        let first = sample_order("Alice");
        let second = sample_order("Bob");

        store.insert_order(&first).await.unwrap();
        store.insert_order(&second).await.unwrap();

        let ids: Vec<OrderId> = store
            .list_orders()
            .await
            .unwrap()
            .into_iter()
            .map(|o| o.id)
            .collect();
        assert_eq!(ids, vec![first.id, second.id]);
    }

    #[tokio::test]
    async fn test_memory_update_and_delete() {
        let store = MemoryStore::new();
        let order = sample_order("Carol");
        store.insert_order(&order).await.unwrap();

        let updated = store
            .update_order_status(&order.id, &OrderStatus::new("shipped"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.status.as_str(), "shipped");
        assert_eq!(updated.created_at, order.created_at);

        assert!(store.delete_order(&order.id).await.unwrap());
        assert!(!store.delete_order(&order.id).await.unwrap());
        assert!(store
            .update_order_status(&order.id, &OrderStatus::new("cancelled"))
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    #[ignore] // Requires Redis to be running
    async fn test_redis_order_lifecycle() {
        let store = get_test_storage().await;
        let order = sample_order("Dave");

        store.insert_order(&order).await.unwrap();

        let retrieved = store
            .get_order(&order.id)
            .await
            .unwrap()
            .expect("Order not found");
        assert_eq!(retrieved, order);

        let listed = store.list_orders().await.unwrap();
        assert!(listed.iter().any(|o| o.id == order.id));

        let updated = store
            .update_order_status(&order.id, &OrderStatus::new("processing"))
            .await
            .unwrap()
            .expect("Order not found");
        assert_eq!(updated.status.as_str(), "processing");

        // Clean up
        assert!(store.delete_order(&order.id).await.unwrap());
        assert!(store.get_order(&order.id).await.unwrap().is_none());
        assert!(!store.list_orders().await.unwrap().iter().any(|o| o.id == order.id));
    }

    #[tokio::test]
    #[ignore] // Requires Redis to be running
    async fn test_redis_status_update_does_not_resurrect() {
        let store = get_test_storage().await;
        let order = sample_order("Erin");

        store.insert_order(&order).await.unwrap();
        store.delete_order(&order.id).await.unwrap();

        let updated = store
            .update_order_status(&order.id, &OrderStatus::new("shipped"))
            .await
            .unwrap();
        assert!(updated.is_none());
        assert!(store.get_order(&order.id).await.unwrap().is_none());
    }

    #[tokio::test]
    #[ignore] // Requires Redis to be running
    async fn test_redis_health_check() {
        let store = get_test_storage().await;
        store.health_check().await.unwrap();
    }
}
