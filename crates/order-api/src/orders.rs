//! Order registry: submission, listing, status changes and removal

use std::sync::Arc;

use sneakerstore_common::{NewOrder, Order, OrderError, OrderId, OrderStatus, StoreError};
use tracing::{debug, info};

use crate::storage::OrderStore;

pub struct OrderRegistry {
    store: Arc<dyn OrderStore>,
}

impl OrderRegistry {
    pub fn new(store: Arc<dyn OrderStore>) -> Self {
        Self { store }
    }

    /// Persist a submitted order with a fresh id and status `new`
    pub async fn create(&self, fields: NewOrder) -> Result<Order, OrderError> {
        let order = Order::new(fields);
        self.store.insert_order(&order).await?;

        info!("Order created: {}", order.id);
        Ok(order)
    }

    /// Every stored order, re-read from the store on each call
    pub async fn list(&self) -> Result<Vec<Order>, OrderError> {
        Ok(self.store.list_orders().await?)
    }

    pub async fn get(&self, id: &str) -> Result<Order, OrderError> {
        let id = OrderId::parse(id)?;

        self.store
            .get_order(&id)
            .await?
            .ok_or_else(|| OrderError::NotFound(id.to_string()))
    }

    /// Record a new status. Any value is accepted.
    pub async fn update_status(&self, id: &str, status: OrderStatus) -> Result<Order, OrderError> {
        let id = OrderId::parse(id)?;
        debug!("Updating order {} to status {}", id, status);

        let order = self
            .store
            .update_order_status(&id, &status)
            .await?
            .ok_or_else(|| OrderError::NotFound(id.to_string()))?;

        info!("Order {} is now {}", order.id, order.status);
        Ok(order)
    }

    /// Remove an order. Removing an unknown order is not an error.
    pub async fn delete(&self, id: &str) -> Result<(), OrderError> {
        // Ids that can never exist have nothing to delete
        let Ok(id) = OrderId::parse(id) else {
            debug!("Ignoring delete for malformed order id: {}", id);
            return Ok(());
        };

        if self.store.delete_order(&id).await? {
            info!("Order deleted: {}", id);
        } else {
            debug!("Order {} was already absent", id);
        }

        Ok(())
    }

    pub async fn health_check(&self) -> Result<(), StoreError> {
        self.store.health_check().await
    }
}
