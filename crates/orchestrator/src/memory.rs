//! In-memory order store for standalone mode and tests.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use common::OrderId;
use tokio::sync::RwLock;

use crate::Result;
use crate::error::OrchestratorError;
use crate::order::{Order, OrderStatus};
use crate::store::OrderStore;

#[derive(Debug, Clone, Default)]
pub struct InMemoryOrderStore {
    orders: Arc<RwLock<HashMap<OrderId, Order>>>,
}

impl InMemoryOrderStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored orders. Test helper.
    pub async fn len(&self) -> usize {
        self.orders.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn insert(&self, order: &Order) -> Result<()> {
        let mut orders = self.orders.write().await;
        if orders.contains_key(&order.id) {
            return Err(OrchestratorError::Conflict {
                order_id: order.id,
                reason: "order id already exists".to_string(),
            });
        }
        orders.insert(order.id, order.clone());
        Ok(())
    }

    async fn get(&self, order_id: OrderId) -> Result<Option<Order>> {
        Ok(self.orders.read().await.get(&order_id).cloned())
    }

    async fn update_status(
        &self,
        order_id: OrderId,
        from: OrderStatus,
        to: OrderStatus,
    ) -> Result<bool> {
        // Check and write under one write lock, like the ledger's
        // conditional decrement.
        let mut orders = self.orders.write().await;
        match orders.get_mut(&order_id) {
            Some(order) if order.status == from => {
                order.status = to;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn remove(&self, order_id: OrderId) -> Result<()> {
        self.orders.write().await.remove(&order_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use common::{ProductId, UserId};

    use super::*;

    fn order() -> Order {
        Order::pending(ProductId::new(), UserId::new(), 2)
    }

    #[tokio::test]
    async fn insert_then_get() {
        let store = InMemoryOrderStore::new();
        let order = order();
        store.insert(&order).await.unwrap();

        let loaded = store.get(order.id).await.unwrap().unwrap();
        assert_eq!(loaded, order);
    }

    #[tokio::test]
    async fn duplicate_insert_is_a_conflict() {
        let store = InMemoryOrderStore::new();
        let order = order();
        store.insert(&order).await.unwrap();

        let result = store.insert(&order).await;
        assert!(matches!(result, Err(OrchestratorError::Conflict { .. })));
    }

    #[tokio::test]
    async fn update_status_applies_only_from_the_expected_state() {
        let store = InMemoryOrderStore::new();
        let order = order();
        store.insert(&order).await.unwrap();

        let applied = store
            .update_status(order.id, OrderStatus::Pending, OrderStatus::Active)
            .await
            .unwrap();
        assert!(applied);

        // A second identical transition finds the order Active and is
        // refused.
        let applied = store
            .update_status(order.id, OrderStatus::Pending, OrderStatus::Active)
            .await
            .unwrap();
        assert!(!applied);

        let loaded = store.get(order.id).await.unwrap().unwrap();
        assert_eq!(loaded.status, OrderStatus::Active);
    }

    #[tokio::test]
    async fn update_status_on_a_missing_order_reports_not_applied() {
        let store = InMemoryOrderStore::new();
        let applied = store
            .update_status(OrderId::new(), OrderStatus::Pending, OrderStatus::Active)
            .await
            .unwrap();
        assert!(!applied);
    }

    #[tokio::test]
    async fn remove_discards_the_order() {
        let store = InMemoryOrderStore::new();
        let order = order();
        store.insert(&order).await.unwrap();
        store.remove(order.id).await.unwrap();
        assert!(store.get(order.id).await.unwrap().is_none());
    }
}
