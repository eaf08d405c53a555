//! Order persistence trait.

use async_trait::async_trait;
use common::OrderId;

use crate::Result;
use crate::order::{Order, OrderStatus};

/// Persistence for orders.
///
/// `update_status` is conditional on the current status, so concurrent
/// transitions race through the store rather than through the callers:
/// exactly one of two competing transitions observes `true`.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Inserts a new order. Errors if the id is already taken.
    async fn insert(&self, order: &Order) -> Result<()>;

    /// Loads an order by id.
    async fn get(&self, order_id: OrderId) -> Result<Option<Order>>;

    /// Transitions `from` to `to` iff the order is currently in `from`.
    /// Returns whether the transition was applied.
    async fn update_status(
        &self,
        order_id: OrderId,
        from: OrderStatus,
        to: OrderStatus,
    ) -> Result<bool>;

    /// Removes an order row. Used to discard a `Pending` order whose
    /// reservation failed.
    async fn remove(&self, order_id: OrderId) -> Result<()>;
}

#[async_trait]
impl<S: OrderStore + ?Sized> OrderStore for std::sync::Arc<S> {
    async fn insert(&self, order: &Order) -> Result<()> {
        (**self).insert(order).await
    }

    async fn get(&self, order_id: OrderId) -> Result<Option<Order>> {
        (**self).get(order_id).await
    }

    async fn update_status(
        &self,
        order_id: OrderId,
        from: OrderStatus,
        to: OrderStatus,
    ) -> Result<bool> {
        (**self).update_status(order_id, from, to).await
    }

    async fn remove(&self, order_id: OrderId) -> Result<()> {
        (**self).remove(order_id).await
    }
}
