//! The order saga itself.

use common::{OrderId, ProductId, UserId};
use remote::{RemoteError, StockService, UserDirectory};
use serde::Deserialize;

use crate::Result;
use crate::error::OrchestratorError;
use crate::order::{Order, OrderStatus};
use crate::store::OrderStore;

/// Request to place an order.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateOrderRequest {
    pub product_id: ProductId,
    pub buyer_id: UserId,
    pub quantity: u32,
}

/// Coordinates the order lifecycle across the order store, the stock
/// ledger and the user directory.
///
/// Orders are persisted `Pending` before any stock is reserved. A
/// failed reservation discards the pending row; a crash between the
/// two steps leaves a pending row that holds no stock, so nothing is
/// ever lost silently.
pub struct OrderOrchestrator<St, Sk, U> {
    orders: St,
    stock: Sk,
    users: U,
}

impl<St, Sk, U> OrderOrchestrator<St, Sk, U>
where
    St: OrderStore,
    Sk: StockService,
    U: UserDirectory,
{
    pub fn new(orders: St, stock: Sk, users: U) -> Self {
        Self {
            orders,
            stock,
            users,
        }
    }

    /// Places an order.
    ///
    /// Steps: validate, confirm the buyer, persist `Pending`, reserve
    /// stock, flip to `Active`. Each failure undoes exactly the steps
    /// already taken.
    #[tracing::instrument(skip(self, request), fields(
        product_id = %request.product_id,
        buyer_id = %request.buyer_id,
        quantity = request.quantity,
    ))]
    pub async fn create_order(&self, request: CreateOrderRequest) -> Result<Order> {
        if request.quantity == 0 {
            return Err(OrchestratorError::Validation {
                reason: "quantity must be positive".to_string(),
            });
        }

        self.users
            .user_exists(request.buyer_id)
            .await
            .map_err(|err| match err {
                RemoteError::NotFound { .. } => OrchestratorError::UserNotFound {
                    user_id: request.buyer_id,
                },
                other => OrchestratorError::ServiceUnavailable {
                    reason: other.to_string(),
                },
            })?;

        let order = Order::pending(request.product_id, request.buyer_id, request.quantity);
        self.orders.insert(&order).await?;

        if let Err(err) = self.stock.decrease(order.product_id, order.quantity).await {
            // No stock was taken; the pending row is inert and safe to
            // drop regardless of why the reservation failed.
            self.orders.remove(order.id).await?;
            metrics::counter!("orders_failed_total", "stage" => "reserve").increment(1);
            return Err(match err {
                RemoteError::InsufficientStock { product_id } => {
                    OrchestratorError::InsufficientStock { product_id }
                }
                RemoteError::NotFound { .. } => OrchestratorError::ProductNotFound {
                    product_id: order.product_id,
                },
                other => OrchestratorError::ServiceUnavailable {
                    reason: other.to_string(),
                },
            });
        }

        let activated = self
            .orders
            .update_status(order.id, OrderStatus::Pending, OrderStatus::Active)
            .await?;
        if !activated {
            // The pending row is gone or was moved under us. Give the
            // reserved stock back before reporting the conflict.
            tracing::warn!(order_id = %order.id, "pending order vanished before activation");
            self.release_stock(order.id, order.product_id, order.quantity)
                .await?;
            return Err(OrchestratorError::Conflict {
                order_id: order.id,
                reason: "order changed state during creation".to_string(),
            });
        }

        metrics::counter!("orders_created_total").increment(1);
        tracing::info!(order_id = %order.id, "order created");
        Ok(Order {
            status: OrderStatus::Active,
            ..order
        })
    }

    /// Cancels an active order, returning its stock to the ledger.
    ///
    /// The increment runs before the status flip. If the increment
    /// fails the order stays `Active` and the caller can retry; stock
    /// is never released on paper while the ledger was unreachable.
    #[tracing::instrument(skip(self))]
    pub async fn cancel_order(&self, order_id: OrderId) -> Result<Order> {
        let order = self
            .orders
            .get(order_id)
            .await?
            .ok_or(OrchestratorError::OrderNotFound { order_id })?;

        if !order.status.can_cancel() {
            return Err(OrchestratorError::Conflict {
                order_id,
                reason: format!("order is {}, only active orders cancel", order.status),
            });
        }

        self.stock
            .increase(order.product_id, order.quantity)
            .await
            .map_err(|err| match err {
                RemoteError::NotFound { resource } => OrchestratorError::Inconsistency {
                    order_id,
                    reason: format!("active order references missing {resource}"),
                },
                other => OrchestratorError::ServiceUnavailable {
                    reason: other.to_string(),
                },
            })?;

        let cancelled = self
            .orders
            .update_status(order_id, OrderStatus::Active, OrderStatus::Cancelled)
            .await?;
        if !cancelled {
            // A concurrent cancel won the flip after our increment went
            // through. Surface the conflict; the duplicate release
            // needs an operator's eye.
            tracing::warn!(order_id = %order_id, "lost the cancel race after releasing stock");
            return Err(OrchestratorError::Conflict {
                order_id,
                reason: "order was cancelled concurrently".to_string(),
            });
        }

        metrics::counter!("orders_cancelled_total").increment(1);
        tracing::info!(order_id = %order_id, "order cancelled");
        Ok(Order {
            status: OrderStatus::Cancelled,
            ..order
        })
    }

    /// Loads an order by id.
    pub async fn get_order(&self, order_id: OrderId) -> Result<Order> {
        self.orders
            .get(order_id)
            .await?
            .ok_or(OrchestratorError::OrderNotFound { order_id })
    }

    async fn release_stock(
        &self,
        order_id: OrderId,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<()> {
        self.stock
            .increase(product_id, quantity)
            .await
            .map_err(|err| OrchestratorError::Inconsistency {
                order_id,
                reason: format!("holds reserved stock that could not be released: {err}"),
            })
    }
}
