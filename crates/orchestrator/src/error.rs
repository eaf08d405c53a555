//! Orchestrator error types.

use common::{OrderId, ProductId, UserId};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// The request failed local validation; no remote call was made.
    #[error("invalid order request: {reason}")]
    Validation { reason: String },

    /// The buyer is not known to the user directory.
    #[error("user {user_id} not found")]
    UserNotFound { user_id: UserId },

    /// The order does not exist.
    #[error("order {order_id} not found")]
    OrderNotFound { order_id: OrderId },

    /// The product has no stock record.
    #[error("product {product_id} not found")]
    ProductNotFound { product_id: ProductId },

    /// The ledger refused the reservation for lack of stock.
    #[error("insufficient stock for product {product_id}")]
    InsufficientStock { product_id: ProductId },

    /// The order is not in a state that admits the requested transition.
    #[error("order {order_id} conflict: {reason}")]
    Conflict { order_id: OrderId, reason: String },

    /// A dependency could not answer; the saga was rolled back.
    #[error("dependency unavailable: {reason}")]
    ServiceUnavailable { reason: String },

    /// Compensation itself failed and the system needs operator
    /// attention.
    #[error("order {order_id} left inconsistent: {reason}")]
    Inconsistency { order_id: OrderId, reason: String },

    #[error("order store error: {0}")]
    Store(#[from] sqlx::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn errors_render_their_context() {
        let order_id = OrderId::new();
        let err = OrchestratorError::Conflict {
            order_id,
            reason: "already cancelled".to_string(),
        };
        assert!(err.to_string().contains(&order_id.to_string()));
        assert!(err.to_string().contains("already cancelled"));
    }
}
