//! Order aggregate and its status state machine.

use chrono::{DateTime, Utc};
use common::{OrderId, ProductId, UserId};
use serde::{Deserialize, Serialize};

/// Lifecycle status of an order.
///
/// `Pending` is the persisted-but-unreserved state: the row exists but
/// no stock has been taken yet. Only `Active` orders hold stock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Pending,
    Active,
    Cancelled,
}

impl OrderStatus {
    /// An order can only be activated from `Pending`.
    pub fn can_activate(&self) -> bool {
        matches!(self, OrderStatus::Pending)
    }

    /// Only `Active` orders hold stock and can be cancelled.
    pub fn can_cancel(&self) -> bool {
        matches!(self, OrderStatus::Active)
    }

    /// Terminal states admit no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Cancelled)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "PENDING",
            OrderStatus::Active => "ACTIVE",
            OrderStatus::Cancelled => "CANCELLED",
        }
    }

    /// Parses the persisted representation.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "PENDING" => Some(OrderStatus::Pending),
            "ACTIVE" => Some(OrderStatus::Active),
            "CANCELLED" => Some(OrderStatus::Cancelled),
            _ => None,
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A buyer's order for a quantity of one product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub product_id: ProductId,
    pub buyer_id: UserId,
    pub quantity: u32,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
}

impl Order {
    /// Creates a fresh `Pending` order with a generated id.
    pub fn pending(product_id: ProductId, buyer_id: UserId, quantity: u32) -> Self {
        Self {
            id: OrderId::new(),
            product_id,
            buyer_id,
            quantity,
            status: OrderStatus::Pending,
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_orders_activate_but_do_not_cancel() {
        assert!(OrderStatus::Pending.can_activate());
        assert!(!OrderStatus::Pending.can_cancel());
        assert!(!OrderStatus::Pending.is_terminal());
    }

    #[test]
    fn active_orders_cancel_but_do_not_activate() {
        assert!(!OrderStatus::Active.can_activate());
        assert!(OrderStatus::Active.can_cancel());
        assert!(!OrderStatus::Active.is_terminal());
    }

    #[test]
    fn cancelled_is_terminal() {
        assert!(!OrderStatus::Cancelled.can_activate());
        assert!(!OrderStatus::Cancelled.can_cancel());
        assert!(OrderStatus::Cancelled.is_terminal());
    }

    #[test]
    fn status_round_trips_through_its_string_form() {
        for status in [
            OrderStatus::Pending,
            OrderStatus::Active,
            OrderStatus::Cancelled,
        ] {
            assert_eq!(OrderStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(OrderStatus::parse("SHIPPED"), None);
    }

    #[test]
    fn new_orders_start_pending() {
        let order = Order::pending(ProductId::new(), UserId::new(), 3);
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.quantity, 3);
    }
}
