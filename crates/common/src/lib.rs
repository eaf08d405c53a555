//! Shared identifier types used across the order and stock services.

mod types;

pub use types::{OrderId, ProductId, UserId};
