//! Order orchestrator.
//!
//! Runs the order lifecycle as a compensating sequence over the stock
//! ledger and the user directory. An order is persisted as `Pending`
//! before any stock is reserved, flipped to `Active` once the
//! reservation succeeds, and discarded if it does not, so a crash
//! between steps leaves an inert `Pending` row rather than a phantom
//! reservation.

pub mod error;
pub mod memory;
pub mod order;
pub mod postgres;
pub mod service;
pub mod store;

pub use error::OrchestratorError;
pub use memory::InMemoryOrderStore;
pub use order::{Order, OrderStatus};
pub use postgres::PostgresOrderStore;
pub use service::{CreateOrderRequest, OrderOrchestrator};
pub use store::OrderStore;

/// Convenience alias for orchestrator results.
pub type Result<T> = std::result::Result<T, OrchestratorError>;
