//! Remote service proxy layer.
//!
//! Every cross-service call in the system goes through this crate: a
//! capability trait per dependency, HTTP implementations against the
//! peer's wire contract, and a guard that applies a bounded timeout and
//! a circuit breaker at construction time.
//!
//! Fallback behavior is keyed by call class, not uniform:
//! - strict calls (every mutation, plus the buyer existence check) fail
//!   with a typed `Unavailable` error — a mutation must never appear to
//!   succeed when the dependency could not be reached;
//! - degrading calls (batch stock lookup, on-shelf listing) fall back to
//!   an empty result set so the surrounding request can degrade instead
//!   of failing outright.

pub mod breaker;
pub mod error;
pub mod guard;
pub mod stock;
pub mod users;

pub use breaker::{BreakerState, CircuitBreaker};
pub use error::RemoteError;
pub use guard::Guard;
pub use stock::{GuardedStockService, HttpStockService, LocalStockService, StockService};
pub use users::{GuardedUserDirectory, HttpUserDirectory, InMemoryUserDirectory, UserDirectory};

/// Convenience alias for proxy-layer results.
pub type Result<T> = std::result::Result<T, RemoteError>;
