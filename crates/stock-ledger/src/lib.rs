//! Stock ledger: the authoritative per-product stock count.
//!
//! The one hard requirement here is that a decrement only commits when
//! enough stock remains, evaluated as a single atomic conditional write
//! inside the storage layer. Read-then-write sequences in caller code
//! admit a lost-update race between concurrent callers and are therefore
//! not offered by this crate's API at all.

pub mod error;
pub mod memory;
pub mod postgres;
pub mod record;
pub mod store;

pub use error::LedgerError;
pub use memory::InMemoryStockStore;
pub use postgres::PostgresStockStore;
pub use record::StockRecord;
pub use store::StockStore;

/// Convenience alias for ledger results.
pub type Result<T> = std::result::Result<T, LedgerError>;
