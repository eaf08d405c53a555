//! Ledger error types.

use common::ProductId;
use thiserror::Error;

/// Errors that can occur during stock ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// A stock record already exists for this product.
    #[error("stock record already exists for product {product_id}")]
    AlreadyExists { product_id: ProductId },

    /// No stock record exists for this product.
    #[error("no stock record for product {product_id}")]
    NotFound { product_id: ProductId },

    /// The decrement was refused because remaining stock is too low.
    ///
    /// This is a business outcome, not a fault: the conditional write
    /// evaluated its guard and declined to commit.
    #[error("insufficient stock for product {product_id}: requested {requested}")]
    InsufficientStock { product_id: ProductId, requested: u32 },

    /// A stock value that would violate the non-negative invariant.
    #[error("invalid stock value {stock}: stock must be >= 0")]
    InvalidStock { stock: i64 },

    /// Database error from the PostgreSQL-backed store.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}
