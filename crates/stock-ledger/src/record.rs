//! Stock record type.

use common::ProductId;
use serde::{Deserialize, Serialize};

/// A single product's stock entry in the ledger.
///
/// Exclusively owned and mutated by the stock store implementations;
/// callers only observe snapshots of it. `version` is a concurrency
/// token bumped on every mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockRecord {
    /// The product this record tracks (unique key).
    pub product_id: ProductId,

    /// Remaining stock. Never negative.
    pub stock: i64,

    /// Concurrency token, incremented by every committed mutation.
    pub version: i64,

    /// Whether the product is listed on the storefront.
    pub on_shelf: bool,
}

impl StockRecord {
    /// Creates a fresh record. New products start off-shelf.
    pub fn new(product_id: ProductId, stock: i64) -> Self {
        Self {
            product_id,
            stock,
            version: 0,
            on_shelf: false,
        }
    }
}
