//! Stock store trait.

use std::collections::HashMap;

use async_trait::async_trait;
use common::ProductId;

use crate::{Result, StockRecord};

/// Storage abstraction for the stock ledger.
///
/// Implementations must execute `conditional_decrement` as one atomic
/// check-and-write inside the storage engine itself. An in-process lock
/// is acceptable only when the store *is* the storage engine (the
/// in-memory implementation); it is never acceptable in caller code,
/// because the orchestrator and the ledger may be separate processes.
#[async_trait]
pub trait StockStore: Send + Sync {
    /// Creates a stock record for a product.
    ///
    /// Fails with `AlreadyExists` if a record for the product is already
    /// present — creation is not idempotent by design, so a duplicate
    /// product registration is surfaced instead of silently absorbed.
    async fn create_record(&self, product_id: ProductId, initial_stock: i64)
    -> Result<StockRecord>;

    /// Atomically applies `stock -= quantity` iff `stock >= quantity`.
    ///
    /// Returns `InsufficientStock` when the guard refuses the write and
    /// `NotFound` when no record exists, so callers can tell a business
    /// refusal from a missing product.
    async fn conditional_decrement(&self, product_id: ProductId, quantity: u32) -> Result<()>;

    /// Unconditionally applies `stock += quantity` if the record exists.
    ///
    /// Used for compensation: it must never refuse merely because other
    /// mutations are concurrently in flight.
    async fn increment(&self, product_id: ProductId, quantity: u32) -> Result<()>;

    /// Sets the on-shelf flag. Idempotent; `NotFound` if absent.
    async fn set_on_shelf(&self, product_id: ProductId, on_shelf: bool) -> Result<()>;

    /// Removes a stock record. `NotFound` if absent.
    async fn delete_record(&self, product_id: ProductId) -> Result<()>;

    /// Loads a single record, or `None` if the product is unknown.
    async fn get_record(&self, product_id: ProductId) -> Result<Option<StockRecord>>;

    /// Batch stock lookup. Missing ids are omitted from the result,
    /// never reported as an error.
    async fn get_stocks_by_ids(&self, ids: &[ProductId]) -> Result<HashMap<ProductId, i64>>;

    /// Lists the ids of all on-shelf products.
    async fn on_shelf_product_ids(&self) -> Result<Vec<ProductId>>;
}

#[async_trait]
impl<S: StockStore + ?Sized> StockStore for std::sync::Arc<S> {
    async fn create_record(
        &self,
        product_id: ProductId,
        initial_stock: i64,
    ) -> Result<StockRecord> {
        (**self).create_record(product_id, initial_stock).await
    }

    async fn conditional_decrement(&self, product_id: ProductId, quantity: u32) -> Result<()> {
        (**self).conditional_decrement(product_id, quantity).await
    }

    async fn increment(&self, product_id: ProductId, quantity: u32) -> Result<()> {
        (**self).increment(product_id, quantity).await
    }

    async fn set_on_shelf(&self, product_id: ProductId, on_shelf: bool) -> Result<()> {
        (**self).set_on_shelf(product_id, on_shelf).await
    }

    async fn delete_record(&self, product_id: ProductId) -> Result<()> {
        (**self).delete_record(product_id).await
    }

    async fn get_record(&self, product_id: ProductId) -> Result<Option<StockRecord>> {
        (**self).get_record(product_id).await
    }

    async fn get_stocks_by_ids(&self, ids: &[ProductId]) -> Result<HashMap<ProductId, i64>> {
        (**self).get_stocks_by_ids(ids).await
    }

    async fn on_shelf_product_ids(&self) -> Result<Vec<ProductId>> {
        (**self).on_shelf_product_ids().await
    }
}
