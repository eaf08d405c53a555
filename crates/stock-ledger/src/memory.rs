use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use common::ProductId;
use tokio::sync::RwLock;

use crate::{LedgerError, Result, StockRecord, StockStore};

/// In-memory stock store.
///
/// Backs tests and standalone (single-process) deployments, providing
/// the same interface as the PostgreSQL implementation. The write lock
/// plays the role of the storage engine: the conditional check and the
/// write happen inside one critical section, so concurrent decrements
/// on the same product serialize and the guard is never stale.
#[derive(Clone, Default)]
pub struct InMemoryStockStore {
    records: Arc<RwLock<HashMap<ProductId, StockRecord>>>,
}

impl InMemoryStockStore {
    /// Creates a new empty in-memory stock store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of records held.
    pub async fn record_count(&self) -> usize {
        self.records.read().await.len()
    }
}

#[async_trait]
impl StockStore for InMemoryStockStore {
    async fn create_record(
        &self,
        product_id: ProductId,
        initial_stock: i64,
    ) -> Result<StockRecord> {
        if initial_stock < 0 {
            return Err(LedgerError::InvalidStock {
                stock: initial_stock,
            });
        }

        let mut records = self.records.write().await;
        if records.contains_key(&product_id) {
            return Err(LedgerError::AlreadyExists { product_id });
        }

        let record = StockRecord::new(product_id, initial_stock);
        records.insert(product_id, record.clone());
        Ok(record)
    }

    async fn conditional_decrement(&self, product_id: ProductId, quantity: u32) -> Result<()> {
        let mut records = self.records.write().await;
        let record = records
            .get_mut(&product_id)
            .ok_or(LedgerError::NotFound { product_id })?;

        if record.stock < i64::from(quantity) {
            return Err(LedgerError::InsufficientStock {
                product_id,
                requested: quantity,
            });
        }

        record.stock -= i64::from(quantity);
        record.version += 1;
        Ok(())
    }

    async fn increment(&self, product_id: ProductId, quantity: u32) -> Result<()> {
        let mut records = self.records.write().await;
        let record = records
            .get_mut(&product_id)
            .ok_or(LedgerError::NotFound { product_id })?;

        record.stock += i64::from(quantity);
        record.version += 1;
        Ok(())
    }

    async fn set_on_shelf(&self, product_id: ProductId, on_shelf: bool) -> Result<()> {
        let mut records = self.records.write().await;
        let record = records
            .get_mut(&product_id)
            .ok_or(LedgerError::NotFound { product_id })?;

        record.on_shelf = on_shelf;
        record.version += 1;
        Ok(())
    }

    async fn delete_record(&self, product_id: ProductId) -> Result<()> {
        let mut records = self.records.write().await;
        records
            .remove(&product_id)
            .map(|_| ())
            .ok_or(LedgerError::NotFound { product_id })
    }

    async fn get_record(&self, product_id: ProductId) -> Result<Option<StockRecord>> {
        let records = self.records.read().await;
        Ok(records.get(&product_id).cloned())
    }

    async fn get_stocks_by_ids(&self, ids: &[ProductId]) -> Result<HashMap<ProductId, i64>> {
        let records = self.records.read().await;
        Ok(ids
            .iter()
            .filter_map(|id| records.get(id).map(|r| (*id, r.stock)))
            .collect())
    }

    async fn on_shelf_product_ids(&self) -> Result<Vec<ProductId>> {
        let records = self.records.read().await;
        Ok(records
            .values()
            .filter(|r| r.on_shelf)
            .map(|r| r.product_id)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn create_record_is_unique_per_product() {
        let store = InMemoryStockStore::new();
        let product_id = ProductId::new();

        let record = store.create_record(product_id, 10).await.unwrap();
        assert_eq!(record.stock, 10);
        assert!(!record.on_shelf);

        let result = store.create_record(product_id, 5).await;
        assert!(matches!(result, Err(LedgerError::AlreadyExists { .. })));

        // The original record is untouched by the failed re-creation.
        let record = store.get_record(product_id).await.unwrap().unwrap();
        assert_eq!(record.stock, 10);
    }

    #[tokio::test]
    async fn create_record_rejects_negative_stock() {
        let store = InMemoryStockStore::new();
        let result = store.create_record(ProductId::new(), -1).await;
        assert!(matches!(result, Err(LedgerError::InvalidStock { .. })));
    }

    #[tokio::test]
    async fn decrement_distinguishes_missing_from_insufficient() {
        let store = InMemoryStockStore::new();
        let product_id = ProductId::new();

        let result = store.conditional_decrement(product_id, 1).await;
        assert!(matches!(result, Err(LedgerError::NotFound { .. })));

        store.create_record(product_id, 3).await.unwrap();
        let result = store.conditional_decrement(product_id, 4).await;
        assert!(matches!(
            result,
            Err(LedgerError::InsufficientStock { requested: 4, .. })
        ));

        // The refused decrement left the count untouched.
        let record = store.get_record(product_id).await.unwrap().unwrap();
        assert_eq!(record.stock, 3);
    }

    #[tokio::test]
    async fn mutations_bump_the_version_token() {
        let store = InMemoryStockStore::new();
        let product_id = ProductId::new();
        store.create_record(product_id, 10).await.unwrap();

        store.conditional_decrement(product_id, 2).await.unwrap();
        store.increment(product_id, 1).await.unwrap();
        store.set_on_shelf(product_id, true).await.unwrap();

        let record = store.get_record(product_id).await.unwrap().unwrap();
        assert_eq!(record.stock, 9);
        assert_eq!(record.version, 3);
        assert!(record.on_shelf);
    }

    #[tokio::test]
    async fn increment_requires_an_existing_record() {
        let store = InMemoryStockStore::new();
        let result = store.increment(ProductId::new(), 5).await;
        assert!(matches!(result, Err(LedgerError::NotFound { .. })));
    }

    #[tokio::test]
    async fn set_on_shelf_is_idempotent() {
        let store = InMemoryStockStore::new();
        let product_id = ProductId::new();
        store.create_record(product_id, 1).await.unwrap();

        store.set_on_shelf(product_id, true).await.unwrap();
        store.set_on_shelf(product_id, true).await.unwrap();

        let record = store.get_record(product_id).await.unwrap().unwrap();
        assert!(record.on_shelf);
    }

    #[tokio::test]
    async fn batch_lookup_omits_missing_ids() {
        let store = InMemoryStockStore::new();
        let known = ProductId::new();
        let unknown = ProductId::new();
        store.create_record(known, 7).await.unwrap();

        let stocks = store.get_stocks_by_ids(&[known, unknown]).await.unwrap();
        assert_eq!(stocks.len(), 1);
        assert_eq!(stocks.get(&known), Some(&7));
        assert!(!stocks.contains_key(&unknown));
    }

    #[tokio::test]
    async fn on_shelf_listing_only_returns_shelved_products() {
        let store = InMemoryStockStore::new();
        let shelved = ProductId::new();
        let hidden = ProductId::new();
        store.create_record(shelved, 1).await.unwrap();
        store.create_record(hidden, 1).await.unwrap();
        store.set_on_shelf(shelved, true).await.unwrap();

        let ids = store.on_shelf_product_ids().await.unwrap();
        assert_eq!(ids, vec![shelved]);
    }

    #[tokio::test]
    async fn delete_record_removes_it() {
        let store = InMemoryStockStore::new();
        let product_id = ProductId::new();
        store.create_record(product_id, 1).await.unwrap();

        store.delete_record(product_id).await.unwrap();
        assert!(store.get_record(product_id).await.unwrap().is_none());

        let result = store.delete_record(product_id).await;
        assert!(matches!(result, Err(LedgerError::NotFound { .. })));
    }

    #[tokio::test]
    async fn decrement_then_increment_scenario() {
        // initialStock=10 → decrement(5) ok → decrement(6) refused →
        // increment(3) → stock=8.
        let store = InMemoryStockStore::new();
        let product_id = ProductId::new();
        store.create_record(product_id, 10).await.unwrap();

        store.conditional_decrement(product_id, 5).await.unwrap();
        assert_eq!(
            store.get_record(product_id).await.unwrap().unwrap().stock,
            5
        );

        let result = store.conditional_decrement(product_id, 6).await;
        assert!(matches!(
            result,
            Err(LedgerError::InsufficientStock { .. })
        ));
        assert_eq!(
            store.get_record(product_id).await.unwrap().unwrap().stock,
            5
        );

        store.increment(product_id, 3).await.unwrap();
        assert_eq!(
            store.get_record(product_id).await.unwrap().unwrap().stock,
            8
        );
    }
}
