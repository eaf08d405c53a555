//! Stock service capability: trait, HTTP client, local adapter, guard.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use common::ProductId;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use stock_ledger::{LedgerError, StockStore};

use crate::error::RemoteError;
use crate::guard::Guard;

/// The stock ledger as seen from other services.
///
/// `decrease`, `increase`, `create_record`, `set_on_shelf` and
/// `delete_record` are strict-class calls; `stocks_by_ids` and
/// `on_shelf_product_ids` are degrading-class reads.
#[async_trait]
pub trait StockService: Send + Sync {
    /// Reserves stock: atomically decrements iff enough remains.
    async fn decrease(&self, product_id: ProductId, quantity: u32) -> Result<(), RemoteError>;

    /// Releases stock: unconditional increment, used for compensation.
    async fn increase(&self, product_id: ProductId, quantity: u32) -> Result<(), RemoteError>;

    /// Creates the ledger record for a new product.
    async fn create_record(&self, product_id: ProductId, initial_stock: i64)
    -> Result<(), RemoteError>;

    /// Updates the product's on-shelf flag.
    async fn set_on_shelf(&self, product_id: ProductId, on_shelf: bool) -> Result<(), RemoteError>;

    /// Removes the ledger record.
    async fn delete_record(&self, product_id: ProductId) -> Result<(), RemoteError>;

    /// Batch stock lookup; missing ids are omitted.
    async fn stocks_by_ids(
        &self,
        ids: &[ProductId],
    ) -> Result<HashMap<ProductId, i64>, RemoteError>;

    /// Ids of all on-shelf products.
    async fn on_shelf_product_ids(&self) -> Result<Vec<ProductId>, RemoteError>;
}

#[async_trait]
impl<S: StockService + ?Sized> StockService for Arc<S> {
    async fn decrease(&self, product_id: ProductId, quantity: u32) -> Result<(), RemoteError> {
        (**self).decrease(product_id, quantity).await
    }

    async fn increase(&self, product_id: ProductId, quantity: u32) -> Result<(), RemoteError> {
        (**self).increase(product_id, quantity).await
    }

    async fn create_record(
        &self,
        product_id: ProductId,
        initial_stock: i64,
    ) -> Result<(), RemoteError> {
        (**self).create_record(product_id, initial_stock).await
    }

    async fn set_on_shelf(&self, product_id: ProductId, on_shelf: bool) -> Result<(), RemoteError> {
        (**self).set_on_shelf(product_id, on_shelf).await
    }

    async fn delete_record(&self, product_id: ProductId) -> Result<(), RemoteError> {
        (**self).delete_record(product_id).await
    }

    async fn stocks_by_ids(
        &self,
        ids: &[ProductId],
    ) -> Result<HashMap<ProductId, i64>, RemoteError> {
        (**self).stocks_by_ids(ids).await
    }

    async fn on_shelf_product_ids(&self) -> Result<Vec<ProductId>, RemoteError> {
        (**self).on_shelf_product_ids().await
    }
}

/// Wire shape shared by the decrease/increase endpoints.
#[derive(Debug, Serialize, Deserialize)]
pub struct StockMutation {
    pub product_id: ProductId,
    pub quantity: u32,
}

#[derive(Debug, Serialize)]
struct CreateRecordBody {
    product_id: ProductId,
    stock: i64,
}

#[derive(Debug, Serialize)]
struct BatchBody<'a> {
    product_ids: &'a [ProductId],
}

const STOCK_SERVICE: &str = "stock-service";

/// HTTP client for a remote stock ledger.
#[derive(Debug, Clone)]
pub struct HttpStockService {
    http: reqwest::Client,
    base_url: String,
}

impl HttpStockService {
    /// Creates a client against `base_url` with a per-request timeout.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn transport(err: reqwest::Error) -> RemoteError {
        RemoteError::Unavailable {
            service: STOCK_SERVICE,
            reason: err.to_string(),
        }
    }

    fn unexpected(status: StatusCode) -> RemoteError {
        RemoteError::Unavailable {
            service: STOCK_SERVICE,
            reason: format!("unexpected status {status}"),
        }
    }
}

#[async_trait]
impl StockService for HttpStockService {
    async fn decrease(&self, product_id: ProductId, quantity: u32) -> Result<(), RemoteError> {
        let response = self
            .http
            .post(self.url("/stock/decrease"))
            .json(&StockMutation {
                product_id,
                quantity,
            })
            .send()
            .await
            .map_err(Self::transport)?;

        match response.status() {
            StatusCode::OK => Ok(()),
            StatusCode::CONFLICT => Err(RemoteError::InsufficientStock { product_id }),
            StatusCode::BAD_REQUEST | StatusCode::NOT_FOUND => Err(RemoteError::NotFound {
                resource: format!("stock record {product_id}"),
            }),
            status => Err(Self::unexpected(status)),
        }
    }

    async fn increase(&self, product_id: ProductId, quantity: u32) -> Result<(), RemoteError> {
        let response = self
            .http
            .post(self.url("/stock/increase"))
            .json(&StockMutation {
                product_id,
                quantity,
            })
            .send()
            .await
            .map_err(Self::transport)?;

        match response.status() {
            StatusCode::OK => Ok(()),
            StatusCode::NOT_FOUND => Err(RemoteError::NotFound {
                resource: format!("stock record {product_id}"),
            }),
            status => Err(Self::unexpected(status)),
        }
    }

    async fn create_record(
        &self,
        product_id: ProductId,
        initial_stock: i64,
    ) -> Result<(), RemoteError> {
        let response = self
            .http
            .post(self.url("/stock"))
            .json(&CreateRecordBody {
                product_id,
                stock: initial_stock,
            })
            .send()
            .await
            .map_err(Self::transport)?;

        match response.status() {
            StatusCode::CREATED => Ok(()),
            StatusCode::CONFLICT => Err(RemoteError::AlreadyExists { product_id }),
            StatusCode::BAD_REQUEST => Err(RemoteError::Invalid {
                reason: format!("create refused for product {product_id}"),
            }),
            status => Err(Self::unexpected(status)),
        }
    }

    async fn set_on_shelf(&self, product_id: ProductId, on_shelf: bool) -> Result<(), RemoteError> {
        let response = self
            .http
            .put(self.url(&format!("/stock/{product_id}/on-shelf")))
            .query(&[("on_shelf", on_shelf)])
            .send()
            .await
            .map_err(Self::transport)?;

        match response.status() {
            StatusCode::OK => Ok(()),
            StatusCode::NOT_FOUND => Err(RemoteError::NotFound {
                resource: format!("stock record {product_id}"),
            }),
            status => Err(Self::unexpected(status)),
        }
    }

    async fn delete_record(&self, product_id: ProductId) -> Result<(), RemoteError> {
        let response = self
            .http
            .delete(self.url(&format!("/stock/{product_id}")))
            .send()
            .await
            .map_err(Self::transport)?;

        match response.status() {
            StatusCode::NO_CONTENT => Ok(()),
            StatusCode::NOT_FOUND => Err(RemoteError::NotFound {
                resource: format!("stock record {product_id}"),
            }),
            status => Err(Self::unexpected(status)),
        }
    }

    async fn stocks_by_ids(
        &self,
        ids: &[ProductId],
    ) -> Result<HashMap<ProductId, i64>, RemoteError> {
        let response = self
            .http
            .post(self.url("/stock/batch"))
            .json(&BatchBody { product_ids: ids })
            .send()
            .await
            .map_err(Self::transport)?;

        if response.status() != StatusCode::OK {
            return Err(Self::unexpected(response.status()));
        }
        response.json().await.map_err(Self::transport)
    }

    async fn on_shelf_product_ids(&self) -> Result<Vec<ProductId>, RemoteError> {
        let response = self
            .http
            .get(self.url("/stock/on-shelf-product-ids"))
            .send()
            .await
            .map_err(Self::transport)?;

        if response.status() != StatusCode::OK {
            return Err(Self::unexpected(response.status()));
        }
        response.json().await.map_err(Self::transport)
    }
}

/// In-process adapter over a [`StockStore`].
///
/// Used when the ledger runs inside the same process (standalone mode
/// and tests); presents the identical capability surface the HTTP
/// client does, so the orchestrator cannot tell the difference.
#[derive(Debug, Clone)]
pub struct LocalStockService<S> {
    store: S,
}

impl<S> LocalStockService<S> {
    /// Wraps a stock store.
    pub fn new(store: S) -> Self {
        Self { store }
    }
}

fn map_ledger_error(err: LedgerError) -> RemoteError {
    match err {
        LedgerError::AlreadyExists { product_id } => RemoteError::AlreadyExists { product_id },
        LedgerError::NotFound { product_id } => RemoteError::NotFound {
            resource: format!("stock record {product_id}"),
        },
        LedgerError::InsufficientStock { product_id, .. } => {
            RemoteError::InsufficientStock { product_id }
        }
        LedgerError::InvalidStock { stock } => RemoteError::Invalid {
            reason: format!("invalid stock value {stock}"),
        },
        LedgerError::Database(e) => RemoteError::Unavailable {
            service: STOCK_SERVICE,
            reason: e.to_string(),
        },
    }
}

#[async_trait]
impl<S: StockStore> StockService for LocalStockService<S> {
    async fn decrease(&self, product_id: ProductId, quantity: u32) -> Result<(), RemoteError> {
        self.store
            .conditional_decrement(product_id, quantity)
            .await
            .map_err(map_ledger_error)
    }

    async fn increase(&self, product_id: ProductId, quantity: u32) -> Result<(), RemoteError> {
        self.store
            .increment(product_id, quantity)
            .await
            .map_err(map_ledger_error)
    }

    async fn create_record(
        &self,
        product_id: ProductId,
        initial_stock: i64,
    ) -> Result<(), RemoteError> {
        self.store
            .create_record(product_id, initial_stock)
            .await
            .map(|_| ())
            .map_err(map_ledger_error)
    }

    async fn set_on_shelf(&self, product_id: ProductId, on_shelf: bool) -> Result<(), RemoteError> {
        self.store
            .set_on_shelf(product_id, on_shelf)
            .await
            .map_err(map_ledger_error)
    }

    async fn delete_record(&self, product_id: ProductId) -> Result<(), RemoteError> {
        self.store
            .delete_record(product_id)
            .await
            .map_err(map_ledger_error)
    }

    async fn stocks_by_ids(
        &self,
        ids: &[ProductId],
    ) -> Result<HashMap<ProductId, i64>, RemoteError> {
        self.store
            .get_stocks_by_ids(ids)
            .await
            .map_err(map_ledger_error)
    }

    async fn on_shelf_product_ids(&self) -> Result<Vec<ProductId>, RemoteError> {
        self.store
            .on_shelf_product_ids()
            .await
            .map_err(map_ledger_error)
    }
}

/// [`StockService`] with the guard applied to every call.
///
/// Constructed once at wiring time; the per-call-class fallback choice
/// lives here, not in the callers.
#[derive(Debug, Clone)]
pub struct GuardedStockService<S> {
    inner: Arc<S>,
    guard: Guard,
}

impl<S> GuardedStockService<S> {
    /// Wraps an inner stock service with a guard.
    pub fn new(inner: S, guard: Guard) -> Self {
        Self {
            inner: Arc::new(inner),
            guard,
        }
    }

    /// Returns the guard, for observability.
    pub fn guard(&self) -> &Guard {
        &self.guard
    }
}

#[async_trait]
impl<S: StockService + 'static> StockService for GuardedStockService<S> {
    async fn decrease(&self, product_id: ProductId, quantity: u32) -> Result<(), RemoteError> {
        let inner = self.inner.clone();
        self.guard
            .strict("stock.decrease", async move {
                inner.decrease(product_id, quantity).await
            })
            .await
    }

    async fn increase(&self, product_id: ProductId, quantity: u32) -> Result<(), RemoteError> {
        let inner = self.inner.clone();
        self.guard
            .strict("stock.increase", async move {
                inner.increase(product_id, quantity).await
            })
            .await
    }

    async fn create_record(
        &self,
        product_id: ProductId,
        initial_stock: i64,
    ) -> Result<(), RemoteError> {
        let inner = self.inner.clone();
        self.guard
            .strict("stock.create_record", async move {
                inner.create_record(product_id, initial_stock).await
            })
            .await
    }

    async fn set_on_shelf(&self, product_id: ProductId, on_shelf: bool) -> Result<(), RemoteError> {
        let inner = self.inner.clone();
        self.guard
            .strict("stock.set_on_shelf", async move {
                inner.set_on_shelf(product_id, on_shelf).await
            })
            .await
    }

    async fn delete_record(&self, product_id: ProductId) -> Result<(), RemoteError> {
        let inner = self.inner.clone();
        self.guard
            .strict("stock.delete_record", async move {
                inner.delete_record(product_id).await
            })
            .await
    }

    async fn stocks_by_ids(
        &self,
        ids: &[ProductId],
    ) -> Result<HashMap<ProductId, i64>, RemoteError> {
        let inner = self.inner.clone();
        let ids = ids.to_vec();
        Ok(self
            .guard
            .degrading("stock.stocks_by_ids", async move {
                inner.stocks_by_ids(&ids).await
            })
            .await)
    }

    async fn on_shelf_product_ids(&self) -> Result<Vec<ProductId>, RemoteError> {
        let inner = self.inner.clone();
        Ok(self
            .guard
            .degrading("stock.on_shelf_product_ids", async move {
                inner.on_shelf_product_ids().await
            })
            .await)
    }
}
