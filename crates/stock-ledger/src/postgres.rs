use std::collections::HashMap;

use async_trait::async_trait;
use common::ProductId;
use sqlx::{PgPool, Row, postgres::PgRow};
use uuid::Uuid;

use crate::{LedgerError, Result, StockRecord, StockStore};

/// PostgreSQL-backed stock store.
///
/// The conditional decrement is a single guarded `UPDATE`, so the
/// check-and-write is evaluated by the database and concurrent callers
/// can never observe a stale stock count between the check and the
/// write.
#[derive(Clone)]
pub struct PostgresStockStore {
    pool: PgPool,
}

impl PostgresStockStore {
    /// Creates a new PostgreSQL stock store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> std::result::Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("../../migrations").run(&self.pool).await
    }

    fn row_to_record(row: PgRow) -> Result<StockRecord> {
        Ok(StockRecord {
            product_id: ProductId::from_uuid(row.try_get::<Uuid, _>("product_id")?),
            stock: row.try_get("stock")?,
            version: row.try_get("version")?,
            on_shelf: row.try_get("on_shelf")?,
        })
    }
}

#[async_trait]
impl StockStore for PostgresStockStore {
    #[tracing::instrument(skip(self))]
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

        let result = sqlx::query(
            r#"
            INSERT INTO inventory (product_id, stock, version, on_shelf)
            VALUES ($1, $2, 0, FALSE)
            ON CONFLICT (product_id) DO NOTHING
            "#,
        )
        .bind(product_id.as_uuid())
        .bind(initial_stock)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(LedgerError::AlreadyExists { product_id });
        }

        Ok(StockRecord::new(product_id, initial_stock))
    }

    #[tracing::instrument(skip(self))]
    async fn conditional_decrement(&self, product_id: ProductId, quantity: u32) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE inventory
            SET stock = stock - $2, version = version + 1
            WHERE product_id = $1 AND stock >= $2
            "#,
        )
        .bind(product_id.as_uuid())
        .bind(i64::from(quantity))
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 1 {
            return Ok(());
        }

        // The guarded update refused. Classify after the fact: this read
        // only picks the error variant, it plays no part in the guard.
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM inventory WHERE product_id = $1)")
                .bind(product_id.as_uuid())
                .fetch_one(&self.pool)
                .await?;

        if exists {
            Err(LedgerError::InsufficientStock {
                product_id,
                requested: quantity,
            })
        } else {
            Err(LedgerError::NotFound { product_id })
        }
    }

    #[tracing::instrument(skip(self))]
    async fn increment(&self, product_id: ProductId, quantity: u32) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE inventory
            SET stock = stock + $2, version = version + 1
            WHERE product_id = $1
            "#,
        )
        .bind(product_id.as_uuid())
        .bind(i64::from(quantity))
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(LedgerError::NotFound { product_id });
        }
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn set_on_shelf(&self, product_id: ProductId, on_shelf: bool) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE inventory
            SET on_shelf = $2, version = version + 1
            WHERE product_id = $1
            "#,
        )
        .bind(product_id.as_uuid())
        .bind(on_shelf)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(LedgerError::NotFound { product_id });
        }
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn delete_record(&self, product_id: ProductId) -> Result<()> {
        let result = sqlx::query("DELETE FROM inventory WHERE product_id = $1")
            .bind(product_id.as_uuid())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(LedgerError::NotFound { product_id });
        }
        Ok(())
    }

    async fn get_record(&self, product_id: ProductId) -> Result<Option<StockRecord>> {
        let row = sqlx::query(
            "SELECT product_id, stock, version, on_shelf FROM inventory WHERE product_id = $1",
        )
        .bind(product_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_record).transpose()
    }

    async fn get_stocks_by_ids(&self, ids: &[ProductId]) -> Result<HashMap<ProductId, i64>> {
        let uuids: Vec<Uuid> = ids.iter().map(ProductId::as_uuid).collect();

        let rows = sqlx::query("SELECT product_id, stock FROM inventory WHERE product_id = ANY($1)")
            .bind(&uuids)
            .fetch_all(&self.pool)
            .await?;

        let mut stocks = HashMap::with_capacity(rows.len());
        for row in rows {
            let product_id = ProductId::from_uuid(row.try_get::<Uuid, _>("product_id")?);
            stocks.insert(product_id, row.try_get("stock")?);
        }
        Ok(stocks)
    }

    async fn on_shelf_product_ids(&self) -> Result<Vec<ProductId>> {
        let rows = sqlx::query("SELECT product_id FROM inventory WHERE on_shelf")
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter()
            .map(|row| {
                Ok(ProductId::from_uuid(
                    row.try_get::<Uuid, _>("product_id")?,
                ))
            })
            .collect()
    }
}
