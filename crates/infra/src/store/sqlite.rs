//! SQLite-backed inventory store.
//!
//! ## Schema
//!
//! Two tables, created on open if absent:
//!
//! - `products(id, name, quantity, price, registered_at)`
//! - `sales(id, product_id, quantity, sold_at)`
//!
//! `price` holds the decimal's canonical text, `registered_at` an RFC 3339 UTC
//! timestamp, `sold_at` a `YYYY-MM-DD` date. SQLite's `date()` understands
//! both, which is what the report queries rely on.
//!
//! ## Sale atomicity
//!
//! A sale opens its transaction with the guarded decrement
//! (`UPDATE ... WHERE quantity >= ?`), so the write lock is taken before any
//! stock is read. Competing sales queue on that lock for up to
//! [`BUSY_TIMEOUT`] instead of failing. When no row is updated the current
//! stock is read inside the same transaction to tell `NotFound` from
//! `InsufficientStock`; otherwise the ledger row is appended and both writes
//! commit together.

use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;
use tracing::instrument;

use stockkeep_core::{DomainError, ProductId, SaleId};
use stockkeep_inventory::{
    AddedWindow, DailyReport, Product, RegisterProduct, ReportDate, SaleEvent, SaleReceipt,
    SellProduct, UnitPrice, plan_sale,
};

use super::{InventoryStore, PurgeSummary, escape_like};
use crate::error::{InventoryError, InventoryResult};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// How long a connection waits for another connection's write lock.
pub const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const PRODUCT_COLUMNS: &str = "id, name, quantity, price, registered_at";

/// Registered units = stock still on hand + units sold from that product.
const ADDED_ON_DAY: &str = r#"
    SELECT COALESCE(SUM(p.quantity + COALESCE(
        (SELECT SUM(s.quantity) FROM sales s WHERE s.product_id = p.id), 0)), 0)
    FROM products p
    WHERE date(p.registered_at) = ?1
"#;

const ADDED_UP_TO: &str = r#"
    SELECT COALESCE(SUM(p.quantity + COALESCE(
        (SELECT SUM(s.quantity) FROM sales s WHERE s.product_id = p.id), 0)), 0)
    FROM products p
    WHERE date(p.registered_at) <= ?1
"#;

/// SQLite-backed catalog and sales ledger.
///
/// Cheap to clone; clones share the same connection pool.
#[derive(Debug, Clone)]
pub struct SqliteInventoryStore {
    pool: SqlitePool,
}

impl SqliteInventoryStore {
    /// Open (creating if missing) the database file at `path` and ensure the schema.
    pub async fn open(path: impl AsRef<Path>) -> InventoryResult<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    InventoryError::Storage(format!(
                        "failed to create database directory at {:?}: {}",
                        parent, e
                    ))
                })?;
            }
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .foreign_keys(true)
            .busy_timeout(BUSY_TIMEOUT);

        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(options)
            .await
            .map_err(|e| map_sqlx_error("open", e))?;

        tracing::debug!(path = %path.display(), "opened inventory database");
        Self::with_pool(pool).await
    }

    /// Open a private in-memory database (tests/dev).
    ///
    /// The pool is pinned to one connection that never expires; every
    /// connection to `:memory:` would otherwise see its own empty database.
    pub async fn open_in_memory() -> InventoryResult<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")
            .map_err(|e| map_sqlx_error("open_in_memory", e))?
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .map_err(|e| map_sqlx_error("open_in_memory", e))?;

        Self::with_pool(pool).await
    }

    /// Wrap an existing pool and ensure the schema exists.
    pub async fn with_pool(pool: SqlitePool) -> InventoryResult<Self> {
        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    /// Close every pooled connection. Further calls fail with a storage error.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    async fn migrate(&self) -> InventoryResult<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS products (
                id            INTEGER PRIMARY KEY,
                name          TEXT NOT NULL,
                quantity      INTEGER NOT NULL CHECK (quantity >= 0),
                price         TEXT NOT NULL,
                registered_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("create_products_table", e))?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS sales (
                id         INTEGER PRIMARY KEY,
                product_id INTEGER NOT NULL REFERENCES products (id),
                quantity   INTEGER NOT NULL CHECK (quantity > 0),
                sold_at    TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("create_sales_table", e))?;

        sqlx::query("CREATE INDEX IF NOT EXISTS sales_sold_at ON sales (sold_at)")
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("create_sales_index", e))?;

        Ok(())
    }
}

#[async_trait]
impl InventoryStore for SqliteInventoryStore {
    #[instrument(skip(self, cmd), fields(name = %cmd.name, quantity = cmd.quantity), err)]
    async fn register_product(&self, cmd: &RegisterProduct) -> InventoryResult<Product> {
        cmd.validate()?;

        let result = sqlx::query(
            r#"
            INSERT INTO products (name, quantity, price, registered_at)
            VALUES (?1, ?2, ?3, ?4)
            "#,
        )
        .bind(cmd.name.trim())
        .bind(cmd.quantity)
        .bind(cmd.unit_price.to_string())
        .bind(encode_timestamp(cmd.occurred_at))
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_product", e))?;

        let id = ProductId::new(result.last_insert_rowid());
        Ok(Product::from_registration(id, cmd))
    }

    #[instrument(skip(self, id), fields(product_id = %id), err)]
    async fn get_product(&self, id: ProductId) -> InventoryResult<Product> {
        let row = sqlx::query(&format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1"))
            .bind(id.get())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_product", e))?;

        match row {
            Some(row) => product_from_row(&row),
            None => Err(DomainError::not_found(id).into()),
        }
    }

    #[instrument(skip(self), err)]
    async fn list_products(&self) -> InventoryResult<Vec<Product>> {
        let rows = sqlx::query(&format!("SELECT {PRODUCT_COLUMNS} FROM products ORDER BY id"))
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_products", e))?;

        rows.iter().map(product_from_row).collect()
    }

    #[instrument(skip(self), err)]
    async fn search_products(&self, query: &str) -> InventoryResult<Vec<Product>> {
        let query = query.trim();
        if query.is_empty() {
            return self.list_products().await;
        }

        let pattern = format!("%{}%", escape_like(query));
        let rows = sqlx::query(&format!(
            r"SELECT {PRODUCT_COLUMNS} FROM products WHERE name LIKE ?1 ESCAPE '\' ORDER BY id"
        ))
        .bind(pattern)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("search_products", e))?;

        rows.iter().map(product_from_row).collect()
    }

    #[instrument(
        skip(self, cmd),
        fields(product_id = %cmd.product_id, quantity = cmd.quantity),
        err
    )]
    async fn sell_product(&self, cmd: &SellProduct) -> InventoryResult<SaleReceipt> {
        cmd.validate()?;
        let product_id = cmd.product_id;

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;

        // 1) Decrement first so the write lock is held before stock is read
        let updated = sqlx::query(
            "UPDATE products SET quantity = quantity - ?1 WHERE id = ?2 AND quantity >= ?1",
        )
        .bind(cmd.quantity)
        .bind(product_id.get())
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("update_stock", e))?;

        // 2) Read stock under that lock: the result after a decrement, or the
        //    reason there was none
        let current: Option<i64> =
            sqlx::query_scalar("SELECT quantity FROM products WHERE id = ?1")
                .bind(product_id.get())
                .fetch_optional(&mut *tx)
                .await
                .map_err(|e| map_sqlx_error("read_stock", e))?;

        // 3) Decide
        let remaining = if updated.rows_affected() == 1 {
            current.unwrap_or_default()
        } else {
            tx.rollback()
                .await
                .map_err(|e| map_sqlx_error("rollback", e))?;
            let err = match plan_sale(cmd, current) {
                Err(err) => err,
                Ok(_) => DomainError::insufficient_stock(
                    product_id,
                    cmd.quantity,
                    current.unwrap_or_default(),
                ),
            };
            return Err(err.into());
        };

        // 4) Append to the ledger
        let sold_at = cmd.sold_on();
        let inserted = match sqlx::query(
            "INSERT INTO sales (product_id, quantity, sold_at) VALUES (?1, ?2, ?3)",
        )
        .bind(product_id.get())
        .bind(cmd.quantity)
        .bind(sold_at.format(DATE_FORMAT).to_string())
        .execute(&mut *tx)
        .await
        {
            Ok(inserted) => inserted,
            Err(err) => {
                // Undo the decrement along with the failed ledger row.
                tx.rollback()
                    .await
                    .map_err(|e| map_sqlx_error("rollback", e))?;
                return Err(map_sqlx_error("insert_sale", err));
            }
        };

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))?;

        Ok(SaleReceipt {
            sale: SaleEvent {
                id: SaleId::new(inserted.last_insert_rowid()),
                product_id,
                quantity_sold: cmd.quantity,
                sold_at,
            },
            remaining,
        })
    }

    #[instrument(skip(self, id), fields(product_id = %id), err)]
    async fn sales_for_product(&self, id: ProductId) -> InventoryResult<Vec<SaleEvent>> {
        // Distinguish "no sales" from "no such product".
        self.get_product(id).await?;

        let rows = sqlx::query(
            "SELECT id, product_id, quantity, sold_at FROM sales WHERE product_id = ?1 ORDER BY id",
        )
        .bind(id.get())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("sales_for_product", e))?;

        rows.iter().map(sale_from_row).collect()
    }

    #[instrument(skip(self, date, window), fields(date = %date, window = %window), err)]
    async fn daily_report(
        &self,
        date: ReportDate,
        window: AddedWindow,
    ) -> InventoryResult<DailyReport> {
        let day = date.date().format(DATE_FORMAT).to_string();
        let added_sql = match window {
            AddedWindow::OnDay => ADDED_ON_DAY,
            AddedWindow::UpToAndIncluding => ADDED_UP_TO,
        };

        // One read transaction so both totals see the same snapshot.
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;

        let items_added: i64 = sqlx::query_scalar(added_sql)
            .bind(day.as_str())
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("sum_items_added", e))?;

        let items_sold: i64 =
            sqlx::query_scalar("SELECT COALESCE(SUM(quantity), 0) FROM sales WHERE sold_at = ?1")
                .bind(day.as_str())
                .fetch_one(&mut *tx)
                .await
                .map_err(|e| map_sqlx_error("sum_items_sold", e))?;

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))?;

        Ok(DailyReport {
            date,
            window,
            items_added,
            items_sold,
        })
    }

    #[instrument(skip(self), err)]
    async fn purge_all(&self) -> InventoryResult<PurgeSummary> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;

        // Sales first: they reference products.
        let sales = sqlx::query("DELETE FROM sales")
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("delete_sales", e))?;

        let products = sqlx::query("DELETE FROM products")
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("delete_products", e))?;

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))?;

        Ok(PurgeSummary {
            products_deleted: products.rows_affected(),
            sales_deleted: sales.rows_affected(),
        })
    }
}

fn encode_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

fn product_from_row(row: &SqliteRow) -> InventoryResult<Product> {
    let id: i64 = row.try_get("id").map_err(|e| corrupt("products.id", e))?;
    let name: String = row.try_get("name").map_err(|e| corrupt("products.name", e))?;
    let quantity: i64 = row.try_get("quantity").map_err(|e| corrupt("products.quantity", e))?;
    let price: String = row.try_get("price").map_err(|e| corrupt("products.price", e))?;
    let registered_at: String = row
        .try_get("registered_at")
        .map_err(|e| corrupt("products.registered_at", e))?;

    let unit_price = UnitPrice::from_str(&price).map_err(|e| corrupt("products.price", e))?;
    let registered_at = DateTime::parse_from_rfc3339(&registered_at)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| corrupt("products.registered_at", e))?;

    Ok(Product {
        id: ProductId::new(id),
        name,
        quantity,
        unit_price,
        registered_at,
    })
}

fn sale_from_row(row: &SqliteRow) -> InventoryResult<SaleEvent> {
    let id: i64 = row.try_get("id").map_err(|e| corrupt("sales.id", e))?;
    let product_id: i64 = row.try_get("product_id").map_err(|e| corrupt("sales.product_id", e))?;
    let quantity: i64 = row.try_get("quantity").map_err(|e| corrupt("sales.quantity", e))?;
    let sold_at: String = row.try_get("sold_at").map_err(|e| corrupt("sales.sold_at", e))?;

    let sold_at =
        NaiveDate::parse_from_str(&sold_at, DATE_FORMAT).map_err(|e| corrupt("sales.sold_at", e))?;

    Ok(SaleEvent {
        id: SaleId::new(id),
        product_id: ProductId::new(product_id),
        quantity_sold: quantity,
        sold_at,
    })
}

fn corrupt(column: &str, err: impl core::fmt::Display) -> InventoryError {
    InventoryError::Corrupt(format!("{}: {}", column, err))
}

fn map_sqlx_error(operation: &str, err: sqlx::Error) -> InventoryError {
    match err {
        sqlx::Error::Database(db_err) => InventoryError::Storage(format!(
            "database error in {}: {}",
            operation,
            db_err.message()
        )),
        sqlx::Error::PoolClosed => {
            InventoryError::Storage(format!("connection pool closed in {}", operation))
        }
        _ => InventoryError::Storage(format!("sqlx error in {}: {}", operation, err)),
    }
}
