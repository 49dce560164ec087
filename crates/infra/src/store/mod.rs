//! Catalog + sales ledger persistence boundary.
//!
//! Both tables sit behind one store handle. Nothing is cached: each call
//! reads current state before acting.

pub mod in_memory;
pub mod sqlite;

pub use in_memory::InMemoryInventoryStore;
pub use sqlite::SqliteInventoryStore;

use async_trait::async_trait;
use serde::Serialize;

use stockkeep_core::ProductId;
use stockkeep_inventory::{
    AddedWindow, DailyReport, Product, RegisterProduct, ReportDate, SaleEvent, SaleReceipt,
    SellProduct,
};

use crate::error::InventoryResult;

/// Row counts removed by a purge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PurgeSummary {
    pub products_deleted: u64,
    pub sales_deleted: u64,
}

/// Inventory store abstraction.
#[async_trait]
pub trait InventoryStore: Send + Sync {
    /// Insert a new product. Validates the command first.
    async fn register_product(&self, cmd: &RegisterProduct) -> InventoryResult<Product>;

    /// Load one product, or `NotFound`.
    async fn get_product(&self, id: ProductId) -> InventoryResult<Product>;

    /// All products ordered by id.
    async fn list_products(&self) -> InventoryResult<Vec<Product>>;

    /// Products whose name contains `query` (ASCII case-insensitive).
    /// A blank query returns every product.
    async fn search_products(&self, query: &str) -> InventoryResult<Vec<Product>>;

    /// Check stock, decrement it and append a sale, as one atomic unit.
    async fn sell_product(&self, cmd: &SellProduct) -> InventoryResult<SaleReceipt>;

    /// Sales recorded against a product, oldest first.
    async fn sales_for_product(&self, id: ProductId) -> InventoryResult<Vec<SaleEvent>>;

    /// Units added and sold for one calendar date.
    async fn daily_report(
        &self,
        date: ReportDate,
        window: AddedWindow,
    ) -> InventoryResult<DailyReport>;

    /// Delete every sale and product in one transaction.
    ///
    /// Unguarded: callers go through `InventoryService::purge`, which
    /// authenticates and authorizes first.
    async fn purge_all(&self) -> InventoryResult<PurgeSummary>;
}

/// Escape `%`, `_` and `\` so a user query matches literally inside `LIKE`.
pub(crate) fn escape_like(query: &str) -> String {
    let mut escaped = String::with_capacity(query.len());
    for c in query.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
