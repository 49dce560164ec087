use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;

use stockkeep_core::{DomainError, Entity, ProductId, SaleId};
use stockkeep_inventory::{
    AddedWindow, DailyReport, Product, RegisterProduct, ReportDate, SaleEvent, SaleReceipt,
    SellProduct, plan_sale,
};

use super::{InventoryStore, PurgeSummary};
use crate::error::{InventoryError, InventoryResult};

#[derive(Debug, Default)]
struct State {
    products: BTreeMap<ProductId, Product>,
    sales: Vec<SaleEvent>,
    last_product_id: i64,
    last_sale_id: i64,
}

impl State {
    fn units_sold_from(&self, product_id: ProductId) -> InventoryResult<i64> {
        checked_total(
            self.sales
                .iter()
                .filter(|s| s.product_id == product_id)
                .map(|s| s.quantity_sold),
        )
    }
}

/// Sum that reports overflow the way SQLite's `SUM` does, as a storage error.
fn checked_total(values: impl IntoIterator<Item = i64>) -> InventoryResult<i64> {
    values.into_iter().try_fold(0i64, |acc, v| {
        acc.checked_add(v)
            .ok_or_else(|| InventoryError::Storage("integer overflow in report total".to_string()))
    })
}

/// In-memory inventory store.
///
/// Intended for tests/dev. Every operation runs under one lock, so a sale's
/// check and write cannot interleave with another sale.
#[derive(Debug, Default)]
pub struct InMemoryInventoryStore {
    state: RwLock<State>,
}

impl InMemoryInventoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> InventoryResult<RwLockReadGuard<'_, State>> {
        self.state
            .read()
            .map_err(|_| InventoryError::Storage("in-memory store lock poisoned".to_string()))
    }

    fn write(&self) -> InventoryResult<RwLockWriteGuard<'_, State>> {
        self.state
            .write()
            .map_err(|_| InventoryError::Storage("in-memory store lock poisoned".to_string()))
    }
}

#[async_trait]
impl InventoryStore for InMemoryInventoryStore {
    async fn register_product(&self, cmd: &RegisterProduct) -> InventoryResult<Product> {
        cmd.validate()?;

        let mut state = self.write()?;
        state.last_product_id += 1;
        let product = Product::from_registration(ProductId::new(state.last_product_id), cmd);
        state.products.insert(product.id(), product.clone());
        Ok(product)
    }

    async fn get_product(&self, id: ProductId) -> InventoryResult<Product> {
        let state = self.read()?;
        state
            .products
            .get(&id)
            .cloned()
            .ok_or_else(|| DomainError::not_found(id).into())
    }

    async fn list_products(&self) -> InventoryResult<Vec<Product>> {
        let state = self.read()?;
        Ok(state.products.values().cloned().collect())
    }

    async fn search_products(&self, query: &str) -> InventoryResult<Vec<Product>> {
        let needle = query.trim().to_ascii_lowercase();
        let state = self.read()?;
        Ok(state
            .products
            .values()
            .filter(|p| needle.is_empty() || p.name.to_ascii_lowercase().contains(&needle))
            .cloned()
            .collect())
    }

    async fn sell_product(&self, cmd: &SellProduct) -> InventoryResult<SaleReceipt> {
        let mut state = self.write()?;

        let available = state.products.get(&cmd.product_id).map(|p| p.quantity);
        let remaining = plan_sale(cmd, available)?;

        state.last_sale_id += 1;
        let sale = SaleEvent {
            id: SaleId::new(state.last_sale_id),
            product_id: cmd.product_id,
            quantity_sold: cmd.quantity,
            sold_at: cmd.sold_on(),
        };

        if let Some(product) = state.products.get_mut(&cmd.product_id) {
            product.quantity = remaining;
        }
        state.sales.push(sale.clone());

        Ok(SaleReceipt { sale, remaining })
    }

    async fn sales_for_product(&self, id: ProductId) -> InventoryResult<Vec<SaleEvent>> {
        let state = self.read()?;
        if !state.products.contains_key(&id) {
            return Err(DomainError::not_found(id).into());
        }
        Ok(state
            .sales
            .iter()
            .filter(|s| s.product_id == id)
            .cloned()
            .collect())
    }

    async fn daily_report(
        &self,
        date: ReportDate,
        window: AddedWindow,
    ) -> InventoryResult<DailyReport> {
        let state = self.read()?;

        let mut items_added = 0i64;
        for product in state
            .products
            .values()
            .filter(|p| window.includes(p.registered_at.date_naive(), date))
        {
            let sold = state.units_sold_from(product.id())?;
            let registered = checked_total([product.quantity, sold])?;
            items_added = checked_total([items_added, registered])?;
        }

        let items_sold = checked_total(
            state
                .sales
                .iter()
                .filter(|s| s.sold_at == date.date())
                .map(|s| s.quantity_sold),
        )?;

        Ok(DailyReport {
            date,
            window,
            items_added,
            items_sold,
        })
    }

    async fn purge_all(&self) -> InventoryResult<PurgeSummary> {
        let mut state = self.write()?;
        let summary = PurgeSummary {
            products_deleted: state.products.len() as u64,
            sales_deleted: state.sales.len() as u64,
        };
        state.products.clear();
        state.sales.clear();
        Ok(summary)
    }
}
