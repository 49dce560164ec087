//! Service facade: the single entry point front ends call.
//!
//! Holds the injected store and authenticator, applies the configured
//! report window, and gates the destructive purge behind authentication and
//! the `catalog.purge` permission.

use std::sync::Arc;

use stockkeep_auth::{Authenticator, Credentials, Permission, authorize};
use stockkeep_core::ProductId;
use stockkeep_inventory::{
    AddedWindow, DailyReport, Product, RegisterProduct, ReportDate, SaleEvent, SaleReceipt,
    SellProduct,
};

use crate::error::{InventoryError, InventoryResult};
use crate::store::{InventoryStore, PurgeSummary};

#[derive(Clone)]
pub struct InventoryService {
    store: Arc<dyn InventoryStore>,
    authenticator: Arc<dyn Authenticator>,
    added_window: AddedWindow,
}

impl InventoryService {
    pub fn new(store: Arc<dyn InventoryStore>, authenticator: Arc<dyn Authenticator>) -> Self {
        Self {
            store,
            authenticator,
            added_window: AddedWindow::default(),
        }
    }

    pub fn with_added_window(mut self, window: AddedWindow) -> Self {
        self.added_window = window;
        self
    }

    pub fn added_window(&self) -> AddedWindow {
        self.added_window
    }

    pub fn store(&self) -> &Arc<dyn InventoryStore> {
        &self.store
    }

    pub async fn add_product(&self, cmd: RegisterProduct) -> InventoryResult<Product> {
        let product = self.store.register_product(&cmd).await?;
        tracing::info!(
            product_id = %product.id,
            name = %product.name,
            quantity = product.quantity,
            "product registered"
        );
        Ok(product)
    }

    pub async fn sell(&self, cmd: SellProduct) -> InventoryResult<SaleReceipt> {
        match self.store.sell_product(&cmd).await {
            Ok(receipt) => {
                tracing::info!(
                    product_id = %cmd.product_id,
                    sale_id = %receipt.sale.id,
                    quantity = cmd.quantity,
                    remaining = receipt.remaining,
                    "sale recorded"
                );
                Ok(receipt)
            }
            Err(err) => {
                tracing::warn!(
                    product_id = %cmd.product_id,
                    quantity = cmd.quantity,
                    error = %err,
                    "sale rejected"
                );
                Err(err)
            }
        }
    }

    pub async fn product(&self, id: ProductId) -> InventoryResult<Product> {
        self.store.get_product(id).await
    }

    pub async fn list_products(&self) -> InventoryResult<Vec<Product>> {
        self.store.list_products().await
    }

    pub async fn search(&self, query: &str) -> InventoryResult<Vec<Product>> {
        let found = self.store.search_products(query).await?;
        tracing::debug!(query, matches = found.len(), "product search");
        Ok(found)
    }

    pub async fn sales_for(&self, id: ProductId) -> InventoryResult<Vec<SaleEvent>> {
        self.store.sales_for_product(id).await
    }

    /// Report for a day/month/year using the configured window.
    pub async fn daily_report(&self, day: u32, month: u32, year: i32) -> InventoryResult<DailyReport> {
        let date = ReportDate::from_parts(day, month, year)?;
        self.report_for(date, self.added_window).await
    }

    pub async fn report_for(
        &self,
        date: ReportDate,
        window: AddedWindow,
    ) -> InventoryResult<DailyReport> {
        let report = self.store.daily_report(date, window).await?;
        tracing::debug!(
            date = %report.date,
            window = %report.window,
            items_added = report.items_added,
            items_sold = report.items_sold,
            "daily report"
        );
        Ok(report)
    }

    /// Delete all products and sales after authenticating `credentials` and
    /// checking the `catalog.purge` permission.
    pub async fn purge(&self, credentials: &Credentials) -> InventoryResult<PurgeSummary> {
        // Password hashing is CPU-bound; keep it off the async workers.
        let authenticator = Arc::clone(&self.authenticator);
        let attempt = credentials.clone();
        let principal = tokio::task::spawn_blocking(move || authenticator.authenticate(&attempt))
            .await
            .map_err(|e| InventoryError::Task(format!("authentication task failed: {}", e)))??;

        if let Err(err) = authorize(&principal, &Permission::CATALOG_PURGE) {
            tracing::warn!(principal = %principal.principal_id, "purge denied");
            return Err(InventoryError::from(err));
        }

        let summary = self.store.purge_all().await?;
        tracing::info!(
            principal = %principal.principal_id,
            products_deleted = summary.products_deleted,
            sales_deleted = summary.sales_deleted,
            "all inventory data purged"
        );
        Ok(summary)
    }
}
