//! Terminal output: plain lines, or serde JSON with `--json`.

use serde::Serialize;

use stockkeep_infra::PurgeSummary;
use stockkeep_inventory::{DailyReport, Product, SaleEvent, SaleReceipt};

pub fn product_line(product: &Product) -> String {
    format!(
        "{} - {} | Quantity: {} | Price: {:.2} | Registered: {}",
        product.id,
        product.name,
        product.quantity,
        product.unit_price.amount(),
        product.registered_at.format("%d/%m/%Y %H:%M:%S"),
    )
}

pub fn sale_line(sale: &SaleEvent) -> String {
    format!(
        "Sale {} | Product: {} | Quantity: {} | Date: {}",
        sale.id,
        sale.product_id,
        sale.quantity_sold,
        sale.sold_at.format("%d/%m/%Y"),
    )
}

pub fn report_line(report: &DailyReport) -> String {
    format!(
        "On {}: items sold {}, items added {} ({})",
        report.date, report.items_sold, report.items_added, report.window
    )
}

#[derive(Debug, Clone, Copy)]
pub struct Output {
    json: bool,
}

impl Output {
    pub fn new(json: bool) -> Self {
        Self { json }
    }

    pub fn products(&self, products: &[Product]) {
        if self.json {
            return self.json_value(&products);
        }
        if products.is_empty() {
            println!("No products found.");
        }
        for product in products {
            println!("{}", product_line(product));
        }
    }

    pub fn product(&self, product: &Product) {
        if self.json {
            return self.json_value(product);
        }
        println!("Registered {}", product_line(product));
    }

    pub fn receipt(&self, receipt: &SaleReceipt) {
        if self.json {
            return self.json_value(receipt);
        }
        println!(
            "Sold {} of product {}; {} left in stock.",
            receipt.sale.quantity_sold, receipt.sale.product_id, receipt.remaining
        );
    }

    pub fn sales(&self, sales: &[SaleEvent]) {
        if self.json {
            return self.json_value(&sales);
        }
        if sales.is_empty() {
            println!("No sales recorded.");
        }
        for sale in sales {
            println!("{}", sale_line(sale));
        }
    }

    pub fn report(&self, report: &DailyReport) {
        if self.json {
            return self.json_value(report);
        }
        println!("{}", report_line(report));
    }

    pub fn purged(&self, summary: &PurgeSummary) {
        if self.json {
            return self.json_value(summary);
        }
        println!(
            "All data cleared: {} products and {} sales deleted.",
            summary.products_deleted, summary.sales_deleted
        );
    }

    pub fn message(&self, msg: &str) {
        if self.json {
            return self.json_value(&serde_json::json!({ "message": msg }));
        }
        println!("{}", msg);
    }

    pub fn error(&self, msg: &str) {
        if self.json {
            eprintln!("{}", serde_json::json!({ "error": msg }));
            return;
        }
        eprintln!("error: {}", msg);
    }

    fn json_value<T: Serialize + ?Sized>(&self, value: &T) {
        match serde_json::to_string_pretty(value) {
            Ok(json) => println!("{}", json),
            Err(err) => self.error(&format!("failed to encode output: {}", err)),
        }
    }
}
