//! Inventory domain module.
//!
//! This crate contains business rules for the catalog, the sales ledger and
//! daily reporting, implemented purely as deterministic domain logic (no IO,
//! no storage). Callers pass timestamps in explicitly.

pub mod product;
pub mod report;
pub mod sale;

pub use product::{Product, RegisterProduct, UnitPrice};
pub use report::{AddedWindow, DailyReport, ReportDate};
pub use sale::{SaleEvent, SaleReceipt, SellProduct, plan_sale};
