//! Infrastructure layer: persistence of the catalog and sales ledger, and the
//! service facade the front end talks to.

pub mod error;
pub mod service;
pub mod store;

pub use error::{InventoryError, InventoryResult};
pub use service::InventoryService;
pub use store::{InMemoryInventoryStore, InventoryStore, PurgeSummary, SqliteInventoryStore};
