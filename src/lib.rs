//! Daily prep list engine.
//!
//! Compares on-hand stock with PAR levels, ranks what needs preparing into
//! tiers A/B/C, persists one list per service day, and credits produced stock
//! back to inventory when staff complete their tasks.

pub mod config;
pub mod db;
pub mod error;
mod migrations;
pub mod priority;
pub mod services;
pub mod store;
pub mod types;
pub mod util;

pub use config::{load_config, Config};
pub use db::{InventoryItem, PrepDb, PrepListEntry};
pub use error::{PrepError, PrepErrorReport};
pub use priority::Classifier;
pub use services::{
    CatalogService, CompletionService, Reconciliation, ReconciliationService, WorkingList,
};
pub use store::SqliteStore;
pub use types::{Priority, PrepSummary, StockStatus};
