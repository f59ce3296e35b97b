//! Async store collaborators used by the prep-list services.
//!
//! Each trait covers one shared table: the item catalog, the stock levels, and
//! the date-scoped prep list. `CompletionLedger` writes completed flags and
//! stock credits as one unit; `SqliteStore` does that in a transaction and
//! `BatchedLedger` does it for stores that only offer single-row operations.

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::db::{
    CompletionReceipt, CompletionUpdate, CompletionWrite, InventoryItem, PrepListEntry,
    StockRecord,
};
use crate::error::StoreError;

mod batched;
mod sqlite;

#[cfg(test)]
pub mod fake;

pub use batched::BatchedLedger;
pub use sqlite::SqliteStore;

#[async_trait]
pub trait CatalogStore: Send + Sync + 'static {
    /// Items with `is_deleted = false`.
    async fn active_items(&self) -> Result<Vec<InventoryItem>, StoreError>;
}

#[async_trait]
pub trait StockStore: Send + Sync + 'static {
    async fn stock_levels(&self) -> Result<Vec<StockRecord>, StoreError>;

    /// Atomically add `amount` to an item's on-hand quantity.
    async fn increment(&self, item_id: &str, amount: f64) -> Result<(), StoreError>;
}

#[async_trait]
pub trait PrepListStore: Send + Sync + 'static {
    async fn entries_for_date(&self, date: NaiveDate) -> Result<Vec<PrepListEntry>, StoreError>;

    /// Insert or replace keyed on `(date, item_id)`. Never creates duplicates.
    async fn upsert_entries(&self, entries: Vec<PrepListEntry>) -> Result<usize, StoreError>;

    async fn delete_entries(&self, ids: Vec<String>) -> Result<usize, StoreError>;

    /// Replace every row for `date` with `entries` as one unit. Either the new
    /// list is fully written or the old one is left as it was. Returns the
    /// number of rows removed.
    async fn replace_day(
        &self,
        date: NaiveDate,
        entries: Vec<PrepListEntry>,
    ) -> Result<usize, StoreError>;

    async fn set_completed(&self, id: &str, completed: bool)
        -> Result<CompletionWrite, StoreError>;
}

#[async_trait]
pub trait CompletionLedger: Send + Sync + 'static {
    /// Persist every flag and credit every newly completed entry.
    ///
    /// On `Err` the caller must assume nothing was committed for the failed
    /// entries and keep its working set intact.
    async fn apply_completions(
        &self,
        updates: Vec<CompletionUpdate>,
    ) -> Result<CompletionReceipt, StoreError>;
}
