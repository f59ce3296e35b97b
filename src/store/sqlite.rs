use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use parking_lot::Mutex;

use super::{CatalogStore, CompletionLedger, PrepListStore, StockStore};
use crate::db::{
    CompletionReceipt, CompletionUpdate, CompletionWrite, DbError, InventoryItem, PrepDb,
    PrepListEntry, StockRecord,
};
use crate::error::StoreError;

/// All store traits over one SQLite connection.
///
/// rusqlite calls block, so every operation runs on the blocking pool while
/// holding the connection mutex; async callers never stall the runtime.
#[derive(Clone)]
pub struct SqliteStore {
    db: Arc<Mutex<PrepDb>>,
}

impl SqliteStore {
    pub fn new(db: PrepDb) -> Self {
        Self {
            db: Arc::new(Mutex::new(db)),
        }
    }

    /// Run `f` against the connection on the blocking pool.
    pub async fn with_db<F, T>(&self, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(&PrepDb) -> Result<T, DbError> + Send + 'static,
        T: Send + 'static,
    {
        let db = Arc::clone(&self.db);
        let result = tokio::task::spawn_blocking(move || {
            let guard = db.lock();
            f(&guard)
        })
        .await?;
        Ok(result?)
    }
}

#[async_trait]
impl CatalogStore for SqliteStore {
    async fn active_items(&self) -> Result<Vec<InventoryItem>, StoreError> {
        self.with_db(|db| db.get_active_items()).await
    }
}

#[async_trait]
impl StockStore for SqliteStore {
    async fn stock_levels(&self) -> Result<Vec<StockRecord>, StoreError> {
        self.with_db(|db| db.get_stock_levels()).await
    }

    async fn increment(&self, item_id: &str, amount: f64) -> Result<(), StoreError> {
        let item_id = item_id.to_string();
        self.with_db(move |db| db.increment_stock(&item_id, amount))
            .await
    }
}

#[async_trait]
impl PrepListStore for SqliteStore {
    async fn entries_for_date(&self, date: NaiveDate) -> Result<Vec<PrepListEntry>, StoreError> {
        self.with_db(move |db| db.get_entries_for_date(date)).await
    }

    async fn upsert_entries(&self, entries: Vec<PrepListEntry>) -> Result<usize, StoreError> {
        self.with_db(move |db| db.upsert_prep_entries(&entries))
            .await
    }

    async fn delete_entries(&self, ids: Vec<String>) -> Result<usize, StoreError> {
        self.with_db(move |db| db.delete_prep_entries(&ids)).await
    }

    async fn replace_day(
        &self,
        date: NaiveDate,
        entries: Vec<PrepListEntry>,
    ) -> Result<usize, StoreError> {
        self.with_db(move |db| db.replace_entries_for_date(date, &entries))
            .await
    }

    async fn set_completed(
        &self,
        id: &str,
        completed: bool,
    ) -> Result<CompletionWrite, StoreError> {
        let id = id.to_string();
        self.with_db(move |db| db.set_entry_completed(&id, completed))
            .await
    }
}

#[async_trait]
impl CompletionLedger for SqliteStore {
    async fn apply_completions(
        &self,
        updates: Vec<CompletionUpdate>,
    ) -> Result<CompletionReceipt, StoreError> {
        self.with_db(move |db| db.commit_completions(&updates))
            .await
    }
}
