use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::NaiveDate;
use parking_lot::Mutex;

use super::{CatalogStore, PrepListStore, StockStore};
use crate::db::{CompletionWrite, InventoryItem, PrepListEntry, StockRecord};
use crate::error::StoreError;

/// In-memory store with write counting and failure injection.
#[derive(Default)]
pub struct FakeStore {
    pub items: Mutex<Vec<InventoryItem>>,
    pub stock: Mutex<HashMap<String, f64>>,
    pub entries: Mutex<Vec<PrepListEntry>>,
    pub writes: AtomicUsize,
    pub fail_reads: AtomicBool,
    pub fail_upserts: AtomicBool,
    pub failing_increments: Mutex<HashSet<String>>,
}

impl FakeStore {
    pub fn seed_item(&self, item: InventoryItem) {
        self.items.lock().push(item);
    }

    pub fn seed_entry(&self, id: &str, item_id: &str, date: NaiveDate, completed: bool) {
        let mut entry = crate::db::prep_list::sample_entry(id, item_id, date);
        entry.completed = completed;
        self.entries.lock().push(entry);
    }

    pub fn set_stock(&self, item_id: &str, quantity: f64) {
        self.stock.lock().insert(item_id.to_string(), quantity);
    }

    pub fn stock_of(&self, item_id: &str) -> f64 {
        self.stock.lock().get(item_id).copied().unwrap_or(0.0)
    }

    pub fn is_completed(&self, id: &str) -> bool {
        self.entries
            .lock()
            .iter()
            .any(|e| e.id == id && e.completed)
    }

    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn fail_increment_for(&self, item_id: &str) {
        self.failing_increments.lock().insert(item_id.to_string());
    }

    fn check_reads(&self) -> Result<(), StoreError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("reads disabled".into()));
        }
        Ok(())
    }

    fn record_write(&self) {
        self.writes.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl CatalogStore for FakeStore {
    async fn active_items(&self) -> Result<Vec<InventoryItem>, StoreError> {
        self.check_reads()?;
        Ok(self
            .items
            .lock()
            .iter()
            .filter(|i| !i.is_deleted)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl StockStore for FakeStore {
    async fn stock_levels(&self) -> Result<Vec<StockRecord>, StoreError> {
        self.check_reads()?;
        Ok(self
            .stock
            .lock()
            .iter()
            .map(|(item_id, quantity)| StockRecord {
                item_id: item_id.clone(),
                quantity: *quantity,
                updated_at: String::new(),
            })
            .collect())
    }

    async fn increment(&self, item_id: &str, amount: f64) -> Result<(), StoreError> {
        if self.failing_increments.lock().contains(item_id) {
            return Err(StoreError::Unavailable(format!("increment {item_id} rejected")));
        }
        self.record_write();
        *self.stock.lock().entry(item_id.to_string()).or_insert(0.0) += amount;
        Ok(())
    }
}

#[async_trait]
impl PrepListStore for FakeStore {
    async fn entries_for_date(&self, date: NaiveDate) -> Result<Vec<PrepListEntry>, StoreError> {
        self.check_reads()?;
        Ok(self
            .entries
            .lock()
            .iter()
            .filter(|e| e.date == date)
            .cloned()
            .collect())
    }

    async fn upsert_entries(&self, entries: Vec<PrepListEntry>) -> Result<usize, StoreError> {
        if self.fail_upserts.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("upserts disabled".into()));
        }
        self.record_write();
        let mut stored = self.entries.lock();
        let count = entries.len();
        for entry in entries {
            match stored
                .iter_mut()
                .find(|e| e.date == entry.date && e.item_id == entry.item_id)
            {
                Some(existing) => {
                    let (id, completed, created_at) = (
                        existing.id.clone(),
                        existing.completed,
                        existing.created_at.clone(),
                    );
                    *existing = PrepListEntry {
                        id,
                        completed,
                        created_at,
                        ..entry
                    };
                }
                None => stored.push(entry),
            }
        }
        Ok(count)
    }

    async fn delete_entries(&self, ids: Vec<String>) -> Result<usize, StoreError> {
        self.record_write();
        let mut stored = self.entries.lock();
        let before = stored.len();
        stored.retain(|e| !ids.contains(&e.id));
        Ok(before - stored.len())
    }

    async fn replace_day(
        &self,
        date: NaiveDate,
        entries: Vec<PrepListEntry>,
    ) -> Result<usize, StoreError> {
        if self.fail_upserts.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("upserts disabled".into()));
        }
        self.record_write();
        let mut stored = self.entries.lock();
        let before = stored.len();
        stored.retain(|e| e.date != date);
        let removed = before - stored.len();
        stored.extend(entries);
        Ok(removed)
    }

    async fn set_completed(
        &self,
        id: &str,
        completed: bool,
    ) -> Result<CompletionWrite, StoreError> {
        self.record_write();
        let mut stored = self.entries.lock();
        let Some(entry) = stored.iter_mut().find(|e| e.id == id) else {
            return Ok(CompletionWrite::Missing);
        };
        let newly = completed && !entry.completed;
        entry.completed = completed;
        Ok(if newly {
            CompletionWrite::NewlyCompleted
        } else {
            CompletionWrite::Written
        })
    }
}
