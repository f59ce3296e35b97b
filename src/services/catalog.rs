//! Item catalog and inventory count maintenance.
//!
//! These are the write paths behind the PAR management and inventory screens.
//! They go straight to SQLite so a soft delete and its prep-list cleanup, or a
//! whole inventory count, land in one transaction.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use serde::Serialize;

use crate::config::DEFAULT_ESTIMATED_TIME;
use crate::db::{DbError, InventoryItem, ItemInput};
use crate::error::PrepError;
use crate::services::{Reconciliation, ReconciliationService};
use crate::store::SqliteStore;
use crate::types::StockStatus;
use crate::util::{validate_batch_yield, validate_bounded_string, validate_quantity};

const MAX_NAME_LEN: usize = 120;
const MAX_LABEL_LEN: usize = 60;
const MAX_NOTES_LEN: usize = 1000;

/// An item with its current count, for the inventory form.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryLevel {
    #[serde(flatten)]
    pub item: InventoryItem,
    pub quantity: f64,
    pub status: StockStatus,
}

pub struct CatalogService {
    store: Arc<SqliteStore>,
    default_estimated_time: u32,
}

impl CatalogService {
    pub fn new(store: Arc<SqliteStore>) -> Self {
        Self {
            store,
            default_estimated_time: DEFAULT_ESTIMATED_TIME,
        }
    }

    pub fn with_default_estimated_time(mut self, minutes: u32) -> Self {
        self.default_estimated_time = minutes.max(1);
        self
    }

    pub async fn add_item(&self, input: ItemInput) -> Result<InventoryItem, PrepError> {
        let id = uuid::Uuid::new_v4().to_string();
        let item = self.build_item(id, input, false)?;
        let stored = item.clone();
        self.store.with_db(move |db| db.upsert_item(&stored)).await?;
        log::info!("Added item '{}' ({})", item.name, item.id);
        Ok(item)
    }

    pub async fn update_item(&self, id: &str, input: ItemInput) -> Result<InventoryItem, PrepError> {
        let existing = self.get_item(id).await?;
        let item = self.build_item(existing.id, input, existing.is_deleted)?;
        let stored = item.clone();
        self.store.with_db(move |db| db.upsert_item(&stored)).await?;
        Ok(item)
    }

    pub async fn get_item(&self, id: &str) -> Result<InventoryItem, PrepError> {
        let key = id.to_string();
        self.store
            .with_db(move |db| db.get_item(&key))
            .await?
            .ok_or_else(|| PrepError::ItemNotFound(id.to_string()))
    }

    /// Hide an item from future lists and drop its open entries for `as_of`.
    /// Completed entries stay as history. Returns how many entries were removed.
    pub async fn soft_delete_item(&self, id: &str, as_of: NaiveDate) -> Result<usize, PrepError> {
        let key = id.to_string();
        let removed = self
            .store
            .with_db(move |db| {
                db.with_transaction(|tx| {
                    if !tx.set_item_deleted(&key, true)? {
                        return Err(DbError::ItemNotFound(key.clone()));
                    }
                    tx.delete_open_entries_for_item(&key, as_of)
                })
            })
            .await?;
        log::info!("Soft-deleted item {} ({} open entries removed)", id, removed);
        Ok(removed)
    }

    pub async fn restore_item(&self, id: &str) -> Result<(), PrepError> {
        let key = id.to_string();
        let found = self
            .store
            .with_db(move |db| db.set_item_deleted(&key, false))
            .await?;
        if !found {
            return Err(PrepError::ItemNotFound(id.to_string()));
        }
        Ok(())
    }

    pub async fn list_items(&self, include_deleted: bool) -> Result<Vec<InventoryItem>, PrepError> {
        Ok(self
            .store
            .with_db(move |db| db.list_items(include_deleted))
            .await?)
    }

    /// Active items with their on-hand quantity (0 when never counted).
    pub async fn list_inventory(&self) -> Result<Vec<InventoryLevel>, PrepError> {
        let (items, stock) = self
            .store
            .with_db(|db| Ok((db.get_active_items()?, db.get_stock_levels()?)))
            .await?;
        let on_hand: HashMap<String, f64> =
            stock.into_iter().map(|s| (s.item_id, s.quantity)).collect();

        Ok(items
            .into_iter()
            .map(|item| {
                let quantity = on_hand.get(&item.id).copied().unwrap_or(0.0);
                let status = StockStatus::from_levels(quantity, item.par_level);
                InventoryLevel {
                    item,
                    quantity,
                    status,
                }
            })
            .collect())
    }

    /// Overwrite on-hand quantities with a physical count.
    ///
    /// The whole count is validated first and written in one transaction, so a
    /// bad line leaves every level unchanged.
    pub async fn set_stock_levels(&self, levels: Vec<(String, f64)>) -> Result<usize, PrepError> {
        for (_, quantity) in &levels {
            validate_quantity(*quantity, "quantity")?;
        }
        if levels.is_empty() {
            return Ok(0);
        }

        let count = self
            .store
            .with_db(move |db| {
                db.with_transaction(|tx| {
                    for (item_id, quantity) in &levels {
                        if tx.get_item(item_id)?.is_none() {
                            return Err(DbError::ItemNotFound(item_id.clone()));
                        }
                        tx.set_stock_quantity(item_id, *quantity)?;
                    }
                    Ok(levels.len())
                })
            })
            .await?;
        log::info!("Recorded inventory count for {} items", count);
        Ok(count)
    }

    /// Save a count and regenerate the day's list from it.
    pub async fn record_inventory_count(
        &self,
        levels: Vec<(String, f64)>,
        as_of: NaiveDate,
        reconciler: &ReconciliationService<SqliteStore, SqliteStore, SqliteStore>,
    ) -> Result<Reconciliation, PrepError> {
        self.set_stock_levels(levels).await?;
        reconciler.reconcile(as_of, true).await
    }

    fn build_item(
        &self,
        id: String,
        input: ItemInput,
        is_deleted: bool,
    ) -> Result<InventoryItem, PrepError> {
        let name = validate_bounded_string(&input.name, "name", 1, MAX_NAME_LEN)?;
        let category = validate_bounded_string(&input.category, "category", 0, MAX_LABEL_LEN)?;
        let unit = validate_bounded_string(&input.unit, "unit", 0, MAX_LABEL_LEN)?;
        let par_level = validate_quantity(input.par_level, "par_level")?;
        let default_batch_size = validate_quantity(input.default_batch_size, "default_batch_size")?;
        let batch_yield = validate_batch_yield(input.batch_yield)?;
        let estimated_time = match input.estimated_time {
            None => self.default_estimated_time,
            Some(0) => {
                return Err(PrepError::invalid(
                    "estimated_time",
                    "must be at least 1 minute",
                ))
            }
            Some(minutes) => minutes,
        };
        let notes = match input.notes.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(text) => Some(validate_bounded_string(text, "notes", 1, MAX_NOTES_LEN)?),
        };

        Ok(InventoryItem {
            id,
            name,
            category,
            unit,
            par_level,
            estimated_time,
            menu_relevant: input.menu_relevant,
            is_lunch_item: input.is_lunch_item,
            needs_fryer: input.needs_fryer,
            default_batch_size,
            batch_yield,
            notes,
            is_deleted,
            updated_at: Utc::now().to_rfc3339(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::prep_list::sample_entry;
    use crate::db::test_utils::test_db;
    use crate::store::PrepListStore;
    use crate::types::Priority;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 14).unwrap()
    }

    fn input(name: &str, par_level: f64) -> ItemInput {
        ItemInput {
            name: name.to_string(),
            category: "Sauces".to_string(),
            unit: "qt".to_string(),
            par_level,
            estimated_time: None,
            menu_relevant: false,
            is_lunch_item: false,
            needs_fryer: false,
            default_batch_size: 1.0,
            batch_yield: None,
            notes: None,
        }
    }

    fn setup() -> (Arc<SqliteStore>, CatalogService) {
        let store = Arc::new(SqliteStore::new(test_db()));
        let service = CatalogService::new(Arc::clone(&store));
        (store, service)
    }

    #[tokio::test]
    async fn test_add_item_applies_defaults() {
        let (_, service) = setup();
        let item = service.add_item(input("  Aioli ", 4.0)).await.unwrap();
        assert_eq!(item.name, "Aioli");
        assert_eq!(item.estimated_time, DEFAULT_ESTIMATED_TIME);
        assert_eq!(item.batch_yield, 1.0);

        let listed = service.list_items(false).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, item.id);
    }

    #[tokio::test]
    async fn test_add_item_rejects_bad_input() {
        let (_, service) = setup();
        let cases = [
            input("   ", 4.0),
            input("Aioli", -1.0),
            input("Aioli", f64::NAN),
            ItemInput {
                batch_yield: Some(0.5),
                ..input("Aioli", 4.0)
            },
            ItemInput {
                estimated_time: Some(0),
                ..input("Aioli", 4.0)
            },
        ];
        for case in cases {
            let err = service.add_item(case).await.unwrap_err();
            assert!(matches!(err, PrepError::Validation { .. }), "{err}");
        }
        assert!(service.list_items(true).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_item_keeps_identity() {
        let (_, service) = setup();
        let item = service.add_item(input("Aioli", 4.0)).await.unwrap();
        let updated = service
            .update_item(&item.id, ItemInput {
                needs_fryer: true,
                ..input("Garlic Aioli", 6.0)
            })
            .await
            .unwrap();
        assert_eq!(updated.id, item.id);
        assert_eq!(updated.name, "Garlic Aioli");
        assert!(updated.needs_fryer);

        let missing = service.update_item("nope", input("x", 1.0)).await;
        assert!(matches!(missing, Err(PrepError::ItemNotFound(_))));
    }

    #[tokio::test]
    async fn test_soft_delete_removes_open_entries_only() {
        let (store, service) = setup();
        let item = service.add_item(input("Aioli", 4.0)).await.unwrap();

        let open = sample_entry("open", &item.id, day());
        let mut yesterday = sample_entry("old", &item.id, day().pred_opt().unwrap());
        yesterday.completed = true;
        store.upsert_entries(vec![open, yesterday]).await.unwrap();

        assert_eq!(service.soft_delete_item(&item.id, day()).await.unwrap(), 1);
        assert!(service.list_items(false).await.unwrap().is_empty());
        assert_eq!(service.list_items(true).await.unwrap().len(), 1);
        assert!(store.entries_for_date(day()).await.unwrap().is_empty());
        assert_eq!(
            store
                .entries_for_date(day().pred_opt().unwrap())
                .await
                .unwrap()
                .len(),
            1
        );

        service.restore_item(&item.id).await.unwrap();
        assert_eq!(service.list_items(false).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_soft_delete_unknown_item() {
        let (_, service) = setup();
        assert!(matches!(
            service.soft_delete_item("ghost", day()).await,
            Err(PrepError::ItemNotFound(_))
        ));
        assert!(matches!(
            service.restore_item("ghost").await,
            Err(PrepError::ItemNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_set_stock_levels_is_all_or_nothing() {
        let (_, service) = setup();
        let a = service.add_item(input("Aioli", 4.0)).await.unwrap();
        let b = service.add_item(input("Brine", 8.0)).await.unwrap();

        let written = service
            .set_stock_levels(vec![(a.id.clone(), 1.0), (b.id.clone(), 8.0)])
            .await
            .unwrap();
        assert_eq!(written, 2);

        let negative = service
            .set_stock_levels(vec![(a.id.clone(), 3.0), (b.id.clone(), -2.0)])
            .await;
        assert!(matches!(negative, Err(PrepError::Validation { .. })));

        let unknown = service
            .set_stock_levels(vec![(a.id.clone(), 3.0), ("ghost".into(), 1.0)])
            .await;
        assert!(matches!(unknown, Err(PrepError::ItemNotFound(_))));

        let levels = service.list_inventory().await.unwrap();
        let aioli = levels.iter().find(|l| l.item.id == a.id).unwrap();
        assert_eq!(aioli.quantity, 1.0, "rolled back");
        assert_eq!(aioli.status, StockStatus::Critical);
        let brine = levels.iter().find(|l| l.item.id == b.id).unwrap();
        assert_eq!(brine.status, StockStatus::Good);
    }

    #[tokio::test]
    async fn test_record_inventory_count_regenerates_list() {
        let (store, service) = setup();
        let reconciler =
            ReconciliationService::new(Arc::clone(&store), Arc::clone(&store), Arc::clone(&store));
        let item = service.add_item(input("Aioli", 10.0)).await.unwrap();

        let first = reconciler.reconcile(day(), false).await.unwrap();
        assert_eq!(first.list.entries()[0].priority, Priority::A);

        let recount = service
            .record_inventory_count(vec![(item.id.clone(), 10.0)], day(), &reconciler)
            .await
            .unwrap();
        assert_eq!(recount.list.entries()[0].priority, Priority::B);
    }
}
