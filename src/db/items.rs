use chrono::Utc;
use rusqlite::{params, OptionalExtension, Row};

use super::*;

const ITEM_COLUMNS: &str = "id, name, category, unit, par_level, estimated_time, menu_relevant,
     is_lunch_item, needs_fryer, default_batch_size, batch_yield, notes, is_deleted, updated_at";

impl PrepDb {
    // =========================================================================
    // Catalog
    // =========================================================================

    fn map_item_row(row: &Row<'_>) -> rusqlite::Result<InventoryItem> {
        Ok(InventoryItem {
            id: row.get(0)?,
            name: row.get(1)?,
            category: row.get(2)?,
            unit: row.get(3)?,
            par_level: row.get(4)?,
            estimated_time: row.get(5)?,
            menu_relevant: row.get(6)?,
            is_lunch_item: row.get(7)?,
            needs_fryer: row.get(8)?,
            default_batch_size: row.get(9)?,
            batch_yield: row.get(10)?,
            notes: row.get(11)?,
            is_deleted: row.get(12)?,
            updated_at: row.get(13)?,
        })
    }

    /// All items that have not been soft-deleted, ordered by name.
    pub fn get_active_items(&self) -> Result<Vec<InventoryItem>, DbError> {
        self.list_items(false)
    }

    pub fn list_items(&self, include_deleted: bool) -> Result<Vec<InventoryItem>, DbError> {
        let sql = if include_deleted {
            format!("SELECT {ITEM_COLUMNS} FROM items ORDER BY name COLLATE NOCASE")
        } else {
            format!(
                "SELECT {ITEM_COLUMNS} FROM items WHERE is_deleted = 0 ORDER BY name COLLATE NOCASE"
            )
        };
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([], Self::map_item_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    pub fn get_item(&self, id: &str) -> Result<Option<InventoryItem>, DbError> {
        let sql = format!("SELECT {ITEM_COLUMNS} FROM items WHERE id = ?1");
        Ok(self
            .conn
            .query_row(&sql, params![id], Self::map_item_row)
            .optional()?)
    }

    /// Insert or update a catalog item. Uses SQLite `ON CONFLICT` (upsert).
    pub fn upsert_item(&self, item: &InventoryItem) -> Result<(), DbError> {
        self.conn.execute(
            "INSERT INTO items (
                id, name, category, unit, par_level, estimated_time, menu_relevant,
                is_lunch_item, needs_fryer, default_batch_size, batch_yield, notes,
                is_deleted, updated_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
             ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                category = excluded.category,
                unit = excluded.unit,
                par_level = excluded.par_level,
                estimated_time = excluded.estimated_time,
                menu_relevant = excluded.menu_relevant,
                is_lunch_item = excluded.is_lunch_item,
                needs_fryer = excluded.needs_fryer,
                default_batch_size = excluded.default_batch_size,
                batch_yield = excluded.batch_yield,
                notes = excluded.notes,
                is_deleted = excluded.is_deleted,
                updated_at = excluded.updated_at",
            params![
                item.id,
                item.name,
                item.category,
                item.unit,
                item.par_level,
                item.estimated_time,
                item.menu_relevant,
                item.is_lunch_item,
                item.needs_fryer,
                item.default_batch_size,
                item.batch_yield,
                item.notes,
                item.is_deleted,
                item.updated_at,
            ],
        )?;
        Ok(())
    }

    /// Flip the soft-delete flag. Returns false when the item does not exist.
    pub fn set_item_deleted(&self, id: &str, deleted: bool) -> Result<bool, DbError> {
        let now = Utc::now().to_rfc3339();
        let changed = self.conn.execute(
            "UPDATE items SET is_deleted = ?1, updated_at = ?2 WHERE id = ?3",
            params![deleted, now, id],
        )?;
        Ok(changed > 0)
    }
}

#[cfg(test)]
pub(crate) fn sample_item(id: &str, name: &str, par_level: f64) -> InventoryItem {
    InventoryItem {
        id: id.to_string(),
        name: name.to_string(),
        category: "Prep".to_string(),
        unit: "qt".to_string(),
        par_level,
        estimated_time: 20,
        menu_relevant: false,
        is_lunch_item: false,
        needs_fryer: false,
        default_batch_size: 1.0,
        batch_yield: 1.0,
        notes: None,
        is_deleted: false,
        updated_at: Utc::now().to_rfc3339(),
    }
}
