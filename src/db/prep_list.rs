use chrono::{NaiveDate, Utc};
use rusqlite::{params, params_from_iter, Row};

use super::*;

const ENTRY_COLUMNS: &str = "id, item_id, date, name, category, unit, par_level, priority,
     batch_size, batch_yield, completed, estimated_time, notes, created_at, updated_at";

impl PrepDb {
    // =========================================================================
    // Prep list
    // =========================================================================

    fn map_entry_row(row: &Row<'_>) -> rusqlite::Result<PrepListEntry> {
        let date: String = row.get(2)?;
        let priority: String = row.get(7)?;
        Ok(PrepListEntry {
            id: row.get(0)?,
            item_id: row.get(1)?,
            date: parse_date_column(2, &date)?,
            name: row.get(3)?,
            category: row.get(4)?,
            unit: row.get(5)?,
            par_level: row.get(6)?,
            priority: parse_priority_column(7, &priority)?,
            batch_size: row.get(8)?,
            batch_yield: row.get(9)?,
            completed: row.get(10)?,
            estimated_time: row.get(11)?,
            notes: row.get(12)?,
            created_at: row.get(13)?,
            updated_at: row.get(14)?,
        })
    }

    /// Every entry for `date`, completed ones included. Ordered by tier, then name.
    pub fn get_entries_for_date(&self, date: NaiveDate) -> Result<Vec<PrepListEntry>, DbError> {
        let sql = format!(
            "SELECT {ENTRY_COLUMNS} FROM prep_list
             WHERE date = ?1
             ORDER BY priority, name COLLATE NOCASE"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params![format_date(date)], Self::map_entry_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Insert or replace one entry keyed on `(date, item_id)`.
    ///
    /// On conflict the existing row keeps its `id`, `completed` flag and
    /// `created_at`; everything computed at generation time is refreshed.
    pub fn upsert_prep_entry(&self, entry: &PrepListEntry) -> Result<(), DbError> {
        self.conn.execute(
            "INSERT INTO prep_list (
                id, item_id, date, name, category, unit, par_level, priority,
                batch_size, batch_yield, completed, estimated_time, notes,
                created_at, updated_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)
             ON CONFLICT(date, item_id) DO UPDATE SET
                name = excluded.name,
                category = excluded.category,
                unit = excluded.unit,
                par_level = excluded.par_level,
                priority = excluded.priority,
                batch_size = excluded.batch_size,
                batch_yield = excluded.batch_yield,
                estimated_time = excluded.estimated_time,
                notes = excluded.notes,
                updated_at = excluded.updated_at",
            params![
                entry.id,
                entry.item_id,
                format_date(entry.date),
                entry.name,
                entry.category,
                entry.unit,
                entry.par_level,
                entry.priority.as_str(),
                entry.batch_size,
                entry.batch_yield,
                entry.completed,
                entry.estimated_time,
                entry.notes,
                entry.created_at,
                entry.updated_at,
            ],
        )?;
        Ok(())
    }

    /// Upsert a whole batch atomically: either every row lands or none do.
    pub fn upsert_prep_entries(&self, entries: &[PrepListEntry]) -> Result<usize, DbError> {
        if entries.is_empty() {
            return Ok(0);
        }
        self.with_transaction(|db| {
            for entry in entries {
                db.upsert_prep_entry(entry)?;
            }
            Ok(entries.len())
        })
    }

    /// Swap a day's list for `entries` in one transaction: every existing row
    /// for `date` (completed ones included) goes, then `entries` are written.
    /// On error the previous rows are untouched. Returns how many rows were removed.
    pub fn replace_entries_for_date(
        &self,
        date: NaiveDate,
        entries: &[PrepListEntry],
    ) -> Result<usize, DbError> {
        self.with_transaction(|db| {
            let removed = db.conn.execute(
                "DELETE FROM prep_list WHERE date = ?1",
                params![format_date(date)],
            )?;
            for entry in entries {
                db.upsert_prep_entry(entry)?;
            }
            Ok(removed)
        })
    }

    /// Physically delete entries by id. Returns the number of rows removed.
    pub fn delete_prep_entries(&self, ids: &[String]) -> Result<usize, DbError> {
        if ids.is_empty() {
            return Ok(0);
        }
        let placeholders = vec!["?"; ids.len()].join(", ");
        let sql = format!("DELETE FROM prep_list WHERE id IN ({placeholders})");
        Ok(self.conn.execute(&sql, params_from_iter(ids.iter()))?)
    }

    /// Remove an item's open entries for one day (used when it is soft-deleted).
    pub fn delete_open_entries_for_item(
        &self,
        item_id: &str,
        date: NaiveDate,
    ) -> Result<usize, DbError> {
        Ok(self.conn.execute(
            "DELETE FROM prep_list WHERE item_id = ?1 AND date = ?2 AND completed = 0",
            params![item_id, format_date(date)],
        )?)
    }

    /// Write one entry's completed flag.
    ///
    /// Completing uses a guarded update (`AND completed = 0`) so only the first
    /// writer sees `NewlyCompleted`; that is what makes crediting exactly-once.
    pub fn set_entry_completed(
        &self,
        id: &str,
        completed: bool,
    ) -> Result<CompletionWrite, DbError> {
        let now = Utc::now().to_rfc3339();
        if completed {
            let changed = self.conn.execute(
                "UPDATE prep_list SET completed = 1, updated_at = ?1
                 WHERE id = ?2 AND completed = 0",
                params![now, id],
            )?;
            if changed > 0 {
                return Ok(CompletionWrite::NewlyCompleted);
            }
            let exists = self
                .conn
                .prepare("SELECT 1 FROM prep_list WHERE id = ?1")?
                .exists(params![id])?;
            return Ok(if exists {
                CompletionWrite::Written
            } else {
                CompletionWrite::Missing
            });
        }

        let changed = self.conn.execute(
            "UPDATE prep_list SET completed = 0, updated_at = ?1 WHERE id = ?2",
            params![now, id],
        )?;
        Ok(if changed > 0 {
            CompletionWrite::Written
        } else {
            CompletionWrite::Missing
        })
    }

    /// Persist completed flags and credit stock for newly completed entries in
    /// one transaction. Nothing is written if any statement fails.
    pub fn commit_completions(
        &self,
        updates: &[CompletionUpdate],
    ) -> Result<CompletionReceipt, DbError> {
        self.with_transaction(|db| {
            let mut receipt = CompletionReceipt::default();
            for update in updates {
                match db.set_entry_completed(&update.entry_id, update.completed)? {
                    CompletionWrite::NewlyCompleted => {
                        receipt.updated += 1;
                        if update.credit > 0.0 {
                            db.credit_completion(update, &mut receipt)?;
                        }
                    }
                    CompletionWrite::Written => {
                        receipt.updated += 1;
                        if update.completed {
                            receipt.already_completed += 1;
                        }
                    }
                    CompletionWrite::Missing => {
                        receipt.missing.push(update.entry_id.clone());
                        // The row was replaced under the user (forced refresh), but the
                        // batch was still produced. Credit it unless the item is gone too.
                        if update.completed
                            && update.credit > 0.0
                            && db.get_item(&update.item_id)?.is_some()
                        {
                            db.credit_completion(update, &mut receipt)?;
                        }
                    }
                }
            }
            Ok(receipt)
        })
    }

    fn credit_completion(
        &self,
        update: &CompletionUpdate,
        receipt: &mut CompletionReceipt,
    ) -> Result<(), DbError> {
        self.increment_stock(&update.item_id, update.credit)?;
        receipt.credits.push(StockCredit {
            entry_id: update.entry_id.clone(),
            item_id: update.item_id.clone(),
            amount: update.credit,
        });
        Ok(())
    }
}

#[cfg(test)]
pub(crate) fn sample_entry(id: &str, item_id: &str, date: NaiveDate) -> PrepListEntry {
    let now = Utc::now().to_rfc3339();
    PrepListEntry {
        id: id.to_string(),
        item_id: item_id.to_string(),
        date,
        name: item_id.to_string(),
        category: "Prep".to_string(),
        unit: "qt".to_string(),
        par_level: 10.0,
        priority: crate::types::Priority::B,
        batch_size: 1.0,
        batch_yield: 1.0,
        completed: false,
        estimated_time: 15,
        notes: None,
        created_at: now.clone(),
        updated_at: now,
    }
}
