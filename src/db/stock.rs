use chrono::Utc;
use rusqlite::{params, OptionalExtension};

use super::*;

impl PrepDb {
    // =========================================================================
    // Stock
    // =========================================================================

    pub fn get_stock_levels(&self) -> Result<Vec<StockRecord>, DbError> {
        let mut stmt = self
            .conn
            .prepare("SELECT item_id, quantity, updated_at FROM stock ORDER BY item_id")?;
        let rows = stmt.query_map([], |row| {
            Ok(StockRecord {
                item_id: row.get(0)?,
                quantity: row.get(1)?,
                updated_at: row.get(2)?,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    pub fn get_stock_quantity(&self, item_id: &str) -> Result<Option<f64>, DbError> {
        Ok(self
            .conn
            .query_row(
                "SELECT quantity FROM stock WHERE item_id = ?1",
                params![item_id],
                |row| row.get(0),
            )
            .optional()?)
    }

    /// Record an absolute on-hand count (inventory entry).
    pub fn set_stock_quantity(&self, item_id: &str, quantity: f64) -> Result<(), DbError> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO stock (item_id, quantity, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(item_id) DO UPDATE SET
                quantity = excluded.quantity,
                updated_at = excluded.updated_at",
            params![item_id, quantity, now],
        )?;
        Ok(())
    }

    /// Add `amount` to an item's stock in a single statement.
    ///
    /// The addition happens inside SQLite, so concurrent counts and credits
    /// never overwrite each other. A missing row starts from zero.
    pub fn increment_stock(&self, item_id: &str, amount: f64) -> Result<(), DbError> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO stock (item_id, quantity, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(item_id) DO UPDATE SET
                quantity = stock.quantity + excluded.quantity,
                updated_at = excluded.updated_at",
            params![item_id, amount, now],
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::super::items::sample_item;
    use super::super::test_utils::test_db;
    use super::*;

    #[test]
    fn test_set_and_read_stock() {
        let db = test_db();
        db.upsert_item(&sample_item("onion", "Diced Onions", 10.0)).unwrap();

        assert_eq!(db.get_stock_quantity("onion").unwrap(), None);
        db.set_stock_quantity("onion", 4.5).expect("set");
        db.set_stock_quantity("onion", 3.0).expect("overwrite");
        assert_eq!(db.get_stock_quantity("onion").unwrap(), Some(3.0));

        let levels = db.get_stock_levels().expect("levels");
        assert_eq!(levels.len(), 1);
        assert_eq!(levels[0].quantity, 3.0);
    }

    #[test]
    fn test_increment_creates_and_accumulates() {
        let db = test_db();
        db.upsert_item(&sample_item("rice", "Rice", 8.0)).unwrap();

        db.increment_stock("rice", 6.0).expect("first increment");
        db.increment_stock("rice", 1.5).expect("second increment");
        assert_eq!(db.get_stock_quantity("rice").unwrap(), Some(7.5));
    }

    #[test]
    fn test_increment_unknown_item_fails() {
        let db = test_db();
        assert!(db.increment_stock("ghost", 1.0).is_err());
    }
}
