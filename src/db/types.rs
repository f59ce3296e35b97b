//! Shared type definitions for the database layer.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{ItemAttributes, Priority};

/// Errors specific to database operations.
#[derive(Debug, Error)]
pub enum DbError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Home directory not found")]
    HomeDirNotFound,

    #[error("Failed to create database directory: {0}")]
    CreateDir(std::io::Error),

    #[error("Schema migration failed: {0}")]
    Migration(String),

    #[error("Item not found: {0}")]
    ItemNotFound(String),
}

/// A row from the `items` table: one catalog entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryItem {
    pub id: String,
    pub name: String,
    pub category: String,
    pub unit: String,
    /// Target on-hand quantity. Zero means "not tracked for prep".
    pub par_level: f64,
    /// Minutes of preparation.
    pub estimated_time: u32,
    pub menu_relevant: bool,
    pub is_lunch_item: bool,
    pub needs_fryer: bool,
    /// Number of recipe batches a prep task runs (not a raw quantity).
    pub default_batch_size: f64,
    /// Stock units produced by one batch.
    pub batch_yield: f64,
    pub notes: Option<String>,
    pub is_deleted: bool,
    pub updated_at: String,
}

impl InventoryItem {
    pub fn attributes(&self) -> ItemAttributes {
        ItemAttributes {
            name: self.name.clone(),
            menu_relevant: self.menu_relevant,
            estimated_time: self.estimated_time,
            needs_fryer: self.needs_fryer,
            is_lunch_item: self.is_lunch_item,
        }
    }
}

/// A row from the `stock` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockRecord {
    pub item_id: String,
    pub quantity: f64,
    pub updated_at: String,
}

/// A row from the `prep_list` table: one task for one item on one day.
///
/// Name, category, unit, PAR and notes are snapshots taken at generation time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrepListEntry {
    pub id: String,
    pub item_id: String,
    pub date: NaiveDate,
    pub name: String,
    pub category: String,
    pub unit: String,
    pub par_level: f64,
    pub priority: Priority,
    pub batch_size: f64,
    pub batch_yield: f64,
    pub completed: bool,
    pub estimated_time: u32,
    pub notes: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl PrepListEntry {
    /// Stock units a completed task adds back: batches × yield.
    pub fn credit_amount(&self) -> f64 {
        self.batch_size * self.batch_yield
    }
}

/// Fields a caller may set when creating or editing a catalog item.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemInput {
    pub name: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub unit: String,
    pub par_level: f64,
    #[serde(default)]
    pub estimated_time: Option<u32>,
    #[serde(default)]
    pub menu_relevant: bool,
    #[serde(default)]
    pub is_lunch_item: bool,
    #[serde(default)]
    pub needs_fryer: bool,
    #[serde(default)]
    pub default_batch_size: f64,
    #[serde(default)]
    pub batch_yield: Option<f64>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Date format used for the `prep_list.date` column.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

pub(crate) fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

pub(crate) fn parse_date_column(idx: usize, raw: &str) -> rusqlite::Result<NaiveDate> {
    NaiveDate::parse_from_str(raw, DATE_FORMAT).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

pub(crate) fn parse_priority_column(idx: usize, raw: &str) -> rusqlite::Result<Priority> {
    raw.parse::<Priority>().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(
            idx,
            rusqlite::types::Type::Text,
            Box::new(std::io::Error::new(std::io::ErrorKind::InvalidData, e)),
        )
    })
}

/// One entry's completed flag as it should be persisted, plus the stock it
/// produces if that flag is newly set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionUpdate {
    pub entry_id: String,
    pub item_id: String,
    pub completed: bool,
    pub credit: f64,
}

impl CompletionUpdate {
    pub fn from_entry(entry: &PrepListEntry) -> Self {
        CompletionUpdate {
            entry_id: entry.id.clone(),
            item_id: entry.item_id.clone(),
            completed: entry.completed,
            credit: entry.credit_amount(),
        }
    }
}

/// Stock added to an item because an entry was completed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockCredit {
    pub entry_id: String,
    pub item_id: String,
    pub amount: f64,
}

/// What a completion batch actually changed in the store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionReceipt {
    /// Entries whose completed flag was written.
    pub updated: usize,
    /// Credits applied, one per newly completed entry with a positive amount.
    pub credits: Vec<StockCredit>,
    /// Completed entries that were already complete in the store (no credit).
    pub already_completed: usize,
    /// Entries that no longer exist in the store (no credit).
    pub missing: Vec<String>,
}

/// Result of writing one entry's completed flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionWrite {
    /// The entry went from incomplete to complete; its stock credit is due.
    NewlyCompleted,
    /// The flag was written but nothing is owed (reopened, or already complete).
    Written,
    /// No entry with that id exists any more.
    Missing,
}
