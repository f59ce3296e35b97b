//! Error types for prep-list generation and completion.
//!
//! Errors are classified by recoverability:
//! - Retryable: store unavailable, busy database, partially failed batch
//! - NonRetryable: bad input, missing items, schema problems

use thiserror::Error;

use crate::db::DbError;

/// Failures reported by a store collaborator.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] DbError),

    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Store task failed: {0}")]
    Task(String),

    #[error("{failed} of {total} store operations failed; first error: {first}")]
    Batch {
        failed: usize,
        total: usize,
        first: String,
    },
}

impl From<tokio::task::JoinError> for StoreError {
    fn from(err: tokio::task::JoinError) -> Self {
        StoreError::Task(err.to_string())
    }
}

/// Error type for the prep-list services.
#[derive(Debug, Error)]
pub enum PrepError {
    #[error("Could not determine the prep list: {0}")]
    Store(StoreError),

    #[error("Invalid {field}: {reason}")]
    Validation { field: &'static str, reason: String },

    #[error("Item not found: {0}")]
    ItemNotFound(String),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl From<DbError> for PrepError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::ItemNotFound(id) => PrepError::ItemNotFound(id),
            other => PrepError::Store(StoreError::Database(other)),
        }
    }
}

impl From<StoreError> for PrepError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Database(db) => db.into(),
            other => PrepError::Store(other),
        }
    }
}

impl PrepError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        PrepError::Validation {
            field,
            reason: reason.into(),
        }
    }

    /// Returns true if retrying the same call may succeed.
    ///
    /// Reconciliation and completion are both safe to repeat: the prep list is
    /// keyed on `(date, item)` and credits only follow a fresh completion.
    pub fn is_retryable(&self) -> bool {
        match self {
            PrepError::Store(StoreError::Database(DbError::Sqlite(e))) => matches!(
                e.sqlite_error_code(),
                Some(rusqlite::ErrorCode::DatabaseBusy) | Some(rusqlite::ErrorCode::DatabaseLocked)
            ),
            PrepError::Store(StoreError::Database(_)) => false,
            PrepError::Store(_) => true,
            _ => false,
        }
    }

    /// Get a user-friendly recovery suggestion
    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            PrepError::Store(StoreError::Database(DbError::Migration(_))) => {
                "The database was written by a newer version. Upgrade and try again."
            }
            PrepError::Store(StoreError::Database(DbError::HomeDirNotFound))
            | PrepError::Store(StoreError::Database(DbError::CreateDir(_))) => {
                "Set dbPath in ~/.preplist/config.json to a writable location."
            }
            PrepError::Store(_) if self.is_retryable() => {
                "The previous prep list is still valid. Try again in a moment."
            }
            PrepError::Store(_) => "Check the database file and its permissions.",
            PrepError::Validation { .. } => "Correct the highlighted value and save again.",
            PrepError::ItemNotFound(_) => "Reload the catalog; the item may have been removed.",
            PrepError::Configuration(_) => "Check ~/.preplist/config.json.",
        }
    }
}

/// Serializable error representation for callers.
#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PrepErrorReport {
    pub message: String,
    pub error_type: ErrorType,
    pub can_retry: bool,
    pub recovery_suggestion: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorType {
    Retryable,
    NonRetryable,
}

impl From<&PrepError> for PrepErrorReport {
    fn from(err: &PrepError) -> Self {
        let can_retry = err.is_retryable();
        PrepErrorReport {
            message: err.to_string(),
            error_type: if can_retry {
                ErrorType::Retryable
            } else {
                ErrorType::NonRetryable
            },
            can_retry,
            recovery_suggestion: err.recovery_suggestion().to_string(),
        }
    }
}
