//! Prep-list services: reconciliation, completion, and catalog maintenance.

mod catalog;
mod completion;
mod reconcile;
mod working_list;

pub use catalog::{CatalogService, InventoryLevel};
pub use completion::{CompletionReport, CompletionService};
pub use reconcile::{ReconcileOutcome, Reconciliation, ReconciliationService};
pub use working_list::WorkingList;
