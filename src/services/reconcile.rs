// Prep list reconciliation: turn today's stock gap into a persisted task list
// without duplicating or reshuffling work already handed to staff.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use serde::Serialize;

use crate::config::DEFAULT_ESTIMATED_TIME;
use crate::db::{InventoryItem, PrepListEntry};
use crate::error::PrepError;
use crate::priority::Classifier;
use crate::services::WorkingList;
use crate::store::{CatalogStore, PrepListStore, StockStore};
use crate::types::Priority;

/// Whether the returned list was computed now or taken from an earlier run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReconcileOutcome {
    Generated,
    Reused,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Reconciliation {
    pub outcome: ReconcileOutcome,
    pub list: WorkingList,
    /// Entries written by the upsert (0 when reused).
    pub planned: usize,
    /// Rows deleted by a forced refresh.
    pub cleared: usize,
    /// Open entries removed because their item is no longer active.
    pub orphans_removed: usize,
}

impl Reconciliation {
    /// True when nothing needs prep. This is a valid answer, not a failure.
    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }
}

pub struct ReconciliationService<C, S, P> {
    catalog: Arc<C>,
    stock: Arc<S>,
    prep: Arc<P>,
    classifier: Classifier,
    default_estimated_time: u32,
}

impl<C, S, P> ReconciliationService<C, S, P>
where
    C: CatalogStore,
    S: StockStore,
    P: PrepListStore,
{
    pub fn new(catalog: Arc<C>, stock: Arc<S>, prep: Arc<P>) -> Self {
        Self {
            catalog,
            stock,
            prep,
            classifier: Classifier::default(),
            default_estimated_time: DEFAULT_ESTIMATED_TIME,
        }
    }

    pub fn with_classifier(mut self, classifier: Classifier) -> Self {
        self.classifier = classifier;
        self
    }

    /// Minutes snapshotted onto entries whose item has no estimate.
    pub fn with_default_estimated_time(mut self, minutes: u32) -> Self {
        self.default_estimated_time = minutes.max(1);
        self
    }

    /// Produce the active prep list for `as_of`.
    ///
    /// Without `force_refresh` an existing list for the day is returned as-is,
    /// so priorities never shift under staff mid-shift. With it, the day's rows
    /// (completed ones included) are cleared and recomputed from current stock.
    /// Any store failure aborts the call; the previously persisted list stays
    /// authoritative.
    pub async fn reconcile(
        &self,
        as_of: NaiveDate,
        force_refresh: bool,
    ) -> Result<Reconciliation, PrepError> {
        let items = self.catalog.active_items().await?;
        let stock = self.stock.stock_levels().await?;
        let existing = self.prep.entries_for_date(as_of).await?;

        let active_ids: HashSet<String> = items.iter().map(|i| i.id.clone()).collect();

        if !existing.is_empty() && !force_refresh {
            let (open, orphans_removed) = self.retain_active(existing, &active_ids).await?;
            log::info!(
                "Prep list for {} reused: {} open entries ({} orphaned removed)",
                as_of,
                open.len(),
                orphans_removed
            );
            return Ok(Reconciliation {
                outcome: ReconcileOutcome::Reused,
                list: WorkingList::new(as_of, open),
                planned: 0,
                cleared: 0,
                orphans_removed,
            });
        }

        let on_hand: HashMap<&str, f64> = stock
            .iter()
            .map(|s| (s.item_id.as_str(), s.quantity))
            .collect();
        let now = Utc::now().to_rfc3339();

        let planned: Vec<PrepListEntry> = items
            .iter()
            .filter_map(|item| {
                let current = on_hand.get(item.id.as_str()).copied().unwrap_or(0.0);
                let assessment = self
                    .classifier
                    .assess(current, item.par_level, &item.attributes());
                log::debug!(
                    "{} ({}/{} {}): {} ({})",
                    item.name,
                    current,
                    item.par_level,
                    item.unit,
                    assessment.priority.map(Priority::as_str).unwrap_or("excluded"),
                    assessment.reason
                );
                assessment
                    .priority
                    .map(|priority| {
                        plan_entry(item, priority, as_of, &now, self.default_estimated_time)
                    })
            })
            .collect();

        let planned_count = planned.len();
        let mut cleared = 0;
        if !existing.is_empty() {
            // Old rows only disappear together with the new ones landing.
            cleared = self.prep.replace_day(as_of, planned).await?;
            log::info!("Forced refresh cleared {} prep entries for {}", cleared, as_of);
        } else if !planned.is_empty() {
            self.prep.upsert_entries(planned).await?;
        }

        // Items can be soft-deleted while we were writing; re-check before answering.
        let still_active: HashSet<String> = self
            .catalog
            .active_items()
            .await?
            .into_iter()
            .map(|i| i.id)
            .collect();
        let fresh = self.prep.entries_for_date(as_of).await?;
        let (open, orphans_removed) = self.retain_active(fresh, &still_active).await?;

        log::info!(
            "Prep list for {} generated: {} of {} active items need prep",
            as_of,
            open.len(),
            items.len()
        );

        Ok(Reconciliation {
            outcome: ReconcileOutcome::Generated,
            list: WorkingList::new(as_of, open),
            planned: planned_count,
            cleared,
            orphans_removed,
        })
    }

    /// Split a day's rows into open entries for active items, deleting open
    /// entries whose item is gone. Completed rows are history and stay.
    async fn retain_active(
        &self,
        entries: Vec<PrepListEntry>,
        active_ids: &HashSet<String>,
    ) -> Result<(Vec<PrepListEntry>, usize), PrepError> {
        let (open, orphans): (Vec<_>, Vec<_>) = entries
            .into_iter()
            .filter(|e| !e.completed)
            .partition(|e| active_ids.contains(&e.item_id));

        if orphans.is_empty() {
            return Ok((open, 0));
        }

        log::warn!(
            "Removing {} open prep entries for deleted items: {}",
            orphans.len(),
            orphans
                .iter()
                .map(|e| e.name.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        );
        let ids = orphans.into_iter().map(|e| e.id).collect();
        let removed = self.prep.delete_entries(ids).await?;
        Ok((open, removed))
    }
}

/// Snapshot an item into a new entry for `date`.
fn plan_entry(
    item: &InventoryItem,
    priority: Priority,
    date: NaiveDate,
    now: &str,
    default_estimated_time: u32,
) -> PrepListEntry {
    let batch_size = if item.default_batch_size.is_finite() && item.default_batch_size > 0.0 {
        item.default_batch_size
    } else {
        0.0
    };
    let batch_yield = if item.batch_yield.is_finite() && item.batch_yield >= 1.0 {
        item.batch_yield
    } else {
        1.0
    };
    let estimated_time = if item.estimated_time == 0 {
        default_estimated_time
    } else {
        item.estimated_time
    };

    PrepListEntry {
        id: uuid::Uuid::new_v4().to_string(),
        item_id: item.id.clone(),
        date,
        name: item.name.clone(),
        category: item.category.clone(),
        unit: item.unit.clone(),
        par_level: item.par_level,
        priority,
        batch_size,
        batch_yield,
        completed: false,
        estimated_time,
        notes: item.notes.clone(),
        created_at: now.to_string(),
        updated_at: now.to_string(),
    }
}
