use std::sync::Arc;

use serde::Serialize;

use crate::db::CompletionReceipt;
use crate::error::PrepError;
use crate::services::WorkingList;
use crate::store::CompletionLedger;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionReport {
    #[serde(flatten)]
    pub receipt: CompletionReceipt,
    /// Completed entries dropped from the working list.
    pub pruned: usize,
}

impl CompletionReport {
    pub fn credited_total(&self) -> f64 {
        self.receipt.credits.iter().map(|c| c.amount).sum()
    }
}

/// Persists staff toggles and credits produced stock back to inventory.
pub struct CompletionService<L> {
    ledger: Arc<L>,
}

impl<L: CompletionLedger> CompletionService<L> {
    pub fn new(ledger: Arc<L>) -> Self {
        Self { ledger }
    }

    /// Write the completed flag of every entry in `list`, credit each newly
    /// completed entry's `batch_size * batch_yield`, then drop completed
    /// entries from `list`.
    ///
    /// A completed entry whose row was replaced by a forced refresh is still
    /// credited: the batch was produced even though its task row is gone.
    ///
    /// The list is only pruned once the whole batch has committed. On error it
    /// is left exactly as it was so the caller can retry.
    pub async fn commit_completions(
        &self,
        list: &mut WorkingList,
    ) -> Result<CompletionReport, PrepError> {
        if list.is_empty() {
            return Ok(CompletionReport::default());
        }

        let updates = list.completion_updates();
        let receipt = match self.ledger.apply_completions(updates).await {
            Ok(receipt) => receipt,
            Err(e) => {
                log::error!(
                    "Completion commit for {} failed; {} entries kept for retry: {}",
                    list.date(),
                    list.completed_count(),
                    e
                );
                return Err(e.into());
            }
        };

        if !receipt.missing.is_empty() {
            log::warn!(
                "{} prep entries were replaced in the store since this list was loaded: {:?}",
                receipt.missing.len(),
                receipt.missing
            );
        }

        let pruned = list.prune_completed();
        log::info!(
            "Committed {} prep entries for {}: {} credited, {} already complete",
            receipt.updated,
            list.date(),
            receipt.credits.len(),
            receipt.already_completed
        );

        Ok(CompletionReport { receipt, pruned })
    }
}
