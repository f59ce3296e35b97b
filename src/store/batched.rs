use std::sync::Arc;

use async_trait::async_trait;
use tokio::task::JoinSet;

use super::{CompletionLedger, PrepListStore, StockStore};
use crate::db::{CompletionReceipt, CompletionUpdate, CompletionWrite, StockCredit};
use crate::error::StoreError;

/// Completion ledger for stores without multi-row transactions.
///
/// Every entry is written concurrently and the batch is joined before anything
/// is reported. A credit that fails after its flag was set is compensated by
/// reopening the entry, so a retry credits it again instead of losing it.
pub struct BatchedLedger<P, S> {
    prep: Arc<P>,
    stock: Arc<S>,
}

impl<P, S> BatchedLedger<P, S>
where
    P: PrepListStore,
    S: StockStore,
{
    pub fn new(prep: Arc<P>, stock: Arc<S>) -> Self {
        Self { prep, stock }
    }
}

enum EntryOutcome {
    Credited(Option<StockCredit>),
    Written { already_completed: bool },
    /// The row is gone; a completed one is still credited.
    Missing(String, Option<StockCredit>),
}

async fn apply_one<P, S>(
    prep: &P,
    stock: &S,
    update: CompletionUpdate,
) -> Result<EntryOutcome, StoreError>
where
    P: PrepListStore,
    S: StockStore,
{
    match prep.set_completed(&update.entry_id, update.completed).await? {
        CompletionWrite::NewlyCompleted => {
            if update.credit <= 0.0 {
                return Ok(EntryOutcome::Credited(None));
            }
            if let Err(err) = stock.increment(&update.item_id, update.credit).await {
                if let Err(revert) = prep.set_completed(&update.entry_id, false).await {
                    log::error!(
                        "Prep entry {} is marked complete but its stock credit failed and could not be reverted: {}",
                        update.entry_id,
                        revert
                    );
                }
                return Err(err);
            }
            Ok(EntryOutcome::Credited(Some(StockCredit {
                entry_id: update.entry_id,
                item_id: update.item_id,
                amount: update.credit,
            })))
        }
        CompletionWrite::Written => Ok(EntryOutcome::Written {
            already_completed: update.completed,
        }),
        CompletionWrite::Missing => {
            if !update.completed || update.credit <= 0.0 {
                return Ok(EntryOutcome::Missing(update.entry_id, None));
            }
            stock.increment(&update.item_id, update.credit).await?;
            Ok(EntryOutcome::Missing(
                update.entry_id.clone(),
                Some(StockCredit {
                    entry_id: update.entry_id,
                    item_id: update.item_id,
                    amount: update.credit,
                }),
            ))
        }
    }
}

#[async_trait]
impl<P, S> CompletionLedger for BatchedLedger<P, S>
where
    P: PrepListStore,
    S: StockStore,
{
    async fn apply_completions(
        &self,
        updates: Vec<CompletionUpdate>,
    ) -> Result<CompletionReceipt, StoreError> {
        let total = updates.len();
        let mut batch = JoinSet::new();
        for update in updates {
            let prep = Arc::clone(&self.prep);
            let stock = Arc::clone(&self.stock);
            batch.spawn(async move { apply_one(prep.as_ref(), stock.as_ref(), update).await });
        }

        let mut receipt = CompletionReceipt::default();
        let mut failures = Vec::new();
        while let Some(joined) = batch.join_next().await {
            match joined {
                Ok(Ok(EntryOutcome::Credited(credit))) => {
                    receipt.updated += 1;
                    receipt.credits.extend(credit);
                }
                Ok(Ok(EntryOutcome::Written { already_completed })) => {
                    receipt.updated += 1;
                    if already_completed {
                        receipt.already_completed += 1;
                    }
                }
                Ok(Ok(EntryOutcome::Missing(id, credit))) => {
                    receipt.missing.push(id);
                    receipt.credits.extend(credit);
                }
                Ok(Err(e)) => failures.push(e.to_string()),
                Err(e) => failures.push(e.to_string()),
            }
        }

        if failures.is_empty() {
            return Ok(receipt);
        }
        for failure in &failures {
            log::warn!("Completion batch member failed: {}", failure);
        }
        Err(StoreError::Batch {
            failed: failures.len(),
            total,
            first: failures.swap_remove(0),
        })
    }
}
