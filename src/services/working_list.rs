use chrono::NaiveDate;
use serde::Serialize;

use crate::db::{CompletionUpdate, PrepListEntry};
use crate::types::{Priority, PrepSummary};

/// The active prep tasks for one day, as staff see and toggle them.
///
/// Toggling is local until `CompletionService::commit_completions` persists it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkingList {
    date: NaiveDate,
    entries: Vec<PrepListEntry>,
}

impl WorkingList {
    /// Entries are ordered by tier, then name.
    pub fn new(date: NaiveDate, mut entries: Vec<PrepListEntry>) -> Self {
        entries.sort_by(|a, b| {
            a.priority
                .cmp(&b.priority)
                .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
                .then_with(|| a.item_id.cmp(&b.item_id))
        });
        Self { date, entries }
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn entries(&self) -> &[PrepListEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&PrepListEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    pub fn with_priority(&self, priority: Priority) -> impl Iterator<Item = &PrepListEntry> {
        self.entries.iter().filter(move |e| e.priority == priority)
    }

    /// Toggle an entry locally. Returns false if no such entry is in the list.
    pub fn mark_completed(&mut self, id: &str, completed: bool) -> bool {
        match self.entries.iter_mut().find(|e| e.id == id) {
            Some(entry) => {
                entry.completed = completed;
                true
            }
            None => false,
        }
    }

    pub fn completed_count(&self) -> usize {
        self.entries.iter().filter(|e| e.completed).count()
    }

    pub fn summary(&self) -> PrepSummary {
        PrepSummary::from_entries(&self.entries)
    }

    /// One update per entry, completed or not.
    pub(crate) fn completion_updates(&self) -> Vec<CompletionUpdate> {
        self.entries.iter().map(CompletionUpdate::from_entry).collect()
    }

    /// Drop completed entries. Returns how many were removed.
    pub(crate) fn prune_completed(&mut self) -> usize {
        let before = self.entries.len();
        self.entries.retain(|e| !e.completed);
        before - self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::prep_list::sample_entry;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 14).unwrap()
    }

    fn entry(id: &str, name: &str, priority: Priority) -> PrepListEntry {
        let mut e = sample_entry(id, id, day());
        e.name = name.to_string();
        e.priority = priority;
        e
    }

    #[test]
    fn test_sorted_by_priority_then_name() {
        let list = WorkingList::new(
            day(),
            vec![
                entry("1", "zucchini", Priority::B),
                entry("2", "Aioli", Priority::C),
                entry("3", "basil", Priority::A),
                entry("4", "Apples", Priority::B),
            ],
        );
        let ids: Vec<&str> = list.entries().iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["3", "4", "1", "2"]);
        assert_eq!(list.with_priority(Priority::B).count(), 2);
    }

    #[test]
    fn test_mark_and_prune() {
        let mut list = WorkingList::new(
            day(),
            vec![entry("1", "a", Priority::A), entry("2", "b", Priority::B)],
        );
        assert!(list.mark_completed("1", true));
        assert!(!list.mark_completed("missing", true));
        assert_eq!(list.completed_count(), 1);

        let updates = list.completion_updates();
        assert_eq!(updates.len(), 2, "every entry is persisted, not just completed ones");

        assert_eq!(list.prune_completed(), 1);
        assert_eq!(list.len(), 1);
        assert!(list.get("1").is_none());
    }

    #[test]
    fn test_summary_counts() {
        let mut list = WorkingList::new(
            day(),
            vec![
                entry("1", "a", Priority::A),
                entry("2", "b", Priority::A),
                entry("3", "c", Priority::C),
            ],
        );
        list.mark_completed("2", true);
        let summary = list.summary();
        assert_eq!(summary.total_items, 3);
        assert_eq!(summary.completed_items, 1);
        assert_eq!(summary.priority_a, 2);
        assert_eq!(summary.priority_b, 0);
        assert_eq!(summary.priority_c, 1);
        assert_eq!(summary.total_minutes, 45);
        assert_eq!(summary.remaining_minutes, 30);
    }
}
