//! Domain types shared by the classifier, the services, and the store layer.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Urgency tier of a prep task. `A` is the most urgent.
///
/// The derived ordering follows declaration order, so sorting ascending puts
/// `A` first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Priority {
    A,
    B,
    C,
}

impl Priority {
    pub fn as_str(self) -> &'static str {
        match self {
            Priority::A => "A",
            Priority::B => "B",
            Priority::C => "C",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "A" | "a" => Ok(Priority::A),
            "B" | "b" => Ok(Priority::B),
            "C" | "c" => Ok(Priority::C),
            other => Err(format!("unknown priority tier: {other:?}")),
        }
    }
}

/// The attributes of an item that can escalate it to the top tier.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ItemAttributes {
    pub name: String,
    pub menu_relevant: bool,
    /// Minutes of preparation.
    pub estimated_time: u32,
    pub needs_fryer: bool,
    pub is_lunch_item: bool,
}

/// Coarse stock health for an item, as shown next to the inventory count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StockStatus {
    Critical,
    Low,
    Moderate,
    Good,
}

impl StockStatus {
    /// Bucket `current / par`. Items without a positive PAR are never flagged.
    pub fn from_levels(current: f64, par: f64) -> Self {
        if !par.is_finite() || par <= 0.0 {
            return StockStatus::Good;
        }
        let ratio = current / par;
        if ratio <= 0.25 {
            StockStatus::Critical
        } else if ratio <= 0.5 {
            StockStatus::Low
        } else if ratio < 1.0 {
            StockStatus::Moderate
        } else {
            StockStatus::Good
        }
    }
}

/// Counts and time totals for a day's prep work.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PrepSummary {
    pub total_items: usize,
    pub completed_items: usize,
    pub priority_a: usize,
    pub priority_b: usize,
    pub priority_c: usize,
    pub total_minutes: u32,
    pub remaining_minutes: u32,
}

impl PrepSummary {
    pub fn from_entries<'a, I>(entries: I) -> Self
    where
        I: IntoIterator<Item = &'a crate::db::PrepListEntry>,
    {
        let mut summary = PrepSummary::default();
        for entry in entries {
            summary.total_items += 1;
            summary.total_minutes = summary.total_minutes.saturating_add(entry.estimated_time);
            match entry.priority {
                Priority::A => summary.priority_a += 1,
                Priority::B => summary.priority_b += 1,
                Priority::C => summary.priority_c += 1,
            }
            if entry.completed {
                summary.completed_items += 1;
            } else {
                summary.remaining_minutes =
                    summary.remaining_minutes.saturating_add(entry.estimated_time);
            }
        }
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_orders_a_first() {
        let mut tiers = vec![Priority::C, Priority::A, Priority::B];
        tiers.sort();
        assert_eq!(tiers, vec![Priority::A, Priority::B, Priority::C]);
    }

    #[test]
    fn test_priority_parse() {
        assert_eq!("A".parse::<Priority>(), Ok(Priority::A));
        assert_eq!(" c ".parse::<Priority>(), Ok(Priority::C));
        assert!("D".parse::<Priority>().is_err());
    }

    #[test]
    fn test_stock_status_buckets() {
        assert_eq!(StockStatus::from_levels(2.0, 10.0), StockStatus::Critical);
        assert_eq!(StockStatus::from_levels(2.5, 10.0), StockStatus::Critical);
        assert_eq!(StockStatus::from_levels(5.0, 10.0), StockStatus::Low);
        assert_eq!(StockStatus::from_levels(9.0, 10.0), StockStatus::Moderate);
        assert_eq!(StockStatus::from_levels(10.0, 10.0), StockStatus::Good);
        assert_eq!(StockStatus::from_levels(0.0, 0.0), StockStatus::Good);
    }
}
