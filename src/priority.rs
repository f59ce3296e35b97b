use crate::types::{ItemAttributes, Priority};

/// Stock above `par * OVERSTOCK_FACTOR` needs no prep at all.
const OVERSTOCK_FACTOR: f64 = 1.2;
/// At or below this share of PAR an item is considered depleted.
const DEPLETED_RATIO: f64 = 0.30;
/// Menu items above this share of PAR are "close to par" (reason text only).
const NEAR_PAR_RATIO: f64 = 0.75;
/// Prep that takes this long must start early.
const LONG_PREP_MINUTES: u32 = 90;
/// Slack for threshold comparisons, relative to the threshold. Products like
/// `3.0 * 1.2` land a few ulps off the decimal value a cook would enter.
const REL_TOLERANCE: f64 = 1e-9;

pub const DEFAULT_CRITICAL_ITEMS: &[&str] = &["prime rib seasoning"];

/// Outcome of classifying one item.
#[derive(Debug, Clone, PartialEq)]
pub struct Assessment {
    /// `None` means the item is excluded from the prep list.
    pub priority: Option<Priority>,
    pub reason: String,
}

impl Assessment {
    fn excluded(reason: impl Into<String>) -> Self {
        Assessment {
            priority: None,
            reason: reason.into(),
        }
    }

    fn tier(priority: Priority, reason: impl Into<String>) -> Self {
        Assessment {
            priority: Some(priority),
            reason: reason.into(),
        }
    }
}

/// Priority policy for prep items.
///
/// The only tunable is the list of ingredients that always go to the top tier
/// when below par; the thresholds are fixed.
#[derive(Debug, Clone)]
pub struct Classifier {
    critical_items: Vec<String>,
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new(DEFAULT_CRITICAL_ITEMS.iter().copied())
    }
}

impl Classifier {
    pub fn new<I, S>(critical_items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let critical_items = critical_items
            .into_iter()
            .map(|s| s.as_ref().trim().to_lowercase())
            .filter(|s| !s.is_empty())
            .collect();
        Self { critical_items }
    }

    pub fn classify(&self, current: f64, target: f64, attrs: &ItemAttributes) -> Option<Priority> {
        self.assess(current, target, attrs).priority
    }

    /// Classify and explain. First matching rule wins:
    /// overstock → excluded, slightly over → C, at par → B,
    /// below par → A on any escalation trigger, otherwise B.
    pub fn assess(&self, current: f64, target: f64, attrs: &ItemAttributes) -> Assessment {
        if !target.is_finite() || target <= 0.0 {
            return Assessment::excluded("no PAR level set");
        }
        let current = if current.is_nan() { 0.0 } else { current };

        if !at_most(current, target * OVERSTOCK_FACTOR) {
            return Assessment::excluded("stock well above PAR");
        }
        if !at_most(current, target) {
            return Assessment::tier(Priority::C, "slightly above PAR; top up soon");
        }
        if at_most(target, current) {
            return Assessment::tier(Priority::B, "at PAR");
        }

        let ratio = current / target;
        let mut triggers = Vec::new();
        if self.is_critical(&attrs.name) {
            triggers.push("critical ingredient".to_string());
        }
        if at_most(ratio, DEPLETED_RATIO) {
            triggers.push(format!("{:.0}% of PAR", (ratio * 100.0).max(0.0)));
        }
        if attrs.needs_fryer {
            triggers.push("needs fryer".to_string());
        }
        if attrs.estimated_time >= LONG_PREP_MINUTES {
            triggers.push(format!("{} min prep", attrs.estimated_time));
        }
        if attrs.is_lunch_item {
            triggers.push("lunch service".to_string());
        }

        if !triggers.is_empty() {
            return Assessment::tier(Priority::A, format!("below PAR; {}", triggers.join("; ")));
        }
        if attrs.menu_relevant && ratio > NEAR_PAR_RATIO {
            return Assessment::tier(Priority::B, "below PAR; menu item close to PAR");
        }
        Assessment::tier(Priority::B, "below PAR")
    }

    fn is_critical(&self, name: &str) -> bool {
        let name = name.to_lowercase();
        self.critical_items.iter().any(|c| name.contains(c.as_str()))
    }
}

/// `value <= limit`, allowing for rounding in how `limit` was computed.
fn at_most(value: f64, limit: f64) -> bool {
    value <= limit + limit.abs() * REL_TOLERANCE
}

/// Classify with the default policy.
pub fn classify(current: f64, target: f64, attrs: &ItemAttributes) -> Option<Priority> {
    Classifier::default().classify(current, target, attrs)
}
