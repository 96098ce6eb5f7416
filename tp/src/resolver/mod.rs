//! NextWidgetResolver - decides which single widget is needed next
//!
//! `resolve` is a pure function of TripFacts: same facts, same answer. It
//! walks a fixed checklist in priority order and returns the widget for the
//! first unmet entry, or `None` when the trip is ready to search.
//!
//! Checklist order:
//!
//! 1. destination (or, for multi-city, each leg's destination then date)
//! 2. departure date
//! 3. return date (roundtrip only)
//! 4. at least one adult
//! 5. trip type confirmed

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::{TripFacts, WidgetRequest};

mod checklist;
pub mod derive;

pub use checklist::{FieldId, Requirement, checklist};

/// Minimum legs a multi-city trip must have
pub const DEFAULT_MIN_LEGS: usize = 2;

/// Tunables that shape which widget is requested, never whether one is
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverOptions {
    /// Ask for roundtrip dates with `dateRangePicker` instead of a
    /// `datePicker` in range mode
    #[serde(rename = "range-picker-for-roundtrip")]
    pub range_picker_for_roundtrip: bool,

    /// Minimum number of legs for a multi-city trip
    #[serde(rename = "min-legs")]
    pub min_legs: usize,
}

impl Default for ResolverOptions {
    fn default() -> Self {
        Self {
            range_picker_for_roundtrip: false,
            min_legs: DEFAULT_MIN_LEGS,
        }
    }
}

/// The next widget to show, or `None` when every requirement is met
pub fn resolve(facts: &TripFacts, options: &ResolverOptions) -> Option<WidgetRequest> {
    let next = checklist(facts, options).into_iter().find(|r| !r.satisfied);
    debug!(field = ?next.as_ref().map(|r| r.field), "resolve: done");
    next.map(|r| r.request)
}

/// Every unmet requirement, in checklist order
pub fn missing_fields(facts: &TripFacts, options: &ResolverOptions) -> Vec<FieldId> {
    checklist(facts, options)
        .into_iter()
        .filter(|r| !r.satisfied)
        .map(|r| r.field)
        .collect()
}

/// Satisfied requirements as a rounded percentage, 0 when there are none
pub fn progress_percent(facts: &TripFacts, options: &ResolverOptions) -> u8 {
    let items = checklist(facts, options);
    let total = items.len();
    if total == 0 {
        return 0;
    }
    let done = items.iter().filter(|r| r.satisfied).count();
    ((done * 100 + total / 2) / total) as u8
}

pub fn is_ready(facts: &TripFacts, options: &ResolverOptions) -> bool {
    resolve(facts, options).is_none()
}
