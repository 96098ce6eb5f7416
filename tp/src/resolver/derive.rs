//! Companion mutations run before each resolution
//!
//! The resolver itself never touches TripFacts. Anything that can be
//! computed from facts already present is filled in here, at the start of
//! every Evaluating pass.

use chrono::Days;
use tracing::{debug, warn};

use crate::domain::{FactField, FactSource, TripFacts, TripType};

/// Fill derivable facts and consume scratch hints; returns the fields written
pub fn apply(facts: &mut TripFacts) -> Vec<FactField> {
    let mut changed = Vec::new();
    if apply_duration_hint(facts) {
        changed.push(FactField::ReturnDate);
    }
    if chain_leg_origins(facts) {
        changed.push(FactField::Legs);
    }
    if !changed.is_empty() {
        debug!(?changed, "derive::apply: derived facts");
    }
    changed
}

/// `returnDate = departureDate + duration` once the departure is known
fn apply_duration_hint(facts: &mut TripFacts) -> bool {
    let Some(days) = facts.pending.trip_duration_days else {
        return false;
    };
    if facts.trip_type() != TripType::Roundtrip || facts.return_date.is_some() {
        debug!(days, "apply_duration_hint: return date not needed, dropping hint");
        facts.pending.trip_duration_days = None;
        return false;
    }
    let Some(departure) = facts.departure_date else {
        return false;
    };

    facts.pending.trip_duration_days = None;
    match departure.checked_add_days(Days::new(u64::from(days))) {
        Some(return_date) => {
            debug!(%departure, days, %return_date, "apply_duration_hint: computed return date");
            facts.return_date = Some(return_date);
            facts.mark(FactField::ReturnDate, FactSource::Derived);
            true
        }
        None => {
            warn!(%departure, days, "apply_duration_hint: duration overflows calendar, dropping hint");
            false
        }
    }
}

/// Each leg without an origin departs from where the previous leg arrived
fn chain_leg_origins(facts: &mut TripFacts) -> bool {
    if facts.trip_type() != TripType::Multi {
        return false;
    }
    let mut changed = false;
    for index in 0..facts.legs.len() {
        if facts.legs[index].origin.is_some() {
            continue;
        }
        let origin = if index == 0 {
            facts.origin.clone()
        } else {
            facts.legs[index - 1].destination.clone()
        };
        if origin.is_some() {
            facts.legs[index].origin = origin;
            changed = true;
        }
    }
    changed
}
