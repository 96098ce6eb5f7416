//! The ordered requirement checklist
//!
//! Every resolver question is answered by walking the same list: `resolve`
//! stops at the first unmet entry, `missing_fields` collects all of them and
//! `progress_percent` counts them. Keeping one list is what keeps the three
//! views consistent with each other.

use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

use crate::domain::{TripFacts, TripType, WidgetRequest, WidgetType};

use super::ResolverOptions;

/// A required piece of TripFacts, in checklist order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "field", content = "leg", rename_all = "camelCase")]
pub enum FieldId {
    Destination,
    DepartureDate,
    ReturnDate,
    Travelers,
    TripTypeConfirmation,
    LegDestination(usize),
    LegDate(usize),
}

impl std::fmt::Display for FieldId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Destination => write!(f, "destination"),
            Self::DepartureDate => write!(f, "departureDate"),
            Self::ReturnDate => write!(f, "returnDate"),
            Self::Travelers => write!(f, "travelers"),
            Self::TripTypeConfirmation => write!(f, "tripTypeConfirmation"),
            Self::LegDestination(leg) => write!(f, "legs[{}].destination", leg),
            Self::LegDate(leg) => write!(f, "legs[{}].date", leg),
        }
    }
}

/// One checklist entry: the field, whether it is satisfied, and the widget
/// that would collect it
#[derive(Debug, Clone, PartialEq)]
pub struct Requirement {
    pub field: FieldId,
    pub satisfied: bool,
    pub request: WidgetRequest,
}

impl Requirement {
    fn new(field: FieldId, satisfied: bool, request: WidgetRequest) -> Self {
        Self {
            field,
            satisfied,
            request,
        }
    }
}

/// Build the full checklist for the given facts, in priority order
pub fn checklist(facts: &TripFacts, options: &ResolverOptions) -> Vec<Requirement> {
    let trip_type = facts.trip_type();
    debug!(%trip_type, "checklist: called");
    let mut items = Vec::new();

    match trip_type {
        TripType::Multi => push_legs(facts, options, &mut items),
        TripType::Roundtrip | TripType::Oneway => push_single_destination(facts, options, &mut items),
    }

    items.push(Requirement::new(
        FieldId::Travelers,
        facts.adults() >= 1,
        WidgetRequest::new(WidgetType::TravelersSelector, "at least one adult traveler is required")
            .with_data(json!({ "current": facts.travelers.unwrap_or_default() })),
    ));

    items.push(Requirement::new(
        FieldId::TripTypeConfirmation,
        facts.trip_type_confirmed,
        WidgetRequest::new(WidgetType::TripTypeConfirm, "trip type has not been confirmed")
            .with_data(json!({ "suggested": trip_type })),
    ));

    items
}

fn push_single_destination(facts: &TripFacts, options: &ResolverOptions, items: &mut Vec<Requirement>) {
    let roundtrip = facts.trip_type() == TripType::Roundtrip;

    items.push(Requirement::new(
        FieldId::Destination,
        facts.destination.is_some(),
        WidgetRequest::new(WidgetType::CitySelector, "destination is missing")
            .with_data(json!({ "field": "destination" })),
    ));

    // Both dates missing on a roundtrip: ask for them together
    let departure_request = if roundtrip && facts.return_date.is_none() {
        if options.range_picker_for_roundtrip {
            WidgetRequest::new(WidgetType::DateRangePicker, "travel dates are missing")
        } else {
            WidgetRequest::new(WidgetType::DatePicker, "travel dates are missing").with_data(json!({ "mode": "range" }))
        }
    } else {
        WidgetRequest::new(WidgetType::DatePicker, "departure date is missing")
            .with_data(json!({ "mode": "single", "dateType": "departure" }))
    };
    items.push(Requirement::new(
        FieldId::DepartureDate,
        facts.departure_date.is_some(),
        departure_request,
    ));

    if roundtrip {
        items.push(Requirement::new(
            FieldId::ReturnDate,
            facts.return_date.is_some(),
            WidgetRequest::new(WidgetType::ReturnDatePicker, "return date is missing")
                .with_data(json!({ "minDate": facts.departure_date })),
        ));
    }
}

fn push_legs(facts: &TripFacts, options: &ResolverOptions, items: &mut Vec<Requirement>) {
    let count = facts.legs.len().max(options.min_legs);
    debug!(legs = facts.legs.len(), count, "push_legs: called");

    for index in 0..count {
        let leg = facts.legs.get(index);
        let destination = leg.and_then(|l| l.destination.as_ref());
        let date = leg.and_then(|l| l.date);

        items.push(Requirement::new(
            FieldId::LegDestination(index),
            destination.is_some(),
            WidgetRequest::new(WidgetType::CitySelector, format!("leg {} destination is missing", index + 1))
                .with_data(json!({ "field": "destination", "leg": index }))
                .for_leg(index),
        ));
        items.push(Requirement::new(
            FieldId::LegDate(index),
            date.is_some(),
            WidgetRequest::new(WidgetType::DatePicker, format!("leg {} date is missing", index + 1))
                .with_data(json!({ "mode": "single", "dateType": "departure", "leg": index }))
                .for_leg(index),
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{City, Leg};

    #[test]
    fn test_roundtrip_checklist_order() {
        let items = checklist(&TripFacts::new(), &ResolverOptions::default());
        let fields: Vec<_> = items.iter().map(|r| r.field).collect();
        assert_eq!(
            fields,
            vec![
                FieldId::Destination,
                FieldId::DepartureDate,
                FieldId::ReturnDate,
                FieldId::Travelers,
                FieldId::TripTypeConfirmation,
            ]
        );
        assert!(items.iter().all(|r| !r.satisfied));
    }

    #[test]
    fn test_oneway_has_no_return_requirement() {
        let mut facts = TripFacts::new();
        facts.trip_type = Some(TripType::Oneway);
        let items = checklist(&facts, &ResolverOptions::default());
        assert!(items.iter().all(|r| r.field != FieldId::ReturnDate));
        assert_eq!(items.len(), 4);
    }

    #[test]
    fn test_multi_pads_to_min_legs() {
        let mut facts = TripFacts::new();
        facts.trip_type = Some(TripType::Multi);
        facts.legs.push(Leg::to(City::named("Rome"), None));

        let items = checklist(&facts, &ResolverOptions::default());
        let fields: Vec<_> = items.iter().map(|r| r.field).collect();
        assert_eq!(
            &fields[..4],
            &[
                FieldId::LegDestination(0),
                FieldId::LegDate(0),
                FieldId::LegDestination(1),
                FieldId::LegDate(1),
            ]
        );
        assert!(items[0].satisfied);
        assert_eq!(items[2].request.leg, Some(1));
    }

    #[test]
    fn test_field_id_display() {
        assert_eq!(FieldId::LegDate(2).to_string(), "legs[2].date");
        assert_eq!(FieldId::TripTypeConfirmation.to_string(), "tripTypeConfirmation");
    }
}
