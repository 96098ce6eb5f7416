//! TripFacts domain type
//!
//! The single source of truth for everything collected during a planning
//! conversation. Fields that may be "not yet known" are `Option`s, so the
//! difference between an unset fact and a defaulted one is visible in the type.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::widget::{CityField, DateType, WidgetValue};

/// Trip shape
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TripType {
    /// Out and back, needs a return date
    #[default]
    Roundtrip,
    /// Single direction
    Oneway,
    /// Ordered list of legs
    Multi,
}

impl std::fmt::Display for TripType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Roundtrip => write!(f, "roundtrip"),
            Self::Oneway => write!(f, "oneway"),
            Self::Multi => write!(f, "multi"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

/// A city as picked in the city selector or extracted from a message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "CityRepr")]
pub struct City {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country_code: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<Coordinates>,
}

/// Cities arrive either as a bare name (`"Paris"`) or as a full record
#[derive(Deserialize)]
#[serde(untagged)]
enum CityRepr {
    Name(String),
    #[serde(rename_all = "camelCase")]
    Full {
        name: String,
        #[serde(default)]
        country: Option<String>,
        #[serde(default)]
        country_code: Option<String>,
        #[serde(default)]
        coordinates: Option<Coordinates>,
    },
}

impl From<CityRepr> for City {
    fn from(repr: CityRepr) -> Self {
        match repr {
            CityRepr::Name(name) => City::named(name),
            CityRepr::Full {
                name,
                country,
                country_code,
                coordinates,
            } => City {
                name,
                country,
                country_code,
                coordinates,
            },
        }
    }
}

impl City {
    /// City known only by name
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            country: None,
            country_code: None,
            coordinates: None,
        }
    }

    pub fn with_country(mut self, country: impl Into<String>, country_code: impl Into<String>) -> Self {
        self.country = Some(country.into());
        self.country_code = Some(country_code.into());
        self
    }
}

/// Traveler counts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Travelers {
    pub adults: u32,
    pub children: u32,
    pub infants: u32,
}

impl Travelers {
    pub fn new(adults: u32, children: u32, infants: u32) -> Self {
        Self {
            adults,
            children,
            infants,
        }
    }
}

/// One origin/destination/date triple of a multi-city trip
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Leg {
    pub origin: Option<City>,
    pub destination: Option<City>,
    pub date: Option<NaiveDate>,
}

impl Leg {
    pub fn to(destination: City, date: Option<NaiveDate>) -> Self {
        Self {
            origin: None,
            destination: Some(destination),
            date,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.destination.is_some() && self.date.is_some()
    }
}

/// Short-lived scratch values consumed by the transition that uses them
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PendingDerived {
    /// Trip length hint ("a week in Rome") used to fill the return date
    pub trip_duration_days: Option<u32>,
}

impl PendingDerived {
    pub fn is_empty(&self) -> bool {
        self.trip_duration_days.is_none()
    }
}

/// Addressable fact fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FactField {
    TripType,
    Origin,
    Destination,
    DepartureDate,
    ReturnDate,
    Travelers,
    Legs,
}

impl std::fmt::Display for FactField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::TripType => "tripType",
            Self::Origin => "origin",
            Self::Destination => "destination",
            Self::DepartureDate => "departureDate",
            Self::ReturnDate => "returnDate",
            Self::Travelers => "travelers",
            Self::Legs => "legs",
        };
        write!(f, "{}", name)
    }
}

/// Where a fact came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FactSource {
    /// Extracted from a classified intent
    Inferred,
    /// Chosen explicitly in a widget
    Selected,
    /// Computed from other facts (e.g. return date from a duration hint)
    Derived,
}

/// Entities carried by a classified intent (a partial TripFacts)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct IntentEntities {
    pub trip_type: Option<TripType>,
    pub origin: Option<City>,
    pub destination: Option<City>,
    pub departure_date: Option<NaiveDate>,
    pub return_date: Option<NaiveDate>,
    pub travelers: Option<Travelers>,
    pub legs: Option<Vec<Leg>>,
    pub trip_duration_days: Option<u32>,
}

impl IntentEntities {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Canonical record of collected trip data
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TripFacts {
    /// Unset means "assume roundtrip"; see [`TripFacts::trip_type`]
    pub trip_type: Option<TripType>,

    /// The user explicitly confirmed the trip type
    pub trip_type_confirmed: bool,

    pub origin: Option<City>,
    pub destination: Option<City>,
    pub departure_date: Option<NaiveDate>,
    pub return_date: Option<NaiveDate>,
    pub travelers: Option<Travelers>,

    /// Only meaningful for multi-city trips
    pub legs: Vec<Leg>,

    pub pending: PendingDerived,

    provenance: BTreeMap<FactField, FactSource>,
}

impl TripFacts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Effective trip type
    pub fn trip_type(&self) -> TripType {
        self.trip_type.unwrap_or_default()
    }

    pub fn adults(&self) -> u32 {
        self.travelers.map(|t| t.adults).unwrap_or(0)
    }

    /// How a field got its current value, `None` while unset
    pub fn provenance(&self, field: FactField) -> Option<FactSource> {
        self.provenance.get(&field).copied()
    }

    pub fn is_set(&self, field: FactField) -> bool {
        match field {
            FactField::TripType => self.trip_type.is_some(),
            FactField::Origin => self.origin.is_some(),
            FactField::Destination => self.destination.is_some(),
            FactField::DepartureDate => self.departure_date.is_some(),
            FactField::ReturnDate => self.return_date.is_some(),
            FactField::Travelers => self.travelers.is_some(),
            FactField::Legs => !self.legs.is_empty(),
        }
    }

    pub(crate) fn mark(&mut self, field: FactField, source: FactSource) {
        self.provenance.insert(field, source);
    }

    /// Merge intent entities into fields that are still unset
    ///
    /// First-set-wins: an inferred entity never replaces a value that is
    /// already present, whether it came from a widget or an earlier intent.
    /// Returns the fields that were filled.
    pub fn fill_unset(&mut self, entities: &IntentEntities) -> Vec<FactField> {
        debug!(?entities, "TripFacts::fill_unset: called");
        let mut filled = Vec::new();

        if self.trip_type.is_none()
            && let Some(trip_type) = entities.trip_type
        {
            self.trip_type = Some(trip_type);
            filled.push(FactField::TripType);
        }
        if self.origin.is_none()
            && let Some(origin) = &entities.origin
        {
            self.origin = Some(origin.clone());
            filled.push(FactField::Origin);
        }
        if self.destination.is_none()
            && let Some(destination) = &entities.destination
        {
            self.destination = Some(destination.clone());
            filled.push(FactField::Destination);
        }
        if self.departure_date.is_none()
            && let Some(date) = entities.departure_date
        {
            self.departure_date = Some(date);
            filled.push(FactField::DepartureDate);
        }
        if self.return_date.is_none()
            && let Some(date) = entities.return_date
        {
            self.return_date = Some(date);
            filled.push(FactField::ReturnDate);
        }
        if self.travelers.is_none()
            && let Some(travelers) = entities.travelers
        {
            self.travelers = Some(travelers);
            filled.push(FactField::Travelers);
        }
        if self.legs.is_empty()
            && let Some(legs) = &entities.legs
            && !legs.is_empty()
        {
            self.legs = legs.clone();
            filled.push(FactField::Legs);
        }
        if self.pending.trip_duration_days.is_none() && entities.trip_duration_days.is_some() {
            self.pending.trip_duration_days = entities.trip_duration_days;
        }

        for field in &filled {
            self.mark(*field, FactSource::Inferred);
        }
        debug!(?filled, "TripFacts::fill_unset: done");
        filled
    }

    /// Apply a widget value, always overwriting
    ///
    /// `leg` addresses one leg of a multi-city trip; the leg list grows as
    /// needed. Returns the fields that changed.
    pub fn apply_selection(&mut self, value: &WidgetValue, leg: Option<usize>) -> Vec<FactField> {
        debug!(?value, ?leg, "TripFacts::apply_selection: called");
        let changed = match (value, leg) {
            (WidgetValue::City { city, field }, Some(index)) => {
                let leg = self.leg_mut(index);
                match field {
                    CityField::Origin => leg.origin = Some(city.clone()),
                    CityField::Destination => leg.destination = Some(city.clone()),
                }
                vec![FactField::Legs]
            }
            (WidgetValue::City { city, field }, None) => match field {
                CityField::Origin => {
                    self.origin = Some(city.clone());
                    vec![FactField::Origin]
                }
                CityField::Destination => {
                    self.destination = Some(city.clone());
                    vec![FactField::Destination]
                }
            },
            (WidgetValue::Date { date, .. }, Some(index)) => {
                self.leg_mut(index).date = Some(*date);
                vec![FactField::Legs]
            }
            (WidgetValue::Date { date_type, date }, None) => match date_type {
                DateType::Departure => {
                    self.departure_date = Some(*date);
                    vec![FactField::DepartureDate]
                }
                DateType::Return => {
                    self.return_date = Some(*date);
                    vec![FactField::ReturnDate]
                }
            },
            (
                WidgetValue::DateRange {
                    departure,
                    return_date,
                },
                _,
            ) => {
                self.departure_date = Some(*departure);
                self.return_date = Some(*return_date);
                vec![FactField::DepartureDate, FactField::ReturnDate]
            }
            (WidgetValue::Travelers(travelers), _) => {
                self.travelers = Some(*travelers);
                vec![FactField::Travelers]
            }
            (WidgetValue::TripType { trip_type }, _) => {
                self.trip_type = Some(*trip_type);
                self.trip_type_confirmed = true;
                let mut changed = vec![FactField::TripType];
                if *trip_type == TripType::Multi && self.seed_first_leg() {
                    changed.push(FactField::Legs);
                }
                changed
            }
        };

        for field in &changed {
            self.mark(*field, FactSource::Selected);
        }
        changed
    }

    /// Reset one field to unset
    pub fn clear(&mut self, field: FactField) {
        debug!(%field, "TripFacts::clear: called");
        match field {
            FactField::TripType => {
                self.trip_type = None;
                self.trip_type_confirmed = false;
            }
            FactField::Origin => self.origin = None,
            FactField::Destination => self.destination = None,
            FactField::DepartureDate => self.departure_date = None,
            FactField::ReturnDate => self.return_date = None,
            FactField::Travelers => self.travelers = None,
            FactField::Legs => self.legs.clear(),
        }
        self.provenance.remove(&field);
    }

    fn leg_mut(&mut self, index: usize) -> &mut Leg {
        if self.legs.len() <= index {
            self.legs.resize_with(index + 1, Leg::default);
        }
        &mut self.legs[index]
    }

    /// Switching to multi-city carries the single-destination answers into leg 0
    fn seed_first_leg(&mut self) -> bool {
        if !self.legs.is_empty() || (self.destination.is_none() && self.departure_date.is_none()) {
            return false;
        }
        debug!("TripFacts::seed_first_leg: seeding leg 0 from trip fields");
        self.legs.push(Leg {
            origin: self.origin.clone(),
            destination: self.destination.clone(),
            date: self.departure_date,
        });
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_defaults_are_unset() {
        let facts = TripFacts::new();
        assert_eq!(facts.trip_type(), TripType::Roundtrip);
        assert!(facts.trip_type.is_none());
        assert!(!facts.trip_type_confirmed);
        assert_eq!(facts.adults(), 0);
        assert!(facts.pending.is_empty());
    }

    #[test]
    fn test_fill_unset_never_overwrites() {
        let mut facts = TripFacts::new();
        facts.apply_selection(
            &WidgetValue::City {
                city: City::named("Lisbon"),
                field: CityField::Destination,
            },
            None,
        );

        let entities = IntentEntities {
            destination: Some(City::named("Paris")),
            departure_date: Some(date(2025, 6, 1)),
            ..Default::default()
        };
        let filled = facts.fill_unset(&entities);

        assert_eq!(filled, vec![FactField::DepartureDate]);
        assert_eq!(facts.destination.as_ref().map(|c| c.name.as_str()), Some("Lisbon"));
        assert_eq!(facts.provenance(FactField::Destination), Some(FactSource::Selected));
        assert_eq!(facts.provenance(FactField::DepartureDate), Some(FactSource::Inferred));
    }

    #[test]
    fn test_fill_unset_first_intent_wins() {
        let mut facts = TripFacts::new();
        facts.fill_unset(&IntentEntities {
            destination: Some(City::named("Paris")),
            ..Default::default()
        });
        facts.fill_unset(&IntentEntities {
            destination: Some(City::named("Berlin")),
            ..Default::default()
        });
        assert_eq!(facts.destination.map(|c| c.name), Some("Paris".to_string()));
    }

    #[test]
    fn test_selection_overwrites_inferred() {
        let mut facts = TripFacts::new();
        facts.fill_unset(&IntentEntities {
            travelers: Some(Travelers::new(1, 0, 0)),
            ..Default::default()
        });
        facts.apply_selection(&WidgetValue::Travelers(Travelers::new(2, 1, 0)), None);
        assert_eq!(facts.travelers, Some(Travelers::new(2, 1, 0)));
        assert_eq!(facts.provenance(FactField::Travelers), Some(FactSource::Selected));
    }

    #[test]
    fn test_trip_type_selection_confirms() {
        let mut facts = TripFacts::new();
        facts.fill_unset(&IntentEntities {
            trip_type: Some(TripType::Oneway),
            ..Default::default()
        });
        assert!(!facts.trip_type_confirmed);

        facts.apply_selection(
            &WidgetValue::TripType {
                trip_type: TripType::Oneway,
            },
            None,
        );
        assert!(facts.trip_type_confirmed);
    }

    #[test]
    fn test_multi_confirmation_seeds_first_leg() {
        let mut facts = TripFacts::new();
        facts.destination = Some(City::named("Rome"));
        facts.departure_date = Some(date(2025, 9, 1));

        let changed = facts.apply_selection(
            &WidgetValue::TripType {
                trip_type: TripType::Multi,
            },
            None,
        );
        assert!(changed.contains(&FactField::Legs));
        assert_eq!(facts.legs.len(), 1);
        assert!(facts.legs[0].is_complete());
    }

    #[test]
    fn test_leg_selection_grows_leg_list() {
        let mut facts = TripFacts::new();
        facts.apply_selection(
            &WidgetValue::City {
                city: City::named("Oslo"),
                field: CityField::Destination,
            },
            Some(2),
        );
        assert_eq!(facts.legs.len(), 3);
        assert!(facts.legs[0].destination.is_none());
        assert_eq!(facts.legs[2].destination.as_ref().map(|c| c.name.as_str()), Some("Oslo"));
    }

    #[test]
    fn test_clear_drops_provenance() {
        let mut facts = TripFacts::new();
        facts.apply_selection(&WidgetValue::Travelers(Travelers::new(2, 0, 0)), None);
        facts.clear(FactField::Travelers);
        assert!(facts.travelers.is_none());
        assert!(facts.provenance(FactField::Travelers).is_none());
    }

    #[test]
    fn test_city_deserializes_from_name_or_record() {
        let bare: City = serde_json::from_str("\"Paris\"").unwrap();
        assert_eq!(bare, City::named("Paris"));

        let full: City = serde_json::from_str(r#"{"name":"Paris","country":"France","countryCode":"FR"}"#).unwrap();
        assert_eq!(full, City::named("Paris").with_country("France", "FR"));
    }
}
