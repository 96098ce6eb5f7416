//! Domain types for trip planning
//!
//! TripFacts (what has been collected), widget requests and values (how it
//! gets collected) and the widget history (what the user has seen).

mod facts;
mod history;
mod widget;

pub use facts::{
    City, Coordinates, FactField, FactSource, IntentEntities, Leg, PendingDerived, Travelers, TripFacts, TripType,
};
pub use history::{WidgetAction, WidgetHistory, WidgetHistoryEntry};
pub use widget::{CityField, DateType, WidgetRequest, WidgetType, WidgetValue};
