//! Inbound events
//!
//! The vocabulary the hosting layer speaks to a planning session. Events
//! serialize as `{"type": "USER_MESSAGE", ...}` so scripts and transports can
//! carry them as plain JSON or YAML.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::{
    City, CityField, DateType, FactField, IntentEntities, Travelers, TripType, WidgetRequest, WidgetType, WidgetValue,
};

/// Output of the external intent classifier
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ClassifiedIntent {
    pub entities: IntentEntities,

    /// Widgets the classifier thinks are relevant; advisory only
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub widgets_suggested: Vec<WidgetRequest>,
}

impl ClassifiedIntent {
    pub fn with_entities(entities: IntentEntities) -> Self {
        Self {
            entities,
            widgets_suggested: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Event {
    UserMessage {
        text: String,
    },
    IntentReceived {
        intent: ClassifiedIntent,
    },
    #[serde(rename_all = "camelCase")]
    CitySelected {
        city: String,
        #[serde(default)]
        country: Option<String>,
        #[serde(default)]
        country_code: Option<String>,
        field: CityField,
    },
    #[serde(rename_all = "camelCase")]
    DateSelected {
        date_type: DateType,
        date: NaiveDate,
    },
    #[serde(rename_all = "camelCase")]
    DateRangeSelected {
        departure: NaiveDate,
        return_date: NaiveDate,
    },
    TravelersSelected {
        adults: u32,
        #[serde(default)]
        children: u32,
        #[serde(default)]
        infants: u32,
    },
    #[serde(rename_all = "camelCase")]
    TripTypeConfirmed {
        trip_type: TripType,
    },
    #[serde(rename_all = "camelCase")]
    WidgetCompleted {
        widget_type: WidgetType,
        value: WidgetValue,
    },
    #[serde(rename_all = "camelCase")]
    WidgetDismissed {
        widget_type: WidgetType,
    },
    FieldCleared {
        field: FactField,
    },
    SearchTriggered,
    SearchSucceeded,
    SearchFailed {
        error: String,
    },
    Reset,
}

impl Event {
    pub fn user_message(text: impl Into<String>) -> Self {
        Self::UserMessage { text: text.into() }
    }

    pub fn intent(entities: IntentEntities) -> Self {
        Self::IntentReceived {
            intent: ClassifiedIntent::with_entities(entities),
        }
    }

    /// Wire name of the event, used in logs and rejections
    pub fn name(&self) -> &'static str {
        match self {
            Self::UserMessage { .. } => "USER_MESSAGE",
            Self::IntentReceived { .. } => "INTENT_RECEIVED",
            Self::CitySelected { .. } => "CITY_SELECTED",
            Self::DateSelected { .. } => "DATE_SELECTED",
            Self::DateRangeSelected { .. } => "DATE_RANGE_SELECTED",
            Self::TravelersSelected { .. } => "TRAVELERS_SELECTED",
            Self::TripTypeConfirmed { .. } => "TRIP_TYPE_CONFIRMED",
            Self::WidgetCompleted { .. } => "WIDGET_COMPLETED",
            Self::WidgetDismissed { .. } => "WIDGET_DISMISSED",
            Self::FieldCleared { .. } => "FIELD_CLEARED",
            Self::SearchTriggered => "SEARCH_TRIGGERED",
            Self::SearchSucceeded => "SEARCH_SUCCEEDED",
            Self::SearchFailed { .. } => "SEARCH_FAILED",
            Self::Reset => "RESET",
        }
    }

    /// Typed selection events expressed as a widget value
    pub fn selection(&self) -> Option<WidgetValue> {
        match self {
            Self::CitySelected {
                city,
                country,
                country_code,
                field,
            } => Some(WidgetValue::City {
                city: City {
                    name: city.clone(),
                    country: country.clone(),
                    country_code: country_code.clone(),
                    coordinates: None,
                },
                field: *field,
            }),
            Self::DateSelected { date_type, date } => Some(WidgetValue::Date {
                date_type: *date_type,
                date: *date,
            }),
            Self::DateRangeSelected {
                departure,
                return_date,
            } => Some(WidgetValue::DateRange {
                departure: *departure,
                return_date: *return_date,
            }),
            Self::TravelersSelected {
                adults,
                children,
                infants,
            } => Some(WidgetValue::Travelers(Travelers::new(*adults, *children, *infants))),
            Self::TripTypeConfirmed { trip_type } => Some(WidgetValue::TripType { trip_type: *trip_type }),
            _ => None,
        }
    }
}
