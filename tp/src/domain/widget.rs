//! Widget requests and the values widgets hand back

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::facts::{City, Travelers, TripType};

/// Kinds of UI widgets the engine can ask for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum WidgetType {
    CitySelector,
    DatePicker,
    DateRangePicker,
    ReturnDatePicker,
    TravelersSelector,
    TripTypeConfirm,
}

impl std::fmt::Display for WidgetType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::CitySelector => "citySelector",
            Self::DatePicker => "datePicker",
            Self::DateRangePicker => "dateRangePicker",
            Self::ReturnDatePicker => "returnDatePicker",
            Self::TravelersSelector => "travelersSelector",
            Self::TripTypeConfirm => "tripTypeConfirm",
        };
        write!(f, "{}", name)
    }
}

impl WidgetType {
    /// Whether a value can complete this widget
    pub fn accepts(&self, value: &WidgetValue) -> bool {
        match (self, value) {
            (Self::CitySelector, WidgetValue::City { .. }) => true,
            (
                Self::DatePicker | Self::DateRangePicker,
                WidgetValue::Date {
                    date_type: DateType::Departure,
                    ..
                }
                | WidgetValue::DateRange { .. },
            ) => true,
            (
                Self::ReturnDatePicker,
                WidgetValue::Date {
                    date_type: DateType::Return,
                    ..
                }
                | WidgetValue::DateRange { .. },
            ) => true,
            (Self::TravelersSelector, WidgetValue::Travelers(_)) => true,
            (Self::TripTypeConfirm, WidgetValue::TripType { .. }) => true,
            _ => false,
        }
    }

    /// The widget that normally collects a value
    ///
    /// Used to attribute history entries when a value arrives without an
    /// active widget.
    pub fn collecting(value: &WidgetValue) -> Self {
        match value {
            WidgetValue::City { .. } => Self::CitySelector,
            WidgetValue::Date {
                date_type: DateType::Departure,
                ..
            } => Self::DatePicker,
            WidgetValue::Date {
                date_type: DateType::Return,
                ..
            } => Self::ReturnDatePicker,
            WidgetValue::DateRange { .. } => Self::DateRangePicker,
            WidgetValue::Travelers(_) => Self::TravelersSelector,
            WidgetValue::TripType { .. } => Self::TripTypeConfirm,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CityField {
    Origin,
    Destination,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DateType {
    Departure,
    Return,
}

/// Value returned by a completed widget
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum WidgetValue {
    City {
        city: City,
        field: CityField,
    },
    #[serde(rename_all = "camelCase")]
    Date {
        date_type: DateType,
        date: NaiveDate,
    },
    #[serde(rename_all = "camelCase")]
    DateRange {
        departure: NaiveDate,
        return_date: NaiveDate,
    },
    Travelers(Travelers),
    #[serde(rename_all = "camelCase")]
    TripType {
        trip_type: TripType,
    },
}

/// "Show this one widget now"
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WidgetRequest {
    #[serde(rename = "type")]
    pub widget_type: WidgetType,

    /// Human-readable reason, surfaced to the chat layer
    pub reason: String,

    /// Opaque rendering hints for the widget component
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,

    /// Leg index for multi-city requests
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub leg: Option<usize>,
}

impl WidgetRequest {
    pub fn new(widget_type: WidgetType, reason: impl Into<String>) -> Self {
        Self {
            widget_type,
            reason: reason.into(),
            data: None,
            leg: None,
        }
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    pub fn for_leg(mut self, leg: usize) -> Self {
        self.leg = Some(leg);
        self
    }

    /// Whether a value can satisfy this particular request
    ///
    /// City selectors only ever ask for a destination, and a leg takes a
    /// single city or date, never a range.
    pub fn accepts(&self, value: &WidgetValue) -> bool {
        if !self.widget_type.accepts(value) {
            return false;
        }
        match value {
            WidgetValue::City { field, .. } => *field == CityField::Destination,
            WidgetValue::DateRange { .. } => self.leg.is_none(),
            _ => true,
        }
    }
}
