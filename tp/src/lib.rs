//! TripPlanner - widget sequencing for conversational trip planning
//!
//! A chat front-end collects trip facts (destination, dates, travelers, trip
//! type) through free text and small UI widgets. This crate decides, after
//! every event, which single widget must be shown next, keeps an audit trail
//! of widget activity, and signals when the trip is ready to search.
//!
//! # Core Concepts
//!
//! - **One widget at a time**: the active widget lives inside the
//!   `WidgetActive` state, never alongside another
//! - **Pure resolver**: the next widget is a function of TripFacts alone
//! - **Explicit beats inferred**: widget selections overwrite, intent
//!   entities only fill gaps
//! - **No I/O inside**: searches and classification happen outside and come
//!   back as events
//!
//! # Modules
//!
//! - [`domain`] - TripFacts, widget requests/values, widget history
//! - [`resolver`] - the ordered checklist and next-widget resolution
//! - [`orchestrator`] - events and the state machine
//! - [`session`] - façade, notifications and the session actor
//! - [`config`] - configuration types and loading
//! - [`cli`] - command-line interface

pub mod cli;
pub mod config;
pub mod domain;
pub mod orchestrator;
pub mod resolver;
pub mod session;

// Re-export commonly used types
pub use config::{Config, SessionConfig};
pub use domain::{
    City, FactField, IntentEntities, Leg, Travelers, TripFacts, TripType, WidgetAction, WidgetHistory,
    WidgetHistoryEntry, WidgetRequest, WidgetType, WidgetValue,
};
pub use orchestrator::{
    ClassifiedIntent, Dispatch, DispatchStatus, Effect, Event, Orchestrator, OrchestratorState, Rejection, StateName,
};
pub use resolver::{FieldId, ResolverOptions, missing_fields, progress_percent, resolve};
pub use session::{
    PlanningStep, SearchError, SearchExecutor, SessionError, SessionEvent, SessionHandle, SessionSnapshot, TripSession,
};
