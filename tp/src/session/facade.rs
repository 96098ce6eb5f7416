//! TripSession - the public face of one planning conversation
//!
//! Owns an Orchestrator, accepts events, and exposes the read-only
//! projections the UI and satellite services consume.

use serde::Serialize;
use tokio::sync::broadcast;
use tracing::debug;
use uuid::Uuid;

use crate::domain::{TripFacts, WidgetHistory, WidgetHistoryEntry, WidgetRequest};
use crate::orchestrator::{Dispatch, Effect, Event, Orchestrator, OrchestratorState, StateName};
use crate::resolver::{self, FieldId, ResolverOptions};

use super::bus::{SessionBus, SessionEvent};
use super::planning::{PlanningStep, planning_step};

/// Everything the UI reads, captured at one instant
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub session_id: Uuid,
    pub current_state: StateName,
    pub active_widget: Option<WidgetRequest>,
    pub is_ready_to_search: bool,
    pub missing_fields: Vec<FieldId>,
    pub progress_percent: u8,
    pub planning_step: PlanningStep,
    pub last_error: Option<String>,
    pub facts: TripFacts,
    pub history: Vec<WidgetHistoryEntry>,
}

pub struct TripSession {
    id: Uuid,
    orchestrator: Orchestrator,
    bus: SessionBus,
}

impl TripSession {
    pub fn new(options: ResolverOptions) -> Self {
        Self::with_bus(options, SessionBus::default())
    }

    pub fn with_bus(options: ResolverOptions, bus: SessionBus) -> Self {
        let id = Uuid::now_v7();
        debug!(%id, "TripSession::new: called");
        Self {
            id,
            orchestrator: Orchestrator::new(options),
            bus,
        }
    }

    /// Resume a session from a captured state
    pub fn restore(id: Uuid, options: ResolverOptions, state: OrchestratorState) -> Self {
        debug!(%id, "TripSession::restore: called");
        Self {
            id,
            orchestrator: Orchestrator::from_state(options, state),
            bus: SessionBus::default(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.bus.subscribe()
    }

    /// Submit one event; returns how it was handled
    pub fn submit(&mut self, event: Event) -> Dispatch {
        let event_name = event.name();
        let from = self.current_state();
        let history_before = self.history().len();
        let is_reset = matches!(event, Event::Reset);

        let dispatch = self.orchestrator.dispatch(event);
        self.publish(event_name, from, history_before, is_reset, &dispatch);
        dispatch
    }

    fn publish(
        &self,
        event: &'static str,
        from: StateName,
        history_before: usize,
        is_reset: bool,
        dispatch: &Dispatch,
    ) {
        let session_id = self.id;
        if let Some(rejection) = dispatch.rejection() {
            self.bus.emit(SessionEvent::EventIgnored {
                session_id,
                event,
                rejection: rejection.clone(),
            });
            return;
        }
        if is_reset {
            self.bus.emit(SessionEvent::Reset { session_id });
        } else {
            for entry in self.history().entries().get(history_before..).unwrap_or(&[]) {
                if let Some(notification) = SessionEvent::for_history(session_id, entry.action, entry.widget_type) {
                    self.bus.emit(notification);
                }
            }
        }
        if let Some(request) = self.active_widget()
            && dispatch.transitions.last() == Some(&StateName::WidgetActive)
        {
            self.bus.emit(SessionEvent::WidgetShown {
                session_id,
                request: request.clone(),
            });
        }
        for effect in &dispatch.effects {
            match effect {
                Effect::ExecuteSearch { .. } => self.bus.emit(SessionEvent::SearchRequested { session_id }),
            }
        }
        let to = self.current_state();
        if from != to {
            self.bus.emit(SessionEvent::StateChanged { session_id, from, to });
        }
    }

    // === Projections ===

    pub fn current_state(&self) -> StateName {
        self.orchestrator.state().name()
    }

    pub fn active_widget(&self) -> Option<&WidgetRequest> {
        self.orchestrator.state().active_widget()
    }

    pub fn is_ready_to_search(&self) -> bool {
        self.current_state() == StateName::ReadyToSearch
    }

    pub fn missing_fields(&self) -> Vec<FieldId> {
        resolver::missing_fields(self.facts(), self.orchestrator.options())
    }

    pub fn progress_percent(&self) -> u8 {
        resolver::progress_percent(self.facts(), self.orchestrator.options())
    }

    pub fn planning_step(&self) -> PlanningStep {
        planning_step(self.orchestrator.state(), self.orchestrator.options())
    }

    pub fn history(&self) -> &WidgetHistory {
        self.orchestrator.state().history()
    }

    pub fn facts(&self) -> &TripFacts {
        self.orchestrator.state().facts()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.orchestrator.state().last_error()
    }

    pub fn state(&self) -> &OrchestratorState {
        self.orchestrator.state()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            session_id: self.id,
            current_state: self.current_state(),
            active_widget: self.active_widget().cloned(),
            is_ready_to_search: self.is_ready_to_search(),
            missing_fields: self.missing_fields(),
            progress_percent: self.progress_percent(),
            planning_step: self.planning_step(),
            last_error: self.last_error().map(str::to_string),
            facts: self.facts().clone(),
            history: self.history().entries().to_vec(),
        }
    }
}

impl Default for TripSession {
    fn default() -> Self {
        Self::new(ResolverOptions::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{City, IntentEntities, WidgetType};

    fn paris() -> Event {
        Event::intent(IntentEntities {
            destination: Some(City::named("Paris")),
            ..Default::default()
        })
    }

    #[test]
    fn test_snapshot_of_fresh_session() {
        let session = TripSession::default();
        let snapshot = session.snapshot();
        assert_eq!(snapshot.current_state, StateName::Idle);
        assert!(snapshot.active_widget.is_none());
        assert!(!snapshot.is_ready_to_search);
        assert_eq!(snapshot.progress_percent, 0);
        assert_eq!(snapshot.missing_fields.len(), 5);
        assert!(snapshot.history.is_empty());
    }

    #[test]
    fn test_notifications_for_shown_widget() {
        let mut session = TripSession::default();
        let mut rx = session.subscribe();
        session.submit(paris());

        let shown = rx.try_recv().unwrap();
        let SessionEvent::WidgetShown { request, .. } = &shown else {
            panic!("expected WidgetShown, got {:?}", shown);
        };
        assert_eq!(request.widget_type, WidgetType::DatePicker);

        let changed = rx.try_recv().unwrap();
        assert!(matches!(
            changed,
            SessionEvent::StateChanged {
                from: StateName::Idle,
                to: StateName::WidgetActive,
                ..
            }
        ));
    }

    #[test]
    fn test_notifications_for_ignored_event() {
        let mut session = TripSession::default();
        let mut rx = session.subscribe();
        session.submit(Event::SearchSucceeded);

        let event = rx.try_recv().unwrap();
        assert!(matches!(event, SessionEvent::EventIgnored { event: "SEARCH_SUCCEEDED", .. }));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_reshown_widget_is_announced() {
        let mut session = TripSession::default();
        session.submit(Event::user_message("hi"));
        session.submit(Event::WidgetDismissed {
            widget_type: WidgetType::CitySelector,
        });

        let mut rx = session.subscribe();
        session.submit(Event::user_message("still here"));
        let first = rx.try_recv().unwrap();
        assert_eq!(first.event_type(), "WidgetShown");
    }

    #[test]
    fn test_restore_resumes_captured_state() {
        let mut session = TripSession::default();
        session.submit(paris());
        let json = serde_json::to_string(session.state()).unwrap();

        let state: OrchestratorState = serde_json::from_str(&json).unwrap();
        let mut restored = TripSession::restore(session.id(), ResolverOptions::default(), state);
        assert_eq!(restored.id(), session.id());
        assert_eq!(restored.state(), session.state());
        assert_eq!(restored.active_widget().map(|w| w.widget_type), Some(WidgetType::DatePicker));

        let dispatch = restored.submit(Event::DateRangeSelected {
            departure: chrono::NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
            return_date: chrono::NaiveDate::from_ymd_opt(2025, 6, 8).unwrap(),
        });
        assert!(dispatch.is_applied());
        assert_eq!(restored.active_widget().map(|w| w.widget_type), Some(WidgetType::TravelersSelector));
    }

    #[test]
    fn test_snapshot_serializes() {
        let mut session = TripSession::default();
        session.submit(paris());
        let json = serde_json::to_value(session.snapshot()).unwrap();
        assert_eq!(json["currentState"], "WidgetActive");
        assert_eq!(json["activeWidget"]["type"], "datePicker");
        assert_eq!(json["missingFields"][0]["field"], "departureDate");
    }
}
