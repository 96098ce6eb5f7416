//! Orchestrator - the transition function
//!
//! `dispatch` processes one event to completion, including the automatic
//! ProcessingInput -> Evaluating -> {WidgetActive | ReadyToSearch} chain, and
//! reports what happened. Events that do not fit the current state are
//! rejected without touching anything.

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::domain::{TripFacts, WidgetType, WidgetValue};
use crate::resolver::{self, ResolverOptions, derive};

use super::events::{ClassifiedIntent, Event};
use super::state::{MachineState, OrchestratorState, StateName};

/// Why an event was ignored
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "reason", rename_all = "camelCase")]
pub enum Rejection {
    #[error("{event} is not accepted in state {state}")]
    NotAccepted { event: &'static str, state: StateName },

    #[error("no widget is active")]
    NoActiveWidget,

    #[error("{got} does not match the active widget {active}")]
    WidgetMismatch { active: WidgetType, got: WidgetType },

    #[error("value does not fit the active widget {widget}")]
    ValueMismatch { widget: WidgetType },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "rejection", rename_all = "camelCase")]
pub enum DispatchStatus {
    Applied,
    Ignored(Rejection),
}

/// Work the host must do on the machine's behalf
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "effect", rename_all = "camelCase")]
pub enum Effect {
    /// Run a search against this snapshot and report back with
    /// SEARCH_SUCCEEDED / SEARCH_FAILED. Outcomes whose `generation` no
    /// longer matches the state's belong to a cancelled search.
    ExecuteSearch { generation: u64, facts: TripFacts },
}

/// Result of one dispatch
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dispatch {
    pub status: DispatchStatus,
    /// Every state entered while processing the event, in order
    pub transitions: Vec<StateName>,
    pub effects: Vec<Effect>,
}

impl Dispatch {
    fn ignored(rejection: Rejection) -> Self {
        Self {
            status: DispatchStatus::Ignored(rejection),
            transitions: Vec::new(),
            effects: Vec::new(),
        }
    }

    pub fn is_applied(&self) -> bool {
        self.status == DispatchStatus::Applied
    }

    pub fn is_ignored(&self) -> bool {
        !self.is_applied()
    }

    pub fn rejection(&self) -> Option<&Rejection> {
        match &self.status {
            DispatchStatus::Ignored(rejection) => Some(rejection),
            DispatchStatus::Applied => None,
        }
    }
}

type Step = Result<Vec<Effect>, Rejection>;

/// Session-scoped state machine
#[derive(Debug, Clone, Default)]
pub struct Orchestrator {
    options: ResolverOptions,
    state: OrchestratorState,
    trail: Vec<StateName>,
}

impl Orchestrator {
    pub fn new(options: ResolverOptions) -> Self {
        debug!(?options, "Orchestrator::new: called");
        Self {
            options,
            state: OrchestratorState::default(),
            trail: Vec::new(),
        }
    }

    /// Resume from a previously captured state
    pub fn from_state(options: ResolverOptions, state: OrchestratorState) -> Self {
        debug!(state = %state.name(), "Orchestrator::from_state: called");
        Self {
            options,
            state,
            trail: Vec::new(),
        }
    }

    pub fn state(&self) -> &OrchestratorState {
        &self.state
    }

    pub fn options(&self) -> &ResolverOptions {
        &self.options
    }

    /// Process one event to completion
    pub fn dispatch(&mut self, event: Event) -> Dispatch {
        let event_name = event.name();
        let from = self.state.name();
        debug!(event = event_name, %from, "Orchestrator::dispatch: called");
        self.trail.clear();

        let step = match event {
            Event::UserMessage { text } => {
                debug!(len = text.len(), "Orchestrator::dispatch: user message");
                self.on_input(event_name, None)
            }
            Event::IntentReceived { intent } => self.on_input(event_name, Some(intent)),
            Event::WidgetCompleted { widget_type, value } => self.on_completion(event_name, Some(widget_type), value),
            Event::WidgetDismissed { widget_type } => self.on_dismissal(widget_type),
            Event::FieldCleared { field } => self.on_fact_change(event_name, |facts| facts.clear(field)),
            Event::SearchTriggered => self.on_search_triggered(event_name),
            Event::SearchSucceeded => self.on_search_succeeded(event_name),
            Event::SearchFailed { error } => self.on_search_failed(event_name, error),
            Event::Reset => {
                self.reset();
                Ok(Vec::new())
            }
            other => match other.selection() {
                Some(value) => self.on_completion(event_name, None, value),
                None => Err(Rejection::NotAccepted {
                    event: event_name,
                    state: from,
                }),
            },
        };

        match step {
            Ok(effects) => {
                let transitions = std::mem::take(&mut self.trail);
                info!(
                    event = event_name,
                    %from,
                    to = %self.state.name(),
                    "Orchestrator::dispatch: applied"
                );
                Dispatch {
                    status: DispatchStatus::Applied,
                    transitions,
                    effects,
                }
            }
            Err(rejection) => {
                warn!(event = event_name, state = %from, %rejection, "Orchestrator::dispatch: ignored");
                self.trail.clear();
                Dispatch::ignored(rejection)
            }
        }
    }

    fn enter(&mut self, next: MachineState) {
        debug!(from = %self.state.name(), to = %next.name(), "Orchestrator::enter");
        self.trail.push(next.name());
        self.state.machine = next;
    }

    fn not_accepted(&self, event: &'static str) -> Rejection {
        Rejection::NotAccepted {
            event,
            state: self.state.name(),
        }
    }

    /// USER_MESSAGE / INTENT_RECEIVED
    fn on_input(&mut self, event: &'static str, intent: Option<ClassifiedIntent>) -> Step {
        match (&self.state.machine, &intent) {
            (MachineState::Idle | MachineState::ReadyToSearch, _) => {}
            (MachineState::WidgetActive(active), Some(_)) => {
                debug!(widget = %active.widget_type, "on_input: intent preempts active widget");
            }
            _ => return Err(self.not_accepted(event)),
        }

        self.enter(MachineState::ProcessingInput);
        if let Some(intent) = intent {
            if !intent.widgets_suggested.is_empty() {
                let suggested: Vec<_> = intent.widgets_suggested.iter().map(|w| w.widget_type).collect();
                debug!(?suggested, "on_input: classifier suggestions are advisory, resolver decides");
            }
            self.state.facts.fill_unset(&intent.entities);
        }
        self.enter(MachineState::Evaluating);
        self.evaluate();
        Ok(Vec::new())
    }

    /// WIDGET_COMPLETED and the typed selection events
    fn on_completion(&mut self, event: &'static str, claimed: Option<WidgetType>, value: WidgetValue) -> Step {
        match &self.state.machine {
            MachineState::WidgetActive(active) => {
                let active = active.clone();
                if let Some(got) = claimed
                    && got != active.widget_type
                {
                    return Err(Rejection::WidgetMismatch {
                        active: active.widget_type,
                        got,
                    });
                }
                if !active.accepts(&value) {
                    return Err(Rejection::ValueMismatch {
                        widget: active.widget_type,
                    });
                }

                self.enter(MachineState::Evaluating);
                self.state.facts.apply_selection(&value, active.leg);
                self.state.history.completed(active.widget_type, value);
                self.evaluate();
                Ok(Vec::new())
            }
            MachineState::Idle | MachineState::ReadyToSearch => {
                if claimed.is_some() {
                    return Err(Rejection::NoActiveWidget);
                }
                let widget_type = WidgetType::collecting(&value);
                self.enter(MachineState::Evaluating);
                self.state.facts.apply_selection(&value, None);
                self.state.history.completed(widget_type, value);
                self.evaluate();
                Ok(Vec::new())
            }
            _ => Err(self.not_accepted(event)),
        }
    }

    fn on_dismissal(&mut self, widget_type: WidgetType) -> Step {
        let active = match &self.state.machine {
            MachineState::WidgetActive(active) => active.widget_type,
            _ => return Err(Rejection::NoActiveWidget),
        };
        if active != widget_type {
            return Err(Rejection::WidgetMismatch {
                active,
                got: widget_type,
            });
        }

        self.state.history.dismissed(widget_type);
        self.enter(MachineState::Idle);
        Ok(Vec::new())
    }

    /// Direct fact edits outside a widget
    fn on_fact_change(&mut self, event: &'static str, change: impl FnOnce(&mut TripFacts)) -> Step {
        if !matches!(self.state.machine, MachineState::Idle | MachineState::ReadyToSearch) {
            return Err(self.not_accepted(event));
        }
        self.enter(MachineState::Evaluating);
        change(&mut self.state.facts);
        self.evaluate();
        Ok(Vec::new())
    }

    fn on_search_triggered(&mut self, event: &'static str) -> Step {
        if self.state.machine != MachineState::ReadyToSearch {
            return Err(self.not_accepted(event));
        }
        self.state.search_generation += 1;
        self.enter(MachineState::Searching);
        Ok(vec![Effect::ExecuteSearch {
            generation: self.state.search_generation,
            facts: self.state.facts.clone(),
        }])
    }

    fn on_search_succeeded(&mut self, event: &'static str) -> Step {
        if self.state.machine != MachineState::Searching {
            return Err(self.not_accepted(event));
        }
        self.state.searches_completed += 1;
        self.enter(MachineState::Idle);
        Ok(Vec::new())
    }

    fn on_search_failed(&mut self, event: &'static str, error: String) -> Step {
        if self.state.machine != MachineState::Searching {
            return Err(self.not_accepted(event));
        }
        warn!(%error, "on_search_failed: search failed, back to ReadyToSearch");
        self.state.last_error = Some(error);
        self.enter(MachineState::ReadyToSearch);
        Ok(Vec::new())
    }

    fn reset(&mut self) {
        info!(history = self.state.history.len(), "Orchestrator::reset: discarding session state");
        let search_generation = self.state.search_generation;
        self.state = OrchestratorState {
            search_generation,
            ..OrchestratorState::default()
        };
        self.trail.push(StateName::Idle);
    }

    /// Evaluating -> WidgetActive | ReadyToSearch
    fn evaluate(&mut self) {
        derive::apply(&mut self.state.facts);
        match resolver::resolve(&self.state.facts, &self.options) {
            Some(request) => {
                debug!(widget = %request.widget_type, reason = %request.reason, "evaluate: widget required");
                self.state.history.shown(request.widget_type);
                self.enter(MachineState::WidgetActive(request));
            }
            None => {
                debug!("evaluate: nothing missing");
                self.enter(MachineState::ReadyToSearch);
            }
        }
    }
}
