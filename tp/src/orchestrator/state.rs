//! Orchestrator state
//!
//! The active widget lives inside the `WidgetActive` variant, so there is no
//! way to hold a widget in any other state, or two widgets at once.

use serde::{Deserialize, Serialize};

use crate::domain::{TripFacts, WidgetHistory, WidgetRequest};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "state", content = "widget")]
pub enum MachineState {
    /// Waiting for input, nothing on screen
    #[default]
    Idle,
    /// Folding a message or intent into TripFacts
    ProcessingInput,
    /// Running the resolver
    Evaluating,
    /// One widget is live
    WidgetActive(WidgetRequest),
    /// Resolver found nothing missing
    ReadyToSearch,
    /// Search handed to the executor
    Searching,
}

impl MachineState {
    pub fn name(&self) -> StateName {
        match self {
            Self::Idle => StateName::Idle,
            Self::ProcessingInput => StateName::ProcessingInput,
            Self::Evaluating => StateName::Evaluating,
            Self::WidgetActive(_) => StateName::WidgetActive,
            Self::ReadyToSearch => StateName::ReadyToSearch,
            Self::Searching => StateName::Searching,
        }
    }

    pub fn active_widget(&self) -> Option<&WidgetRequest> {
        match self {
            Self::WidgetActive(request) => Some(request),
            _ => None,
        }
    }
}

/// State names without payload, for projections and transition trails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StateName {
    Idle,
    ProcessingInput,
    Evaluating,
    WidgetActive,
    ReadyToSearch,
    Searching,
}

impl std::fmt::Display for StateName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Idle => "Idle",
            Self::ProcessingInput => "ProcessingInput",
            Self::Evaluating => "Evaluating",
            Self::WidgetActive => "WidgetActive",
            Self::ReadyToSearch => "ReadyToSearch",
            Self::Searching => "Searching",
        };
        write!(f, "{}", name)
    }
}

/// Everything a session knows; mutated only by the orchestrator
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrchestratorState {
    pub(crate) machine: MachineState,
    pub(crate) facts: TripFacts,
    pub(crate) history: WidgetHistory,
    pub(crate) last_error: Option<String>,
    pub(crate) searches_completed: u32,
    /// Bumped by every SEARCH_TRIGGERED; survives RESET so results of a
    /// cancelled search can be told apart from the current one
    #[serde(default)]
    pub(crate) search_generation: u64,
}

impl OrchestratorState {
    pub fn machine(&self) -> &MachineState {
        &self.machine
    }

    pub fn name(&self) -> StateName {
        self.machine.name()
    }

    pub fn facts(&self) -> &TripFacts {
        &self.facts
    }

    pub fn history(&self) -> &WidgetHistory {
        &self.history
    }

    pub fn active_widget(&self) -> Option<&WidgetRequest> {
        self.machine.active_widget()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn searches_completed(&self) -> u32 {
        self.searches_completed
    }

    pub fn search_generation(&self) -> u64 {
        self.search_generation
    }
}
