//! Session notifications for satellite services
//!
//! Suggestion, alert and conflict services subscribe here instead of calling
//! into the machine. Built on a tokio broadcast channel: emitting never blocks
//! and a slow subscriber only loses its own oldest notifications.

use serde::Serialize;
use tokio::sync::broadcast;
use tracing::debug;
use uuid::Uuid;

use crate::domain::{WidgetAction, WidgetRequest, WidgetType};
use crate::orchestrator::{Rejection, StateName};

/// Default channel capacity (notifications)
pub const DEFAULT_EVENT_CAPACITY: usize = 256;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum SessionEvent {
    /// The settled state changed
    #[serde(rename_all = "camelCase")]
    StateChanged {
        session_id: Uuid,
        from: StateName,
        to: StateName,
    },
    #[serde(rename_all = "camelCase")]
    WidgetShown { session_id: Uuid, request: WidgetRequest },
    #[serde(rename_all = "camelCase")]
    WidgetCompleted { session_id: Uuid, widget_type: WidgetType },
    #[serde(rename_all = "camelCase")]
    WidgetDismissed { session_id: Uuid, widget_type: WidgetType },
    #[serde(rename_all = "camelCase")]
    EventIgnored {
        session_id: Uuid,
        event: &'static str,
        rejection: Rejection,
    },
    #[serde(rename_all = "camelCase")]
    SearchRequested { session_id: Uuid },
    #[serde(rename_all = "camelCase")]
    Reset { session_id: Uuid },
}

impl SessionEvent {
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::StateChanged { .. } => "StateChanged",
            Self::WidgetShown { .. } => "WidgetShown",
            Self::WidgetCompleted { .. } => "WidgetCompleted",
            Self::WidgetDismissed { .. } => "WidgetDismissed",
            Self::EventIgnored { .. } => "EventIgnored",
            Self::SearchRequested { .. } => "SearchRequested",
            Self::Reset { .. } => "Reset",
        }
    }

    pub(crate) fn for_history(session_id: Uuid, action: WidgetAction, widget_type: WidgetType) -> Option<Self> {
        match action {
            WidgetAction::Completed => Some(Self::WidgetCompleted {
                session_id,
                widget_type,
            }),
            WidgetAction::Dismissed => Some(Self::WidgetDismissed {
                session_id,
                widget_type,
            }),
            // Shown entries are announced with the full request instead
            WidgetAction::Shown => None,
        }
    }
}

pub struct SessionBus {
    tx: broadcast::Sender<SessionEvent>,
}

impl SessionBus {
    pub fn new(capacity: usize) -> Self {
        debug!(capacity, "SessionBus::new: creating bus");
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Fire-and-forget; dropped when nobody is subscribed
    pub fn emit(&self, event: SessionEvent) {
        debug!(event_type = event.event_type(), "SessionBus::emit");
        let _ = self.tx.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        debug!("SessionBus::subscribe: new subscriber");
        self.tx.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for SessionBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_CAPACITY)
    }
}
