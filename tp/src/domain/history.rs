//! WidgetHistory - append-only record of widget activity
//!
//! Observational only: nothing in the orchestrator reads history to decide
//! what to show next.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::widget::{WidgetType, WidgetValue};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WidgetAction {
    Shown,
    Completed,
    Dismissed,
}

impl std::fmt::Display for WidgetAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Shown => write!(f, "shown"),
            Self::Completed => write!(f, "completed"),
            Self::Dismissed => write!(f, "dismissed"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WidgetHistoryEntry {
    #[serde(rename = "type")]
    pub widget_type: WidgetType,
    pub action: WidgetAction,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<WidgetValue>,
}

/// Append-only log; entries are never mutated or reordered
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WidgetHistory {
    entries: Vec<WidgetHistoryEntry>,
}

impl WidgetHistory {
    pub fn new() -> Self {
        Self::default()
    }

    fn append(&mut self, widget_type: WidgetType, action: WidgetAction, value: Option<WidgetValue>) {
        debug!(%widget_type, %action, len = self.entries.len(), "WidgetHistory::append: called");
        self.entries.push(WidgetHistoryEntry {
            widget_type,
            action,
            timestamp: Utc::now(),
            value,
        });
    }

    pub fn shown(&mut self, widget_type: WidgetType) {
        self.append(widget_type, WidgetAction::Shown, None);
    }

    pub fn completed(&mut self, widget_type: WidgetType, value: WidgetValue) {
        self.append(widget_type, WidgetAction::Completed, Some(value));
    }

    pub fn dismissed(&mut self, widget_type: WidgetType) {
        self.append(widget_type, WidgetAction::Dismissed, None);
    }

    /// How many times a widget has been shown this session
    pub fn count_shown(&self, widget_type: WidgetType) -> usize {
        self.entries
            .iter()
            .filter(|e| e.widget_type == widget_type && e.action == WidgetAction::Shown)
            .count()
    }

    /// Most recent action recorded for a widget
    pub fn last_action(&self, widget_type: WidgetType) -> Option<WidgetAction> {
        self.entries
            .iter()
            .rev()
            .find(|e| e.widget_type == widget_type)
            .map(|e| e.action)
    }

    pub fn was_completed(&self, widget_type: WidgetType) -> bool {
        self.entries
            .iter()
            .any(|e| e.widget_type == widget_type && e.action == WidgetAction::Completed)
    }

    pub fn entries(&self) -> &[WidgetHistoryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
