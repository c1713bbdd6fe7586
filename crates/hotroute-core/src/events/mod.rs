//! Plugin lifecycle events.
//!
//! Emitted by the plugin manager after each successful lifecycle call and
//! delivered to subscribers over a broadcast channel.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Which lifecycle transition produced the event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PluginEventKind {
    /// The plugin entered `Loaded`.
    Loaded,
    /// The plugin entered `Running`.
    Started,
    /// The plugin entered `Stopped`.
    Stopped,
    /// The plugin entered `Unloaded` and left the tracked set.
    Unloaded,
}

impl PluginEventKind {
    /// Signal name of this event.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Loaded => "plugin-loaded",
            Self::Started => "plugin-started",
            Self::Stopped => "plugin-stopped",
            Self::Unloaded => "plugin-unloaded",
        }
    }
}

impl std::fmt::Display for PluginEventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A lifecycle event with metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PluginEvent {
    /// Unique event ID.
    pub id: Uuid,
    /// When the event occurred.
    pub timestamp: DateTime<Utc>,
    /// The transition.
    pub kind: PluginEventKind,
    /// Identifier of the plugin.
    pub plugin_id: String,
    /// Human-readable plugin name.
    pub name: String,
    /// Plugin domain.
    pub domain: String,
}

impl PluginEvent {
    /// Create a new lifecycle event.
    pub fn new(
        kind: PluginEventKind,
        plugin_id: impl Into<String>,
        name: impl Into<String>,
        domain: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            kind,
            plugin_id: plugin_id.into(),
            name: name.into(),
            domain: domain.into(),
        }
    }
}
