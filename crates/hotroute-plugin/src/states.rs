//! Lifecycle states and the transition table that governs them.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{PluginError, PluginResult};

/// Where a plugin sits in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PluginStatus {
    /// Tracked by the manager, nothing installed on the host.
    Loaded,
    /// Routes, handlers and hooks installed and live.
    Running,
    /// Endpoints point at the not-found responder; table shape unchanged.
    Stopped,
    /// Not tracked. Initial and final state.
    Unloaded,
}

impl PluginStatus {
    /// Every status.
    pub const ALL: [PluginStatus; 4] = [
        PluginStatus::Loaded,
        PluginStatus::Running,
        PluginStatus::Stopped,
        PluginStatus::Unloaded,
    ];

    /// Name of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Loaded => "Loaded",
            Self::Running => "Running",
            Self::Stopped => "Stopped",
            Self::Unloaded => "Unloaded",
        }
    }
}

impl fmt::Display for PluginStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A lifecycle operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Load,
    Unload,
    Start,
    Stop,
}

impl Operation {
    /// Lower-case name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Load => "load",
            Self::Unload => "unload",
            Self::Start => "start",
            Self::Stop => "stop",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operation {
    type Err = PluginError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "load" => Ok(Self::Load),
            "unload" => Ok(Self::Unload),
            "start" => Ok(Self::Start),
            "stop" => Ok(Self::Stop),
            other => Err(PluginError::Validation(format!(
                "unknown lifecycle operation '{other}'"
            ))),
        }
    }
}

/// One rule of a transition table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition<S> {
    pub from: S,
    pub operation: Operation,
    pub to: S,
}

const fn rule(from: PluginStatus, operation: Operation, to: PluginStatus) -> Transition<PluginStatus> {
    Transition {
        from,
        operation,
        to,
    }
}

/// The plugin lifecycle.
pub const TRANSITIONS: &[Transition<PluginStatus>] = &[
    rule(PluginStatus::Unloaded, Operation::Load, PluginStatus::Loaded),
    rule(PluginStatus::Loaded, Operation::Unload, PluginStatus::Unloaded),
    rule(PluginStatus::Loaded, Operation::Start, PluginStatus::Running),
    rule(PluginStatus::Running, Operation::Stop, PluginStatus::Stopped),
    rule(PluginStatus::Stopped, Operation::Start, PluginStatus::Running),
    rule(PluginStatus::Stopped, Operation::Unload, PluginStatus::Unloaded),
];

/// Enforces a static transition table over a current state.
#[derive(Debug, Clone)]
pub struct StateMachine<S: 'static> {
    current: S,
    table: &'static [Transition<S>],
}

impl<S> StateMachine<S>
where
    S: Copy + PartialEq + fmt::Display + 'static,
{
    /// Starts in `initial`.
    pub fn new(initial: S, table: &'static [Transition<S>]) -> Self {
        Self {
            current: initial,
            table,
        }
    }

    /// Current state.
    pub fn current(&self) -> S {
        self.current
    }

    /// The transition table.
    pub fn table(&self) -> &'static [Transition<S>] {
        self.table
    }

    /// Moves to `target` if some rule leads there from the current state.
    /// The operation name of the rule is not considered.
    pub fn transition(&mut self, target: S) -> PluginResult<()> {
        let found = self
            .table
            .iter()
            .any(|t| t.from == self.current && t.to == target);
        if !found {
            return Err(PluginError::IllegalTransition {
                from: self.current.to_string(),
                to: target.to_string(),
            });
        }
        self.current = target;
        Ok(())
    }

    /// Whether `operation` may run from the current state.
    pub fn allowed(&self, operation: Operation) -> bool {
        self.table
            .iter()
            .any(|t| t.from == self.current && t.operation == operation)
    }

    /// Fails unless `operation` may run from the current state.
    pub fn require(&self, operation: Operation) -> PluginResult<()> {
        if self.allowed(operation) {
            Ok(())
        } else {
            Err(PluginError::OperationNotPermitted {
                operation: operation.to_string(),
                state: self.current.to_string(),
            })
        }
    }
}

impl StateMachine<PluginStatus> {
    /// A fresh plugin lifecycle, starting `Unloaded`.
    pub fn lifecycle() -> Self {
        Self::new(PluginStatus::Unloaded, TRANSITIONS)
    }
}

impl Default for StateMachine<PluginStatus> {
    fn default() -> Self {
        Self::lifecycle()
    }
}
