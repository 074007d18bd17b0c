//! Task abstraction
//!
//! A [`Task`] is the action a migration node performs against its target
//! system. How it mutates that system is entirely up to the implementation;
//! the engine only times it, records the outcome, and keeps any undo payload
//! it hands back.

use super::error::{CoreError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which way a migration run moves
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExecutionDirection {
    /// Apply: dependencies run before their dependents.
    Forward,
    /// Rollback: dependents are undone before their dependencies.
    Reverse,
}

impl ExecutionDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExecutionDirection::Forward => "UP",
            ExecutionDirection::Reverse => "DOWN",
        }
    }

    pub fn is_forward(&self) -> bool {
        matches!(self, ExecutionDirection::Forward)
    }
}

impl fmt::Display for ExecutionDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExecutionDirection {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "UP" => Ok(ExecutionDirection::Forward),
            "DOWN" => Ok(ExecutionDirection::Reverse),
            _ => Err(CoreError::InvalidDirection(s.to_string())),
        }
    }
}

/// Successful outcome of a task
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskOutput {
    message: String,
    /// Serialized description of how to undo this run, persisted with the
    /// success record.
    serialized_undo: Option<String>,
}

impl TaskOutput {
    /// Output for tasks that leave nothing to undo (rollbacks, irreversible steps)
    pub fn without_undo(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            serialized_undo: None,
        }
    }

    /// Output carrying an undo payload
    pub fn with_undo(message: impl Into<String>, serialized_undo: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            serialized_undo: Some(serialized_undo.into()),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn serialized_undo(&self) -> Option<&str> {
        self.serialized_undo.as_deref()
    }

    pub fn into_serialized_undo(self) -> Option<String> {
        self.serialized_undo
    }
}

/// An up- or down-action of a migration node.
///
/// Implementations may block on network or disk; errors are plain text and
/// are recorded verbatim in history.
#[async_trait]
pub trait Task: Send + Sync {
    /// Runs the action once.
    async fn execute(&self) -> std::result::Result<TaskOutput, String>;

    /// Human-readable summary of what the action does.
    fn description(&self) -> String;

    /// Literal action content (a SQL script, a command line) shown when the
    /// task fails. `None` when the task has no textual form.
    fn content(&self) -> Option<String> {
        None
    }
}
