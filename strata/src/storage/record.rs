use crate::core::{CoreError, EnvironmentId, ExecutionDirection, NodeId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExecutionStatus {
    Success,
    Failure,
    Skipped,
}

impl ExecutionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExecutionStatus::Success => "SUCCESS",
            ExecutionStatus::Failure => "FAILURE",
            ExecutionStatus::Skipped => "SKIPPED",
        }
    }
}

impl FromStr for ExecutionStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "SUCCESS" => Ok(ExecutionStatus::Success),
            "FAILURE" => Ok(ExecutionStatus::Failure),
            "SKIPPED" => Ok(ExecutionStatus::Skipped),
            _ => Err(CoreError::InvalidStatus(s.to_string())),
        }
    }
}

/// One persisted execution outcome
///
/// Records are append-only: a rollback does not delete the forward record,
/// it adds a newer reverse one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionRecord {
    id: Uuid,
    node_id: NodeId,
    environment_id: EnvironmentId,
    direction: ExecutionDirection,
    status: ExecutionStatus,
    executed_at: DateTime<Utc>,
    description: String,
    /// How to undo a forward run; only forward successes carry one
    #[serde(default)]
    serialized_undo: Option<String>,
    duration_ms: u64,
    /// Error text for failures, reason for skips
    #[serde(default)]
    error_message: Option<String>,
}

impl ExecutionRecord {
    /// Rebuilds a record read back from storage
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: Uuid,
        node_id: NodeId,
        environment_id: EnvironmentId,
        direction: ExecutionDirection,
        status: ExecutionStatus,
        executed_at: DateTime<Utc>,
        description: String,
        serialized_undo: Option<String>,
        duration_ms: u64,
        error_message: Option<String>,
    ) -> Self {
        Self {
            id,
            node_id,
            environment_id,
            direction,
            status,
            executed_at,
            description,
            serialized_undo,
            duration_ms,
            error_message,
        }
    }

    pub fn forward_success(
        node_id: NodeId,
        environment_id: EnvironmentId,
        description: impl Into<String>,
        serialized_undo: Option<String>,
        duration: Duration,
    ) -> Self {
        Self::now(
            node_id,
            environment_id,
            ExecutionDirection::Forward,
            ExecutionStatus::Success,
            description.into(),
            serialized_undo,
            duration,
            None,
        )
    }

    pub fn reverse_success(
        node_id: NodeId,
        environment_id: EnvironmentId,
        description: impl Into<String>,
        duration: Duration,
    ) -> Self {
        Self::now(
            node_id,
            environment_id,
            ExecutionDirection::Reverse,
            ExecutionStatus::Success,
            description.into(),
            None,
            duration,
            None,
        )
    }

    pub fn failure(
        node_id: NodeId,
        environment_id: EnvironmentId,
        direction: ExecutionDirection,
        description: impl Into<String>,
        error_message: impl Into<String>,
    ) -> Self {
        Self::now(
            node_id,
            environment_id,
            direction,
            ExecutionStatus::Failure,
            description.into(),
            None,
            Duration::ZERO,
            Some(error_message.into()),
        )
    }

    pub fn skipped(
        node_id: NodeId,
        environment_id: EnvironmentId,
        description: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::now(
            node_id,
            environment_id,
            ExecutionDirection::Forward,
            ExecutionStatus::Skipped,
            description.into(),
            None,
            Duration::ZERO,
            Some(reason.into()),
        )
    }

    #[allow(clippy::too_many_arguments)]
    fn now(
        node_id: NodeId,
        environment_id: EnvironmentId,
        direction: ExecutionDirection,
        status: ExecutionStatus,
        description: String,
        serialized_undo: Option<String>,
        duration: Duration,
        error_message: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            node_id,
            environment_id,
            direction,
            status,
            executed_at: Utc::now(),
            description,
            serialized_undo,
            duration_ms: u64::try_from(duration.as_millis()).unwrap_or(u64::MAX),
            error_message,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn node_id(&self) -> &NodeId {
        &self.node_id
    }

    pub fn environment_id(&self) -> &EnvironmentId {
        &self.environment_id
    }

    pub fn direction(&self) -> ExecutionDirection {
        self.direction
    }

    pub fn status(&self) -> ExecutionStatus {
        self.status
    }

    pub fn executed_at(&self) -> DateTime<Utc> {
        self.executed_at
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn serialized_undo(&self) -> Option<&str> {
        self.serialized_undo.as_deref()
    }

    pub fn duration_ms(&self) -> u64 {
        self.duration_ms
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    /// A forward run that succeeded; the node counts as applied while this
    /// is its latest outcome.
    pub fn is_applied(&self) -> bool {
        self.direction.is_forward() && self.status == ExecutionStatus::Success
    }

    pub fn is_skipped(&self) -> bool {
        self.status == ExecutionStatus::Skipped
    }
}
