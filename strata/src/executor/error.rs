use crate::graph::GraphError;
use crate::storage::StorageError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Execution layer error type for the strata migration engine.
///
/// Only infrastructure problems end up here. A task that reports an error
/// is an ordinary outcome: it is recorded, announced to the listener and
/// returned in the [`ExecutionSummary`](super::ExecutionSummary).
#[derive(Debug, Error, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum ExecutionError {
    /// Planning failed (cycle, missing node).
    #[error("graph error: {0}")]
    Graph(String),

    /// The history store failed; the run stops where it was.
    #[error("storage error: {0}")]
    Storage(String),

    /// An explicit target id is not part of the graph.
    #[error("unknown target node: {0}")]
    UnknownTarget(String),
}

// Manual From implementations to convert nested errors to strings
impl From<StorageError> for ExecutionError {
    fn from(e: StorageError) -> Self {
        ExecutionError::Storage(e.to_string())
    }
}

impl From<GraphError> for ExecutionError {
    fn from(e: GraphError) -> Self {
        ExecutionError::Graph(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ExecutionError>;
