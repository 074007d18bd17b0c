//! Error types for graph operations
//!
//! This module hides error representation details and provides
//! a unified error type for graph construction, validation and planning.

use crate::core::NodeId;
use thiserror::Error;

/// Result type for graph operations
pub type GraphResult<T> = Result<T, GraphError>;

/// Errors that can occur during graph operations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum GraphError {
    /// A node was added with an id that is already present
    #[error("Duplicate node ID: {node_id}")]
    DuplicateNode {
        /// The duplicate node ID
        node_id: NodeId,
    },

    /// A declared dependency was not in the graph when its dependent was added
    #[error("Dependency '{dependency}' for node '{node}' does not exist")]
    UnknownDependency {
        /// The node that declared the dependency
        node: NodeId,
        /// The dependency that was not found
        dependency: NodeId,
    },

    /// A node was not found in the graph
    #[error("Node not found: {node_id}")]
    NodeNotFound {
        /// The node ID that was not found
        node_id: NodeId,
    },

    /// Self-dependency detected (node depends on itself)
    #[error("Node '{node_id}' cannot depend on itself")]
    SelfDependency {
        /// The node with self-dependency
        node_id: NodeId,
    },

    /// A cycle was detected in the dependency graph
    #[error("Cycle detected in dependency graph: {path}")]
    CycleDetected {
        /// Human-readable description of the cycle path
        path: String,
    },
}

impl GraphError {
    /// Creates a cycle detected error with the given path
    pub fn cycle(path: impl Into<String>) -> Self {
        Self::CycleDetected { path: path.into() }
    }

    /// Creates a cycle error from the ids along the cycle
    pub fn cycle_through(ids: &[NodeId]) -> Self {
        let path = ids
            .iter()
            .map(NodeId::as_str)
            .collect::<Vec<_>>()
            .join(" -> ");
        Self::cycle(path)
    }

    /// Creates a duplicate node error
    pub fn duplicate_node(node_id: NodeId) -> Self {
        Self::DuplicateNode { node_id }
    }

    /// Creates an unknown dependency error
    pub fn unknown_dependency(node: NodeId, dependency: NodeId) -> Self {
        Self::UnknownDependency { node, dependency }
    }

    /// Creates a node not found error
    pub fn node_not_found(node_id: NodeId) -> Self {
        Self::NodeNotFound { node_id }
    }

    /// Creates a self-dependency error
    pub fn self_dependency(node_id: NodeId) -> Self {
        Self::SelfDependency { node_id }
    }
}
