//! Dependency graph of migration nodes
//!
//! This module owns the DAG model: nodes keyed by [`NodeId`](crate::NodeId),
//! dependency edges in both directions, transitive closures, cycle detection
//! and structural validation.
//!
//! # Design Principles
//!
//! The graph hides its representation (id-keyed adjacency maps) and exposes
//! only abstract operations: `add_node`, `dependencies_of`, `all_dependents_of`,
//! `find_cycle`, `validate`. Acyclicity is checked on demand rather than on
//! every mutation.

mod error;
mod migration_graph;

pub use error::{GraphError, GraphResult};
pub use migration_graph::{MigrationGraph, ValidationReport};
