//! Strata: Dependency-Aware Schema Migrations for Rust
//!
//! `strata` models migration steps as nodes in a dependency graph, schedules
//! them into ordered batches that are safe to run in parallel, applies and
//! rolls them back idempotently against a persisted history, and draws the
//! dependency shape as a commit-log style ASCII graph.
//!
//! # Features
//!
//! - **Dependency graph**: duplicate/unknown dependency checks, cycle detection, DOT export
//! - **Level planning**: Kahn's algorithm, forward for apply and reversed for rollback
//! - **Idempotent execution**: already applied nodes are skipped, the first failure halts the run
//! - **History backends**: in-memory (DashMap) and SQLite (sqlx)
//! - **ASCII rendering**: lanes, branches and merges with transitive reduction
//!
//! # Quick Start
//!
//! ```ignore
//! use strata::prelude::*;
//!
//! struct Sql(&'static str);
//!
//! #[async_trait]
//! impl Task for Sql {
//!     async fn execute(&self) -> Result<TaskOutput, String> {
//!         // run self.0 against the database
//!         Ok(TaskOutput::without_undo("ok"))
//!     }
//!
//!     fn description(&self) -> String {
//!         self.0.to_string()
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let dev = EnvironmentRef::new(EnvironmentId::new("dev")?, "Development");
//!     let mut graph = MigrationGraph::new();
//!     graph.add_node(
//!         MigrationNode::builder(NodeId::new("users")?, "users", dev.clone(), Arc::new(Sql("CREATE TABLE users")))
//!             .down(Arc::new(Sql("DROP TABLE users")))
//!             .build(),
//!     )?;
//!
//!     let history = Arc::new(SqliteHistory::new("history.db").await?);
//!     let executor = MigrationExecutor::new(&graph, history, Arc::new(TracingListener));
//!     let targets = executor.determine_targets(None).await?;
//!     let plan = executor.create_plan(&targets, false).await?;
//!     println!("{} node(s) pending", plan.pending_nodes());
//!
//!     let summary = executor.execute(&targets).await?;
//!     println!("{} executed, {} skipped", summary.executed_count(), summary.skipped_count());
//!     Ok(())
//! }
//! ```
//!
//! # Module Organization
//!
//! Following Parnas's information hiding principles, each module hides specific design
//! decisions that are likely to change:
//!
//! - [`core`]: Value types and the task abstraction (hides identifier rules)
//! - [`graph`]: DAG structure (hides adjacency representation)
//! - [`plan`]: Level planning (hides the topological algorithm)
//! - [`render`]: ASCII drawing (hides lane bookkeeping)
//! - [`storage`]: Execution history (hides database choice and schema)
//! - [`executor`]: Apply/rollback coordination (hides execution strategy)

pub mod core;
pub mod executor;
pub mod graph;
pub mod plan;
pub mod render;
pub mod storage;

// Re-export commonly used types for convenience
pub use core::{
    CoreError, EnvironmentId, EnvironmentRef, ExecutionDirection, MigrationNode,
    MigrationNodeBuilder, NodeId, Result as CoreResult, Task, TaskOutput,
};

pub use executor::{
    CancellationToken, ExecutionError, ExecutionListener, ExecutionSummary, ExecutorConfig,
    MigrationExecutor, NodeFailure, NodeStatus, NoopListener, PlanInfo, Result as ExecutionResult,
    RollbackExecutor, StatusReport, StatusService, TracingListener,
};

pub use graph::{GraphError, GraphResult, MigrationGraph, ValidationReport};

pub use plan::{ExecutionLevel, ExecutionPlan, Planner};

pub use render::{GraphView, NodeLine};

pub use storage::{
    ExecutionRecord, ExecutionStatus, History, InMemoryHistory, Result as StorageResult,
    StorageError,
};

#[cfg(feature = "sqlite")]
pub use storage::{PoolConfig, SqliteHistory};

// Re-export dependencies used in public API
pub use async_trait::async_trait; // Users implement Task and History with it

/// Prelude module for convenient glob imports
///
/// # Example
///
/// ```ignore
/// use strata::prelude::*;
/// ```
pub mod prelude {
    pub use crate::core::{
        EnvironmentId, EnvironmentRef, ExecutionDirection, MigrationNode, NodeId, Task,
        TaskOutput,
    };

    pub use crate::executor::{
        CancellationToken, ExecutionError, ExecutionListener, ExecutionSummary, ExecutorConfig,
        MigrationExecutor, NoopListener, PlanInfo, RollbackExecutor, StatusService,
        TracingListener,
    };

    pub use crate::graph::{GraphError, MigrationGraph};

    pub use crate::plan::{ExecutionPlan, Planner};

    pub use crate::render::GraphView;

    pub use crate::storage::{ExecutionRecord, ExecutionStatus, History, InMemoryHistory};

    #[cfg(feature = "sqlite")]
    pub use crate::storage::SqliteHistory;

    // Re-export commonly used external types
    pub use async_trait::async_trait;
    pub use std::sync::Arc;
}
