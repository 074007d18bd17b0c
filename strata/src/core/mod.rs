//! Core types for the strata migration engine.
//!
//! # Domain Model
//! - [`NodeId`] / [`EnvironmentId`]: non-blank value identifiers
//! - [`MigrationNode`]: one migration step with its up/down tasks
//! - [`EnvironmentRef`]: the environment a node targets
//!
//! # Tasks
//! - [`Task`]: the action a node performs (async, may block on I/O)
//! - [`TaskOutput`]: success message plus optional undo payload
//! - [`ExecutionDirection`]: forward (apply) or reverse (rollback)
//!
//! # Example
//!
//! ```
//! use async_trait::async_trait;
//! use std::sync::Arc;
//! use strata::core::{EnvironmentId, EnvironmentRef, MigrationNode, NodeId, Task, TaskOutput};
//!
//! struct CreateUsers;
//!
//! #[async_trait]
//! impl Task for CreateUsers {
//!     async fn execute(&self) -> Result<TaskOutput, String> {
//!         Ok(TaskOutput::with_undo("created", "DROP TABLE users"))
//!     }
//!
//!     fn description(&self) -> String {
//!         "CREATE TABLE users".to_string()
//!     }
//! }
//!
//! let env = EnvironmentRef::new(EnvironmentId::new("dev").unwrap(), "Development");
//! let node = MigrationNode::builder(NodeId::new("users").unwrap(), "Create users", env, Arc::new(CreateUsers))
//!     .description("initial schema")
//!     .build();
//! assert!(node.has_no_dependencies());
//! ```

mod error;
mod id;
mod node;
mod task;

pub use error::{CoreError, Result};
pub use id::{EnvironmentId, NodeId};
pub use node::{EnvironmentRef, MigrationNode, MigrationNodeBuilder};
pub use task::{ExecutionDirection, Task, TaskOutput};
