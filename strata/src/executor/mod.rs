//! Execution layer for the strata migration engine.
//!
//! Turns a plan into task invocations and history records.
//!
//! # Module Organization
//!
//! Following Parnas's information hiding principles:
//! - `runner`: hides the level walk (chunking, cancellation, halting)
//! - `migration` / `rollback`: hide target selection for each direction
//! - `listener`: the only observation channel out of a run
//! - `status`: read-only view of the history against a graph
//!
//! # Run states
//!
//! ```text
//! PLANNING -> per level -> per node: CHECK_HISTORY -> SKIP | RUN -> SUCCESS | FAILURE
//!          -> COMPLETED | ABORTED
//! ```

mod config;
mod error;
mod listener;
mod migration;
mod rollback;
mod runner;
mod status;

pub use config::ExecutorConfig;
pub use error::{ExecutionError, Result};
pub use listener::{
    ExecutionListener, ExecutionSummary, NodeFailure, NoopListener, PlanInfo, TracingListener,
};
pub use migration::MigrationExecutor;
pub use rollback::RollbackExecutor;
pub use status::{NodeStatus, StatusReport, StatusService};

pub use tokio_util::sync::CancellationToken;
