//! Execution planning
//!
//! Turns a [`MigrationGraph`](crate::MigrationGraph) (or a target subset of it)
//! into an [`ExecutionPlan`]: an ordered list of [`ExecutionLevel`]s, each a
//! batch of nodes with no edges among them. Level `k` always completes before
//! level `k + 1` starts; nodes inside a level may run in parallel.
//!
//! # Algorithm Reference
//!
//! Kahn's algorithm, collecting every zero in-degree node into the same level
//! instead of popping them one at a time. The reverse plan runs the same
//! algorithm with edges flipped so dependents resolve before dependencies.

mod execution_plan;
mod topological;

pub use execution_plan::{ExecutionLevel, ExecutionPlan};
pub use topological::Planner;
