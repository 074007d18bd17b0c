//! Commit-log style rendering of a migration graph
//!
//! [`GraphView`] takes an ordered node sequence (usually a flattened
//! [`ExecutionPlan`](crate::ExecutionPlan)) and draws the dependency shape in
//! lanes, one [`NodeLine`] per node:
//!
//! ```text
//! ● [ ] a - create schema
//! ├─┐
//! │ │
//! ● │ [ ] b - users
//! │ │
//! │ ● [ ] c - orders
//! │ │
//! ├─┘
//! ● [ ] d - reports
//! ```
//!
//! Edges implied by a longer path are dropped before drawing (transitive
//! reduction), so `a -> b -> c` plus a direct `a -> c` renders as a straight
//! chain.

mod glyphs;
mod graph_view;
mod lanes;
mod reduction;

pub use graph_view::{GraphView, NodeLine};
