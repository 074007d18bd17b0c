//! Run observation
//!
//! The executors report everything through an [`ExecutionListener`]: plan
//! creation, each node's start and outcome, and the final summary. Per node
//! the start event always precedes the outcome event.

use crate::core::{ExecutionDirection, MigrationNode, NodeId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Receives progress events from an executor
///
/// Every method defaults to doing nothing, so implementations only override
/// the events they care about. Callbacks run inline on the executor's task
/// and should return quickly.
pub trait ExecutionListener: Send + Sync {
    fn on_plan_created(&self, plan: &PlanInfo) {
        let _ = plan;
    }

    fn on_node_started(&self, node: &MigrationNode, direction: ExecutionDirection) {
        let _ = (node, direction);
    }

    fn on_node_succeeded(
        &self,
        node: &MigrationNode,
        direction: ExecutionDirection,
        duration: Duration,
    ) {
        let _ = (node, direction, duration);
    }

    fn on_node_skipped(&self, node: &MigrationNode, direction: ExecutionDirection, reason: &str) {
        let _ = (node, direction, reason);
    }

    /// `content` is the literal action text of the failing task, when it
    /// exposes one.
    fn on_node_failed(
        &self,
        node: &MigrationNode,
        direction: ExecutionDirection,
        content: Option<&str>,
        message: &str,
    ) {
        let _ = (node, direction, content, message);
    }

    fn on_completed(&self, summary: &ExecutionSummary) {
        let _ = summary;
    }
}

/// Listener that ignores every event
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopListener;

impl ExecutionListener for NoopListener {}

/// Listener that turns every event into a `tracing` event
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingListener;

impl ExecutionListener for TracingListener {
    fn on_plan_created(&self, plan: &PlanInfo) {
        info!(
            levels = plan.levels().len(),
            total = plan.total_nodes(),
            pending = plan.pending_nodes(),
            dry_run = plan.is_dry_run(),
            "execution plan created"
        );
    }

    fn on_node_started(&self, node: &MigrationNode, direction: ExecutionDirection) {
        info!(node = %node.id(), name = node.name(), %direction, "node started");
    }

    fn on_node_succeeded(
        &self,
        node: &MigrationNode,
        direction: ExecutionDirection,
        duration: Duration,
    ) {
        info!(
            node = %node.id(),
            %direction,
            duration_ms = duration.as_millis() as u64,
            "node succeeded"
        );
    }

    fn on_node_skipped(&self, node: &MigrationNode, direction: ExecutionDirection, reason: &str) {
        info!(node = %node.id(), %direction, reason, "node skipped");
    }

    fn on_node_failed(
        &self,
        node: &MigrationNode,
        direction: ExecutionDirection,
        content: Option<&str>,
        message: &str,
    ) {
        warn!(node = %node.id(), %direction, content, error = message, "node failed");
    }

    fn on_completed(&self, summary: &ExecutionSummary) {
        if summary.is_success() {
            info!(
                direction = %summary.direction(),
                executed = summary.executed_count(),
                skipped = summary.skipped_count(),
                "run completed"
            );
        } else {
            warn!(
                direction = %summary.direction(),
                executed = summary.executed_count(),
                skipped = summary.skipped_count(),
                failed = summary.failed_count(),
                cancelled = summary.is_cancelled(),
                "run aborted"
            );
        }
    }
}

/// What a run is about to do
#[derive(Debug, Clone)]
pub struct PlanInfo {
    levels: Vec<Vec<Arc<MigrationNode>>>,
    executed_nodes: BTreeSet<NodeId>,
    total_nodes: usize,
    dry_run: bool,
}

impl PlanInfo {
    pub(crate) fn new(
        levels: Vec<Vec<Arc<MigrationNode>>>,
        executed_nodes: BTreeSet<NodeId>,
        dry_run: bool,
    ) -> Self {
        let total_nodes = levels.iter().map(Vec::len).sum();
        Self {
            levels,
            executed_nodes,
            total_nodes,
            dry_run,
        }
    }

    pub fn levels(&self) -> &[Vec<Arc<MigrationNode>>] {
        &self.levels
    }

    /// Every graph node the history currently reports as applied
    pub fn executed_nodes(&self) -> &BTreeSet<NodeId> {
        &self.executed_nodes
    }

    pub fn total_nodes(&self) -> usize {
        self.total_nodes
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// Planned nodes that are not applied yet
    pub fn pending_nodes(&self) -> usize {
        self.levels
            .iter()
            .flatten()
            .filter(|node| !self.executed_nodes.contains(node.id()))
            .count()
    }
}

/// Diagnostics of the node that stopped a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeFailure {
    node_id: NodeId,
    message: String,
    content: Option<String>,
}

impl NodeFailure {
    pub(crate) fn new(node_id: NodeId, message: String, content: Option<String>) -> Self {
        Self {
            node_id,
            message,
            content,
        }
    }

    pub fn node_id(&self) -> &NodeId {
        &self.node_id
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Literal action text (usually SQL) of the failing task
    pub fn content(&self) -> Option<&str> {
        self.content.as_deref()
    }
}

/// Outcome of a whole run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionSummary {
    direction: ExecutionDirection,
    total_nodes: usize,
    executed_count: usize,
    skipped_count: usize,
    failed_count: usize,
    success: bool,
    cancelled: bool,
    failure: Option<NodeFailure>,
}

impl ExecutionSummary {
    pub(crate) fn new(
        direction: ExecutionDirection,
        total_nodes: usize,
        executed_count: usize,
        skipped_count: usize,
        failure: Option<NodeFailure>,
        cancelled: bool,
    ) -> Self {
        let failed_count = usize::from(failure.is_some());
        Self {
            direction,
            total_nodes,
            executed_count,
            skipped_count,
            failed_count,
            success: failure.is_none() && !cancelled,
            cancelled,
            failure,
        }
    }

    pub fn direction(&self) -> ExecutionDirection {
        self.direction
    }

    /// Nodes in the plan, attempted or not
    pub fn total_nodes(&self) -> usize {
        self.total_nodes
    }

    pub fn executed_count(&self) -> usize {
        self.executed_count
    }

    pub fn skipped_count(&self) -> usize {
        self.skipped_count
    }

    pub fn failed_count(&self) -> usize {
        self.failed_count
    }

    pub fn is_success(&self) -> bool {
        self.success
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    pub fn failure(&self) -> Option<&NodeFailure> {
        self.failure.as_ref()
    }
}
