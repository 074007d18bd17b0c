use super::error::Result;
use crate::core::MigrationNode;
use crate::graph::MigrationGraph;
use crate::storage::{ExecutionRecord, History};
use std::sync::Arc;

/// Applied/pending state of every node in a graph
pub struct StatusService<'g, H: History + ?Sized> {
    graph: &'g MigrationGraph,
    history: Arc<H>,
}

impl<'g, H: History + ?Sized> StatusService<'g, H> {
    pub fn new(graph: &'g MigrationGraph, history: Arc<H>) -> Self {
        Self { graph, history }
    }

    /// One entry per graph node, in insertion order
    pub async fn status(&self) -> Result<StatusReport> {
        let mut nodes = Vec::with_capacity(self.graph.len());
        let mut executed_count = 0;

        for node in self.graph.nodes() {
            let env = node.environment_id();
            let executed = self.history.was_executed(node.id(), env).await?;
            let latest_record = if executed {
                executed_count += 1;
                self.history.find_latest_record(node.id(), env).await?
            } else {
                None
            };

            nodes.push(NodeStatus {
                node: Arc::clone(node),
                executed,
                latest_record,
            });
        }

        let pending_count = nodes.len() - executed_count;
        Ok(StatusReport {
            nodes,
            executed_count,
            pending_count,
        })
    }
}

#[derive(Debug, Clone)]
pub struct NodeStatus {
    node: Arc<MigrationNode>,
    executed: bool,
    latest_record: Option<ExecutionRecord>,
}

impl NodeStatus {
    pub fn node(&self) -> &Arc<MigrationNode> {
        &self.node
    }

    pub fn is_executed(&self) -> bool {
        self.executed
    }

    /// Newest history record, present only for applied nodes
    pub fn latest_record(&self) -> Option<&ExecutionRecord> {
        self.latest_record.as_ref()
    }
}

#[derive(Debug, Clone)]
pub struct StatusReport {
    nodes: Vec<NodeStatus>,
    executed_count: usize,
    pending_count: usize,
}

impl StatusReport {
    pub fn nodes(&self) -> &[NodeStatus] {
        &self.nodes
    }

    pub fn executed_count(&self) -> usize {
        self.executed_count
    }

    pub fn pending_count(&self) -> usize {
        self.pending_count
    }

    pub fn total_count(&self) -> usize {
        self.executed_count + self.pending_count
    }
}
