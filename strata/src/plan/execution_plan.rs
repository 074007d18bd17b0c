use crate::core::{MigrationNode, NodeId};
use std::sync::Arc;

/// A batch of nodes with no dependency edges among them
#[derive(Debug, Clone)]
pub struct ExecutionLevel {
    index: usize,
    nodes: Vec<Arc<MigrationNode>>,
}

impl ExecutionLevel {
    pub(crate) fn new(index: usize, nodes: Vec<Arc<MigrationNode>>) -> Self {
        Self { index, nodes }
    }

    /// Ordinal of this level within its plan, starting at 0
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn nodes(&self) -> &[Arc<MigrationNode>] {
        &self.nodes
    }

    pub fn size(&self) -> usize {
        self.nodes.len()
    }

    pub fn contains(&self, id: &NodeId) -> bool {
        self.nodes.iter().any(|node| node.id() == id)
    }
}

/// Ordered sequence of levels covering a set of nodes
///
/// Immutable once computed; build a new plan for a different target subset.
#[derive(Debug, Clone, Default)]
pub struct ExecutionPlan {
    levels: Vec<ExecutionLevel>,
}

impl ExecutionPlan {
    pub(crate) fn new(levels: Vec<ExecutionLevel>) -> Self {
        Self { levels }
    }

    /// A plan with no levels
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn levels(&self) -> &[ExecutionLevel] {
        &self.levels
    }

    pub fn level_count(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// Number of nodes across all levels
    pub fn total_nodes(&self) -> usize {
        self.levels.iter().map(ExecutionLevel::size).sum()
    }

    /// Size of the largest level
    pub fn max_parallelism(&self) -> usize {
        self.levels
            .iter()
            .map(ExecutionLevel::size)
            .max()
            .unwrap_or(0)
    }

    /// All nodes flattened in level order
    pub fn nodes(&self) -> impl Iterator<Item = &Arc<MigrationNode>> {
        self.levels.iter().flat_map(|level| level.nodes().iter())
    }

    /// Index of the level containing `id`
    pub fn level_of(&self, id: &NodeId) -> Option<usize> {
        self.levels
            .iter()
            .find(|level| level.contains(id))
            .map(ExecutionLevel::index)
    }
}
