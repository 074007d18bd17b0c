use super::glyphs;
use super::lanes::Lanes;
use super::reduction::reduced_children;
use crate::core::{ExecutionDirection, MigrationNode};
use std::fmt;
use std::sync::Arc;

/// Rendered rows belonging to one node
#[derive(Debug, Clone)]
pub struct NodeLine {
    node: Arc<MigrationNode>,
    graph_prefix: String,
    merge_line: Option<String>,
    branch_line: Option<String>,
    connector_line: Option<String>,
}

impl NodeLine {
    pub fn node(&self) -> &Arc<MigrationNode> {
        &self.node
    }

    /// The node row: lane glyphs with the node marker
    pub fn graph_prefix(&self) -> &str {
        &self.graph_prefix
    }

    /// Row drawn above the node when several lanes join into it
    pub fn merge_line(&self) -> Option<&str> {
        self.merge_line.as_deref()
    }

    /// Row drawn below the node when it fans out into several lanes
    pub fn branch_line(&self) -> Option<&str> {
        self.branch_line.as_deref()
    }

    /// Vertical bars between this node and the next one
    pub fn connector_line(&self) -> Option<&str> {
        self.connector_line.as_deref()
    }

    /// The node row followed by a status marker, id and name
    pub fn to_plain_text(&self, status: &str) -> String {
        format!(
            "{} {} {} - {}",
            self.graph_prefix,
            status,
            self.node.id(),
            self.node.name()
        )
    }

    /// All rows for this node in drawing order
    pub fn rows(&self, status: &str) -> Vec<String> {
        let mut rows = Vec::with_capacity(4);
        if let Some(merge) = &self.merge_line {
            rows.push(merge.clone());
        }
        rows.push(self.to_plain_text(status));
        if let Some(branch) = &self.branch_line {
            rows.push(branch.clone());
        }
        if let Some(connector) = &self.connector_line {
            rows.push(connector.clone());
        }
        rows
    }
}

/// Lane-based drawing of an ordered node sequence
///
/// Forward views draw dependents below their dependencies; reverse views
/// (rollback order) draw dependencies below their dependents. Edges whose
/// child is listed above the parent, or absent from the sequence, are not
/// drawn.
///
/// Edges come from each node's declared dependencies only. Edges added
/// afterwards with [`MigrationGraph::add_dependency`](crate::MigrationGraph::add_dependency)
/// affect planning but not the drawing.
///
/// # Example
///
/// ```ignore
/// let plan = Planner::new(&graph).plan()?;
/// let view = GraphView::new(plan.nodes().cloned(), ExecutionDirection::Forward);
/// for line in view.lines() {
///     println!("{}", line.to_plain_text("[x]"));
/// }
/// ```
#[derive(Debug, Clone)]
pub struct GraphView {
    direction: ExecutionDirection,
    lines: Vec<NodeLine>,
}

impl GraphView {
    pub fn new(
        nodes: impl IntoIterator<Item = Arc<MigrationNode>>,
        direction: ExecutionDirection,
    ) -> Self {
        let nodes: Vec<Arc<MigrationNode>> = nodes.into_iter().collect();
        let lines = render(&nodes, direction);
        Self { direction, lines }
    }

    pub fn direction(&self) -> ExecutionDirection {
        self.direction
    }

    pub fn lines(&self) -> &[NodeLine] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

impl fmt::Display for GraphView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in &self.lines {
            for row in line.rows("[ ]") {
                writeln!(f, "{}", row)?;
            }
        }
        Ok(())
    }
}

fn render(nodes: &[Arc<MigrationNode>], direction: ExecutionDirection) -> Vec<NodeLine> {
    let children = reduced_children(nodes, direction);
    let mut lanes = Lanes::default();
    let mut lines = Vec::with_capacity(nodes.len());

    for (index, node) in nodes.iter().enumerate() {
        let parent_lanes = lanes.parents_of(index);
        let node_lane = match parent_lanes.first() {
            Some(&col) => col,
            None => lanes.claim_free(),
        };

        let merge_line = if parent_lanes.len() > 1 {
            Some(glyphs::merge_row(&lanes.occupied(), &parent_lanes, node_lane))
        } else {
            None
        };
        for &col in &parent_lanes {
            lanes.arrive(col, index);
        }

        let graph_prefix = glyphs::node_row(&lanes.occupied(), node_lane);

        let kids = &children[index];
        let mut child_lanes = Vec::with_capacity(kids.len());
        for (n, &child) in kids.iter().enumerate() {
            let col = if n == 0 { node_lane } else { lanes.claim_free() };
            lanes.assign(col, index, child);
            child_lanes.push(col);
        }
        let branch_line = if child_lanes.len() > 1 {
            Some(glyphs::branch_row(&lanes.occupied(), node_lane, &child_lanes))
        } else {
            None
        };

        let connector_line = if index + 1 < nodes.len() && lanes.any_occupied() {
            Some(glyphs::connector_row(&lanes.occupied()))
        } else {
            None
        };

        lines.push(NodeLine {
            node: Arc::clone(node),
            graph_prefix,
            merge_line,
            branch_line,
            connector_line,
        });
    }

    lines
}
