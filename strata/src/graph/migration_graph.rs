//! MigrationGraph - dependency graph of migration nodes
//!
//! # Design
//!
//! The graph uses a bidirectional adjacency representation keyed by node id:
//! - `dependencies`: nodes this node must run after (outgoing "needs" edges)
//! - `dependents`: nodes that need this node (the reverse index)
//!
//! Both directions are O(1) to reach, which the planner (in-degree counting)
//! and the rollback path (dependents first) both rely on. Nodes are stored
//! behind `Arc` so plans and renderers can hold them without copying tasks.

use super::error::{GraphError, GraphResult};
use crate::core::{MigrationNode, NodeId};
use petgraph::dot::{Config, Dot};
use petgraph::graph::DiGraph;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tracing::debug;

static NO_EDGES: BTreeSet<NodeId> = BTreeSet::new();

/// A directed graph of migration nodes and their dependencies
///
/// # Example
///
/// ```
/// use async_trait::async_trait;
/// use std::sync::Arc;
/// use strata::core::{EnvironmentId, EnvironmentRef, MigrationNode, NodeId, Task, TaskOutput};
/// use strata::MigrationGraph;
///
/// struct Noop;
///
/// #[async_trait]
/// impl Task for Noop {
///     async fn execute(&self) -> Result<TaskOutput, String> {
///         Ok(TaskOutput::without_undo("ok"))
///     }
///     fn description(&self) -> String {
///         "noop".into()
///     }
/// }
///
/// let env = EnvironmentRef::new(EnvironmentId::new("dev").unwrap(), "dev");
/// let id = |s: &str| NodeId::new(s).unwrap();
///
/// let mut graph = MigrationGraph::new();
/// graph
///     .add_node(MigrationNode::builder(id("schema"), "schema", env.clone(), Arc::new(Noop)).build())
///     .unwrap();
/// graph
///     .add_node(
///         MigrationNode::builder(id("seed"), "seed", env, Arc::new(Noop))
///             .depends_on(id("schema"))
///             .build(),
///     )
///     .unwrap();
///
/// assert_eq!(graph.dependents_of(&id("schema")).len(), 1);
/// assert!(!graph.has_cycle());
/// ```
#[derive(Debug, Clone, Default)]
pub struct MigrationGraph {
    nodes: HashMap<NodeId, Arc<MigrationNode>>,
    dependencies: HashMap<NodeId, BTreeSet<NodeId>>,
    dependents: HashMap<NodeId, BTreeSet<NodeId>>,
    /// Insertion order for deterministic iteration
    insertion_order: Vec<NodeId>,
    positions: HashMap<NodeId, usize>,
}

/// Outcome of [`MigrationGraph::validate`]: every structural problem found
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    errors: Vec<GraphError>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn errors(&self) -> &[GraphError] {
        &self.errors
    }

    /// Converts into a result carrying the first error
    pub fn into_result(self) -> GraphResult<()> {
        match self.errors.into_iter().next() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    Gray,
    Black,
}

impl MigrationGraph {
    /// Creates a new empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of nodes in the graph
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns true if the graph has no nodes
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Adds a node to the graph
    ///
    /// Returns an error if a node with the same id already exists, or if any
    /// declared dependency has not been added yet. A failed insert leaves the
    /// graph unchanged.
    pub fn add_node(&mut self, node: MigrationNode) -> GraphResult<()> {
        let id = node.id().clone();
        if self.nodes.contains_key(&id) {
            return Err(GraphError::duplicate_node(id));
        }

        if let Some(missing) = node
            .dependencies()
            .iter()
            .find(|dep| !self.nodes.contains_key(*dep))
        {
            return Err(GraphError::unknown_dependency(id, missing.clone()));
        }

        for dep in node.dependencies() {
            self.dependents
                .entry(dep.clone())
                .or_default()
                .insert(id.clone());
        }
        self.dependencies
            .insert(id.clone(), node.dependencies().clone());
        self.positions.insert(id.clone(), self.insertion_order.len());
        self.insertion_order.push(id.clone());
        debug!(node_id = %id, dependencies = node.dependencies().len(), "added migration node");
        self.nodes.insert(id, Arc::new(node));
        Ok(())
    }

    /// Adds an edge after insertion: `from` depends on `to`
    ///
    /// Both nodes must exist. Cycles are not rejected here; call
    /// [`has_cycle`](Self::has_cycle) or [`validate`](Self::validate) before planning.
    pub fn add_dependency(&mut self, from: &NodeId, to: &NodeId) -> GraphResult<()> {
        if from == to {
            return Err(GraphError::self_dependency(from.clone()));
        }
        if !self.nodes.contains_key(from) {
            return Err(GraphError::node_not_found(from.clone()));
        }
        if !self.nodes.contains_key(to) {
            return Err(GraphError::unknown_dependency(from.clone(), to.clone()));
        }

        self.dependencies
            .entry(from.clone())
            .or_default()
            .insert(to.clone());
        self.dependents
            .entry(to.clone())
            .or_default()
            .insert(from.clone());
        Ok(())
    }

    /// Returns a node by id
    pub fn node(&self, id: &NodeId) -> Option<&Arc<MigrationNode>> {
        self.nodes.get(id)
    }

    /// Returns true if the node exists in the graph
    pub fn contains(&self, id: &NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    /// Returns all nodes in insertion order
    pub fn nodes(&self) -> impl Iterator<Item = &Arc<MigrationNode>> {
        self.insertion_order
            .iter()
            .filter_map(move |id| self.nodes.get(id))
    }

    /// Returns all node ids in insertion order
    pub fn node_ids(&self) -> impl Iterator<Item = &NodeId> {
        self.insertion_order.iter()
    }

    /// Insertion index of a node, used to order nodes deterministically
    pub fn position(&self, id: &NodeId) -> Option<usize> {
        self.positions.get(id).copied()
    }

    /// Direct dependencies of a node (empty for unknown ids)
    pub fn dependencies_of(&self, id: &NodeId) -> &BTreeSet<NodeId> {
        self.dependencies.get(id).unwrap_or(&NO_EDGES)
    }

    /// Direct dependents of a node (empty for unknown ids)
    pub fn dependents_of(&self, id: &NodeId) -> &BTreeSet<NodeId> {
        self.dependents.get(id).unwrap_or(&NO_EDGES)
    }

    /// Every node `id` depends on, directly or transitively
    pub fn all_dependencies_of(&self, id: &NodeId) -> BTreeSet<NodeId> {
        self.closure(id, |graph, node| graph.dependencies_of(node))
    }

    /// Every node that depends on `id`, directly or transitively
    pub fn all_dependents_of(&self, id: &NodeId) -> BTreeSet<NodeId> {
        self.closure(id, |graph, node| graph.dependents_of(node))
    }

    fn closure<'a>(
        &'a self,
        start: &NodeId,
        next: impl Fn(&'a Self, &NodeId) -> &'a BTreeSet<NodeId>,
    ) -> BTreeSet<NodeId> {
        let mut visited = BTreeSet::new();
        let mut stack: Vec<&NodeId> = next(self, start).iter().collect();

        while let Some(node) = stack.pop() {
            if node == start || !visited.insert(node.clone()) {
                continue;
            }
            stack.extend(next(self, node).iter());
        }

        visited
    }

    /// Nodes with no dependencies, in insertion order
    pub fn roots(&self) -> Vec<NodeId> {
        self.insertion_order
            .iter()
            .filter(|id| self.dependencies_of(id).is_empty())
            .cloned()
            .collect()
    }

    /// Nodes nothing depends on, in insertion order
    pub fn leaves(&self) -> Vec<NodeId> {
        self.insertion_order
            .iter()
            .filter(|id| self.dependents_of(id).is_empty())
            .cloned()
            .collect()
    }

    /// Detects if the graph contains a cycle
    pub fn has_cycle(&self) -> bool {
        self.find_cycle().is_some()
    }

    /// Finds one dependency cycle, returned as the ids along it with the
    /// first id repeated at the end.
    ///
    /// Uses DFS with three-color marking:
    /// - White (not visited): absent from `marks`
    /// - Gray (visiting): on the current DFS path
    /// - Black (done): fully explored
    ///
    /// An edge into a gray node is a back edge, i.e. a cycle.
    pub fn find_cycle(&self) -> Option<Vec<NodeId>> {
        let mut marks: HashMap<&NodeId, Mark> = HashMap::new();
        let mut path: Vec<&NodeId> = Vec::new();

        for id in &self.insertion_order {
            if !marks.contains_key(id) {
                if let Some(cycle) = self.dfs_find_cycle(id, &mut marks, &mut path) {
                    return Some(cycle);
                }
            }
        }

        None
    }

    fn dfs_find_cycle<'a>(
        &'a self,
        node: &'a NodeId,
        marks: &mut HashMap<&'a NodeId, Mark>,
        path: &mut Vec<&'a NodeId>,
    ) -> Option<Vec<NodeId>> {
        marks.insert(node, Mark::Gray);
        path.push(node);

        for dep in self.dependencies_of(node) {
            match marks.get(dep) {
                None => {
                    if let Some(cycle) = self.dfs_find_cycle(dep, marks, path) {
                        return Some(cycle);
                    }
                }
                Some(Mark::Gray) => {
                    // Back edge found - cycle detected
                    let start = path.iter().position(|id| *id == dep).unwrap_or(0);
                    let mut cycle: Vec<NodeId> =
                        path[start..].iter().map(|id| (*id).clone()).collect();
                    cycle.push(dep.clone());
                    return Some(cycle);
                }
                Some(Mark::Black) => {}
            }
        }

        path.pop();
        marks.insert(node, Mark::Black);
        None
    }

    /// Validates the graph structure without failing fast
    ///
    /// Checks:
    /// - No cycles
    /// - All referenced dependencies exist
    pub fn validate(&self) -> ValidationReport {
        let mut errors = Vec::new();

        if let Some(cycle) = self.find_cycle() {
            errors.push(GraphError::cycle_through(&cycle));
        }

        for id in &self.insertion_order {
            for dep in self.dependencies_of(id) {
                if !self.nodes.contains_key(dep) {
                    errors.push(GraphError::unknown_dependency(id.clone(), dep.clone()));
                }
            }
        }

        ValidationReport { errors }
    }

    /// Generates a Graphviz DOT representation of the graph
    ///
    /// Edges point from a dependency to its dependent (execution order).
    /// Render with `dot -Tpng graph.dot -o graph.png`.
    pub fn to_dot(&self) -> String {
        let mut graph = DiGraph::<String, ()>::new();
        let mut node_indices = HashMap::new();

        for id in &self.insertion_order {
            let node_idx = graph.add_node(id.to_string());
            node_indices.insert(id, node_idx);
        }

        for id in &self.insertion_order {
            let target_idx = node_indices[id];
            for dep in self.dependencies_of(id) {
                if let Some(&source_idx) = node_indices.get(dep) {
                    graph.add_edge(source_idx, target_idx, ());
                }
            }
        }

        format!("{:?}", Dot::with_config(&graph, &[Config::EdgeNoLabel]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{id, node};

    fn chain() -> MigrationGraph {
        let mut graph = MigrationGraph::new();
        graph.add_node(node("a", &[])).unwrap();
        graph.add_node(node("b", &["a"])).unwrap();
        graph.add_node(node("c", &["b"])).unwrap();
        graph
    }

    #[test]
    fn test_empty_graph() {
        let graph = MigrationGraph::new();
        assert!(graph.is_empty());
        assert_eq!(graph.len(), 0);
        assert!(graph.validate().is_valid());
    }

    #[test]
    fn test_duplicate_node_error() {
        let mut graph = MigrationGraph::new();
        graph.add_node(node("a", &[])).unwrap();

        let result = graph.add_node(node("a", &[]));
        assert_eq!(result, Err(GraphError::duplicate_node(id("a"))));
        assert_eq!(graph.len(), 1);
    }

    #[test]
    fn test_unknown_dependency_error() {
        let mut graph = MigrationGraph::new();
        let result = graph.add_node(node("b", &["a"]));

        assert_eq!(result, Err(GraphError::unknown_dependency(id("b"), id("a"))));
        assert!(graph.is_empty());
        assert!(graph.dependents_of(&id("a")).is_empty());
    }

    #[test]
    fn test_direct_edges() {
        let graph = chain();

        assert_eq!(
            graph.dependencies_of(&id("b")).iter().collect::<Vec<_>>(),
            vec![&id("a")]
        );
        assert_eq!(
            graph.dependents_of(&id("b")).iter().collect::<Vec<_>>(),
            vec![&id("c")]
        );
        assert!(graph.dependencies_of(&id("missing")).is_empty());
    }

    #[test]
    fn test_transitive_closures_deduplicate_diamond() {
        let mut graph = MigrationGraph::new();
        graph.add_node(node("a", &[])).unwrap();
        graph.add_node(node("b", &["a"])).unwrap();
        graph.add_node(node("c", &["a"])).unwrap();
        graph.add_node(node("d", &["b", "c"])).unwrap();

        let deps = graph.all_dependencies_of(&id("d"));
        assert_eq!(deps, BTreeSet::from([id("a"), id("b"), id("c")]));

        let dependents = graph.all_dependents_of(&id("a"));
        assert_eq!(dependents, BTreeSet::from([id("b"), id("c"), id("d")]));
        assert!(graph.all_dependents_of(&id("d")).is_empty());
    }

    #[test]
    fn test_roots_and_leaves() {
        let graph = chain();
        assert_eq!(graph.roots(), vec![id("a")]);
        assert_eq!(graph.leaves(), vec![id("c")]);
    }

    #[test]
    fn test_nodes_iterate_in_insertion_order() {
        let graph = chain();
        let ids: Vec<_> = graph.node_ids().map(NodeId::as_str).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
        assert_eq!(graph.position(&id("c")), Some(2));
    }

    #[test]
    fn test_cycle_detection() {
        let mut graph = chain();
        assert!(!graph.has_cycle());

        // a -> b -> c -> a
        graph.add_dependency(&id("a"), &id("c")).unwrap();
        assert!(graph.has_cycle());

        let cycle = graph.find_cycle().unwrap();
        assert_eq!(cycle.first(), cycle.last());
        assert_eq!(cycle.len(), 4);
    }

    #[test]
    fn test_self_dependency_error() {
        let mut graph = chain();
        let result = graph.add_dependency(&id("a"), &id("a"));
        assert_eq!(result, Err(GraphError::self_dependency(id("a"))));
    }

    #[test]
    fn test_validate_reports_cycle() {
        let mut graph = chain();
        graph.add_dependency(&id("a"), &id("c")).unwrap();

        let report = graph.validate();
        assert!(!report.is_valid());
        assert!(matches!(
            report.errors()[0],
            GraphError::CycleDetected { .. }
        ));
        assert!(report.into_result().is_err());
    }

    #[test]
    fn test_to_dot_lists_edges() {
        let dot = chain().to_dot();
        assert!(dot.starts_with("digraph"));
        assert_eq!(dot.matches("label").count(), 3);
        assert!(dot.contains("0 -> 1"));
        assert!(dot.contains("1 -> 2"));
    }
}
