use super::{ExecutionLevel, ExecutionPlan};
use crate::core::NodeId;
use crate::graph::{GraphError, GraphResult, MigrationGraph};
use std::collections::{BTreeSet, HashMap};
use tracing::debug;

/// Which edge direction gates a node
#[derive(Clone, Copy)]
enum Orientation {
    /// A node waits for its dependencies.
    DependenciesFirst,
    /// A node waits for its dependents (rollback order).
    DependentsFirst,
}

/// Builds execution plans from a graph
///
/// # Example
///
/// ```ignore
/// let planner = Planner::new(&graph);
/// let plan = planner.plan_for_targets([&target])?;
/// for level in plan.levels() {
///     println!("level {}: {} nodes", level.index(), level.size());
/// }
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Planner<'g> {
    graph: &'g MigrationGraph,
}

impl<'g> Planner<'g> {
    pub fn new(graph: &'g MigrationGraph) -> Self {
        Self { graph }
    }

    /// Plans the entire graph
    ///
    /// Returns [`GraphError::CycleDetected`] if the graph contains a cycle;
    /// no partial plan is produced.
    pub fn plan(&self) -> GraphResult<ExecutionPlan> {
        let members: BTreeSet<NodeId> = self.graph.node_ids().cloned().collect();
        self.kahn(members, Orientation::DependenciesFirst)
    }

    /// Plans the targets together with everything they transitively depend on
    ///
    /// Used for "migrate up to X" and "migrate all pending". Unknown ids are
    /// ignored; an empty target set yields an empty plan.
    pub fn plan_for_targets<'t>(
        &self,
        targets: impl IntoIterator<Item = &'t NodeId>,
    ) -> GraphResult<ExecutionPlan> {
        let mut members = BTreeSet::new();
        for target in targets {
            if !self.graph.contains(target) {
                continue;
            }
            members.extend(self.graph.all_dependencies_of(target));
            members.insert(target.clone());
        }
        self.kahn(members, Orientation::DependenciesFirst)
    }

    /// Plans exactly the targets in rollback order (most dependent first)
    ///
    /// The caller expands the set beforehand when it wants "X and everything
    /// depending on it". Edges to nodes outside the set are ignored.
    pub fn reverse_plan_for_targets<'t>(
        &self,
        targets: impl IntoIterator<Item = &'t NodeId>,
    ) -> GraphResult<ExecutionPlan> {
        let members: BTreeSet<NodeId> = targets
            .into_iter()
            .filter(|id| self.graph.contains(id))
            .cloned()
            .collect();
        self.kahn(members, Orientation::DependentsFirst)
    }

    fn gates(&self, id: &NodeId, orientation: Orientation) -> &'g BTreeSet<NodeId> {
        match orientation {
            Orientation::DependenciesFirst => self.graph.dependencies_of(id),
            Orientation::DependentsFirst => self.graph.dependents_of(id),
        }
    }

    fn unlocks(&self, id: &NodeId, orientation: Orientation) -> &'g BTreeSet<NodeId> {
        match orientation {
            Orientation::DependenciesFirst => self.graph.dependents_of(id),
            Orientation::DependentsFirst => self.graph.dependencies_of(id),
        }
    }

    /// Kahn's algorithm restricted to `members`
    ///
    /// 1. In-degree of a node = number of its gating edges inside `members`
    /// 2. Every node with in-degree 0 forms the next level
    /// 3. Remove them and decrement the in-degree of the nodes they unlock
    /// 4. Nodes left over with no zero in-degree node among them form a cycle
    fn kahn(
        &self,
        members: BTreeSet<NodeId>,
        orientation: Orientation,
    ) -> GraphResult<ExecutionPlan> {
        let mut in_degrees: HashMap<NodeId, usize> = members
            .iter()
            .map(|id| {
                let degree = self
                    .gates(id, orientation)
                    .iter()
                    .filter(|gate| members.contains(*gate))
                    .count();
                (id.clone(), degree)
            })
            .collect();

        let mut levels = Vec::new();

        while !in_degrees.is_empty() {
            let mut ready: Vec<NodeId> = in_degrees
                .iter()
                .filter(|(_, degree)| **degree == 0)
                .map(|(id, _)| id.clone())
                .collect();

            if ready.is_empty() {
                let mut stuck: Vec<NodeId> = in_degrees.into_keys().collect();
                stuck.sort();
                return Err(GraphError::cycle(format!(
                    "cannot plan {} node(s) caught in a cycle: {}",
                    stuck.len(),
                    stuck
                        .iter()
                        .map(NodeId::as_str)
                        .collect::<Vec<_>>()
                        .join(", ")
                )));
            }

            // Use insertion order for determinism among equal candidates
            ready.sort_by_key(|id| self.graph.position(id).unwrap_or(usize::MAX));

            for id in &ready {
                in_degrees.remove(id);
                for next in self.unlocks(id, orientation) {
                    if let Some(degree) = in_degrees.get_mut(next) {
                        *degree = degree.saturating_sub(1);
                    }
                }
            }

            let nodes = ready
                .iter()
                .filter_map(|id| self.graph.node(id).cloned())
                .collect();
            levels.push(ExecutionLevel::new(levels.len(), nodes));
        }

        debug!(
            levels = levels.len(),
            nodes = members.len(),
            "built execution plan"
        );
        Ok(ExecutionPlan::new(levels))
    }
}
