use super::id::{EnvironmentId, NodeId};
use super::task::Task;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

/// Reference to the environment a node targets
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EnvironmentRef {
    id: EnvironmentId,
    name: String,
}

impl EnvironmentRef {
    pub fn new(id: EnvironmentId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }

    pub fn id(&self) -> &EnvironmentId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// One migration step.
///
/// Immutable once built. The declared dependency set is what the node was
/// configured with; edges added later through
/// [`MigrationGraph::add_dependency`](crate::graph::MigrationGraph::add_dependency)
/// live in the graph, not here.
#[derive(Clone)]
pub struct MigrationNode {
    id: NodeId,
    name: String,
    description: Option<String>,
    environment: EnvironmentRef,
    dependencies: BTreeSet<NodeId>,
    up_task: Arc<dyn Task>,
    down_task: Option<Arc<dyn Task>>,
}

impl MigrationNode {
    /// Starts building a node with its mandatory parts
    pub fn builder(
        id: NodeId,
        name: impl Into<String>,
        environment: EnvironmentRef,
        up_task: Arc<dyn Task>,
    ) -> MigrationNodeBuilder {
        MigrationNodeBuilder {
            id,
            name: name.into(),
            description: None,
            environment,
            dependencies: BTreeSet::new(),
            up_task,
            down_task: None,
        }
    }

    pub fn id(&self) -> &NodeId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn environment(&self) -> &EnvironmentRef {
        &self.environment
    }

    /// Shortcut for `environment().id()`
    pub fn environment_id(&self) -> &EnvironmentId {
        &self.environment.id
    }

    pub fn dependencies(&self) -> &BTreeSet<NodeId> {
        &self.dependencies
    }

    pub fn has_no_dependencies(&self) -> bool {
        self.dependencies.is_empty()
    }

    pub fn up_task(&self) -> &Arc<dyn Task> {
        &self.up_task
    }

    pub fn down_task(&self) -> Option<&Arc<dyn Task>> {
        self.down_task.as_ref()
    }
}

impl fmt::Debug for MigrationNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MigrationNode")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("environment", &self.environment.id)
            .field("dependencies", &self.dependencies)
            .field("has_down_task", &self.down_task.is_some())
            .finish()
    }
}

/// Builder for [`MigrationNode`]
pub struct MigrationNodeBuilder {
    id: NodeId,
    name: String,
    description: Option<String>,
    environment: EnvironmentRef,
    dependencies: BTreeSet<NodeId>,
    up_task: Arc<dyn Task>,
    down_task: Option<Arc<dyn Task>>,
}

impl MigrationNodeBuilder {
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Declares that this node must run after `dependency`
    pub fn depends_on(mut self, dependency: NodeId) -> Self {
        self.dependencies.insert(dependency);
        self
    }

    pub fn depends_on_all(mut self, dependencies: impl IntoIterator<Item = NodeId>) -> Self {
        self.dependencies.extend(dependencies);
        self
    }

    pub fn down(mut self, down_task: Arc<dyn Task>) -> Self {
        self.down_task = Some(down_task);
        self
    }

    pub fn build(self) -> MigrationNode {
        MigrationNode {
            id: self.id,
            name: self.name,
            description: self.description,
            environment: self.environment,
            dependencies: self.dependencies,
            up_task: self.up_task,
            down_task: self.down_task,
        }
    }
}
