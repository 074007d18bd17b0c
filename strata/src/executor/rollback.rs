use super::config::ExecutorConfig;
use super::error::{ExecutionError, Result};
use super::listener::{ExecutionListener, ExecutionSummary, PlanInfo};
use super::migration::executed_nodes;
use super::runner::LevelRunner;
use crate::core::{ExecutionDirection, NodeId};
use crate::graph::MigrationGraph;
use crate::plan::{ExecutionPlan, Planner};
use crate::storage::History;
use std::collections::BTreeSet;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Undoes applied migrations, most dependent first
///
/// Nodes that are not applied, or have no down task, are skipped. A
/// successful rollback is recorded as a reverse run, after which the node
/// counts as pending again.
pub struct RollbackExecutor<'g, H: History + ?Sized> {
    graph: &'g MigrationGraph,
    history: Arc<H>,
    listener: Arc<dyn ExecutionListener>,
    config: ExecutorConfig,
    cancellation: CancellationToken,
}

impl<'g, H: History + ?Sized> RollbackExecutor<'g, H> {
    pub fn new(
        graph: &'g MigrationGraph,
        history: Arc<H>,
        listener: Arc<dyn ExecutionListener>,
    ) -> Self {
        Self {
            graph,
            history,
            listener,
            config: ExecutorConfig::default(),
            cancellation: CancellationToken::new(),
        }
    }

    pub fn with_config(mut self, config: ExecutorConfig) -> Self {
        self.config = config;
        self
    }

    /// Uses `token` to stop the run before the next node starts.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    /// Nodes to roll back
    ///
    /// `all` selects every applied node. Otherwise a target selects itself
    /// and everything that transitively depends on it, restricted to
    /// applied nodes. Neither gives an empty set.
    pub async fn determine_rollback_targets(
        &self,
        target: Option<&NodeId>,
        all: bool,
    ) -> Result<BTreeSet<NodeId>> {
        if all {
            return executed_nodes(self.graph, self.history.as_ref()).await;
        }

        let Some(target) = target else {
            return Ok(BTreeSet::new());
        };
        if !self.graph.contains(target) {
            return Err(ExecutionError::UnknownTarget(target.to_string()));
        }

        let mut candidates = self.graph.all_dependents_of(target);
        candidates.insert(target.clone());

        let mut applied = BTreeSet::new();
        for id in candidates {
            let Some(node) = self.graph.node(&id) else {
                continue;
            };
            if self.history.was_executed(&id, node.environment_id()).await? {
                applied.insert(id);
            }
        }

        debug!(targets = applied.len(), "determined rollback targets");
        Ok(applied)
    }

    /// Builds the reverse plan for `targets` and announces it to the listener
    pub async fn create_plan(&self, targets: &BTreeSet<NodeId>, dry_run: bool) -> Result<PlanInfo> {
        let plan = self.plan(targets)?;
        let executed = executed_nodes(self.graph, self.history.as_ref()).await?;

        let info = PlanInfo::new(
            plan.levels()
                .iter()
                .map(|level| level.nodes().to_vec())
                .collect(),
            executed,
            dry_run,
        );
        self.listener.on_plan_created(&info);
        Ok(info)
    }

    /// Rolls back exactly `targets`, dependents before their dependencies
    pub async fn execute(&self, targets: &BTreeSet<NodeId>) -> Result<ExecutionSummary> {
        let plan = self.plan(targets)?;

        LevelRunner {
            history: self.history.as_ref(),
            listener: self.listener.as_ref(),
            config: self.config,
            cancellation: &self.cancellation,
            direction: ExecutionDirection::Reverse,
        }
        .run(&plan)
        .await
    }

    fn plan(&self, targets: &BTreeSet<NodeId>) -> Result<ExecutionPlan> {
        Ok(Planner::new(self.graph).reverse_plan_for_targets(targets)?)
    }
}
