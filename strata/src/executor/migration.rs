use super::config::ExecutorConfig;
use super::error::{ExecutionError, Result};
use super::listener::{ExecutionListener, ExecutionSummary, PlanInfo};
use super::runner::LevelRunner;
use crate::core::{ExecutionDirection, NodeId};
use crate::graph::MigrationGraph;
use crate::plan::{ExecutionPlan, Planner};
use crate::storage::History;
use std::collections::BTreeSet;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Applies pending migrations
///
/// Nodes already applied according to the history are skipped, so running
/// the same targets twice executes each node at most once.
///
/// # Example
///
/// ```ignore
/// let executor = MigrationExecutor::new(&graph, history, Arc::new(TracingListener));
/// let targets = executor.determine_targets(None).await?;
/// executor.create_plan(&targets, false).await?;
/// let summary = executor.execute(&targets).await?;
/// assert!(summary.is_success());
/// ```
pub struct MigrationExecutor<'g, H: History + ?Sized> {
    graph: &'g MigrationGraph,
    history: Arc<H>,
    listener: Arc<dyn ExecutionListener>,
    config: ExecutorConfig,
    cancellation: CancellationToken,
}

impl<'g, H: History + ?Sized> MigrationExecutor<'g, H> {
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

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancellation
    }

    /// Nodes that still have to run
    ///
    /// With a target: the target and everything it transitively depends
    /// on. Without: the whole graph. Either way, nodes already applied are
    /// left out.
    pub async fn determine_targets(&self, target: Option<&NodeId>) -> Result<BTreeSet<NodeId>> {
        let candidates: BTreeSet<NodeId> = match target {
            Some(target) => {
                if !self.graph.contains(target) {
                    return Err(ExecutionError::UnknownTarget(target.to_string()));
                }
                let mut candidates = self.graph.all_dependencies_of(target);
                candidates.insert(target.clone());
                candidates
            }
            None => self.graph.node_ids().cloned().collect(),
        };

        let mut pending = BTreeSet::new();
        for id in candidates {
            let Some(node) = self.graph.node(&id) else {
                continue;
            };
            if !self.history.was_executed(&id, node.environment_id()).await? {
                pending.insert(id);
            }
        }

        debug!(pending = pending.len(), "determined migration targets");
        Ok(pending)
    }

    /// Builds the plan for `targets` and announces it to the listener
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

    /// Runs `targets` (plus their dependencies) in dependency order
    ///
    /// Stops at the first failing node; the failure is part of the returned
    /// summary, not an error.
    pub async fn execute(&self, targets: &BTreeSet<NodeId>) -> Result<ExecutionSummary> {
        let plan = self.plan(targets)?;

        LevelRunner {
            history: self.history.as_ref(),
            listener: self.listener.as_ref(),
            config: self.config,
            cancellation: &self.cancellation,
            direction: ExecutionDirection::Forward,
        }
        .run(&plan)
        .await
    }

    fn plan(&self, targets: &BTreeSet<NodeId>) -> Result<ExecutionPlan> {
        Ok(Planner::new(self.graph).plan_for_targets(targets)?)
    }
}

/// Every graph node the history reports as applied
pub(crate) async fn executed_nodes<H: History + ?Sized>(
    graph: &MigrationGraph,
    history: &H,
) -> Result<BTreeSet<NodeId>> {
    let mut executed = BTreeSet::new();
    for node in graph.nodes() {
        if history.was_executed(node.id(), node.environment_id()).await? {
            executed.insert(node.id().clone());
        }
    }
    Ok(executed)
}
