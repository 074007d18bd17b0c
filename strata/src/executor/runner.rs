//! Level runner shared by the forward and rollback executors
//!
//! Walks a plan level by level. Inside a level, nodes are attempted in
//! chunks of `max_concurrency`, each chunk driven by `join_all` on the
//! current task. A level is fully reconciled before the next one starts.
//! The first failure stops the run: nothing after the failing chunk is
//! attempted.

use super::config::ExecutorConfig;
use super::error::Result;
use super::listener::{ExecutionListener, ExecutionSummary, NodeFailure};
use crate::core::{ExecutionDirection, MigrationNode};
use crate::plan::ExecutionPlan;
use crate::storage::{ExecutionRecord, History};
use futures::future::join_all;
use std::sync::Arc;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn, Instrument};

pub(crate) const ALREADY_EXECUTED: &str = "already executed";
pub(crate) const NOT_EXECUTED: &str = "not executed";
pub(crate) const NO_DOWN_TASK: &str = "no down task";
pub(crate) const DRY_RUN: &str = "dry run";

/// What happened to one node
enum NodeOutcome {
    Executed,
    Skipped,
    Failed(NodeFailure),
}

pub(crate) struct LevelRunner<'a, H: History + ?Sized> {
    pub(crate) history: &'a H,
    pub(crate) listener: &'a dyn ExecutionListener,
    pub(crate) config: ExecutorConfig,
    pub(crate) cancellation: &'a CancellationToken,
    pub(crate) direction: ExecutionDirection,
}

impl<H: History + ?Sized> LevelRunner<'_, H> {
    /// Runs the plan and reports the summary through the listener
    ///
    /// History failures abort with an error and no summary.
    pub(crate) async fn run(&self, plan: &ExecutionPlan) -> Result<ExecutionSummary> {
        let span = tracing::info_span!(
            "migration_run",
            direction = %self.direction,
            levels = plan.level_count(),
            nodes = plan.total_nodes(),
        );
        self.run_levels(plan).instrument(span).await
    }

    async fn run_levels(&self, plan: &ExecutionPlan) -> Result<ExecutionSummary> {
        info!(dry_run = self.config.dry_run(), "run started");

        let mut executed = 0;
        let mut skipped = 0;
        let mut failure = None;
        let mut cancelled = false;

        'levels: for level in plan.levels() {
            debug!(level = level.index(), size = level.size(), "entering level");

            for chunk in level.nodes().chunks(self.config.max_concurrency()) {
                if self.cancellation.is_cancelled() {
                    warn!(level = level.index(), "run cancelled");
                    cancelled = true;
                    break 'levels;
                }

                let outcomes = join_all(chunk.iter().map(|node| self.attempt(node))).await;

                for outcome in outcomes {
                    match outcome? {
                        NodeOutcome::Executed => executed += 1,
                        NodeOutcome::Skipped => skipped += 1,
                        // Keep the first failure in plan order
                        NodeOutcome::Failed(node_failure) => {
                            failure.get_or_insert(node_failure);
                        }
                    }
                }

                if failure.is_some() {
                    break 'levels;
                }
            }
        }

        let summary = ExecutionSummary::new(
            self.direction,
            plan.total_nodes(),
            executed,
            skipped,
            failure,
            cancelled,
        );
        info!(
            executed = summary.executed_count(),
            skipped = summary.skipped_count(),
            success = summary.is_success(),
            "run finished"
        );
        self.listener.on_completed(&summary);
        Ok(summary)
    }

    async fn attempt(&self, node: &Arc<MigrationNode>) -> Result<NodeOutcome> {
        let span = tracing::debug_span!(
            "node",
            node.id = %node.id(),
            environment = %node.environment_id(),
        );
        async {
            match self.direction {
                ExecutionDirection::Forward => self.apply(node).await,
                ExecutionDirection::Reverse => self.revert(node).await,
            }
        }
        .instrument(span)
        .await
    }

    async fn apply(&self, node: &MigrationNode) -> Result<NodeOutcome> {
        if self
            .history
            .was_executed(node.id(), node.environment_id())
            .await?
        {
            return Ok(self.skip(node, ALREADY_EXECUTED));
        }
        if self.config.dry_run() {
            return Ok(self.skip(node, DRY_RUN));
        }

        let task = node.up_task();
        self.listener.on_node_started(node, self.direction);
        let started = Instant::now();

        match task.execute().await {
            Ok(output) => {
                let duration = started.elapsed();
                self.history
                    .record(ExecutionRecord::forward_success(
                        node.id().clone(),
                        node.environment_id().clone(),
                        task.description(),
                        output.into_serialized_undo(),
                        duration,
                    ))
                    .await?;
                info!(duration_ms = duration.as_millis() as u64, "node applied");
                self.listener
                    .on_node_succeeded(node, self.direction, duration);
                Ok(NodeOutcome::Executed)
            }
            Err(message) => {
                self.fail(node, task.description(), task.content(), message)
                    .await
            }
        }
    }

    async fn revert(&self, node: &MigrationNode) -> Result<NodeOutcome> {
        if !self
            .history
            .was_executed(node.id(), node.environment_id())
            .await?
        {
            return Ok(self.skip(node, NOT_EXECUTED));
        }
        let Some(task) = node.down_task() else {
            return Ok(self.skip(node, NO_DOWN_TASK));
        };
        if self.config.dry_run() {
            return Ok(self.skip(node, DRY_RUN));
        }

        self.listener.on_node_started(node, self.direction);
        let started = Instant::now();

        match task.execute().await {
            Ok(_) => {
                let duration = started.elapsed();
                self.history
                    .record(ExecutionRecord::reverse_success(
                        node.id().clone(),
                        node.environment_id().clone(),
                        task.description(),
                        duration,
                    ))
                    .await?;
                info!(duration_ms = duration.as_millis() as u64, "node rolled back");
                self.listener
                    .on_node_succeeded(node, self.direction, duration);
                Ok(NodeOutcome::Executed)
            }
            Err(message) => {
                self.fail(node, task.description(), task.content(), message)
                    .await
            }
        }
    }

    fn skip(&self, node: &MigrationNode, reason: &str) -> NodeOutcome {
        debug!(reason, "node skipped");
        self.listener.on_node_skipped(node, self.direction, reason);
        NodeOutcome::Skipped
    }

    async fn fail(
        &self,
        node: &MigrationNode,
        description: String,
        content: Option<String>,
        message: String,
    ) -> Result<NodeOutcome> {
        self.history
            .record(ExecutionRecord::failure(
                node.id().clone(),
                node.environment_id().clone(),
                self.direction,
                description,
                message.clone(),
            ))
            .await?;
        warn!(error = %message, "node failed");
        self.listener
            .on_node_failed(node, self.direction, content.as_deref(), &message);
        Ok(NodeOutcome::Failed(NodeFailure::new(
            node.id().clone(),
            message,
            content,
        )))
    }
}
