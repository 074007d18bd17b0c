//! Forward runs end to end: planning, idempotence, halting on failure.

mod common;

use common::*;
use std::collections::BTreeSet;
use std::sync::Arc;
use strata::executor::{CancellationToken, ExecutionError, ExecutorConfig, MigrationExecutor};
use strata::graph::MigrationGraph;
use strata::storage::{ExecutionStatus, History, InMemoryHistory};

fn fan_out(log: &Log) -> MigrationGraph {
    let mut graph = MigrationGraph::new();
    graph.add_node(migration("a", &[], log)).unwrap();
    graph.add_node(migration("b", &["a"], log)).unwrap();
    graph.add_node(migration("c", &["a"], log)).unwrap();
    graph
}

fn level_ids(levels: &[Vec<Arc<strata::MigrationNode>>]) -> Vec<Vec<String>> {
    levels
        .iter()
        .map(|level| level.iter().map(|n| n.id().to_string()).collect())
        .collect()
}

#[tokio::test]
async fn test_plan_groups_independent_nodes() {
    let log = new_log();
    let graph = fan_out(&log);
    let history = Arc::new(InMemoryHistory::new());
    let listener = Arc::new(RecordingListener::default());
    let executor = MigrationExecutor::new(&graph, history, listener.clone());

    let targets = executor.determine_targets(None).await.unwrap();
    let plan = executor.create_plan(&targets, true).await.unwrap();

    assert_eq!(level_ids(plan.levels()), vec![vec!["a"], vec!["b", "c"]]);
    assert_eq!(plan.total_nodes(), 3);
    assert_eq!(plan.pending_nodes(), 3);
    assert!(plan.is_dry_run());
    assert_eq!(listener.events(), vec!["plan:3"]);
    assert!(entries(&log).is_empty());
}

#[tokio::test]
async fn test_forward_run_applies_in_dependency_order() {
    let log = new_log();
    let graph = fan_out(&log);
    let history = Arc::new(InMemoryHistory::new());
    let listener = Arc::new(RecordingListener::default());
    let executor = MigrationExecutor::new(&graph, history.clone(), listener.clone());

    let targets = executor.determine_targets(None).await.unwrap();
    let summary = executor.execute(&targets).await.unwrap();

    assert!(summary.is_success());
    assert_eq!(summary.total_nodes(), 3);
    assert_eq!(summary.executed_count(), 3);
    assert_eq!(summary.skipped_count(), 0);
    assert_eq!(entries(&log), vec!["up:a", "up:b", "up:c"]);
    assert_eq!(
        listener.events(),
        vec![
            "started:a:UP",
            "succeeded:a:UP",
            "started:b:UP",
            "succeeded:b:UP",
            "started:c:UP",
            "succeeded:c:UP",
            "completed:true",
        ]
    );

    let record = history
        .find_latest_record(&id("b"), &dev_id())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(record.status(), ExecutionStatus::Success);
    assert_eq!(record.description(), "CREATE TABLE b");
    assert_eq!(record.serialized_undo(), Some("undo CREATE TABLE b"));
}

#[tokio::test]
async fn test_second_run_executes_nothing() {
    let log = new_log();
    let graph = fan_out(&log);
    let history = Arc::new(InMemoryHistory::new());
    let executor = MigrationExecutor::new(&graph, history, Arc::new(RecordingListener::default()));

    let all: BTreeSet<_> = graph.node_ids().cloned().collect();
    let first = executor.execute(&all).await.unwrap();
    assert_eq!(first.executed_count(), 3);

    let second = executor.execute(&all).await.unwrap();
    assert!(second.is_success());
    assert_eq!(second.executed_count(), 0);
    assert_eq!(second.skipped_count(), 3);
    assert_eq!(entries(&log).len(), 3);

    // Nothing left to pick once everything is applied
    assert!(executor.determine_targets(None).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_failure_halts_the_run() {
    let log = new_log();
    let mut graph = MigrationGraph::new();
    graph.add_node(migration("a", &[], &log)).unwrap();
    graph
        .add_node(failing_migration("b", &["a"], &log, "timeout"))
        .unwrap();
    graph.add_node(migration("c", &["a"], &log)).unwrap();
    graph.add_node(migration("d", &["b"], &log)).unwrap();

    let history = Arc::new(InMemoryHistory::new());
    let listener = Arc::new(RecordingListener::default());
    let executor = MigrationExecutor::new(&graph, history.clone(), listener.clone());

    let targets = executor.determine_targets(None).await.unwrap();
    let summary = executor.execute(&targets).await.unwrap();

    assert!(!summary.is_success());
    assert_eq!(summary.total_nodes(), 4);
    assert_eq!(summary.executed_count(), 1);
    assert_eq!(summary.skipped_count(), 0);
    assert_eq!(summary.failed_count(), 1);

    let failure = summary.failure().unwrap();
    assert_eq!(failure.node_id(), &id("b"));
    assert_eq!(failure.message(), "timeout");
    assert_eq!(failure.content(), Some("CREATE TABLE b"));

    // c shares b's level but is never attempted
    assert_eq!(entries(&log), vec!["up:a", "up:b"]);
    assert!(listener
        .events()
        .contains(&"failed:b:UP:CREATE TABLE b:timeout".to_string()));
    assert!(!listener.events().iter().any(|e| e.contains(":c:")));

    let record = history
        .find_latest_record(&id("b"), &dev_id())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(record.status(), ExecutionStatus::Failure);
    assert_eq!(record.error_message(), Some("timeout"));
    assert!(history
        .find_latest_record(&id("c"), &dev_id())
        .await
        .unwrap()
        .is_none());

    // A failed node stays pending
    let pending = executor.determine_targets(None).await.unwrap();
    assert_eq!(pending, BTreeSet::from([id("b"), id("c"), id("d")]));
}

#[tokio::test]
async fn test_target_pulls_in_pending_dependencies() {
    let log = new_log();
    let mut graph = fan_out(&log);
    graph.add_node(migration("d", &["b"], &log)).unwrap();

    let executor = MigrationExecutor::new(
        &graph,
        Arc::new(InMemoryHistory::new()),
        Arc::new(RecordingListener::default()),
    );

    let targets = executor.determine_targets(Some(&id("d"))).await.unwrap();
    assert_eq!(targets, BTreeSet::from([id("a"), id("b"), id("d")]));

    let summary = executor.execute(&targets).await.unwrap();
    assert_eq!(summary.executed_count(), 3);
    assert_eq!(entries(&log), vec!["up:a", "up:b", "up:d"]);
}

#[tokio::test]
async fn test_unknown_target_is_an_error() {
    let log = new_log();
    let graph = fan_out(&log);
    let executor = MigrationExecutor::new(
        &graph,
        Arc::new(InMemoryHistory::new()),
        Arc::new(RecordingListener::default()),
    );

    let result = executor.determine_targets(Some(&id("zz"))).await;
    assert_eq!(result, Err(ExecutionError::UnknownTarget("zz".to_string())));
}

#[tokio::test]
async fn test_cycle_fails_before_anything_runs() {
    let log = new_log();
    let mut graph = fan_out(&log);
    graph.add_dependency(&id("a"), &id("c")).unwrap();

    let executor = MigrationExecutor::new(
        &graph,
        Arc::new(InMemoryHistory::new()),
        Arc::new(RecordingListener::default()),
    );
    let all: BTreeSet<_> = graph.node_ids().cloned().collect();

    let result = executor.execute(&all).await;
    assert!(matches!(result, Err(ExecutionError::Graph(_))));
    assert!(entries(&log).is_empty());
}

#[tokio::test]
async fn test_cancelled_run_starts_nothing() {
    let log = new_log();
    let graph = fan_out(&log);
    let token = CancellationToken::new();
    let listener = Arc::new(RecordingListener::default());
    let executor = MigrationExecutor::new(&graph, Arc::new(InMemoryHistory::new()), listener.clone())
        .with_cancellation(token.clone());

    token.cancel();
    let targets = executor.determine_targets(None).await.unwrap();
    let summary = executor.execute(&targets).await.unwrap();

    assert!(summary.is_cancelled());
    assert!(!summary.is_success());
    assert_eq!(summary.executed_count(), 0);
    assert!(entries(&log).is_empty());
    assert_eq!(listener.events(), vec!["completed:false"]);
}

#[tokio::test]
async fn test_dry_run_touches_nothing() {
    let log = new_log();
    let graph = fan_out(&log);
    let history = Arc::new(InMemoryHistory::new());
    let executor = MigrationExecutor::new(&graph, history.clone(), Arc::new(RecordingListener::default()))
        .with_config(ExecutorConfig::default().with_dry_run(true));

    let targets = executor.determine_targets(None).await.unwrap();
    let summary = executor.execute(&targets).await.unwrap();

    assert!(summary.is_success());
    assert_eq!(summary.skipped_count(), 3);
    assert!(entries(&log).is_empty());
    assert!(history.is_empty());
}

#[tokio::test]
async fn test_concurrent_level_reconciles_before_next() {
    let log = new_log();
    let mut graph = fan_out(&log);
    graph.add_node(migration("d", &["b", "c"], &log)).unwrap();

    let executor = MigrationExecutor::new(
        &graph,
        Arc::new(InMemoryHistory::new()),
        Arc::new(RecordingListener::default()),
    )
    .with_config(ExecutorConfig::default().with_max_concurrency(4));

    let targets = executor.determine_targets(None).await.unwrap();
    let summary = executor.execute(&targets).await.unwrap();

    assert!(summary.is_success());
    assert_eq!(summary.executed_count(), 4);

    let order = entries(&log);
    assert_eq!(order.first().map(String::as_str), Some("up:a"));
    assert_eq!(order.last().map(String::as_str), Some("up:d"));
}
