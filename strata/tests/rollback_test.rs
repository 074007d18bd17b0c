//! Rollback runs end to end.

mod common;

use common::*;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;
use strata::core::{ExecutionDirection, MigrationNode};
use strata::executor::{MigrationExecutor, NoopListener, RollbackExecutor};
use strata::graph::MigrationGraph;
use strata::storage::{ExecutionRecord, ExecutionStatus, History, InMemoryHistory};

/// a <- b <- c
fn chain(log: &Log) -> MigrationGraph {
    let mut graph = MigrationGraph::new();
    graph.add_node(migration("a", &[], log)).unwrap();
    graph.add_node(migration("b", &["a"], log)).unwrap();
    graph.add_node(migration("c", &["b"], log)).unwrap();
    graph
}

async fn mark_applied(history: &InMemoryHistory, names: &[&str]) {
    for name in names {
        history
            .record(ExecutionRecord::forward_success(
                id(name),
                dev_id(),
                format!("CREATE TABLE {name}"),
                None,
                Duration::ZERO,
            ))
            .await
            .unwrap();
    }
}

#[tokio::test]
async fn test_rollback_runs_dependents_first() {
    let log = new_log();
    let graph = chain(&log);
    let history = Arc::new(InMemoryHistory::new());
    mark_applied(&history, &["a", "b", "c"]).await;

    let listener = Arc::new(RecordingListener::default());
    let executor = RollbackExecutor::new(&graph, history.clone(), listener.clone());

    let targets = executor
        .determine_rollback_targets(Some(&id("b")), false)
        .await
        .unwrap();
    assert_eq!(targets, BTreeSet::from([id("b"), id("c")]));

    let plan = executor.create_plan(&targets, false).await.unwrap();
    let levels: Vec<Vec<String>> = plan
        .levels()
        .iter()
        .map(|level| level.iter().map(|n| n.id().to_string()).collect())
        .collect();
    assert_eq!(levels, vec![vec!["c"], vec!["b"]]);

    let summary = executor.execute(&targets).await.unwrap();
    assert!(summary.is_success());
    assert_eq!(summary.executed_count(), 2);
    assert_eq!(summary.skipped_count(), 0);
    assert_eq!(entries(&log), vec!["down:c", "down:b"]);
    assert_eq!(
        listener.events(),
        vec![
            "plan:2",
            "started:c:DOWN",
            "succeeded:c:DOWN",
            "started:b:DOWN",
            "succeeded:b:DOWN",
            "completed:true",
        ]
    );

    assert!(history.was_executed(&id("a"), &dev_id()).await.unwrap());
    assert!(!history.was_executed(&id("b"), &dev_id()).await.unwrap());
    assert!(!history.was_executed(&id("c"), &dev_id()).await.unwrap());
}

#[tokio::test]
async fn test_rollback_all_selects_every_applied_node() {
    let log = new_log();
    let graph = chain(&log);
    let history = Arc::new(InMemoryHistory::new());
    mark_applied(&history, &["a", "b"]).await;

    let executor = RollbackExecutor::new(&graph, history, Arc::new(NoopListener));
    let targets = executor.determine_rollback_targets(None, true).await.unwrap();
    assert_eq!(targets, BTreeSet::from([id("a"), id("b")]));

    executor.execute(&targets).await.unwrap();
    assert_eq!(entries(&log), vec!["down:b", "down:a"]);
}

#[tokio::test]
async fn test_no_selection_means_empty_rollback() {
    let log = new_log();
    let graph = chain(&log);
    let history = Arc::new(InMemoryHistory::new());
    mark_applied(&history, &["a"]).await;

    let executor = RollbackExecutor::new(&graph, history, Arc::new(NoopListener));
    let targets = executor.determine_rollback_targets(None, false).await.unwrap();
    assert!(targets.is_empty());

    let summary = executor.execute(&targets).await.unwrap();
    assert!(summary.is_success());
    assert_eq!(summary.total_nodes(), 0);
    assert!(entries(&log).is_empty());
}

#[tokio::test]
async fn test_unapplied_and_irreversible_nodes_are_skipped() {
    let log = new_log();
    let mut graph = chain(&log);
    let irreversible = MigrationNode::builder(
        id("seed"),
        "seed data",
        dev(),
        Arc::new(RecordingTask::ok("up:seed", "INSERT INTO a", &log)),
    )
    .depends_on(id("a"))
    .build();
    graph.add_node(irreversible).unwrap();

    let history = Arc::new(InMemoryHistory::new());
    mark_applied(&history, &["a", "seed"]).await;

    let listener = Arc::new(RecordingListener::default());
    let executor = RollbackExecutor::new(&graph, history, listener.clone());
    let targets = BTreeSet::from([id("c"), id("seed")]);
    let summary = executor.execute(&targets).await.unwrap();

    assert!(summary.is_success());
    assert_eq!(summary.executed_count(), 0);
    assert_eq!(summary.skipped_count(), 2);
    let events = listener.events();
    assert!(events.contains(&"skipped:c:DOWN:not executed".to_string()));
    assert!(events.contains(&"skipped:seed:DOWN:no down task".to_string()));
}

#[tokio::test]
async fn test_rolled_back_node_can_be_applied_again() {
    let log = new_log();
    let graph = chain(&log);
    let history = Arc::new(InMemoryHistory::new());
    let forward = MigrationExecutor::new(&graph, history.clone(), Arc::new(NoopListener));
    let rollback = RollbackExecutor::new(&graph, history.clone(), Arc::new(NoopListener));

    let targets = forward.determine_targets(None).await.unwrap();
    forward.execute(&targets).await.unwrap();

    let undo = rollback
        .determine_rollback_targets(Some(&id("c")), false)
        .await
        .unwrap();
    rollback.execute(&undo).await.unwrap();

    let pending = forward.determine_targets(None).await.unwrap();
    assert_eq!(pending, BTreeSet::from([id("c")]));

    let summary = forward.execute(&pending).await.unwrap();
    assert_eq!(summary.executed_count(), 1);
    assert_eq!(summary.skipped_count(), 2);
    assert_eq!(
        entries(&log),
        vec!["up:a", "up:b", "up:c", "down:c", "up:c"]
    );
}

#[tokio::test]
async fn test_rollback_failure_halts() {
    let log = new_log();
    let mut graph = MigrationGraph::new();
    graph.add_node(migration("a", &[], &log)).unwrap();
    graph.add_node(migration("b", &["a"], &log)).unwrap();
    graph
        .add_node(failing_down_migration("c", &["b"], &log, "locked"))
        .unwrap();

    let history = Arc::new(InMemoryHistory::new());
    mark_applied(&history, &["a", "b", "c"]).await;

    let listener = Arc::new(RecordingListener::default());
    let executor = RollbackExecutor::new(&graph, history.clone(), listener.clone());
    let targets = BTreeSet::from([id("b"), id("c")]);
    let summary = executor.execute(&targets).await.unwrap();

    assert!(!summary.is_success());
    assert_eq!(summary.executed_count(), 0);
    let failure = summary.failure().unwrap();
    assert_eq!(failure.node_id(), &id("c"));
    assert_eq!(failure.message(), "locked");
    assert_eq!(failure.content(), Some("DROP TABLE c"));

    assert_eq!(entries(&log), vec!["down:c"]);
    assert_eq!(
        listener.events(),
        vec![
            "started:c:DOWN",
            "failed:c:DOWN:DROP TABLE c:locked",
            "completed:false",
        ]
    );

    let latest = history
        .find_latest_record(&id("c"), &dev_id())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(latest.direction(), ExecutionDirection::Reverse);
    assert_eq!(latest.status(), ExecutionStatus::Failure);
    assert_eq!(latest.error_message(), Some("locked"));

    // b was never attempted and stays applied
    assert_eq!(history.records_for_node(&id("b"), &dev_id()).await.unwrap().len(), 1);
    assert!(history.was_executed(&id("b"), &dev_id()).await.unwrap());
}
