//! Shared fixtures: tasks and a listener that write what happened into a
//! shared log.

#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use strata::core::{
    EnvironmentId, EnvironmentRef, ExecutionDirection, MigrationNode, NodeId, Task, TaskOutput,
};
use strata::executor::{ExecutionListener, ExecutionSummary, PlanInfo};

pub type Log = Arc<Mutex<Vec<String>>>;

pub fn new_log() -> Log {
    Arc::new(Mutex::new(Vec::new()))
}

pub fn entries(log: &Log) -> Vec<String> {
    log.lock().unwrap().clone()
}

pub fn id(value: &str) -> NodeId {
    NodeId::new(value).unwrap()
}

pub fn dev() -> EnvironmentRef {
    EnvironmentRef::new(EnvironmentId::new("dev").unwrap(), "Development")
}

pub fn dev_id() -> EnvironmentId {
    dev().id().clone()
}

/// Task that appends its label to the log and returns a scripted result
pub struct RecordingTask {
    label: String,
    sql: String,
    log: Log,
    error: Option<String>,
}

impl RecordingTask {
    pub fn ok(label: impl Into<String>, sql: impl Into<String>, log: &Log) -> Self {
        Self {
            label: label.into(),
            sql: sql.into(),
            log: Arc::clone(log),
            error: None,
        }
    }

    pub fn failing(label: impl Into<String>, sql: impl Into<String>, log: &Log, error: &str) -> Self {
        Self {
            error: Some(error.to_string()),
            ..Self::ok(label, sql, log)
        }
    }
}

#[async_trait]
impl Task for RecordingTask {
    async fn execute(&self) -> Result<TaskOutput, String> {
        tokio::time::sleep(Duration::from_millis(1)).await;
        self.log.lock().unwrap().push(self.label.clone());
        match &self.error {
            Some(error) => Err(error.clone()),
            None => Ok(TaskOutput::with_undo(
                format!("{} done", self.label),
                format!("undo {}", self.sql),
            )),
        }
    }

    fn description(&self) -> String {
        self.sql.clone()
    }

    fn content(&self) -> Option<String> {
        Some(self.sql.clone())
    }
}

/// Node `name` with recording up/down tasks labelled `up:name` / `down:name`
pub fn migration(name: &str, deps: &[&str], log: &Log) -> MigrationNode {
    MigrationNode::builder(
        id(name),
        format!("create {name}"),
        dev(),
        Arc::new(RecordingTask::ok(
            format!("up:{name}"),
            format!("CREATE TABLE {name}"),
            log,
        )),
    )
    .depends_on_all(deps.iter().map(|dep| id(dep)))
    .down(Arc::new(RecordingTask::ok(
        format!("down:{name}"),
        format!("DROP TABLE {name}"),
        log,
    )))
    .build()
}

/// Node whose up task fails with `error`
pub fn failing_migration(name: &str, deps: &[&str], log: &Log, error: &str) -> MigrationNode {
    MigrationNode::builder(
        id(name),
        format!("create {name}"),
        dev(),
        Arc::new(RecordingTask::failing(
            format!("up:{name}"),
            format!("CREATE TABLE {name}"),
            log,
            error,
        )),
    )
    .depends_on_all(deps.iter().map(|dep| id(dep)))
    .build()
}

/// Node whose up task succeeds and whose down task fails with `error`
pub fn failing_down_migration(name: &str, deps: &[&str], log: &Log, error: &str) -> MigrationNode {
    MigrationNode::builder(
        id(name),
        format!("create {name}"),
        dev(),
        Arc::new(RecordingTask::ok(
            format!("up:{name}"),
            format!("CREATE TABLE {name}"),
            log,
        )),
    )
    .depends_on_all(deps.iter().map(|dep| id(dep)))
    .down(Arc::new(RecordingTask::failing(
        format!("down:{name}"),
        format!("DROP TABLE {name}"),
        log,
        error,
    )))
    .build()
}

/// Listener that writes one line per event
#[derive(Default)]
pub struct RecordingListener {
    events: Mutex<Vec<String>>,
}

impl RecordingListener {
    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }

    fn push(&self, event: String) {
        self.events.lock().unwrap().push(event);
    }
}

impl ExecutionListener for RecordingListener {
    fn on_plan_created(&self, plan: &PlanInfo) {
        self.push(format!("plan:{}", plan.total_nodes()));
    }

    fn on_node_started(&self, node: &MigrationNode, direction: ExecutionDirection) {
        self.push(format!("started:{}:{}", node.id(), direction));
    }

    fn on_node_succeeded(
        &self,
        node: &MigrationNode,
        direction: ExecutionDirection,
        _duration: Duration,
    ) {
        self.push(format!("succeeded:{}:{}", node.id(), direction));
    }

    fn on_node_skipped(&self, node: &MigrationNode, direction: ExecutionDirection, reason: &str) {
        self.push(format!("skipped:{}:{}:{}", node.id(), direction, reason));
    }

    fn on_node_failed(
        &self,
        node: &MigrationNode,
        direction: ExecutionDirection,
        content: Option<&str>,
        message: &str,
    ) {
        self.push(format!(
            "failed:{}:{}:{}:{}",
            node.id(),
            direction,
            content.unwrap_or("-"),
            message
        ));
    }

    fn on_completed(&self, summary: &ExecutionSummary) {
        self.push(format!("completed:{}", summary.is_success()));
    }
}
