//! Apply, inspect and roll back a small schema against a SQLite history
//!
//! ```text
//! users ──┬── orders ──┐
//!         │            ├── reports
//!         └── audit ───┘
//! ```
//!
//! Run with `RUST_LOG=strata=debug cargo run --example migrate_sqlite` to see
//! the executor's own tracing output next to the listener events.

use std::time::Duration;
use strata::prelude::*;
use tracing_subscriber::EnvFilter;

/// Pretends to run a SQL statement
struct Sql {
    statement: String,
    undo: Option<String>,
}

#[async_trait]
impl Task for Sql {
    async fn execute(&self) -> Result<TaskOutput, String> {
        tokio::time::sleep(Duration::from_millis(20)).await;
        Ok(match &self.undo {
            Some(undo) => TaskOutput::with_undo("ok", undo.clone()),
            None => TaskOutput::without_undo("ok"),
        })
    }

    fn description(&self) -> String {
        self.statement.clone()
    }

    fn content(&self) -> Option<String> {
        Some(self.statement.clone())
    }
}

fn table(
    env: &EnvironmentRef,
    name: &str,
    deps: &[&str],
) -> Result<MigrationNode, Box<dyn std::error::Error>> {
    let mut builder = MigrationNode::builder(
        NodeId::new(name)?,
        format!("create {name}"),
        env.clone(),
        Arc::new(Sql {
            statement: format!("CREATE TABLE {name}"),
            undo: Some(format!("DROP TABLE {name}")),
        }),
    )
    .down(Arc::new(Sql {
        statement: format!("DROP TABLE {name}"),
        undo: None,
    }));
    for dep in deps {
        builder = builder.depends_on(NodeId::new(*dep)?);
    }
    Ok(builder.build())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let dev = EnvironmentRef::new(EnvironmentId::new("dev")?, "Development");
    let mut graph = MigrationGraph::new();
    graph.add_node(table(&dev, "users", &[])?)?;
    graph.add_node(table(&dev, "orders", &["users"])?)?;
    graph.add_node(table(&dev, "audit", &["users"])?)?;
    graph.add_node(table(&dev, "reports", &["orders", "audit"])?)?;
    graph.validate().into_result()?;

    let dir = tempfile::tempdir()?;
    let history = Arc::new(SqliteHistory::new(dir.path().join("history.db")).await?);

    // Apply everything
    let executor = MigrationExecutor::new(&graph, history.clone(), Arc::new(TracingListener))
        .with_config(ExecutorConfig::default().with_max_concurrency(2));
    let targets = executor.determine_targets(None).await?;
    let plan = executor.create_plan(&targets, false).await?;
    println!("\nPlan ({} pending):", plan.pending_nodes());
    let view = GraphView::new(plan.levels().iter().flatten().cloned(), ExecutionDirection::Forward);
    print!("{view}");

    let summary = executor.execute(&targets).await?;
    println!(
        "\nApplied: {} executed, {} skipped, success = {}",
        summary.executed_count(),
        summary.skipped_count(),
        summary.is_success()
    );

    // Roll back orders and everything on top of it
    let rollback = RollbackExecutor::new(&graph, history.clone(), Arc::new(TracingListener));
    let undo = rollback
        .determine_rollback_targets(Some(&NodeId::new("orders")?), false)
        .await?;
    let plan = rollback.create_plan(&undo, false).await?;
    println!("\nRollback plan:");
    let view = GraphView::new(plan.levels().iter().flatten().cloned(), ExecutionDirection::Reverse);
    print!("{view}");
    rollback.execute(&undo).await?;

    // Final status
    let report = StatusService::new(&graph, history).status().await?;
    println!("\nStatus ({} of {} applied):", report.executed_count(), report.total_count());
    for status in report.nodes() {
        let marker = if status.is_executed() { "[x]" } else { "[ ]" };
        println!("  {marker} {}", status.node().id());
    }

    Ok(())
}
