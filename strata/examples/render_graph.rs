//! Print a graph in both directions, plus its Graphviz DOT form
//!
//! ```text
//! cargo run --example render_graph
//! ```

use strata::prelude::*;

struct Noop;

#[async_trait]
impl Task for Noop {
    async fn execute(&self) -> Result<TaskOutput, String> {
        Ok(TaskOutput::without_undo("ok"))
    }

    fn description(&self) -> String {
        "noop".to_string()
    }
}

fn add(
    graph: &mut MigrationGraph,
    env: &EnvironmentRef,
    name: &str,
    deps: &[&str],
) -> Result<(), Box<dyn std::error::Error>> {
    let mut builder =
        MigrationNode::builder(NodeId::new(name)?, name, env.clone(), Arc::new(Noop));
    for dep in deps {
        builder = builder.depends_on(NodeId::new(*dep)?);
    }
    graph.add_node(builder.build())?;
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let env = EnvironmentRef::new(EnvironmentId::new("dev")?, "Development");

    let mut graph = MigrationGraph::new();
    add(&mut graph, &env, "schema", &[])?;
    add(&mut graph, &env, "users", &["schema"])?;
    add(&mut graph, &env, "products", &["schema"])?;
    add(&mut graph, &env, "carts", &["schema"])?;
    add(&mut graph, &env, "orders", &["users", "products"])?;
    add(&mut graph, &env, "reports", &["orders", "carts", "schema"])?;

    let plan = Planner::new(&graph).plan()?;
    println!(
        "Apply order ({} levels, up to {} in parallel):",
        plan.level_count(),
        plan.max_parallelism()
    );
    print!("{}", GraphView::new(plan.nodes().cloned(), ExecutionDirection::Forward));

    let all: Vec<NodeId> = graph.node_ids().cloned().collect();
    let reverse = Planner::new(&graph).reverse_plan_for_targets(all.iter())?;
    println!("\nRollback order:");
    print!("{}", GraphView::new(reverse.nodes().cloned(), ExecutionDirection::Reverse));

    println!("\n{}", graph.to_dot());
    Ok(())
}
