//! Edge selection for the drawing
//!
//! Only edges that point further down the list are drawn, and an edge is
//! skipped when the child is already reachable through a sibling.

use crate::core::{ExecutionDirection, MigrationNode, NodeId};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

/// Children of every row after transitive reduction, ascending by row
pub(super) fn reduced_children(
    nodes: &[Arc<MigrationNode>],
    direction: ExecutionDirection,
) -> Vec<Vec<usize>> {
    let children = direct_children(nodes, direction);

    // Walk bottom-up so every child's descendant set is ready first
    let mut descendants: Vec<BTreeSet<usize>> = vec![BTreeSet::new(); nodes.len()];
    for i in (0..nodes.len()).rev() {
        let mut reach = BTreeSet::new();
        for &child in &children[i] {
            reach.insert(child);
            reach.extend(descendants[child].iter().copied());
        }
        descendants[i] = reach;
    }

    children
        .iter()
        .map(|kids| {
            kids.iter()
                .copied()
                .filter(|&child| {
                    !kids
                        .iter()
                        .any(|&other| other != child && descendants[other].contains(&child))
                })
                .collect()
        })
        .collect()
}

fn direct_children(
    nodes: &[Arc<MigrationNode>],
    direction: ExecutionDirection,
) -> Vec<BTreeSet<usize>> {
    let positions: HashMap<&NodeId, usize> = nodes
        .iter()
        .enumerate()
        .map(|(index, node)| (node.id(), index))
        .collect();

    let mut children = vec![BTreeSet::new(); nodes.len()];
    for (index, node) in nodes.iter().enumerate() {
        for dependency in node.dependencies() {
            let Some(&dep_index) = positions.get(dependency) else {
                continue;
            };
            match direction {
                // A dependency listed above feeds into this node
                ExecutionDirection::Forward if dep_index < index => {
                    children[dep_index].insert(index);
                }
                // Rolling back: this node leads to its dependency listed below
                ExecutionDirection::Reverse if dep_index > index => {
                    children[index].insert(dep_index);
                }
                _ => {}
            }
        }
    }
    children
}
