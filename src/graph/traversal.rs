use std::collections::VecDeque;

use petgraph::Direction;
use petgraph::graph::NodeIndex;

use crate::errors::PlanError;
use crate::graph::analysis::find_cycle;
use crate::graph::builder::TestGraph;
use crate::plan::case::CaseId;

/// Order the cases so every case comes after everything it depends on.
/// The graph is consumed; build a new one for a new order.
///
/// Kahn's algorithm with a fixed tie-break: independent cases start in
/// creation order, and a case freed by the one just emitted jumps to the
/// front of the queue. The same registry therefore always sorts the same
/// way, and dependents tend to run right after what they need.
///
/// # Errors
///
/// Returns [`PlanError::DependencyCycle`] if some cases can never be freed.
pub fn sort(tg: TestGraph) -> Result<Vec<CaseId>, PlanError> {
    let mut remaining: Vec<usize> = tg
        .node_indices
        .iter()
        .map(|&n| tg.graph.neighbors_directed(n, Direction::Incoming).count())
        .collect();

    let mut queue: VecDeque<NodeIndex> = tg
        .node_indices
        .iter()
        .copied()
        .filter(|n| remaining[n.index()] == 0)
        .collect();
    let mut ordered = Vec::with_capacity(tg.node_indices.len());

    while let Some(node) = queue.pop_front() {
        ordered.push(tg.graph[node]);
        // newest edge first, so the earliest-declared dependent ends up in front
        for dependent in tg.graph.neighbors_directed(node, Direction::Outgoing) {
            let count = &mut remaining[dependent.index()];
            *count -= 1;
            if *count == 0 {
                queue.push_front(dependent);
            }
        }
    }

    if ordered.len() < tg.node_indices.len() {
        return Err(cycle_error(&tg, &remaining));
    }
    Ok(ordered)
}

fn cycle_error(tg: &TestGraph, remaining: &[usize]) -> PlanError {
    let members: Vec<String> = find_cycle(tg, remaining)
        .unwrap_or_else(|| {
            tg.node_indices
                .iter()
                .copied()
                .filter(|n| remaining[n.index()] > 0)
                .collect()
        })
        .into_iter()
        .map(|n| tg.label(n).to_owned())
        .collect();
    let case = members.first().cloned().unwrap_or_default();
    PlanError::DependencyCycle { case, members }
}
