use petgraph::algo::tarjan_scc;
use petgraph::graph::NodeIndex;

use crate::graph::builder::TestGraph;

/// Pick the dependency cycle to report once a sort stalls.
///
/// Looks at the strongly connected components of more than one case whose
/// members all still wait on a dependency (`remaining[n] > 0`), and returns
/// the one holding the earliest-created case. Members come back in creation
/// order, so the same registry always names the same cycle.
pub fn find_cycle(tg: &TestGraph, remaining: &[usize]) -> Option<Vec<NodeIndex>> {
    tarjan_scc(&tg.graph)
        .into_iter()
        .filter(|component| {
            component.len() > 1 && component.iter().all(|n| remaining[n.index()] > 0)
        })
        .map(|mut component| {
            component.sort();
            component
        })
        .min_by_key(|component| component[0])
}
