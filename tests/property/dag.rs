use std::collections::BTreeSet;

use proptest::prelude::*;
use tether::registry::TestRegistry;
use tether::registry::entry::TestEntryInfo;

/// Dependencies of one generated function, by index of earlier functions.
#[derive(Debug, Clone)]
pub struct Node {
    pub hard: BTreeSet<usize>,
    pub soft: BTreeSet<usize>,
}

pub fn name(index: usize) -> String {
    format!("f{index}")
}

// Acyclic by construction: function N may only depend on functions 0..N-1.
pub fn dag_strategy(max_nodes: usize) -> impl Strategy<Value = Vec<Node>> {
    (1..=max_nodes).prop_flat_map(|count| {
        proptest::collection::vec(
            (
                proptest::collection::vec(any::<usize>(), 0..3),
                proptest::collection::vec(any::<usize>(), 0..2),
            ),
            count,
        )
        .prop_map(|raw| {
            raw.into_iter()
                .enumerate()
                .map(|(i, (hard, soft))| {
                    let pick = |picks: Vec<usize>| -> BTreeSet<usize> {
                        if i == 0 {
                            BTreeSet::new()
                        } else {
                            picks.into_iter().map(|p| p % i).collect()
                        }
                    };
                    let hard = pick(hard);
                    let soft = pick(soft).difference(&hard).copied().collect();
                    Node { hard, soft }
                })
                .collect()
        })
    })
}

pub fn registry(nodes: &[Node]) -> TestRegistry {
    let mut reg = TestRegistry::new();
    for (i, node) in nodes.iter().enumerate() {
        let mut info = TestEntryInfo::new();
        for &dep in &node.hard {
            info = info.depends_on(name(dep));
        }
        for &dep in &node.soft {
            info = info.runs_after(name(dep));
        }
        reg.register_function(name(i), info)
            .expect("generated entries are valid");
    }
    reg
}
