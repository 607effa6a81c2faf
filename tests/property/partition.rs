use std::collections::{BTreeSet, HashMap};

use proptest::prelude::*;
use tether::plan::chains::partition;

use crate::dag::{Node, dag_strategy, name, registry};

// Reference components by repeated relabelling.
fn components(nodes: &[Node]) -> usize {
    let mut label: Vec<usize> = (0..nodes.len()).collect();
    let mut changed = true;
    while changed {
        changed = false;
        for (i, node) in nodes.iter().enumerate() {
            for &dep in node.hard.iter().chain(&node.soft) {
                let low = label[i].min(label[dep]);
                if label[i] != low || label[dep] != low {
                    label[i] = low;
                    label[dep] = low;
                    changed = true;
                }
            }
        }
    }
    label.into_iter().collect::<BTreeSet<_>>().len()
}

proptest! {
    #[test]
    fn every_case_lands_in_exactly_one_chain(nodes in dag_strategy(14)) {
        let plan = registry(&nodes).get_test_plan().unwrap();
        let chains = partition(&plan);
        let mut seen = BTreeSet::new();
        for chain in &chains {
            for &id in chain.cases() {
                prop_assert!(seen.insert(plan.case(id).label()));
            }
        }
        prop_assert_eq!(seen.len(), nodes.len());
    }

    #[test]
    fn linked_cases_share_a_chain(nodes in dag_strategy(14)) {
        let plan = registry(&nodes).get_test_plan().unwrap();
        let chains = partition(&plan);
        let chain_of: HashMap<String, usize> = chains
            .iter()
            .enumerate()
            .flat_map(|(index, chain)| chain.cases().iter().map(move |&id| (id, index)))
            .map(|(id, index)| (plan.case(id).label(), index))
            .collect();
        for (i, node) in nodes.iter().enumerate() {
            for dep in node.hard.iter().chain(&node.soft) {
                prop_assert_eq!(chain_of[&name(i)], chain_of[&name(*dep)]);
            }
        }
        prop_assert_eq!(chains.len(), components(&nodes));
    }

    #[test]
    fn chains_keep_plan_order(nodes in dag_strategy(14)) {
        let plan = registry(&nodes).get_test_plan().unwrap();
        let at: HashMap<_, usize> = plan.order().iter().enumerate().map(|(i, &id)| (id, i)).collect();
        let chains = partition(&plan);
        for chain in &chains {
            let positions: Vec<usize> = chain.cases().iter().map(|id| at[id]).collect();
            prop_assert!(positions.windows(2).all(|w| w[0] < w[1]));
        }
        let heads: Vec<usize> = chains.iter().map(|c| at[&c.cases()[0]]).collect();
        prop_assert!(heads.windows(2).all(|w| w[0] < w[1]));
    }
}
