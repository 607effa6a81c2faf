use std::collections::{BTreeSet, HashMap};

use proptest::prelude::*;
use tether::plan::{Selection, TestCase, TestPlan};

use crate::dag::{dag_strategy, name, registry};

fn positions(plan: &TestPlan) -> HashMap<String, usize> {
    plan.tests()
        .enumerate()
        .map(|(i, case)| (case.label(), i))
        .collect()
}

proptest! {
    #[test]
    fn sort_places_dependencies_first(nodes in dag_strategy(12)) {
        let plan = registry(&nodes).get_test_plan().unwrap();
        let at = positions(&plan);
        prop_assert_eq!(at.len(), nodes.len());
        for (i, node) in nodes.iter().enumerate() {
            for dep in node.hard.iter().chain(&node.soft) {
                prop_assert!(at[&name(*dep)] < at[&name(i)], "{} before {}", name(*dep), name(i));
            }
        }
    }

    #[test]
    fn sort_is_deterministic(nodes in dag_strategy(12)) {
        let first: Vec<String> = registry(&nodes).get_test_plan().unwrap().tests().map(TestCase::label).collect();
        let second: Vec<String> = registry(&nodes).get_test_plan().unwrap().tests().map(TestCase::label).collect();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn filter_keeps_hard_dependencies_and_order(
        nodes in dag_strategy(12),
        picks in proptest::collection::vec(any::<usize>(), 1..3),
    ) {
        let full = registry(&nodes).get_test_plan().unwrap();
        let full_at = positions(&full);

        let mut selection = Selection::new();
        for pick in &picks {
            selection = selection.function(name(pick % nodes.len()));
        }
        let mut plan = registry(&nodes).get_test_plan().unwrap();
        plan.filter(&selection);
        let kept: BTreeSet<String> = plan.tests().map(TestCase::label).collect();

        for pick in &picks {
            prop_assert!(kept.contains(&name(pick % nodes.len())));
        }
        for (i, node) in nodes.iter().enumerate() {
            if kept.contains(&name(i)) {
                for dep in &node.hard {
                    prop_assert!(kept.contains(&name(*dep)), "{} kept without {}", name(i), name(*dep));
                }
            }
        }
        let kept_positions: Vec<usize> = plan.tests().map(|case| full_at[&case.label()]).collect();
        prop_assert!(kept_positions.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn failure_reaches_exactly_hard_descendants(
        nodes in dag_strategy(12),
        pick in any::<usize>(),
    ) {
        let failing = pick % nodes.len();
        let mut expected = BTreeSet::new();
        for (i, node) in nodes.iter().enumerate() {
            if node.hard.iter().any(|d| *d == failing || expected.contains(&name(*d))) {
                expected.insert(name(i));
            }
        }

        let mut plan = registry(&nodes).get_test_plan().unwrap();
        let id = plan.tests().find(|c| c.label() == name(failing)).map(TestCase::id).unwrap();
        plan.fail(id, None);

        let ids: Vec<_> = plan.order().to_vec();
        let mut skipped = BTreeSet::new();
        for id in ids {
            if let Err(skip) = plan.check_dependencies(id) {
                prop_assert_eq!(&skip.cause, &name(failing));
                skipped.insert(plan.case(id).label());
            }
        }
        prop_assert_eq!(skipped, expected);
    }
}
