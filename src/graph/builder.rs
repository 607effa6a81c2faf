use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use petgraph::graph::{DiGraph, NodeIndex};
use tracing::{debug, warn};

use crate::plan::case::{CaseId, Dependent, TestCase};
use crate::registry::TestGroup;
use crate::registry::entry::Home;

/// How strongly a case is tied to one it runs after.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DependencyKind {
    /// From `depends_on` / `depends_on_groups`: failure propagates.
    Hard,
    /// From `runs_after` / `runs_after_groups`: ordering only.
    Soft,
}

/// Dependency graph over the cases of one plan.
///
/// Edges point from a dependency to its dependent, so a topological order
/// is a valid run order.
pub struct TestGraph {
    pub graph: DiGraph<CaseId, DependencyKind>,
    pub node_indices: Vec<NodeIndex>,
    pub labels: Vec<String>,
}

impl TestGraph {
    pub fn label(&self, node: NodeIndex) -> &str {
        &self.labels[self.graph[node].index()]
    }
}

/// Build the dependency graph for `cases`, recording each edge's dependent
/// on the dependency case as well.
pub fn build(groups: &HashMap<String, TestGroup>, cases: &mut [TestCase]) -> TestGraph {
    let mut graph = DiGraph::new();
    let node_indices: Vec<NodeIndex> = cases.iter().map(|c| graph.add_node(c.id)).collect();
    let labels = cases.iter().map(TestCase::label).collect();
    let mut tg = TestGraph {
        graph,
        node_indices,
        labels,
    };

    for index in 0..cases.len() {
        let entry = Arc::clone(&cases[index].entry);
        let info = entry.info();

        for group in &info.depends_on_groups {
            for dependency in nodes_for_group(groups, cases, group) {
                add_dependency(&mut tg, cases, index, dependency, DependencyKind::Hard);
            }
        }
        for home in &info.depends_on {
            for dependency in nodes_for_home(cases, home) {
                add_dependency(&mut tg, cases, index, dependency, DependencyKind::Hard);
            }
        }
        for group in &info.runs_after_groups {
            for dependency in nodes_for_group(groups, cases, group) {
                add_dependency(&mut tg, cases, index, dependency, DependencyKind::Soft);
            }
        }
        for home in &info.runs_after {
            for dependency in nodes_for_home(cases, home) {
                add_dependency(&mut tg, cases, index, dependency, DependencyKind::Soft);
            }
        }
    }

    debug!(
        nodes = tg.graph.node_count(),
        edges = tg.graph.edge_count(),
        "built dependency graph"
    );
    tg
}

fn nodes_for_group(groups: &HashMap<String, TestGroup>, cases: &[TestCase], name: &str) -> Vec<usize> {
    let Some(group) = groups.get(name) else {
        return Vec::new();
    };
    let members: HashSet<_> = group.entries.iter().copied().collect();
    cases
        .iter()
        .enumerate()
        .filter(|(_, case)| members.contains(&case.entry.id()))
        .map(|(index, _)| index)
        .collect()
}

fn nodes_for_home(cases: &[TestCase], home: &Home) -> Vec<usize> {
    let found: Vec<usize> = cases
        .iter()
        .enumerate()
        .filter(|(_, case)| case.entry.answers_to(home))
        .map(|(index, _)| index)
        .collect();
    if found.is_empty() {
        warn!(dependency = %home, "dependency matches no test case");
    }
    found
}

fn add_dependency(
    tg: &mut TestGraph,
    cases: &mut [TestCase],
    dependent: usize,
    dependency: usize,
    kind: DependencyKind,
) {
    if dependent == dependency {
        return;
    }
    let from = tg.node_indices[dependency];
    let to = tg.node_indices[dependent];
    let dependent_id = cases[dependent].id;

    match tg.graph.find_edge(from, to) {
        Some(edge) => {
            if kind == DependencyKind::Hard && tg.graph[edge] == DependencyKind::Soft {
                tg.graph[edge] = DependencyKind::Hard;
                for record in &mut cases[dependency].dependents {
                    if record.case == dependent_id {
                        record.critical = true;
                    }
                }
            }
        }
        None => {
            tg.graph.add_edge(from, to, kind);
            cases[dependency].dependents.push(Dependent {
                case: dependent_id,
                critical: kind == DependencyKind::Hard,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::expand::create_cases;
    use crate::registry::TestRegistry;
    use crate::registry::entry::TestEntryInfo;
    use crate::registry::target::TestClass;

    fn build_from(reg: &TestRegistry) -> (TestGraph, Vec<TestCase>) {
        let mut cases = create_cases(reg).expect("expand failed");
        let tg = build(reg.groups(), &mut cases);
        (tg, cases)
    }

    fn case_named<'a>(cases: &'a [TestCase], name: &str) -> &'a TestCase {
        cases.iter().find(|c| c.label() == name).unwrap()
    }

    #[test]
    fn builds_empty_graph() {
        let (tg, cases) = build_from(&TestRegistry::new());
        assert!(cases.is_empty());
        assert_eq!(tg.graph.node_count(), 0);
        assert_eq!(tg.graph.edge_count(), 0);
    }

    #[test]
    fn direct_dependency_adds_edge_and_dependent() {
        let mut reg = TestRegistry::new();
        reg.register_function("a", TestEntryInfo::new()).unwrap();
        reg.register_function("b", TestEntryInfo::new().depends_on("a"))
            .unwrap();
        let (tg, cases) = build_from(&reg);

        assert_eq!(tg.graph.edge_count(), 1);
        let a = case_named(&cases, "a");
        let b = case_named(&cases, "b");
        assert_eq!(
            a.dependents(),
            &[Dependent {
                case: b.id(),
                critical: true
            }]
        );
        assert!(b.dependents().is_empty());
    }

    #[test]
    fn group_dependency_fans_out() {
        let mut reg = TestRegistry::new();
        reg.register_function("s1", TestEntryInfo::new().group("setup"))
            .unwrap();
        reg.register_function("s2", TestEntryInfo::new().group("setup"))
            .unwrap();
        reg.register_function("t", TestEntryInfo::new().depends_on_group("setup"))
            .unwrap();
        let (tg, cases) = build_from(&reg);

        assert_eq!(tg.graph.edge_count(), 2);
        assert_eq!(case_named(&cases, "s1").dependents().len(), 1);
        assert_eq!(case_named(&cases, "s2").dependents().len(), 1);
    }

    #[test]
    fn class_home_resolves_to_every_method() {
        let mut reg = TestRegistry::new();
        let class = TestClass::new("C")
            .method("a", TestEntryInfo::new())
            .method("b", TestEntryInfo::new());
        reg.register_class(class, TestEntryInfo::new()).unwrap();
        reg.register_function("after", TestEntryInfo::new().depends_on_class("C"))
            .unwrap();
        let (tg, _) = build_from(&reg);
        assert_eq!(tg.graph.edge_count(), 2);
    }

    #[test]
    fn repeated_dependency_adds_one_edge() {
        let mut reg = TestRegistry::new();
        reg.register_function("a", TestEntryInfo::new().group("g"))
            .unwrap();
        reg.register_function(
            "b",
            TestEntryInfo::new().depends_on("a").depends_on_group("g"),
        )
        .unwrap();
        let (tg, cases) = build_from(&reg);
        assert_eq!(tg.graph.edge_count(), 1);
        assert_eq!(case_named(&cases, "a").dependents().len(), 1);
    }

    #[test]
    fn soft_edges_are_not_critical() {
        let mut reg = TestRegistry::new();
        reg.register_function("a", TestEntryInfo::new()).unwrap();
        reg.register_function("b", TestEntryInfo::new().runs_after("a"))
            .unwrap();
        let (tg, cases) = build_from(&reg);
        let edge = tg.graph.edge_indices().next().unwrap();
        assert_eq!(tg.graph[edge], DependencyKind::Soft);
        assert!(!case_named(&cases, "a").dependents()[0].critical);
    }

    #[test]
    fn hard_dependency_upgrades_soft_edge() {
        let mut reg = TestRegistry::new();
        reg.register_function("a", TestEntryInfo::new().group("g"))
            .unwrap();
        reg.register_function(
            "b",
            TestEntryInfo::new().runs_after("a").depends_on_group("g"),
        )
        .unwrap();
        let (tg, cases) = build_from(&reg);
        assert_eq!(tg.graph.edge_count(), 1);
        let edge = tg.graph.edge_indices().next().unwrap();
        assert_eq!(tg.graph[edge], DependencyKind::Hard);
        assert!(case_named(&cases, "a").dependents()[0].critical);
    }

    #[test]
    fn unknown_home_adds_nothing() {
        let mut reg = TestRegistry::new();
        reg.register_function("b", TestEntryInfo::new().depends_on("missing"))
            .unwrap();
        let (tg, _) = build_from(&reg);
        assert_eq!(tg.graph.edge_count(), 0);
    }

    #[test]
    fn own_group_in_runs_after_is_ignored() {
        let mut reg = TestRegistry::new();
        reg.register_function("a", TestEntryInfo::new().group("g").runs_after_group("g"))
            .unwrap();
        let (tg, _) = build_from(&reg);
        assert_eq!(tg.graph.edge_count(), 0);
    }

    #[test]
    fn labels_follow_case_order() {
        let mut reg = TestRegistry::new();
        reg.register_function("x", TestEntryInfo::new()).unwrap();
        reg.register_empty(TestEntryInfo::new()).unwrap();
        let (tg, _) = build_from(&reg);
        assert_eq!(tg.label(tg.node_indices[0]), "x");
        assert_eq!(tg.label(tg.node_indices[1]), "<empty>");
    }
}
