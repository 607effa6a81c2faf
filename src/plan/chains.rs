use std::collections::{HashMap, HashSet};

use petgraph::unionfind::UnionFind;
use tracing::debug;

use crate::plan::{CaseId, TestPlan};
use crate::registry::entry::Home;

/// A connected group of cases that can run apart from every other chain.
///
/// `cases` holds the runnable members in plan order. `members` also keeps
/// disabled cases and placeholders, which still link cases together.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Chain {
    cases: Vec<CaseId>,
    members: Vec<CaseId>,
}

impl Chain {
    pub fn cases(&self) -> &[CaseId] {
        &self.cases
    }

    pub fn members(&self) -> &[CaseId] {
        &self.members
    }

    /// First runnable case of the chain.
    pub fn head(&self) -> Option<CaseId> {
        self.cases.first().copied()
    }

    pub fn len(&self) -> usize {
        self.cases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cases.is_empty()
    }
}

/// Split the plan's run order into independent chains.
///
/// Two cases share a chain exactly when a dependency path of any kind links
/// them. Chains come back ordered by their earliest case; chains with
/// nothing runnable are dropped.
pub fn partition(plan: &TestPlan) -> Vec<Chain> {
    let order = plan.order();
    let position: HashMap<CaseId, usize> = order
        .iter()
        .enumerate()
        .map(|(index, &id)| (id, index))
        .collect();

    let mut sets = UnionFind::<usize>::new(order.len());
    for (index, &id) in order.iter().enumerate() {
        for dependent in plan.case(id).dependents() {
            if let Some(&other) = position.get(&dependent.case) {
                sets.union(index, other);
            }
        }
    }

    let mut chains: Vec<Chain> = Vec::new();
    let mut chain_for_root: HashMap<usize, usize> = HashMap::new();
    for (index, &id) in order.iter().enumerate() {
        let root = sets.find(index);
        let slot = *chain_for_root.entry(root).or_insert_with(|| {
            chains.push(Chain::default());
            chains.len() - 1
        });
        let chain = &mut chains[slot];
        chain.members.push(id);
        if plan.case(id).is_runnable() {
            chain.cases.push(id);
        }
    }
    chains.retain(|chain| !chain.is_empty());

    debug!(chains = chains.len(), "partitioned test plan");
    chains
}

/// How many workers could usefully run the plan at once.
pub fn best_chain_count(plan: &TestPlan) -> usize {
    partition(plan).len()
}

/// The head of every chain: a quick smoke run touching each independent area.
pub fn shallow(plan: &TestPlan) -> Vec<CaseId> {
    partition(plan).iter().filter_map(Chain::head).collect()
}

impl TestPlan {
    /// Keep only the chains holding a case that answers to one of `homes`.
    ///
    /// Returns how many chains survive. Used to re-run just the areas a
    /// previous run reported as failing.
    pub fn retain_chains(&mut self, homes: &[Home]) -> usize {
        let kept: Vec<Chain> = partition(self)
            .into_iter()
            .filter(|chain| {
                chain.members.iter().any(|&id| {
                    homes.iter().any(|home| self.cases[id.0].entry().answers_to(home))
                })
            })
            .collect();
        let keep: HashSet<CaseId> = kept
            .iter()
            .flat_map(|chain| chain.members.iter().copied())
            .collect();
        self.order.retain(|id| keep.contains(id));
        debug!(chains = kept.len(), cases = self.order.len(), "restricted plan to listed chains");
        kept.len()
    }

    /// Break the plan into one self-contained plan per chain.
    ///
    /// Each sub-plan carries its own cases, renumbered from zero, with
    /// dependent links and recorded failures translated. Class state stays
    /// shared, so sibling methods split across chains still see one instance.
    pub fn split_chains(self) -> Vec<TestPlan> {
        let chains = partition(&self);
        let mut slots: Vec<Option<_>> = self.cases.into_iter().map(Some).collect();

        chains
            .into_iter()
            .map(|chain| {
                let remap: HashMap<CaseId, CaseId> = chain
                    .members
                    .iter()
                    .enumerate()
                    .map(|(index, &old)| (old, CaseId(index)))
                    .collect();

                let cases: Vec<_> = chain
                    .members
                    .iter()
                    .enumerate()
                    .filter_map(|(index, old)| slots[old.0].take().map(|case| (index, case)))
                    .map(|(index, mut case)| {
                        case.id = CaseId(index);
                        case.dependents.retain_mut(|d| match remap.get(&d.case) {
                            Some(&new) => {
                                d.case = new;
                                true
                            }
                            None => false,
                        });
                        case.dependency_failure =
                            case.dependency_failure.and_then(|c| remap.get(&c).copied());
                        case
                    })
                    .collect();

                let order = (0..cases.len()).map(CaseId).collect();
                TestPlan::from_parts(cases, order)
            })
            .collect()
    }
}
