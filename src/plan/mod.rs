//! Sorted, filterable test plans built from a registry.

pub mod case;
pub mod chains;
pub(crate) mod expand;
pub mod failure;
pub mod filter;

use tracing::info;

use crate::errors::PlanError;
use crate::graph::{builder, traversal};
use crate::registry::TestRegistry;

pub use case::{CaseId, Dependent, TestCase, TestMethodState};
pub use chains::Chain;
pub use failure::Skip;
pub use filter::Selection;

/// Every case derived from a registry, plus the order to run them in.
///
/// `order` starts as a full topological sort of `cases`; filtering only
/// shrinks it. Cases that fall out of the order stay in `cases` so ids
/// remain stable.
#[derive(Debug, Clone)]
pub struct TestPlan {
    cases: Vec<TestCase>,
    order: Vec<CaseId>,
}

impl TestPlan {
    /// Expand, link and sort every entry of `registry`.
    ///
    /// # Errors
    ///
    /// Returns [`PlanError`] on unusable factory output or a dependency
    /// cycle.
    pub fn create(registry: &TestRegistry) -> Result<Self, PlanError> {
        let mut cases = expand::create_cases(registry)?;
        let graph = builder::build(registry.groups(), &mut cases);
        let order = traversal::sort(graph)?;
        info!(cases = order.len(), "created test plan");
        Ok(Self { cases, order })
    }

    pub(crate) fn from_parts(cases: Vec<TestCase>, order: Vec<CaseId>) -> Self {
        Self { cases, order }
    }

    /// Cases in run order.
    pub fn tests(&self) -> impl Iterator<Item = &TestCase> + '_ {
        self.order.iter().map(|id| &self.cases[id.0])
    }

    pub fn order(&self) -> &[CaseId] {
        &self.order
    }

    /// Look up a case by id.
    ///
    /// # Panics
    ///
    /// Panics if `id` belongs to a different plan.
    pub fn case(&self, id: CaseId) -> &TestCase {
        &self.cases[id.0]
    }

    /// Every case, including ones filtered out of the run order.
    pub fn cases(&self) -> &[TestCase] {
        &self.cases
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
