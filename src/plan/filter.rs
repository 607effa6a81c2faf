use tracing::debug;

use crate::plan::TestPlan;
use crate::registry::entry::Home;

/// Which cases to keep when narrowing a plan.
///
/// A case is selected if it belongs to one of `groups`, or its home (or its
/// class's home) is in `classes` or `functions`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    pub groups: Vec<String>,
    pub classes: Vec<Home>,
    pub functions: Vec<Home>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn group(mut self, name: impl Into<String>) -> Self {
        self.groups.push(name.into());
        self
    }

    pub fn class(mut self, home: impl Into<Home>) -> Self {
        self.classes.push(home.into());
        self
    }

    pub fn function(mut self, home: impl Into<Home>) -> Self {
        self.functions.push(home.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty() && self.classes.is_empty() && self.functions.is_empty()
    }
}

impl TestPlan {
    /// Keep only the selected cases and everything they depend on.
    ///
    /// Walks the run order backwards so that a kept case's `depends_on` and
    /// `depends_on_groups` widen the selection before its dependencies are
    /// reached. Ordering-only (`runs_after`) links are not followed.
    pub fn filter(&mut self, selection: &Selection) {
        let mut group_names = selection.groups.clone();
        let mut homes: Vec<Home> = selection
            .classes
            .iter()
            .chain(&selection.functions)
            .cloned()
            .collect();

        let mut kept = Vec::with_capacity(self.order.len());
        for &id in self.order.iter().rev() {
            let entry = &self.cases[id.0].entry;
            if !entry.contains(&group_names, &homes) {
                continue;
            }
            kept.push(id);
            let info = entry.info();
            for group in &info.depends_on_groups {
                if !group_names.contains(group) {
                    group_names.push(group.clone());
                }
            }
            for home in &info.depends_on {
                if !homes.contains(home) {
                    homes.push(home.clone());
                }
            }
        }
        kept.reverse();

        debug!(
            before = self.order.len(),
            after = kept.len(),
            "filtered test plan"
        );
        self.order = kept;
    }
}
