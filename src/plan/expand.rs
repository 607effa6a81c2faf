use std::sync::Arc;

use tracing::debug;

use crate::errors::PlanError;
use crate::plan::case::{CaseId, TestCase, TestMethodState};
use crate::registry::TestRegistry;
use crate::registry::entry::{EntryKind, TestEntry};

/// Turn every registered entry into runnable cases.
///
/// Factory output comes first, one state per produced instance. Then each
/// top-level entry not claimed by a factory: functions and empty entries
/// give one case, classes give one case per method sharing a lazy state.
///
/// # Errors
///
/// Returns [`PlanError`] if a factory produces an instance of something
/// that is not a registered top-level class.
pub(crate) fn create_cases(registry: &TestRegistry) -> Result<Vec<TestCase>, PlanError> {
    let mut cases = Vec::new();

    for (factory_index, factory) in registry.factories().iter().enumerate() {
        for produced in factory() {
            let entry = registry.entry_for_home(&produced.home).ok_or_else(|| {
                PlanError::UnmarkedFactoryResult {
                    factory: factory_index,
                    home: produced.home.clone(),
                }
            })?;
            if entry.is_child() {
                return Err(PlanError::ChildReturnedByFactory {
                    factory: factory_index,
                    home: produced.home,
                });
            }
            if !entry.is_class() {
                return Err(PlanError::FactoryResultNotClass {
                    factory: factory_index,
                    home: produced.home,
                });
            }

            entry.mark_as_used_by_factory();
            let state = Arc::new(TestMethodState::bound(produced.home, produced.instance));
            push_methods(&mut cases, entry, &state);
            debug!(factory = factory_index, class = %state.class(), "expanded factory instance");
        }
    }

    for entry in registry.entries() {
        if entry.is_child() || entry.used_by_factory() {
            continue;
        }
        match entry.kind() {
            EntryKind::Class { constructor, .. } => {
                let Some(home) = entry.home() else { continue };
                let state = Arc::new(TestMethodState::new(home.clone(), constructor.clone()));
                push_methods(&mut cases, entry, &state);
            }
            _ => push_case(&mut cases, Arc::clone(entry), None),
        }
    }

    Ok(cases)
}

fn push_methods(cases: &mut Vec<TestCase>, class: &TestEntry, state: &Arc<TestMethodState>) {
    for child in class.children() {
        push_case(cases, Arc::clone(child), Some(Arc::clone(state)));
    }
}

fn push_case(cases: &mut Vec<TestCase>, entry: Arc<TestEntry>, state: Option<Arc<TestMethodState>>) {
    let id = CaseId(cases.len());
    cases.push(TestCase::new(id, entry, state));
}
