use std::any::Any;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use crate::registry::entry::{Home, TestEntry};
use crate::registry::target::{Constructor, Instance};

/// Index of a case inside its plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CaseId(pub(crate) usize);

impl CaseId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// A case that must run after the one holding this record.
///
/// `critical` dependents are skipped when this case fails; the others only
/// wait for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dependent {
    pub case: CaseId,
    pub critical: bool,
}

/// The class instance shared by sibling method cases.
///
/// Built lazily by whichever sibling runs first, unless a factory supplied
/// the instance up front.
pub struct TestMethodState {
    class: Home,
    constructor: Constructor,
    instance: Mutex<Option<Instance>>,
}

impl TestMethodState {
    pub(crate) fn new(class: Home, constructor: Constructor) -> Self {
        Self {
            class,
            constructor,
            instance: Mutex::new(None),
        }
    }

    /// State bound to an instance produced by a factory.
    pub(crate) fn bound(class: Home, instance: Instance) -> Self {
        Self {
            class,
            constructor: Constructor::default(),
            instance: Mutex::new(Some(instance)),
        }
    }

    pub fn class(&self) -> &Home {
        &self.class
    }

    pub fn is_instantiated(&self) -> bool {
        self.instance
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Run `f` against the instance, creating it first if needed.
    pub fn with_instance<R>(&self, f: impl FnOnce(&mut (dyn Any + Send)) -> R) -> R {
        let mut guard = self.instance.lock().unwrap_or_else(PoisonError::into_inner);
        let instance = guard.get_or_insert_with(|| self.constructor.build());
        f(instance.as_mut())
    }
}

impl fmt::Debug for TestMethodState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestMethodState")
            .field("class", &self.class)
            .field("instantiated", &self.is_instantiated())
            .finish()
    }
}

/// One executable instance of an entry, plus its runtime failure state.
#[derive(Debug, Clone)]
pub struct TestCase {
    pub(crate) id: CaseId,
    pub(crate) entry: Arc<TestEntry>,
    pub(crate) state: Option<Arc<TestMethodState>>,
    pub(crate) dependents: Vec<Dependent>,
    pub(crate) dependency_failure: Option<CaseId>,
}

impl TestCase {
    pub(crate) fn new(id: CaseId, entry: Arc<TestEntry>, state: Option<Arc<TestMethodState>>) -> Self {
        Self {
            id,
            entry,
            state,
            dependents: Vec::new(),
            dependency_failure: None,
        }
    }

    pub fn id(&self) -> CaseId {
        self.id
    }

    pub fn entry(&self) -> &TestEntry {
        &self.entry
    }

    pub fn home(&self) -> Option<&Home> {
        self.entry.home()
    }

    pub fn label(&self) -> String {
        self.entry.label()
    }

    pub fn state(&self) -> Option<&Arc<TestMethodState>> {
        self.state.as_ref()
    }

    pub fn dependents(&self) -> &[Dependent] {
        &self.dependents
    }

    /// The case whose failure this one inherited, if any.
    pub fn dependency_failure(&self) -> Option<CaseId> {
        self.dependency_failure
    }

    /// Enabled and backed by code (empty entries only order other cases).
    pub fn is_runnable(&self) -> bool {
        self.entry.info().is_enabled() && self.entry.home().is_some()
    }
}
