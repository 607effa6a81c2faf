pub mod entry;
pub mod target;

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::errors::{PlanError, RegistrationError};
use crate::plan::TestPlan;
use crate::registry::entry::{EntryId, EntryKind, Home, TestEntry, TestEntryInfo};
use crate::registry::target::{Factory, FactoryInstance, Target, TestClass};

/// A named bucket of entries, usable as a dependency target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestGroup {
    pub name: String,
    pub entries: Vec<EntryId>,
}

impl TestGroup {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            entries: Vec::new(),
        }
    }
}

/// Stores test entries, their groups and instance factories.
///
/// Entries are append-only; [`TestRegistry::reset`] wipes everything at once.
/// Methods are stored before the class that owns them.
#[derive(Default)]
pub struct TestRegistry {
    entries: Vec<Arc<TestEntry>>,
    groups: HashMap<String, TestGroup>,
    homes: HashMap<Home, EntryId>,
    factories: Vec<Factory>,
}

impl TestRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a target with its metadata.
    ///
    /// # Errors
    ///
    /// Returns [`RegistrationError`] if the target (or one of its methods) is
    /// already registered or any info breaks the structural rules. Nothing is
    /// recorded when an error is returned.
    pub fn register(
        &mut self,
        target: Target,
        info: TestEntryInfo,
    ) -> Result<EntryId, RegistrationError> {
        match target {
            Target::Empty => self.register_empty(info),
            Target::Function(home) => self.register_function(home, info),
            Target::Class(class) => self.register_class(class, info),
        }
    }

    /// Register an entry with no code, used to build groups of groups.
    ///
    /// # Errors
    ///
    /// Returns [`RegistrationError`] if `info` breaks the structural rules.
    pub fn register_empty(&mut self, info: TestEntryInfo) -> Result<EntryId, RegistrationError> {
        info.validate(None)?;
        Ok(self.push_entry(None, info, EntryKind::Empty))
    }

    /// Register a free-standing function.
    ///
    /// # Errors
    ///
    /// Returns [`RegistrationError`] on duplicates or invalid metadata.
    pub fn register_function(
        &mut self,
        home: impl Into<Home>,
        info: TestEntryInfo,
    ) -> Result<EntryId, RegistrationError> {
        let home = home.into();
        self.ensure_unregistered(&home)?;
        info.validate(Some(&home))?;
        Ok(self.push_entry(Some(home), info, EntryKind::Function))
    }

    /// Register a class and its methods.
    ///
    /// Every method inherits the class metadata. Methods flagged
    /// `before_class` become dependencies of their regular siblings, and
    /// `after_class` methods depend on every sibling that is not itself an
    /// after-class hook (ordering only, if they are `always_run`).
    ///
    /// # Errors
    ///
    /// Returns [`RegistrationError`] on duplicates or invalid metadata in the
    /// class or any method.
    pub fn register_class(
        &mut self,
        class: TestClass,
        info: TestEntryInfo,
    ) -> Result<EntryId, RegistrationError> {
        let TestClass {
            home,
            methods,
            constructor,
        } = class;

        self.ensure_unregistered(&home)?;
        info.validate(Some(&home))?;

        let mut seen = HashSet::new();
        let mut children: Vec<(Home, String, TestEntryInfo)> = Vec::with_capacity(methods.len());
        for method in methods {
            let method_home = Home::method(&home, &method.name);
            self.ensure_unregistered(&method_home)?;
            if !seen.insert(method_home.clone()) {
                return Err(RegistrationError::DuplicateRegistration { home: method_home });
            }
            if method.info.depends_on.contains(&home) || method.info.runs_after.contains(&home) {
                return Err(RegistrationError::SelfDependency { home: method_home });
            }
            let merged = method.info.inherit(&info);
            children.push((method_home, method.name, merged));
        }

        wire_class_hooks(&mut children);

        for (method_home, _, merged) in &children {
            merged.validate(Some(method_home))?;
        }

        let child_entries: Vec<Arc<TestEntry>> = children
            .into_iter()
            .map(|(method_home, name, merged)| {
                let id = self.push_entry(
                    Some(method_home),
                    merged,
                    EntryKind::Method {
                        class: home.clone(),
                        name,
                    },
                );
                Arc::clone(&self.entries[id.0])
            })
            .collect();

        debug!(class = %home, methods = child_entries.len(), "registered test class");

        Ok(self.push_entry(
            Some(home),
            info,
            EntryKind::Class {
                children: child_entries,
                constructor,
            },
        ))
    }

    /// Add a factory run at plan-build time to produce class instances.
    pub fn register_factory<F>(&mut self, factory: F)
    where
        F: Fn() -> Vec<FactoryInstance> + Send + Sync + 'static,
    {
        self.factories.push(Box::new(factory));
    }

    /// Build a fresh, sorted plan from everything registered so far.
    ///
    /// # Errors
    ///
    /// Returns [`PlanError`] if a factory returns something unusable or the
    /// dependencies form a cycle.
    pub fn get_test_plan(&self) -> Result<TestPlan, PlanError> {
        TestPlan::create(self)
    }

    /// Wipe all entries, groups and factories.
    pub fn reset(&mut self) {
        self.entries.clear();
        self.groups.clear();
        self.homes.clear();
        self.factories.clear();
    }

    pub fn entries(&self) -> &[Arc<TestEntry>] {
        &self.entries
    }

    pub fn entry(&self, id: EntryId) -> Option<&Arc<TestEntry>> {
        self.entries.get(id.0)
    }

    pub fn entry_for_home(&self, home: &Home) -> Option<&Arc<TestEntry>> {
        self.homes.get(home).and_then(|id| self.entry(*id))
    }

    pub fn group(&self, name: &str) -> Option<&TestGroup> {
        self.groups.get(name)
    }

    pub fn groups(&self) -> &HashMap<String, TestGroup> {
        &self.groups
    }

    pub(crate) fn factories(&self) -> &[Factory] {
        &self.factories
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn ensure_unregistered(&self, home: &Home) -> Result<(), RegistrationError> {
        if self.homes.contains_key(home) {
            return Err(RegistrationError::DuplicateRegistration { home: home.clone() });
        }
        Ok(())
    }

    fn ensure_group_exists(&mut self, name: &str) -> &mut TestGroup {
        self.groups
            .entry(name.to_owned())
            .or_insert_with(|| TestGroup::new(name))
    }

    fn push_entry(&mut self, home: Option<Home>, info: TestEntryInfo, kind: EntryKind) -> EntryId {
        let id = EntryId(self.entries.len());

        for group in &info.groups {
            self.ensure_group_exists(group).entries.push(id);
        }
        for group in info.depends_on_groups.iter().chain(&info.runs_after_groups) {
            self.ensure_group_exists(group);
        }
        if let Some(home) = &home {
            self.homes.insert(home.clone(), id);
        }

        let entry = TestEntry::new(id, home, info, kind);
        debug!(entry = %entry.label(), id = id.0, "registered test entry");
        self.entries.push(Arc::new(entry));
        id
    }
}

impl fmt::Debug for TestRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestRegistry")
            .field("entries", &self.entries.len())
            .field("groups", &self.groups.len())
            .field("factories", &self.factories.len())
            .finish()
    }
}

/// Turn before/after-class flags into dependencies between sibling methods.
fn wire_class_hooks(children: &mut [(Home, String, TestEntryInfo)]) {
    let before: Vec<Home> = children
        .iter()
        .filter(|(_, _, info)| info.before_class)
        .map(|(home, _, _)| home.clone())
        .collect();
    let regular: Vec<Home> = children
        .iter()
        .filter(|(_, _, info)| !info.after_class)
        .map(|(home, _, _)| home.clone())
        .collect();

    for (_, _, info) in children.iter_mut() {
        if info.after_class {
            for sibling in &regular {
                if info.always_run {
                    info.add_runs_after(sibling.clone());
                } else {
                    info.add_dependency(sibling.clone());
                }
            }
        } else if !info.before_class {
            for hook in &before {
                info.add_dependency(hook.clone());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service_class() -> TestClass {
        TestClass::new("ServiceTests")
            .method("start", TestEntryInfo::new().before_class())
            .method("create", TestEntryInfo::new())
            .method("delete", TestEntryInfo::new().depends_on("ServiceTests::create"))
            .method("stop", TestEntryInfo::new().after_class())
    }

    fn info_of<'a>(reg: &'a TestRegistry, home: &str) -> &'a TestEntryInfo {
        reg.entry_for_home(&Home::new(home)).unwrap().info()
    }

    // ── Functions ──────────────────────────────────────────

    #[test]
    fn register_function_adds_entry_and_groups() {
        let mut reg = TestRegistry::new();
        let id = reg
            .register_function("start_service", TestEntryInfo::new().group("setup"))
            .unwrap();
        assert_eq!(reg.len(), 1);
        assert_eq!(reg.group("setup").unwrap().entries, vec![id]);
        assert!(!reg.entry(id).unwrap().is_child());
    }

    #[test]
    fn dependency_groups_are_created_empty() {
        let mut reg = TestRegistry::new();
        reg.register_function("a", TestEntryInfo::new().depends_on_group("later"))
            .unwrap();
        assert!(reg.group("later").unwrap().entries.is_empty());
    }

    #[test]
    fn duplicate_function_is_rejected() {
        let mut reg = TestRegistry::new();
        reg.register_function("a", TestEntryInfo::new()).unwrap();
        let err = reg.register_function("a", TestEntryInfo::new()).unwrap_err();
        assert_eq!(
            err,
            RegistrationError::DuplicateRegistration { home: Home::new("a") }
        );
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn self_dependency_rejected_before_group_mutation() {
        let mut reg = TestRegistry::new();
        let err = reg
            .register_function("a", TestEntryInfo::new().group("g").depends_on("a"))
            .unwrap_err();
        assert!(matches!(err, RegistrationError::SelfDependency { .. }));
        assert!(reg.group("g").is_none());
        assert!(reg.entry_for_home(&Home::new("a")).is_none());
    }

    #[test]
    fn empty_entry_has_no_home() {
        let mut reg = TestRegistry::new();
        let id = reg
            .register(
                Target::Empty,
                TestEntryInfo::new().group("all").depends_on_group("unit"),
            )
            .unwrap();
        let entry = reg.entry(id).unwrap();
        assert!(entry.home().is_none());
        assert_eq!(reg.group("all").unwrap().entries, vec![id]);
    }

    #[test]
    fn register_dispatches_on_target() {
        let mut reg = TestRegistry::new();
        reg.register(Target::Function(Home::new("f")), TestEntryInfo::new())
            .unwrap();
        reg.register(Target::Class(TestClass::new("C")), TestEntryInfo::new())
            .unwrap();
        assert!(!reg.entry_for_home(&Home::new("f")).unwrap().is_class());
        assert!(reg.entry_for_home(&Home::new("C")).unwrap().is_class());
    }

    // ── Classes ────────────────────────────────────────────

    #[test]
    fn class_children_are_registered_before_class() {
        let mut reg = TestRegistry::new();
        let id = reg
            .register_class(service_class(), TestEntryInfo::new())
            .unwrap();
        assert_eq!(id.index(), 4);
        let class = reg.entry(id).unwrap();
        let names: Vec<&str> = class
            .children()
            .iter()
            .filter_map(|c| c.method())
            .collect();
        assert_eq!(names, vec!["start", "create", "delete", "stop"]);
        assert!(class.children().iter().all(|c| c.is_child()));
    }

    #[test]
    fn class_metadata_is_inherited() {
        let mut reg = TestRegistry::new();
        reg.register_class(
            service_class(),
            TestEntryInfo::new()
                .group("service")
                .depends_on_group("setup")
                .always_run(),
        )
        .unwrap();

        let create = info_of(&reg, "ServiceTests::create");
        assert_eq!(create.groups, vec!["service"]);
        assert_eq!(create.depends_on_groups, vec!["setup"]);
        assert!(create.always_run);
        // the group lists every method and the class itself
        assert_eq!(reg.group("service").unwrap().entries.len(), 5);
    }

    #[test]
    fn before_class_hooks_become_dependencies() {
        let mut reg = TestRegistry::new();
        reg.register_class(service_class(), TestEntryInfo::new())
            .unwrap();

        let start = Home::new("ServiceTests::start");
        assert!(info_of(&reg, "ServiceTests::create").depends_on.contains(&start));
        assert!(info_of(&reg, "ServiceTests::delete").depends_on.contains(&start));
        assert!(info_of(&reg, "ServiceTests::start").depends_on.is_empty());
        assert!(!info_of(&reg, "ServiceTests::stop").depends_on.is_empty());
    }

    #[test]
    fn after_class_hook_depends_on_all_siblings() {
        let mut reg = TestRegistry::new();
        reg.register_class(service_class(), TestEntryInfo::new())
            .unwrap();

        let stop = info_of(&reg, "ServiceTests::stop");
        assert_eq!(
            stop.depends_on,
            vec![
                Home::new("ServiceTests::start"),
                Home::new("ServiceTests::create"),
                Home::new("ServiceTests::delete"),
            ]
        );
        assert!(stop.runs_after.is_empty());
    }

    #[test]
    fn always_run_after_class_hook_only_runs_after() {
        let class = TestClass::new("C")
            .method("a", TestEntryInfo::new())
            .method("cleanup", TestEntryInfo::new().after_class().always_run());
        let mut reg = TestRegistry::new();
        reg.register_class(class, TestEntryInfo::new()).unwrap();

        let cleanup = info_of(&reg, "C::cleanup");
        assert!(cleanup.depends_on.is_empty());
        assert_eq!(cleanup.runs_after, vec![Home::new("C::a")]);
    }

    #[test]
    fn duplicate_class_is_rejected_without_side_effects() {
        let mut reg = TestRegistry::new();
        reg.register_class(service_class(), TestEntryInfo::new().group("service"))
            .unwrap();
        let before = reg.len();
        let err = reg
            .register_class(service_class(), TestEntryInfo::new().group("other"))
            .unwrap_err();
        assert!(matches!(err, RegistrationError::DuplicateRegistration { .. }));
        assert_eq!(reg.len(), before);
        assert!(reg.group("other").is_none());
    }

    #[test]
    fn method_clashing_with_function_is_rejected() {
        let mut reg = TestRegistry::new();
        reg.register_function("C::a", TestEntryInfo::new()).unwrap();
        let class = TestClass::new("C").method("a", TestEntryInfo::new());
        let err = reg.register_class(class, TestEntryInfo::new()).unwrap_err();
        assert_eq!(
            err,
            RegistrationError::DuplicateRegistration { home: Home::new("C::a") }
        );
        assert!(reg.entry_for_home(&Home::new("C")).is_none());
    }

    #[test]
    fn method_depending_on_own_class_is_rejected() {
        let class = TestClass::new("C").method("a", TestEntryInfo::new().depends_on("C"));
        let mut reg = TestRegistry::new();
        let err = reg.register_class(class, TestEntryInfo::new()).unwrap_err();
        assert!(matches!(err, RegistrationError::SelfDependency { .. }));
        assert!(reg.is_empty());
    }

    #[test]
    fn method_inheriting_conflicting_group_is_rejected() {
        let class = TestClass::new("C").method("a", TestEntryInfo::new().group("setup"));
        let mut reg = TestRegistry::new();
        let err = reg
            .register_class(class, TestEntryInfo::new().depends_on_group("setup"))
            .unwrap_err();
        assert!(matches!(
            err,
            RegistrationError::CyclicGroupDependency { .. }
        ));
        assert!(reg.is_empty());
    }

    // ── Reset ──────────────────────────────────────────────

    #[test]
    fn reset_wipes_everything() {
        let mut reg = TestRegistry::new();
        reg.register_function("a", TestEntryInfo::new().group("g"))
            .unwrap();
        reg.register_factory(Vec::new);
        reg.reset();
        assert!(reg.is_empty());
        assert!(reg.groups().is_empty());
        assert!(reg.factories().is_empty());
        // the same home can be registered again afterwards
        assert!(reg.register_function("a", TestEntryInfo::new()).is_ok());
    }
}
