use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::{Deserialize, Serialize};

use crate::errors::RegistrationError;
use crate::registry::target::Constructor;

/// Identity of a registered unit: a function, a class, or `Class::method`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Home(String);

impl Home {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The home of a method declared on `class`.
    pub fn method(class: &Home, name: &str) -> Self {
        Self(format!("{}::{name}", class.0))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Home {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Home {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for Home {
    fn from(name: String) -> Self {
        Self(name)
    }
}

/// Index of an entry inside its registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntryId(pub(crate) usize);

impl EntryId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Metadata declared for a unit of test code.
///
/// List fields never hold duplicates; the builder methods keep declaration
/// order so that inheritance and graph construction stay deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TestEntryInfo {
    pub groups: Vec<String>,
    pub depends_on: Vec<Home>,
    pub depends_on_groups: Vec<String>,
    /// Ordering-only dependencies: failures do not propagate across them.
    pub runs_after: Vec<Home>,
    pub runs_after_groups: Vec<String>,
    /// `None` means "not specified", which reads as enabled.
    pub enabled: Option<bool>,
    pub always_run: bool,
    pub before_class: bool,
    pub after_class: bool,
    /// Human readable description shown by `--show-plan`. Not inherited.
    pub description: Option<String>,
}

impl TestEntryInfo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn group(mut self, name: impl Into<String>) -> Self {
        push_unique(&mut self.groups, name.into());
        self
    }

    pub fn groups<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for name in names {
            push_unique(&mut self.groups, name.into());
        }
        self
    }

    pub fn depends_on(mut self, home: impl Into<Home>) -> Self {
        push_unique(&mut self.depends_on, home.into());
        self
    }

    /// Depend on every method of a class. Classes and functions share one
    /// identity space, so this is the same edge as [`Self::depends_on`].
    pub fn depends_on_class(self, home: impl Into<Home>) -> Self {
        self.depends_on(home)
    }

    pub fn depends_on_group(mut self, name: impl Into<String>) -> Self {
        push_unique(&mut self.depends_on_groups, name.into());
        self
    }

    pub fn runs_after(mut self, home: impl Into<Home>) -> Self {
        push_unique(&mut self.runs_after, home.into());
        self
    }

    pub fn runs_after_group(mut self, name: impl Into<String>) -> Self {
        push_unique(&mut self.runs_after_groups, name.into());
        self
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = Some(enabled);
        self
    }

    pub fn always_run(mut self) -> Self {
        self.always_run = true;
        self
    }

    pub fn before_class(mut self) -> Self {
        self.before_class = true;
        self
    }

    pub fn after_class(mut self) -> Self {
        self.after_class = true;
        self
    }

    pub fn description(mut self, text: impl Into<String>) -> Self {
        self.description = Some(text.into());
        self
    }

    pub(crate) fn add_dependency(&mut self, home: Home) {
        push_unique(&mut self.depends_on, home);
    }

    pub(crate) fn add_runs_after(&mut self, home: Home) {
        push_unique(&mut self.runs_after, home);
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.unwrap_or(true)
    }

    /// Check the structural rules for an entry living at `home`.
    ///
    /// # Errors
    ///
    /// Returns [`RegistrationError`] if both class hooks are set, the entry
    /// lists itself as a dependency, or it depends on one of its own groups.
    pub fn validate(&self, home: Option<&Home>) -> Result<(), RegistrationError> {
        if self.before_class && self.after_class {
            return Err(RegistrationError::ConflictingClassHooks {
                home: home.cloned(),
            });
        }

        if let Some(home) = home
            && (self.depends_on.contains(home) || self.runs_after.contains(home))
        {
            return Err(RegistrationError::SelfDependency { home: home.clone() });
        }

        if let Some(group) = self
            .depends_on_groups
            .iter()
            .find(|g| self.groups.contains(*g))
        {
            return Err(RegistrationError::CyclicGroupDependency {
                home: home.cloned(),
                group: group.clone(),
            });
        }

        Ok(())
    }

    /// Merge a parent class's metadata into this (method) info.
    ///
    /// Lists are unioned with the child's own entries first. An explicit
    /// `enabled` on the parent only applies if the child left it unspecified,
    /// and `always_run` is OR'd in.
    pub fn inherit(&self, parent: &TestEntryInfo) -> TestEntryInfo {
        let mut merged = self.clone();
        for group in &parent.groups {
            push_unique(&mut merged.groups, group.clone());
        }
        for group in &parent.depends_on_groups {
            push_unique(&mut merged.depends_on_groups, group.clone());
        }
        for home in &parent.depends_on {
            push_unique(&mut merged.depends_on, home.clone());
        }
        for home in &parent.runs_after {
            push_unique(&mut merged.runs_after, home.clone());
        }
        for group in &parent.runs_after_groups {
            push_unique(&mut merged.runs_after_groups, group.clone());
        }
        if merged.enabled.is_none() {
            merged.enabled = parent.enabled;
        }
        merged.always_run |= parent.always_run;
        merged
    }

    /// One `name = value` line per field, as printed by `--show-plan`.
    pub fn field_lines(&self) -> Vec<String> {
        vec![
            format!("groups = [{}]", self.groups.join(",")),
            format!("enabled = {}", self.is_enabled()),
            format!("depends_on_groups = [{}]", self.depends_on_groups.join(",")),
            format!("depends_on = [{}]", join_homes(&self.depends_on)),
            format!("runs_after = [{}]", join_homes(&self.runs_after)),
        ]
    }
}

impl fmt::Display for TestEntryInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.field_lines().join(", "))
    }
}

fn push_unique<T: PartialEq>(items: &mut Vec<T>, item: T) {
    if !items.contains(&item) {
        items.push(item);
    }
}

fn join_homes(homes: &[Home]) -> String {
    homes
        .iter()
        .map(Home::as_str)
        .collect::<Vec<_>>()
        .join(",")
}

/// The shape of a registered entry.
#[derive(Debug)]
pub enum EntryKind {
    /// No code at all; only composes groups and dependencies.
    Empty,
    /// A free-standing function.
    Function,
    /// A class whose methods are child entries sharing one instance.
    Class {
        children: Vec<Arc<TestEntry>>,
        constructor: Constructor,
    },
    /// A method declared on `class`.
    Method { class: Home, name: String },
}

/// A registered unit: its identity, metadata and shape.
#[derive(Debug)]
pub struct TestEntry {
    id: EntryId,
    home: Option<Home>,
    info: TestEntryInfo,
    kind: EntryKind,
    used_by_factory: AtomicBool,
}

impl TestEntry {
    pub(crate) fn new(id: EntryId, home: Option<Home>, info: TestEntryInfo, kind: EntryKind) -> Self {
        Self {
            id,
            home,
            info,
            kind,
            used_by_factory: AtomicBool::new(false),
        }
    }

    pub fn id(&self) -> EntryId {
        self.id
    }

    pub fn home(&self) -> Option<&Home> {
        self.home.as_ref()
    }

    pub fn info(&self) -> &TestEntryInfo {
        &self.info
    }

    pub fn kind(&self) -> &EntryKind {
        &self.kind
    }

    /// Printable identity; empty entries have no home.
    pub fn label(&self) -> String {
        self.home
            .as_ref()
            .map_or_else(|| "<empty>".to_owned(), Home::to_string)
    }

    /// True if this entry nests under a class (is a method).
    pub fn is_child(&self) -> bool {
        matches!(self.kind, EntryKind::Method { .. })
    }

    pub fn is_class(&self) -> bool {
        matches!(self.kind, EntryKind::Class { .. })
    }

    /// The method name, for entries declared on a class.
    pub fn method(&self) -> Option<&str> {
        match &self.kind {
            EntryKind::Method { name, .. } => Some(name),
            _ => None,
        }
    }

    /// The owning class, for method entries.
    pub fn class_home(&self) -> Option<&Home> {
        match &self.kind {
            EntryKind::Method { class, .. } => Some(class),
            _ => None,
        }
    }

    pub fn children(&self) -> &[Arc<TestEntry>] {
        match &self.kind {
            EntryKind::Class { children, .. } => children,
            _ => &[],
        }
    }

    /// True once a factory returned an instance of this class. Such classes
    /// only run through their factory-made instances.
    pub fn used_by_factory(&self) -> bool {
        self.used_by_factory.load(Ordering::Relaxed)
    }

    pub(crate) fn mark_as_used_by_factory(&self) {
        self.used_by_factory.store(true, Ordering::Relaxed);
    }

    /// True if `home` names this entry, or the class this method lives on.
    pub fn answers_to(&self, home: &Home) -> bool {
        self.home.as_ref() == Some(home) || self.class_home() == Some(home)
    }

    /// True if this belongs to any of the given groups or homes.
    pub fn contains(&self, group_names: &[String], homes: &[Home]) -> bool {
        if self.contains_shallow(group_names, homes) {
            return true;
        }
        self.children()
            .iter()
            .any(|child| child.contains(group_names, &[]))
    }

    fn contains_shallow(&self, group_names: &[String], homes: &[Home]) -> bool {
        group_names.iter().any(|g| self.info.groups.contains(g))
            || homes.iter().any(|h| self.answers_to(h))
    }
}
