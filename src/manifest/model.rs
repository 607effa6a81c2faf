use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::registry::entry::TestEntryInfo;

/// Top-level manifest file: the list of test units in registration order.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Manifest {
    #[serde(default)]
    pub tests: Vec<ManifestEntry>,
}

/// One registered unit.
///
/// Exactly one of `function` / `class` names it; with neither, the entry
/// has no code and only composes groups.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct ManifestEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub methods: Vec<ManifestMethod>,
    /// Shell command for the shell backend.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cmd: Option<String>,
    #[serde(flatten)]
    pub info: InfoFields,
}

/// A method declared inside a class entry.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct ManifestMethod {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cmd: Option<String>,
    #[serde(flatten)]
    pub info: InfoFields,
}

/// Metadata keys shared by entries and methods.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct InfoFields {
    #[serde(default)]
    pub groups: Vec<String>,
    #[serde(default)]
    pub depends_on: Vec<String>,
    #[serde(default)]
    pub depends_on_classes: Vec<String>,
    #[serde(default)]
    pub depends_on_groups: Vec<String>,
    #[serde(default)]
    pub runs_after: Vec<String>,
    #[serde(default)]
    pub runs_after_groups: Vec<String>,
    #[serde(default)]
    pub enabled: Option<bool>,
    #[serde(default)]
    pub always_run: bool,
    #[serde(default)]
    pub before_class: bool,
    #[serde(default)]
    pub after_class: bool,
    #[serde(default)]
    pub description: Option<String>,
    /// Keys no field claimed. Loading rejects an entry that has any.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_yaml::Value>,
}

impl InfoFields {
    /// First key (alphabetically) that no field recognised.
    pub fn unknown_key(&self) -> Option<&str> {
        self.extra.keys().next().map(String::as_str)
    }

    pub fn to_info(&self) -> TestEntryInfo {
        let mut info = TestEntryInfo::new().groups(self.groups.iter().cloned());
        for home in &self.depends_on {
            info = info.depends_on(home.as_str());
        }
        for home in &self.depends_on_classes {
            info = info.depends_on_class(home.as_str());
        }
        for group in &self.depends_on_groups {
            info = info.depends_on_group(group.as_str());
        }
        for home in &self.runs_after {
            info = info.runs_after(home.as_str());
        }
        for group in &self.runs_after_groups {
            info = info.runs_after_group(group.as_str());
        }
        if let Some(enabled) = self.enabled {
            info = info.enabled(enabled);
        }
        if self.always_run {
            info = info.always_run();
        }
        if self.before_class {
            info = info.before_class();
        }
        if self.after_class {
            info = info.after_class();
        }
        if let Some(description) = &self.description {
            info = info.description(description.as_str());
        }
        info
    }
}
