use std::collections::HashMap;
use std::fs;
use std::path::Path;

use tracing::debug;

use crate::errors::ManifestError;
use crate::manifest::model::{Manifest, ManifestEntry};
use crate::registry::TestRegistry;
use crate::registry::entry::Home;
use crate::registry::target::TestClass;

/// A registry built from a manifest, plus the shell command of every unit
/// that declared one.
#[derive(Debug)]
pub struct LoadedManifest {
    pub registry: TestRegistry,
    pub commands: HashMap<Home, String>,
}

/// Read and parse a manifest file without registering anything.
///
/// # Errors
///
/// Returns [`ManifestError::Io`] if the file cannot be read and
/// [`ManifestError::Yaml`] if it is not a valid manifest.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<Manifest, ManifestError> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path).map_err(|source| ManifestError::Io {
        path: path.display().to_string(),
        source,
    })?;
    parse(&contents)
}

/// Parse manifest YAML.
///
/// # Errors
///
/// Returns [`ManifestError::Yaml`] on malformed input.
pub fn parse(contents: &str) -> Result<Manifest, ManifestError> {
    Ok(serde_yaml::from_str(contents)?)
}

/// Read a manifest file and register every unit it lists.
///
/// # Errors
///
/// Returns [`ManifestError`] on I/O, YAML, shape or registration failures.
pub fn load_registry(path: impl AsRef<Path>) -> Result<LoadedManifest, ManifestError> {
    load_from_path(path)?.into_registry()
}

impl Manifest {
    /// Register every entry in file order.
    ///
    /// # Errors
    ///
    /// Returns [`ManifestError::InvalidEntry`] for malformed entries and
    /// [`ManifestError::Registration`] when the registry rejects one. Both
    /// carry the entry's position in the file.
    pub fn into_registry(self) -> Result<LoadedManifest, ManifestError> {
        let mut registry = TestRegistry::new();
        let mut commands = HashMap::new();

        for (index, entry) in self.tests.into_iter().enumerate() {
            register_entry(&mut registry, &mut commands, index, entry)?;
        }

        debug!(entries = registry.len(), commands = commands.len(), "loaded manifest");
        Ok(LoadedManifest { registry, commands })
    }
}

fn register_entry(
    registry: &mut TestRegistry,
    commands: &mut HashMap<Home, String>,
    index: usize,
    entry: ManifestEntry,
) -> Result<(), ManifestError> {
    let invalid = |message: &str| ManifestError::InvalidEntry {
        index,
        message: message.to_owned(),
    };
    if let Some(key) = entry.info.unknown_key() {
        return Err(invalid(&format!("unknown key '{key}'")));
    }
    if let Some((method, key)) = entry
        .methods
        .iter()
        .find_map(|m| m.info.unknown_key().map(|key| (&m.name, key)))
    {
        return Err(invalid(&format!("method '{method}': unknown key '{key}'")));
    }
    let info = entry.info.to_info();

    let result = match (entry.function, entry.class) {
        (Some(_), Some(_)) => return Err(invalid("an entry names either a function or a class")),
        (Some(function), None) => {
            if !entry.methods.is_empty() {
                return Err(invalid("only class entries may declare methods"));
            }
            let home = Home::new(function);
            if let Some(cmd) = entry.cmd {
                commands.insert(home.clone(), cmd);
            }
            registry.register_function(home, info)
        }
        (None, Some(class)) => {
            let home = Home::new(class);
            let mut test_class = TestClass::new(home.clone());
            let mut method_commands = Vec::new();
            for method in entry.methods {
                if method.name.is_empty() {
                    return Err(invalid("method name must not be empty"));
                }
                if let Some(cmd) = method.cmd {
                    method_commands.push((Home::method(&home, &method.name), cmd));
                }
                test_class = test_class.method(method.name, method.info.to_info());
            }
            let registered = registry.register_class(test_class, info);
            if registered.is_ok() {
                if let Some(cmd) = entry.cmd {
                    commands.insert(home, cmd);
                }
                commands.extend(method_commands);
            }
            registered
        }
        (None, None) => {
            if !entry.methods.is_empty() || entry.cmd.is_some() {
                return Err(invalid("an entry without function or class has no code to run"));
            }
            registry.register_empty(info)
        }
    };

    result
        .map(|_| ())
        .map_err(|source| ManifestError::Registration { index, source })
}

/// Read a list of homes, one per line. Blank lines and `#` comments are
/// skipped.
///
/// # Errors
///
/// Returns [`ManifestError::Io`] if the file cannot be read.
pub fn load_home_list(path: impl AsRef<Path>) -> Result<Vec<Home>, ManifestError> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path).map_err(|source| ManifestError::Io {
        path: path.display().to_string(),
        source,
    })?;
    Ok(parse_home_list(&contents))
}

pub fn parse_home_list(contents: &str) -> Vec<Home> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(Home::new)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::RegistrationError;
    use crate::plan::TestCase;

    fn labels(loaded: &LoadedManifest) -> Vec<String> {
        loaded
            .registry
            .get_test_plan()
            .unwrap()
            .tests()
            .map(TestCase::label)
            .collect()
    }

    // ── Parsing ────────────────────────────────────────────

    #[test]
    fn empty_document_has_no_tests() {
        let manifest = parse("tests: []\n").unwrap();
        assert!(manifest.tests.is_empty());
    }

    #[test]
    fn parses_all_info_keys() {
        let yaml = r"
tests:
  - function: create
    groups: [users]
    depends_on: [init]
    depends_on_classes: [Db]
    depends_on_groups: [setup]
    runs_after: [warmup]
    runs_after_groups: [cache]
    enabled: false
    always_run: true
    description: Creates a user.
    cmd: ./create.sh
";
        let manifest = parse(yaml).unwrap();
        let entry = &manifest.tests[0];
        assert_eq!(entry.function.as_deref(), Some("create"));
        assert_eq!(entry.cmd.as_deref(), Some("./create.sh"));
        assert!(entry.info.unknown_key().is_none());
        let info = entry.info.to_info();
        assert_eq!(info.groups, vec!["users"]);
        assert_eq!(info.depends_on, vec![Home::new("init"), Home::new("Db")]);
        assert_eq!(info.depends_on_groups, vec!["setup"]);
        assert_eq!(info.runs_after, vec![Home::new("warmup")]);
        assert_eq!(info.runs_after_groups, vec!["cache"]);
        assert_eq!(info.enabled, Some(false));
        assert!(info.always_run);
        assert_eq!(info.description.as_deref(), Some("Creates a user."));
    }

    #[test]
    fn malformed_yaml_is_rejected() {
        let err = parse("tests: [function: ").unwrap_err();
        assert!(matches!(err, ManifestError::Yaml(_)));
    }

    // ── Registration ───────────────────────────────────────

    #[test]
    fn registers_functions_classes_and_groups() {
        let yaml = r"
tests:
  - function: init
    groups: [setup]
    cmd: 'true'
  - class: Users
    depends_on_groups: [setup]
    cmd: ./users.sh
    methods:
      - name: create
      - name: delete
        depends_on: [Users::create]
        cmd: ./delete.sh
  - groups: [all]
    depends_on_groups: [setup]
";
        let loaded = parse(yaml).unwrap().into_registry().unwrap();
        assert_eq!(loaded.registry.group("all").map(|g| g.entries.len()), Some(1));
        assert_eq!(labels(&loaded), vec!["init", "Users::create", "Users::delete", "<empty>"]);
        assert_eq!(loaded.commands.len(), 3);
        assert_eq!(
            loaded.commands.get(&Home::new("Users::delete")).map(String::as_str),
            Some("./delete.sh")
        );
        assert_eq!(
            loaded.commands.get(&Home::new("Users")).map(String::as_str),
            Some("./users.sh")
        );
    }

    #[test]
    fn function_and_class_together_is_invalid() {
        let err = parse("tests:\n  - function: a\n    class: B\n")
            .unwrap()
            .into_registry()
            .unwrap_err();
        assert!(matches!(err, ManifestError::InvalidEntry { index: 0, .. }));
    }

    #[test]
    fn function_with_methods_is_invalid() {
        let err = parse("tests:\n  - function: a\n    methods:\n      - name: m\n")
            .unwrap()
            .into_registry()
            .unwrap_err();
        assert!(matches!(err, ManifestError::InvalidEntry { index: 0, .. }));
    }

    #[test]
    fn empty_entry_with_cmd_is_invalid() {
        let err = parse("tests:\n  - groups: [g]\n    cmd: ls\n")
            .unwrap()
            .into_registry()
            .unwrap_err();
        assert!(err.to_string().contains("no code to run"));
    }

    #[test]
    fn misspelled_key_is_rejected() {
        let yaml = "tests:\n  - function: a\n  - function: b\n    depend_on: [a]\n";
        let err = parse(yaml).unwrap().into_registry().unwrap_err();
        match err {
            ManifestError::InvalidEntry { index, message } => {
                assert_eq!(index, 1);
                assert_eq!(message, "unknown key 'depend_on'");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn misspelled_method_key_is_rejected() {
        let yaml = "\
tests:
  - class: Users
    methods:
      - name: create
      - name: delete
        depends_on: [Users::create]
        always_runs: true
";
        let err = parse(yaml).unwrap().into_registry().unwrap_err();
        assert_eq!(
            err.to_string(),
            "manifest entry #0: method 'delete': unknown key 'always_runs'"
        );
    }

    #[test]
    fn registration_error_carries_index() {
        let yaml = "tests:\n  - function: a\n  - function: b\n    depends_on: [b]\n";
        let err = parse(yaml).unwrap().into_registry().unwrap_err();
        match err {
            ManifestError::Registration { index, source } => {
                assert_eq!(index, 1);
                assert_eq!(
                    source,
                    RegistrationError::SelfDependency { home: Home::new("b") }
                );
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn missing_file_reports_path() {
        let err = load_from_path("/nonexistent/tether.yaml").unwrap_err();
        assert!(err.to_string().contains("/nonexistent/tether.yaml"));
    }

    // ── Home lists ─────────────────────────────────────────

    #[test]
    fn home_list_skips_blank_and_comment_lines() {
        let homes = parse_home_list("# failing last run\nUsers::create\n\n  init  \n");
        assert_eq!(homes, vec![Home::new("Users::create"), Home::new("init")]);
    }
}
