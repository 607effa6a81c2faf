//! Error types for registration and plan construction.

use thiserror::Error;

use crate::registry::entry::Home;

/// Rejection of a single `register` call. The registry is left untouched.
///
/// `home` is `None` for empty entries, which have no identity of their own.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistrationError {
    #[error("test entry {home} depends on itself")]
    SelfDependency { home: Home },

    #[error(
        "test entry {} depends on group '{group}' which it belongs to",
        entry_label(.home.as_ref())
    )]
    CyclicGroupDependency { home: Option<Home>, group: String },

    #[error("{home} was registered twice")]
    DuplicateRegistration { home: Home },

    #[error(
        "{} may not be both before_class and after_class",
        entry_label(.home.as_ref())
    )]
    ConflictingClassHooks { home: Option<Home> },
}

fn entry_label(home: Option<&Home>) -> String {
    home.map_or_else(|| "<empty>".to_owned(), Home::to_string)
}

/// Failure to turn a registry into a sorted plan.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlanError {
    #[error("factory #{factory} returned {home}, which is not a registered test entry")]
    UnmarkedFactoryResult { factory: usize, home: Home },

    #[error("factory #{factory} returned {home}, a method of a registered class")]
    ChildReturnedByFactory { factory: usize, home: Home },

    #[error("factory #{factory} returned {home}, which is not a test class")]
    FactoryResultNotClass { factory: usize, home: Home },

    #[error("dependency cycle found on {case} (cycle members: {})", .members.join(", "))]
    DependencyCycle { case: String, members: Vec<String> },
}

/// Failure to read or apply a YAML manifest.
#[derive(Error, Debug)]
pub enum ManifestError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid manifest: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("manifest entry #{index}: {message}")]
    InvalidEntry { index: usize, message: String },

    #[error("manifest entry #{index}: {source}")]
    Registration {
        index: usize,
        #[source]
        source: RegistrationError,
    },
}
