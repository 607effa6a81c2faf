//! Dependency-ordered test orchestration.
//!
//! Test units are registered with groups and dependencies, expanded into
//! cases, sorted into a run order, filtered, split into independent chains
//! and run with failure propagation to dependents.

pub mod cli;
pub mod emit;
pub mod errors;
pub mod graph;
pub mod logging;
pub mod manifest;
pub mod plan;
pub mod registry;
pub mod runner;

pub use errors::{ManifestError, PlanError, RegistrationError};
pub use plan::{CaseId, Chain, Selection, Skip, TestCase, TestPlan};
pub use registry::TestRegistry;
pub use registry::entry::{Home, TestEntryInfo};
pub use registry::target::{Target, TestClass};
