//! Dependency graph construction, ordering and cycle analysis.

pub mod analysis;
pub mod builder;
pub mod traversal;

pub use builder::{DependencyKind, TestGraph};
