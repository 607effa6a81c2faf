//! Property tests over randomly generated acyclic registries.

mod dag;
mod ordering;
mod partition;
