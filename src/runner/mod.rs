//! Execution of test plans: backends, the chain executor and reporting.

pub mod backend;
pub mod backends;
pub mod context;
pub mod display;
pub mod executor;
pub mod report;
pub mod result;

pub use backend::{BackendError, BackendErrorKind, CaseBackend};
pub use executor::{RunConfig, RunError, RunErrorKind, RunSummary, TestRunResult, TestRunner};
pub use result::{CaseError, CaseErrorKind, CaseResult, CaseStatus};
