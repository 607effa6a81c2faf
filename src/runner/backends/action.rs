use std::any::Any;
use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::time::Instant;

use crate::plan::TestCase;
use crate::registry::entry::Home;
use crate::runner::backend::{BackendError, BackendErrorKind, CaseBackend};
use crate::runner::context::RunContext;
use crate::runner::result::{CaseError, CaseErrorKind, CaseResult};

/// What a test action reports: `Err` carries the failure message.
pub type Outcome = Result<(), String>;

type FunctionAction = Box<dyn Fn() -> Outcome + Send + Sync>;
type MethodAction = Box<dyn Fn(&mut (dyn Any + Send)) -> Outcome + Send + Sync>;

enum Action {
    Function(FunctionAction),
    Method(MethodAction),
}

/// Runs in-process closures keyed by case home.
///
/// Method actions receive the class instance shared by their siblings,
/// created on first use. Panics are caught and reported as errors.
#[derive(Default)]
pub struct ActionBackend {
    actions: HashMap<Home, Action>,
}

impl ActionBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the body of a free-standing test function.
    pub fn function<F>(mut self, home: impl Into<Home>, action: F) -> Self
    where
        F: Fn() -> Outcome + Send + Sync + 'static,
    {
        self.actions
            .insert(home.into(), Action::Function(Box::new(action)));
        self
    }

    /// Register the body of a test method; `home` is `Class::method`.
    pub fn method<F>(mut self, home: impl Into<Home>, action: F) -> Self
    where
        F: Fn(&mut (dyn Any + Send)) -> Outcome + Send + Sync + 'static,
    {
        self.actions
            .insert(home.into(), Action::Method(Box::new(action)));
        self
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

impl CaseBackend for ActionBackend {
    fn name(&self) -> &str {
        "action"
    }

    fn execute_case(
        &self,
        case: &TestCase,
        _context: &RunContext,
    ) -> Result<CaseResult, BackendError> {
        let label = case.label();
        let action = case
            .home()
            .and_then(|home| self.actions.get(home))
            .ok_or_else(|| {
                BackendError::new(
                    BackendErrorKind::ActionNotFound,
                    format!("no action registered for {label}"),
                )
            })?;

        let start = Instant::now();
        let outcome = match action {
            Action::Function(run) => panic::catch_unwind(AssertUnwindSafe(run)),
            Action::Method(run) => {
                let state = case.state().ok_or_else(|| {
                    BackendError::new(
                        BackendErrorKind::UnsupportedFeature,
                        format!("{label} is a method action but has no class state"),
                    )
                })?;
                panic::catch_unwind(AssertUnwindSafe(|| state.with_instance(|instance| run(instance))))
            }
        };
        let duration = start.elapsed();

        Ok(match outcome {
            Ok(Ok(())) => CaseResult::passed(&label, duration),
            Ok(Err(message)) => CaseResult::failed(
                &label,
                duration,
                CaseError::new(CaseErrorKind::AssertionFailed, message),
            ),
            Err(payload) => CaseResult::errored(
                &label,
                duration,
                CaseError::new(CaseErrorKind::Panicked, panic_message(payload.as_ref())),
            ),
        })
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(text) = payload.downcast_ref::<&str>() {
        (*text).to_owned()
    } else if let Some(text) = payload.downcast_ref::<String>() {
        text.clone()
    } else {
        "test panicked".to_owned()
    }
}
