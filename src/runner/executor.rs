use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::plan::TestPlan;
use crate::runner::backend::CaseBackend;
use crate::runner::context::RunContext;
use crate::runner::result::{CaseError, CaseErrorKind, CaseResult, CaseStatus};

/// Configuration for a test run.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Maximum chains run at once (1 = sequential).
    pub jobs: usize,
    /// Stop starting new cases after the first failure.
    pub fail_fast: bool,
    /// Directory cases run in.
    pub working_dir: PathBuf,
    /// Extra environment variables for every case.
    pub env: BTreeMap<String, String>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            jobs: 1,
            fail_fast: false,
            working_dir: PathBuf::from("."),
            env: BTreeMap::new(),
        }
    }
}

/// Runs a plan through a backend.
///
/// The plan is split into independent chains. Cases inside a chain run
/// strictly in order, since later cases may rely on state left by earlier
/// ones; separate chains may run on separate worker threads.
pub struct TestRunner {
    config: RunConfig,
}

impl TestRunner {
    pub fn new(config: RunConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Execute a full test plan. This is the primary entry point.
    ///
    /// Results come back grouped by chain, in partition order, regardless
    /// of which chain finished first.
    ///
    /// # Errors
    ///
    /// Returns [`RunError`] if the configuration is unusable or a worker
    /// thread dies.
    pub fn run(
        &self,
        plan: TestPlan,
        backend: &dyn CaseBackend,
    ) -> Result<TestRunResult, RunError> {
        if self.config.jobs == 0 {
            return Err(RunError {
                kind: RunErrorKind::InvalidConfig,
                message: "jobs must be at least 1".into(),
                detail: None,
            });
        }

        let start = Instant::now();
        let chains = plan.split_chains();
        let chain_count = chains.len();
        let workers = self.config.jobs.min(chain_count).max(1);
        info!(
            chains = chain_count,
            workers,
            backend = backend.name(),
            "starting test run"
        );

        let mut context = RunContext::new(&self.config.working_dir);
        for (key, value) in &self.config.env {
            context.set_env(key, value);
        }

        let stop = AtomicBool::new(false);
        let fail_fast = self.config.fail_fast;
        let per_chain: Vec<Vec<CaseResult>> = if workers == 1 {
            chains
                .into_iter()
                .enumerate()
                .map(|(index, mut chain)| {
                    let context = context.for_chain(index);
                    run_chain(&mut chain, backend, &context, fail_fast, &stop)
                })
                .collect()
        } else {
            self.run_parallel(chains, workers, backend, &context, &stop)?
        };

        let cases: Vec<CaseResult> = per_chain.into_iter().flatten().collect();
        let summary = RunSummary::from_results(&cases);
        Ok(TestRunResult {
            backend: backend.name().to_owned(),
            chains: chain_count,
            total_duration: start.elapsed(),
            cases,
            summary,
        })
    }

    fn run_parallel(
        &self,
        chains: Vec<TestPlan>,
        workers: usize,
        backend: &dyn CaseBackend,
        context: &RunContext,
        stop: &AtomicBool,
    ) -> Result<Vec<Vec<CaseResult>>, RunError> {
        let slots: Vec<Mutex<Option<TestPlan>>> =
            chains.into_iter().map(|c| Mutex::new(Some(c))).collect();
        let results: Vec<Mutex<Vec<CaseResult>>> =
            slots.iter().map(|_| Mutex::new(Vec::new())).collect();
        let next = AtomicUsize::new(0);
        let fail_fast = self.config.fail_fast;

        thread::scope(|scope| {
            let handles: Vec<_> = (0..workers)
                .map(|worker| {
                    let (slots, results, next) = (&slots, &results, &next);
                    scope.spawn(move || {
                        loop {
                            let index = next.fetch_add(1, Ordering::SeqCst);
                            let Some(slot) = slots.get(index) else { break };
                            let taken = slot.lock().unwrap_or_else(PoisonError::into_inner).take();
                            let Some(mut chain) = taken else { continue };
                            debug!(worker, chain = index, "worker picked up chain");
                            let context = context.for_chain(index);
                            let outcome = run_chain(&mut chain, backend, &context, fail_fast, stop);
                            *results[index].lock().unwrap_or_else(PoisonError::into_inner) = outcome;
                        }
                    })
                })
                .collect();

            for handle in handles {
                if handle.join().is_err() {
                    return Err(RunError {
                        kind: RunErrorKind::WorkerPanicked,
                        message: "a worker thread panicked".into(),
                        detail: None,
                    });
                }
            }
            Ok(())
        })?;

        Ok(results
            .into_iter()
            .map(|r| r.into_inner().unwrap_or_else(PoisonError::into_inner))
            .collect())
    }
}

/// Run one chain's cases in order, recording failures as they happen.
fn run_chain(
    plan: &mut TestPlan,
    backend: &dyn CaseBackend,
    context: &RunContext,
    fail_fast: bool,
    stop: &AtomicBool,
) -> Vec<CaseResult> {
    let order = plan.order().to_vec();
    let mut results = Vec::with_capacity(order.len());

    for id in order {
        let case = plan.case(id);
        let label = case.label();

        if case.home().is_none() {
            continue;
        }
        if !case.is_runnable() {
            results.push(CaseResult::skipped(&label, "disabled"));
            continue;
        }
        if stop.load(Ordering::SeqCst) {
            results.push(CaseResult::skipped(&label, "run stopped after a failure"));
            continue;
        }
        if let Err(skip) = plan.check_dependencies(id) {
            debug!(case = %label, cause = %skip.cause, "skipping case");
            results.push(CaseResult::skipped(&label, skip.to_string()));
            continue;
        }

        let result = match backend.execute_case(case, context) {
            Ok(result) => result,
            Err(e) => {
                let mut error = CaseError::new(CaseErrorKind::BackendFailed, e.message);
                error.detail = e.detail;
                CaseResult::errored(&label, Duration::ZERO, error)
            }
        };

        if result.status.is_failure() {
            warn!(case = %label, status = %result.status, "case did not pass");
            plan.fail(id, None);
            if fail_fast {
                stop.store(true, Ordering::SeqCst);
            }
        }
        results.push(result);
    }

    results
}

/// The complete result of a test run.
#[derive(Debug, Clone)]
pub struct TestRunResult {
    pub backend: String,
    pub chains: usize,
    pub total_duration: Duration,
    pub cases: Vec<CaseResult>,
    pub summary: RunSummary,
}

/// Summary statistics for a test run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
    pub errors: usize,
}

impl RunSummary {
    /// Whether the run was fully successful (no failures or errors).
    pub fn success(&self) -> bool {
        self.failed == 0 && self.errors == 0
    }

    /// Build a summary from a list of case results.
    pub fn from_results(results: &[CaseResult]) -> Self {
        let mut summary = Self {
            total: results.len(),
            passed: 0,
            failed: 0,
            skipped: 0,
            errors: 0,
        };
        for r in results {
            match r.status {
                CaseStatus::Passed => summary.passed += 1,
                CaseStatus::Failed => summary.failed += 1,
                CaseStatus::Skipped => summary.skipped += 1,
                CaseStatus::Error => summary.errors += 1,
            }
        }
        summary
    }
}

/// Error from the runner orchestration layer.
#[derive(Debug, Clone)]
pub struct RunError {
    pub kind: RunErrorKind,
    pub message: String,
    pub detail: Option<String>,
}

impl fmt::Display for RunError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

/// Classification of runner errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunErrorKind {
    /// The run configuration cannot be used.
    InvalidConfig,
    /// A worker thread died outside of a case.
    WorkerPanicked,
}

impl fmt::Display for RunErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidConfig => write!(f, "invalid config"),
            Self::WorkerPanicked => write!(f, "worker panicked"),
        }
    }
}
