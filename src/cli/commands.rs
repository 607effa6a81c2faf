use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::cli::Format;
use crate::emit::listing::{
    chain_listing, chains_text, emit_json, emit_yaml, plan_listing, shallow_text,
};
use crate::emit::run_result::{emit_run_json, emit_run_junit, emit_run_yaml};
use crate::emit::show_plan::show_plan;
use crate::manifest::{load_home_list, load_registry};
use crate::plan::chains::{best_chain_count, partition};
use crate::plan::{Selection, TestPlan};
use crate::registry::entry::Home;
use crate::runner::backends::ShellBackend;
use crate::runner::display::{format_case_result, format_run_header, format_summary};
use crate::runner::executor::{RunConfig, TestRunResult, TestRunner};
use crate::runner::report::to_report;

/// Cases to keep out of a manifest's full plan.
#[derive(Debug, Clone, Default)]
pub struct PlanScope {
    pub selection: Selection,
    /// File of homes; only chains touching one of them are kept.
    pub load_list: Option<PathBuf>,
}

/// Options for the `plan` command.
#[derive(Debug, Clone, Default)]
pub struct PlanOptions {
    pub manifest: PathBuf,
    pub scope: PlanScope,
    pub format: Format,
    pub output: Option<PathBuf>,
}

/// Options for the `chains` command.
#[derive(Debug, Clone, Default)]
pub struct ChainsOptions {
    pub manifest: PathBuf,
    pub scope: PlanScope,
    pub format: Format,
    /// Print only the number of chains.
    pub count: bool,
    /// Print only the first case of each chain.
    pub shallow: bool,
}

/// Options for the `run` command.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub manifest: PathBuf,
    pub scope: PlanScope,
    pub format: Format,
    pub output: Option<PathBuf>,
    pub jobs: usize,
    pub fail_fast: bool,
    /// Print the plan instead of running it.
    pub show_plan: bool,
    /// Include failure details in text output.
    pub verbose: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            manifest: PathBuf::new(),
            scope: PlanScope::default(),
            format: Format::Text,
            output: None,
            jobs: 1,
            fail_fast: false,
            show_plan: false,
            verbose: false,
        }
    }
}

/// Load a manifest, build its plan and narrow it to `scope`.
fn prepare(manifest: &Path, scope: &PlanScope) -> Result<(TestPlan, HashMap<Home, String>), String> {
    let loaded = load_registry(manifest).map_err(|e| format!("{}: {e}", manifest.display()))?;
    let mut plan = loaded
        .registry
        .get_test_plan()
        .map_err(|e| format!("{}: {e}", manifest.display()))?;

    if !scope.selection.is_empty() {
        plan.filter(&scope.selection);
    }
    if let Some(list) = &scope.load_list {
        let homes = load_home_list(list).map_err(|e| e.to_string())?;
        let kept = plan.retain_chains(&homes);
        info!(chains = kept, homes = homes.len(), "applied load list");
    }

    Ok((plan, loaded.commands))
}

fn write_or_return(output: Option<&PathBuf>, content: String, what: &str) -> Result<String, String> {
    match output {
        Some(path) => {
            std::fs::write(path, &content)
                .map_err(|e| format!("failed to write {}: {e}", path.display()))?;
            Ok(format!("{what} written to {}\n", path.display()))
        }
        None => Ok(content),
    }
}

/// Run the `plan` command: print the ordered plan of a manifest.
///
/// # Errors
///
/// Returns an error string if loading, planning, or emitting fails.
pub fn run_plan(options: &PlanOptions) -> Result<String, String> {
    let (plan, _) = prepare(&options.manifest, &options.scope)?;

    let output = match options.format {
        Format::Text => show_plan(&plan),
        Format::Yaml => emit_yaml(&plan_listing(&plan))?,
        Format::Json => emit_json(&plan_listing(&plan))? + "\n",
        Format::Junit => {
            return Err("unknown format 'junit' for plan (expected: text, yaml, json)".to_owned());
        }
    };

    write_or_return(options.output.as_ref(), output, "plan")
}

/// Run the `chains` command: list the independent chains of a manifest.
///
/// # Errors
///
/// Returns an error string if loading, planning, or emitting fails.
pub fn run_chains(options: &ChainsOptions) -> Result<String, String> {
    let (plan, _) = prepare(&options.manifest, &options.scope)?;

    if options.count {
        return Ok(format!("{}\n", best_chain_count(&plan)));
    }
    if options.shallow {
        return Ok(shallow_text(&plan));
    }

    let chains = partition(&plan);
    match options.format {
        Format::Text => Ok(chains_text(&plan, &chains)),
        Format::Yaml => emit_yaml(&chain_listing(&plan, &chains)),
        Format::Json => Ok(emit_json(&chain_listing(&plan, &chains))? + "\n"),
        Format::Junit => {
            Err("unknown format 'junit' for chains (expected: text, yaml, json)".to_owned())
        }
    }
}

/// Run the `validate` command: check that each manifest registers and
/// sorts cleanly.
///
/// # Errors
///
/// Returns an error string naming the first manifest that fails.
pub fn run_validate(files: &[PathBuf]) -> Result<String, String> {
    let mut results = Vec::new();

    for file in files {
        let (plan, _) = prepare(file, &PlanScope::default())?;
        results.push(format!(
            "{}: valid ({} cases, {} chains)",
            file.display(),
            plan.len(),
            best_chain_count(&plan),
        ));
    }

    Ok(results.join("\n") + "\n")
}

/// Render a finished run in the requested format.
fn render_run(result: &TestRunResult, format: Format, verbose: bool) -> String {
    let report = to_report(result);
    match format {
        Format::Text => {
            let mut out = format_run_header(result.cases.len(), &result.backend);
            for case in &result.cases {
                out.push_str(&format_case_result(case, verbose));
                out.push('\n');
            }
            out.push_str(&format_summary(result));
            out.push('\n');
            out
        }
        Format::Yaml => emit_run_yaml(&report),
        Format::Json => emit_run_json(&report) + "\n",
        Format::Junit => emit_run_junit(&report),
    }
}

/// Run the `run` command: execute a manifest's cases through the shell
/// backend and emit the results.
///
/// Commands run in the manifest's directory. Returns `Ok(true)` if no case
/// failed or errored.
///
/// # Errors
///
/// Returns an error string if loading, planning, execution, or writing
/// output fails.
pub fn run_run(options: &RunOptions) -> Result<bool, String> {
    let (plan, commands) = prepare(&options.manifest, &options.scope)?;

    if options.show_plan {
        let text = show_plan(&plan);
        let message = write_or_return(options.output.as_ref(), text, "plan")?;
        print!("{message}");
        return Ok(true);
    }

    let working_dir = match options.manifest.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => std::env::current_dir().map_err(|e| format!("failed to get cwd: {e}"))?,
    };

    let config = RunConfig {
        jobs: options.jobs,
        fail_fast: options.fail_fast,
        working_dir,
        ..RunConfig::default()
    };

    let backend = ShellBackend::with_commands(commands);
    let result = TestRunner::new(config)
        .run(plan, &backend)
        .map_err(|e| format!("run error: {e}"))?;

    let output = render_run(&result, options.format, options.verbose);
    match &options.output {
        Some(path) => {
            std::fs::write(path, &output)
                .map_err(|e| format!("failed to write {}: {e}", path.display()))?;
            eprintln!("results written to {}", path.display());
        }
        None => print!("{output}"),
    }

    Ok(result.summary.success())
}
