use std::collections::HashMap;
use std::process::Command;
use std::time::Instant;

use tracing::debug;

use crate::plan::TestCase;
use crate::registry::entry::Home;
use crate::runner::backend::{BackendError, BackendErrorKind, CaseBackend};
use crate::runner::context::RunContext;
use crate::runner::result::{CaseError, CaseErrorKind, CaseResult};

/// Runs each case as a shell command.
///
/// Commands are looked up by case home; method cases fall back to their
/// class's command. Exit code 0 passes, anything else fails.
pub struct ShellBackend {
    /// Shell interpreter (default: "/bin/sh").
    pub shell: String,
    /// Flags passed before the command string (default: ["-c"]).
    pub shell_args: Vec<String>,
    commands: HashMap<Home, String>,
}

impl ShellBackend {
    pub fn new() -> Self {
        Self {
            shell: "/bin/sh".to_owned(),
            shell_args: vec!["-c".to_owned()],
            commands: HashMap::new(),
        }
    }

    pub fn with_commands(commands: HashMap<Home, String>) -> Self {
        Self {
            commands,
            ..Self::new()
        }
    }

    pub fn command(mut self, home: impl Into<Home>, command: impl Into<String>) -> Self {
        self.commands.insert(home.into(), command.into());
        self
    }

    fn command_for(&self, case: &TestCase) -> Option<&str> {
        let own = case.home().and_then(|home| self.commands.get(home));
        let inherited = || {
            case.entry()
                .class_home()
                .and_then(|class| self.commands.get(class))
        };
        own.or_else(inherited).map(String::as_str)
    }
}

impl Default for ShellBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl CaseBackend for ShellBackend {
    fn name(&self) -> &str {
        "shell"
    }

    fn execute_case(
        &self,
        case: &TestCase,
        context: &RunContext,
    ) -> Result<CaseResult, BackendError> {
        let label = case.label();
        let script = self.command_for(case).ok_or_else(|| {
            BackendError::new(
                BackendErrorKind::ActionNotFound,
                format!("no command configured for {label}"),
            )
        })?;

        debug!(case = %label, command = script, "running shell command");
        let start = Instant::now();
        let output = Command::new(&self.shell)
            .args(&self.shell_args)
            .arg(script)
            .current_dir(context.working_dir())
            .envs(context.case_env(case))
            .output()
            .map_err(|e| BackendError {
                kind: BackendErrorKind::ExecutionFailed,
                message: format!("failed to run {}: {e}", self.shell),
                detail: Some(script.to_owned()),
            })?;
        let duration = start.elapsed();

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

        let mut result = if output.status.success() {
            CaseResult::passed(&label, duration)
        } else {
            let message = match output.status.code() {
                Some(code) => format!("command exited with code {code}"),
                None => "command was terminated by a signal".to_owned(),
            };
            let mut error = CaseError::new(CaseErrorKind::CommandFailed, message);
            if !stderr.trim().is_empty() {
                error = error.with_detail(stderr.trim_end());
            }
            CaseResult::failed(&label, duration, error)
        };
        result.stdout = stdout;
        result.stderr = stderr;
        Ok(result)
    }
}
