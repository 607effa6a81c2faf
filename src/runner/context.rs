use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::plan::TestCase;

/// Environment handed to a backend for each case.
///
/// Holds the working directory, the chain being run and any extra
/// environment variables passed through from the run configuration.
#[derive(Debug, Clone)]
pub struct RunContext {
    working_dir: PathBuf,
    /// Index of the chain this context runs, in partition order.
    pub chain: usize,
    env: BTreeMap<String, String>,
}

impl RunContext {
    pub fn new(working_dir: impl Into<PathBuf>) -> Self {
        Self {
            working_dir: working_dir.into(),
            chain: 0,
            env: BTreeMap::new(),
        }
    }

    pub fn for_chain(&self, chain: usize) -> Self {
        Self {
            chain,
            ..self.clone()
        }
    }

    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    pub fn set_env(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.env.insert(key.into(), value.into());
    }

    /// Variables describing `case` to a child process, on top of the
    /// configured ones.
    pub fn case_env(&self, case: &TestCase) -> BTreeMap<String, String> {
        let mut env = self.env.clone();
        env.insert("TETHER_CASE".to_owned(), case.label());
        env.insert("TETHER_CHAIN".to_owned(), self.chain.to_string());
        if let Some(class) = case.entry().class_home() {
            env.insert("TETHER_CLASS".to_owned(), class.to_string());
        }
        env
    }
}
