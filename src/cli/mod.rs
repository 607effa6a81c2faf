//! Command-line surface: shared argument types and the command functions.

pub mod commands;

use clap::{Args, ValueEnum};

use crate::plan::Selection;

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Output format for plans, chains and run reports.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, ValueEnum)]
pub enum Format {
    #[default]
    Text,
    Yaml,
    Json,
    /// JUnit XML; run reports only.
    Junit,
}

/// Which cases to keep, plus their transitive dependencies.
#[derive(Debug, Clone, Default, Args)]
pub struct SelectionArgs {
    /// Keep cases in this group (repeatable)
    #[arg(long = "group", value_name = "NAME")]
    pub groups: Vec<String>,

    /// Keep every method of this class (repeatable)
    #[arg(long = "class", value_name = "HOME")]
    pub classes: Vec<String>,

    /// Keep this function or method (repeatable)
    #[arg(long = "function", value_name = "HOME")]
    pub functions: Vec<String>,
}

impl SelectionArgs {
    pub fn to_selection(&self) -> Selection {
        let mut selection = Selection::new();
        for group in &self.groups {
            selection = selection.group(group.as_str());
        }
        for class in &self.classes {
            selection = selection.class(class.as_str());
        }
        for function in &self.functions {
            selection = selection.function(function.as_str());
        }
        selection
    }
}
