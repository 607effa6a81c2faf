use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use tether::cli::commands::{self, ChainsOptions, PlanOptions, PlanScope, RunOptions};
use tether::cli::{Format, LogLevel, SelectionArgs};
use tether::logging::init_logging;

#[derive(Parser)]
#[command(
    name = "tether",
    about = "Dependency-ordered test orchestration",
    version
)]
struct Cli {
    /// Log level (overrides TETHER_LOG)
    #[arg(long, value_enum, global = true)]
    log_level: Option<LogLevel>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Args)]
struct ScopeArgs {
    #[command(flatten)]
    selection: SelectionArgs,

    /// Only keep chains containing a home listed in this file
    #[arg(long, value_name = "FILE")]
    load_list: Option<PathBuf>,
}

impl ScopeArgs {
    fn into_scope(self) -> PlanScope {
        PlanScope {
            selection: self.selection.to_selection(),
            load_list: self.load_list,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Print the ordered test plan of a manifest
    Plan {
        /// Manifest file
        manifest: PathBuf,

        #[command(flatten)]
        scope: ScopeArgs,

        /// Output format (text, yaml, json)
        #[arg(long, value_enum, default_value = "text")]
        format: Format,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// List the independent chains of a manifest
    Chains {
        /// Manifest file
        manifest: PathBuf,

        #[command(flatten)]
        scope: ScopeArgs,

        /// Output format (text, yaml, json)
        #[arg(long, value_enum, default_value = "text")]
        format: Format,

        /// Print only the number of chains
        #[arg(long)]
        count: bool,

        /// Print only the first case of each chain
        #[arg(long, conflicts_with = "count")]
        shallow: bool,
    },

    /// Check that manifests register and sort cleanly
    Validate {
        /// Manifest files
        files: Vec<PathBuf>,
    },

    /// Run a manifest's cases through the shell backend
    Run {
        /// Manifest file
        manifest: PathBuf,

        #[command(flatten)]
        scope: ScopeArgs,

        /// Output format (text, yaml, json, junit)
        #[arg(long, value_enum, default_value = "text")]
        format: Format,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Chains run at once
        #[arg(short, long, default_value = "1")]
        jobs: usize,

        /// Stop starting new cases after the first failure
        #[arg(long)]
        fail_fast: bool,

        /// Print the plan and exit without running it
        #[arg(long)]
        show_plan: bool,

        /// Show failure details
        #[arg(short, long)]
        verbose: bool,
    },
}

fn exit_with(error: &str) -> ! {
    eprintln!("error: {error}");
    std::process::exit(1);
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_level);

    match cli.command {
        Some(Commands::Plan {
            manifest,
            scope,
            format,
            output,
        }) => {
            let options = PlanOptions {
                manifest,
                scope: scope.into_scope(),
                format,
                output,
            };
            match commands::run_plan(&options) {
                Ok(result) => print!("{result}"),
                Err(e) => exit_with(&e),
            }
        }
        Some(Commands::Chains {
            manifest,
            scope,
            format,
            count,
            shallow,
        }) => {
            let options = ChainsOptions {
                manifest,
                scope: scope.into_scope(),
                format,
                count,
                shallow,
            };
            match commands::run_chains(&options) {
                Ok(result) => print!("{result}"),
                Err(e) => exit_with(&e),
            }
        }
        Some(Commands::Validate { files }) => {
            if files.is_empty() {
                exit_with("no manifest files provided");
            }
            match commands::run_validate(&files) {
                Ok(result) => print!("{result}"),
                Err(e) => exit_with(&e),
            }
        }
        Some(Commands::Run {
            manifest,
            scope,
            format,
            output,
            jobs,
            fail_fast,
            show_plan,
            verbose,
        }) => {
            let options = RunOptions {
                manifest,
                scope: scope.into_scope(),
                format,
                output,
                jobs,
                fail_fast,
                show_plan,
                verbose,
            };
            match commands::run_run(&options) {
                Ok(true) => {}
                Ok(false) => std::process::exit(1),
                Err(e) => exit_with(&e),
            }
        }
        None => {
            // No subcommand: let clap print help
            Cli::parse_from(["tether", "--help"]);
        }
    }
}
