use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "campctl")]
#[command(about = "Bring the ATDD camping environment up and down, and bootstrap its repositories", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Settings file (defaults to campctl.toml under --root, or the working
    /// directory, when present)
    #[arg(long, global = true, env = "CAMPCTL_CONFIG")]
    pub config: Option<PathBuf>,

    /// Project root; also where the default campctl.toml is looked up
    #[arg(long, global = true)]
    pub root: Option<PathBuf>,

    /// Print plans and reports as JSON
    #[arg(long, global = true)]
    pub json: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run one or more tasks, plus everything they depend on
    Run {
        /// Task names, e.g. allUp or cloneRepos
        #[arg(required = true)]
        tasks: Vec<String>,

        /// Keep running tasks that do not depend on a failed one
        #[arg(long = "continue")]
        continue_on_failure: bool,

        /// Print the execution plan without running anything
        #[arg(long)]
        dry_run: bool,
    },

    /// List the available tasks by group
    Tasks,
}
