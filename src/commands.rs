//! CLI command definitions
//!
//! Defines the clap commands for the yamltest CLI.

use clap::Subcommand;
use std::path::PathBuf;

#[derive(Subcommand)]
pub enum Commands {
    /// Run test scenarios
    Run {
        /// Scenario files, or directories searched recursively for them
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Print engine and plugin debug lines
        #[arg(long, short)]
        debug: bool,

        /// Configuration file to use instead of the default location
        #[arg(long, short)]
        config: Option<PathBuf>,

        /// Verbose output
        #[arg(long, short)]
        verbose: bool,

        /// Stop after the first scenario that fails
        #[arg(long)]
        fail_fast: bool,
    },

    /// List registered plugins and the test units they provide
    Plugins {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

impl Commands {
    /// Whether verbose logging was requested
    pub fn verbose(&self) -> bool {
        matches!(self, Commands::Run { verbose: true, .. })
    }
}
