//! CLI command definitions
//!
//! Defines the clap commands for the test harness CLI.

use clap::Subcommand;
use std::path::PathBuf;

#[derive(Subcommand)]
pub enum Commands {
    /// Run a registered test (all tests when no name is given)
    Run {
        /// Test name, e.g. ram_word
        name: Option<String>,

        /// Firmware program (YAML) to load instead of the test's built-in one
        #[arg(long)]
        program: Option<PathBuf>,

        /// Override the cycle timeout the test passes to test_configure
        #[arg(long)]
        timeout_cycles: Option<u64>,

        /// Write a JSON report of all runs to this file
        #[arg(long)]
        report: Option<PathBuf>,

        /// Print the simulation event trace after each test
        #[arg(long, short)]
        verbose: bool,
    },

    /// List registered tests
    List,

    /// Print a test's built-in firmware program as YAML
    Program {
        /// Test name
        #[arg(default_value = "ram_word")]
        name: String,
    },
}
