//! Root CLI structure for dehacked-rs

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "dehacked-rs")]
#[command(about = "Command-line tools for DeHackEd baselines and patches", long_about = None)]
#[command(version)]
#[command(author)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Verbosity level (can be repeated for more detail)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Baseline definition operations
    Baseline {
        #[command(subcommand)]
        command: crate::commands::baseline::BaselineCommands,
    },

    /// Patch generation operations
    Patch {
        #[command(subcommand)]
        command: crate::commands::patch::PatchCommands,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}
