//! CLI definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;

/// quickc - path-based unit dependencies for C/C++ projects
#[derive(Parser)]
#[command(name = "quickc")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Print errors only
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Evaluate units and build them
    Build(BuildArgs),

    /// Print the exported settings of every evaluated unit as JSON
    Settings(SettingsArgs),

    /// Display the unit dependency tree
    Tree(TreeArgs),

    /// Remove build and export trees
    Clean(CleanArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Args)]
pub struct BuildArgs {
    /// Units to build (defaults to the project's root units)
    pub units: Vec<String>,

    /// Build the release variant
    #[arg(short, long, env = "QUICKC_RELEASE")]
    pub release: bool,

    /// Number of parallel jobs
    #[arg(short, long)]
    pub jobs: Option<usize>,

    /// Print the build plan as JSON (no build)
    #[arg(long)]
    pub plan: bool,

    /// Write the settings snapshot to FILE
    #[arg(long, value_name = "FILE")]
    pub manifest_out: Option<PathBuf>,
}

#[derive(Args)]
pub struct SettingsArgs {
    /// Only print this unit (a path relative to the project root)
    pub unit: Option<String>,

    /// Use the release variant
    #[arg(short, long, env = "QUICKC_RELEASE")]
    pub release: bool,
}

#[derive(Args)]
pub struct TreeArgs {
    /// Use the release variant
    #[arg(short, long, env = "QUICKC_RELEASE")]
    pub release: bool,
}

#[derive(Args)]
pub struct CleanArgs {
    /// Clean the release variant
    #[arg(short, long, env = "QUICKC_RELEASE")]
    pub release: bool,

    /// Clean every variant
    #[arg(long)]
    pub all: bool,
}

#[derive(Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}
