//! quickc CLI

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;

use cli::{Cli, Commands};
use quickc::builder::{InstallError, PlanError};
use quickc::core::ManifestError;
use quickc::resolver::ResolveError;
use quickc::util::diagnostic::{emit, Diagnostic};
use quickc::util::shell::{ColorChoice, Shell};
use quickc::util::GlobalContext;

fn main() {
    let cli = Cli::parse();
    let color = !cli.no_color;

    if let Err(e) = run(cli) {
        match diagnostic_for(&e) {
            Some(diag) => emit(&diag, color && std::io::IsTerminal::is_terminal(&std::io::stderr())),
            None => eprintln!("error: {:#}", e),
        }
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    // Set up logging
    let filter = if cli.verbose {
        EnvFilter::new("quickc=debug")
    } else if cli.quiet {
        EnvFilter::new("quickc=error")
    } else {
        EnvFilter::new("quickc=info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();

    let color = if cli.no_color {
        ColorChoice::Never
    } else {
        ColorChoice::Auto
    };
    let shell = Arc::new(Shell::from_flags(cli.quiet, cli.verbose, color));

    let ctx = GlobalContext::new()?;

    match cli.command {
        Commands::Build(args) => commands::build::execute(args, &ctx, shell),
        Commands::Settings(args) => commands::settings::execute(args, &ctx),
        Commands::Tree(args) => commands::tree::execute(args, &ctx),
        Commands::Clean(args) => commands::clean::execute(args, &ctx, &shell),
        Commands::Completions(args) => commands::completions::execute(args),
    }
}

/// Typed library errors get a rendered diagnostic instead of the plain chain.
fn diagnostic_for(err: &anyhow::Error) -> Option<Diagnostic> {
    if let Some(e) = err.downcast_ref::<ResolveError>() {
        return Some(e.to_diagnostic());
    }
    if let Some(e) = err.downcast_ref::<ManifestError>() {
        return Some(e.to_diagnostic());
    }
    if let Some(e) = err.downcast_ref::<InstallError>() {
        return Some(Diagnostic::error(e.to_string()).with_context(format!("{:#}", err)));
    }
    if let Some(e) = err.downcast_ref::<PlanError>() {
        return Some(Diagnostic::error(e.to_string()).with_context(format!("{:#}", err)));
    }
    None
}
