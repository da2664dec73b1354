//! Berth CLI - a recipe-driven build orchestrator for CMake projects

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;

use berth::core::RecipeParseError;
use berth::ops::OrchestrateError;
use berth::util::diagnostic::emit;
use berth::util::Shell;
use cli::{Cli, Commands, MessageFormat};

fn main() {
    // Parse CLI
    let cli = Cli::parse();

    // Set up logging
    let default_filter = if cli.verbose { "berth=debug" } else { "berth=warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();

    let shell = Shell::from_flags(
        cli.quiet,
        cli.verbose,
        cli.color,
        cli.message_format == MessageFormat::Json,
    );

    let color = shell.use_color();
    let _ = miette::set_hook(Box::new(move |_| {
        Box::new(miette::MietteHandlerOpts::new().color(color).build())
    }));

    if let Err(e) = run(cli.command, &shell) {
        if let Some(err) = e.downcast_ref::<OrchestrateError>() {
            emit(&err.to_diagnostic(), shell.use_color());
        } else {
            match e.downcast::<RecipeParseError>() {
                // Source-located errors get miette's annotated snippet
                Ok(err) => eprintln!("{:?}", miette::Report::new(err)),
                Err(e) => eprintln!("error: {:#}", e),
            }
        }
        std::process::exit(1);
    }
}

fn run(command: Commands, shell: &Shell) -> Result<()> {
    match command {
        Commands::Layout(args) => commands::layout::execute(args, shell),
        Commands::Deps(args) => commands::deps::execute(args),
        Commands::Install(args) => commands::install::execute(args, shell),
        Commands::Build(args) => commands::build::execute(args, shell),
        Commands::Clean(args) => commands::clean::execute(args, shell),
        Commands::Export(args) => commands::export::execute(args, shell),
        Commands::Completions(args) => commands::completions::execute(args),
    }
}
