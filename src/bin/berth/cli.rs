//! CLI definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;

use berth::util::shell::ColorChoice;

/// Berth - a recipe-driven build orchestrator for CMake projects
#[derive(Parser)]
#[command(name = "berth")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output (streams CMake output)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Only print errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Coloring: auto, always, never
    #[arg(long, global = true, value_name = "WHEN", default_value = "auto")]
    pub color: ColorChoice,

    /// Output format for messages
    #[arg(long, global = true, value_enum, default_value_t = MessageFormat::Human)]
    pub message_format: MessageFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum MessageFormat {
    Human,
    Json,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print the resolved build directory
    Layout(LayoutArgs),

    /// List the pinned dependencies
    Deps(DepsArgs),

    /// Resolve dependencies and generate the toolchain (no build)
    Install(InstallArgs),

    /// Resolve, generate, then configure, build and install
    Build(BuildArgs),

    /// Remove the build directory
    Clean(CleanArgs),

    /// Copy the recipe and its exported sources to a directory
    Export(ExportArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

/// Options that select the settings of a run.
#[derive(Args, Debug, Clone, Default)]
pub struct SettingsArgs {
    /// Set a build setting (e.g. `-s compiler.version=193`)
    #[arg(short = 's', long = "setting", value_name = "KEY=VALUE")]
    pub settings: Vec<String>,

    /// Settings profile file
    #[arg(long, value_name = "FILE")]
    pub profile: Option<PathBuf>,

    /// Do not detect settings from the host
    #[arg(long)]
    pub no_detect: bool,

    /// Build root (overrides `[layout] build-root`)
    #[arg(long, value_name = "DIR")]
    pub build_root: Option<PathBuf>,
}

/// Options that select the dependency provider.
#[derive(Args, Debug, Clone, Default)]
pub struct ProviderArgs {
    /// Dependency provider: vcpkg or prefix
    #[arg(long, value_name = "NAME")]
    pub provider: Option<String>,

    /// Pre-installed package tree for the prefix provider
    #[arg(long, value_name = "DIR")]
    pub dep_prefix: Option<PathBuf>,

    /// Extra toolchain variable (key taken verbatim)
    #[arg(short = 'D', long = "define", value_name = "KEY=VALUE")]
    pub defines: Vec<String>,
}

#[derive(Args)]
pub struct LayoutArgs {
    #[command(flatten)]
    pub settings: SettingsArgs,
}

#[derive(Args)]
pub struct DepsArgs {
    /// Print as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args)]
pub struct InstallArgs {
    #[command(flatten)]
    pub settings: SettingsArgs,

    #[command(flatten)]
    pub provider: ProviderArgs,

    /// CMake generator (e.g. Ninja)
    #[arg(short = 'G', long)]
    pub generator: Option<String>,
}

#[derive(Args)]
pub struct BuildArgs {
    #[command(flatten)]
    pub install: InstallArgs,

    /// Install destination (default: .berth/package next to the recipe)
    #[arg(long, value_name = "DIR")]
    pub install_prefix: Option<PathBuf>,

    /// Number of parallel jobs
    #[arg(short, long)]
    pub jobs: Option<usize>,

    /// Path to the cmake executable
    #[arg(long, env = "BERTH_CMAKE", value_name = "PATH")]
    pub cmake: Option<PathBuf>,
}

#[derive(Args)]
pub struct CleanArgs {
    #[command(flatten)]
    pub settings: SettingsArgs,

    /// Remove the whole build root
    #[arg(long)]
    pub all: bool,
}

#[derive(Args)]
pub struct ExportArgs {
    /// Destination directory
    pub dest: PathBuf,
}

#[derive(Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}
