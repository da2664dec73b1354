//! Implementation of `berth build`.
//!
//! A full run: layout, dependencies, generation, then configure, build and
//! install. The first failure ends the run.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use crate::builder::{
    BuildSystem, GeneratedArtifacts, Phase, PhaseContext, PhaseDriver, RunEvent,
};
use crate::core::Setting;
use crate::ops::berth_install::{install, InstallOutcome};
use crate::ops::errors::OrchestrateError;
use crate::ops::resolve::RunPlan;
use crate::sources::DependencyProvider;
use crate::util::shell::{Shell, Spinner, Status};

/// Options for the build command.
#[derive(Debug, Clone)]
pub struct BuildOptions {
    /// Install destination
    pub install_prefix: PathBuf,

    /// Number of parallel jobs
    pub jobs: Option<usize>,
}

/// Result of a successful run.
#[derive(Debug, Clone)]
pub struct BuildOutcome {
    pub install: InstallOutcome,
    pub install_prefix: PathBuf,
    pub duration: Duration,
}

/// Phase inputs for a plan and its generated artifacts.
pub fn phase_context(
    plan: &RunPlan,
    artifacts: &GeneratedArtifacts,
    opts: &BuildOptions,
) -> PhaseContext {
    PhaseContext {
        source_dir: plan.source_dir().to_path_buf(),
        build_dir: plan.layout.build_dir.clone(),
        toolchain_file: artifacts.toolchain_file.clone(),
        build_type: plan.settings.get(Setting::BuildType).map(str::to_string),
        install_prefix: opts.install_prefix.clone(),
        generator: plan.generator.clone(),
        jobs: opts.jobs,
    }
}

fn phase_status(phase: Phase) -> Status {
    match phase {
        Phase::Configure => Status::Configuring,
        Phase::Build => Status::Building,
        Phase::Install => Status::Installing,
    }
}

/// Run the whole pipeline.
pub fn build(
    plan: &RunPlan,
    provider: &dyn DependencyProvider,
    system: &dyn BuildSystem,
    opts: &BuildOptions,
    shell: &Shell,
) -> Result<BuildOutcome, OrchestrateError> {
    let start = Instant::now();
    let result = run(plan, provider, system, opts, shell);

    let failed_phase = match &result {
        Err(OrchestrateError::PhaseFailure(f)) => Some(f.phase),
        _ => None,
    };
    shell.event(&RunEvent::finished(
        result.is_ok(),
        start.elapsed().as_millis() as u64,
        failed_phase,
    ));

    result.map(|install| BuildOutcome {
        install,
        install_prefix: opts.install_prefix.clone(),
        duration: start.elapsed(),
    })
}

fn run(
    plan: &RunPlan,
    provider: &dyn DependencyProvider,
    system: &dyn BuildSystem,
    opts: &BuildOptions,
    shell: &Shell,
) -> Result<InstallOutcome, OrchestrateError> {
    let outcome = install(plan, provider, shell)?;
    let ctx = phase_context(plan, &outcome.artifacts, opts);
    let package = &plan.recipe.package;

    let mut spinner: Option<Spinner> = None;
    let state = PhaseDriver::new(system, &ctx).run(|event| {
        shell.event(event);
        match event {
            RunEvent::PhaseStarted { phase } => {
                spinner = Some(shell.spinner(
                    phase_status(*phase),
                    format!("{} v{} ({})", package.name, package.version, system.name()),
                ));
            }
            RunEvent::PhaseFinished { .. } => {
                if let Some(s) = spinner.take() {
                    s.finish();
                }
            }
            _ => {}
        }
    });

    state.into_result()?;
    Ok(outcome)
}
