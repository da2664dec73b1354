//! Build phase sequencing.
//!
//! A run drives an external build system through three phases in a fixed
//! order:
//!
//! ```text
//! Start --configure--> Configured --build--> Built --install--> Done
//!   \                     \                    \
//!    +---------------------+--------------------+--> Failed(phase, cause)
//! ```
//!
//! Transitions are computed by [`DriverState::advance`], a pure function of
//! the current state and the outcome of the pending phase. `Done` and
//! `Failed` are terminal: no phase is skipped, repeated or retried.

use std::fmt;
use std::path::PathBuf;
use std::time::Instant;

use serde::Serialize;
use thiserror::Error;

use crate::builder::events::RunEvent;

/// One step of the external pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Configure,
    Build,
    Install,
}

impl Phase {
    /// All phases in execution order.
    pub const ALL: [Phase; 3] = [Phase::Configure, Phase::Build, Phase::Install];

    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Configure => "configure",
            Phase::Build => "build",
            Phase::Install => "install",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure reported by the build system for a single phase.
///
/// The tool's exit status is the only success signal; its output is carried
/// along unparsed.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct ToolFailure {
    pub message: String,
    /// Exit code, when the tool ran and exited normally
    pub exit_code: Option<i32>,
    /// Captured diagnostic output of the tool
    pub output: String,
}

impl ToolFailure {
    pub fn new(message: impl Into<String>) -> Self {
        ToolFailure {
            message: message.into(),
            exit_code: None,
            output: String::new(),
        }
    }

    pub fn with_exit_code(mut self, code: Option<i32>) -> Self {
        self.exit_code = code;
        self
    }

    pub fn with_output(mut self, output: impl Into<String>) -> Self {
        self.output = output.into();
        self
    }
}

/// A phase failed; the run stops here.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("build phase `{phase}` failed: {cause}")]
pub struct PhaseFailure {
    pub phase: Phase,
    pub cause: ToolFailure,
}

/// State of a phase run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DriverState {
    Start,
    Configured,
    Built,
    Done,
    Failed { phase: Phase, cause: ToolFailure },
}

impl DriverState {
    /// The phase that must run next, or `None` in a terminal state.
    pub fn pending_phase(&self) -> Option<Phase> {
        match self {
            DriverState::Start => Some(Phase::Configure),
            DriverState::Configured => Some(Phase::Build),
            DriverState::Built => Some(Phase::Install),
            DriverState::Done | DriverState::Failed { .. } => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.pending_phase().is_none()
    }

    /// Apply the outcome of the pending phase.
    ///
    /// Terminal states absorb every outcome unchanged.
    pub fn advance(self, outcome: Result<(), ToolFailure>) -> DriverState {
        let Some(phase) = self.pending_phase() else {
            return self;
        };

        match outcome {
            Err(cause) => DriverState::Failed { phase, cause },
            Ok(()) => match phase {
                Phase::Configure => DriverState::Configured,
                Phase::Build => DriverState::Built,
                Phase::Install => DriverState::Done,
            },
        }
    }

    /// Convert a terminal state into a run result.
    ///
    /// A non-terminal state has not finished and is reported as `Ok`.
    pub fn into_result(self) -> Result<(), PhaseFailure> {
        match self {
            DriverState::Failed { phase, cause } => Err(PhaseFailure { phase, cause }),
            _ => Ok(()),
        }
    }
}

/// Everything a build system needs to run the phases.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhaseContext {
    /// Project source directory (holds CMakeLists.txt)
    pub source_dir: PathBuf,
    /// Resolved build directory
    pub build_dir: PathBuf,
    /// Generated toolchain file
    pub toolchain_file: PathBuf,
    /// Configuration for multi-config generators (from `build_type`)
    pub build_type: Option<String>,
    /// Install destination
    pub install_prefix: PathBuf,
    /// Generator override (e.g. "Ninja")
    pub generator: Option<String>,
    /// Parallel build jobs
    pub jobs: Option<usize>,
}

/// The external build system driven through the phases.
pub trait BuildSystem {
    /// Build system name for display.
    fn name(&self) -> &str;

    fn configure(&self, ctx: &PhaseContext) -> Result<(), ToolFailure>;

    fn build(&self, ctx: &PhaseContext) -> Result<(), ToolFailure>;

    fn install(&self, ctx: &PhaseContext) -> Result<(), ToolFailure>;

    /// Run a single phase.
    fn run_phase(&self, phase: Phase, ctx: &PhaseContext) -> Result<(), ToolFailure> {
        match phase {
            Phase::Configure => self.configure(ctx),
            Phase::Build => self.build(ctx),
            Phase::Install => self.install(ctx),
        }
    }
}

/// Drives a build system from `Start` to a terminal state.
pub struct PhaseDriver<'a, B: BuildSystem + ?Sized> {
    system: &'a B,
    ctx: &'a PhaseContext,
}

impl<'a, B: BuildSystem + ?Sized> PhaseDriver<'a, B> {
    pub fn new(system: &'a B, ctx: &'a PhaseContext) -> Self {
        PhaseDriver { system, ctx }
    }

    /// Run all phases, stopping at the first failure.
    ///
    /// `on_event` receives a `phase-started` and a `phase-finished` event for
    /// every phase that is attempted.
    pub fn run(&self, mut on_event: impl FnMut(&RunEvent)) -> DriverState {
        let mut state = DriverState::Start;

        while let Some(phase) = state.pending_phase() {
            tracing::debug!("{}: running {} phase", self.system.name(), phase);
            on_event(&RunEvent::PhaseStarted { phase });

            let start = Instant::now();
            let outcome = self.system.run_phase(phase, self.ctx);

            on_event(&RunEvent::PhaseFinished {
                phase,
                success: outcome.is_ok(),
                duration_ms: start.elapsed().as_millis() as u64,
                exit_code: outcome.as_ref().err().and_then(|f| f.exit_code),
            });

            state = state.advance(outcome);
        }

        state
    }
}
