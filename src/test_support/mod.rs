//! Test utilities and mocks for Berth unit tests.
//!
//! Provides in-memory stand-ins for the two external collaborators of a
//! run, the dependency manager and the build system, so the orchestration
//! can be tested without vcpkg or CMake installed.
//!
//! # Example
//!
//! ```rust,ignore
//! use berth::test_support::{sample_plan, RecordingBuildSystem, StaticProvider};
//!
//! #[test]
//! fn test_example() {
//!     let tmp = tempfile::TempDir::new().unwrap();
//!     let plan = sample_plan(tmp.path());
//!     let provider = StaticProvider::for_spec(plan.recipe.requirements(), tmp.path());
//!     let system = RecordingBuildSystem::failing_at(Phase::Build);
//!     // Drive the run...
//! }
//! ```

pub mod fixtures;

use std::path::Path;
use std::sync::Mutex;

use crate::builder::{BuildSystem, Phase, PhaseContext, ToolFailure};
use crate::core::DependencySpec;
use crate::sources::{
    DependencyProvider, DependencyResolutionError, ResolveRequest, ResolvedPackage,
};

// Re-export fixtures for convenience
pub use fixtures::*;

/// Build system that records the phases it is asked to run.
///
/// Optionally fails at one phase with exit code 1.
#[derive(Debug, Default)]
pub struct RecordingBuildSystem {
    fail_at: Option<Phase>,
    calls: Mutex<Vec<Phase>>,
    last_context: Mutex<Option<PhaseContext>>,
}

impl RecordingBuildSystem {
    /// A build system where every phase succeeds.
    pub fn new() -> Self {
        RecordingBuildSystem::default()
    }

    /// A build system that fails at `phase`.
    pub fn failing_at(phase: Phase) -> Self {
        RecordingBuildSystem {
            fail_at: Some(phase),
            ..Default::default()
        }
    }

    /// Phases run so far, in order.
    pub fn calls(&self) -> Vec<Phase> {
        self.calls.lock().unwrap().clone()
    }

    /// Context passed to the most recent phase.
    pub fn last_context(&self) -> Option<PhaseContext> {
        self.last_context.lock().unwrap().clone()
    }

    fn record(&self, phase: Phase, ctx: &PhaseContext) -> Result<(), ToolFailure> {
        self.calls.lock().unwrap().push(phase);
        *self.last_context.lock().unwrap() = Some(ctx.clone());

        if self.fail_at == Some(phase) {
            return Err(ToolFailure::new(format!("mock {} failed", phase))
                .with_exit_code(Some(1))
                .with_output(format!("error: {} step failed", phase)));
        }
        Ok(())
    }
}

impl BuildSystem for RecordingBuildSystem {
    fn name(&self) -> &str {
        "recording"
    }

    fn configure(&self, ctx: &PhaseContext) -> Result<(), ToolFailure> {
        self.record(Phase::Configure, ctx)
    }

    fn build(&self, ctx: &PhaseContext) -> Result<(), ToolFailure> {
        self.record(Phase::Build, ctx)
    }

    fn install(&self, ctx: &PhaseContext) -> Result<(), ToolFailure> {
        self.record(Phase::Install, ctx)
    }
}

/// Dependency provider with a fixed answer.
#[derive(Debug, Clone)]
pub struct StaticProvider {
    result: Result<Vec<ResolvedPackage>, DependencyResolutionError>,
}

impl StaticProvider {
    /// Resolve every requirement of `spec` to `root/deps/<name>`.
    pub fn for_spec(spec: &DependencySpec, root: &Path) -> Self {
        let deps = root.join("deps");
        let packages = spec
            .iter()
            .map(|req| {
                let pkg_root = deps.join(&req.name);
                ResolvedPackage::at_root(req.name, req.version, pkg_root)
            })
            .collect();
        StaticProvider {
            result: Ok(packages),
        }
    }

    /// Fail every resolution with `message`.
    pub fn failing(message: &str) -> Self {
        StaticProvider {
            result: Err(DependencyResolutionError::new("static", message)),
        }
    }
}

impl DependencyProvider for StaticProvider {
    fn name(&self) -> &str {
        "static"
    }

    fn resolve(
        &self,
        _spec: &DependencySpec,
        _request: &ResolveRequest<'_>,
    ) -> Result<Vec<ResolvedPackage>, DependencyResolutionError> {
        self.result.clone()
    }
}
