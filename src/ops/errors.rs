//! Orchestration errors.
//!
//! Every failure of a run is fatal at first detection. Each variant names the
//! stage that failed; collaborator output is carried along unparsed.

use miette::Diagnostic as MietteDiagnostic;
use thiserror::Error;

use crate::builder::{ArtifactWriteError, PhaseFailure};
use crate::core::{
    InvalidFolderValueError, LayoutError, MissingSettingError, RecipeError, SettingsError,
};
use crate::sources::DependencyResolutionError;
use crate::util::diagnostic::{suggestions, Diagnostic};

/// A fatal orchestration error.
#[derive(Debug, Error, MietteDiagnostic)]
pub enum OrchestrateError {
    #[error(transparent)]
    #[diagnostic(code(berth::recipe::not_found), help("Run berth from a directory containing Berth.toml"))]
    Recipe(#[from] RecipeError),

    #[error("invalid settings: {0}")]
    #[diagnostic(code(berth::settings::invalid))]
    Settings(#[from] SettingsError),

    #[error("layout resolution failed: {0}")]
    #[diagnostic(code(berth::layout::missing_setting), help("Pass it with `-s <name>=<value>` or add it to a profile"))]
    MissingSetting(#[from] MissingSettingError),

    #[error("layout resolution failed: {0}")]
    #[diagnostic(code(berth::layout::invalid_value), help("Setting values must not contain path separators"))]
    InvalidFolderValue(#[from] InvalidFolderValueError),

    #[error("dependency resolution failed: {0}")]
    #[diagnostic(
        code(berth::deps::resolution_failed),
        help("Check the provider configuration in .berth/config.toml (`[deps]`)")
    )]
    DependencyResolution(#[from] DependencyResolutionError),

    #[error("artifact generation failed: {0}")]
    #[diagnostic(code(berth::generate::write_failed), help("Check permissions and free space for the build root"))]
    ArtifactWrite(#[from] ArtifactWriteError),

    #[error(transparent)]
    #[diagnostic(code(berth::phase::failed), help("Run `berth build --verbose` to see the full tool output"))]
    PhaseFailure(#[from] PhaseFailure),
}

impl From<LayoutError> for OrchestrateError {
    fn from(err: LayoutError) -> Self {
        match err {
            LayoutError::MissingSetting(e) => OrchestrateError::MissingSetting(e),
            LayoutError::InvalidValue(e) => OrchestrateError::InvalidFolderValue(e),
        }
    }
}

impl OrchestrateError {
    /// The lifecycle stage that failed.
    pub fn stage(&self) -> &'static str {
        match self {
            OrchestrateError::Recipe(_) => "recipe",
            OrchestrateError::Settings(_) => "settings",
            OrchestrateError::MissingSetting(_) | OrchestrateError::InvalidFolderValue(_) => {
                "layout"
            }
            OrchestrateError::DependencyResolution(_) => "dependencies",
            OrchestrateError::ArtifactWrite(_) => "generate",
            OrchestrateError::PhaseFailure(f) => f.phase.as_str(),
        }
    }

    /// Convert into a terminal diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        self.base_diagnostic().with_stage(self.stage())
    }

    fn base_diagnostic(&self) -> Diagnostic {
        match self {
            OrchestrateError::Recipe(e) => {
                Diagnostic::error(e.to_string()).with_suggestion(suggestions::NO_RECIPE)
            }
            OrchestrateError::Settings(e) => Diagnostic::error(format!("invalid settings: {}", e))
                .with_suggestion(format!(
                    "Known settings: {}",
                    crate::core::Setting::ALL
                        .iter()
                        .map(|s| s.as_str())
                        .collect::<Vec<_>>()
                        .join(", ")
                )),
            OrchestrateError::MissingSetting(e) => {
                Diagnostic::error(format!("layout resolution failed: {}", e))
                    .with_suggestion(format!(
                        "Pass it with `-s {}=<value>` or add it to a profile",
                        e.key
                    ))
            }
            OrchestrateError::InvalidFolderValue(e) => {
                Diagnostic::error(format!("layout resolution failed: {}", e)).with_suggestion(
                    format!("Pass a plain value, e.g. `-s {}=<value>` without `/` or `\\`", e.key),
                )
            }
            OrchestrateError::DependencyResolution(e) => {
                Diagnostic::error(format!("dependency resolution failed ({})", e.provider))
                    .with_context(e.message.clone())
                    .with_suggestion(suggestions::RESOLUTION_FAILED)
            }
            OrchestrateError::ArtifactWrite(e) => {
                Diagnostic::error(format!("artifact generation failed: {}", e.source))
                    .with_location(&e.path)
                    .with_suggestion(suggestions::WRITE_FAILED)
            }
            OrchestrateError::PhaseFailure(f) => {
                Diagnostic::error(format!("build phase `{}` failed", f.phase))
                    .with_context(f.cause.message.clone())
                    .with_context(f.cause.output.clone())
                    .with_suggestion(suggestions::PHASE_FAILED)
            }
        }
    }
}
