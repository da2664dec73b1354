//! Run event types for JSON output.
//!
//! This module defines the JSON schema for machine-readable orchestration
//! output. These events are emitted when using `--message-format=json`, one
//! object per line, in lifecycle order.
//!
//! # Event Types
//!
//! - `layout-resolved`: the build directory was computed
//! - `dependencies-resolved`: every requirement was located
//! - `artifacts-generated`: descriptor and toolchain files were written
//! - `phase-started` / `phase-finished`: one pair per executed phase
//! - `run-finished`: the run ended (success or failure)
//!
//! # Stability
//!
//! New fields may be added, but existing fields should not be removed or renamed.

use std::path::PathBuf;

use serde::Serialize;

use crate::builder::phase::Phase;

/// An event emitted while a recipe is orchestrated.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "reason")]
pub enum RunEvent {
    /// The build directory was resolved from settings.
    #[serde(rename = "layout-resolved")]
    LayoutResolved {
        /// Folder name computed from the build folder key
        segment: String,
        build_dir: PathBuf,
    },

    /// Dependencies were located by a provider.
    #[serde(rename = "dependencies-resolved")]
    DependenciesResolved {
        provider: String,
        /// `name/version` of every resolved package
        packages: Vec<String>,
    },

    /// Generated artifacts were written.
    #[serde(rename = "artifacts-generated")]
    ArtifactsGenerated {
        toolchain: PathBuf,
        descriptors: Vec<PathBuf>,
        #[serde(skip_serializing_if = "Option::is_none")]
        presets: Option<PathBuf>,
    },

    /// A build phase started.
    #[serde(rename = "phase-started")]
    PhaseStarted { phase: Phase },

    /// A build phase ended.
    #[serde(rename = "phase-finished")]
    PhaseFinished {
        phase: Phase,
        success: bool,
        duration_ms: u64,
        #[serde(skip_serializing_if = "Option::is_none")]
        exit_code: Option<i32>,
    },

    /// The run ended.
    #[serde(rename = "run-finished")]
    RunFinished {
        success: bool,
        duration_ms: u64,
        /// Phase that failed, if any
        #[serde(skip_serializing_if = "Option::is_none")]
        failed_phase: Option<Phase>,
    },
}

impl RunEvent {
    /// Create a run finished event.
    pub fn finished(success: bool, duration_ms: u64, failed_phase: Option<Phase>) -> Self {
        RunEvent::RunFinished {
            success,
            duration_ms,
            failed_phase,
        }
    }

    /// Serialize this event to a JSON string.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}
