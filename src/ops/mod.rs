//! High-level operations.
//!
//! This module contains the implementation of Berth commands.

pub mod berth_build;
pub mod berth_clean;
pub mod berth_export;
pub mod berth_install;
pub mod errors;
pub mod resolve;

pub use berth_build::{build, BuildOptions, BuildOutcome};
pub use berth_clean::clean;
pub use berth_export::{export, ExportOutcome};
pub use berth_install::{install, resolve_dependencies, InstallOutcome};
pub use errors::OrchestrateError;
pub use resolve::{
    resolve_build_root, resolve_settings, select_provider, PlanOptions, ProviderOptions, RunPlan,
    SettingsOptions,
};
