//! Artifact generation and phase execution.
//!
//! This module turns a resolved layout and dependency set into generated
//! CMake inputs, then drives the external build system through its phases.

pub mod cmake;
pub mod descriptor;
pub mod detect;
pub mod events;
pub mod generate;
pub mod phase;
pub mod presets;
pub mod toolchain;

pub use cmake::CMakeBuildSystem;
pub use events::RunEvent;
pub use generate::{generate, ArtifactWriteError, GenerateRequest, GeneratedArtifacts};
pub use phase::{
    BuildSystem, DriverState, Phase, PhaseContext, PhaseDriver, PhaseFailure, ToolFailure,
};
pub use toolchain::KnownVariable;
