//! Berth - a recipe-driven build orchestrator for CMake projects
//!
//! This crate provides the core library functionality for Berth: settings
//! and build folder layout resolution, dependency provisioning, toolchain
//! generation and the configure/build/install phase driver.

pub mod builder;
pub mod core;
pub mod ops;
pub mod sources;
pub mod util;

/// Test utilities and mocks for Berth unit tests.
///
/// This module is only available when compiling with `--cfg test` or
/// running tests. It provides stand-ins for the dependency manager and
/// the build system.
#[cfg(test)]
pub mod test_support;

pub use core::{
    layout::BuildLayout, recipe::Recipe, settings::Settings, variables::RawVariables,
    DependencySpec,
};

pub use ops::{OrchestrateError, RunPlan};
pub use util::context::GlobalContext;
