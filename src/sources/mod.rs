//! Dependency providers.
//!
//! Providers locate the pinned packages a recipe requires, either in a
//! pre-populated prefix or by driving vcpkg.

pub mod prefix;
pub mod provider;
pub mod vcpkg;

pub use prefix::PrefixProvider;
pub use provider::{
    DependencyProvider, DependencyResolutionError, ResolveRequest, ResolvedPackage,
};
pub use vcpkg::VcpkgProvider;
