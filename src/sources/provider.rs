//! DependencyProvider trait - common interface for dependency managers.

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::core::{DependencySpec, Settings};

/// Failure reported by a dependency manager.
///
/// The message is the manager's own diagnostic; it is passed through
/// without interpretation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{provider}: {message}")]
pub struct DependencyResolutionError {
    /// Provider name (e.g. "vcpkg")
    pub provider: String,
    /// Diagnostic output from the provider
    pub message: String,
}

impl DependencyResolutionError {
    pub fn new(provider: impl Into<String>, message: impl Into<String>) -> Self {
        DependencyResolutionError {
            provider: provider.into(),
            message: message.into(),
        }
    }
}

/// A dependency located on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPackage {
    pub name: String,
    pub version: String,
    /// Installation root of the package
    pub root: PathBuf,
    pub include_dirs: Vec<PathBuf>,
    pub lib_dirs: Vec<PathBuf>,
    pub bin_dirs: Vec<PathBuf>,
    /// Library names to link (without prefix or extension)
    pub libs: Vec<String>,
}

impl ResolvedPackage {
    /// A package with the conventional `include/`, `lib/` and `bin/` layout under `root`.
    pub fn at_root(name: impl Into<String>, version: impl Into<String>, root: PathBuf) -> Self {
        ResolvedPackage {
            name: name.into(),
            version: version.into(),
            include_dirs: vec![root.join("include")],
            lib_dirs: vec![root.join("lib")],
            bin_dirs: vec![root.join("bin")],
            libs: Vec::new(),
            root,
        }
    }

    pub fn with_libs(mut self, libs: Vec<String>) -> Self {
        self.libs = libs;
        self
    }
}

/// Inputs a provider may consult while resolving.
#[derive(Debug, Clone, Copy)]
pub struct ResolveRequest<'a> {
    pub settings: &'a Settings,
    /// Resolved build directory; providers may stage files below it
    pub build_dir: &'a Path,
}

/// A dependency manager.
pub trait DependencyProvider {
    /// Provider name for display.
    fn name(&self) -> &str;

    /// Locate (fetching or installing as needed) every package in `spec`.
    ///
    /// The result contains exactly one entry per requirement.
    fn resolve(
        &self,
        spec: &DependencySpec,
        request: &ResolveRequest<'_>,
    ) -> Result<Vec<ResolvedPackage>, DependencyResolutionError>;
}

/// Extract a link name from a library file name.
///
/// `libglfw3.a` -> `glfw3`, `glfw3dll.lib` -> `glfw3dll`, `libvulkan.so` -> `vulkan`.
pub fn library_name(file_name: &str) -> Option<String> {
    let (stem, ext) = file_name.rsplit_once('.')?;
    match ext {
        "lib" => Some(stem.to_string()),
        "a" | "so" | "dylib" => Some(stem.strip_prefix("lib").unwrap_or(stem).to_string()),
        _ => None,
    }
}

/// List link names of the libraries directly inside `dir`, sorted and deduplicated.
pub fn scan_libraries(dir: &Path) -> Vec<String> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Vec::new();
    };

    let mut libs: Vec<String> = entries
        .filter_map(|e| e.ok())
        .filter(|e| e.path().is_file())
        .filter_map(|e| e.file_name().into_string().ok())
        .filter_map(|name| library_name(&name))
        .collect();
    libs.sort();
    libs.dedup();
    libs
}
