//! Prefix provider - packages pre-installed in a local directory tree.
//!
//! Layout: `<prefix>/<name>/<version>/{include,lib,bin}`.

use std::path::{Path, PathBuf};

use crate::core::DependencySpec;
use crate::sources::provider::{
    scan_libraries, DependencyProvider, DependencyResolutionError, ResolveRequest,
    ResolvedPackage,
};

/// Resolves packages from a local install prefix.
#[derive(Debug, Clone)]
pub struct PrefixProvider {
    prefix: PathBuf,
}

impl PrefixProvider {
    pub fn new(prefix: impl Into<PathBuf>) -> Self {
        PrefixProvider {
            prefix: prefix.into(),
        }
    }

    pub fn prefix(&self) -> &Path {
        &self.prefix
    }

    fn package_root(&self, name: &str, version: &str) -> PathBuf {
        self.prefix.join(name).join(version)
    }
}

impl DependencyProvider for PrefixProvider {
    fn name(&self) -> &str {
        "prefix"
    }

    fn resolve(
        &self,
        spec: &DependencySpec,
        _request: &ResolveRequest<'_>,
    ) -> Result<Vec<ResolvedPackage>, DependencyResolutionError> {
        let mut resolved = Vec::with_capacity(spec.len());
        let mut missing = Vec::new();

        for req in spec.iter() {
            let root = self.package_root(&req.name, &req.version);
            if !root.is_dir() {
                missing.push(req.to_string());
                continue;
            }

            tracing::debug!("found {} at {}", req, root.display());
            let libs = scan_libraries(&root.join("lib"));
            resolved.push(ResolvedPackage::at_root(&req.name, &req.version, root).with_libs(libs));
        }

        if !missing.is_empty() {
            return Err(DependencyResolutionError::new(
                self.name(),
                format!(
                    "not installed under {}: {}",
                    self.prefix.display(),
                    missing.join(", ")
                ),
            ));
        }

        Ok(resolved)
    }
}
