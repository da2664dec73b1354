//! Artifact generation.
//!
//! Writes the dependency descriptors, the toolchain file and the presets into
//! `<build_dir>/generators/`. The directory is wiped first, so a second run
//! with the same inputs leaves byte-identical files and nothing stale.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::builder::descriptor::{descriptor_file_name, render_descriptor};
use crate::builder::presets::{render_presets, PresetsInput, PRESETS_FILE};
use crate::builder::toolchain::{
    derive_variables, shadowed_variables, ToolchainFile, TOOLCHAIN_FILE,
};
use crate::core::{BuildLayout, RawVariables, Setting, Settings};
use crate::sources::ResolvedPackage;

/// The build directory could not be prepared or written.
#[derive(Debug, Error)]
#[error("failed to write `{}`: {source}", path.display())]
pub struct ArtifactWriteError {
    pub path: PathBuf,
    #[source]
    pub source: io::Error,
}

impl ArtifactWriteError {
    fn at(path: &Path) -> impl FnOnce(io::Error) -> ArtifactWriteError + '_ {
        move |source| ArtifactWriteError {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Everything the generator needs. Borrowed, never mutated.
#[derive(Debug, Clone, Copy)]
pub struct GenerateRequest<'a> {
    pub layout: &'a BuildLayout,
    pub settings: &'a Settings,
    /// Host platform, used to detect cross builds
    pub host: &'a Settings,
    pub packages: &'a [ResolvedPackage],
    pub overrides: &'a RawVariables,
    pub generator: Option<&'a str>,
}

/// Files written by a generate step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedArtifacts {
    pub generators_dir: PathBuf,
    pub toolchain_file: PathBuf,
    /// One descriptor per resolved package, in package order
    pub descriptors: Vec<PathBuf>,
    pub presets_file: PathBuf,
}

/// Write all artifacts for `request`.
pub fn generate(request: &GenerateRequest<'_>) -> Result<GeneratedArtifacts, ArtifactWriteError> {
    let dir = &request.layout.generators_dir;

    for lint in request.overrides.lint() {
        tracing::warn!("{}", lint);
    }
    for var in shadowed_variables(request.overrides) {
        tracing::warn!("toolchain variable `{}` overrides the value derived from settings", var);
    }

    if dir.exists() {
        fs::remove_dir_all(dir).map_err(ArtifactWriteError::at(dir))?;
    }
    fs::create_dir_all(dir).map_err(ArtifactWriteError::at(dir))?;

    let mut descriptors = Vec::with_capacity(request.packages.len());
    for pkg in request.packages {
        let path = dir.join(descriptor_file_name(&pkg.name));
        write_file(&path, &render_descriptor(pkg))?;
        descriptors.push(path);
    }

    let toolchain_file = dir.join(TOOLCHAIN_FILE);
    let toolchain = ToolchainFile {
        segment: &request.layout.segment,
        variables: derive_variables(request.settings, request.host),
        generators_dir: dir.clone(),
        packages: request.packages.iter().map(|p| p.name.as_str()).collect(),
        overrides: request.overrides,
    };
    write_file(&toolchain_file, &toolchain.render())?;

    let presets_file = dir.join(PRESETS_FILE);
    let presets = render_presets(&PresetsInput {
        name: request.layout.preset_name(),
        build_dir: &request.layout.build_dir,
        toolchain_file: &toolchain_file,
        generator: request.generator,
        build_type: request.settings.get(Setting::BuildType),
    });
    write_file(&presets_file, &presets)?;

    tracing::debug!(
        "generated {} descriptor(s) and toolchain in {}",
        descriptors.len(),
        dir.display()
    );

    Ok(GeneratedArtifacts {
        generators_dir: dir.clone(),
        toolchain_file,
        descriptors,
        presets_file,
    })
}

fn write_file(path: &Path, content: &str) -> Result<(), ArtifactWriteError> {
    fs::write(path, content).map_err(ArtifactWriteError::at(path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::BuildFolderKey;
    use crate::test_support::{sample_packages, sample_settings};
    use tempfile::TempDir;

    fn layout(root: &Path) -> BuildLayout {
        let key = BuildFolderKey::required([
            Setting::Os,
            Setting::Arch,
            Setting::Compiler,
            Setting::CompilerVersion,
        ]);
        BuildLayout::resolve(root, &key, &sample_settings()).unwrap()
    }

    fn request<'a>(
        layout: &'a BuildLayout,
        settings: &'a Settings,
        packages: &'a [ResolvedPackage],
        overrides: &'a RawVariables,
    ) -> GenerateRequest<'a> {
        GenerateRequest {
            layout,
            settings,
            host: settings,
            packages,
            overrides,
            generator: None,
        }
    }

    #[test]
    fn test_generate_writes_all_artifacts() {
        let tmp = TempDir::new().unwrap();
        let layout = layout(tmp.path());
        let settings = sample_settings();
        let packages = sample_packages(tmp.path());
        let overrides = RawVariables::new().set("CMAKE_CXX_MODULE_STD", "ON");

        let artifacts = generate(&request(&layout, &settings, &packages, &overrides)).unwrap();

        assert_eq!(artifacts.descriptors.len(), packages.len());
        for descriptor in &artifacts.descriptors {
            assert!(descriptor.is_file());
            assert!(descriptor.starts_with(&layout.build_dir));
        }
        assert!(artifacts.toolchain_file.is_file());
        assert!(artifacts.presets_file.is_file());
        assert!(artifacts
            .generators_dir
            .ends_with("windows-x86_64-msvc-193/generators"));
    }

    #[test]
    fn test_generate_is_idempotent() {
        let tmp = TempDir::new().unwrap();
        let layout = layout(tmp.path());
        let settings = sample_settings();
        let packages = sample_packages(tmp.path());
        let overrides = RawVariables::new().set("CMAKE_CXX_MODULE_STD ", "ON");
        let req = request(&layout, &settings, &packages, &overrides);

        let first = generate(&req).unwrap();
        let snapshot: Vec<(PathBuf, Vec<u8>)> = first
            .descriptors
            .iter()
            .chain([&first.toolchain_file, &first.presets_file])
            .map(|p| (p.clone(), fs::read(p).unwrap()))
            .collect();

        // A stale file from an earlier run must not survive
        fs::write(layout.generators_dir.join("stale-config.cmake"), "old").unwrap();

        let second = generate(&req).unwrap();
        assert_eq!(first, second);
        for (path, bytes) in snapshot {
            assert_eq!(fs::read(&path).unwrap(), bytes, "{} changed", path.display());
        }
        assert!(!layout.generators_dir.join("stale-config.cmake").exists());
    }

    #[test]
    fn test_generate_reports_unwritable_directory() {
        let tmp = TempDir::new().unwrap();
        // A regular file where the build root should be
        let blocker = tmp.path().join("build");
        fs::write(&blocker, "not a directory").unwrap();

        let layout = layout(&blocker);
        let settings = sample_settings();
        let overrides = RawVariables::new();

        let err = generate(&request(&layout, &settings, &[], &overrides)).unwrap_err();
        assert_eq!(err.path, layout.generators_dir);
        assert!(err.to_string().contains("failed to write"));
    }
}
