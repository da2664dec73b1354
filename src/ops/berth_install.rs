//! Implementation of `berth install`: resolve dependencies and generate.

use crate::builder::{generate, GenerateRequest, GeneratedArtifacts, RunEvent};
use crate::ops::errors::OrchestrateError;
use crate::ops::resolve::RunPlan;
use crate::sources::{
    DependencyProvider, DependencyResolutionError, ResolveRequest, ResolvedPackage,
};
use crate::util::shell::{Shell, Status};

/// Result of dependency resolution and generation.
#[derive(Debug, Clone)]
pub struct InstallOutcome {
    pub packages: Vec<ResolvedPackage>,
    pub artifacts: GeneratedArtifacts,
}

/// Locate every requirement with `provider`.
///
/// The provider must return exactly one package per requirement and nothing
/// else; anything more or less is reported as a resolution failure.
pub fn resolve_dependencies(
    plan: &RunPlan,
    provider: &dyn DependencyProvider,
    shell: &Shell,
) -> Result<Vec<ResolvedPackage>, OrchestrateError> {
    let spec = plan.recipe.requirements();
    if spec.is_empty() {
        return Ok(Vec::new());
    }

    let spinner = shell.spinner(
        Status::Resolving,
        format!("{} dependencies with {}", spec.len(), provider.name()),
    );
    let request = ResolveRequest {
        settings: &plan.settings,
        build_dir: &plan.layout.build_dir,
    };
    let packages = provider.resolve(spec, &request)?;
    spinner.finish();

    for req in spec.iter() {
        let found = packages
            .iter()
            .any(|p| p.name == req.name && p.version == req.version);
        if !found {
            return Err(DependencyResolutionError::new(
                provider.name(),
                format!("no package returned for `{}`", req),
            )
            .into());
        }
    }

    for pkg in &packages {
        if !spec.contains(&pkg.name) {
            return Err(DependencyResolutionError::new(
                provider.name(),
                format!("returned `{}/{}`, which the recipe does not require", pkg.name, pkg.version),
            )
            .into());
        }
        tracing::debug!("resolved {}/{} at {}", pkg.name, pkg.version, pkg.root.display());
    }

    shell.event(&RunEvent::DependenciesResolved {
        provider: provider.name().to_string(),
        packages: spec.iter().map(|r| r.to_string()).collect(),
    });

    Ok(packages)
}

/// Resolve dependencies and write the generated artifacts. No phase runs.
pub fn install(
    plan: &RunPlan,
    provider: &dyn DependencyProvider,
    shell: &Shell,
) -> Result<InstallOutcome, OrchestrateError> {
    shell.status(Status::Layout, plan.layout.build_dir.display());
    shell.event(&RunEvent::LayoutResolved {
        segment: plan.layout.segment.clone(),
        build_dir: plan.layout.build_dir.clone(),
    });

    let packages = resolve_dependencies(plan, provider, shell)?;

    let artifacts = generate(&GenerateRequest {
        layout: &plan.layout,
        settings: &plan.settings,
        host: &plan.host,
        packages: &packages,
        overrides: &plan.overrides,
        generator: plan.generator.as_deref(),
    })?;

    shell.status(
        Status::Generated,
        format!(
            "toolchain and {} descriptor(s) in {}",
            artifacts.descriptors.len(),
            artifacts.generators_dir.display()
        ),
    );
    shell.event(&RunEvent::ArtifactsGenerated {
        toolchain: artifacts.toolchain_file.clone(),
        descriptors: artifacts.descriptors.clone(),
        presets: Some(artifacts.presets_file.clone()),
    });

    Ok(InstallOutcome {
        packages,
        artifacts,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{sample_plan, StaticProvider};
    use crate::util::shell::ShellMode;
    use tempfile::TempDir;

    #[test]
    fn test_install_generates_one_descriptor_per_requirement() {
        let tmp = TempDir::new().unwrap();
        let plan = sample_plan(tmp.path());
        let provider = StaticProvider::for_spec(plan.recipe.requirements(), tmp.path());

        let outcome = install(&plan, &provider, &Shell::new(ShellMode::Json)).unwrap();

        assert_eq!(outcome.packages.len(), 3);
        assert_eq!(outcome.artifacts.descriptors.len(), 3);
        assert!(plan
            .layout
            .generators_dir
            .join("vulkan-loader-config.cmake")
            .is_file());
    }

    #[test]
    fn test_resolution_failure_writes_nothing() {
        let tmp = TempDir::new().unwrap();
        let plan = sample_plan(tmp.path());
        let provider = StaticProvider::failing("vcpkg: glfw3 has no version 3.4");

        let err = install(&plan, &provider, &Shell::new(ShellMode::Json)).unwrap_err();

        assert!(matches!(err, OrchestrateError::DependencyResolution(_)));
        assert!(!plan.layout.generators_dir.exists());
    }

    #[test]
    fn test_incomplete_resolution_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let plan = sample_plan(tmp.path());
        let partial = crate::core::DependencySpec::new().require("glfw", "3.4");
        let provider = StaticProvider::for_spec(&partial, tmp.path());

        let err = install(&plan, &provider, &Shell::new(ShellMode::Json)).unwrap_err();
        assert!(err.to_string().contains("vulkan-loader/1.3.239.0"));
    }

    #[test]
    fn test_unrequested_package_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let plan = sample_plan(tmp.path());
        let extra = plan.recipe.requirements().clone().require("zlib", "1.3.1");
        let provider = StaticProvider::for_spec(&extra, tmp.path());

        let err = install(&plan, &provider, &Shell::new(ShellMode::Json)).unwrap_err();
        assert!(err.to_string().contains("zlib/1.3.1"));
        assert!(!plan.layout.generators_dir.exists());
    }
}
