//! Settings, layout and provider resolution.
//!
//! Everything a run needs is resolved up front into an immutable
//! [`RunPlan`], which is then passed by reference to each step.

use std::path::{Path, PathBuf};

use anyhow::{bail, Result};

use crate::builder::detect::{detect_host_settings, host_platform};
use crate::core::{BuildLayout, RawVariables, Recipe, Settings};
use crate::ops::errors::OrchestrateError;
use crate::sources::{DependencyProvider, PrefixProvider, VcpkgProvider};
use crate::util::config::{Config, DepsConfig, Profile};

/// How settings are gathered.
#[derive(Debug, Clone, Default)]
pub struct SettingsOptions {
    /// `key=value` assignments from the command line (highest precedence)
    pub assignments: Vec<String>,
    /// Profile file with a `[settings]` table
    pub profile: Option<PathBuf>,
    /// Seed settings from the host platform and compiler
    pub detect: bool,
}

/// Collect settings for `recipe`, lowest to highest precedence:
/// host detection, config `[settings]`, profile, command line.
///
/// Settings whose root the recipe does not declare are dropped.
pub fn resolve_settings(
    recipe: &Recipe,
    config: &Config,
    opts: &SettingsOptions,
) -> Result<Settings> {
    let mut settings = if opts.detect {
        detect_host_settings()
    } else {
        Settings::new()
    };

    let from_config = Settings::from_table(&config.settings).map_err(OrchestrateError::from)?;
    settings.merge(&from_config);

    if let Some(ref path) = opts.profile {
        let profile = Profile::load(path)?;
        let from_profile =
            Settings::from_table(&profile.settings).map_err(OrchestrateError::from)?;
        settings.merge(&from_profile);
    }

    let from_cli =
        Settings::from_assignments(&opts.assignments).map_err(OrchestrateError::from)?;
    settings.merge(&from_cli);

    let declared = recipe.declared_settings();
    let restricted = settings.restrict_to(declared);
    if restricted.len() != settings.len() {
        tracing::debug!(
            "ignoring settings not declared by the recipe (declared: {:?})",
            declared.iter().map(|s| s.as_str()).collect::<Vec<_>>()
        );
    }

    tracing::debug!("settings: {}", restricted);
    Ok(restricted)
}

/// Inputs that shape a run besides settings.
#[derive(Debug, Clone, Default)]
pub struct PlanOptions {
    /// Build root override (relative paths are taken from the recipe directory)
    pub build_root: Option<PathBuf>,
    /// Extra overrides, applied over the recipe's `[toolchain.variables]`
    pub defines: RawVariables,
    /// Generator override
    pub generator: Option<String>,
}

/// The immutable configuration of one run.
#[derive(Debug, Clone)]
pub struct RunPlan {
    pub recipe: Recipe,
    pub settings: Settings,
    /// Host platform, used to detect cross builds
    pub host: Settings,
    pub build_root: PathBuf,
    pub layout: BuildLayout,
    pub overrides: RawVariables,
    pub generator: Option<String>,
}

impl RunPlan {
    /// Resolve the layout and the effective overrides.
    ///
    /// Fails with a missing-setting error before anything is written.
    pub fn new(
        recipe: Recipe,
        settings: Settings,
        opts: &PlanOptions,
    ) -> Result<RunPlan, OrchestrateError> {
        let build_root = resolve_build_root(&recipe, opts.build_root.as_deref());
        let layout = BuildLayout::resolve(&build_root, &recipe.layout.build_folder_vars, &settings)?;

        let mut overrides = recipe.toolchain.variables.clone();
        overrides.merge(&opts.defines);

        let generator = opts
            .generator
            .clone()
            .or_else(|| recipe.toolchain.generator.clone());

        Ok(RunPlan {
            recipe,
            settings,
            host: host_platform(),
            build_root,
            layout,
            overrides,
            generator,
        })
    }

    /// Recipe directory, which is also the CMake source directory.
    pub fn source_dir(&self) -> &Path {
        self.recipe.recipe_dir()
    }
}

/// The build root: an override if given (relative to the recipe
/// directory), otherwise the recipe's own.
pub fn resolve_build_root(recipe: &Recipe, build_root: Option<&Path>) -> PathBuf {
    match build_root {
        Some(root) if root.is_absolute() => root.to_path_buf(),
        Some(root) => recipe.recipe_dir().join(root),
        None => recipe.build_root(),
    }
}

/// Provider selection from the command line.
#[derive(Debug, Clone, Default)]
pub struct ProviderOptions {
    /// "vcpkg" or "prefix"
    pub provider: Option<String>,
    /// Prefix tree for the prefix provider
    pub prefix: Option<PathBuf>,
}

/// Pick the dependency provider. CLI flags override config.
///
/// Without an explicit choice, a configured prefix selects the prefix
/// provider and vcpkg is used otherwise.
pub fn select_provider(
    config: &DepsConfig,
    opts: &ProviderOptions,
) -> Result<Box<dyn DependencyProvider>> {
    let prefix = opts.prefix.clone().or_else(|| config.prefix.clone());
    let name = opts
        .provider
        .clone()
        .or_else(|| config.provider.clone())
        .unwrap_or_else(|| {
            if prefix.is_some() {
                "prefix".to_string()
            } else {
                "vcpkg".to_string()
            }
        });

    match name.as_str() {
        "vcpkg" => Ok(Box::new(VcpkgProvider::from_config(&config.vcpkg))),
        "prefix" => match prefix {
            Some(prefix) => Ok(Box::new(PrefixProvider::new(prefix))),
            None => bail!(
                "the prefix provider needs a package prefix\n\
                 hint: pass --dep-prefix or set `[deps] prefix` in .berth/config.toml"
            ),
        },
        other => bail!(
            "unknown dependency provider `{}`; expected `vcpkg` or `prefix`",
            other
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Setting;
    use crate::test_support::{write_recipe, VULKAN_RECIPE};
    use std::collections::BTreeMap;
    use tempfile::TempDir;

    fn recipe(tmp: &TempDir) -> Recipe {
        Recipe::load(&write_recipe(tmp.path(), VULKAN_RECIPE)).unwrap()
    }

    #[test]
    fn test_settings_precedence() {
        let tmp = TempDir::new().unwrap();
        let recipe = recipe(&tmp);

        let mut config = Config::default();
        config.settings = BTreeMap::from([
            ("os".to_string(), "linux".to_string()),
            ("compiler".to_string(), "gcc".to_string()),
        ]);

        let profile = tmp.path().join("msvc.toml");
        std::fs::write(
            &profile,
            "[settings]\ncompiler = \"msvc\"\n\"compiler.version\" = \"193\"\n",
        )
        .unwrap();

        let opts = SettingsOptions {
            assignments: vec!["os=windows".to_string(), "arch=x86_64".to_string()],
            profile: Some(profile),
            detect: false,
        };
        let settings = resolve_settings(&recipe, &config, &opts).unwrap();

        assert_eq!(settings.get(Setting::Os), Some("windows"));
        assert_eq!(settings.get(Setting::Compiler), Some("msvc"));
        assert_eq!(settings.get(Setting::CompilerVersion), Some("193"));
        assert_eq!(settings.get(Setting::Arch), Some("x86_64"));
    }

    #[test]
    fn test_unknown_setting_rejected() {
        let tmp = TempDir::new().unwrap();
        let opts = SettingsOptions {
            assignments: vec!["compiler.verison=193".to_string()],
            ..Default::default()
        };

        let err = resolve_settings(&recipe(&tmp), &Config::default(), &opts).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<OrchestrateError>(),
            Some(OrchestrateError::Settings(_))
        ));
    }

    #[test]
    fn test_plan_merges_defines_over_recipe_variables() {
        let tmp = TempDir::new().unwrap();
        let settings = Settings::new()
            .with(Setting::Os, "windows")
            .with(Setting::Arch, "x86_64")
            .with(Setting::Compiler, "msvc")
            .with(Setting::CompilerVersion, "193");
        let opts = PlanOptions {
            defines: RawVariables::new().set("CMAKE_VERBOSE_MAKEFILE", "OFF"),
            ..Default::default()
        };

        let plan = RunPlan::new(recipe(&tmp), settings, &opts).unwrap();

        assert_eq!(plan.layout.segment, "windows-x86_64-msvc-193");
        assert_eq!(plan.build_root, tmp.path().join("build"));
        assert_eq!(plan.layout.build_dir, tmp.path().join("build").join("windows-x86_64-msvc-193"));
        assert_eq!(plan.overrides.get("CMAKE_VERBOSE_MAKEFILE"), Some("OFF"));
        assert_eq!(plan.overrides.get("CMAKE_CXX_MODULE_STD"), Some("ON"));
    }

    #[test]
    fn test_plan_fails_on_missing_setting() {
        let tmp = TempDir::new().unwrap();
        let settings = Settings::new()
            .with(Setting::Os, "windows")
            .with(Setting::Arch, "x86_64")
            .with(Setting::Compiler, "msvc");

        let err = RunPlan::new(recipe(&tmp), settings, &PlanOptions::default()).unwrap_err();
        match err {
            OrchestrateError::MissingSetting(e) => assert_eq!(e.key, "compiler.version"),
            other => panic!("unexpected error: {other}"),
        }
        assert!(!tmp.path().join("build").exists());
    }

    #[test]
    fn test_select_provider() {
        let config = DepsConfig::default();

        let provider = select_provider(&config, &ProviderOptions::default()).unwrap();
        assert_eq!(provider.name(), "vcpkg");

        let opts = ProviderOptions {
            provider: None,
            prefix: Some(PathBuf::from("/opt/deps")),
        };
        assert_eq!(select_provider(&config, &opts).unwrap().name(), "prefix");

        let opts = ProviderOptions {
            provider: Some("prefix".to_string()),
            prefix: None,
        };
        assert!(select_provider(&config, &opts).is_err());

        let opts = ProviderOptions {
            provider: Some("conan".to_string()),
            prefix: None,
        };
        assert!(select_provider(&config, &opts).is_err());
    }
}
