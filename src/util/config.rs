//! Configuration file support for Berth.
//!
//! Berth supports two configuration file locations:
//! - Global: `~/.berth/config.toml` - User-wide defaults
//! - Project: `.berth/config.toml` - Project-specific overrides
//!
//! Project config takes precedence over global config, and command-line
//! flags take precedence over both.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Berth configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Build settings
    pub build: BuildConfig,

    /// Dependency provider settings
    pub deps: DepsConfig,

    /// Default build settings (`os = "linux"`, `compiler.version = "13"`, ...)
    pub settings: BTreeMap<String, String>,
}

/// Build-related configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct BuildConfig {
    /// Build root overriding the recipe's `[layout] build-root`
    pub build_root: Option<PathBuf>,

    /// CMake generator (e.g., "Ninja")
    pub generator: Option<String>,

    /// Number of parallel build jobs
    pub jobs: Option<usize>,

    /// Path to the cmake executable
    pub cmake: Option<PathBuf>,

    /// Install destination for the install phase
    pub install_prefix: Option<PathBuf>,
}

/// Dependency provider configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DepsConfig {
    /// Provider name: "vcpkg" or "prefix"
    pub provider: Option<String>,

    /// Root of a pre-installed package tree (prefix provider)
    pub prefix: Option<PathBuf>,

    /// Vcpkg settings
    pub vcpkg: VcpkgConfig,
}

/// Vcpkg configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct VcpkgConfig {
    /// Path to the vcpkg root directory
    pub root: Option<PathBuf>,

    /// Target triplet (inferred from settings when unset)
    pub triplet: Option<String>,

    /// Baseline commit used for version overrides
    pub baseline: Option<String>,

    /// Recipe package name -> vcpkg port name (e.g., glfw = "glfw3")
    pub ports: BTreeMap<String, String>,
}

impl Config {
    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("failed to parse config file: {}", path.display()))
    }

    /// Load configuration with fallback to defaults if file doesn't exist.
    pub fn load_or_default(path: &Path) -> Self {
        if path.exists() {
            Self::load(path).unwrap_or_else(|e| {
                tracing::warn!("Failed to load config from {}: {:#}", path.display(), e);
                Self::default()
            })
        } else {
            Self::default()
        }
    }

    /// Merge another config into this one; values set in `other` win.
    pub fn merge(&mut self, other: Config) {
        let Config {
            build,
            deps,
            settings,
        } = other;

        override_with(&mut self.build.build_root, build.build_root);
        override_with(&mut self.build.generator, build.generator);
        override_with(&mut self.build.jobs, build.jobs);
        override_with(&mut self.build.cmake, build.cmake);
        override_with(&mut self.build.install_prefix, build.install_prefix);

        override_with(&mut self.deps.provider, deps.provider);
        override_with(&mut self.deps.prefix, deps.prefix);
        override_with(&mut self.deps.vcpkg.root, deps.vcpkg.root);
        override_with(&mut self.deps.vcpkg.triplet, deps.vcpkg.triplet);
        override_with(&mut self.deps.vcpkg.baseline, deps.vcpkg.baseline);
        self.deps.vcpkg.ports.extend(deps.vcpkg.ports);

        // Key by key
        self.settings.extend(settings);
    }

    /// Anchor relative paths at `base`. `build.cmake` is left alone so a
    /// bare program name is still looked up on `PATH`.
    pub fn resolve_paths(&mut self, base: &Path) {
        for path in [
            &mut self.build.build_root,
            &mut self.build.install_prefix,
            &mut self.deps.prefix,
            &mut self.deps.vcpkg.root,
        ]
        .into_iter()
        .flatten()
        {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        }
    }
}

fn override_with<T>(slot: &mut Option<T>, value: Option<T>) {
    if value.is_some() {
        *slot = value;
    }
}

/// Load the global config, then the project config over it.
///
/// Relative paths in the global file are taken from the berth home, those
/// in the project file from the recipe directory. Missing files are skipped.
pub fn load_config(global_path: &Path, project_path: &Path) -> Config {
    let mut config = Config::default();

    for path in [global_path, project_path] {
        if !path.exists() {
            continue;
        }
        let mut layer = Config::load_or_default(path);
        // `<home>/config.toml` and `<recipe>/.berth/config.toml`
        let base = if path == project_path {
            path.parent().and_then(Path::parent)
        } else {
            path.parent()
        };
        if let Some(base) = base {
            layer.resolve_paths(base);
        }
        config.merge(layer);
    }

    config
}

/// Get the global berth config directory (~/.berth).
pub fn global_config_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|b| b.home_dir().join(".berth"))
}

/// A settings profile file: a `[settings]` table, nothing else.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Profile {
    pub settings: BTreeMap<String, String>,
}

impl Profile {
    /// Load a profile from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read profile: {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("failed to parse profile: {}", path.display()))
    }
}
