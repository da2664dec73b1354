//! CMake build system.
//!
//! Runs the three phases as separate CMake invocations:
//!
//! ```text
//! configure: cmake -S <src> -B <build> -DCMAKE_TOOLCHAIN_FILE=<toolchain> [-G <gen>]
//! build:     cmake --build <build> [--config <type>] [--parallel <n>]
//! install:   cmake --install <build> [--config <type>] --prefix <prefix>
//! ```

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use semver::Version;

use crate::builder::phase::{BuildSystem, Phase, PhaseContext, ToolFailure};
use crate::util::fs::cmake_path;
use crate::util::process::{find_cmake, ProcessBuilder};

/// Oldest CMake with `cmake --install`.
pub const MIN_CMAKE_VERSION: Version = Version::new(3, 15, 0);

/// CMake build system adapter.
#[derive(Debug, Clone)]
pub struct CMakeBuildSystem {
    cmake: PathBuf,
    /// Stream tool output to the terminal instead of capturing it
    inherit_output: bool,
}

impl CMakeBuildSystem {
    /// Use an explicit cmake executable.
    pub fn new(cmake: impl Into<PathBuf>) -> Self {
        CMakeBuildSystem {
            cmake: cmake.into(),
            inherit_output: false,
        }
    }

    /// Locate cmake: an explicit path if given, otherwise `PATH`.
    pub fn locate(explicit: Option<&Path>) -> Result<Self> {
        let cmake = match explicit {
            Some(path) => path.to_path_buf(),
            None => match find_cmake() {
                Some(path) => path,
                None => bail!(
                    "CMake not found\n\
                     \n\
                     CMake {} or newer is required to run the build phases.\n\
                     Install CMake and ensure it's in your PATH, or pass --cmake.",
                    MIN_CMAKE_VERSION
                ),
            },
        };
        Ok(CMakeBuildSystem::new(cmake))
    }

    /// Stream CMake's output live (verbose mode).
    pub fn inherit_output(mut self, inherit: bool) -> Self {
        self.inherit_output = inherit;
        self
    }

    /// Query `cmake --version` and require at least [`MIN_CMAKE_VERSION`].
    pub fn check_version(&self) -> Result<Version> {
        let output = ProcessBuilder::new(&self.cmake)
            .arg("--version")
            .exec_and_check()
            .context("failed to query the CMake version")?;

        let banner = output.stdout;
        let version = parse_cmake_version(&banner)
            .with_context(|| format!("unrecognized `cmake --version` output: {}", banner.trim()))?;

        if version < MIN_CMAKE_VERSION {
            bail!(
                "CMake {} is too old; {} or newer is required",
                version,
                MIN_CMAKE_VERSION
            );
        }

        tracing::debug!("using CMake {} at {}", version, self.cmake.display());
        Ok(version)
    }

    /// Command line for a phase.
    pub fn command(&self, phase: Phase, ctx: &PhaseContext) -> ProcessBuilder {
        let mut cmd = ProcessBuilder::new(&self.cmake);

        match phase {
            Phase::Configure => {
                cmd = cmd
                    .arg("-S")
                    .arg(&ctx.source_dir)
                    .arg("-B")
                    .arg(&ctx.build_dir)
                    .arg(format!(
                        "-DCMAKE_TOOLCHAIN_FILE={}",
                        cmake_path(&ctx.toolchain_file)
                    ));
                if let Some(ref generator) = ctx.generator {
                    cmd = cmd.arg("-G").arg(generator);
                }
            }
            Phase::Build => {
                cmd = cmd.arg("--build").arg(&ctx.build_dir);
                // Configuration (for multi-config generators like Visual Studio)
                if let Some(ref build_type) = ctx.build_type {
                    cmd = cmd.arg("--config").arg(build_type);
                }
                if let Some(jobs) = ctx.jobs {
                    cmd = cmd.arg("--parallel").arg(jobs.to_string());
                }
            }
            Phase::Install => {
                cmd = cmd.arg("--install").arg(&ctx.build_dir);
                if let Some(ref build_type) = ctx.build_type {
                    cmd = cmd.arg("--config").arg(build_type);
                }
                cmd = cmd.arg("--prefix").arg(&ctx.install_prefix);
            }
        }

        cmd
    }

    fn run(&self, phase: Phase, ctx: &PhaseContext) -> Result<(), ToolFailure> {
        let cmd = self.command(phase, ctx);

        if self.inherit_output {
            let status = cmd
                .status()
                .map_err(|e| ToolFailure::new(format!("{:#}", e)))?;
            if !status.success() {
                return Err(ToolFailure::new(format!(
                    "`{}` exited with {}",
                    cmd.display_command(),
                    status
                ))
                .with_exit_code(status.code()));
            }
            return Ok(());
        }

        let output = cmd
            .exec()
            .map_err(|e| ToolFailure::new(format!("{:#}", e)))?;

        if !output.success() {
            return Err(ToolFailure::new(format!(
                "`{}` exited with {}",
                cmd.display_command(),
                output.status
            ))
            .with_exit_code(output.code())
            .with_output(output.diagnostics()));
        }

        tracing::debug!("{}", output.stdout.trim_end());
        Ok(())
    }
}

impl BuildSystem for CMakeBuildSystem {
    fn name(&self) -> &str {
        "cmake"
    }

    fn configure(&self, ctx: &PhaseContext) -> Result<(), ToolFailure> {
        self.run(Phase::Configure, ctx)
    }

    fn build(&self, ctx: &PhaseContext) -> Result<(), ToolFailure> {
        self.run(Phase::Build, ctx)
    }

    fn install(&self, ctx: &PhaseContext) -> Result<(), ToolFailure> {
        self.run(Phase::Install, ctx)
    }
}

/// Extract the version from `cmake --version` output.
///
/// Handles `cmake version 3.28.3`, release candidates such as `3.30.0-rc1`
/// and versions with fewer than three components.
pub fn parse_cmake_version(banner: &str) -> Option<Version> {
    let word = banner
        .lines()
        .next()?
        .split_whitespace()
        .find(|w| w.starts_with(|c: char| c.is_ascii_digit()))?;

    if let Ok(version) = Version::parse(word) {
        return Some(version);
    }

    let core = word.split(['-', '+']).next()?;
    let mut parts = core.split('.').map(|p| p.parse::<u64>().ok());
    let major = parts.next()??;
    let minor = parts.next().flatten().unwrap_or(0);
    let patch = parts.next().flatten().unwrap_or(0);
    Some(Version::new(major, minor, patch))
}

/// Check if a directory contains a CMake project.
pub fn is_cmake_project(dir: &Path) -> bool {
    dir.join("CMakeLists.txt").exists()
}
