//! Running external tools.
//!
//! Every collaborator (CMake, vcpkg, the host compiler) is invoked through
//! [`ProcessBuilder`]. Captured output is decoded once into a [`ToolOutput`]
//! so callers can pass it through to diagnostics unparsed.

use std::collections::BTreeMap;
use std::ffi::OsStr;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};

use anyhow::{bail, Context, Result};

/// A command line to run.
#[derive(Debug, Clone)]
pub struct ProcessBuilder {
    program: PathBuf,
    args: Vec<String>,
    env: BTreeMap<String, String>,
    cwd: Option<PathBuf>,
}

/// Decoded result of a captured run.
#[derive(Debug, Clone)]
pub struct ToolOutput {
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
}

impl ToolOutput {
    pub fn success(&self) -> bool {
        self.status.success()
    }

    pub fn code(&self) -> Option<i32> {
        self.status.code()
    }

    /// The tool's diagnostic text: stderr, or stdout when stderr is empty.
    ///
    /// CMake reports configure errors on stderr, but generator errors (make,
    /// ninja) arrive on stdout.
    pub fn diagnostics(&self) -> &str {
        if self.stderr.trim().is_empty() {
            self.stdout.trim_end()
        } else {
            self.stderr.trim_end()
        }
    }
}

impl ProcessBuilder {
    pub fn new(program: impl AsRef<Path>) -> Self {
        ProcessBuilder {
            program: program.as_ref().to_path_buf(),
            args: Vec::new(),
            env: BTreeMap::new(),
            cwd: None,
        }
    }

    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_string_lossy().into_owned());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        for arg in args {
            self = self.arg(arg);
        }
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// Run in `cwd` instead of the current directory.
    pub fn cwd(mut self, cwd: impl AsRef<Path>) -> Self {
        self.cwd = Some(cwd.as_ref().to_path_buf());
        self
    }

    pub fn get_args(&self) -> &[String] {
        &self.args
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args).envs(&self.env);
        if let Some(ref cwd) = self.cwd {
            cmd.current_dir(cwd);
        }
        cmd
    }

    /// Run to completion with stdout and stderr captured.
    pub fn exec(&self) -> Result<ToolOutput> {
        tracing::debug!("running `{}`", self);

        let output = self
            .command()
            .stdin(Stdio::null())
            .output()
            .with_context(|| format!("failed to run `{}`", self.program.display()))?;

        Ok(ToolOutput {
            status: output.status,
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }

    /// Like [`exec`](Self::exec), but a non-zero exit is an error carrying
    /// the tool's diagnostics.
    pub fn exec_and_check(&self) -> Result<ToolOutput> {
        let output = self.exec()?;
        if !output.success() {
            bail!(
                "`{}` exited with {}\n{}",
                self,
                output.status,
                output.diagnostics()
            );
        }
        Ok(output)
    }

    /// Run with the terminal attached (output streams live).
    pub fn status(&self) -> Result<ExitStatus> {
        tracing::debug!("running `{}`", self);

        self.command()
            .status()
            .with_context(|| format!("failed to run `{}`", self.program.display()))
    }

    /// The command line as shown in messages.
    pub fn display_command(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for ProcessBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.display())?;
        for arg in &self.args {
            if arg.contains(' ') {
                write!(f, " \"{}\"", arg)?;
            } else {
                write!(f, " {}", arg)?;
            }
        }
        Ok(())
    }
}

/// Find an executable on `PATH`.
pub fn find_executable(name: &str) -> Option<PathBuf> {
    which::which(name).ok()
}

/// Find the host C++ compiler: `$CXX` first, then the usual driver names.
pub fn find_cxx_compiler() -> Option<PathBuf> {
    let from_env = std::env::var("CXX").ok();
    // Bound to a local so the iterator is dropped before `from_env`
    let found = from_env
        .as_deref()
        .into_iter()
        .chain(["c++", "g++", "clang++", "cl"])
        .find_map(find_executable);
    found
}

pub fn find_cmake() -> Option<PathBuf> {
    find_executable("cmake")
}
