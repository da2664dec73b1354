//! Terminal output for the CLI.
//!
//! Status lines are cargo-style (`{status:>12} {message}`) on stderr. In
//! JSON mode stderr stays silent and one [`RunEvent`] per line goes to
//! stdout instead. A spinner (indicatif) animates while a tool runs, but
//! only in normal mode on a terminal.

use std::fmt::Display;
use std::io::{self, IsTerminal, Write};
use std::str::FromStr;
use std::time::{Duration, Instant};

use indicatif::{ProgressBar, ProgressStyle};

use crate::builder::events::RunEvent;

/// Human and JSON output are mutually exclusive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellMode {
    Human {
        verbosity: Verbosity,
        color: ColorChoice,
    },
    Json,
}

impl Default for ShellMode {
    fn default() -> Self {
        ShellMode::Human {
            verbosity: Verbosity::Normal,
            color: ColorChoice::Auto,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum Verbosity {
    /// Errors only
    Quiet,
    /// Status lines and a spinner
    #[default]
    Normal,
    /// Status lines and live tool output
    Verbose,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorChoice {
    #[default]
    Auto,
    Always,
    Never,
}

impl FromStr for ColorChoice {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "auto" => Ok(ColorChoice::Auto),
            "always" => Ok(ColorChoice::Always),
            "never" => Ok(ColorChoice::Never),
            other => Err(format!(
                "invalid color choice `{}` (expected auto, always or never)",
                other
            )),
        }
    }
}

/// Colour group of a status word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tone {
    Done,
    Progress,
    Note,
    Warning,
    Error,
}

impl Tone {
    fn ansi(self) -> &'static str {
        match self {
            Tone::Done => "\x1b[1;32m",
            Tone::Progress => "\x1b[1;36m",
            Tone::Note => "\x1b[1;34m",
            Tone::Warning => "\x1b[1;33m",
            Tone::Error => "\x1b[1;31m",
        }
    }
}

/// The word at the start of a status line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Finished,
    Generated,
    Exported,
    Removed,
    Resolving,
    Configuring,
    Building,
    Installing,
    Layout,
    Info,
    Warning,
    Error,
}

impl Status {
    /// Column the status word is right-aligned to.
    pub const WIDTH: usize = 12;

    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Finished => "Finished",
            Status::Generated => "Generated",
            Status::Exported => "Exported",
            Status::Removed => "Removed",
            Status::Resolving => "Resolving",
            Status::Configuring => "Configuring",
            Status::Building => "Building",
            Status::Installing => "Installing",
            Status::Layout => "Layout",
            Status::Info => "Info",
            Status::Warning => "Warning",
            Status::Error => "error",
        }
    }

    fn tone(&self) -> Tone {
        match self {
            Status::Finished | Status::Generated | Status::Exported | Status::Removed => Tone::Done,
            Status::Resolving | Status::Configuring | Status::Building | Status::Installing => {
                Tone::Progress
            }
            Status::Layout | Status::Info => Tone::Note,
            Status::Warning => Tone::Warning,
            Status::Error => Tone::Error,
        }
    }
}

/// Output sink shared by every command.
#[derive(Debug)]
pub struct Shell {
    /// `None` in JSON mode
    verbosity: Option<Verbosity>,
    color: bool,
}

impl Shell {
    pub fn new(mode: ShellMode) -> Self {
        match mode {
            ShellMode::Json => Shell {
                verbosity: None,
                color: false,
            },
            ShellMode::Human { verbosity, color } => Shell {
                verbosity: Some(verbosity),
                color: match color {
                    ColorChoice::Always => true,
                    ColorChoice::Never => false,
                    ColorChoice::Auto => io::stderr().is_terminal(),
                },
            },
        }
    }

    /// Build a shell from the global flags. JSON wins over quiet and verbose.
    pub fn from_flags(quiet: bool, verbose: bool, color: ColorChoice, json: bool) -> Self {
        if json {
            return Shell::new(ShellMode::Json);
        }
        let verbosity = match (quiet, verbose) {
            (true, _) => Verbosity::Quiet,
            (false, true) => Verbosity::Verbose,
            (false, false) => Verbosity::Normal,
        };
        Shell::new(ShellMode::Human { verbosity, color })
    }

    pub fn is_quiet(&self) -> bool {
        self.verbosity == Some(Verbosity::Quiet)
    }

    pub fn is_verbose(&self) -> bool {
        self.verbosity == Some(Verbosity::Verbose)
    }

    pub fn is_json(&self) -> bool {
        self.verbosity.is_none()
    }

    pub fn use_color(&self) -> bool {
        self.color
    }

    /// Print `{status:>12} {msg}` to stderr.
    ///
    /// Quiet mode keeps only errors; JSON mode drops everything.
    pub fn status(&self, status: Status, msg: impl Display) {
        let shown = match self.verbosity {
            None => false,
            Some(Verbosity::Quiet) => status == Status::Error,
            Some(_) => true,
        };
        if shown {
            eprintln!("{} {}", self.format_status(status), msg);
        }
    }

    pub fn warn(&self, msg: impl Display) {
        self.status(Status::Warning, msg);
    }

    /// Write an event line to stdout (JSON mode only).
    pub fn event(&self, event: &RunEvent) {
        if !self.is_json() {
            return;
        }
        let mut stdout = io::stdout().lock();
        let _ = writeln!(stdout, "{}", event.to_json());
        let _ = stdout.flush();
    }

    fn format_status(&self, status: Status) -> String {
        let word = format!("{:>width$}", status.as_str(), width = Status::WIDTH);
        if self.color {
            format!("{}{}\x1b[0m", status.tone().ansi(), word)
        } else {
            word
        }
    }

    /// Print a status line and start a spinner for a long-running step.
    pub fn spinner(&self, status: Status, msg: impl Display) -> Spinner {
        let message = msg.to_string();
        self.status(status, &message);

        let animate = self.verbosity == Some(Verbosity::Normal) && io::stderr().is_terminal();
        let pb = animate.then(|| {
            let pb = ProgressBar::new_spinner();
            if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}")
            {
                pb.set_style(style);
            }
            pb.set_message(message);
            pb.enable_steady_tick(Duration::from_millis(120));
            pb
        });

        Spinner {
            pb,
            start: Instant::now(),
        }
    }
}

impl Default for Shell {
    fn default() -> Self {
        Shell::new(ShellMode::default())
    }
}

/// A running spinner, cleared when finished or dropped.
pub struct Spinner {
    pb: Option<ProgressBar>,
    start: Instant,
}

impl Spinner {
    /// Clear the spinner and return how long the step took.
    pub fn finish(mut self) -> Duration {
        self.clear();
        self.start.elapsed()
    }

    fn clear(&mut self) {
        if let Some(pb) = self.pb.take() {
            pb.finish_and_clear();
        }
    }
}

impl Drop for Spinner {
    fn drop(&mut self) {
        self.clear();
    }
}

/// `0.50s` under a minute, `1.5m` above.
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs_f64();
    if secs < 60.0 {
        format!("{:.2}s", secs)
    } else {
        format!("{:.1}m", secs / 60.0)
    }
}
