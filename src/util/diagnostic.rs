//! Error reports for the terminal.
//!
//! A report names the failing stage, quotes the collaborator's own output
//! (tail only, CMake logs get long) and suggests a next step.

use std::fmt::{self, Write};
use std::path::PathBuf;

/// Suggestions shared by several error paths.
pub mod suggestions {
    pub const NO_RECIPE: &str = "Run berth from a directory containing Berth.toml";

    pub const RESOLUTION_FAILED: &str =
        "Check the provider configuration in .berth/config.toml (`[deps]`)";

    pub const WRITE_FAILED: &str = "Check permissions and free space for the build root";

    pub const PHASE_FAILED: &str = "Run `berth build --verbose` to see the full tool output";
}

/// Quoted tool output is cut to this many trailing lines.
pub const MAX_QUOTED_LINES: usize = 40;

/// A report with optional quoted output and suggestions.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub message: String,
    /// Lifecycle stage that failed (`layout`, `configure`, ...)
    pub stage: Option<String>,
    /// Quoted blocks, usually tool output
    pub context: Vec<String>,
    pub suggestions: Vec<String>,
    pub location: Option<PathBuf>,
}

impl Diagnostic {
    pub fn error(message: impl Into<String>) -> Self {
        Diagnostic {
            message: message.into(),
            stage: None,
            context: Vec::new(),
            suggestions: Vec::new(),
            location: None,
        }
    }

    pub fn with_stage(mut self, stage: impl Into<String>) -> Self {
        self.stage = Some(stage.into());
        self
    }

    /// Quote a block of text below the message. Empty blocks are skipped.
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        let context = context.into();
        if !context.trim().is_empty() {
            self.context.push(context);
        }
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }

    /// The file the error is about.
    pub fn with_location(mut self, path: impl Into<PathBuf>) -> Self {
        self.location = Some(path.into());
        self
    }

    /// Render for the terminal.
    pub fn format(&self, color: bool) -> String {
        let mut out = String::new();
        let label = if color { "\x1b[1;31merror\x1b[0m" } else { "error" };
        let _ = writeln!(out, "{}: {}", label, self.message);

        if let Some(ref path) = self.location {
            let _ = writeln!(out, "  --> {}", path.display());
        }

        for block in &self.context {
            let lines: Vec<&str> = block.lines().collect();
            let skipped = lines.len().saturating_sub(MAX_QUOTED_LINES);
            if skipped > 0 {
                let _ = writeln!(out, "  | ... ({} earlier lines omitted)", skipped);
            }
            for line in &lines[skipped..] {
                let _ = writeln!(out, "  | {}", line);
            }
        }

        if let Some(ref stage) = self.stage {
            let _ = writeln!(out, "  = stage: {}", stage);
        }

        if !self.suggestions.is_empty() {
            let help = if color { "\x1b[1;32mhelp\x1b[0m" } else { "help" };
            let _ = writeln!(out);
            let _ = writeln!(out, "{}: consider:", help);
            for (i, suggestion) in self.suggestions.iter().enumerate() {
                let _ = writeln!(out, "  {}. {}", i + 1, suggestion);
            }
        }

        out
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format(false))
    }
}

/// Print a diagnostic to stderr.
pub fn emit(diagnostic: &Diagnostic, color: bool) {
    eprint!("{}", diagnostic.format(color));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diagnostic_formatting() {
        let diag = Diagnostic::error("build phase `configure` failed")
            .with_stage("configure")
            .with_context("CMake Error at CMakeLists.txt:3 (find_package):\n  glfw not found")
            .with_suggestion(suggestions::PHASE_FAILED)
            .with_location("/proj/Berth.toml");

        let output = diag.format(false);
        assert!(output.starts_with("error: build phase `configure` failed"));
        assert!(output.contains("  --> /proj/Berth.toml"));
        assert!(output.contains("  | CMake Error at CMakeLists.txt:3"));
        assert!(output.contains("  |   glfw not found"));
        assert!(output.contains("  = stage: configure"));
        assert!(output.contains("help: consider:"));
        assert!(output.contains("1. Run `berth build --verbose`"));
    }

    #[test]
    fn test_long_output_keeps_the_tail() {
        let log: Vec<String> = (1..=100).map(|i| format!("line {}", i)).collect();
        let output = Diagnostic::error("build phase `build` failed")
            .with_context(log.join("\n"))
            .format(false);

        assert!(output.contains("  | ... (60 earlier lines omitted)"));
        assert!(!output.contains("  | line 60\n"));
        assert!(output.contains("  | line 61\n"));
        assert!(output.contains("  | line 100\n"));
    }

    #[test]
    fn test_blank_context_is_dropped() {
        let diag = Diagnostic::error("vcpkg install failed").with_context("  \n");
        assert!(diag.context.is_empty());
        assert_eq!(diag.format(false), "error: vcpkg install failed\n");
    }
}
