//! User-friendly diagnostic messages.
//!
//! Every error shown to the user names what went wrong, the context it
//! happened in, and what to try next.

use std::fmt;
use std::path::PathBuf;

/// Common suggestion messages for consistent error handling.
pub mod suggestions {
    /// Suggestion when no project manifest is found.
    pub const NO_PROJECT: &str =
        "Create a QuickProject.toml at the project root, or run quickc from inside a project";

    /// Suggestion when a dependency names no unit.
    pub const UNIT_NOT_FOUND: &str =
        "Check the spelling, and that the unit directory contains a QuickUnit.toml";

    /// Suggestion when a host tool step fails.
    pub const BUILD_FAILED: &str = "Run `quickc build --verbose` to see every step";

    /// Suggestion when a description file does not parse.
    pub const BAD_MANIFEST: &str = "Run `quickc settings` after fixing the file to check what it exports";
}

/// Severity level for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
        }
    }
}

/// A diagnostic message with optional suggestions.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub message: String,
    pub severity: Severity,
    /// Additional context lines
    pub context: Vec<String>,
    /// Suggested fixes
    pub suggestions: Vec<String>,
    /// Related file
    pub location: Option<PathBuf>,
}

impl Diagnostic {
    pub fn error(message: impl Into<String>) -> Self {
        Diagnostic {
            message: message.into(),
            severity: Severity::Error,
            context: Vec::new(),
            suggestions: Vec::new(),
            location: None,
        }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context.push(context.into());
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }

    pub fn with_location(mut self, path: impl Into<PathBuf>) -> Self {
        self.location = Some(path.into());
        self
    }

    /// Format the diagnostic for terminal output.
    pub fn format(&self, color: bool) -> String {
        let mut output = String::new();

        let severity_str = match (self.severity, color) {
            (Severity::Error, true) => "\x1b[1;31merror\x1b[0m",
            (Severity::Error, false) => "error",
        };

        output.push_str(&format!("{}: {}\n", severity_str, self.message));

        if let Some(ref path) = self.location {
            output.push_str(&format!("  --> {}\n", path.display()));
        }

        for ctx in &self.context {
            output.push_str(&format!("  = {}\n", ctx));
        }

        if !self.suggestions.is_empty() {
            output.push('\n');
            let help_prefix = if color {
                "\x1b[1;32mhelp\x1b[0m"
            } else {
                "help"
            };
            output.push_str(&format!("{}: consider:\n", help_prefix));
            for (i, suggestion) in self.suggestions.iter().enumerate() {
                output.push_str(&format!("  {}. {}\n", i + 1, suggestion));
            }
        }

        output
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format(false))
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
        let diag = Diagnostic::error("could not find unit `Lib` required by `Program`")
            .with_context("no unit at Program/Lib")
            .with_context("no unit at Lib")
            .with_suggestion(suggestions::UNIT_NOT_FOUND)
            .with_location("/p/Program/QuickUnit.toml");

        let output = diag.format(false);
        assert!(output.starts_with("error: could not find unit `Lib`"));
        assert!(output.contains("  --> /p/Program/QuickUnit.toml"));
        assert!(output.contains("  = no unit at Program/Lib"));
        assert!(output.contains("help: consider:"));
        assert!(output.contains("1. Check the spelling"));
    }

    #[test]
    fn test_error_with_color() {
        let diag = Diagnostic::error("build failed");
        assert!(diag.format(true).starts_with("\x1b[1;31merror"));
        assert_eq!(diag.to_string(), "error: build failed\n");
    }
}
