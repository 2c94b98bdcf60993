//! Resolution error types and diagnostics.

use miette::Diagnostic as MietteDiagnostic;
use thiserror::Error;

use crate::core::unit::{UnitKind, UnitPath};
use crate::util::diagnostic::{suggestions, Diagnostic};

/// Error while resolving unit dependencies.
///
/// All variants are fatal for the resolution chain that raised them: the
/// dependency graph is static for a build invocation, so retrying cannot
/// change the outcome.
#[derive(Debug, Error, MietteDiagnostic)]
pub enum ResolveError {
    #[error("unit `{requester}` depends on `{spec}`, which could not be found")]
    #[diagnostic(code(quickc::resolve::not_found))]
    DependencyNotFound {
        requester: UnitPath,
        spec: String,
        /// Candidate directories that were checked, nearest first
        searched: Vec<String>,
    },

    #[error("circular dependency: {}", format_chain(.chain))]
    #[diagnostic(
        code(quickc::resolve::cycle),
        help("break the cycle by removing or restructuring dependencies")
    )]
    CircularDependency {
        requester: UnitPath,
        spec: String,
        /// The cycle, starting and ending with the same unit
        chain: Vec<UnitPath>,
    },

    #[error("unit `{unit}` is declared as both {existing} and {requested}")]
    #[diagnostic(code(quickc::resolve::duplicate_unit))]
    DuplicateUnitDeclaration {
        unit: UnitPath,
        existing: UnitKind,
        requested: UnitKind,
    },

    #[error("malformed dependency `{spec}` in unit `{requester}`: {reason}")]
    #[diagnostic(code(quickc::resolve::malformed_spec))]
    MalformedDependencySpec {
        requester: UnitPath,
        spec: String,
        reason: String,
    },
}

fn format_chain(chain: &[UnitPath]) -> String {
    chain
        .iter()
        .map(|u| u.to_string())
        .collect::<Vec<_>>()
        .join(" -> ")
}

impl ResolveError {
    /// Convert to a user-friendly diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            ResolveError::DependencyNotFound {
                requester,
                spec,
                searched,
            } => {
                let mut diag = Diagnostic::error(format!(
                    "could not find unit `{}` required by `{}`",
                    spec, requester
                ));
                for candidate in searched {
                    diag = diag.with_context(format!("no unit at {}", candidate));
                }
                diag.with_suggestion(suggestions::UNIT_NOT_FOUND)
                    .with_suggestion("Dependencies are searched from the requesting unit upward to the project root")
            }

            ResolveError::CircularDependency {
                requester,
                spec,
                chain,
            } => Diagnostic::error("circular dependency between units")
                .with_context(format!("`{}` requires `{}`", requester, spec))
                .with_context(format!("cycle: {}", format_chain(chain)))
                .with_suggestion("Break the cycle by removing or restructuring dependencies"),

            ResolveError::DuplicateUnitDeclaration {
                unit,
                existing,
                requested,
            } => Diagnostic::error(format!("unit `{}` declared with two kinds", unit))
                .with_context(format!("first declared as {}", existing))
                .with_context(format!("then declared as {}", requested))
                .with_suggestion("Move the second artifact into its own unit directory"),

            ResolveError::MalformedDependencySpec {
                requester,
                spec,
                reason,
            } => Diagnostic::error(format!("malformed dependency `{}`", spec))
                .with_context(format!("in unit `{}`: {}", requester, reason))
                .with_suggestion("Dependencies are relative paths separated by `/`, e.g. `Group1/Lib`"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit(path: &str) -> UnitPath {
        UnitPath::from_segments(path.split('/'))
    }

    #[test]
    fn test_cycle_message_names_chain() {
        let err = ResolveError::CircularDependency {
            requester: unit("B"),
            spec: "A".to_string(),
            chain: vec![unit("A"), unit("B"), unit("A")],
        };

        assert_eq!(err.to_string(), "circular dependency: A -> B -> A");
        let output = err.to_diagnostic().format(false);
        assert!(output.contains("`B` requires `A`"));
        assert!(output.contains("cycle: A -> B -> A"));
    }

    #[test]
    fn test_not_found_diagnostic() {
        let err = ResolveError::DependencyNotFound {
            requester: unit("Program"),
            spec: "Missing".to_string(),
            searched: vec!["/p/Program/Missing".to_string(), "/p/Missing".to_string()],
        };

        let output = err.to_diagnostic().format(false);
        assert!(output.contains("could not find unit `Missing` required by `Program`"));
        assert!(output.contains("no unit at /p/Missing"));
        assert!(output.contains("help: consider:"));
    }
}
