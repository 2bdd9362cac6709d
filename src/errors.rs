//! Application error types and user-facing error formatting.
//!
//! Provides structured error types for the layers around the tree builder:
//! - [`ParseError`] for grammar loading and tree-sitter parsing failures
//! - [`LensError`] as the unified top-level error type
//!
//! The declaration builder itself never fails: a call either matches a known
//! declaration shape or is ignored. Errors only arise when obtaining a syntax
//! tree, reading files, or interpreting command-line input.

use std::path::PathBuf;

use thiserror::Error;

// ---------------------------------------------------------------------------
// Exit codes
// ---------------------------------------------------------------------------

/// Process exit codes.
///
/// * `0` - success
/// * `1` - general runtime error, or `check` found no declarations
/// * `2` - usage / argument error (bad CLI invocation)
pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_ERROR: i32 = 1;
pub const EXIT_USAGE: i32 = 2;

// ---------------------------------------------------------------------------
// Layer-specific error types
// ---------------------------------------------------------------------------

/// Errors arising while turning source text into a syntax tree.
#[derive(Error, Debug)]
pub enum ParseError {
    /// The file extension does not map to a bundled grammar.
    #[error("unsupported file type: {}", .0.display())]
    UnsupportedLanguage(PathBuf),

    /// The grammar could not be loaded into the parser (ABI mismatch).
    #[error("failed to load grammar: {0}")]
    Grammar(#[from] tree_sitter::LanguageError),

    /// tree-sitter returned no tree for the input.
    #[error("parser produced no syntax tree")]
    NoTree,
}

// ---------------------------------------------------------------------------
// Unified application error
// ---------------------------------------------------------------------------

/// Unified error type for the entire application.
#[derive(Error, Debug)]
pub enum LensError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// A usage / argument error (exit code 2).
    #[error("{0}")]
    Usage(String),

    /// No declaration matched the request (e.g. `cmd --line` outside any test).
    #[error("no test declaration found {0}")]
    NoDeclaration(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl LensError {
    /// Return the appropriate process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            LensError::Usage(_) => EXIT_USAGE,
            _ => EXIT_ERROR,
        }
    }

    /// Return an optional human-readable hint that may help the user fix
    /// the problem.
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            LensError::Parse(ParseError::UnsupportedLanguage(_)) => {
                Some("supported extensions: .ts .mts .cts .tsx .js .mjs .cjs .jsx")
            }
            LensError::Parse(ParseError::Grammar(_)) => {
                Some("the bundled grammar is incompatible with the tree-sitter runtime")
            }
            LensError::NoDeclaration(_) => {
                Some("run `vitest-lens tree <file>` to list the declarations in the file")
            }
            LensError::Io(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Some("verify the file or directory exists")
            }
            LensError::Io(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
                Some("check file permissions")
            }
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_code_usage() {
        let err = LensError::Usage("bad flag".into());
        assert_eq!(err.exit_code(), EXIT_USAGE);
    }

    #[test]
    fn exit_code_general() {
        let err = LensError::Parse(ParseError::NoTree);
        assert_eq!(err.exit_code(), EXIT_ERROR);
    }

    #[test]
    fn hint_unsupported_language() {
        let err = LensError::Parse(ParseError::UnsupportedLanguage("a.py".into()));
        assert!(err.hint().unwrap().contains(".tsx"));
    }

    #[test]
    fn hint_no_declaration() {
        let err = LensError::NoDeclaration("at line 3".into());
        assert!(err.hint().unwrap().contains("tree"));
    }

    #[test]
    fn hint_io_not_found() {
        let err = LensError::Io(std::io::Error::new(std::io::ErrorKind::NotFound, "gone"));
        assert!(err.hint().unwrap().contains("exists"));
    }

    #[test]
    fn hint_none_for_other() {
        let err = LensError::Other(anyhow::anyhow!("something went wrong"));
        assert!(err.hint().is_none());
    }

    #[test]
    fn display_unsupported_language() {
        let err = ParseError::UnsupportedLanguage("notes.md".into());
        assert_eq!(format!("{err}"), "unsupported file type: notes.md");
    }

    #[test]
    fn display_no_declaration() {
        let err = LensError::NoDeclaration("at line 7 of a.test.ts".into());
        assert_eq!(format!("{err}"), "no test declaration found at line 7 of a.test.ts");
    }

    #[test]
    fn lens_error_from_parse_error() {
        let err: LensError = ParseError::NoTree.into();
        assert!(matches!(err, LensError::Parse(ParseError::NoTree)));
    }

    #[test]
    fn lens_error_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: LensError = io_err.into();
        assert!(matches!(err, LensError::Io(_)));
    }
}
