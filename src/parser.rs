//! Tree-sitter parsing infrastructure.
//!
//! Language detection by file extension, parser construction with the
//! matching grammar, and parsing of in-memory source text.

use std::path::Path;

use tree_sitter::{Language, Parser, Tree};

use crate::errors::ParseError;

/// Languages whose test files we understand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Lang {
    TypeScript,
    Tsx,
    JavaScript,
}

impl Lang {
    /// Returns the human-readable name for this language.
    pub fn name(self) -> &'static str {
        match self {
            Lang::TypeScript => "TypeScript",
            Lang::Tsx => "TSX",
            Lang::JavaScript => "JavaScript",
        }
    }
}

/// Detect the language of a file based on its extension.
///
/// Returns `None` for unsupported or missing extensions.
pub fn detect_language(path: &Path) -> Option<Lang> {
    let ext = path.extension()?.to_str()?;
    match ext {
        "ts" | "mts" | "cts" => Some(Lang::TypeScript),
        "tsx" => Some(Lang::Tsx),
        // The JavaScript grammar parses JSX natively.
        "js" | "mjs" | "cjs" | "jsx" => Some(Lang::JavaScript),
        _ => None,
    }
}

/// Like [`detect_language`], but reports unsupported files as an error.
pub fn require_language(path: &Path) -> Result<Lang, ParseError> {
    detect_language(path).ok_or_else(|| ParseError::UnsupportedLanguage(path.to_path_buf()))
}

fn grammar_for(lang: Lang) -> Language {
    match lang {
        Lang::TypeScript => tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
        Lang::Tsx => tree_sitter_typescript::LANGUAGE_TSX.into(),
        Lang::JavaScript => tree_sitter_javascript::LANGUAGE.into(),
    }
}

/// Create a new [`Parser`] configured for the given language.
pub fn get_parser(lang: Lang) -> Result<Parser, ParseError> {
    let mut parser = Parser::new();
    parser.set_language(&grammar_for(lang))?;
    Ok(parser)
}

/// Parse source text with an already configured parser.
///
/// tree-sitter recovers from syntax errors, so a tree is produced for any
/// input; `NoTree` only surfaces when the parser has no language set.
pub fn parse_source(parser: &mut Parser, source: &str) -> Result<Tree, ParseError> {
    parser.parse(source, None).ok_or(ParseError::NoTree)
}
