//! Static discovery of vitest declarations.
//!
//! Parses TypeScript and JavaScript test files with tree-sitter, recognizes
//! `describe`/`test`/`it` calls (including the `.each` forms) and assembles
//! them into a nested [`TestTreeNode`] tree without executing any code.

pub mod abort;
pub mod builder;
pub mod classify;
pub mod color;
pub mod config;
pub mod discover;
pub mod errors;
pub mod explorer;
pub mod output;
pub mod parser;
pub mod runner;
pub mod types;
pub mod walker;

pub use abort::{AbortController, AbortSignal};
pub use builder::{FnListener, Listener, TestTreeBuilder, contains_declarations};
pub use errors::{LensError, ParseError};
pub use types::{DeclarationKind, Position, SuiteNode, TestNode, TestTreeNode};
