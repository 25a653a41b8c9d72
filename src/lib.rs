//! Axenlang frontend
//!
//! A hand-written lexer, recursive-descent parser and AST for the Axenlang
//! systems language. The contract is text in, AST plus diagnostics out: one
//! [`parse`] call processes one source unit start to finish, never panics on
//! malformed input, and keeps no state between calls. Semantic analysis and
//! code generation are external consumers of the returned tree.

pub mod frontend;
pub mod utils;

pub use frontend::ast;
pub use frontend::diagnostics::{Diagnostic, DiagKind};
pub use frontend::lexer::Lexer;
pub use frontend::parser::{parse, ParseResult, Parser};
pub use frontend::printer::unparse;
pub use utils::{Error, Span};
