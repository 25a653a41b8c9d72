//! Diagnostics collection for the Axenlang frontend
//!
//! Lex and syntax errors are accumulated here instead of aborting the parse;
//! the caller decides whether any of them is build-blocking.

use crate::utils::{Error, Span};
use serde::Serialize;

/// Which phase produced a diagnostic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagKind {
    Lex,
    Syntax,
}

/// A single reported error with its source location
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnostic {
    pub kind: DiagKind,
    pub message: String,
    pub span: Span,
}

impl Diagnostic {
    pub fn from_error(error: &Error) -> Self {
        Self {
            kind: if error.is_lex() { DiagKind::Lex } else { DiagKind::Syntax },
            message: error.to_string(),
            span: error.span(),
        }
    }
}

/// Accumulates diagnostics for one parse call. State never outlives the call;
/// a fresh parser starts with a fresh collector.
#[derive(Debug, Default)]
pub struct Diagnostics {
    diags: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an error
    pub fn report(&mut self, error: &Error) {
        self.diags.push(Diagnostic::from_error(error));
    }

    pub fn is_empty(&self) -> bool {
        self.diags.is_empty()
    }

    pub fn len(&self) -> usize {
        self.diags.len()
    }

    /// Consume the collector, returning diagnostics in source order.
    /// The lexer runs ahead of the parser, so its findings are re-interleaved
    /// by span; the sort is stable so same-position reports keep their
    /// emission order.
    pub fn finish(mut self) -> Vec<Diagnostic> {
        self.diags.sort_by_key(|d| d.span.start);
        self.diags
    }
}

/// Convert a byte offset into a 1-based (line, column) pair for rendering
pub fn line_col(source: &str, offset: usize) -> (usize, usize) {
    let mut line = 1;
    let mut col = 1;
    for (i, c) in source.chars().enumerate() {
        if i >= offset {
            break;
        }
        if c == '\n' {
            line += 1;
            col = 1;
        } else {
            col += 1;
        }
    }
    (line, col)
}
