//! Syntax module for Go source files
//!
//! This module provides the tree types the rewriter works on, the pest-based
//! parser that produces them, the printer that turns them back into source
//! text, and a mutable walker over every expression slot.

pub mod ast;
pub mod comments;
pub mod parser;
pub mod printer;
pub mod visit;

pub use ast::{AstExpr, Decl, Expr, Ident, SourceFile, Stmt, Type};
pub use parser::parse;
pub use printer::print;

/// Represents a span in the source code.
///
/// Synthesized nodes carry the empty span `0..0`; the printer treats them as
/// having no source position.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// True for spans that do not cover any source text.
    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }
}

impl From<Span> for miette::SourceSpan {
    fn from(span: Span) -> Self {
        miette::SourceSpan::from(span.start..span.end)
    }
}

/// Wrapper for carrying source span information with any value
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned<T> {
    pub value: T,
    pub span: Span,
}

impl<T> Spanned<T> {
    pub fn new(value: T, span: Span) -> Self {
        Self { value, span }
    }

    /// Wraps a node that has no source text behind it.
    pub fn synthetic(value: T) -> Self {
        Self {
            value,
            span: Span::default(),
        }
    }
}
