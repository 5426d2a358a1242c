//! goembed error handling
//!
//! Every failure of the pipeline is an [`EmbedError`]. Errors tied to a
//! position in the input carry the named source and a span so the CLI can
//! render them as miette diagnostics; the library itself never prints or
//! exits.

use miette::{Diagnostic, NamedSource, SourceSpan};
use std::io;
use std::path::PathBuf;
use thiserror::Error;

use crate::assets::loader::LoadError;
use crate::syntax::Span;

// ============================================================================
// SOURCE CONTEXT
// ============================================================================

/// The text being rewritten, together with the name it is reported under.
#[derive(Debug, Clone)]
pub struct SourceContext {
    pub name: String,
    pub content: String,
}

impl SourceContext {
    /// Create a source context from real file content
    pub fn from_file(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }

    /// Convert to NamedSource for use with miette error reporting
    pub fn to_named_source(&self) -> NamedSource<String> {
        NamedSource::new(self.name.clone(), self.content.clone())
    }
}

// ============================================================================
// ERROR TYPE
// ============================================================================

pub type EmbedResult<T> = Result<T, EmbedError>;

#[derive(Debug, Error, Diagnostic)]
pub enum EmbedError {
    /// The input is not a Go file this tool can read.
    #[error("parse error: {message}")]
    #[diagnostic(code(goembed::parse))]
    Parse {
        message: String,
        #[source_code]
        src: NamedSource<String>,
        #[label("here")]
        span: SourceSpan,
    },

    /// An asset named by a call site could not be read. Nothing is emitted.
    #[error("cannot embed asset `{filename}`")]
    #[diagnostic(code(goembed::load))]
    Load {
        filename: String,
        #[source]
        error: LoadError,
        #[source_code]
        src: NamedSource<String>,
        #[label("referenced here")]
        span: SourceSpan,
        #[help]
        hint: Option<String>,
    },

    /// A generated identifier is already spelled somewhere in the file.
    #[error("generated identifier `{identifier}` for asset `{filename}` is already used in this file")]
    #[diagnostic(
        code(goembed::collision),
        help("pick another identifier prefix with --prefix")
    )]
    IdentifierCollision {
        identifier: String,
        filename: String,
        #[source_code]
        src: NamedSource<String>,
        #[label("already used here")]
        span: SourceSpan,
    },

    /// Reading the input or writing an output file failed.
    #[error("cannot access `{}`", path.display())]
    #[diagnostic(code(goembed::io))]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl EmbedError {
    pub fn parse(source: &SourceContext, message: impl Into<String>, span: Span) -> Self {
        EmbedError::Parse {
            message: message.into(),
            src: source.to_named_source(),
            span: span.into(),
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        EmbedError::Io {
            path: path.into(),
            source,
        }
    }
}

// ============================================================================
// ERROR FORMATTING UTILITIES
// ============================================================================

/// Prints an EmbedError with full miette diagnostics to stderr.
pub fn print_error(error: EmbedError) {
    let report = miette::Report::new(error);
    eprintln!("{report:?}");
}
