//! Embedding of files read through the marker package.
//!
//! The marker package exposes `Read(file string) ([]byte, error)` and
//! `MustRead(file string) []byte`. Calls to either with a single string
//! literal are replaced by a package-level `[]byte` variable holding the
//! named file, so the built program no longer reads it at runtime.
//!
//! Leaf first: [`loader`] reads files, [`address`] names them, [`import`]
//! finds the marker alias, [`matcher`] recognizes call sites, [`rewriter`]
//! replaces them while filling the [`registry`], and [`synth`] builds the new
//! declarations.

use serde::Serialize;
use std::fmt;

use crate::syntax::Span;

pub mod address;
pub mod import;
pub mod loader;
pub mod matcher;
pub mod registry;
pub mod rewriter;
pub mod synth;

pub use address::{Addresser, ContentAddress};
pub use import::resolve_alias;
pub use loader::{AssetLoader, FsLoader, LoadError, LoadErrorKind, MemoryLoader};
pub use matcher::match_call_site;
pub use registry::{AssetRecord, AssetRegistry};
pub use rewriter::Rewriter;

/// Canonical import path of the marker package.
pub const MARKER_IMPORT_PATH: &str = "github.com/sysr-q/assets";

/// The two marker read functions. Which one was called does not change the
/// output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ReadFn {
    Read,
    MustRead,
}

impl ReadFn {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "Read" => Some(ReadFn::Read),
            "MustRead" => Some(ReadFn::MustRead),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ReadFn::Read => "Read",
            ReadFn::MustRead => "MustRead",
        }
    }
}

impl fmt::Display for ReadFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the marker package is visible in a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarkerAlias {
    /// Calls are qualified with this name.
    Named(String),
    /// A blank (`_`) or dot (`.`) import. No qualified call can reach it.
    Unqualified,
}

impl MarkerAlias {
    pub fn name(&self) -> Option<&str> {
        match self {
            MarkerAlias::Named(name) => Some(name),
            MarkerAlias::Unqualified => None,
        }
    }
}

/// A marker read call whose single argument is a string literal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallSite {
    /// The literal's text with its quotes removed.
    pub filename: String,
    pub read_fn: ReadFn,
    /// The whole call expression.
    pub span: Span,
    /// The filename literal.
    pub literal_span: Span,
}
