//! goembed rewrites a Go source file so that files read at runtime through
//! the `github.com/sysr-q/assets` package are compiled into the program as
//! `[]byte` variables instead.

pub mod assets;
pub mod cli;
pub mod engine;
pub mod errors;
pub mod syntax;

pub use engine::{EmbedOptions, Embedded, Embedder, Outcome, Report};
pub use errors::{EmbedError, EmbedResult, SourceContext};
