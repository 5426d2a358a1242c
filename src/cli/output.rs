//! Handles all user-facing output for the CLI.
//!
//! Rewritten source goes to an [`OutputSink`]; `--diff` renders a colored
//! line diff against the input instead, and `--manifest` writes JSON.

use std::io::{self, Write};
use std::path::Path;

use difference::{Changeset, Difference};
use termcolor::{Color, ColorSpec, WriteColor};

use crate::engine::AssetSummary;
use crate::errors::{EmbedError, EmbedResult};

// ============================================================================
// OUTPUT SINKS: OutputBuffer and StdoutSink implementations
// ============================================================================

/// Destination for rewritten source text.
pub trait OutputSink {
    fn emit(&mut self, text: &str) -> io::Result<()>;
}

/// OutputBuffer: collects output into a String for testing or programmatic capture.
#[derive(Debug, Default)]
pub struct OutputBuffer {
    pub buffer: String,
}

impl OutputBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn as_str(&self) -> &str {
        &self.buffer
    }
}

impl OutputSink for OutputBuffer {
    fn emit(&mut self, text: &str) -> io::Result<()> {
        self.buffer.push_str(text);
        Ok(())
    }
}

/// StdoutSink: writes output to stdout unchanged.
pub struct StdoutSink;

impl OutputSink for StdoutSink {
    fn emit(&mut self, text: &str) -> io::Result<()> {
        let mut stdout = io::stdout().lock();
        stdout.write_all(text.as_bytes())?;
        stdout.flush()
    }
}

// ============================================================================
// DIFF & MANIFEST
// ============================================================================

/// Writes a line diff of `before` against `after`, added lines in green and
/// removed lines in red.
pub fn write_diff<W: WriteColor>(out: &mut W, before: &str, after: &str) -> io::Result<()> {
    let changeset = Changeset::new(before, after, "\n");
    for diff in &changeset.diffs {
        let (marker, color, text) = match diff {
            Difference::Same(x) => (' ', None, x),
            Difference::Add(x) => ('+', Some(Color::Green), x),
            Difference::Rem(x) => ('-', Some(Color::Red), x),
        };
        out.set_color(ColorSpec::new().set_fg(color))?;
        for line in text.split('\n') {
            writeln!(out, "{marker}{line}")?;
        }
    }
    out.reset()
}

/// Writes the manifest as a pretty-printed JSON array.
pub fn write_manifest(path: &Path, assets: &[AssetSummary]) -> EmbedResult<()> {
    let mut json = serde_json::to_string_pretty(assets)
        .map_err(|e| EmbedError::io(path, io::Error::from(e)))?;
    json.push('\n');
    std::fs::write(path, json).map_err(|e| EmbedError::io(path, e))
}
