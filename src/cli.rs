//! The goembed command-line interface.
//!
//! This module is the main entry point of the binary. It owns everything the
//! library does not do on its own: reading the input file, logging setup,
//! writing outputs and turning errors into diagnostics and an exit code.

use std::{fs, path::Path, process};

use clap::Parser;
use termcolor::{ColorChoice, StandardStream};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::{
    engine::Embedder,
    errors::{print_error, EmbedError, EmbedResult, SourceContext},
};

pub mod args;
pub mod output;

pub use args::GoembedArgs;
use output::{write_diff, write_manifest, OutputSink, StdoutSink};

/// Environment variable holding a `tracing` filter that overrides `-v`.
pub const LOG_ENV: &str = "GOEMBED_LOG";

// ============================================================================
// MAIN ENTRY POINT
// ============================================================================

/// The main entry point for the CLI.
pub fn run() {
    let args = GoembedArgs::parse();
    init_logging(args.verbose);

    if let Err(e) = execute(&args) {
        print_error(e);
        process::exit(1);
    }
}

/// Runs one invocation. Nothing is written until the whole file has been
/// rewritten, and the manifest is written before `--output`, so a failed run
/// leaves stdout and `--output` untouched.
pub fn execute(args: &GoembedArgs) -> EmbedResult<()> {
    let source = read_source(&args.file)?;
    let embedded = Embedder::new(args.options()).embed_source(&source)?;

    if let Some(path) = &args.manifest {
        write_manifest(path, &embedded.report.assets)?;
        info!(path = %path.display(), "wrote manifest");
    }
    if let Some(path) = &args.output {
        fs::write(path, &embedded.source).map_err(|e| EmbedError::io(path, e))?;
        info!(path = %path.display(), "wrote rewritten source");
    }

    let stdout_path = Path::new("<stdout>");
    if args.diff {
        let mut stdout = StandardStream::stdout(ColorChoice::Auto);
        write_diff(&mut stdout, &source.content, &embedded.source)
            .map_err(|e| EmbedError::io(stdout_path, e))?;
    } else if args.output.is_none() {
        StdoutSink
            .emit(&embedded.source)
            .map_err(|e| EmbedError::io(stdout_path, e))?;
    }
    Ok(())
}

// ============================================================================
// HELPER FUNCTIONS
// ============================================================================

fn read_source(path: &Path) -> EmbedResult<SourceContext> {
    let content = fs::read_to_string(path).map_err(|e| EmbedError::io(path, e))?;
    Ok(SourceContext::from_file(path.display().to_string(), content))
}

/// Logs go to stderr so stdout carries only the rewritten source.
fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new(format!("goembed={level}")));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
