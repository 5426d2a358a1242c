//! Defines the command-line arguments for goembed.
//!
//! This module uses the `clap` crate with its "derive" feature to create a
//! declarative and type-safe argument parsing structure.

use clap::builder::TypedValueParser;
use clap::{ArgAction, Parser};
use std::path::PathBuf;

use crate::assets::address::{is_valid_prefix, DEFAULT_DIGEST_WIDTH, DEFAULT_PREFIX};
use crate::assets::MARKER_IMPORT_PATH;
use crate::engine::EmbedOptions;

/// The main CLI argument structure.
#[derive(Debug, Parser)]
#[command(
    name = "goembed",
    version,
    about = "Embeds files read through the assets package into a Go source file."
)]
pub struct GoembedArgs {
    /// The Go source file to rewrite.
    #[arg(required = true)]
    pub file: PathBuf,

    /// Write the rewritten source here instead of stdout.
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Resolve asset filenames against this directory.
    #[arg(short = 'C', long, value_name = "DIR")]
    pub asset_root: Option<PathBuf>,

    /// Import path of the marker package.
    #[arg(long, value_name = "PATH", default_value = MARKER_IMPORT_PATH)]
    pub import_path: String,

    /// Prefix of generated identifiers.
    #[arg(long, value_name = "TAG", default_value = DEFAULT_PREFIX, value_parser = parse_prefix)]
    pub prefix: String,

    /// Hex digits of the filename digest kept in generated identifiers (4 to 64).
    #[arg(
        long,
        value_name = "N",
        default_value_t = DEFAULT_DIGEST_WIDTH,
        value_parser = clap::value_parser!(u8).range(4..=64).map(usize::from)
    )]
    pub digest_width: usize,

    /// Write a JSON manifest of embedded assets.
    #[arg(long, value_name = "PATH")]
    pub manifest: Option<PathBuf>,

    /// Print a colored line diff instead of the rewritten source.
    #[arg(long)]
    pub diff: bool,

    /// Raise log verbosity; repeat for more.
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

impl GoembedArgs {
    pub fn options(&self) -> EmbedOptions {
        EmbedOptions {
            import_path: self.import_path.clone(),
            prefix: self.prefix.clone(),
            digest_width: self.digest_width,
            asset_root: self.asset_root.clone().unwrap_or_default(),
        }
    }
}

fn parse_prefix(prefix: &str) -> Result<String, String> {
    if is_valid_prefix(prefix) {
        Ok(prefix.to_string())
    } else {
        Err(format!("`{prefix}` cannot start a Go identifier"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = GoembedArgs::try_parse_from(["goembed", "main.go"]).unwrap();
        assert_eq!(args.options(), EmbedOptions::default());
        assert!(!args.diff);
        assert_eq!(args.verbose, 0);
    }

    #[test]
    fn test_options() {
        let args = GoembedArgs::try_parse_from([
            "goembed", "-C", "web", "--prefix", "Blob", "--digest-width", "8", "-vv", "main.go",
        ])
        .unwrap();
        let options = args.options();
        assert_eq!(options.asset_root, PathBuf::from("web"));
        assert_eq!(options.prefix, "Blob");
        assert_eq!(options.digest_width, 8);
        assert_eq!(args.verbose, 2);
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(GoembedArgs::try_parse_from(["goembed", "--prefix", "9x", "main.go"]).is_err());
        assert!(GoembedArgs::try_parse_from(["goembed", "--digest-width", "2", "main.go"]).is_err());
        assert!(GoembedArgs::try_parse_from(["goembed"]).is_err());
    }
}
