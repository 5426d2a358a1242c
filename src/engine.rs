use std::collections::HashMap;
use std::path::PathBuf;

use serde::Serialize;
use tracing::{debug, info, info_span};

use crate::assets::{
    self, resolve_alias, synth, Addresser, AssetLoader, AssetRecord, FsLoader,
    MarkerAlias, Rewriter,
};
use crate::errors::{EmbedError, EmbedResult, SourceContext};
use crate::syntax::visit::VisitMut;
use crate::syntax::{self, SourceFile, Span};

// ============================================================================
// OPTIONS
// ============================================================================

/// Per-run settings. `Default` gives the canonical marker path, the
/// `Asset_` prefix, twelve digest digits and the working directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbedOptions {
    pub import_path: String,
    pub prefix: String,
    pub digest_width: usize,
    pub asset_root: PathBuf,
}

impl Default for EmbedOptions {
    fn default() -> Self {
        Self {
            import_path: assets::MARKER_IMPORT_PATH.to_string(),
            prefix: assets::address::DEFAULT_PREFIX.to_string(),
            digest_width: assets::address::DEFAULT_DIGEST_WIDTH,
            asset_root: PathBuf::new(),
        }
    }
}

// ============================================================================
// RESULTS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    /// Nothing to do; the input is emitted byte for byte.
    Unchanged,
    Rewritten,
}

/// One embedded file, as listed in the manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssetSummary {
    pub identifier: String,
    pub filename: String,
    pub digest: String,
    pub size: usize,
}

impl From<&AssetRecord> for AssetSummary {
    fn from(record: &AssetRecord) -> Self {
        Self {
            identifier: record.identifier.clone(),
            filename: record.filename.clone(),
            digest: record.address.digest().to_string(),
            size: record.bytes.len(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub outcome: Outcome,
    pub alias: Option<MarkerAlias>,
    /// Call sites replaced, counting repeats.
    pub rewrites: usize,
    /// Embedded files in declaration order.
    pub assets: Vec<AssetSummary>,
}

impl Report {
    fn unchanged(alias: Option<MarkerAlias>) -> Self {
        Self {
            outcome: Outcome::Unchanged,
            alias,
            rewrites: 0,
            assets: Vec::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Embedded {
    pub source: String,
    pub report: Report,
}

// ============================================================================
// EMBEDDER
// ============================================================================

/// Runs the whole pipeline over one file: parse, resolve the marker alias,
/// rewrite call sites, check for identifier collisions, splice in the new
/// declarations and print.
#[derive(Debug)]
pub struct Embedder<L = FsLoader> {
    options: EmbedOptions,
    addresser: Addresser,
    loader: L,
}

impl Embedder<FsLoader> {
    /// Reads assets from disk, relative to `options.asset_root`.
    pub fn new(options: EmbedOptions) -> Self {
        let loader = FsLoader::new(options.asset_root.clone());
        Self::with_loader(options, loader)
    }
}

impl Default for Embedder<FsLoader> {
    fn default() -> Self {
        Self::new(EmbedOptions::default())
    }
}

impl<L: AssetLoader> Embedder<L> {
    pub fn with_loader(options: EmbedOptions, loader: L) -> Self {
        let addresser = Addresser::new(options.prefix.clone(), options.digest_width);
        Self {
            options,
            addresser,
            loader,
        }
    }

    /// Rewrites `source` and returns the new text. An unchanged run returns
    /// the input exactly as it was read.
    pub fn embed_source(&self, source: &SourceContext) -> EmbedResult<Embedded> {
        let span = info_span!("embed", file = %source.name);
        let _enter = span.enter();

        let mut file = syntax::parse(source)?;
        let report = self.transform(&mut file, source)?;
        let text = match report.outcome {
            Outcome::Unchanged => source.content.clone(),
            Outcome::Rewritten => syntax::print(&file, &source.content),
        };
        info!(
            outcome = ?report.outcome,
            rewrites = report.rewrites,
            assets = report.assets.len(),
            "done"
        );
        Ok(Embedded {
            source: text,
            report,
        })
    }

    /// Rewrites a parsed file in place.
    pub fn transform(&self, file: &mut SourceFile, source: &SourceContext) -> EmbedResult<Report> {
        let Some(alias) = resolve_alias(file, &self.options.import_path) else {
            info!(import_path = %self.options.import_path, "marker package not imported");
            return Ok(Report::unchanged(None));
        };
        debug!(alias = ?alias, "resolved marker alias");

        let names = NameIndex::collect(file);
        let mut rewriter = Rewriter::new(&alias, &self.addresser, &self.loader, source);
        rewriter.visit_file(file)?;
        let (registry, rewrites) = rewriter.finish();

        check_collisions(registry.records(), &names, source)?;

        if synth::splice(file, registry.records(), &alias) == 0 {
            return Ok(Report::unchanged(Some(alias)));
        }
        Ok(Report {
            outcome: Outcome::Rewritten,
            alias: Some(alias),
            rewrites,
            assets: registry.records().iter().map(AssetSummary::from).collect(),
        })
    }
}

/// Generated identifiers must be new to the file and distinct from each
/// other. Two filenames whose digests share the first `width` digits would
/// otherwise declare the same `var` twice.
fn check_collisions(
    records: &[AssetRecord],
    names: &NameIndex,
    source: &SourceContext,
) -> EmbedResult<()> {
    let mut seen: HashMap<&str, Span> = HashMap::new();
    for record in records {
        let taken = names
            .get(&record.identifier)
            .or_else(|| seen.get(record.identifier.as_str()).copied());
        if let Some(span) = taken {
            return Err(EmbedError::IdentifierCollision {
                identifier: record.identifier.clone(),
                filename: record.filename.clone(),
                src: source.to_named_source(),
                span: span.into(),
            });
        }
        seen.insert(&record.identifier, record.span);
    }
    Ok(())
}

/// Every identifier spelled in a file, with its first occurrence.
#[derive(Debug, Default)]
struct NameIndex {
    names: HashMap<String, Span>,
}

impl NameIndex {
    fn collect(file: &mut SourceFile) -> Self {
        let mut index = Self::default();
        if let Err(never) = index.visit_file(file) {
            match never {}
        }
        index
    }

    fn get(&self, name: &str) -> Option<Span> {
        self.names.get(name).copied()
    }
}

impl VisitMut for NameIndex {
    type Error = std::convert::Infallible;

    fn visit_name(&mut self, name: &str, span: Span) -> Result<(), Self::Error> {
        self.names.entry(name.to_string()).or_insert(span);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::{ContentAddress, MemoryLoader};

    fn embed(text: &str, loader: MemoryLoader) -> EmbedResult<Embedded> {
        Embedder::with_loader(EmbedOptions::default(), loader)
            .embed_source(&SourceContext::from_file("main.go", text))
    }

    #[test]
    fn test_absent_import_is_verbatim() {
        let text = "package main\n\nimport \"fmt\"\n\nfunc main()   {\n\tfmt.Println(\"hi\")\n}\n";
        let embedded = embed(text, MemoryLoader::new()).unwrap();
        assert_eq!(embedded.source, text);
        assert_eq!(embedded.report.outcome, Outcome::Unchanged);
        assert_eq!(embedded.report.alias, None);
    }

    #[test]
    fn test_renamed_import() {
        let text = "package main\n\nimport a \"github.com/sysr-q/assets\"\n\nvar x = a.MustRead(\"f\")\n";
        let embedded = embed(text, MemoryLoader::new().with_file("f", *b"z")).unwrap();
        assert_eq!(embedded.report.alias, Some(MarkerAlias::Named("a".into())));
        assert!(embedded.source.contains("var _ = a.Read\n"));
        assert!(embedded.source.contains("= []byte{0x7a}\n"));
    }

    #[test]
    fn test_blank_import_is_unchanged() {
        let text = "package main\n\nimport _ \"github.com/sysr-q/assets\"\n";
        let embedded = embed(text, MemoryLoader::new()).unwrap();
        assert_eq!(embedded.source, text);
        assert_eq!(embedded.report.alias, Some(MarkerAlias::Unqualified));
    }

    #[test]
    fn test_custom_prefix_and_width() {
        let options = EmbedOptions {
            prefix: "Blob".into(),
            digest_width: 6,
            ..EmbedOptions::default()
        };
        let text = "package main\n\nimport \"github.com/sysr-q/assets\"\n\nvar x = assets.MustRead(\"f\")\n";
        let embedded = Embedder::with_loader(options, MemoryLoader::new().with_file("f", *b"z"))
            .embed_source(&SourceContext::from_file("main.go", text))
            .unwrap();
        let identifier = &embedded.report.assets[0].identifier;
        assert!(identifier.starts_with("Blob"));
        assert_eq!(identifier.len(), 10);
    }

    #[test]
    fn test_collision_points_at_existing_name() {
        let identifier = Addresser::default().identifier(&ContentAddress::of("f"));
        let text = format!(
            "package main\n\nimport \"github.com/sysr-q/assets\"\n\nvar {identifier} = 1\nvar x = assets.MustRead(\"f\")\n"
        );
        let err = embed(&text, MemoryLoader::new().with_file("f", *b"z")).unwrap_err();
        match err {
            EmbedError::IdentifierCollision { identifier: found, span, .. } => {
                assert_eq!(found, identifier);
                assert_eq!(span.offset(), text.find(&identifier).unwrap());
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    /// Two filenames whose digests agree on the first `width` digits.
    fn clashing_filenames(addresser: &Addresser) -> (String, String) {
        let mut seen = HashMap::new();
        for n in 0.. {
            let name = format!("f{n}");
            let identifier = addresser.identifier(&addresser.address(&name));
            if let Some(first) = seen.insert(identifier, name.clone()) {
                return (first, name);
            }
        }
        unreachable!()
    }

    #[test]
    fn test_collision_between_generated_names() {
        let options = EmbedOptions {
            digest_width: 4,
            ..EmbedOptions::default()
        };
        let (first, second) = clashing_filenames(&Addresser::new(&options.prefix, 4));
        assert_ne!(first, second);
        let text = format!(
            "package main\n\nimport \"github.com/sysr-q/assets\"\n\nvar a = assets.MustRead(\"{first}\")\nvar b = assets.MustRead(\"{second}\")\n"
        );
        let loader = MemoryLoader::new()
            .with_file(first.as_str(), *b"1")
            .with_file(second.as_str(), *b"2");
        let err = Embedder::with_loader(options, loader)
            .embed_source(&SourceContext::from_file("main.go", text.as_str()))
            .unwrap_err();
        match err {
            EmbedError::IdentifierCollision { filename, span, .. } => {
                assert_eq!(filename, second);
                assert_eq!(span.offset(), text.find(&format!("\"{first}\"")).unwrap());
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
