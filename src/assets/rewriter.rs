//! The rewriting walk.
//!
//! One pass over the file in lexical order. Every expression slot is offered
//! to the matcher before the walker descends into it; a match is replaced in
//! place with a reference to the asset's generated identifier and is not
//! visited again. The first sighting of a filename loads the file and
//! registers a record; later sightings reuse it.

use tracing::{debug, trace};

use super::address::Addresser;
use super::loader::{AssetLoader, LoadError};
use super::matcher::match_call_site;
use super::registry::{AssetRecord, AssetRegistry};
use super::{CallSite, MarkerAlias};
use crate::errors::{EmbedError, SourceContext};
use crate::syntax::ast::{AssignOp, AstExpr, AstStmt, Expr, Stmt};
use crate::syntax::visit::{walk_expr, walk_stmt, VisitMut};
use crate::syntax::Spanned;

pub struct Rewriter<'a, L: AssetLoader + ?Sized> {
    alias: &'a MarkerAlias,
    addresser: &'a Addresser,
    loader: &'a L,
    source: &'a SourceContext,
    registry: AssetRegistry,
    rewrites: usize,
}

impl<'a, L: AssetLoader + ?Sized> Rewriter<'a, L> {
    pub fn new(
        alias: &'a MarkerAlias,
        addresser: &'a Addresser,
        loader: &'a L,
        source: &'a SourceContext,
    ) -> Self {
        Self {
            alias,
            addresser,
            loader,
            source,
            registry: AssetRegistry::new(),
            rewrites: 0,
        }
    }

    /// The records gathered by the walk and the number of call sites
    /// replaced.
    pub fn finish(self) -> (AssetRegistry, usize) {
        (self.registry, self.rewrites)
    }

    /// Resolves a call site to its generated identifier, loading the file
    /// on first sight.
    fn embed(&mut self, site: &CallSite) -> Result<String, EmbedError> {
        self.rewrites += 1;
        let address = self.addresser.address(&site.filename);
        if let Some(record) = self.registry.get(&address) {
            debug!(filename = %site.filename, identifier = %record.identifier, "reusing embedded asset");
            return Ok(record.identifier.clone());
        }

        let bytes = self
            .loader
            .load(&site.filename)
            .map_err(|error| self.load_error(site, error))?;
        let identifier = self.addresser.identifier(&address);
        debug!(
            filename = %site.filename,
            identifier = %identifier,
            size = bytes.len(),
            read_fn = %site.read_fn,
            "embedding asset"
        );
        let record = self.registry.insert(AssetRecord {
            identifier,
            filename: site.filename.clone(),
            address,
            bytes,
            span: site.literal_span,
        });
        Ok(record.identifier.clone())
    }

    fn load_error(&self, site: &CallSite, error: LoadError) -> EmbedError {
        EmbedError::Load {
            filename: site.filename.clone(),
            hint: self
                .loader
                .locate(&site.filename)
                .map(|path| format!("looked for `{}`", path.display())),
            error,
            src: self.source.to_named_source(),
            span: site.literal_span.into(),
        }
    }

    /// Calls through the alias that are not call sites stay as they are.
    fn note_skipped(&self, expr: &AstExpr) {
        let Some(alias) = self.alias.name() else {
            return;
        };
        if let Expr::Call { func, .. } = &expr.value {
            if let Expr::Selector { base, field } = &func.value {
                if matches!(&base.value, Expr::Ident(name) if name == alias) {
                    trace!(function = %field.value, offset = expr.span.start, "leaving marker call untouched");
                }
            }
        }
    }
}

impl<L: AssetLoader + ?Sized> VisitMut for Rewriter<'_, L> {
    type Error = EmbedError;

    /// A call site used as a whole statement becomes `_ = Asset_x`, since a
    /// bare identifier is not a statement.
    fn visit_stmt(&mut self, stmt: &mut AstStmt) -> Result<(), EmbedError> {
        if let Stmt::Expr(expr) | Stmt::Go(expr) | Stmt::Defer(expr) = &stmt.value {
            if let Some(site) = match_call_site(expr, self.alias) {
                let identifier = self.embed(&site)?;
                stmt.value = Stmt::Assign {
                    lhs: vec![Spanned::synthetic(Expr::ident("_"))],
                    op: AssignOp::Assign,
                    rhs: vec![Spanned::new(Expr::ident(identifier), site.span)],
                };
                return Ok(());
            }
        }
        walk_stmt(self, stmt)
    }

    fn visit_expr(&mut self, expr: &mut AstExpr) -> Result<(), EmbedError> {
        match match_call_site(expr, self.alias) {
            Some(site) => {
                let identifier = self.embed(&site)?;
                *expr = Spanned::new(Expr::ident(identifier), site.span);
                Ok(())
            }
            None => {
                self.note_skipped(expr);
                walk_expr(self, expr)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::loader::MemoryLoader;
    use crate::syntax::{parse, print};

    fn rewrite(text: &str, loader: &MemoryLoader) -> Result<(String, AssetRegistry, usize), EmbedError> {
        let source = SourceContext::from_file("t.go", text);
        let mut file = parse(&source)?;
        let alias = MarkerAlias::Named("assets".into());
        let addresser = Addresser::default();
        let mut rewriter = Rewriter::new(&alias, &addresser, loader, &source);
        rewriter.visit_file(&mut file)?;
        let (registry, rewrites) = rewriter.finish();
        Ok((print(&file, text), registry, rewrites))
    }

    #[test]
    fn test_bare_call_becomes_discard() {
        let loader = MemoryLoader::new().with_file("a.txt", *b"a");
        let (out, registry, rewrites) = rewrite(
            "package p\n\nfunc f() {\n\tassets.MustRead(\"a.txt\")\n}\n",
            &loader,
        )
        .unwrap();
        let identifier = &registry.records()[0].identifier;
        assert!(out.contains(&format!("\t_ = {identifier}\n")));
        assert_eq!(rewrites, 1);
    }

    #[test]
    fn test_nested_and_repeated_sites() {
        let loader = MemoryLoader::new().with_file("a.txt", *b"a");
        let (out, registry, rewrites) = rewrite(
            "package p\n\nfunc f() {\n\ts := string(assets.MustRead(\"a.txt\"))\n\tb, _ := g(assets.Read(\"a.txt\"))\n\t_, _ = s, b\n}\n",
            &loader,
        )
        .unwrap();
        assert_eq!(registry.len(), 1);
        assert_eq!(rewrites, 2);
        assert_eq!(loader.loads(), ["a.txt"]);
        assert!(!out.contains("assets."));
    }

    #[test]
    fn test_load_failure_aborts() {
        let loader = MemoryLoader::new();
        let err = rewrite(
            "package p\n\nvar x = assets.MustRead(\"missing.html\")\n",
            &loader,
        )
        .unwrap_err();
        assert!(matches!(err, EmbedError::Load { ref filename, .. } if filename == "missing.html"));
    }
}
