//! Declaration synthesis.
//!
//! Builds one `var <id> = []byte{...}` per record plus an import keeper,
//! `var _ = <alias>.Read`, and splices them in right after the file header.

use super::registry::AssetRecord;
use super::{MarkerAlias, ReadFn};
use crate::syntax::ast::{
    AstDecl, AstExpr, BasicLit, Decl, Element, Expr, Layout, LitKind, SourceFile, Type,
    ValueDecl, ValueSpec,
};
use crate::syntax::Spanned;

/// Byte values per output line.
pub const BYTES_PER_ROW: usize = 16;

/// `var <identifier> = []byte{0x.., ...}`, on one line when the file fits in
/// a single row.
pub fn asset_decl(record: &AssetRecord) -> AstDecl {
    let elements = record
        .bytes
        .iter()
        .map(|byte| Element {
            key: None,
            value: Spanned::synthetic(Expr::BasicLit(BasicLit {
                kind: LitKind::Int,
                raw: format!("{byte:#04x}"),
            })),
        })
        .collect();
    let value = Spanned::synthetic(Expr::CompositeLit {
        ty: Some(Box::new(Type::Slice(Box::new(Type::named("byte"))))),
        elements,
        layout: if record.bytes.len() <= BYTES_PER_ROW {
            Layout::Inline
        } else {
            Layout::Rows(BYTES_PER_ROW)
        },
    });
    var_decl(&record.identifier, value)
}

/// `var _ = <alias>.Read`, which keeps the marker import used once every
/// call through it is gone.
pub fn keeper_decl(alias: &str) -> AstDecl {
    let value = Spanned::synthetic(Expr::Selector {
        base: Box::new(Spanned::synthetic(Expr::ident(alias))),
        field: Spanned::synthetic(ReadFn::Read.as_str().to_string()),
    });
    var_decl("_", value)
}

fn var_decl(name: &str, value: AstExpr) -> AstDecl {
    Spanned::synthetic(Decl::Var(ValueDecl {
        specs: vec![Spanned::synthetic(ValueSpec {
            names: vec![Spanned::synthetic(name.to_string())],
            ty: None,
            values: vec![value],
        })],
        grouped: false,
    }))
}

/// Number of declarations that stay ahead of the synthesized ones: the
/// first declaration, extended over the whole leading run of imports since
/// nothing may come between two import declarations.
pub fn header_len(file: &SourceFile) -> usize {
    let imports = file.decls.iter().take_while(|d| d.value.is_import()).count();
    imports.max(1).min(file.decls.len())
}

/// Inserts the asset declarations, in record order, then the import keeper
/// directly after the header. Returns how many declarations were added.
pub fn splice(file: &mut SourceFile, records: &[AssetRecord], alias: &MarkerAlias) -> usize {
    let at = header_len(file);
    let decls: Vec<AstDecl> = records
        .iter()
        .map(asset_decl)
        .chain(alias.name().map(keeper_decl))
        .collect();
    let added = decls.len();
    file.decls.splice(at..at, decls);
    added
}
