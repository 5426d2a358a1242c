//! Call-site matching.
//!
//! A pure function of the node and the resolved alias. No partial matches:
//! anything other than `alias.Read("lit")` or `alias.MustRead("lit")` is
//! left alone.

use super::{CallSite, MarkerAlias, ReadFn};
use crate::syntax::ast::{AstExpr, Expr};

pub fn match_call_site(expr: &AstExpr, alias: &MarkerAlias) -> Option<CallSite> {
    let alias = alias.name()?;
    let Expr::Call {
        func,
        args,
        ellipsis: false,
    } = &expr.value
    else {
        return None;
    };
    let Expr::Selector { base, field } = &func.value else {
        return None;
    };
    match &base.value {
        Expr::Ident(name) if name == alias => {}
        _ => return None,
    }
    let read_fn = ReadFn::from_name(&field.value)?;

    let [arg] = args.as_slice() else {
        return None;
    };
    let Expr::BasicLit(lit) = &arg.value else {
        return None;
    };
    let filename = lit.string_value()?;

    Some(CallSite {
        filename,
        read_fn,
        span: expr.span,
        literal_span: arg.span,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::SourceContext;
    use crate::syntax::ast::{Decl, ValueDecl};
    use crate::syntax::parse;

    /// Parses `var v = <expr>` and returns the expression.
    fn expr(text: &str) -> AstExpr {
        let source = format!("package p\n\nvar v = {text}\n");
        let file = parse(&SourceContext::from_file("t.go", source)).unwrap();
        let Decl::Var(ValueDecl { mut specs, .. }) = file.decls.into_iter().next().unwrap().value
        else {
            panic!("expected var");
        };
        specs.remove(0).value.values.remove(0)
    }

    fn assets() -> MarkerAlias {
        MarkerAlias::Named("assets".into())
    }

    #[test]
    fn test_must_read_literal() {
        let site = match_call_site(&expr(r#"assets.MustRead("templates/index.html")"#), &assets())
            .unwrap();
        assert_eq!(site.filename, "templates/index.html");
        assert_eq!(site.read_fn, ReadFn::MustRead);
    }

    #[test]
    fn test_read_raw_literal() {
        let site = match_call_site(&expr("assets.Read(`a.txt`)"), &assets()).unwrap();
        assert_eq!(site.filename, "a.txt");
        assert_eq!(site.read_fn, ReadFn::Read);
    }

    #[test]
    fn test_escapes_stay_in_filename() {
        let site = match_call_site(&expr(r#"assets.MustRead("a\x2etxt")"#), &assets()).unwrap();
        assert_eq!(site.filename, r"a\x2etxt");

        let site = match_call_site(&expr(r#"assets.Read("bin\xff.dat")"#), &assets()).unwrap();
        assert_eq!(site.filename, r"bin\xff.dat");
        assert_eq!(site.read_fn, ReadFn::Read);
    }

    #[test]
    fn test_rejects_everything_else() {
        let alias = assets();
        for text in [
            "assets.MustRead(name)",
            r#"assets.MustRead("a", "b")"#,
            "assets.MustRead()",
            r#"assets.ReadAll("a")"#,
            r#"other.MustRead("a")"#,
            r#"assets.MustRead("a" + "b")"#,
            "assets.MustRead(42)",
            r#"(assets.MustRead)("a")"#,
            "assets.MustRead(names...)",
        ] {
            assert!(match_call_site(&expr(text), &alias).is_none(), "{text}");
        }
    }

    #[test]
    fn test_unqualified_alias_never_matches() {
        let call = expr(r#"assets.MustRead("a")"#);
        assert!(match_call_site(&call, &MarkerAlias::Unqualified).is_none());
    }

    #[test]
    fn test_renamed_alias() {
        let call = expr(r#"res.MustRead("a")"#);
        assert!(match_call_site(&call, &assets()).is_none());
        assert!(match_call_site(&call, &MarkerAlias::Named("res".into())).is_some());
    }
}
