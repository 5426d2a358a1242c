//! Mutable tree walker
//!
//! Implement [`VisitMut`] to walk a [`SourceFile`] in lexical order. Every
//! visit method has a default that calls the matching `walk_*` function, so
//! an implementation only overrides the nodes it cares about. A visitor that
//! replaces a node through the `&mut` slot it is handed and returns without
//! walking it will not see the replacement again.
//!
//! Every identifier spelled in the file, whether it stands alone as an
//! expression or is part of a declaration, a type or a selector, is reported
//! through [`VisitMut::visit_name`].

use super::ast::*;
use super::Span;

pub trait VisitMut: Sized {
    type Error;

    fn visit_file(&mut self, file: &mut SourceFile) -> Result<(), Self::Error> {
        walk_file(self, file)
    }

    fn visit_decl(&mut self, decl: &mut Decl) -> Result<(), Self::Error> {
        walk_decl(self, decl)
    }

    fn visit_stmt(&mut self, stmt: &mut AstStmt) -> Result<(), Self::Error> {
        walk_stmt(self, stmt)
    }

    fn visit_expr(&mut self, expr: &mut AstExpr) -> Result<(), Self::Error> {
        walk_expr(self, expr)
    }

    fn visit_type(&mut self, ty: &mut Type) -> Result<(), Self::Error> {
        walk_type(self, ty)
    }

    /// Leaf: an identifier and where it is spelled.
    fn visit_name(&mut self, _name: &str, _span: Span) -> Result<(), Self::Error> {
        Ok(())
    }
}

// ============================================================================
// DECLARATIONS
// ============================================================================

pub fn walk_file<V: VisitMut>(visitor: &mut V, file: &mut SourceFile) -> Result<(), V::Error> {
    visit_ident(visitor, &file.package)?;
    for decl in &mut file.decls {
        visitor.visit_decl(&mut decl.value)?;
    }
    Ok(())
}

pub fn walk_decl<V: VisitMut>(visitor: &mut V, decl: &mut Decl) -> Result<(), V::Error> {
    match decl {
        Decl::Import(import) => {
            for spec in &import.specs {
                if let Some(ImportName::Named(name)) = &spec.value.name {
                    visit_ident(visitor, name)?;
                }
            }
        }
        Decl::Const(values) | Decl::Var(values) => {
            for spec in &mut values.specs {
                let spec = &mut spec.value;
                visit_idents(visitor, &spec.names)?;
                if let Some(ty) = &mut spec.ty {
                    visitor.visit_type(ty)?;
                }
                visit_exprs(visitor, &mut spec.values)?;
            }
        }
        Decl::Type(types) => {
            for spec in &mut types.specs {
                let spec = &mut spec.value;
                visit_ident(visitor, &spec.name)?;
                walk_type_params(visitor, &mut spec.type_params)?;
                visitor.visit_type(&mut spec.ty)?;
            }
        }
        Decl::Func(func) => {
            if let Some(recv) = &mut func.recv {
                walk_params(visitor, recv)?;
            }
            visit_ident(visitor, &func.name)?;
            walk_type_params(visitor, &mut func.type_params)?;
            walk_signature(visitor, &mut func.sig)?;
            if let Some(body) = &mut func.body {
                walk_block(visitor, body)?;
            }
        }
    }
    Ok(())
}

pub fn walk_signature<V: VisitMut>(visitor: &mut V, sig: &mut Signature) -> Result<(), V::Error> {
    walk_params(visitor, &mut sig.params)?;
    walk_params(visitor, &mut sig.results)
}

pub fn walk_params<V: VisitMut>(visitor: &mut V, params: &mut [Param]) -> Result<(), V::Error> {
    for param in params {
        visit_idents(visitor, &param.names)?;
        visitor.visit_type(&mut param.ty)?;
    }
    Ok(())
}

pub fn walk_type_params<V: VisitMut>(
    visitor: &mut V,
    params: &mut [TypeParam],
) -> Result<(), V::Error> {
    for param in params {
        visit_idents(visitor, &param.names)?;
        for term in &mut param.constraint {
            visitor.visit_type(&mut term.ty)?;
        }
    }
    Ok(())
}

// ============================================================================
// STATEMENTS
// ============================================================================

pub fn walk_block<V: VisitMut>(visitor: &mut V, block: &mut Block) -> Result<(), V::Error> {
    visit_stmts(visitor, &mut block.stmts)
}

pub fn walk_stmt<V: VisitMut>(visitor: &mut V, stmt: &mut AstStmt) -> Result<(), V::Error> {
    match &mut stmt.value {
        Stmt::Decl(decl) => visitor.visit_decl(decl)?,
        Stmt::Labeled { label, stmt } => {
            visit_ident(visitor, label)?;
            if let Some(stmt) = stmt {
                visitor.visit_stmt(stmt)?;
            }
        }
        Stmt::Expr(expr) | Stmt::Go(expr) | Stmt::Defer(expr) => visitor.visit_expr(expr)?,
        Stmt::IncDec { expr, .. } => visitor.visit_expr(expr)?,
        Stmt::Send { chan, value } => {
            visitor.visit_expr(chan)?;
            visitor.visit_expr(value)?;
        }
        Stmt::Assign { lhs, rhs, .. } => {
            visit_exprs(visitor, lhs)?;
            visit_exprs(visitor, rhs)?;
        }
        Stmt::Return(results) => visit_exprs(visitor, results)?,
        Stmt::Branch { label, .. } => {
            if let Some(label) = label {
                visit_ident(visitor, label)?;
            }
        }
        Stmt::Block(block) => walk_block(visitor, block)?,
        Stmt::If(if_stmt) => {
            visit_opt_stmt(visitor, &mut if_stmt.init)?;
            visitor.visit_expr(&mut if_stmt.cond)?;
            walk_block(visitor, &mut if_stmt.then)?;
            visit_opt_stmt(visitor, &mut if_stmt.els)?;
        }
        Stmt::Switch(switch) => {
            visit_opt_stmt(visitor, &mut switch.init)?;
            if let Some(tag) = &mut switch.tag {
                visitor.visit_expr(tag)?;
            }
            for clause in &mut switch.clauses {
                if let Some(values) = &mut clause.value.values {
                    visit_exprs(visitor, values)?;
                }
                visit_stmts(visitor, &mut clause.value.body)?;
            }
        }
        Stmt::TypeSwitch(switch) => {
            visit_opt_stmt(visitor, &mut switch.init)?;
            if let Some(binding) = &switch.binding {
                visit_ident(visitor, binding)?;
            }
            visitor.visit_expr(&mut switch.subject)?;
            for clause in &mut switch.clauses {
                if let Some(types) = &mut clause.value.types {
                    for ty in types {
                        visitor.visit_type(ty)?;
                    }
                }
                visit_stmts(visitor, &mut clause.value.body)?;
            }
        }
        Stmt::Select(clauses) => {
            for clause in clauses {
                visit_opt_stmt(visitor, &mut clause.value.comm)?;
                visit_stmts(visitor, &mut clause.value.body)?;
            }
        }
        Stmt::For(for_stmt) => {
            visit_opt_stmt(visitor, &mut for_stmt.init)?;
            if let Some(cond) = &mut for_stmt.cond {
                visitor.visit_expr(cond)?;
            }
            visit_opt_stmt(visitor, &mut for_stmt.post)?;
            walk_block(visitor, &mut for_stmt.body)?;
        }
        Stmt::Range(range) => {
            visit_exprs(visitor, &mut range.key_value)?;
            visitor.visit_expr(&mut range.subject)?;
            walk_block(visitor, &mut range.body)?;
        }
    }
    Ok(())
}

// ============================================================================
// EXPRESSIONS & TYPES
// ============================================================================

pub fn walk_expr<V: VisitMut>(visitor: &mut V, expr: &mut AstExpr) -> Result<(), V::Error> {
    let span = expr.span;
    match &mut expr.value {
        Expr::Ident(name) => visitor.visit_name(name, span)?,
        Expr::BasicLit(_) => {}
        Expr::CompositeLit { ty, elements, .. } => {
            if let Some(ty) = ty {
                visitor.visit_type(ty)?;
            }
            for element in elements {
                if let Some(key) = &mut element.key {
                    visitor.visit_expr(key)?;
                }
                visitor.visit_expr(&mut element.value)?;
            }
        }
        Expr::FuncLit { sig, body } => {
            walk_signature(visitor, sig)?;
            walk_block(visitor, body)?;
        }
        Expr::Paren(inner) => visitor.visit_expr(inner)?,
        Expr::Selector { base, field } => {
            visitor.visit_expr(base)?;
            visit_ident(visitor, field)?;
        }
        Expr::Index { base, indices } => {
            visitor.visit_expr(base)?;
            visit_exprs(visitor, indices)?;
        }
        Expr::Slice {
            base,
            low,
            high,
            max,
        } => {
            visitor.visit_expr(base)?;
            for index in [low, high, max].into_iter().flatten() {
                visitor.visit_expr(index)?;
            }
        }
        Expr::TypeAssert { base, ty } => {
            visitor.visit_expr(base)?;
            visitor.visit_type(ty)?;
        }
        Expr::Call { func, args, .. } => {
            visitor.visit_expr(func)?;
            visit_exprs(visitor, args)?;
        }
        Expr::Unary { operand, .. } => visitor.visit_expr(operand)?,
        Expr::Binary { lhs, rhs, .. } => {
            visitor.visit_expr(lhs)?;
            visitor.visit_expr(rhs)?;
        }
        Expr::Type(ty) => visitor.visit_type(ty)?,
    }
    Ok(())
}

pub fn walk_type<V: VisitMut>(visitor: &mut V, ty: &mut Type) -> Result<(), V::Error> {
    match ty {
        Type::Name {
            package,
            name,
            args,
        } => {
            if let Some(package) = package {
                visit_ident(visitor, package)?;
            }
            visit_ident(visitor, name)?;
            for arg in args {
                visitor.visit_type(arg)?;
            }
        }
        Type::Pointer(elem) | Type::Slice(elem) | Type::Paren(elem) => visitor.visit_type(elem)?,
        Type::Chan { elem, .. } => visitor.visit_type(elem)?,
        Type::Array { len, elem } => {
            if let Some(len) = len {
                visitor.visit_expr(len)?;
            }
            visitor.visit_type(elem)?;
        }
        Type::Map { key, value } => {
            visitor.visit_type(key)?;
            visitor.visit_type(value)?;
        }
        Type::Func(sig) => walk_signature(visitor, sig)?,
        Type::Struct(fields) => {
            for field in fields {
                visit_idents(visitor, &field.value.names)?;
                visitor.visit_type(&mut field.value.ty)?;
            }
        }
        Type::Interface(elems) => {
            for elem in elems {
                match &mut elem.value {
                    InterfaceElem::Method { name, sig } => {
                        visit_ident(visitor, name)?;
                        walk_signature(visitor, sig)?;
                    }
                    InterfaceElem::Union(terms) => {
                        for term in terms {
                            visitor.visit_type(&mut term.ty)?;
                        }
                    }
                }
            }
        }
    }
    Ok(())
}

// ============================================================================
// HELPERS
// ============================================================================

fn visit_ident<V: VisitMut>(visitor: &mut V, ident: &Ident) -> Result<(), V::Error> {
    visitor.visit_name(&ident.value, ident.span)
}

fn visit_idents<V: VisitMut>(visitor: &mut V, idents: &[Ident]) -> Result<(), V::Error> {
    idents.iter().try_for_each(|ident| visit_ident(visitor, ident))
}

fn visit_exprs<V: VisitMut>(visitor: &mut V, exprs: &mut [AstExpr]) -> Result<(), V::Error> {
    exprs.iter_mut().try_for_each(|expr| visitor.visit_expr(expr))
}

fn visit_stmts<V: VisitMut>(visitor: &mut V, stmts: &mut [AstStmt]) -> Result<(), V::Error> {
    stmts.iter_mut().try_for_each(|stmt| visitor.visit_stmt(stmt))
}

fn visit_opt_stmt<V: VisitMut>(
    visitor: &mut V,
    stmt: &mut Option<Box<AstStmt>>,
) -> Result<(), V::Error> {
    match stmt {
        Some(stmt) => visitor.visit_stmt(stmt),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::SourceContext;
    use crate::syntax::parse;
    use std::convert::Infallible;

    #[derive(Default)]
    struct Names(Vec<String>);

    impl VisitMut for Names {
        type Error = Infallible;

        fn visit_name(&mut self, name: &str, _span: Span) -> Result<(), Infallible> {
            self.0.push(name.to_string());
            Ok(())
        }
    }

    #[test]
    fn test_names_in_lexical_order() {
        let text = "package p\n\nvar x T = f(y)\n\nfunc g(a int) {\n\tb := a.c\n}\n";
        let mut file = parse(&SourceContext::from_file("t.go", text)).unwrap();
        let mut names = Names::default();
        names.visit_file(&mut file).unwrap();
        assert_eq!(names.0, ["p", "x", "T", "f", "y", "g", "a", "int", "b", "a", "c"]);
    }

    struct Renamer;

    impl VisitMut for Renamer {
        type Error = Infallible;

        fn visit_expr(&mut self, expr: &mut AstExpr) -> Result<(), Infallible> {
            if let Expr::Ident(name) = &mut expr.value {
                if name == "old" {
                    *name = "new".to_string();
                }
            }
            walk_expr(self, expr)
        }
    }

    #[test]
    fn test_replacement_through_slot() {
        let text = "package p\n\nvar v = g(old, h(old))\n";
        let mut file = parse(&SourceContext::from_file("t.go", text)).unwrap();
        Renamer.visit_file(&mut file).unwrap();
        let mut names = Names::default();
        names.visit_file(&mut file).unwrap();
        assert_eq!(names.0, ["p", "v", "g", "new", "h", "new"]);
    }
}
