//! Go Parser
//!
//! Converts Go source text into the tree in [`super::ast`]. Parsing is purely
//! syntactic: no name resolution, no type checking.
//!
//! Pest spans of rules that end in an optional part also cover the
//! whitespace and comments skipped before that part was tried. Every span
//! handed to the tree is trimmed back to the last significant character so
//! the printer can reattach comments by position.

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use pest::error::{Error, InputLocation};
use pest::iterators::{Pair, Pairs};
use pest::pratt_parser::{Assoc, Op, PrattParser};
use pest::Parser;
use pest_derive::Parser;

use super::ast::*;
use super::{comments, Span, Spanned};
use crate::errors::{EmbedError, EmbedResult, SourceContext};

#[derive(Parser)]
#[grammar = "syntax/grammar.pest"]
pub(crate) struct GoParser;

/// Go binary operator precedence, lowest first.
static PRATT: Lazy<PrattParser<Rule>> = Lazy::new(|| {
    PrattParser::new()
        .op(Op::infix(Rule::lor, Assoc::Left))
        .op(Op::infix(Rule::land, Assoc::Left))
        .op(Op::infix(Rule::eq, Assoc::Left)
            | Op::infix(Rule::ne, Assoc::Left)
            | Op::infix(Rule::lt, Assoc::Left)
            | Op::infix(Rule::le, Assoc::Left)
            | Op::infix(Rule::gt, Assoc::Left)
            | Op::infix(Rule::ge, Assoc::Left))
        .op(Op::infix(Rule::add, Assoc::Left)
            | Op::infix(Rule::sub, Assoc::Left)
            | Op::infix(Rule::or, Assoc::Left)
            | Op::infix(Rule::xor, Assoc::Left))
        .op(Op::infix(Rule::mul, Assoc::Left)
            | Op::infix(Rule::div, Assoc::Left)
            | Op::infix(Rule::rem, Assoc::Left)
            | Op::infix(Rule::shl, Assoc::Left)
            | Op::infix(Rule::shr, Assoc::Left)
            | Op::infix(Rule::and, Assoc::Left)
            | Op::infix(Rule::and_not, Assoc::Left))
});

// ============================================================================
// PUBLIC API
// ============================================================================

/// Parse a Go source file.
pub fn parse(source: &SourceContext) -> EmbedResult<SourceFile> {
    let comments = comments::collect(source)?;
    let mut pairs = GoParser::parse(Rule::source_file, &source.content)
        .map_err(|e| convert_parse_error(e, source))?;
    let file = pairs
        .next()
        .ok_or_else(|| EmbedError::parse(source, "empty parse result", Span::default()))?;

    let builder = Builder {
        source,
        comment_ends: comments.iter().map(|c| (c.span.end, c.span.start)).collect(),
    };
    let mut tree = builder.source_file(file)?;
    tree.comments = comments;
    Ok(tree)
}

// ============================================================================
// AST BUILDERS
// ============================================================================

type Build<T> = EmbedResult<T>;

struct Builder<'a> {
    source: &'a SourceContext,
    /// Comment end offset to comment start offset.
    comment_ends: BTreeMap<usize, usize>,
}

impl<'a> Builder<'a> {
    // ------------------------------------------------------------------------
    // File & declarations
    // ------------------------------------------------------------------------

    fn source_file(&self, pair: Pair<'_, Rule>) -> Build<SourceFile> {
        let span = self.span(&pair);
        let mut package = None;
        let mut decls = Vec::new();

        for child in pair.into_inner() {
            match child.as_rule() {
                Rule::package_clause => package = Some(self.ident(self.only(child)?)),
                Rule::EOI => {}
                _ => decls.push(self.decl(child)?),
            }
        }

        let package = package
            .ok_or_else(|| EmbedError::parse(self.source, "missing package clause", span))?;
        Ok(SourceFile {
            package,
            decls,
            comments: Vec::new(),
        })
    }

    fn decl(&self, pair: Pair<'_, Rule>) -> Build<AstDecl> {
        let span = self.span(&pair);
        let decl = match pair.as_rule() {
            Rule::import_decl => Decl::Import(self.import_decl(pair)?),
            Rule::const_decl => Decl::Const(self.value_decl(pair)?),
            Rule::var_decl => Decl::Var(self.value_decl(pair)?),
            Rule::type_decl => Decl::Type(self.type_decl(pair)?),
            Rule::func_decl => Decl::Func(self.func_decl(pair)?),
            _ => return Err(self.malformed(&pair)),
        };
        Ok(Spanned::new(decl, span))
    }

    fn import_decl(&self, pair: Pair<'_, Rule>) -> Build<ImportDecl> {
        let inner = self.only(pair)?;
        if inner.as_rule() == Rule::import_group {
            let specs = inner
                .into_inner()
                .map(|spec| self.import_spec(spec))
                .collect::<Build<Vec<_>>>()?;
            return Ok(ImportDecl {
                specs,
                grouped: true,
            });
        }
        Ok(ImportDecl {
            specs: vec![self.import_spec(inner)?],
            grouped: false,
        })
    }

    fn import_spec(&self, pair: Pair<'_, Rule>) -> Build<Spanned<ImportSpec>> {
        let span = self.span(&pair);
        let mut name = None;
        let mut path = None;

        for child in pair.into_inner() {
            match child.as_rule() {
                Rule::import_name => {
                    let inner = self.only(child)?;
                    name = Some(match inner.as_rule() {
                        Rule::dot_import => ImportName::Dot,
                        _ => ImportName::Named(self.ident(inner)),
                    });
                }
                Rule::raw_string | Rule::interpreted_string => {
                    path = Some(BasicLit::string(child.as_str()))
                }
                _ => return Err(self.malformed(&child)),
            }
        }

        let path =
            path.ok_or_else(|| EmbedError::parse(self.source, "import path expected", span))?;
        Ok(Spanned::new(ImportSpec { name, path }, span))
    }

    /// `const` and `var` share one shape.
    fn value_decl(&self, pair: Pair<'_, Rule>) -> Build<ValueDecl> {
        let inner = self.only(pair)?;
        if matches!(inner.as_rule(), Rule::const_group | Rule::var_group) {
            let specs = inner
                .into_inner()
                .map(|spec| self.value_spec(spec))
                .collect::<Build<Vec<_>>>()?;
            return Ok(ValueDecl {
                specs,
                grouped: true,
            });
        }
        Ok(ValueDecl {
            specs: vec![self.value_spec(inner)?],
            grouped: false,
        })
    }

    fn value_spec(&self, pair: Pair<'_, Rule>) -> Build<Spanned<ValueSpec>> {
        let span = self.span(&pair);
        let mut spec = ValueSpec {
            names: Vec::new(),
            ty: None,
            values: Vec::new(),
        };

        for child in pair.into_inner() {
            match child.as_rule() {
                Rule::ident_list => spec.names = self.ident_list(child),
                Rule::ty => spec.ty = Some(self.ty(child)?),
                Rule::expression_list => spec.values = self.expressions(child)?,
                _ => return Err(self.malformed(&child)),
            }
        }
        Ok(Spanned::new(spec, span))
    }

    fn type_decl(&self, pair: Pair<'_, Rule>) -> Build<TypeDecl> {
        let inner = self.only(pair)?;
        if inner.as_rule() == Rule::type_group {
            let specs = inner
                .into_inner()
                .map(|spec| self.type_spec(spec))
                .collect::<Build<Vec<_>>>()?;
            return Ok(TypeDecl {
                specs,
                grouped: true,
            });
        }
        Ok(TypeDecl {
            specs: vec![self.type_spec(inner)?],
            grouped: false,
        })
    }

    fn type_spec(&self, pair: Pair<'_, Rule>) -> Build<Spanned<TypeSpec>> {
        let span = self.span(&pair);
        let mut name = None;
        let mut type_params = Vec::new();
        let mut alias = false;
        let mut ty = None;

        for child in pair.into_inner() {
            match child.as_rule() {
                Rule::ident => name = Some(self.ident(child)),
                Rule::type_params => type_params = self.type_params(child)?,
                Rule::alias_eq => alias = true,
                Rule::ty => ty = Some(self.ty(child)?),
                _ => return Err(self.malformed(&child)),
            }
        }

        match (name, ty) {
            (Some(name), Some(ty)) => Ok(Spanned::new(
                TypeSpec {
                    name,
                    type_params,
                    alias,
                    ty,
                },
                span,
            )),
            _ => Err(EmbedError::parse(self.source, "incomplete type declaration", span)),
        }
    }

    fn func_decl(&self, pair: Pair<'_, Rule>) -> Build<FuncDecl> {
        let span = self.span(&pair);
        let mut recv = None;
        let mut name = None;
        let mut type_params = Vec::new();
        let mut sig = None;
        let mut body = None;

        for child in pair.into_inner() {
            match child.as_rule() {
                Rule::receiver => recv = Some(self.parameters(self.only(child)?)?),
                Rule::ident => name = Some(self.ident(child)),
                Rule::type_params => type_params = self.type_params(child)?,
                Rule::signature => sig = Some(self.signature(child)?),
                Rule::block => body = Some(self.block(child)?),
                _ => return Err(self.malformed(&child)),
            }
        }

        match (name, sig) {
            (Some(name), Some(sig)) => Ok(FuncDecl {
                recv,
                name,
                type_params,
                sig,
                body,
            }),
            _ => Err(EmbedError::parse(self.source, "incomplete function declaration", span)),
        }
    }

    fn ident_list(&self, pair: Pair<'_, Rule>) -> Vec<Ident> {
        pair.into_inner().map(|p| self.ident(p)).collect()
    }

    fn ident(&self, pair: Pair<'_, Rule>) -> Ident {
        Spanned::new(pair.as_str().to_string(), raw_span(&pair))
    }

    fn type_params(&self, pair: Pair<'_, Rule>) -> Build<Vec<TypeParam>> {
        pair.into_inner()
            .map(|decl| {
                let mut names = Vec::new();
                let mut constraint = Vec::new();
                for child in decl.into_inner() {
                    match child.as_rule() {
                        Rule::ident_list => names = self.ident_list(child),
                        Rule::type_union => constraint = self.type_union(child)?,
                        _ => return Err(self.malformed(&child)),
                    }
                }
                Ok(TypeParam { names, constraint })
            })
            .collect()
    }

    // ------------------------------------------------------------------------
    // Types
    // ------------------------------------------------------------------------

    /// Builds a type from `ty` or from any of the concrete type rules.
    fn ty(&self, pair: Pair<'_, Rule>) -> Build<Type> {
        let span = self.span(&pair);
        let ty = match pair.as_rule() {
            Rule::ty | Rule::literal_type | Rule::literal_type_nc | Rule::type_operand => {
                return self.ty(self.only(pair)?)
            }
            Rule::type_name => self.type_name(pair)?,
            Rule::pointer_type => Type::Pointer(Box::new(self.ty(self.only(pair)?)?)),
            Rule::slice_type => Type::Slice(Box::new(self.ty(self.only(pair)?)?)),
            Rule::paren_type => Type::Paren(Box::new(self.ty(self.only(pair)?)?)),
            Rule::func_type => Type::Func(Box::new(self.signature(self.only(pair)?)?)),
            Rule::array_type => {
                let mut inner = pair.into_inner();
                let len = self.only(self.next(&mut inner, span)?)?;
                let len = match len.as_rule() {
                    Rule::ellipsis => None,
                    _ => Some(Box::new(self.expression(len)?)),
                };
                let elem = self.ty(self.next(&mut inner, span)?)?;
                Type::Array {
                    len,
                    elem: Box::new(elem),
                }
            }
            Rule::map_type => {
                let mut inner = pair.into_inner();
                let key = self.ty(self.next(&mut inner, span)?)?;
                let value = self.ty(self.next(&mut inner, span)?)?;
                Type::Map {
                    key: Box::new(key),
                    value: Box::new(value),
                }
            }
            Rule::chan_type => {
                let dir_pair = self.only(pair)?;
                let dir = match dir_pair.as_rule() {
                    Rule::recv_chan => ChanDir::Recv,
                    Rule::send_chan => ChanDir::Send,
                    _ => ChanDir::Both,
                };
                Type::Chan {
                    dir,
                    elem: Box::new(self.ty(self.only(dir_pair)?)?),
                }
            }
            Rule::struct_type => Type::Struct(
                pair.into_inner()
                    .map(|field| self.field(field))
                    .collect::<Build<Vec<_>>>()?,
            ),
            Rule::interface_type => Type::Interface(
                pair.into_inner()
                    .map(|elem| self.interface_elem(elem))
                    .collect::<Build<Vec<_>>>()?,
            ),
            _ => return Err(self.malformed(&pair)),
        };
        Ok(ty)
    }

    fn type_name(&self, pair: Pair<'_, Rule>) -> Build<Type> {
        let mut package = None;
        let mut name = None;
        let mut args = Vec::new();

        for child in pair.into_inner() {
            match child.as_rule() {
                Rule::qualified_ident => {
                    let mut parts: Vec<Ident> = child.into_inner().map(|p| self.ident(p)).collect();
                    name = parts.pop();
                    package = parts.pop();
                }
                Rule::type_args => {
                    args = child
                        .into_inner()
                        .map(|arg| self.ty(arg))
                        .collect::<Build<Vec<_>>>()?
                }
                _ => return Err(self.malformed(&child)),
            }
        }

        let name = name.ok_or_else(|| EmbedError::parse(self.source, "type name expected", Span::default()))?;
        Ok(Type::Name {
            package,
            name,
            args,
        })
    }

    fn signature(&self, pair: Pair<'_, Rule>) -> Build<Signature> {
        let mut sig = Signature {
            params: Vec::new(),
            results: Vec::new(),
            results_parenthesized: false,
        };

        for child in pair.into_inner() {
            match child.as_rule() {
                Rule::parameters => sig.params = self.parameters(child)?,
                Rule::result => {
                    let inner = self.only(child)?;
                    if inner.as_rule() == Rule::parameters {
                        sig.results = self.parameters(inner)?;
                        sig.results_parenthesized = true;
                    } else {
                        sig.results = vec![Param {
                            names: Vec::new(),
                            variadic: false,
                            ty: self.ty(inner)?,
                        }];
                    }
                }
                _ => return Err(self.malformed(&child)),
            }
        }
        Ok(sig)
    }

    fn parameters(&self, pair: Pair<'_, Rule>) -> Build<Vec<Param>> {
        pair.into_inner()
            .map(|decl| {
                let span = self.span(&decl);
                let mut names = Vec::new();
                let mut variadic = false;
                let mut ty = None;
                for child in decl.into_inner() {
                    match child.as_rule() {
                        Rule::ident_list => names = self.ident_list(child),
                        Rule::ellipsis => variadic = true,
                        Rule::ty => ty = Some(self.ty(child)?),
                        _ => return Err(self.malformed(&child)),
                    }
                }
                let ty = ty.ok_or_else(|| EmbedError::parse(self.source, "parameter type expected", span))?;
                Ok(Param {
                    names,
                    variadic,
                    ty,
                })
            })
            .collect()
    }

    fn field(&self, pair: Pair<'_, Rule>) -> Build<Spanned<Field>> {
        let span = self.span(&pair);
        let mut field = Field {
            names: Vec::new(),
            ty: Type::named("_"),
            tag: None,
        };

        for child in pair.into_inner() {
            match child.as_rule() {
                Rule::ident_list => field.names = self.ident_list(child),
                Rule::ty => field.ty = self.ty(child)?,
                Rule::embedded_field => {
                    let mut pointer = false;
                    for part in child.into_inner() {
                        match part.as_rule() {
                            Rule::embed_ptr => pointer = true,
                            _ => field.ty = self.type_name(part)?,
                        }
                    }
                    if pointer {
                        field.ty = Type::Pointer(Box::new(field.ty));
                    }
                }
                Rule::tag => field.tag = Some(BasicLit::string(child.as_str())),
                _ => return Err(self.malformed(&child)),
            }
        }
        Ok(Spanned::new(field, span))
    }

    fn interface_elem(&self, pair: Pair<'_, Rule>) -> Build<Spanned<InterfaceElem>> {
        let span = self.span(&pair);
        let inner = self.only(pair)?;
        let elem = match inner.as_rule() {
            Rule::method_spec => {
                let mut parts = inner.into_inner();
                let name = self.ident(self.next(&mut parts, span)?);
                let sig = self.signature(self.next(&mut parts, span)?)?;
                InterfaceElem::Method { name, sig }
            }
            _ => InterfaceElem::Union(self.type_union(inner)?),
        };
        Ok(Spanned::new(elem, span))
    }

    fn type_union(&self, pair: Pair<'_, Rule>) -> Build<Vec<TypeTerm>> {
        pair.into_inner()
            .map(|term| {
                let mut tilde = false;
                let mut ty = None;
                for child in term.into_inner() {
                    match child.as_rule() {
                        Rule::tilde => tilde = true,
                        _ => ty = Some(self.ty(child)?),
                    }
                }
                let ty = ty.ok_or_else(|| EmbedError::parse(self.source, "type expected", Span::default()))?;
                Ok(TypeTerm { tilde, ty })
            })
            .collect()
    }

    // ------------------------------------------------------------------------
    // Statements
    // ------------------------------------------------------------------------

    fn block(&self, pair: Pair<'_, Rule>) -> Build<Block> {
        let span = self.span(&pair);
        let stmts = self.stmts(pair.into_inner())?;
        Ok(Block { stmts, span })
    }

    fn stmts(&self, pairs: Pairs<'_, Rule>) -> Build<Vec<AstStmt>> {
        pairs.map(|p| self.stmt(p)).collect()
    }

    fn stmt(&self, pair: Pair<'_, Rule>) -> Build<AstStmt> {
        let span = self.span(&pair);
        let stmt = match pair.as_rule() {
            Rule::decl_stmt => Stmt::Decl(self.decl(self.only(pair)?)?.value),
            Rule::labeled_stmt => {
                let mut inner = pair.into_inner();
                let label = self.ident(self.next(&mut inner, span)?);
                let stmt = match inner.next() {
                    Some(p) => Some(Box::new(self.stmt(p)?)),
                    None => None,
                };
                Stmt::Labeled { label, stmt }
            }
            Rule::return_stmt => Stmt::Return(match pair.into_inner().next() {
                Some(list) => self.expressions(list)?,
                None => Vec::new(),
            }),
            Rule::break_stmt => self.branch(BranchKind::Break, pair),
            Rule::continue_stmt => self.branch(BranchKind::Continue, pair),
            Rule::goto_stmt => self.branch(BranchKind::Goto, pair),
            Rule::fallthrough_stmt => self.branch(BranchKind::Fallthrough, pair),
            Rule::go_stmt => Stmt::Go(self.expression(self.only(pair)?)?),
            Rule::defer_stmt => Stmt::Defer(self.expression(self.only(pair)?)?),
            Rule::block => Stmt::Block(self.block(pair)?),
            Rule::if_stmt => Stmt::If(self.if_stmt(pair)?),
            Rule::switch_stmt => Stmt::Switch(self.switch_stmt(pair)?),
            Rule::type_switch_stmt => Stmt::TypeSwitch(self.type_switch_stmt(pair)?),
            Rule::select_stmt => Stmt::Select(
                pair.into_inner()
                    .map(|clause| self.comm_clause(clause))
                    .collect::<Build<Vec<_>>>()?,
            ),
            Rule::for_stmt => self.for_stmt(pair)?,
            Rule::simple_stmt | Rule::simple_stmt_nc => self.simple_stmt(pair)?,
            _ => return Err(self.malformed(&pair)),
        };
        Ok(Spanned::new(stmt, span))
    }

    fn branch(&self, kind: BranchKind, pair: Pair<'_, Rule>) -> Stmt {
        let label = pair.into_inner().next().map(|p| self.ident(p));
        Stmt::Branch { kind, label }
    }

    fn simple_stmt(&self, pair: Pair<'_, Rule>) -> Build<Stmt> {
        let span = self.span(&pair);
        let mut inner = pair.into_inner();
        let lhs = self.expressions(self.next(&mut inner, span)?)?;

        let Some(tail) = inner.next() else {
            return Ok(Stmt::Expr(self.single(lhs, span)?));
        };

        let stmt = match tail.as_rule() {
            Rule::define_tail | Rule::define_tail_nc => {
                if let Some(bad) = lhs.iter().find(|e| !matches!(e.value, Expr::Ident(_))) {
                    return Err(EmbedError::parse(
                        self.source,
                        "non-name on left side of :=",
                        bad.span,
                    ));
                }
                Stmt::Assign {
                    lhs,
                    op: AssignOp::Define,
                    rhs: self.expressions(self.only(tail)?)?,
                }
            }
            Rule::assign_tail | Rule::assign_tail_nc => {
                let mut parts = tail.into_inner();
                let op_pair = self.next(&mut parts, span)?;
                let op = AssignOp::from_token(op_pair.as_str())
                    .ok_or_else(|| self.malformed(&op_pair))?;
                let rhs = self.expressions(self.next(&mut parts, span)?)?;
                Stmt::Assign { lhs, op, rhs }
            }
            Rule::inc_dec => Stmt::IncDec {
                inc: tail.as_str() == "++",
                expr: self.single(lhs, span)?,
            },
            Rule::send_tail | Rule::send_tail_nc => Stmt::Send {
                chan: self.single(lhs, span)?,
                value: self.expression(self.only(tail)?)?,
            },
            _ => return Err(self.malformed(&tail)),
        };
        Ok(stmt)
    }

    fn single(&self, mut exprs: Vec<AstExpr>, span: Span) -> Build<AstExpr> {
        if exprs.len() != 1 {
            return Err(EmbedError::parse(
                self.source,
                format!("expected 1 expression, found {}", exprs.len()),
                span,
            ));
        }
        exprs
            .pop()
            .ok_or_else(|| EmbedError::parse(self.source, "expression expected", span))
    }

    fn if_stmt(&self, pair: Pair<'_, Rule>) -> Build<IfStmt> {
        let span = self.span(&pair);
        let mut init = None;
        let mut cond = None;
        let mut then = None;
        let mut els = None;

        for child in pair.into_inner() {
            match child.as_rule() {
                Rule::simple_stmt_nc => init = Some(Box::new(self.stmt(child)?)),
                Rule::expression_nc => cond = Some(self.expression(child)?),
                Rule::block if then.is_none() => then = Some(self.block(child)?),
                Rule::block | Rule::if_stmt => els = Some(Box::new(self.stmt(child)?)),
                _ => return Err(self.malformed(&child)),
            }
        }

        match (cond, then) {
            (Some(cond), Some(then)) => Ok(IfStmt {
                init,
                cond,
                then,
                els,
            }),
            _ => Err(EmbedError::parse(self.source, "incomplete if statement", span)),
        }
    }

    fn switch_stmt(&self, pair: Pair<'_, Rule>) -> Build<SwitchStmt> {
        let mut switch = SwitchStmt {
            init: None,
            tag: None,
            clauses: Vec::new(),
        };

        for child in pair.into_inner() {
            match child.as_rule() {
                Rule::simple_stmt_nc => switch.init = Some(Box::new(self.stmt(child)?)),
                Rule::switch_tag => switch.tag = Some(self.expression(self.only(child)?)?),
                Rule::case_clause => {
                    let span = self.span(&child);
                    let mut inner = child.into_inner();
                    let label = self.next(&mut inner, span)?;
                    let values = match label.as_rule() {
                        Rule::case_label => Some(self.expressions(self.only(label)?)?),
                        _ => None,
                    };
                    let body = self.stmts(inner)?;
                    switch
                        .clauses
                        .push(Spanned::new(CaseClause { values, body }, span));
                }
                _ => return Err(self.malformed(&child)),
            }
        }
        Ok(switch)
    }

    fn type_switch_stmt(&self, pair: Pair<'_, Rule>) -> Build<TypeSwitchStmt> {
        let span = self.span(&pair);
        let mut init = None;
        let mut binding = None;
        let mut subject = None;
        let mut clauses = Vec::new();

        for child in pair.into_inner() {
            match child.as_rule() {
                Rule::simple_stmt_nc => init = Some(Box::new(self.stmt(child)?)),
                Rule::type_switch_guard => {
                    for part in child.into_inner() {
                        match part.as_rule() {
                            Rule::ident => binding = Some(self.ident(part)),
                            _ => subject = Some(self.primary(part)?),
                        }
                    }
                }
                Rule::type_case_clause => {
                    let clause_span = self.span(&child);
                    let mut inner = child.into_inner();
                    let label = self.next(&mut inner, clause_span)?;
                    let types = match label.as_rule() {
                        Rule::type_case_label => Some(
                            label
                                .into_inner()
                                .map(|t| self.ty(t))
                                .collect::<Build<Vec<_>>>()?,
                        ),
                        _ => None,
                    };
                    let body = self.stmts(inner)?;
                    clauses.push(Spanned::new(TypeCaseClause { types, body }, clause_span));
                }
                _ => return Err(self.malformed(&child)),
            }
        }

        let subject = subject
            .ok_or_else(|| EmbedError::parse(self.source, "type switch subject expected", span))?;
        Ok(TypeSwitchStmt {
            init,
            binding,
            subject,
            clauses,
        })
    }

    fn comm_clause(&self, pair: Pair<'_, Rule>) -> Build<Spanned<CommClause>> {
        let span = self.span(&pair);
        let mut inner = pair.into_inner();
        let label = self.next(&mut inner, span)?;
        let comm = match label.as_rule() {
            Rule::comm_case => Some(Box::new(self.stmt(self.only(label)?)?)),
            _ => None,
        };
        let body = self.stmts(inner)?;
        Ok(Spanned::new(CommClause { comm, body }, span))
    }

    fn for_stmt(&self, pair: Pair<'_, Rule>) -> Build<Stmt> {
        let span = self.span(&pair);
        let mut header = None;
        let mut body = None;
        for child in pair.into_inner() {
            match child.as_rule() {
                Rule::block => body = Some(self.block(child)?),
                _ => header = Some(child),
            }
        }
        let body =
            body.ok_or_else(|| EmbedError::parse(self.source, "loop body expected", span))?;

        let mut fs = ForStmt {
            init: None,
            cond: None,
            post: None,
            clauses: false,
            body,
        };
        let Some(header) = header else {
            return Ok(Stmt::For(fs));
        };

        match header.as_rule() {
            Rule::for_cond => fs.cond = Some(self.expression(self.only(header)?)?),
            Rule::for_clause => {
                fs.clauses = true;
                for part in header.into_inner() {
                    match part.as_rule() {
                        Rule::for_init => fs.init = Some(Box::new(self.stmt(self.only(part)?)?)),
                        Rule::for_cond => fs.cond = Some(self.expression(self.only(part)?)?),
                        Rule::for_post => fs.post = Some(Box::new(self.stmt(self.only(part)?)?)),
                        _ => return Err(self.malformed(&part)),
                    }
                }
            }
            Rule::range_clause => {
                let mut key_value = Vec::new();
                let mut define = false;
                let mut subject = None;
                for part in header.into_inner() {
                    match part.as_rule() {
                        Rule::expression_list_nc => key_value = self.expressions(part)?,
                        Rule::range_op => define = part.as_str() == ":=",
                        _ => subject = Some(self.expression(part)?),
                    }
                }
                let subject = subject
                    .ok_or_else(|| EmbedError::parse(self.source, "range subject expected", span))?;
                return Ok(Stmt::Range(RangeStmt {
                    key_value,
                    define,
                    subject,
                    body: fs.body,
                }));
            }
            _ => return Err(self.malformed(&header)),
        }
        Ok(Stmt::For(fs))
    }

    // ------------------------------------------------------------------------
    // Expressions
    // ------------------------------------------------------------------------

    fn expressions(&self, pair: Pair<'_, Rule>) -> Build<Vec<AstExpr>> {
        pair.into_inner().map(|p| self.expression(p)).collect()
    }

    fn expression(&self, pair: Pair<'_, Rule>) -> Build<AstExpr> {
        PRATT
            .map_primary(|primary| self.unary(primary))
            .map_infix(|lhs, op, rhs| {
                let (lhs, rhs) = (lhs?, rhs?);
                let op = binary_op(op.as_rule()).ok_or_else(|| self.malformed(&op))?;
                let span = Span::new(lhs.span.start, rhs.span.end);
                Ok(Spanned::new(
                    Expr::Binary {
                        op,
                        lhs: Box::new(lhs),
                        rhs: Box::new(rhs),
                    },
                    span,
                ))
            })
            .parse(pair.into_inner())
    }

    fn unary(&self, pair: Pair<'_, Rule>) -> Build<AstExpr> {
        let span = self.span(&pair);
        let mut ops = Vec::new();
        let mut operand = None;

        for child in pair.into_inner() {
            match child.as_rule() {
                Rule::unary_op => {
                    let op = UnaryOp::from_token(child.as_str()).ok_or_else(|| self.malformed(&child))?;
                    ops.push((op, raw_span(&child).start));
                }
                _ => operand = Some(self.primary(child)?),
            }
        }

        let mut expr =
            operand.ok_or_else(|| EmbedError::parse(self.source, "operand expected", span))?;
        for (op, start) in ops.into_iter().rev() {
            let end = expr.span.end;
            expr = Spanned::new(
                Expr::Unary {
                    op,
                    operand: Box::new(expr),
                },
                Span::new(start, end),
            );
        }
        Ok(expr)
    }

    fn primary(&self, pair: Pair<'_, Rule>) -> Build<AstExpr> {
        let span = self.span(&pair);
        let mut inner = pair.into_inner();
        let mut expr = self.operand(self.next(&mut inner, span)?)?;
        for suffix in inner {
            expr = self.suffix(expr, suffix)?;
        }
        Ok(expr)
    }

    fn operand(&self, pair: Pair<'_, Rule>) -> Build<AstExpr> {
        let span = self.span(&pair);
        let expr = match pair.as_rule() {
            Rule::int_lit => literal(LitKind::Int, &pair),
            Rule::float_lit => literal(LitKind::Float, &pair),
            Rule::imaginary_lit => literal(LitKind::Imaginary, &pair),
            Rule::rune_lit => literal(LitKind::Rune, &pair),
            Rule::raw_string | Rule::interpreted_string => literal(LitKind::String, &pair),
            Rule::ident_expr => Expr::Ident(pair.as_str().to_string()),
            Rule::paren_expr => Expr::Paren(Box::new(self.expression(self.only(pair)?)?)),
            Rule::type_operand => Expr::Type(self.ty(pair)?),
            Rule::func_lit => {
                let mut inner = pair.into_inner();
                let sig = self.signature(self.next(&mut inner, span)?)?;
                let body = self.block(self.next(&mut inner, span)?)?;
                Expr::FuncLit { sig, body }
            }
            Rule::composite_lit | Rule::composite_lit_nc => {
                let mut inner = pair.into_inner();
                let ty = self.ty(self.next(&mut inner, span)?)?;
                self.literal_value(self.next(&mut inner, span)?, Some(Box::new(ty)))?
            }
            _ => return Err(self.malformed(&pair)),
        };
        Ok(Spanned::new(expr, span))
    }

    fn literal_value(&self, pair: Pair<'_, Rule>, ty: Option<Box<Type>>) -> Build<Expr> {
        let layout = layout_of(pair.as_str());
        let mut elements = Vec::new();

        for keyed in pair.into_inner() {
            let mut key = None;
            let mut value = None;
            for part in keyed.into_inner() {
                let item = self.element(self.only(part.clone())?)?;
                match part.as_rule() {
                    Rule::element_key => key = Some(item),
                    _ => value = Some(item),
                }
            }
            let value = value.ok_or_else(|| {
                EmbedError::parse(self.source, "element expected", Span::default())
            })?;
            elements.push(Element { key, value });
        }

        Ok(Expr::CompositeLit {
            ty,
            elements,
            layout,
        })
    }

    fn element(&self, pair: Pair<'_, Rule>) -> Build<AstExpr> {
        if pair.as_rule() == Rule::literal_value {
            let span = self.span(&pair);
            return Ok(Spanned::new(self.literal_value(pair, None)?, span));
        }
        self.expression(pair)
    }

    fn suffix(&self, base: AstExpr, pair: Pair<'_, Rule>) -> Build<AstExpr> {
        let span = Span::new(base.span.start, self.span(&pair).end);
        let base = Box::new(base);
        let expr = match pair.as_rule() {
            Rule::selector => Expr::Selector {
                base,
                field: self.ident(self.only(pair)?),
            },
            Rule::type_assert => Expr::TypeAssert {
                base,
                ty: self.ty(self.only(pair)?)?,
            },
            Rule::index_suffix => Expr::Index {
                base,
                indices: pair
                    .into_inner()
                    .map(|p| self.expression(p))
                    .collect::<Build<Vec<_>>>()?,
            },
            Rule::slice_suffix => {
                let (mut low, mut high, mut max) = (None, None, None);
                for part in pair.into_inner() {
                    let rule = part.as_rule();
                    let index = Some(Box::new(self.expression(self.only(part)?)?));
                    match rule {
                        Rule::slice_low => low = index,
                        Rule::slice_high => high = index,
                        _ => max = index,
                    }
                }
                Expr::Slice {
                    base,
                    low,
                    high,
                    max,
                }
            }
            Rule::call_suffix => {
                let mut args = Vec::new();
                let mut ellipsis = false;
                for part in pair.into_inner() {
                    match part.as_rule() {
                        Rule::ellipsis => ellipsis = true,
                        _ => args.push(self.expression(part)?),
                    }
                }
                Expr::Call {
                    func: base,
                    args,
                    ellipsis,
                }
            }
            _ => return Err(self.malformed(&pair)),
        };
        Ok(Spanned::new(expr, span))
    }

    // ------------------------------------------------------------------------
    // Utilities
    // ------------------------------------------------------------------------

    /// The span of `pair` without trailing whitespace or comments.
    fn span(&self, pair: &Pair<'_, Rule>) -> Span {
        let raw = raw_span(pair);
        let text = &self.source.content;
        let mut end = raw.end;
        loop {
            let trimmed = text[raw.start..end].trim_end_matches(|c: char| c.is_whitespace() || c == '\u{feff}');
            end = raw.start + trimmed.len();
            match self.comment_ends.get(&end) {
                Some(&start) if start >= raw.start && start < end => end = start,
                _ => break,
            }
        }
        Span::new(raw.start, end)
    }

    fn only<'i>(&self, pair: Pair<'i, Rule>) -> Build<Pair<'i, Rule>> {
        let span = raw_span(&pair);
        let rule = pair.as_rule();
        pair.into_inner().next().ok_or_else(|| {
            EmbedError::parse(self.source, format!("empty {rule:?}"), span)
        })
    }

    fn next<'i>(&self, pairs: &mut Pairs<'i, Rule>, parent: Span) -> Build<Pair<'i, Rule>> {
        pairs
            .next()
            .ok_or_else(|| EmbedError::parse(self.source, "incomplete syntax", parent))
    }

    fn malformed(&self, pair: &Pair<'_, Rule>) -> EmbedError {
        EmbedError::parse(
            self.source,
            format!("unexpected {:?}", pair.as_rule()),
            raw_span(pair),
        )
    }
}

fn raw_span(pair: &Pair<'_, Rule>) -> Span {
    Span::new(pair.as_span().start(), pair.as_span().end())
}

fn literal(kind: LitKind, pair: &Pair<'_, Rule>) -> Expr {
    Expr::BasicLit(BasicLit {
        kind,
        raw: pair.as_str().to_string(),
    })
}

/// A literal that breaks the line right after its `{` stays multi-line.
fn layout_of(text: &str) -> Layout {
    let rest = text
        .strip_prefix('{')
        .unwrap_or(text)
        .trim_start_matches([' ', '\t']);
    if rest.starts_with('\n') || rest.starts_with('\r') || rest.starts_with("//") {
        Layout::Vertical
    } else {
        Layout::Inline
    }
}

fn binary_op(rule: Rule) -> Option<BinaryOp> {
    Some(match rule {
        Rule::lor => BinaryOp::LogOr,
        Rule::land => BinaryOp::LogAnd,
        Rule::eq => BinaryOp::Eq,
        Rule::ne => BinaryOp::Ne,
        Rule::lt => BinaryOp::Lt,
        Rule::le => BinaryOp::Le,
        Rule::gt => BinaryOp::Gt,
        Rule::ge => BinaryOp::Ge,
        Rule::add => BinaryOp::Add,
        Rule::sub => BinaryOp::Sub,
        Rule::or => BinaryOp::Or,
        Rule::xor => BinaryOp::Xor,
        Rule::mul => BinaryOp::Mul,
        Rule::div => BinaryOp::Div,
        Rule::rem => BinaryOp::Rem,
        Rule::shl => BinaryOp::Shl,
        Rule::shr => BinaryOp::Shr,
        Rule::and => BinaryOp::And,
        Rule::and_not => BinaryOp::AndNot,
        _ => return None,
    })
}

// ============================================================================
// ERROR HANDLING
// ============================================================================

pub(crate) fn convert_parse_error(error: Error<Rule>, source: &SourceContext) -> EmbedError {
    let span = match error.location {
        InputLocation::Pos(pos) => Span::new(pos, pos),
        InputLocation::Span((start, end)) => Span::new(start, end),
    };
    EmbedError::parse(source, error.variant.message().into_owned(), span)
}
