//! Go source printer
//!
//! Turns a [`SourceFile`] back into text: tab indentation, one statement per
//! line, grouped declarations in parentheses. Nodes parsed from source carry
//! their spans, which the printer uses to put comments and single blank
//! lines back where they were. Synthesized nodes have empty spans and are
//! printed without either.
//!
//! Expressions are printed on one line except for function literal bodies
//! and composite literals laid out vertically or in rows. Comments that sat
//! inside a flattened expression become trailing comments of its statement.

use super::ast::*;
use super::{Span, Spanned};

/// Prints `file`; `source` is the text it was parsed from.
pub fn print(file: &SourceFile, source: &str) -> String {
    let mut printer = Printer::new(source, &file.comments);
    printer.file(file);
    printer.finish()
}

struct Printer<'a> {
    source: &'a str,
    comments: &'a [Comment],
    next_comment: usize,
    /// End offset of the last source item or comment written.
    last_end: Option<usize>,
    out: String,
    indent: usize,
    at_line_start: bool,
}

impl<'a> Printer<'a> {
    fn new(source: &'a str, comments: &'a [Comment]) -> Self {
        Self {
            source,
            comments,
            next_comment: 0,
            last_end: None,
            out: String::new(),
            indent: 0,
            at_line_start: true,
        }
    }

    fn finish(mut self) -> String {
        self.flush_comments(self.source.len(), false);
        while self.out.ends_with("\n\n") {
            self.out.pop();
        }
        if !self.out.ends_with('\n') {
            self.out.push('\n');
        }
        self.out
    }

    // ========================================================================
    // OUTPUT PRIMITIVES
    // ========================================================================

    fn write(&mut self, text: &str) {
        if self.at_line_start && !text.is_empty() {
            for _ in 0..self.indent {
                self.out.push('\t');
            }
            self.at_line_start = false;
        }
        self.out.push_str(text);
    }

    fn newline(&mut self) {
        self.out.push('\n');
        self.at_line_start = true;
    }

    fn blank_line(&mut self) {
        if !self.out.is_empty() && !self.out.ends_with("\n\n") && !self.out.ends_with("{\n") {
            self.newline();
        }
    }

    fn dedent(&mut self) {
        self.indent = self.indent.saturating_sub(1);
    }

    // ========================================================================
    // COMMENTS & SPACING
    // ========================================================================

    /// True when the source has an empty line between the last written item
    /// and `pos`.
    fn blank_before(&self, pos: usize) -> bool {
        match self.last_end {
            Some(end) if end <= pos => self.source[end..pos].matches('\n').count() >= 2,
            _ => false,
        }
    }

    /// Writes every pending comment that starts before `pos`, one per line.
    fn flush_comments(&mut self, pos: usize, mut first: bool) -> bool {
        let mut wrote = false;
        while let Some(comment) = self.comments.get(self.next_comment) {
            if comment.span.start >= pos {
                break;
            }
            if !first && self.blank_before(comment.span.start) {
                self.blank_line();
            }
            self.write(&comment.text);
            self.newline();
            self.last_end = Some(comment.span.end);
            self.next_comment += 1;
            first = false;
            wrote = true;
        }
        wrote
    }

    /// Prepares a new line for an item starting at `span.start`.
    fn begin_item(&mut self, span: Span, first: bool) {
        if span.is_empty() {
            return;
        }
        let wrote = self.flush_comments(span.start, first);
        if (wrote || !first) && self.blank_before(span.start) {
            self.blank_line();
        }
    }

    /// Ends the line of an item, attaching comments that were inside it or
    /// follow it on the same source line.
    fn end_item(&mut self, span: Span) {
        if !span.is_empty() {
            self.last_end = Some(span.end);
            while let Some(comment) = self.comments.get(self.next_comment) {
                let inside = comment.span.start < span.end;
                if !inside && self.source[span.end..comment.span.start].contains('\n') {
                    break;
                }
                self.write(" ");
                self.write(&comment.text);
                self.last_end = Some(comment.span.end.max(span.end));
                self.next_comment += 1;
            }
        }
        self.newline();
    }

    /// Writes comments left before a closing `}` or `)` at `close`.
    fn close_item(&mut self, close: Option<usize>, empty: bool) {
        if let Some(close) = close {
            self.flush_comments(close, empty);
        }
    }

    fn has_comments_before(&self, pos: Option<usize>) -> bool {
        match (pos, self.comments.get(self.next_comment)) {
            (Some(pos), Some(comment)) => comment.span.start < pos,
            _ => false,
        }
    }

    // ========================================================================
    // FILE & DECLARATIONS
    // ========================================================================

    fn file(&mut self, file: &SourceFile) {
        let package = file.package.span;
        self.begin_item(package, true);
        self.write("package ");
        self.write(&file.package.value);
        self.end_item(package);

        let mut prev: Option<&AstDecl> = None;
        for decl in &file.decls {
            let synthetic = decl.span.is_empty();
            let separate = match prev {
                None => true,
                Some(prev) => {
                    prev.span.is_empty() != synthetic
                        || matches!(prev.value, Decl::Func(_))
                        || matches!(decl.value, Decl::Func(_))
                }
            };
            if separate {
                self.blank_line();
            }
            self.begin_item(decl.span, false);
            self.decl(&decl.value, decl.span);
            self.end_item(decl.span);
            prev = Some(decl);
        }
    }

    fn decl(&mut self, decl: &Decl, span: Span) {
        let close = (!span.is_empty()).then(|| span.end - 1);
        match decl {
            Decl::Import(import) => {
                self.group("import", import.grouped, &import.specs, close, |p, spec| {
                    match &spec.name {
                        Some(ImportName::Named(name)) => {
                            p.write(&name.value);
                            p.write(" ");
                        }
                        Some(ImportName::Dot) => p.write(". "),
                        None => {}
                    }
                    p.write(&spec.path.raw);
                })
            }
            Decl::Const(values) => self.value_decl("const", values, close),
            Decl::Var(values) => self.value_decl("var", values, close),
            Decl::Type(types) => self.group("type", types.grouped, &types.specs, close, |p, spec| {
                p.write(&spec.name.value);
                p.type_params(&spec.type_params);
                p.write(if spec.alias { " = " } else { " " });
                p.ty(&spec.ty);
            }),
            Decl::Func(func) => self.func_decl(func),
        }
    }

    fn value_decl(&mut self, keyword: &str, decl: &ValueDecl, close: Option<usize>) {
        self.group(keyword, decl.grouped, &decl.specs, close, |p, spec| {
            p.idents(&spec.names);
            if let Some(ty) = &spec.ty {
                p.write(" ");
                p.ty(ty);
            }
            if !spec.values.is_empty() {
                p.write(" = ");
                p.exprs(&spec.values);
            }
        });
    }

    fn group<T>(
        &mut self,
        keyword: &str,
        grouped: bool,
        specs: &[Spanned<T>],
        close: Option<usize>,
        print: impl Fn(&mut Self, &T),
    ) {
        self.write(keyword);
        if !grouped {
            if let Some(spec) = specs.first() {
                self.write(" ");
                print(self, &spec.value);
            }
            return;
        }

        self.write(" (");
        if specs.is_empty() && !self.has_comments_before(close) {
            self.write(")");
            return;
        }
        self.newline();
        self.indent += 1;
        for (i, spec) in specs.iter().enumerate() {
            self.begin_item(spec.span, i == 0);
            print(self, &spec.value);
            self.end_item(spec.span);
        }
        self.close_item(close, specs.is_empty());
        self.dedent();
        self.write(")");
    }

    fn func_decl(&mut self, func: &FuncDecl) {
        self.write("func ");
        if let Some(recv) = &func.recv {
            self.write("(");
            self.params(recv);
            self.write(") ");
        }
        self.write(&func.name.value);
        self.type_params(&func.type_params);
        self.signature(&func.sig);
        if let Some(body) = &func.body {
            self.write(" ");
            self.block(body);
        }
    }

    fn type_params(&mut self, params: &[TypeParam]) {
        if params.is_empty() {
            return;
        }
        self.write("[");
        for (i, param) in params.iter().enumerate() {
            if i > 0 {
                self.write(", ");
            }
            self.idents(&param.names);
            self.write(" ");
            self.type_union(&param.constraint);
        }
        self.write("]");
    }

    fn signature(&mut self, sig: &Signature) {
        self.write("(");
        self.params(&sig.params);
        self.write(")");
        match sig.results.as_slice() {
            [] => {}
            [single] if !sig.results_parenthesized => {
                self.write(" ");
                self.ty(&single.ty);
            }
            results => {
                self.write(" (");
                self.params(results);
                self.write(")");
            }
        }
    }

    fn params(&mut self, params: &[Param]) {
        for (i, param) in params.iter().enumerate() {
            if i > 0 {
                self.write(", ");
            }
            if !param.names.is_empty() {
                self.idents(&param.names);
                self.write(" ");
            }
            if param.variadic {
                self.write("...");
            }
            self.ty(&param.ty);
        }
    }

    fn idents(&mut self, idents: &[Ident]) {
        for (i, ident) in idents.iter().enumerate() {
            if i > 0 {
                self.write(", ");
            }
            self.write(&ident.value);
        }
    }

    // ========================================================================
    // TYPES
    // ========================================================================

    fn ty(&mut self, ty: &Type) {
        match ty {
            Type::Name {
                package,
                name,
                args,
            } => {
                if let Some(package) = package {
                    self.write(&package.value);
                    self.write(".");
                }
                self.write(&name.value);
                if !args.is_empty() {
                    self.write("[");
                    for (i, arg) in args.iter().enumerate() {
                        if i > 0 {
                            self.write(", ");
                        }
                        self.ty(arg);
                    }
                    self.write("]");
                }
            }
            Type::Pointer(elem) => {
                self.write("*");
                self.ty(elem);
            }
            Type::Slice(elem) => {
                self.write("[]");
                self.ty(elem);
            }
            Type::Array { len, elem } => {
                self.write("[");
                match len {
                    Some(len) => self.expr(len),
                    None => self.write("..."),
                }
                self.write("]");
                self.ty(elem);
            }
            Type::Map { key, value } => {
                self.write("map[");
                self.ty(key);
                self.write("]");
                self.ty(value);
            }
            Type::Chan { dir, elem } => {
                self.write(match dir {
                    ChanDir::Both => "chan ",
                    ChanDir::Send => "chan<- ",
                    ChanDir::Recv => "<-chan ",
                });
                self.ty(elem);
            }
            Type::Func(sig) => {
                self.write("func");
                self.signature(sig);
            }
            Type::Struct(fields) => {
                if fields.is_empty() {
                    self.write("struct{}");
                    return;
                }
                self.write("struct {");
                self.newline();
                self.indent += 1;
                for (i, field) in fields.iter().enumerate() {
                    self.begin_item(field.span, i == 0);
                    let field_value = &field.value;
                    if !field_value.names.is_empty() {
                        self.idents(&field_value.names);
                        self.write(" ");
                    }
                    self.ty(&field_value.ty);
                    if let Some(tag) = &field_value.tag {
                        self.write(" ");
                        self.write(&tag.raw);
                    }
                    self.end_item(field.span);
                }
                self.dedent();
                self.write("}");
            }
            Type::Interface(elems) => {
                if elems.is_empty() {
                    self.write("interface{}");
                    return;
                }
                self.write("interface {");
                self.newline();
                self.indent += 1;
                for (i, elem) in elems.iter().enumerate() {
                    self.begin_item(elem.span, i == 0);
                    match &elem.value {
                        InterfaceElem::Method { name, sig } => {
                            self.write(&name.value);
                            self.signature(sig);
                        }
                        InterfaceElem::Union(terms) => self.type_union(terms),
                    }
                    self.end_item(elem.span);
                }
                self.dedent();
                self.write("}");
            }
            Type::Paren(inner) => {
                self.write("(");
                self.ty(inner);
                self.write(")");
            }
        }
    }

    fn type_union(&mut self, terms: &[TypeTerm]) {
        for (i, term) in terms.iter().enumerate() {
            if i > 0 {
                self.write(" | ");
            }
            if term.tilde {
                self.write("~");
            }
            self.ty(&term.ty);
        }
    }

    // ========================================================================
    // STATEMENTS
    // ========================================================================

    fn block(&mut self, block: &Block) {
        self.write("{");
        let close = block.rbrace();
        if block.stmts.is_empty() && !self.has_comments_before(close) {
            self.write("}");
            return;
        }
        self.newline();
        self.indent += 1;
        self.stmt_list(&block.stmts);
        self.close_item(close, block.stmts.is_empty());
        self.dedent();
        self.write("}");
    }

    fn stmt_list(&mut self, stmts: &[AstStmt]) {
        for (i, stmt) in stmts.iter().enumerate() {
            self.begin_item(stmt.span, i == 0);
            self.stmt(stmt);
            self.end_item(stmt.span);
        }
    }

    /// Case clauses sit at the indentation of their `switch`.
    fn clause_body(&mut self, span: Span, body: &[AstStmt]) {
        self.newline();
        self.indent += 1;
        self.stmt_list(body);
        self.dedent();
        if body.is_empty() && !span.is_empty() {
            self.last_end = Some(span.end);
        }
    }

    fn stmt(&mut self, stmt: &AstStmt) {
        let close = (!stmt.span.is_empty()).then(|| stmt.span.end - 1);
        match &stmt.value {
            Stmt::Decl(decl) => self.decl(decl, stmt.span),
            Stmt::Labeled { label, stmt } => {
                let indent = self.indent;
                self.dedent();
                self.write(&label.value);
                self.write(":");
                self.indent = indent;
                if let Some(inner) = stmt {
                    self.newline();
                    self.stmt(inner);
                }
            }
            Stmt::Expr(expr) => self.expr(expr),
            Stmt::Send { chan, value } => {
                self.expr(chan);
                self.write(" <- ");
                self.expr(value);
            }
            Stmt::IncDec { expr, inc } => {
                self.expr(expr);
                self.write(if *inc { "++" } else { "--" });
            }
            Stmt::Assign { lhs, op, rhs } => {
                self.exprs(lhs);
                self.write(" ");
                self.write(op.as_str());
                self.write(" ");
                self.exprs(rhs);
            }
            Stmt::Go(expr) => {
                self.write("go ");
                self.expr(expr);
            }
            Stmt::Defer(expr) => {
                self.write("defer ");
                self.expr(expr);
            }
            Stmt::Return(results) => {
                self.write("return");
                if !results.is_empty() {
                    self.write(" ");
                    self.exprs(results);
                }
            }
            Stmt::Branch { kind, label } => {
                self.write(kind.as_str());
                if let Some(label) = label {
                    self.write(" ");
                    self.write(&label.value);
                }
            }
            Stmt::Block(block) => self.block(block),
            Stmt::If(if_stmt) => self.if_stmt(if_stmt),
            Stmt::Switch(switch) => {
                self.write("switch ");
                self.header_init(&switch.init);
                if let Some(tag) = &switch.tag {
                    self.expr(tag);
                    self.write(" ");
                }
                self.write("{");
                self.newline();
                for (i, clause) in switch.clauses.iter().enumerate() {
                    self.begin_item(clause.span, i == 0);
                    match &clause.value.values {
                        Some(values) => {
                            self.write("case ");
                            self.exprs(values);
                        }
                        None => self.write("default"),
                    }
                    self.write(":");
                    self.clause_body(clause.span, &clause.value.body);
                }
                self.close_item(close, switch.clauses.is_empty());
                self.write("}");
            }
            Stmt::TypeSwitch(switch) => {
                self.write("switch ");
                self.header_init(&switch.init);
                if let Some(binding) = &switch.binding {
                    self.write(&binding.value);
                    self.write(" := ");
                }
                self.expr(&switch.subject);
                self.write(".(type) {");
                self.newline();
                for (i, clause) in switch.clauses.iter().enumerate() {
                    self.begin_item(clause.span, i == 0);
                    match &clause.value.types {
                        Some(types) => {
                            self.write("case ");
                            for (j, ty) in types.iter().enumerate() {
                                if j > 0 {
                                    self.write(", ");
                                }
                                self.ty(ty);
                            }
                        }
                        None => self.write("default"),
                    }
                    self.write(":");
                    self.clause_body(clause.span, &clause.value.body);
                }
                self.close_item(close, switch.clauses.is_empty());
                self.write("}");
            }
            Stmt::Select(clauses) => {
                self.write("select {");
                self.newline();
                for (i, clause) in clauses.iter().enumerate() {
                    self.begin_item(clause.span, i == 0);
                    match &clause.value.comm {
                        Some(comm) => {
                            self.write("case ");
                            self.stmt(comm);
                        }
                        None => self.write("default"),
                    }
                    self.write(":");
                    self.clause_body(clause.span, &clause.value.body);
                }
                self.close_item(close, clauses.is_empty());
                self.write("}");
            }
            Stmt::For(for_stmt) => {
                self.write("for ");
                if for_stmt.clauses && (for_stmt.init.is_some() || for_stmt.post.is_some()) {
                    if let Some(init) = &for_stmt.init {
                        self.stmt(init);
                    }
                    self.write("; ");
                    if let Some(cond) = &for_stmt.cond {
                        self.expr(cond);
                    }
                    self.write("; ");
                    if let Some(post) = &for_stmt.post {
                        self.stmt(post);
                        self.write(" ");
                    }
                } else if let Some(cond) = &for_stmt.cond {
                    self.expr(cond);
                    self.write(" ");
                }
                self.block(&for_stmt.body);
            }
            Stmt::Range(range) => {
                self.write("for ");
                if !range.key_value.is_empty() {
                    self.exprs(&range.key_value);
                    self.write(if range.define { " := " } else { " = " });
                }
                self.write("range ");
                self.expr(&range.subject);
                self.write(" ");
                self.block(&range.body);
            }
        }
    }

    fn header_init(&mut self, init: &Option<Box<AstStmt>>) {
        if let Some(init) = init {
            self.stmt(init);
            self.write("; ");
        }
    }

    fn if_stmt(&mut self, if_stmt: &IfStmt) {
        self.write("if ");
        self.header_init(&if_stmt.init);
        self.expr(&if_stmt.cond);
        self.write(" ");
        self.block(&if_stmt.then);
        if let Some(els) = &if_stmt.els {
            self.write(" else ");
            match &els.value {
                Stmt::If(nested) => self.if_stmt(nested),
                Stmt::Block(block) => self.block(block),
                _ => self.stmt(els),
            }
        }
    }

    // ========================================================================
    // EXPRESSIONS
    // ========================================================================

    fn exprs(&mut self, exprs: &[AstExpr]) {
        for (i, expr) in exprs.iter().enumerate() {
            if i > 0 {
                self.write(", ");
            }
            self.expr(expr);
        }
    }

    fn expr(&mut self, expr: &AstExpr) {
        match &expr.value {
            Expr::Ident(name) => self.write(name),
            Expr::BasicLit(lit) => self.write(&lit.raw),
            Expr::CompositeLit {
                ty,
                elements,
                layout,
            } => {
                if let Some(ty) = ty {
                    self.ty(ty);
                }
                self.composite(elements, *layout, expr.span);
            }
            Expr::FuncLit { sig, body } => {
                self.write("func");
                self.signature(sig);
                self.write(" ");
                self.block(body);
            }
            Expr::Paren(inner) => {
                self.write("(");
                self.expr(inner);
                self.write(")");
            }
            Expr::Selector { base, field } => {
                self.expr(base);
                self.write(".");
                self.write(&field.value);
            }
            Expr::Index { base, indices } => {
                self.expr(base);
                self.write("[");
                self.exprs(indices);
                self.write("]");
            }
            Expr::Slice {
                base,
                low,
                high,
                max,
            } => {
                self.expr(base);
                self.write("[");
                if let Some(low) = low {
                    self.expr(low);
                }
                self.write(":");
                if let Some(high) = high {
                    self.expr(high);
                }
                if let Some(max) = max {
                    self.write(":");
                    self.expr(max);
                }
                self.write("]");
            }
            Expr::TypeAssert { base, ty } => {
                self.expr(base);
                self.write(".(");
                self.ty(ty);
                self.write(")");
            }
            Expr::Call {
                func,
                args,
                ellipsis,
            } => {
                self.expr(func);
                self.write("(");
                self.exprs(args);
                if *ellipsis {
                    self.write("...");
                }
                self.write(")");
            }
            Expr::Unary { op, operand } => {
                self.write(op.as_str());
                // `- -x` must not become the decrement token.
                if let Expr::Unary { op: inner, .. } = &operand.value {
                    if inner.as_str().starts_with(op.as_str()) {
                        self.write(" ");
                    }
                }
                self.expr(operand);
            }
            Expr::Binary { op, lhs, rhs } => {
                self.expr(lhs);
                self.write(" ");
                self.write(op.as_str());
                self.write(" ");
                self.expr(rhs);
            }
            Expr::Type(ty) => self.ty(ty),
        }
    }

    fn composite(&mut self, elements: &[Element], layout: Layout, span: Span) {
        self.write("{");
        match layout {
            _ if elements.is_empty() => {}
            Layout::Inline => {
                for (i, element) in elements.iter().enumerate() {
                    if i > 0 {
                        self.write(", ");
                    }
                    self.element(element);
                }
            }
            Layout::Vertical => {
                self.newline();
                self.indent += 1;
                for (i, element) in elements.iter().enumerate() {
                    let start = element.key.as_ref().unwrap_or(&element.value).span.start;
                    let item = if element.value.span.is_empty() {
                        Span::default()
                    } else {
                        Span::new(start, element.value.span.end)
                    };
                    self.begin_item(item, i == 0);
                    self.element(element);
                    self.write(",");
                    self.end_item(item);
                }
                self.close_item((!span.is_empty()).then(|| span.end - 1), false);
                self.dedent();
            }
            Layout::Rows(per_row) => {
                self.newline();
                self.indent += 1;
                for row in elements.chunks(per_row.max(1)) {
                    for (i, element) in row.iter().enumerate() {
                        if i > 0 {
                            self.write(" ");
                        }
                        self.element(element);
                        self.write(",");
                    }
                    self.newline();
                }
                self.dedent();
            }
        }
        self.write("}");
    }

    fn element(&mut self, element: &Element) {
        if let Some(key) = &element.key {
            self.expr(key);
            self.write(": ");
        }
        self.expr(&element.value);
    }
}
