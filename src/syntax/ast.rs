//! Go syntax tree.
//!
//! The tree keeps enough shape to print a file back faithfully: grouped
//! declarations stay grouped, parenthesized expressions keep their
//! parentheses and multi-line composite literals remember their layout.
//! Every statement, declaration, spec and field carries the span it was
//! parsed from so the printer can put comments and blank lines back.

use super::{Span, Spanned};

pub type Ident = Spanned<String>;
pub type AstExpr = Spanned<Expr>;
pub type AstStmt = Spanned<Stmt>;
pub type AstDecl = Spanned<Decl>;

// ============================================================================
// FILE & DECLARATIONS
// ============================================================================

/// A parsed Go source file.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceFile {
    pub package: Ident,
    pub decls: Vec<AstDecl>,
    /// Every comment in the file, in source order.
    pub comments: Vec<Comment>,
}

impl SourceFile {
    /// Iterates over the import specs of every import declaration.
    pub fn imports(&self) -> impl Iterator<Item = &Spanned<ImportSpec>> {
        self.decls.iter().flat_map(|decl| match &decl.value {
            Decl::Import(import) => import.specs.as_slice(),
            _ => &[][..],
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Comment {
    pub text: String,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Decl {
    Import(ImportDecl),
    Const(ValueDecl),
    Var(ValueDecl),
    Type(TypeDecl),
    Func(FuncDecl),
}

impl Decl {
    pub fn is_import(&self) -> bool {
        matches!(self, Decl::Import(_))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImportDecl {
    pub specs: Vec<Spanned<ImportSpec>>,
    pub grouped: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImportSpec {
    pub name: Option<ImportName>,
    pub path: BasicLit,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ImportName {
    /// An explicit local name, including the blank name `_`.
    Named(Ident),
    /// `import . "path"`
    Dot,
}

/// Shared by `const` and `var` declarations.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueDecl {
    pub specs: Vec<Spanned<ValueSpec>>,
    pub grouped: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ValueSpec {
    pub names: Vec<Ident>,
    pub ty: Option<Type>,
    pub values: Vec<AstExpr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypeDecl {
    pub specs: Vec<Spanned<TypeSpec>>,
    pub grouped: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypeSpec {
    pub name: Ident,
    pub type_params: Vec<TypeParam>,
    /// `type A = B`
    pub alias: bool,
    pub ty: Type,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypeParam {
    pub names: Vec<Ident>,
    pub constraint: Vec<TypeTerm>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FuncDecl {
    pub recv: Option<Vec<Param>>,
    pub name: Ident,
    pub type_params: Vec<TypeParam>,
    pub sig: Signature,
    pub body: Option<Block>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Signature {
    pub params: Vec<Param>,
    pub results: Vec<Param>,
    pub results_parenthesized: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub names: Vec<Ident>,
    pub variadic: bool,
    pub ty: Type,
}

// ============================================================================
// TYPES
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum Type {
    Name {
        package: Option<Ident>,
        name: Ident,
        args: Vec<Type>,
    },
    Pointer(Box<Type>),
    Slice(Box<Type>),
    /// `len` is `None` for `[...]T`.
    Array {
        len: Option<Box<AstExpr>>,
        elem: Box<Type>,
    },
    Map {
        key: Box<Type>,
        value: Box<Type>,
    },
    Chan {
        dir: ChanDir,
        elem: Box<Type>,
    },
    Func(Box<Signature>),
    Struct(Vec<Spanned<Field>>),
    Interface(Vec<Spanned<InterfaceElem>>),
    Paren(Box<Type>),
}

impl Type {
    /// An unqualified type name such as `byte`.
    pub fn named(name: &str) -> Self {
        Type::Name {
            package: None,
            name: Spanned::synthetic(name.to_string()),
            args: Vec::new(),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ChanDir {
    Both,
    Send,
    Recv,
}

/// A struct field; embedded fields have no names.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub names: Vec<Ident>,
    pub ty: Type,
    pub tag: Option<BasicLit>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum InterfaceElem {
    Method { name: Ident, sig: Signature },
    Union(Vec<TypeTerm>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypeTerm {
    pub tilde: bool,
    pub ty: Type,
}

// ============================================================================
// STATEMENTS
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub stmts: Vec<AstStmt>,
    pub span: Span,
}

impl Block {
    /// Offset of the closing brace, if the block came from source.
    pub fn rbrace(&self) -> Option<usize> {
        (!self.span.is_empty()).then(|| self.span.end - 1)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    /// `const`, `var` or `type` inside a function body.
    Decl(Decl),
    Labeled {
        label: Ident,
        stmt: Option<Box<AstStmt>>,
    },
    Expr(AstExpr),
    Send {
        chan: AstExpr,
        value: AstExpr,
    },
    IncDec {
        expr: AstExpr,
        inc: bool,
    },
    /// Assignments and short variable declarations (`op == AssignOp::Define`).
    Assign {
        lhs: Vec<AstExpr>,
        op: AssignOp,
        rhs: Vec<AstExpr>,
    },
    Go(AstExpr),
    Defer(AstExpr),
    Return(Vec<AstExpr>),
    Branch {
        kind: BranchKind,
        label: Option<Ident>,
    },
    Block(Block),
    If(IfStmt),
    Switch(SwitchStmt),
    TypeSwitch(TypeSwitchStmt),
    Select(Vec<Spanned<CommClause>>),
    For(ForStmt),
    Range(RangeStmt),
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum AssignOp {
    Assign,
    Define,
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    And,
    Or,
    Xor,
    Shl,
    Shr,
    AndNot,
}

impl AssignOp {
    pub fn from_token(token: &str) -> Option<Self> {
        Some(match token {
            "=" => AssignOp::Assign,
            ":=" => AssignOp::Define,
            "+=" => AssignOp::Add,
            "-=" => AssignOp::Sub,
            "*=" => AssignOp::Mul,
            "/=" => AssignOp::Div,
            "%=" => AssignOp::Rem,
            "&=" => AssignOp::And,
            "|=" => AssignOp::Or,
            "^=" => AssignOp::Xor,
            "<<=" => AssignOp::Shl,
            ">>=" => AssignOp::Shr,
            "&^=" => AssignOp::AndNot,
            _ => return None,
        })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AssignOp::Assign => "=",
            AssignOp::Define => ":=",
            AssignOp::Add => "+=",
            AssignOp::Sub => "-=",
            AssignOp::Mul => "*=",
            AssignOp::Div => "/=",
            AssignOp::Rem => "%=",
            AssignOp::And => "&=",
            AssignOp::Or => "|=",
            AssignOp::Xor => "^=",
            AssignOp::Shl => "<<=",
            AssignOp::Shr => ">>=",
            AssignOp::AndNot => "&^=",
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum BranchKind {
    Break,
    Continue,
    Goto,
    Fallthrough,
}

impl BranchKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BranchKind::Break => "break",
            BranchKind::Continue => "continue",
            BranchKind::Goto => "goto",
            BranchKind::Fallthrough => "fallthrough",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct IfStmt {
    pub init: Option<Box<AstStmt>>,
    pub cond: AstExpr,
    pub then: Block,
    /// Either another `If` or a `Block`.
    pub els: Option<Box<AstStmt>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SwitchStmt {
    pub init: Option<Box<AstStmt>>,
    pub tag: Option<AstExpr>,
    pub clauses: Vec<Spanned<CaseClause>>,
}

/// `values` is `None` for the `default` clause.
#[derive(Debug, Clone, PartialEq)]
pub struct CaseClause {
    pub values: Option<Vec<AstExpr>>,
    pub body: Vec<AstStmt>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypeSwitchStmt {
    pub init: Option<Box<AstStmt>>,
    pub binding: Option<Ident>,
    pub subject: AstExpr,
    pub clauses: Vec<Spanned<TypeCaseClause>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypeCaseClause {
    pub types: Option<Vec<Type>>,
    pub body: Vec<AstStmt>,
}

/// `comm` is `None` for the `default` clause.
#[derive(Debug, Clone, PartialEq)]
pub struct CommClause {
    pub comm: Option<Box<AstStmt>>,
    pub body: Vec<AstStmt>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ForStmt {
    pub init: Option<Box<AstStmt>>,
    pub cond: Option<AstExpr>,
    pub post: Option<Box<AstStmt>>,
    /// True for the three-clause form, even when every clause is empty.
    pub clauses: bool,
    pub body: Block,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RangeStmt {
    pub key_value: Vec<AstExpr>,
    pub define: bool,
    pub subject: AstExpr,
    pub body: Block,
}

// ============================================================================
// EXPRESSIONS
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Ident(String),
    BasicLit(BasicLit),
    /// `ty` is `None` for elided element literals such as the inner `{1, 2}`
    /// of `[][]int{{1, 2}}`.
    CompositeLit {
        ty: Option<Box<Type>>,
        elements: Vec<Element>,
        layout: Layout,
    },
    FuncLit {
        sig: Signature,
        body: Block,
    },
    Paren(Box<AstExpr>),
    Selector {
        base: Box<AstExpr>,
        field: Ident,
    },
    Index {
        base: Box<AstExpr>,
        indices: Vec<AstExpr>,
    },
    Slice {
        base: Box<AstExpr>,
        low: Option<Box<AstExpr>>,
        high: Option<Box<AstExpr>>,
        max: Option<Box<AstExpr>>,
    },
    TypeAssert {
        base: Box<AstExpr>,
        ty: Type,
    },
    Call {
        func: Box<AstExpr>,
        args: Vec<AstExpr>,
        ellipsis: bool,
    },
    Unary {
        op: UnaryOp,
        operand: Box<AstExpr>,
    },
    Binary {
        op: BinaryOp,
        lhs: Box<AstExpr>,
        rhs: Box<AstExpr>,
    },
    /// A type in operand position, e.g. the `[]byte` of `[]byte(s)`.
    Type(Type),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub key: Option<AstExpr>,
    pub value: AstExpr,
}

/// How a composite literal lays out its elements.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Layout {
    Inline,
    /// One element per line.
    Vertical,
    /// A fixed number of elements per line.
    Rows(usize),
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum LitKind {
    Int,
    Float,
    Imaginary,
    Rune,
    String,
}

/// A literal as spelled in the source.
#[derive(Debug, Clone, PartialEq)]
pub struct BasicLit {
    pub kind: LitKind,
    pub raw: String,
}

impl BasicLit {
    pub fn string(raw: impl Into<String>) -> Self {
        Self {
            kind: LitKind::String,
            raw: raw.into(),
        }
    }

    /// The text between the quotes of a string literal. Escape sequences are
    /// left as written. Returns `None` for non-string literals.
    pub fn string_value(&self) -> Option<String> {
        if self.kind != LitKind::String || self.raw.len() < 2 {
            return None;
        }
        Some(self.raw[1..self.raw.len() - 1].to_string())
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum UnaryOp {
    Pos,
    Neg,
    Not,
    Xor,
    Deref,
    Addr,
    Recv,
}

impl UnaryOp {
    pub fn from_token(token: &str) -> Option<Self> {
        Some(match token {
            "+" => UnaryOp::Pos,
            "-" => UnaryOp::Neg,
            "!" => UnaryOp::Not,
            "^" => UnaryOp::Xor,
            "*" => UnaryOp::Deref,
            "&" => UnaryOp::Addr,
            "<-" => UnaryOp::Recv,
            _ => return None,
        })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            UnaryOp::Pos => "+",
            UnaryOp::Neg => "-",
            UnaryOp::Not => "!",
            UnaryOp::Xor => "^",
            UnaryOp::Deref => "*",
            UnaryOp::Addr => "&",
            UnaryOp::Recv => "<-",
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum BinaryOp {
    LogOr,
    LogAnd,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Add,
    Sub,
    Or,
    Xor,
    Mul,
    Div,
    Rem,
    Shl,
    Shr,
    And,
    AndNot,
}

impl BinaryOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            BinaryOp::LogOr => "||",
            BinaryOp::LogAnd => "&&",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Or => "|",
            BinaryOp::Xor => "^",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Rem => "%",
            BinaryOp::Shl => "<<",
            BinaryOp::Shr => ">>",
            BinaryOp::And => "&",
            BinaryOp::AndNot => "&^",
        }
    }
}

impl Expr {
    pub fn ident(name: impl Into<String>) -> Self {
        Expr::Ident(name.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interpreted_string_value_keeps_escapes() {
        let lit = BasicLit::string(r#""a\x2etxt""#);
        assert_eq!(lit.string_value().unwrap(), r"a\x2etxt");

        let lit = BasicLit::string(r#""bin\xff.dat""#);
        assert_eq!(lit.string_value().unwrap(), r"bin\xff.dat");
    }

    #[test]
    fn raw_string_value_is_verbatim() {
        let lit = BasicLit::string(r"`templates\index.html`");
        assert_eq!(lit.string_value().unwrap(), r"templates\index.html");
    }

    #[test]
    fn non_string_literal_has_no_string_value() {
        let lit = BasicLit {
            kind: LitKind::Int,
            raw: "42".into(),
        };
        assert!(lit.string_value().is_none());
    }

    #[test]
    fn imports_iterates_every_import_decl() {
        let spec = |path: &str| Spanned::synthetic(ImportSpec {
            name: None,
            path: BasicLit::string(format!("\"{path}\"")),
        });
        let file = SourceFile {
            package: Spanned::synthetic("main".to_string()),
            decls: vec![
                Spanned::synthetic(Decl::Import(ImportDecl {
                    specs: vec![spec("fmt")],
                    grouped: false,
                })),
                Spanned::synthetic(Decl::Import(ImportDecl {
                    specs: vec![spec("os"), spec("io")],
                    grouped: true,
                })),
            ],
            comments: vec![],
        };
        let paths: Vec<_> = file
            .imports()
            .filter_map(|s| s.value.path.string_value())
            .collect();
        assert_eq!(paths, ["fmt", "os", "io"]);
    }
}
