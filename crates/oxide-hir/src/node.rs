//! HIR node types.
//!
//! Every node that can carry a type has an `id` and a `span`. References
//! (paths, shorthand struct fields, type paths) carry the resolution link
//! produced by name resolution; `None` means the name did not resolve.

use rowan::TextRange;

use crate::ids::HirId;

/// A compilation unit: the ordered sequence of top-level items.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Crate {
    pub items: Vec<Item>,
}

// ── Items ──────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq)]
pub struct Item {
    pub id: HirId,
    pub span: TextRange,
    pub name: String,
    pub kind: ItemKind,
}

#[derive(Clone, Debug, PartialEq)]
pub enum ItemKind {
    Fn(FnDecl),
    Struct(StructDecl),
    Const(ConstDecl),
}

/// A function: parameters, optional return type, and a body block.
#[derive(Clone, Debug, PartialEq)]
pub struct FnDecl {
    pub params: Vec<Param>,
    /// `None` means the function returns `()`.
    pub ret: Option<TypeRef>,
    pub body: Block,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Param {
    pub id: HirId,
    pub span: TextRange,
    pub name: String,
    pub ty: TypeRef,
}

/// Whether a struct's fields are named (`S { a: T }`) or positional (`S(T)`).
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum StructKind {
    Named,
    Tuple,
}

#[derive(Clone, Debug, PartialEq)]
pub struct StructDecl {
    pub kind: StructKind,
    pub generics: Vec<GenericParam>,
    pub fields: Vec<FieldDecl>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct GenericParam {
    pub id: HirId,
    pub span: TextRange,
    pub name: String,
}

/// A declared struct field. Positional fields are named by their index
/// (`"0"`, `"1"`, ...).
#[derive(Clone, Debug, PartialEq)]
pub struct FieldDecl {
    pub id: HirId,
    pub span: TextRange,
    pub name: String,
    pub ty: TypeRef,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ConstDecl {
    pub ty: TypeRef,
    pub value: Expr,
}

// ── Type references ────────────────────────────────────────────────────

/// A type as written in source.
#[derive(Clone, Debug, PartialEq)]
pub struct TypeRef {
    pub id: HirId,
    pub span: TextRange,
    pub kind: TypeRefKind,
}

#[derive(Clone, Debug, PartialEq)]
pub enum TypeRefKind {
    /// `()`
    Unit,
    /// `_`
    Infer,
    /// A named type, optionally with generic arguments: `Pair<i32, T>`.
    Path {
        name: String,
        res: Option<TypeRes>,
        args: Vec<TypeRef>,
    },
}

/// What a type path resolved to.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum TypeRes {
    /// A builtin primitive, looked up by name.
    Builtin,
    /// A struct item.
    Adt(HirId),
    /// A generic parameter of the enclosing struct.
    Param(HirId),
}

// ── Statements and blocks ──────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq)]
pub struct Block {
    pub id: HirId,
    pub span: TextRange,
    pub stmts: Vec<Stmt>,
    pub tail: Option<Box<Expr>>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Stmt {
    pub id: HirId,
    pub span: TextRange,
    pub kind: StmtKind,
}

#[derive(Clone, Debug, PartialEq)]
pub enum StmtKind {
    Let(Local),
    /// An expression statement without a trailing semicolon.
    Expr(Expr),
    /// An expression statement terminated by `;`.
    Semi(Expr),
}

/// `let name: ty = init;`. `id` is the identity of the binding that paths
/// resolve to.
#[derive(Clone, Debug, PartialEq)]
pub struct Local {
    pub id: HirId,
    pub name: String,
    pub ty: Option<TypeRef>,
    pub init: Option<Expr>,
}

// ── Expressions ────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq)]
pub struct Expr {
    pub id: HirId,
    pub span: TextRange,
    pub kind: ExprKind,
}

#[derive(Clone, Debug, PartialEq)]
pub enum ExprKind {
    Lit(Lit),
    Path(Path),
    Block(Block),
    Struct(StructExpr),
    /// `base.name`
    Field(Box<Expr>, String),
    /// `base.0`
    TupleIndex(Box<Expr>, usize),
    Call(Box<Expr>, Vec<Expr>),
    Unary(UnOp, Box<Expr>),
    Binary(BinOp, Box<Expr>, Box<Expr>),
    Assign(Box<Expr>, Box<Expr>),
    Paren(Box<Expr>),
}

#[derive(Clone, Debug, PartialEq)]
pub enum Lit {
    /// An integer literal with its optional type suffix (`1u8`).
    Int(u128, Option<String>),
    /// A float literal with its optional type suffix (`1.5f64`).
    Float(f64, Option<String>),
    Bool(bool),
    Char(char),
    Str(String),
    Unit,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum UnOp {
    Neg,
    Not,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
}

impl BinOp {
    pub fn as_str(self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Rem => "%",
            BinOp::Eq => "==",
            BinOp::Ne => "!=",
            BinOp::Lt => "<",
            BinOp::Le => "<=",
            BinOp::Gt => ">",
            BinOp::Ge => ">=",
            BinOp::And => "&&",
            BinOp::Or => "||",
        }
    }

    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            BinOp::Eq | BinOp::Ne | BinOp::Lt | BinOp::Le | BinOp::Gt | BinOp::Ge
        )
    }

    pub fn is_lazy_boolean(self) -> bool {
        matches!(self, BinOp::And | BinOp::Or)
    }
}

/// A path in expression position, e.g. `x` or `Pair::<i32, bool>`.
#[derive(Clone, Debug, PartialEq)]
pub struct Path {
    pub segments: Vec<PathSegment>,
    /// The declaration this path refers to.
    pub res: Option<HirId>,
}

impl Path {
    pub fn final_segment(&self) -> Option<&PathSegment> {
        self.segments.last()
    }
}

impl std::fmt::Display for Path {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, seg) in self.segments.iter().enumerate() {
            if i > 0 {
                write!(f, "::")?;
            }
            write!(f, "{}", seg.name)?;
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct PathSegment {
    pub name: String,
    pub generic_args: Vec<TypeRef>,
}

/// `Path { fields.., ..base }`
#[derive(Clone, Debug, PartialEq)]
pub struct StructExpr {
    pub path: Path,
    pub path_span: TextRange,
    pub fields: Vec<StructExprField>,
    pub base: Option<Box<Expr>>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct StructExprField {
    pub id: HirId,
    pub span: TextRange,
    pub kind: StructExprFieldKind,
}

#[derive(Clone, Debug, PartialEq)]
pub enum StructExprFieldKind {
    /// `name: value`
    Named { name: String, value: Expr },
    /// `0: value`
    Index { index: usize, value: Expr },
    /// `name`, meaning `name: name`. `res` is the binding `name` refers to.
    Shorthand { name: String, res: Option<HirId> },
}

impl StructExprField {
    /// The declared field this entry initializes: its name, or its tuple
    /// index rendered as a name.
    pub fn field_name(&self) -> String {
        match &self.kind {
            StructExprFieldKind::Named { name, .. }
            | StructExprFieldKind::Shorthand { name, .. } => name.clone(),
            StructExprFieldKind::Index { index, .. } => index.to_string(),
        }
    }

    /// The value expression, if written out (shorthand fields have none).
    pub fn value(&self) -> Option<&Expr> {
        match &self.kind {
            StructExprFieldKind::Named { value, .. }
            | StructExprFieldKind::Index { value, .. } => Some(value),
            StructExprFieldKind::Shorthand { .. } => None,
        }
    }
}
